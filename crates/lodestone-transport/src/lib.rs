//! Named local endpoint transport.
//!
//! The lowest layer of lodestone. A server instance owns exactly one Unix
//! domain socket, resolved from an endpoint name by [`resolve_endpoint`].
//! Blocking callers use [`IpcStream`]; with the `async` feature the bound
//! socket can be handed to a tokio runtime via
//! [`UnixDomainSocket::into_async`].

pub mod endpoint;
pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use endpoint::{resolve_endpoint, DEFAULT_ENDPOINT};
pub use error::{Result, TransportError};
pub use traits::IpcStream;

#[cfg(unix)]
pub use uds::UnixDomainSocket;

#[cfg(all(unix, feature = "async"))]
pub use uds::AsyncUnixDomainSocket;
