//! Connection manager, dispatcher and compute handlers for the lodestone
//! protocol.
//!
//! A [`Server`] owns one bound endpoint and runs every connection as a task
//! on the caller's tokio runtime. Bytes from a connection land in its receive
//! buffer inside the [`ConnectionRegistry`]; complete frames are pulled out
//! one at a time, validated as envelopes, and routed through the
//! [`Dispatcher`] to a handler. Whatever comes back, a typed response or a
//! [`RequestError`], goes out through the [`Responder`] on the same
//! connection and in arrival order.
//!
//! ```no_run
//! # async fn run() -> Result<(), lodestone_server::ServerError> {
//! use lodestone_server::{Server, ServerConfig};
//!
//! let server = Server::bind(ServerConfig::from_endpoint_name("lodestone"))?;
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod registry;
pub mod responder;
pub mod server;

pub use client::{AsyncClient, Client};
pub use config::ServerConfig;
pub use connection::{Connection, ConnectionState};
pub use dispatch::{Dispatcher, Handler, HandlerContext, Response};
pub use error::{ClientError, RequestError, Result, ServerError};
pub use jobs::{CancellationFlag, JobRegistry};
pub use registry::{ConnectionId, ConnectionRegistry};
pub use responder::Responder;
pub use server::{Server, ServerHandle};
