//! Local-socket protobuf compute server.
//!
//! # Crate Structure
//!
//! - [`transport`]: named endpoint resolution and Unix domain sockets
//! - [`frame`]: little-endian length-prefixed framing
//! - [`proto`]: envelope and message definitions
//! - [`server`]: connection manager, dispatcher, handlers and clients

/// Re-export transport types.
pub mod transport {
    pub use lodestone_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use lodestone_frame::*;
}

/// Re-export protocol messages.
pub mod proto {
    pub use lodestone_proto::*;
}

/// Re-export server types.
pub mod server {
    pub use lodestone_server::*;
}
