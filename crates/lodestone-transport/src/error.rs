use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The endpoint could not be claimed: missing directory, permissions, or
    /// something other than a socket already at the path.
    #[error("cannot bind {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot connect to {path}: {source}")]
    Connect {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(std::io::Error),

    #[error("socket I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `sun_path` cannot hold the path.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },
}

pub type Result<T> = std::result::Result<T, TransportError>;
