use std::io;

use lodestone_transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A length prefix, or a payload about to be sent, is above the ceiling.
    #[error("message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("frame I/O error: {0}")]
    Io(#[from] io::Error),

    /// The peer went away, possibly in the middle of a frame.
    #[error("connection closed")]
    ConnectionClosed,
}

impl From<TransportError> for FrameError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Io(source)
            | TransportError::Accept(source)
            | TransportError::Bind { source, .. }
            | TransportError::Connect { source, .. } => Self::Io(source),
            other => Self::Io(io::Error::other(other)),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
