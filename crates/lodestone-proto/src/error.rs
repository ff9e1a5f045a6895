use crate::messages::ErrorCode;

/// Why a received envelope was rejected before dispatch.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The frame carried zero bytes.
    #[error("invalid message format: empty envelope")]
    Empty,

    /// The bytes are not a serialized envelope.
    #[error("failed to parse envelope: {0}")]
    Parse(#[from] prost::DecodeError),

    /// The envelope was produced for a different protocol version.
    #[error("invalid message format: unsupported protocol version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// The type field was left at its sentinel value.
    #[error("unknown message type: type is unspecified")]
    UnspecifiedType,

    /// The type field is not a known message type.
    #[error("unknown message type: {0}")]
    UnknownType(i32),
}

impl EnvelopeError {
    /// The error code reported back to the peer.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Parse(_) => ErrorCode::ProtobufParseError,
            Self::Empty | Self::UnsupportedVersion { .. } => ErrorCode::InvalidMessageFormat,
            Self::UnspecifiedType | Self::UnknownType(_) => ErrorCode::UnknownMessageType,
        }
    }
}

pub type Result<T> = std::result::Result<T, EnvelopeError>;
