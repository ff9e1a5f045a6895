use lodestone_frame::FrameError;
use lodestone_proto::{EnvelopeError, ErrorCode, ErrorResponse, MessageType};

/// Errors that stop a server from starting.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The endpoint could not be bound.
    #[error("transport error: {0}")]
    Transport(#[from] lodestone_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, ServerError>;

/// A failed request, reported to the peer as an [`ErrorResponse`].
///
/// Never fatal to the connection it occurred on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct RequestError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
    pub job_id: Option<String>,
}

impl RequestError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            job_id: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    /// A request parameter failed validation. `message` names the field.
    pub fn invalid_parameter(message: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidParameterValue,
            format!("Invalid parameter: {message}"),
        )
    }

    /// The payload did not parse as the message its envelope claimed.
    pub fn payload_parse(message_type: MessageType, err: prost::DecodeError) -> Self {
        Self::new(
            ErrorCode::ProtobufParseError,
            format!("failed to parse {message_type} payload"),
        )
        .with_details(err.to_string())
    }

    /// A valid message type with nothing registered to handle it.
    pub fn unhandled_message_type(message_type: MessageType) -> Self {
        Self::new(
            ErrorCode::UnknownMessageType,
            format!(
                "unknown message type: no handler for {message_type} ({})",
                message_type as i32
            ),
        )
    }

    pub fn message_too_large(size: usize, max: usize) -> Self {
        Self::new(
            ErrorCode::MessageTooLarge,
            format!("message too large: {size} bytes exceeds limit of {max} bytes"),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn job_not_found(job_id: &str) -> Self {
        Self::new(ErrorCode::JobNotFound, format!("job not found: {job_id}")).with_job_id(job_id)
    }

    /// Wire form of this error.
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error_code: self.code as i32,
            message: self.message.clone(),
            details: self.details.clone(),
            job_id: self.job_id.clone(),
        }
    }
}

impl From<EnvelopeError> for RequestError {
    fn from(err: EnvelopeError) -> Self {
        let code = err.error_code();
        match err {
            EnvelopeError::Parse(source) => {
                Self::new(code, "failed to parse message envelope").with_details(source.to_string())
            }
            other => Self::new(code, other.to_string()),
        }
    }
}

impl From<FrameError> for RequestError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::MessageTooLarge { size, max } => Self::message_too_large(size, max),
            other => Self::internal(other.to_string()),
        }
    }
}

/// Errors seen by a [`Client`](crate::Client) or [`AsyncClient`](crate::AsyncClient).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] lodestone_transport::TransportError),

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("invalid envelope from server: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("failed to decode response payload: {0}")]
    Decode(#[from] prost::DecodeError),

    /// The server answered with an [`ErrorResponse`].
    #[error("server returned {}: {}", .0.error_code(), .0.message)]
    Server(ErrorResponse),

    #[error("expected {expected} but server sent {found}")]
    UnexpectedResponse {
        expected: MessageType,
        found: MessageType,
    },

    /// The server closed the connection.
    #[error("connection closed by server")]
    Closed,
}

impl ClientError {
    /// Error code carried by a server-side error, if this is one.
    pub fn server_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Server(response) => Some(response.error_code()),
            _ => None,
        }
    }
}
