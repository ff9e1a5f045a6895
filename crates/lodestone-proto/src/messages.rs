use std::collections::BTreeMap;

use bytes::Bytes;

/// Discriminant carried in every envelope.
///
/// Value 0 is a sentinel and never valid on a received envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum MessageType {
    Unspecified = 0,
    CapabilitiesRequest = 1,
    CapabilitiesResponse = 2,
    XySineRequest = 3,
    XySineResponse = 4,
    ErrorResponse = 5,
}

impl MessageType {
    /// Protobuf enum value name.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Unspecified => "MESSAGE_TYPE_UNSPECIFIED",
            Self::CapabilitiesRequest => "CAPABILITIES_REQUEST",
            Self::CapabilitiesResponse => "CAPABILITIES_RESPONSE",
            Self::XySineRequest => "XY_SINE_REQUEST",
            Self::XySineResponse => "XY_SINE_RESPONSE",
            Self::ErrorResponse => "ERROR_RESPONSE",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str_name())
    }
}

/// Closed set of error classes reported in [`ErrorResponse`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ErrorCode {
    Unspecified = 0,
    InternalError = 1,
    MessageTooLarge = 2,
    InvalidMessageFormat = 3,
    ProtobufParseError = 4,
    UnknownMessageType = 5,
    InvalidParameterValue = 6,
    JobNotFound = 7,
}

impl ErrorCode {
    /// Protobuf enum value name.
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Unspecified => "ERROR_CODE_UNSPECIFIED",
            Self::InternalError => "INTERNAL_ERROR",
            Self::MessageTooLarge => "MESSAGE_TOO_LARGE",
            Self::InvalidMessageFormat => "INVALID_MESSAGE_FORMAT",
            Self::ProtobufParseError => "PROTOBUF_PARSE_ERROR",
            Self::UnknownMessageType => "UNKNOWN_MESSAGE_TYPE",
            Self::InvalidParameterValue => "INVALID_PARAMETER_VALUE",
            Self::JobNotFound => "JOB_NOT_FOUND",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str_name())
    }
}

/// Wire-level wrapper around every typed message.
#[derive(Clone, PartialEq, prost::Message)]
pub struct MessageEnvelope {
    #[prost(uint32, tag = "1")]
    pub version: u32,
    #[prost(enumeration = "MessageType", tag = "2")]
    pub r#type: i32,
    #[prost(bytes = "bytes", tag = "3")]
    pub payload: Bytes,
    /// Tracing and versioning hints. Ordered so that encoding is stable.
    #[prost(btree_map = "string, string", tag = "4")]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ErrorResponse {
    #[prost(enumeration = "ErrorCode", tag = "1")]
    pub error_code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(string, optional, tag = "3")]
    pub details: Option<String>,
    /// Reserved for job tracking.
    #[prost(string, optional, tag = "4")]
    pub job_id: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CapabilitiesRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CapabilitiesResponse {
    #[prost(message, optional, tag = "1")]
    pub capabilities: Option<Capabilities>,
}

/// What a server advertises about itself.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Capabilities {
    #[prost(string, tag = "1")]
    pub server_version: String,
    #[prost(string, repeated, tag = "2")]
    pub supported_features: Vec<String>,
    /// Advisory worker count; not enforced.
    #[prost(uint32, tag = "3")]
    pub max_concurrency: u32,
    #[prost(string, tag = "4")]
    pub protocol_version: String,
}

/// Sampled sine curve request. Zero means "use the default" for every field
/// except `phase`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct XySineRequest {
    #[prost(double, tag = "1")]
    pub frequency: f64,
    #[prost(double, tag = "2")]
    pub amplitude: f64,
    #[prost(double, tag = "3")]
    pub phase: f64,
    #[prost(int32, tag = "4")]
    pub samples: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct XySineResponse {
    #[prost(double, repeated, tag = "1")]
    pub x: Vec<f64>,
    #[prost(double, repeated, tag = "2")]
    pub y: Vec<f64>,
    #[prost(string, tag = "3")]
    pub status: String,
}
