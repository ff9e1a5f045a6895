//! Protobuf envelope and message definitions for the lodestone protocol.
//!
//! Every message on the wire is a [`MessageEnvelope`]: a protocol version, a
//! [`MessageType`] discriminant, opaque payload bytes holding the typed
//! message, and a small string metadata map. [`decode_envelope`] validates
//! version and type before anything looks at the payload; decoding the
//! payload itself is left to whoever handles that type.
//!
//! Messages are declared with `prost` derives directly, so no `.proto`
//! compilation step is needed.

pub mod envelope;
pub mod error;
pub mod messages;

pub use envelope::{decode_envelope, encode_envelope, Envelope, PROTOCOL_VERSION};
pub use error::{EnvelopeError, Result};
pub use messages::{
    Capabilities, CapabilitiesRequest, CapabilitiesResponse, ErrorCode, ErrorResponse,
    MessageEnvelope, MessageType, XySineRequest, XySineResponse,
};
