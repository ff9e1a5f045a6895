use std::collections::BTreeMap;

use bytes::Bytes;
use prost::Message;
use tracing::trace;

use crate::error::{EnvelopeError, Result};
use crate::messages::{MessageEnvelope, MessageType};

/// The only protocol version this crate speaks.
pub const PROTOCOL_VERSION: u32 = 1;

/// A received envelope that passed version and type validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub message_type: MessageType,
    pub payload: Bytes,
    pub metadata: BTreeMap<String, String>,
}

impl Envelope {
    pub fn new(message_type: MessageType, payload: impl Into<Bytes>) -> Self {
        Self {
            message_type,
            payload: payload.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Wrap a typed message.
    pub fn from_message<M: Message>(message_type: MessageType, message: &M) -> Self {
        Self::new(message_type, message.encode_to_vec())
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Parse the payload as the message type the caller expects.
    pub fn decode_payload<M: Message + Default>(
        &self,
    ) -> std::result::Result<M, prost::DecodeError> {
        M::decode(self.payload.clone())
    }

    /// Serialize, stamping the current protocol version.
    pub fn to_bytes(&self) -> Bytes {
        encode_envelope(self.message_type, self.payload.clone(), &self.metadata)
    }
}

/// Serialize an envelope around already-encoded payload bytes.
pub fn encode_envelope(
    message_type: MessageType,
    payload: impl Into<Bytes>,
    metadata: &BTreeMap<String, String>,
) -> Bytes {
    let envelope = MessageEnvelope {
        version: PROTOCOL_VERSION,
        r#type: message_type as i32,
        payload: payload.into(),
        metadata: metadata.clone(),
    };
    Bytes::from(envelope.encode_to_vec())
}

/// Parse and validate envelope bytes.
///
/// Rejects anything that isn't a version-1 envelope with a known, specified
/// type. The payload is carried through untouched.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope> {
    if bytes.is_empty() {
        return Err(EnvelopeError::Empty);
    }

    let raw = MessageEnvelope::decode(bytes)?;

    if raw.version != PROTOCOL_VERSION {
        return Err(EnvelopeError::UnsupportedVersion {
            found: raw.version,
            expected: PROTOCOL_VERSION,
        });
    }

    let message_type = match MessageType::try_from(raw.r#type) {
        Ok(MessageType::Unspecified) => return Err(EnvelopeError::UnspecifiedType),
        Ok(message_type) => message_type,
        Err(_) => return Err(EnvelopeError::UnknownType(raw.r#type)),
    };

    trace!(%message_type, payload_len = raw.payload.len(), "decoded envelope");

    Ok(Envelope {
        message_type,
        payload: raw.payload,
        metadata: raw.metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{
        Capabilities, CapabilitiesRequest, CapabilitiesResponse, ErrorCode, ErrorResponse,
        XySineRequest, XySineResponse,
    };

    fn raw(version: u32, message_type: i32) -> Vec<u8> {
        MessageEnvelope {
            version,
            r#type: message_type,
            payload: Bytes::from_static(b"\x08\x01"),
            metadata: BTreeMap::new(),
        }
        .encode_to_vec()
    }

    #[test]
    fn every_message_type_survives_encode_decode() {
        let cases: Vec<(MessageType, Vec<u8>)> = vec![
            (
                MessageType::CapabilitiesRequest,
                CapabilitiesRequest {}.encode_to_vec(),
            ),
            (
                MessageType::CapabilitiesResponse,
                CapabilitiesResponse {
                    capabilities: Some(Capabilities {
                        server_version: "lodestone-0.1.0".to_string(),
                        supported_features: vec!["xy_sine".to_string()],
                        max_concurrency: 8,
                        protocol_version: "1.0".to_string(),
                    }),
                }
                .encode_to_vec(),
            ),
            (
                MessageType::XySineRequest,
                XySineRequest {
                    frequency: 2.5,
                    amplitude: 1.5,
                    phase: 0.25,
                    samples: 64,
                }
                .encode_to_vec(),
            ),
            (
                MessageType::XySineResponse,
                XySineResponse {
                    x: vec![0.0, 1.0],
                    y: vec![0.5, -0.5],
                    status: "OK".to_string(),
                }
                .encode_to_vec(),
            ),
            (
                MessageType::ErrorResponse,
                ErrorResponse {
                    error_code: ErrorCode::InternalError as i32,
                    message: "boom".to_string(),
                    details: Some("detail".to_string()),
                    job_id: None,
                }
                .encode_to_vec(),
            ),
        ];

        for (message_type, payload) in cases {
            let wire = encode_envelope(message_type, payload.clone(), &BTreeMap::new());
            let decoded = decode_envelope(&wire).unwrap();
            assert_eq!(decoded.message_type, message_type);
            assert_eq!(decoded.payload.as_ref(), payload.as_slice());

            let stamped = MessageEnvelope::decode(wire).unwrap();
            assert_eq!(stamped.version, PROTOCOL_VERSION);
        }
    }

    #[test]
    fn metadata_is_preserved() {
        let envelope = Envelope::new(MessageType::CapabilitiesRequest, Bytes::new())
            .with_metadata("trace_id", "abc-123")
            .with_metadata("client", "tests");

        let decoded = decode_envelope(&envelope.to_bytes()).unwrap();
        assert_eq!(decoded, envelope);
        assert_eq!(decoded.metadata["trace_id"], "abc-123");
    }

    #[test]
    fn encoding_is_deterministic() {
        let envelope = Envelope::new(MessageType::XySineRequest, vec![1u8, 2, 3])
            .with_metadata("b", "2")
            .with_metadata("a", "1");
        assert_eq!(envelope.to_bytes(), envelope.to_bytes());
    }

    #[test]
    fn rejects_version_zero_and_future_versions() {
        for version in [0, 2, 99] {
            let err = decode_envelope(&raw(version, MessageType::CapabilitiesRequest as i32))
                .unwrap_err();
            assert!(matches!(
                err,
                EnvelopeError::UnsupportedVersion { found, expected: 1 } if found == version
            ));
            assert_eq!(err.error_code(), ErrorCode::InvalidMessageFormat);
        }
    }

    #[test]
    fn rejects_unspecified_type() {
        let err = decode_envelope(&raw(1, 0)).unwrap_err();
        assert!(matches!(err, EnvelopeError::UnspecifiedType));
        assert_eq!(err.error_code(), ErrorCode::UnknownMessageType);
    }

    #[test]
    fn rejects_unknown_type() {
        let err = decode_envelope(&raw(1, 99)).unwrap_err();
        assert!(matches!(err, EnvelopeError::UnknownType(99)));
        assert!(err.to_string().contains("unknown"));
        assert_eq!(err.error_code(), ErrorCode::UnknownMessageType);

        let err = decode_envelope(&raw(1, -4)).unwrap_err();
        assert!(matches!(err, EnvelopeError::UnknownType(-4)));
    }

    #[test]
    fn rejects_bytes_that_are_not_an_envelope() {
        // Field 1 announced as a varint, then the buffer ends.
        let err = decode_envelope(&[0x08]).unwrap_err();
        assert!(matches!(err, EnvelopeError::Parse(_)));
        assert_eq!(err.error_code(), ErrorCode::ProtobufParseError);

        let err = decode_envelope(&[0xFF; 8]).unwrap_err();
        assert!(matches!(err, EnvelopeError::Parse(_)));
    }

    #[test]
    fn rejects_empty_frame() {
        let err = decode_envelope(&[]).unwrap_err();
        assert!(matches!(err, EnvelopeError::Empty));
        assert_eq!(err.error_code(), ErrorCode::InvalidMessageFormat);
    }

    #[test]
    fn payload_is_not_inspected() {
        let garbage = vec![0xFFu8, 0x00, 0xDE, 0xAD];
        let wire = encode_envelope(MessageType::XySineRequest, garbage.clone(), &BTreeMap::new());

        let decoded = decode_envelope(&wire).unwrap();
        assert_eq!(decoded.payload.as_ref(), garbage.as_slice());
        assert!(decoded.decode_payload::<XySineRequest>().is_err());
    }

    #[test]
    fn typed_payload_roundtrip() {
        let request = XySineRequest {
            frequency: 1.0,
            amplitude: 2.0,
            phase: 0.0,
            samples: 10,
        };
        let envelope = Envelope::from_message(MessageType::XySineRequest, &request);
        let decoded = decode_envelope(&envelope.to_bytes()).unwrap();
        assert_eq!(decoded.decode_payload::<XySineRequest>().unwrap(), request);
    }
}
