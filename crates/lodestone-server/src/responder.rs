use std::collections::BTreeMap;

use bytes::BytesMut;
use lodestone_frame::encode_frame;
use lodestone_proto::encode_envelope;
use tokio::io::AsyncWrite;
use tracing::{debug, error};

use crate::connection::Connection;
use crate::dispatch::Response;
use crate::error::RequestError;

/// Request metadata keys copied onto the response envelope.
pub const ECHOED_METADATA_KEYS: &[&str] = &["trace_id"];

/// Serializes responses into frames and writes them to a connection.
#[derive(Debug, Clone)]
pub struct Responder {
    max_message_size: usize,
}

impl Responder {
    pub fn new(max_message_size: usize) -> Self {
        Self { max_message_size }
    }

    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Payload, then envelope, then frame.
    ///
    /// An envelope above the size ceiling is refused with
    /// `MESSAGE_TOO_LARGE` instead of being framed.
    pub fn try_frame(
        &self,
        response: &Response,
        metadata: &BTreeMap<String, String>,
    ) -> Result<BytesMut, RequestError> {
        let payload = response.encode_payload().map_err(|err| {
            RequestError::internal("failed to encode response payload").with_details(err.to_string())
        })?;
        let envelope = encode_envelope(response.message_type(), payload, metadata);
        if envelope.len() > self.max_message_size {
            return Err(RequestError::message_too_large(
                envelope.len(),
                self.max_message_size,
            ));
        }

        let mut frame = BytesMut::new();
        encode_frame(&envelope, &mut frame)?;
        Ok(frame)
    }

    /// Frame a response, substituting an error response if it can't be
    /// framed. `None` only when the error response itself fails too.
    pub fn frame_response(
        &self,
        response: &Response,
        metadata: &BTreeMap<String, String>,
    ) -> Option<BytesMut> {
        match self.try_frame(response, metadata) {
            Ok(frame) => Some(frame),
            Err(err) => {
                debug!(
                    message_type = %response.message_type(),
                    error = %err,
                    "response could not be framed; sending error instead"
                );
                match self.try_frame(&Response::from(err), metadata) {
                    Ok(frame) => Some(frame),
                    Err(err) => {
                        error!(error = %err, "error response could not be framed; dropping");
                        None
                    }
                }
            }
        }
    }

    /// Send `response` on `conn`, echoing tracing metadata from the request.
    ///
    /// Does nothing once the connection is disconnected. Returns whether the
    /// frame was written.
    pub async fn send<W: AsyncWrite + Unpin>(
        &self,
        conn: &mut Connection<W>,
        response: Response,
        request_metadata: &BTreeMap<String, String>,
    ) -> bool {
        if !conn.is_connected() {
            debug!(conn = %conn.id(), "skipping response to disconnected client");
            return false;
        }

        let metadata = response_metadata(request_metadata);
        match self.frame_response(&response, &metadata) {
            Some(frame) => conn.write_frame(&frame).await,
            None => false,
        }
    }
}

/// The subset of request metadata a response carries back.
pub fn response_metadata(request: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    ECHOED_METADATA_KEYS
        .iter()
        .filter_map(|&key| {
            request
                .get(key)
                .map(|value| (key.to_string(), value.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use lodestone_frame::{decode_frame, MAX_MESSAGE_SIZE};
    use lodestone_proto::{decode_envelope, ErrorCode, ErrorResponse, MessageType, XySineResponse};

    use super::*;

    fn envelope_of(mut frame: BytesMut) -> lodestone_proto::Envelope {
        let payload: Bytes = decode_frame(&mut frame, MAX_MESSAGE_SIZE).unwrap().unwrap();
        assert!(frame.is_empty());
        decode_envelope(&payload).unwrap()
    }

    fn big_sine(points: usize) -> Response {
        Response::XySine(XySineResponse {
            x: vec![0.5; points],
            y: vec![0.5; points],
            status: "OK".to_string(),
        })
    }

    #[test]
    fn frames_a_typed_response() {
        let responder = Responder::new(MAX_MESSAGE_SIZE);
        let frame = responder
            .frame_response(&big_sine(3), &BTreeMap::new())
            .unwrap();

        let envelope = envelope_of(frame);
        assert_eq!(envelope.message_type, MessageType::XySineResponse);
        let body: XySineResponse = envelope.decode_payload().unwrap();
        assert_eq!(body.x.len(), 3);
    }

    #[test]
    fn oversized_response_becomes_message_too_large() {
        let responder = Responder::new(1024);
        let err = responder
            .try_frame(&big_sine(1000), &BTreeMap::new())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MessageTooLarge);

        let frame = responder
            .frame_response(&big_sine(1000), &BTreeMap::new())
            .unwrap();
        let envelope = envelope_of(frame);
        assert_eq!(envelope.message_type, MessageType::ErrorResponse);
        let body: ErrorResponse = envelope.decode_payload().unwrap();
        assert_eq!(body.error_code(), ErrorCode::MessageTooLarge);
    }

    #[test]
    fn drops_when_even_the_error_does_not_fit() {
        let responder = Responder::new(4);
        assert!(responder
            .frame_response(&big_sine(10), &BTreeMap::new())
            .is_none());
    }

    #[test]
    fn echoes_only_trace_id() {
        let mut request = BTreeMap::new();
        request.insert("trace_id".to_string(), "t-1".to_string());
        request.insert("client".to_string(), "cli".to_string());

        let echoed = response_metadata(&request);
        assert_eq!(echoed.len(), 1);
        assert_eq!(echoed["trace_id"], "t-1");
        assert!(response_metadata(&BTreeMap::new()).is_empty());
    }
}
