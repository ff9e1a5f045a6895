//! Minimal clients for the lodestone protocol.
//!
//! [`Client`] is blocking and suits tests and scripts; [`AsyncClient`] runs on
//! tokio. Both send one envelope per frame and read responses in order.

use std::collections::BTreeMap;
use std::path::Path;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use lodestone_frame::{FrameCodec, FrameConfig, FrameError, FrameReader, FrameWriter};
use lodestone_proto::{
    decode_envelope, encode_envelope, Capabilities, CapabilitiesRequest, CapabilitiesResponse,
    Envelope, MessageType, XySineRequest, XySineResponse,
};
use lodestone_transport::{AsyncUnixDomainSocket, IpcStream, UnixDomainSocket};
use prost::Message;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tokio_util::codec::Framed;

use crate::error::ClientError;

/// Blocking client.
pub struct Client {
    reader: FrameReader<IpcStream>,
    writer: FrameWriter<IpcStream>,
    metadata: BTreeMap<String, String>,
}

impl Client {
    pub fn connect(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        Self::connect_with_config(path, FrameConfig::default())
    }

    /// Connect with explicit frame limits and timeouts.
    pub fn connect_with_config(
        path: impl AsRef<Path>,
        config: FrameConfig,
    ) -> Result<Self, ClientError> {
        let stream = UnixDomainSocket::connect(path)?;
        let write_half = stream.try_clone()?;
        Ok(Self {
            reader: FrameReader::from_ipc_stream(stream, config.clone())?,
            writer: FrameWriter::from_ipc_stream(write_half, config)?,
            metadata: BTreeMap::new(),
        })
    }

    /// Attach a metadata entry to every request sent from now on.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Wrap `payload` in an envelope and send it as one frame.
    pub fn send(&mut self, message_type: MessageType, payload: &[u8]) -> Result<(), ClientError> {
        let envelope = encode_envelope(message_type, payload.to_vec(), &self.metadata);
        self.send_frame(&envelope)
    }

    /// Send arbitrary bytes as one frame.
    pub fn send_frame(&mut self, envelope: &[u8]) -> Result<(), ClientError> {
        self.writer.send(envelope)?;
        Ok(())
    }

    /// Write bytes with no framing at all.
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        self.writer.send_raw(bytes)?;
        Ok(())
    }

    /// Read the next response envelope.
    pub fn recv(&mut self) -> Result<Envelope, ClientError> {
        match self.reader.read_frame() {
            Ok(frame) => Ok(decode_envelope(&frame)?),
            Err(FrameError::ConnectionClosed) => Err(ClientError::Closed),
            Err(err) => Err(err.into()),
        }
    }

    /// Send a typed request and read one response.
    pub fn request<M: Message>(
        &mut self,
        message_type: MessageType,
        message: &M,
    ) -> Result<Envelope, ClientError> {
        self.send(message_type, &message.encode_to_vec())?;
        self.recv()
    }

    pub fn capabilities(&mut self) -> Result<Capabilities, ClientError> {
        let envelope = self.request(MessageType::CapabilitiesRequest, &CapabilitiesRequest {})?;
        let response: CapabilitiesResponse =
            expect_response(envelope, MessageType::CapabilitiesResponse)?;
        Ok(response.capabilities.unwrap_or_default())
    }

    pub fn xy_sine(&mut self, request: &XySineRequest) -> Result<XySineResponse, ClientError> {
        let envelope = self.request(MessageType::XySineRequest, request)?;
        expect_response(envelope, MessageType::XySineResponse)
    }
}

/// Client driven by a tokio runtime.
pub struct AsyncClient {
    framed: Framed<UnixStream, FrameCodec>,
    metadata: BTreeMap<String, String>,
}

impl AsyncClient {
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let stream = AsyncUnixDomainSocket::connect(path).await?;
        Ok(Self {
            framed: Framed::new(stream, FrameCodec::new()),
            metadata: BTreeMap::new(),
        })
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub async fn send(
        &mut self,
        message_type: MessageType,
        payload: &[u8],
    ) -> Result<(), ClientError> {
        let envelope = encode_envelope(message_type, payload.to_vec(), &self.metadata);
        self.send_frame(envelope).await
    }

    /// Send arbitrary bytes as one frame.
    pub async fn send_frame(&mut self, envelope: impl Into<Bytes>) -> Result<(), ClientError> {
        self.framed.send(envelope.into()).await?;
        Ok(())
    }

    /// Write bytes with no framing at all.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> Result<(), ClientError> {
        let stream = self.framed.get_mut();
        stream.write_all(bytes).await.map_err(FrameError::Io)?;
        stream.flush().await.map_err(FrameError::Io)?;
        Ok(())
    }

    pub async fn recv(&mut self) -> Result<Envelope, ClientError> {
        match self.framed.next().await {
            Some(Ok(frame)) => Ok(decode_envelope(&frame)?),
            Some(Err(FrameError::ConnectionClosed)) | None => Err(ClientError::Closed),
            Some(Err(err)) => Err(err.into()),
        }
    }

    pub async fn request<M: Message>(
        &mut self,
        message_type: MessageType,
        message: &M,
    ) -> Result<Envelope, ClientError> {
        self.send(message_type, &message.encode_to_vec()).await?;
        self.recv().await
    }

    pub async fn capabilities(&mut self) -> Result<Capabilities, ClientError> {
        let envelope = self
            .request(MessageType::CapabilitiesRequest, &CapabilitiesRequest {})
            .await?;
        let response: CapabilitiesResponse =
            expect_response(envelope, MessageType::CapabilitiesResponse)?;
        Ok(response.capabilities.unwrap_or_default())
    }

    pub async fn xy_sine(
        &mut self,
        request: &XySineRequest,
    ) -> Result<XySineResponse, ClientError> {
        let envelope = self.request(MessageType::XySineRequest, request).await?;
        expect_response(envelope, MessageType::XySineResponse)
    }
}

/// Decode `envelope` as `expected`, surfacing error responses as
/// [`ClientError::Server`].
fn expect_response<M: Message + Default>(
    envelope: Envelope,
    expected: MessageType,
) -> Result<M, ClientError> {
    match envelope.message_type {
        found if found == expected => Ok(envelope.decode_payload()?),
        MessageType::ErrorResponse => Err(ClientError::Server(envelope.decode_payload()?)),
        found => Err(ClientError::UnexpectedResponse { expected, found }),
    }
}

#[cfg(test)]
mod tests {
    use lodestone_proto::ErrorCode;

    use super::*;
    use crate::error::RequestError;

    #[test]
    fn expected_type_decodes() {
        let response = XySineResponse {
            x: vec![0.0],
            y: vec![1.0],
            status: "OK".to_string(),
        };
        let envelope = Envelope::from_message(MessageType::XySineResponse, &response);
        let decoded: XySineResponse =
            expect_response(envelope, MessageType::XySineResponse).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn error_response_surfaces_server_code() {
        let envelope = Envelope::from_message(
            MessageType::ErrorResponse,
            &RequestError::invalid_parameter("samples").to_response(),
        );
        let err = expect_response::<XySineResponse>(envelope, MessageType::XySineResponse)
            .unwrap_err();
        assert_eq!(err.server_code(), Some(ErrorCode::InvalidParameterValue));
    }

    #[test]
    fn other_types_are_unexpected() {
        let envelope = Envelope::new(MessageType::CapabilitiesResponse, Bytes::new());
        let err = expect_response::<XySineResponse>(envelope, MessageType::XySineResponse)
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::UnexpectedResponse {
                expected: MessageType::XySineResponse,
                found: MessageType::CapabilitiesResponse,
            }
        ));
    }
}
