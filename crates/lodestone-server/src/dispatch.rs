use std::collections::HashMap;

use lodestone_proto::{
    Capabilities, CapabilitiesResponse, Envelope, ErrorResponse, MessageType, XySineResponse,
};
use prost::Message;
use tracing::debug;

use crate::error::RequestError;
use crate::handlers;

/// State shared read-only by every handler.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub capabilities: Capabilities,
}

/// A handler turns one validated envelope into a response.
///
/// Handlers run synchronously on the connection's task and must be bounded:
/// no blocking I/O, no waiting.
pub type Handler = fn(&HandlerContext, &Envelope) -> Result<Response, RequestError>;

/// Everything a handler can send back.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Capabilities(CapabilitiesResponse),
    XySine(XySineResponse),
    Error(ErrorResponse),
}

impl Response {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Capabilities(_) => MessageType::CapabilitiesResponse,
            Self::XySine(_) => MessageType::XySineResponse,
            Self::Error(_) => MessageType::ErrorResponse,
        }
    }

    /// Serialize the typed payload.
    pub fn encode_payload(&self) -> Result<Vec<u8>, prost::EncodeError> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        match self {
            Self::Capabilities(message) => message.encode(&mut buf)?,
            Self::XySine(message) => message.encode(&mut buf)?,
            Self::Error(message) => message.encode(&mut buf)?,
        }
        Ok(buf)
    }

    fn encoded_len(&self) -> usize {
        match self {
            Self::Capabilities(message) => message.encoded_len(),
            Self::XySine(message) => message.encoded_len(),
            Self::Error(message) => message.encoded_len(),
        }
    }
}

impl From<RequestError> for Response {
    fn from(err: RequestError) -> Self {
        Self::Error(err.to_response())
    }
}

/// Routes envelopes to handlers by message type.
pub struct Dispatcher {
    handlers: HashMap<MessageType, Handler>,
    context: HandlerContext,
}

impl Dispatcher {
    /// A dispatcher with no handlers.
    pub fn new(context: HandlerContext) -> Self {
        Self {
            handlers: HashMap::new(),
            context,
        }
    }

    /// A dispatcher serving capabilities and XY sine requests.
    pub fn with_default_handlers(context: HandlerContext) -> Self {
        let mut dispatcher = Self::new(context);
        dispatcher.register(
            MessageType::CapabilitiesRequest,
            handlers::capabilities::handle,
        );
        dispatcher.register(MessageType::XySineRequest, handlers::xy_sine::handle);
        dispatcher
    }

    /// Route `message_type` to `handler`, returning the handler it replaces.
    pub fn register(&mut self, message_type: MessageType, handler: Handler) -> Option<Handler> {
        self.handlers.insert(message_type, handler)
    }

    pub fn handles(&self, message_type: MessageType) -> bool {
        self.handlers.contains_key(&message_type)
    }

    pub fn context(&self) -> &HandlerContext {
        &self.context
    }

    /// Run the handler for `envelope`. Failures become error responses.
    pub fn dispatch(&self, envelope: &Envelope) -> Response {
        let Some(handler) = self.handlers.get(&envelope.message_type) else {
            debug!(message_type = %envelope.message_type, "no handler registered");
            return RequestError::unhandled_message_type(envelope.message_type).into();
        };

        match handler(&self.context, envelope) {
            Ok(response) => response,
            Err(err) => {
                debug!(message_type = %envelope.message_type, error = %err, "request rejected");
                err.into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use lodestone_proto::{ErrorCode, XySineRequest};

    use super::*;
    use crate::handlers::capabilities::server_capabilities;

    fn dispatcher() -> Dispatcher {
        Dispatcher::with_default_handlers(HandlerContext {
            capabilities: server_capabilities(2),
        })
    }

    fn error_code(response: &Response) -> ErrorCode {
        match response {
            Response::Error(err) => err.error_code(),
            other => panic!("expected error response, got {other:?}"),
        }
    }

    #[test]
    fn default_handlers_are_registered() {
        let dispatcher = dispatcher();
        assert!(dispatcher.handles(MessageType::CapabilitiesRequest));
        assert!(dispatcher.handles(MessageType::XySineRequest));
        assert!(!dispatcher.handles(MessageType::ErrorResponse));
    }

    #[test]
    fn routes_by_message_type() {
        let dispatcher = dispatcher();

        let request = Envelope::new(MessageType::CapabilitiesRequest, Bytes::new());
        let response = dispatcher.dispatch(&request);
        assert_eq!(response.message_type(), MessageType::CapabilitiesResponse);

        let request = XySineRequest {
            samples: 4,
            ..XySineRequest::default()
        };
        let response =
            dispatcher.dispatch(&Envelope::from_message(MessageType::XySineRequest, &request));
        assert_eq!(response.message_type(), MessageType::XySineResponse);
    }

    #[test]
    fn unhandled_types_are_unknown() {
        let dispatcher = dispatcher();
        for message_type in [
            MessageType::CapabilitiesResponse,
            MessageType::XySineResponse,
            MessageType::ErrorResponse,
        ] {
            let response = dispatcher.dispatch(&Envelope::new(message_type, Bytes::new()));
            assert_eq!(error_code(&response), ErrorCode::UnknownMessageType);
        }
    }

    #[test]
    fn handler_errors_become_error_responses() {
        let response = dispatcher().dispatch(&Envelope::new(
            MessageType::XySineRequest,
            vec![0xFFu8, 0xFF, 0xFF],
        ));
        assert_eq!(error_code(&response), ErrorCode::ProtobufParseError);
    }

    #[test]
    fn register_replaces_existing_handler() {
        fn always_fails(_: &HandlerContext, _: &Envelope) -> Result<Response, RequestError> {
            Err(RequestError::internal("replaced"))
        }

        let mut dispatcher = dispatcher();
        assert!(dispatcher
            .register(MessageType::CapabilitiesRequest, always_fails)
            .is_some());

        let request = Envelope::new(MessageType::CapabilitiesRequest, Bytes::new());
        let response = dispatcher.dispatch(&request);
        assert_eq!(error_code(&response), ErrorCode::InternalError);
    }

    #[test]
    fn payload_encoding_matches_message() {
        let response = Response::Error(RequestError::internal("x").to_response());
        let bytes = response.encode_payload().unwrap();
        assert_eq!(ErrorResponse::decode(bytes.as_slice()).unwrap().message, "x");
    }
}
