use lodestone_proto::{
    Capabilities, CapabilitiesRequest, CapabilitiesResponse, Envelope, MessageType,
};

use crate::dispatch::{HandlerContext, Response};
use crate::error::RequestError;

/// Feature id of the XY sine handler.
pub const FEATURE_XY_SINE: &str = "xy_sine";

/// Protocol version string advertised to clients.
pub const PROTOCOL_VERSION_STRING: &str = "1.0";

/// The capability set this build of the server advertises.
pub fn server_capabilities(max_concurrency: u32) -> Capabilities {
    Capabilities {
        server_version: format!("lodestone-{}", env!("CARGO_PKG_VERSION")),
        supported_features: vec![FEATURE_XY_SINE.to_string()],
        max_concurrency,
        protocol_version: PROTOCOL_VERSION_STRING.to_string(),
    }
}

pub fn handle(ctx: &HandlerContext, envelope: &Envelope) -> Result<Response, RequestError> {
    envelope
        .decode_payload::<CapabilitiesRequest>()
        .map_err(|err| RequestError::payload_parse(MessageType::CapabilitiesRequest, err))?;

    Ok(Response::Capabilities(CapabilitiesResponse {
        capabilities: Some(ctx.capabilities.clone()),
    }))
}
