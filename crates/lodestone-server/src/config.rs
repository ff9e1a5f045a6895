use std::path::PathBuf;

use lodestone_frame::MAX_MESSAGE_SIZE;
use lodestone_transport::{resolve_endpoint, DEFAULT_ENDPOINT};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket path the server binds.
    pub endpoint: PathBuf,
    /// Ceiling on a serialized envelope, inbound and outbound. Default: 10 MiB.
    pub max_message_size: usize,
    /// Worker count advertised in capabilities. Advisory only.
    pub max_concurrency: u32,
}

impl ServerConfig {
    /// Configuration for an explicit socket path.
    pub fn new(endpoint: impl Into<PathBuf>) -> Self {
        Self {
            endpoint: endpoint.into(),
            max_message_size: MAX_MESSAGE_SIZE,
            max_concurrency: available_workers(),
        }
    }

    /// Configuration for an endpoint name, resolved the way clients resolve it.
    pub fn from_endpoint_name(name: &str) -> Self {
        Self::new(resolve_endpoint(name))
    }

    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: u32) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_endpoint_name(DEFAULT_ENDPOINT)
    }
}

fn available_workers() -> u32 {
    std::thread::available_parallelism()
        .map(|n| u32::try_from(n.get()).unwrap_or(u32::MAX))
        .unwrap_or(1)
}
