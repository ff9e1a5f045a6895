use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use lodestone_proto::Capabilities;
use lodestone_transport::AsyncUnixDomainSocket;
use tokio::task::JoinSet;
use tracing::{error, info, info_span, warn, Instrument};

use crate::config::ServerConfig;
use crate::connection::{serve_connection, Teardown};
use crate::dispatch::{Dispatcher, HandlerContext};
use crate::error::Result;
use crate::handlers::capabilities::server_capabilities;
use crate::jobs::JobRegistry;
use crate::registry::ConnectionRegistry;
use crate::responder::Responder;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// State every connection task shares.
pub(crate) struct Shared {
    pub(crate) connections: ConnectionRegistry,
    pub(crate) jobs: JobRegistry,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) responder: Responder,
}

impl Shared {
    pub(crate) fn new(config: &ServerConfig) -> Self {
        Self::with_dispatcher(
            config,
            Dispatcher::with_default_handlers(HandlerContext {
                capabilities: server_capabilities(config.max_concurrency),
            }),
        )
    }

    fn with_dispatcher(config: &ServerConfig, dispatcher: Dispatcher) -> Self {
        Self {
            connections: ConnectionRegistry::new(config.max_message_size),
            jobs: JobRegistry::new(),
            dispatcher,
            responder: Responder::new(config.max_message_size),
        }
    }
}

/// A bound lodestone server.
///
/// Binding claims the endpoint; [`run_until`](Self::run_until) accepts
/// clients until the shutdown future resolves, then closes every connection,
/// cancels every job and removes the socket file.
pub struct Server {
    socket: AsyncUnixDomainSocket,
    shared: Arc<Shared>,
}

impl Server {
    /// Bind the configured endpoint with the default handlers.
    ///
    /// Must be called inside a tokio runtime.
    pub fn bind(config: ServerConfig) -> Result<Self> {
        let shared = Shared::new(&config);
        Self::bind_shared(config, shared)
    }

    /// Bind the configured endpoint, routing requests through `dispatcher`.
    pub fn bind_with_dispatcher(config: ServerConfig, dispatcher: Dispatcher) -> Result<Self> {
        let shared = Shared::with_dispatcher(&config, dispatcher);
        Self::bind_shared(config, shared)
    }

    fn bind_shared(config: ServerConfig, shared: Shared) -> Result<Self> {
        let socket = AsyncUnixDomainSocket::bind(&config.endpoint)?;
        info!(
            path = ?socket.path(),
            max_message_size = config.max_message_size,
            max_concurrency = config.max_concurrency,
            "listening"
        );
        Ok(Self {
            socket,
            shared: Arc::new(shared),
        })
    }

    pub fn path(&self) -> &Path {
        self.socket.path()
    }

    /// A handle for observing the server while it runs.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Serve until the process is killed.
    pub async fn run(self) {
        self.run_until(std::future::pending()).await;
    }

    /// Serve until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let Self { socket, shared } = self;
        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
                accepted = socket.accept() => match accepted {
                    Ok(stream) => {
                        let id = shared.connections.register();
                        info!(conn = %id, active = shared.connections.len(), "client connected");
                        let teardown = Teardown::new(Arc::clone(&shared), id);
                        connections.spawn(
                            serve_connection(teardown, stream)
                                .instrument(info_span!("connection", id = %id)),
                        );
                    }
                    Err(err) => {
                        warn!(error = %err, "accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(err) = joined {
                        if err.is_panic() {
                            error!(error = %err, "connection task panicked");
                        }
                    }
                }
            }
        }

        let open = connections.len();
        connections.shutdown().await;
        let cancelled = shared.jobs.cancel_all();
        let path = socket.path().to_path_buf();
        drop(socket);
        info!(
            ?path,
            closed_connections = open,
            cancelled_jobs = cancelled,
            "server stopped"
        );
    }
}

/// Read-only view of a running server.
#[derive(Clone)]
pub struct ServerHandle {
    shared: Arc<Shared>,
}

impl ServerHandle {
    /// Connections currently registered.
    pub fn connection_count(&self) -> usize {
        self.shared.connections.len()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.shared.dispatcher.context().capabilities.clone()
    }

    pub fn jobs(&self) -> &JobRegistry {
        &self.shared.jobs
    }
}
