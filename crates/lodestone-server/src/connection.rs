use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;

use lodestone_proto::decode_envelope;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::{debug, info, warn};

use crate::error::RequestError;
use crate::registry::ConnectionId;
use crate::server::Shared;

const READ_CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// Write side of one client connection.
///
/// Once disconnected, nothing more is written.
#[derive(Debug)]
pub struct Connection<W> {
    id: ConnectionId,
    writer: W,
    state: ConnectionState,
}

impl<W: AsyncWrite + Unpin> Connection<W> {
    pub fn new(id: ConnectionId, writer: W) -> Self {
        Self {
            id,
            writer,
            state: ConnectionState::Connected,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Write one complete frame. A failed write disconnects.
    pub async fn write_frame(&mut self, frame: &[u8]) -> bool {
        if !self.is_connected() {
            return false;
        }
        let result = match self.writer.write_all(frame).await {
            Ok(()) => self.writer.flush().await,
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => true,
            Err(err) => {
                debug!(conn = %self.id, error = %err, "write failed; marking disconnected");
                self.mark_disconnected();
                false
            }
        }
    }
}

/// Feed freshly read bytes through the connection's receive buffer and
/// answer every complete frame, in order.
pub(crate) async fn handle_bytes<W: AsyncWrite + Unpin>(
    shared: &Shared,
    conn: &mut Connection<W>,
    bytes: &[u8],
) {
    if !shared.connections.append(conn.id(), bytes) {
        return;
    }

    while conn.is_connected() {
        match shared.connections.next_frame(conn.id()) {
            Ok(Some(frame)) => handle_frame(shared, conn, &frame).await,
            Ok(None) => break,
            Err(err) => {
                let err = RequestError::from(err);
                shared
                    .responder
                    .send(conn, err.into(), &BTreeMap::new())
                    .await;
            }
        }
    }
}

async fn handle_frame<W: AsyncWrite + Unpin>(
    shared: &Shared,
    conn: &mut Connection<W>,
    frame: &[u8],
) {
    match decode_envelope(frame) {
        Ok(envelope) => {
            debug!(message_type = %envelope.message_type, len = frame.len(), "request");
            let response = shared.dispatcher.dispatch(&envelope);
            shared
                .responder
                .send(conn, response, &envelope.metadata)
                .await;
        }
        Err(err) => {
            debug!(error = %err, len = frame.len(), "rejected envelope");
            shared
                .responder
                .send(conn, RequestError::from(err).into(), &BTreeMap::new())
                .await;
        }
    }
}

/// Releases a connection's server-side state when dropped: its receive
/// buffer and every job it owns.
///
/// Created before the connection task is spawned, so an aborted or
/// panicked task still cleans up.
pub(crate) struct Teardown {
    shared: Arc<Shared>,
    id: ConnectionId,
}

impl Teardown {
    pub(crate) fn new(shared: Arc<Shared>, id: ConnectionId) -> Self {
        Self { shared, id }
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        let discarded = self.shared.connections.remove(self.id).unwrap_or(0);
        let cancelled = self.shared.jobs.cancel_owned_by(self.id);
        info!(
            conn = %self.id,
            discarded_bytes = discarded,
            cancelled_jobs = cancelled,
            "client disconnected"
        );
    }
}

/// Serve one accepted stream until the peer goes away.
pub(crate) async fn serve_connection(teardown: Teardown, stream: UnixStream) {
    let (mut reader, writer) = stream.into_split();
    let mut conn = Connection::new(teardown.id, writer);
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];

    while conn.is_connected() {
        match reader.read(&mut chunk).await {
            Ok(0) => {
                debug!("peer closed connection");
                break;
            }
            Ok(n) => handle_bytes(&teardown.shared, &mut conn, &chunk[..n]).await,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!(error = %err, "read failed");
                break;
            }
        }
    }

    conn.mark_disconnected();
}
