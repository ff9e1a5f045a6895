use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::{Bytes, BytesMut};
use lodestone_frame::{decode_frame, FrameError};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Identity of one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Receive buffers of every live connection.
///
/// This is the only path to the buffers. Each method holds the lock for the
/// map access alone, so nothing a caller does between calls (running a
/// handler, writing to a socket) can contend with another connection's
/// bytes.
pub struct ConnectionRegistry {
    buffers: Mutex<HashMap<ConnectionId, BytesMut>>,
    next_id: AtomicU64,
    max_frame_size: usize,
}

impl ConnectionRegistry {
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            buffers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            max_frame_size,
        }
    }

    /// Allocate an identity and an empty receive buffer for a new connection.
    pub fn register(&self) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock()
            .insert(id, BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY));
        id
    }

    /// Append received bytes. Returns `false` if the connection is gone.
    pub fn append(&self, id: ConnectionId, bytes: &[u8]) -> bool {
        match self.lock().get_mut(&id) {
            Some(buf) => {
                buf.extend_from_slice(bytes);
                true
            }
            None => false,
        }
    }

    /// Pull the next complete frame out of a connection's buffer.
    ///
    /// `Ok(None)` means the buffer holds no complete frame (or the connection
    /// is gone). An oversized frame empties the buffer and returns
    /// [`FrameError::MessageTooLarge`].
    pub fn next_frame(&self, id: ConnectionId) -> Result<Option<Bytes>, FrameError> {
        match self.lock().get_mut(&id) {
            Some(buf) => decode_frame(buf, self.max_frame_size),
            None => Ok(None),
        }
    }

    /// Bytes buffered for a connection, or `None` if it is not registered.
    pub fn buffered(&self, id: ConnectionId) -> Option<usize> {
        self.lock().get(&id).map(BytesMut::len)
    }

    /// Forget a connection. Returns how many buffered bytes were discarded.
    pub fn remove(&self, id: ConnectionId) -> Option<usize> {
        self.lock().remove(&id).map(|buf| buf.len())
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, BytesMut>> {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
