use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use lodestone_transport::IpcStream;
use tracing::trace;

use crate::codec::{decode_frame, FrameConfig};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Blocking frame source over any [`Read`].
///
/// Bytes are pulled in chunks into a pending buffer and handed out one
/// envelope at a time, so short reads and pipelined frames both look the
/// same to the caller.
pub struct FrameReader<T> {
    inner: T,
    pending: BytesMut,
    chunk: Box<[u8]>,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            pending: BytesMut::new(),
            chunk: vec![0u8; READ_CHUNK_SIZE].into_boxed_slice(),
            config,
        }
    }

    /// Block until one whole envelope has arrived.
    ///
    /// End of stream yields [`FrameError::ConnectionClosed`], mid-frame or
    /// not. An oversized length empties the pending buffer and the reader
    /// stays usable.
    pub fn read_frame(&mut self) -> Result<Bytes> {
        loop {
            if let Some(frame) = decode_frame(&mut self.pending, self.config.max_payload_size)? {
                return Ok(frame);
            }
            self.fill()?;
        }
    }

    fn fill(&mut self) -> Result<()> {
        let read = loop {
            match self.inner.read(&mut self.chunk) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        };
        self.pending.extend_from_slice(&self.chunk[..read]);
        trace!(read, pending = self.pending.len(), "filled frame buffer");
        Ok(())
    }

    /// Bytes received but not yet returned.
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<IpcStream> {
    /// Reader over a socket stream, with the configured read timeout applied.
    pub fn from_ipc_stream(inner: IpcStream, config: FrameConfig) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}
