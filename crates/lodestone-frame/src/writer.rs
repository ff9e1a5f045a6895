use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use lodestone_transport::IpcStream;

use crate::codec::{encode_frame, FrameConfig};
use crate::error::{FrameError, Result};

/// Blocking frame sink over any [`Write`].
///
/// Every call writes and flushes one whole unit before returning.
pub struct FrameWriter<T> {
    inner: T,
    scratch: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            scratch: BytesMut::new(),
            config,
        }
    }

    /// Length-prefix `payload` and write it out.
    ///
    /// A payload above the configured ceiling is refused before anything
    /// reaches the stream.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        let max = self.config.max_payload_size;
        if payload.len() > max {
            return Err(FrameError::MessageTooLarge {
                size: payload.len(),
                max,
            });
        }

        self.scratch.clear();
        encode_frame(payload, &mut self.scratch)?;
        self.inner
            .write_all(&self.scratch)
            .map_err(closed_or_io)?;
        self.flush()
    }

    /// Write bytes exactly as given, with no length prefix.
    ///
    /// Lets test peers put deliberately malformed input on the wire.
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes).map_err(closed_or_io)?;
        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(closed_or_io)
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

impl FrameWriter<IpcStream> {
    /// Writer over a socket stream, with the configured write timeout applied.
    pub fn from_ipc_stream(inner: IpcStream, config: FrameConfig) -> Result<Self> {
        inner.set_write_timeout(config.write_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}

/// A stream that stops accepting bytes has gone away.
fn closed_or_io(err: std::io::Error) -> FrameError {
    match err.kind() {
        ErrorKind::WriteZero | ErrorKind::BrokenPipe => FrameError::ConnectionClosed,
        _ => FrameError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};

    use super::*;
    use crate::codec::decode_frame;

    fn drain(mut wire: BytesMut) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(frame) = decode_frame(&mut wire, usize::MAX).unwrap() {
            out.push(frame.to_vec());
        }
        assert!(wire.is_empty());
        out
    }

    fn output(writer: FrameWriter<Cursor<Vec<u8>>>) -> BytesMut {
        BytesMut::from(writer.into_inner().into_inner().as_slice())
    }

    /// Records bytes one at a time and counts flushes.
    #[derive(Default)]
    struct Recorder {
        bytes: Vec<u8>,
        flushes: usize,
    }

    impl Write for Recorder {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            match buf.first() {
                Some(&byte) => {
                    self.bytes.push(byte);
                    Ok(1)
                }
                None => Ok(0),
            }
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    struct Full;

    impl Write for Full {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn header_is_little_endian_length() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::new()));
        writer.send(b"hello").unwrap();

        let wire = output(writer);
        assert_eq!(&wire[..4], &[5, 0, 0, 0]);
        assert_eq!(&wire[4..], b"hello");
    }

    #[test]
    fn consecutive_sends_stay_separate() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::new()));
        for payload in [b"one".as_slice(), b"".as_slice(), b"three".as_slice()] {
            writer.send(payload).unwrap();
        }

        assert_eq!(
            drain(output(writer)),
            vec![b"one".to_vec(), Vec::new(), b"three".to_vec()]
        );
    }

    #[test]
    fn oversized_payload_never_reaches_the_stream() {
        let config = FrameConfig {
            max_payload_size: 4,
            ..FrameConfig::default()
        };
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::new()), config);

        assert!(matches!(
            writer.send(b"oversized"),
            Err(FrameError::MessageTooLarge { size: 9, max: 4 })
        ));
        assert!(output(writer).is_empty());
    }

    #[test]
    fn raw_bytes_pass_through_unframed() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::new()));
        writer.send_raw(&[0xFF, 0xFF, 0xFF, 0xFF]).unwrap();
        assert_eq!(output(writer).as_ref(), &[0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn short_writes_complete_and_each_send_flushes() {
        let mut writer = FrameWriter::new(Recorder::default());
        writer.send(b"chunked").unwrap();
        writer.send_raw(b"!").unwrap();

        let recorder = writer.into_inner();
        assert_eq!(recorder.flushes, 2);
        assert_eq!(&recorder.bytes[4..11], b"chunked");
        assert_eq!(recorder.bytes.last(), Some(&b'!'));
    }

    #[test]
    fn stream_that_accepts_nothing_is_closed() {
        let mut writer = FrameWriter::new(Full);
        assert!(matches!(
            writer.send(b"data"),
            Err(FrameError::ConnectionClosed)
        ));
    }
}
