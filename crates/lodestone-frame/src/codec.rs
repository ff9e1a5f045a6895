use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::warn;

use crate::error::{FrameError, Result};

/// Frame header: little-endian payload length (4 bytes).
pub const HEADER_SIZE: usize = 4;

/// Largest serialized envelope accepted or produced: 10 MiB.
pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Encode one payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────────────┐
/// │ Length (4B)  │ Payload                  │
/// │ u32 LE       │ (Length bytes, envelope) │
/// └──────────────┴──────────────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(FrameError::MessageTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u32_le(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Extract one frame payload from a receive buffer.
///
/// Returns `Ok(None)` while the buffer holds less than a complete frame.
/// On success exactly one frame is consumed and anything after it stays in
/// `src` for the next call, so callers loop until `None` to drain pipelined
/// frames.
///
/// A declared length above `max_payload` clears all of `src` before
/// returning [`FrameError::MessageTooLarge`]: once a length can't be trusted
/// no later boundary can be either, and the next byte starts a fresh parse.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Bytes>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let mut header = [0u8; HEADER_SIZE];
    header.copy_from_slice(&src[..HEADER_SIZE]);
    let payload_len = u32::from_le_bytes(header) as usize;

    if payload_len > max_payload {
        warn!(
            size = payload_len,
            max = max_payload,
            discarded = src.len(),
            "oversized frame; discarding receive buffer"
        );
        src.clear();
        return Err(FrameError::MessageTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    Ok(Some(src.split_to(payload_len).freeze()))
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload (serialized envelope) size in bytes. Default: 10 MiB.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_MESSAGE_SIZE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        let payload = b"hello, lodestone!";

        encode_frame(payload, &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE + payload.len());
        assert_eq!(&buf[..HEADER_SIZE], &(payload.len() as u32).to_le_bytes());

        let frame = decode_frame(&mut buf, MAX_MESSAGE_SIZE).unwrap().unwrap();
        assert_eq!(frame.as_ref(), payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0x05, 0x00, 0x00][..]);
        let result = decode_frame(&mut buf, MAX_MESSAGE_SIZE).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), 3, "incomplete header must stay buffered");
    }

    #[test]
    fn test_decode_incomplete_payload() {
        let mut buf = BytesMut::new();
        encode_frame(b"hello", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2);

        let result = decode_frame(&mut buf, MAX_MESSAGE_SIZE).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), HEADER_SIZE + 2);
    }

    #[test]
    fn test_oversized_length_clears_whole_buffer() {
        let mut buf = BytesMut::new();
        buf.put_u32_le((MAX_MESSAGE_SIZE + 1) as u32);
        buf.put_slice(b"trailing bytes that belong to nothing");

        let result = decode_frame(&mut buf, MAX_MESSAGE_SIZE);
        assert!(matches!(
            result,
            Err(FrameError::MessageTooLarge { size, max })
                if size == MAX_MESSAGE_SIZE + 1 && max == MAX_MESSAGE_SIZE
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_fresh_parse_after_oversized_frame() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(u32::MAX);
        let _ = decode_frame(&mut buf, MAX_MESSAGE_SIZE);

        encode_frame(b"next", &mut buf).unwrap();
        let frame = decode_frame(&mut buf, MAX_MESSAGE_SIZE).unwrap().unwrap();
        assert_eq!(frame.as_ref(), b"next");
    }

    #[test]
    fn test_length_at_limit_is_accepted() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(16);
        buf.put_slice(&[7u8; 16]);

        let frame = decode_frame(&mut buf, 16).unwrap().unwrap();
        assert_eq!(frame.len(), 16);
    }

    #[test]
    fn test_multiple_frames() {
        let mut buf = BytesMut::new();
        encode_frame(b"first", &mut buf).unwrap();
        encode_frame(b"second", &mut buf).unwrap();
        buf.put_slice(&[0x03, 0x00]);

        let f1 = decode_frame(&mut buf, MAX_MESSAGE_SIZE).unwrap().unwrap();
        assert_eq!(f1.as_ref(), b"first");

        let f2 = decode_frame(&mut buf, MAX_MESSAGE_SIZE).unwrap().unwrap();
        assert_eq!(f2.as_ref(), b"second");

        assert!(decode_frame(&mut buf, MAX_MESSAGE_SIZE).unwrap().is_none());
        assert_eq!(buf.as_ref(), &[0x03, 0x00]);
    }

    #[test]
    fn test_empty_payload() {
        let mut buf = BytesMut::new();
        encode_frame(b"", &mut buf).unwrap();

        let frame = decode_frame(&mut buf, MAX_MESSAGE_SIZE).unwrap().unwrap();
        assert!(frame.is_empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_default_config_uses_message_ceiling() {
        let cfg = FrameConfig::default();
        assert_eq!(cfg.max_payload_size, 10 * 1024 * 1024);
        assert!(cfg.read_timeout.is_none());
    }
}
