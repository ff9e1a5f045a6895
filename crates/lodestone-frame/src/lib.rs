//! Length-prefixed framing for lodestone envelopes.
//!
//! Every serialized envelope travels on the wire behind a 4-byte
//! little-endian length. This crate turns a byte stream back into those
//! discrete frames: partial reads are reassembled, pipelined frames are
//! drained one at a time, and a length above the configured ceiling
//! discards everything buffered so far.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::FrameCodec;
pub use codec::{decode_frame, encode_frame, FrameConfig, HEADER_SIZE, MAX_MESSAGE_SIZE};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
