//! Request handlers, one per request type.
//!
//! Each handler parses its own payload (the envelope layer never does) and
//! validates every parameter before doing any work.

pub mod capabilities;
pub mod xy_sine;
