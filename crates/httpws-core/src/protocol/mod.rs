//! Protocol modules (frame header + envelope).
//!
//! This module hosts the two layers of the tunnel wire format:
//! - Frame: 6-byte header (`u32` BE body length, `u16` BE protocol id).
//! - Envelope: protobuf-encoded Request/Response union carried in the body.
//!
//! All parsers are panic-free: malformed input is reported as `TunnelError`
//! instead of panicking or indexing raw buffers.

pub mod envelope;
pub mod frame;
