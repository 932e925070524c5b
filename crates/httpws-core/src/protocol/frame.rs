//! Frame header parsing (panic-free).
//!
//! Parsing rules:
//! - Never index (`buf[0]`); always use `Buf` and `remaining()` checks.
//! - The length guard runs before any body is read or allocated.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{ProtocolViolation, Result, TunnelError};

/// Header size: body length (u32) + protocol id (u16).
pub const HEADER_LEN: usize = 6;

/// The only protocol id spoken today (protobuf envelope).
pub const PROTOCOL_ID: u16 = 0x01;

/// Upper bound for a frame body (128 MiB).
pub const MAX_BODY_LEN: u32 = 128 * 1024 * 1024;

/// Parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Body length, excluding the header itself.
    pub body_len: u32,
    /// Protocol id (always `PROTOCOL_ID` once parsed).
    pub protocol_id: u16,
}

impl FrameHeader {
    /// Parse and validate a header from the first `HEADER_LEN` bytes of `buf`.
    pub fn parse(mut buf: &[u8]) -> Result<Self> {
        if buf.remaining() < HEADER_LEN {
            return Err(TunnelError::Transport("frame header too short".into()));
        }

        let body_len = buf.get_u32();
        if body_len > MAX_BODY_LEN {
            return Err(ProtocolViolation::Oversize {
                len: body_len,
                max: MAX_BODY_LEN,
            }
            .into());
        }

        let protocol_id = buf.get_u16();
        if protocol_id != PROTOCOL_ID {
            return Err(ProtocolViolation::BadVersion(protocol_id).into());
        }

        Ok(Self {
            body_len,
            protocol_id,
        })
    }

    pub fn body_len(&self) -> usize {
        self.body_len as usize
    }
}

/// A complete frame as read off the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub body: Bytes,
}

/// Prefix `body` with a frame header. The result is one contiguous buffer so
/// it can be handed to the link as a single write.
pub fn encode_frame(body: &[u8]) -> Result<Bytes> {
    let len = u32::try_from(body.len())
        .ok()
        .filter(|len| *len <= MAX_BODY_LEN)
        .ok_or_else(|| {
            TunnelError::Encode(format!(
                "frame body of {} bytes exceeds limit of {MAX_BODY_LEN}",
                body.len()
            ))
        })?;

    let mut out = BytesMut::with_capacity(HEADER_LEN + body.len());
    out.put_u32(len);
    out.put_u16(PROTOCOL_ID);
    out.put_slice(body);
    Ok(out.freeze())
}
