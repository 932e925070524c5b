//! Shared error type across httpws crates.

use thiserror::Error;

/// Stable error classification.
///
/// Fatal kinds tear the whole channel down because the byte alignment of the
/// stream can no longer be trusted; everything else is scoped to one frame or
/// one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Short read/write or a failed link.
    Transport,
    /// Bad protocol id, oversize body, unsupported link message kind.
    Protocol,
    /// Envelope could not be serialized.
    Encode,
    /// Envelope bytes are malformed.
    Decode,
    /// Envelope decoded but is not a valid Request-xor-Response.
    Application,
    /// Unmatched, mismatched, or duplicate correlation id.
    Correlation,
    /// Request rejected before any I/O (zero id, unusable verb/path).
    Request,
    /// No matching response before the caller's deadline.
    Timeout,
    /// Channel lifecycle ended while the call was pending.
    ChannelClosed,
    /// Invalid configuration.
    Config,
}

impl ErrorKind {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Transport => "TRANSPORT",
            ErrorKind::Protocol => "PROTOCOL",
            ErrorKind::Encode => "ENCODE",
            ErrorKind::Decode => "DECODE",
            ErrorKind::Application => "APPLICATION",
            ErrorKind::Correlation => "CORRELATION",
            ErrorKind::Request => "REQUEST",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::ChannelClosed => "CHANNEL_CLOSED",
            ErrorKind::Config => "CONFIG",
        }
    }

    /// Whether an error of this kind ends the channel.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            ErrorKind::Transport | ErrorKind::Protocol | ErrorKind::Decode
        )
    }
}

/// Framing-level violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("frame body of {len} bytes exceeds limit of {max}")]
    Oversize { len: u32, max: u32 },
    #[error("unsupported protocol id {0}")]
    BadVersion(u16),
    #[error("unsupported link message kind: {0}")]
    UnsupportedMessageKind(&'static str),
}

/// Request/response correlation faults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelationFault {
    #[error("no pending request for id {0}")]
    Unmatched(u64),
    #[error("response id {got} does not match request id {expected}")]
    IdMismatch { expected: u64, got: u64 },
    #[error("request id {0} is already pending")]
    DuplicateId(u64),
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TunnelError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum TunnelError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("protocol: {0}")]
    Protocol(#[from] ProtocolViolation),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("invalid envelope: {0}")]
    Application(String),
    #[error("correlation: {0}")]
    Correlation(#[from] CorrelationFault),
    #[error("bad request: {0}")]
    Request(String),
    #[error("request timed out")]
    Timeout,
    #[error("channel closed")]
    ChannelClosed,
    #[error("config: {0}")]
    Config(String),
}

impl TunnelError {
    /// Request with a zero id.
    pub fn empty_id() -> Self {
        TunnelError::Request("empty id".into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TunnelError::Transport(_) => ErrorKind::Transport,
            TunnelError::Protocol(_) => ErrorKind::Protocol,
            TunnelError::Encode(_) => ErrorKind::Encode,
            TunnelError::Decode(_) => ErrorKind::Decode,
            TunnelError::Application(_) => ErrorKind::Application,
            TunnelError::Correlation(_) => ErrorKind::Correlation,
            TunnelError::Request(_) => ErrorKind::Request,
            TunnelError::Timeout => ErrorKind::Timeout,
            TunnelError::ChannelClosed => ErrorKind::ChannelClosed,
            TunnelError::Config(_) => ErrorKind::Config,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }
}

impl From<prost::DecodeError> for TunnelError {
    fn from(e: prost::DecodeError) -> Self {
        TunnelError::Decode(e.to_string())
    }
}
