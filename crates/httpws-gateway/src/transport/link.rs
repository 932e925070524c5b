//! Message-oriented duplex link, split into its read and write halves.
//!
//! The read half is owned by a channel's read loop and the write half by its
//! dispatch loop, so neither side needs a lock.

use async_trait::async_trait;
use httpws_core::error::Result;

/// One message as delivered by the underlying link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkMessage {
    Binary(Vec<u8>),
    Text(String),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

impl LinkMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            LinkMessage::Binary(_) => "binary",
            LinkMessage::Text(_) => "text",
            LinkMessage::Ping(_) => "ping",
            LinkMessage::Pong(_) => "pong",
            LinkMessage::Close => "close",
        }
    }
}

/// Read half: yields whole messages in order.
#[async_trait]
pub trait LinkRead: Send + 'static {
    /// Next message. A closed or failed link is a `TunnelError::Transport`.
    async fn read_message(&mut self) -> Result<LinkMessage>;
}

/// Write half: every call is exactly one binary message on the link.
#[async_trait]
pub trait LinkWrite: Send + 'static {
    async fn write_binary(&mut self, data: Vec<u8>) -> Result<()>;

    /// Release the link. Called at most once by the owner.
    async fn close(&mut self) -> Result<()>;
}
