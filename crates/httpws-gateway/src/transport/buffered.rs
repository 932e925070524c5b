//! Byte-count reads over a message-oriented link.
//!
//! A link message may carry less than, exactly, or more than the bytes the
//! frame reader asks for. Over-received bytes stay in `cache` for the next
//! read.

use bytes::{Bytes, BytesMut};

use httpws_core::error::{ProtocolViolation, Result, TunnelError};

use crate::transport::link::{LinkMessage, LinkRead};

pub struct BufferedReader<R> {
    link: R,
    cache: BytesMut,
}

impl<R: LinkRead> BufferedReader<R> {
    pub fn new(link: R) -> Self {
        Self {
            link,
            cache: BytesMut::new(),
        }
    }

    /// Bytes received but not yet consumed.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Read exactly `n` bytes, pulling link messages until the cache holds them.
    pub async fn read_exact(&mut self, n: usize) -> Result<Bytes> {
        while self.cache.len() < n {
            self.fill().await?;
        }
        Ok(self.cache.split_to(n).freeze())
    }

    async fn fill(&mut self) -> Result<()> {
        loop {
            match self.link.read_message().await? {
                LinkMessage::Binary(data) => {
                    self.cache.extend_from_slice(&data);
                    return Ok(());
                }
                // control traffic is answered by the websocket layer
                LinkMessage::Ping(_) | LinkMessage::Pong(_) => continue,
                LinkMessage::Close => {
                    return Err(TunnelError::Transport("link closed by peer".into()))
                }
                other => {
                    return Err(ProtocolViolation::UnsupportedMessageKind(other.kind()).into())
                }
            }
        }
    }

    pub fn into_inner(self) -> R {
        self.link
    }
}
