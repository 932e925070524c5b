//! In-process link backed by tokio channels.
//!
//! `pair` returns the two halves a `TunnelChannel` consumes plus the
//! `MemoryPeer` that plays the remote side. The peer chooses how bytes are
//! chunked into messages, which is what makes it useful for exercising the
//! buffering reader.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use httpws_core::error::{Result, TunnelError};
use httpws_core::protocol::envelope::{self, Envelope};
use httpws_core::protocol::frame::{encode_frame, FrameHeader, HEADER_LEN};

use crate::transport::link::{LinkMessage, LinkRead, LinkWrite};

pub struct MemoryReader {
    rx: mpsc::Receiver<LinkMessage>,
}

pub struct MemoryWriter {
    tx: Option<mpsc::Sender<LinkMessage>>,
    closes: Arc<AtomicUsize>,
}

/// Remote end of an in-process link.
pub struct MemoryPeer {
    tx: Option<mpsc::Sender<LinkMessage>>,
    rx: mpsc::Receiver<LinkMessage>,
    closes: Arc<AtomicUsize>,
}

pub fn pair(capacity: usize) -> (MemoryReader, MemoryWriter, MemoryPeer) {
    let cap = capacity.max(1);
    let (to_local, from_peer) = mpsc::channel(cap);
    let (to_peer, from_local) = mpsc::channel(cap);
    let closes = Arc::new(AtomicUsize::new(0));

    (
        MemoryReader { rx: from_peer },
        MemoryWriter {
            tx: Some(to_peer),
            closes: Arc::clone(&closes),
        },
        MemoryPeer {
            tx: Some(to_local),
            rx: from_local,
            closes,
        },
    )
}

#[async_trait]
impl LinkRead for MemoryReader {
    async fn read_message(&mut self) -> Result<LinkMessage> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| TunnelError::Transport("memory link closed".into()))
    }
}

#[async_trait]
impl LinkWrite for MemoryWriter {
    async fn write_binary(&mut self, data: Vec<u8>) -> Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| TunnelError::Transport("memory link closed".into()))?;
        tx.send(LinkMessage::Binary(data))
            .await
            .map_err(|_| TunnelError::Transport("memory peer gone".into()))
    }

    async fn close(&mut self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.tx.take();
        Ok(())
    }
}

impl MemoryPeer {
    pub async fn send(&self, msg: LinkMessage) -> Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| TunnelError::Transport("peer hung up".into()))?;
        tx.send(msg)
            .await
            .map_err(|_| TunnelError::Transport("memory link closed".into()))
    }

    pub async fn send_binary(&self, data: impl Into<Vec<u8>>) -> Result<()> {
        self.send(LinkMessage::Binary(data.into())).await
    }

    /// Frame and send one envelope as a single message.
    pub async fn send_envelope(&self, env: Envelope) -> Result<()> {
        let frame = encode_frame(&envelope::encode(env)?)?;
        self.send_binary(frame.to_vec()).await
    }

    /// Next message written by the local side; `None` once it closed the link.
    pub async fn recv(&mut self) -> Option<LinkMessage> {
        self.rx.recv().await
    }

    /// Next message, which must be exactly one whole frame.
    pub async fn recv_envelope(&mut self) -> Result<Envelope> {
        let data = match self.recv().await {
            Some(LinkMessage::Binary(data)) => data,
            Some(other) => {
                return Err(TunnelError::Transport(format!(
                    "expected binary message, got {}",
                    other.kind()
                )))
            }
            None => return Err(TunnelError::Transport("memory link closed".into())),
        };

        let header = FrameHeader::parse(&data)?;
        let body = data.get(HEADER_LEN..).unwrap_or_default();
        if body.len() != header.body_len() {
            return Err(TunnelError::Transport(format!(
                "message carries {} body bytes, header declares {}",
                body.len(),
                header.body_len()
            )));
        }
        envelope::decode(body)?.into_envelope()
    }

    /// Drop the peer's sending side; the local reader sees end-of-stream.
    pub fn hang_up(&mut self) {
        self.tx.take();
    }

    /// How many times the local side closed its writer.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}
