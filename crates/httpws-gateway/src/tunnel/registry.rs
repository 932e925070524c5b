use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::tunnel::channel::TunnelChannel;

/// Live tunnels by connection id.
///
/// Ids come from the client (`?id=`) or are generated. A reconnect with the
/// same id replaces the previous entry; the caller closes whatever `insert`
/// hands back.
pub struct ChannelRegistry {
    channels: DashMap<String, TunnelChannel>,
    seq: AtomicU64,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    pub fn generate_id(&self) -> String {
        format!("tunnel-{}", self.seq.fetch_add(1, Ordering::Relaxed))
    }

    pub fn insert(&self, id: String, channel: TunnelChannel) -> Option<TunnelChannel> {
        self.channels.insert(id, channel)
    }

    /// Remove `id` only if it still maps to `channel`.
    pub fn remove(&self, id: &str, channel: &TunnelChannel) -> bool {
        self.channels
            .remove_if(id, |_, current| current.same_channel(channel))
            .is_some()
    }

    pub fn get(&self, id: &str) -> Option<TunnelChannel> {
        self.channels.get(id).map(|r| r.value().clone())
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.channels.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn close_all(&self) {
        for entry in self.channels.iter() {
            entry.value().close();
        }
    }
}
