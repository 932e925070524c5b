use serde::Deserialize;

/// What an inbound request does when every handler permit is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaturationPolicy {
    /// Wait for a permit.
    #[default]
    Queue,
    /// Answer `503 Service Unavailable` right away.
    Reject,
}

/// Per-channel tuning.
#[derive(Debug, Clone)]
pub struct TunnelOptions {
    /// Upper bound on inbound requests being served concurrently.
    pub max_inflight_requests: usize,
    pub saturation: SaturationPolicy,
}

impl Default for TunnelOptions {
    fn default() -> Self {
        Self {
            max_inflight_requests: 64,
            saturation: SaturationPolicy::Queue,
        }
    }
}
