use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use httpws_core::error::{Result, TunnelError};
use httpws_core::protocol::frame::MAX_BODY_LEN;

use crate::tunnel::{SaturationPolicy, TunnelOptions};

const RESERVED_PATHS: &[&str] = &["/", "/ping", "/healthz"];

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub tunnel: TunnelSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(TunnelError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.gateway.validate()?;
        self.tunnel.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Upgrade endpoint path.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !self.path.starts_with('/') {
            return Err(TunnelError::Config("gateway.path must start with '/'".into()));
        }
        if RESERVED_PATHS.contains(&self.path.as_str()) || self.path.starts_with("/tunnels") {
            return Err(TunnelError::Config(format!(
                "gateway.path {} collides with a built-in route",
                self.path
            )));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| TunnelError::Config(format!("gateway.listen is not a socket address: {e}")))
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_path() -> String {
    "/websocket".into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TunnelSection {
    #[serde(default = "default_max_inflight_requests")]
    pub max_inflight_requests: usize,

    #[serde(default)]
    pub saturation: SaturationPolicy,

    /// Deadline for gateway-initiated requests to a peer.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Cap on a buffered HTTP body (served responses and forwarded requests).
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for TunnelSection {
    fn default() -> Self {
        Self {
            max_inflight_requests: default_max_inflight_requests(),
            saturation: SaturationPolicy::default(),
            request_timeout_ms: default_request_timeout_ms(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl TunnelSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=4096).contains(&self.max_inflight_requests) {
            return Err(TunnelError::Config(
                "tunnel.max_inflight_requests must be between 1 and 4096".into(),
            ));
        }
        if !(100..=600000).contains(&self.request_timeout_ms) {
            return Err(TunnelError::Config(
                "tunnel.request_timeout_ms must be between 100 and 600000".into(),
            ));
        }
        if !(1..=MAX_BODY_LEN as usize).contains(&self.max_body_bytes) {
            return Err(TunnelError::Config(format!(
                "tunnel.max_body_bytes must be between 1 and {MAX_BODY_LEN}"
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn options(&self) -> TunnelOptions {
        TunnelOptions {
            max_inflight_requests: self.max_inflight_requests,
            saturation: self.saturation,
        }
    }
}

fn default_max_inflight_requests() -> usize {
    64
}
fn default_request_timeout_ms() -> u64 {
    30000
}
fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}
