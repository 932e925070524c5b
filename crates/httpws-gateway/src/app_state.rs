//! Shared application state for the httpws gateway.

use std::sync::Arc;
use std::time::Duration;

use crate::config::GatewayConfig;
use crate::tunnel::{ChannelRegistry, HttpHandler, TunnelOptions};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    handler: Arc<dyn HttpHandler>,
    channels: ChannelRegistry,
}

impl AppState {
    /// `handler` serves the requests peers send through their tunnels.
    pub fn new(cfg: GatewayConfig, handler: Arc<dyn HttpHandler>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                handler,
                channels: ChannelRegistry::new(),
            }),
        }
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn handler(&self) -> Arc<dyn HttpHandler> {
        Arc::clone(&self.inner.handler)
    }

    pub fn channels(&self) -> &ChannelRegistry {
        &self.inner.channels
    }

    pub fn tunnel_options(&self) -> TunnelOptions {
        self.inner.cfg.tunnel.options()
    }

    pub fn request_timeout(&self) -> Duration {
        self.inner.cfg.tunnel.request_timeout()
    }
}
