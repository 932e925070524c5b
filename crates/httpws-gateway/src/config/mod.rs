//! Gateway configuration.
//!
//! The file is located through `HTTPWS_CONFIG` (falling back to
//! `httpws.yaml` in the working directory), parsed strictly and validated
//! before anything binds a socket.

pub mod schema;

use std::path::{Path, PathBuf};

use httpws_core::error::{Result, TunnelError};

pub use schema::{GatewayConfig, GatewaySection, TunnelSection};

pub const CONFIG_ENV: &str = "HTTPWS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "httpws.yaml";

/// Where the config lives: `$HTTPWS_CONFIG` when set and non-empty.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub fn load_from_file(path: impl AsRef<Path>) -> Result<GatewayConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| TunnelError::Config(format!("read {}: {e}", path.display())))?;
    load_from_str(&text).map_err(|e| match e {
        TunnelError::Config(msg) => TunnelError::Config(format!("{}: {msg}", path.display())),
        other => other,
    })
}

/// Parse and validate. Unknown keys at any level are errors.
pub fn load_from_str(text: &str) -> Result<GatewayConfig> {
    let cfg = serde_yaml::from_str::<GatewayConfig>(text)
        .map_err(|e| TunnelError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
