//! Gateway config loader (strict parsing + env overrides).

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use wsrelay_core::error::{Result, RelayError};

pub use schema::{GatewayConfig, GatewaySection, RelaySection, UpstreamSection};

/// Env var naming the YAML config path.
pub const CONFIG_PATH_ENV: &str = "WSRELAY_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "wsrelay.yaml";

/// Load from `$WSRELAY_CONFIG` (default `wsrelay.yaml`), falling back to
/// defaults when the file does not exist, then apply env overrides.
pub fn load_from_env() -> Result<GatewayConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut cfg = match fs::read_to_string(&path) {
        Ok(s) => parse(&s)?,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(%path, "config file not found, using defaults");
            GatewayConfig::default()
        }
        Err(e) => return Err(RelayError::Internal(format!("read config failed: {e}"))),
    };
    cfg.apply_overrides(|k| std::env::var(k).ok())?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg = parse(s)?;
    cfg.validate()?;
    Ok(cfg)
}

fn parse(s: &str) -> Result<GatewayConfig> {
    serde_yaml::from_str(s).map_err(|e| RelayError::BadRequest(format!("invalid yaml: {e}")))
}
