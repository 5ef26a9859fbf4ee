//! Gateway config loader (strict parsing + environment overrides).

pub mod schema;

use std::fs;
use std::path::Path;

use monigate_core::error::{MonigateError, Result};

pub use schema::{
    ArtifactsSection, AuditSection, CredentialConfig, GatewayConfig, GatewaySection,
    RateLimitSection,
};

/// Env var naming the config file.
pub const CONFIG_PATH_ENV: &str = "MONIGATE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "monigate.yaml";

pub fn load_from_file(path: impl AsRef<Path>) -> Result<GatewayConfig> {
    let cfg = read_file(path.as_ref())?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg = parse(s)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load the file named by `MONIGATE_CONFIG`, apply environment overrides,
/// then validate.
pub fn load_from_env() -> Result<GatewayConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut cfg = read_file(Path::new(&path))?;
    cfg.apply_env(|k| std::env::var(k).ok());
    cfg.validate()?;
    Ok(cfg)
}

fn read_file(path: &Path) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| MonigateError::Config(format!("read {} failed: {e}", path.display())))?;
    parse(&s)
}

fn parse(s: &str) -> Result<GatewayConfig> {
    serde_yaml::from_str(s).map_err(|e| MonigateError::Config(format!("invalid yaml: {e}")))
}
