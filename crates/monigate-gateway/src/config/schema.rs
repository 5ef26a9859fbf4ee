use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use monigate_core::error::{MonigateError, Result};
use monigate_core::Role;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub rate_limit: RateLimitSection,

    #[serde(default)]
    pub artifacts: ArtifactsSection,

    #[serde(default)]
    pub audit: AuditSection,

    #[serde(default)]
    pub credentials: Vec<CredentialConfig>,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MonigateError::Config(format!(
                "unsupported config version: {}",
                self.version
            )));
        }
        if self.credentials.is_empty() {
            return Err(MonigateError::Config("credentials must not be empty".into()));
        }

        let mut seen = HashSet::with_capacity(self.credentials.len());
        for c in &self.credentials {
            if c.token.is_empty() {
                return Err(MonigateError::Config(format!(
                    "credential for {} has an empty token",
                    c.username
                )));
            }
            if !seen.insert(c.token.as_str()) {
                // never echo the token itself
                return Err(MonigateError::Config(format!(
                    "duplicate credential token (user={})",
                    c.username
                )));
            }
        }

        self.gateway.validate()?;
        self.rate_limit.validate()?;
        self.artifacts.validate()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Apply `INSTANCE_NAME`, `PORT`, `JWT_SECRET` and `LOG_DIR` overrides.
    /// Unparseable values are logged and ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup("INSTANCE_NAME").filter(|s| !s.is_empty()) {
            self.gateway.instance_name = name;
        }
        if let Some(port) = lookup("PORT") {
            match (port.parse::<u16>(), self.gateway.listen.parse::<SocketAddr>()) {
                (Ok(p), Ok(mut addr)) => {
                    addr.set_port(p);
                    self.gateway.listen = addr.to_string();
                }
                _ => tracing::warn!(
                    env_var = "PORT",
                    value = %port,
                    listen = %self.gateway.listen,
                    "invalid value for environment variable, keeping configured listen address"
                ),
            }
        }
        if let Some(secret) = lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            self.gateway.jwt_secret = Some(secret);
        }
        if let Some(dir) = lookup("LOG_DIR").filter(|s| !s.is_empty()) {
            self.artifacts.dir = PathBuf::from(dir);
        }
    }

    /// Where audit records are appended. Relative paths live in the artifact dir.
    pub fn audit_path(&self) -> PathBuf {
        if self.audit.file.is_absolute() {
            self.audit.file.clone()
        } else {
            self.artifacts.dir.join(&self.audit.file)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// Accepted for compatibility; tokens are matched against the credential
    /// table, not verified with this secret.
    #[serde(default)]
    pub jwt_secret: Option<String>,

    #[serde(default = "default_cors_allow_origin")]
    pub cors_allow_origin: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            instance_name: default_instance_name(),
            jwt_secret: None,
            cors_allow_origin: default_cors_allow_origin(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        self.listen
            .parse::<SocketAddr>()
            .map_err(|e| MonigateError::Config(format!("gateway.listen is not a socket address: {e}")))?;
        if self.instance_name.trim().is_empty() {
            return Err(MonigateError::Config("gateway.instance_name must not be empty".into()));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}
fn default_instance_name() -> String {
    "monigate".into()
}
fn default_cors_allow_origin() -> String {
    "*".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitSection {
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            max_requests: default_max_requests(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl RateLimitSection {
    pub fn validate(&self) -> Result<()> {
        if self.window_secs == 0 {
            return Err(MonigateError::Config("rate_limit.window_secs must be > 0".into()));
        }
        if self.max_requests == 0 {
            return Err(MonigateError::Config("rate_limit.max_requests must be > 0".into()));
        }
        if self.sweep_interval_secs == 0 {
            return Err(MonigateError::Config(
                "rate_limit.sweep_interval_secs must be > 0".into(),
            ));
        }
        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

fn default_window_secs() -> u64 {
    60
}
fn default_max_requests() -> u32 {
    500
}
fn default_sweep_interval_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactsSection {
    #[serde(default = "default_artifact_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    #[serde(default)]
    pub limits: TailLimits,
}

impl Default for ArtifactsSection {
    fn default() -> Self {
        Self {
            dir: default_artifact_dir(),
            read_timeout_ms: default_read_timeout_ms(),
            max_limit: default_max_limit(),
            limits: TailLimits::default(),
        }
    }
}

impl ArtifactsSection {
    pub fn validate(&self) -> Result<()> {
        if !(100..=60_000).contains(&self.read_timeout_ms) {
            return Err(MonigateError::Config(
                "artifacts.read_timeout_ms must be between 100 and 60000".into(),
            ));
        }
        if self.max_limit == 0 {
            return Err(MonigateError::Config("artifacts.max_limit must be > 0".into()));
        }
        let l = &self.limits;
        for (name, v) in [
            ("metrics", l.metrics),
            ("alerts", l.alerts),
            ("security", l.security),
            ("system", l.system),
            ("audit", l.audit),
        ] {
            if v == 0 || v > self.max_limit {
                return Err(MonigateError::Config(format!(
                    "artifacts.limits.{name} must be between 1 and max_limit ({})",
                    self.max_limit
                )));
            }
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Default number of entries each tail endpoint returns.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TailLimits {
    #[serde(default = "default_limit_100")]
    pub metrics: usize,
    #[serde(default = "default_limit_50")]
    pub alerts: usize,
    #[serde(default = "default_limit_50")]
    pub security: usize,
    #[serde(default = "default_limit_100")]
    pub system: usize,
    #[serde(default = "default_limit_100")]
    pub audit: usize,
}

impl Default for TailLimits {
    fn default() -> Self {
        Self {
            metrics: 100,
            alerts: 50,
            security: 50,
            system: 100,
            audit: 100,
        }
    }
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("logs")
}
fn default_read_timeout_ms() -> u64 {
    2000
}
fn default_max_limit() -> usize {
    1000
}
fn default_limit_100() -> usize {
    100
}
fn default_limit_50() -> usize {
    50
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditSection {
    #[serde(default = "default_audit_file")]
    pub file: PathBuf,

    #[serde(default = "default_append_timeout_ms")]
    pub append_timeout_ms: u64,

    /// Appends allowed in flight at once; further records are dropped.
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            file: default_audit_file(),
            append_timeout_ms: default_append_timeout_ms(),
            max_pending: default_max_pending(),
        }
    }
}

impl AuditSection {
    pub fn validate(&self) -> Result<()> {
        if !(10..=10_000).contains(&self.append_timeout_ms) {
            return Err(MonigateError::Config(
                "audit.append_timeout_ms must be between 10 and 10000".into(),
            ));
        }
        if !(1..=4096).contains(&self.max_pending) {
            return Err(MonigateError::Config(
                "audit.max_pending must be between 1 and 4096".into(),
            ));
        }
        Ok(())
    }

    pub fn append_timeout(&self) -> Duration {
        Duration::from_millis(self.append_timeout_ms)
    }
}

fn default_audit_file() -> PathBuf {
    PathBuf::from("audit.log")
}
fn default_append_timeout_ms() -> u64 {
    250
}
fn default_max_pending() -> usize {
    64
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialConfig {
    pub token: String,
    pub username: String,
    pub role: Role,
}
