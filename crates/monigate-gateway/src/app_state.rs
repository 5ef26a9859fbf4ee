//! Shared application state for the monigate gateway.
//!
//! Every collaborator the pipeline touches (credential store, limiter,
//! metrics, audit recorder, artifact reader) is owned here and handed to
//! middleware and handlers through axum state. Nothing is global.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use monigate_core::error::Result;

use crate::artifacts::TailReader;
use crate::audit::{AuditRecorder, AuditSink, FileAuditSink};
use crate::auth::{Authenticator, CredentialStore, StaticCredentialStore};
use crate::config::GatewayConfig;
use crate::obs::{ApplicationMetrics, GatewayMetrics};
use crate::policy::FixedWindowLimiter;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    started_at: Instant,
    authenticator: Authenticator,
    limiter: FixedWindowLimiter,
    metrics: Arc<GatewayMetrics>,
    app_metrics: ApplicationMetrics,
    audit: AuditRecorder,
    artifacts: TailReader,
}

impl AppState {
    /// Build application state from validated config: static credential
    /// table and a file-backed audit trail.
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let store = StaticCredentialStore::from_config(&cfg.credentials)?;
        let sink = FileAuditSink::new(cfg.audit_path());
        Ok(Self::with_parts(cfg, Arc::new(store), Arc::new(sink)))
    }

    /// Build with caller-supplied credential store and audit sink.
    pub fn with_parts(
        cfg: GatewayConfig,
        store: Arc<dyn CredentialStore>,
        sink: Arc<dyn AuditSink>,
    ) -> Self {
        let metrics = Arc::new(GatewayMetrics::default());
        let audit = AuditRecorder::new(
            sink,
            cfg.audit.append_timeout(),
            cfg.audit.max_pending,
            Arc::clone(&metrics),
        );
        let limiter = FixedWindowLimiter::from_config(&cfg.rate_limit);
        let artifacts = TailReader::new(
            cfg.artifacts.dir.clone(),
            cfg.audit_path(),
            cfg.artifacts.read_timeout(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                authenticator: Authenticator::new(store),
                limiter,
                metrics,
                app_metrics: ApplicationMetrics::new(),
                audit,
                artifacts,
                started_at: Instant::now(),
                cfg,
            }),
        }
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.inner.authenticator
    }

    pub fn limiter(&self) -> &FixedWindowLimiter {
        &self.inner.limiter
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.inner.metrics
    }

    pub fn app_metrics(&self) -> &ApplicationMetrics {
        &self.inner.app_metrics
    }

    pub fn audit(&self) -> &AuditRecorder {
        &self.inner.audit
    }

    pub fn artifacts(&self) -> &TailReader {
        &self.inner.artifacts
    }

    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }

    /// Extra gauge lines appended to the Prometheus scrape.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("monigate_uptime_seconds", self.uptime().as_secs()),
            (
                "monigate_rate_limit_clients",
                self.limiter().tracked_clients() as u64,
            ),
        ]
    }

    /// Periodically drop expired rate-limit windows.
    pub fn spawn_limiter_sweeper(&self) -> JoinHandle<()> {
        let state = self.clone();
        let every = Duration::from_secs(self.cfg().rate_limit.sweep_interval_secs);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(every);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                let removed = state.limiter().purge_expired_at(Instant::now());
                if removed > 0 {
                    tracing::debug!(
                        removed,
                        remaining = state.limiter().tracked_clients(),
                        "rate limit windows swept"
                    );
                }
            }
        })
    }
}
