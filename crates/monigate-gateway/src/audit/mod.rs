//! Audit trail.
//!
//! One JSON line per request that enters the pipeline, written before any
//! authentication decision so rejected attempts are recorded too. Appends
//! run under a time budget with a cap on appends in flight; a failed, slow
//! or dropped append is logged and counted, never surfaced to the caller.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, Semaphore};

use monigate_core::error::{MonigateError, Result};
use monigate_core::AuditEntry;

use crate::obs::GatewayMetrics;

/// Destination for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, entry: &AuditEntry) -> Result<()>;
}

/// Appends JSON lines to a file. Writers are serialized so concurrent records
/// never interleave within a line.
pub struct FileAuditSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileAuditSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl AuditSink for FileAuditSink {
    async fn append(&self, entry: &AuditEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)
            .map_err(|e| MonigateError::Internal(format!("audit encode failed: {e}")))?;
        line.push('\n');

        let _g = self.lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MonigateError::Io(format!("create {}: {e}", parent.display())))?;
        }
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| MonigateError::Io(format!("open {}: {e}", self.path.display())))?;
        f.write_all(line.as_bytes())
            .await
            .map_err(|e| MonigateError::Io(format!("write {}: {e}", self.path.display())))?;
        f.flush()
            .await
            .map_err(|e| MonigateError::Io(format!("flush {}: {e}", self.path.display())))?;
        Ok(())
    }
}

/// Wraps a sink with the append budget, the in-flight cap and failure
/// accounting.
#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
    budget: Duration,
    max_pending: usize,
    pending: Arc<Semaphore>,
    metrics: Arc<GatewayMetrics>,
}

impl AuditRecorder {
    pub fn new(
        sink: Arc<dyn AuditSink>,
        budget: Duration,
        max_pending: usize,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            sink,
            budget,
            max_pending,
            pending: Arc::new(Semaphore::new(max_pending)),
            metrics,
        }
    }

    /// Appends started but not yet finished, including ones whose caller
    /// already gave up waiting.
    pub fn pending(&self) -> usize {
        self.max_pending - self.pending.available_permits()
    }

    /// Never fails; returns whether the record was written within budget.
    ///
    /// The append runs on its own task holding a permit: when the budget lapses
    /// the caller moves on, but the write still completes so the file never
    /// holds a torn line. With every permit taken the record is dropped.
    pub async fn record(&self, entry: AuditEntry) -> bool {
        let Ok(permit) = Arc::clone(&self.pending).try_acquire_owned() else {
            tracing::warn!(
                max_pending = self.max_pending,
                path = %entry.path,
                "audit append dropped, sink backlog full"
            );
            self.metrics.audit_failures.inc(&[("reason", "backpressure")]);
            return false;
        };

        let path = entry.path.clone();
        let sink = Arc::clone(&self.sink);
        let task = tokio::spawn(async move {
            let res = sink.append(&entry).await;
            drop(permit);
            res
        });

        match tokio::time::timeout(self.budget, task).await {
            Ok(Ok(Ok(()))) => true,
            Ok(Ok(Err(e))) => {
                tracing::warn!(error = %e, path = %path, "audit append failed");
                self.metrics.audit_failures.inc(&[("reason", "io")]);
                false
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, path = %path, "audit append task aborted");
                self.metrics.audit_failures.inc(&[("reason", "panic")]);
                false
            }
            Err(_) => {
                tracing::warn!(
                    budget_ms = self.budget.as_millis() as u64,
                    path = %path,
                    "audit append exceeded budget"
                );
                self.metrics.audit_failures.inc(&[("reason", "timeout")]);
                false
            }
        }
    }
}
