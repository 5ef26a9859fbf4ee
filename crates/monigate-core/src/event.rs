//! Per-request records handed from the pipeline to metrics and audit.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed request, consumed by the application metrics aggregate.
#[derive(Debug, Clone)]
pub struct RequestEvent {
    pub method: String,
    /// Matched route template (e.g. `/logs/audit`), not the raw URI.
    pub route: String,
    pub status_code: u16,
    pub duration_ms: f64,
    pub timestamp: Instant,
}

impl RequestEvent {
    pub fn is_error(&self) -> bool {
        self.status_code >= 400
    }
}

/// One line of the audit trail. Written as a JSON record, read back by
/// `/logs/audit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub method: String,
    pub path: String,
    pub client_address: String,
    pub user_agent: String,
}
