//! Read-only access to the monitoring pipeline's output files.
//!
//! The files are produced and rotated elsewhere; this module only ever reads
//! a bounded suffix of whatever currently exists.

pub mod tail;

pub use tail::{tail_slice, TailReader};

/// The fixed set of artifacts the gateway serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// JSON-lines metric samples.
    Metrics,
    Alerts,
    Security,
    /// Single JSON document describing supervised processes.
    ProcessHealth,
    SystemAnalysis,
    /// JSON-lines audit trail written by this gateway.
    Audit,
}

impl Artifact {
    pub fn file_name(self) -> &'static str {
        match self {
            Artifact::Metrics => "metrics.json",
            Artifact::Alerts => "alerts.log",
            Artifact::Security => "security.log",
            Artifact::ProcessHealth => "process_health.json",
            Artifact::SystemAnalysis => "system_analysis.log",
            Artifact::Audit => "audit.log",
        }
    }
}
