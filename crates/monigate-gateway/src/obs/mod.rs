//! In-process metrics.
//!
//! Two views over the same traffic: labelled Prometheus vectors (`metrics`)
//! and a single request aggregate with a sliding one-minute rate
//! (`application`). Both are owned by `AppState` and fed by the pipeline.

pub mod application;
pub mod metrics;

pub use application::{ApplicationMetrics, ApplicationSnapshot};
pub use metrics::GatewayMetrics;
