//! HTTP handlers.
//!
//! - `ops`  : public liveness, service info, Prometheus scrape
//! - `data` : token-gated views over metrics and monitoring artifacts

pub mod data;
pub mod ops;
