//! Policy layer (per-client rate limiting).
//!
//! Compiles the rate-limit config section into a shared limiter that the
//! request pipeline consults before any other work.

pub mod rate_limit;

pub use rate_limit::{FixedWindowLimiter, RateDecision};
