//! Fixed-window request counter keyed by client address.
//!
//! A burst straddling a window boundary can admit up to `2 * max` requests
//! within `2 * window`; that is inherent to fixed windows.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::RateLimitSection;

/// Outcome of a limiter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Admit,
    /// Rejected; `retry_after` is the time left in the current window.
    Reject { retry_after: Duration },
}

impl RateDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, RateDecision::Admit)
    }
}

#[derive(Debug, Clone, Copy)]
struct RateWindow {
    start: Instant,
    count: u32,
}

/// Shared limiter. Each key's window is updated under its shard's write lock,
/// so clients on different shards never contend.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    window: Duration,
    max: u32,
    windows: DashMap<String, RateWindow>,
}

impl FixedWindowLimiter {
    pub fn new(window: Duration, max: u32) -> Self {
        Self {
            window,
            max: max.max(1),
            windows: DashMap::new(),
        }
    }

    pub fn from_config(cfg: &RateLimitSection) -> Self {
        Self::new(cfg.window(), cfg.max_requests)
    }

    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut w = self
            .windows
            .entry(key.to_string())
            .or_insert(RateWindow { start: now, count: 0 });

        let elapsed = now.saturating_duration_since(w.start);
        if w.count == 0 || elapsed >= self.window {
            w.start = now;
            w.count = 1;
            return RateDecision::Admit;
        }

        w.count = w.count.saturating_add(1);
        if w.count > self.max {
            // window is left untouched; rejection does not extend it
            return RateDecision::Reject {
                retry_after: self.window - elapsed,
            };
        }
        RateDecision::Admit
    }

    /// Drop windows that expired before `now`. Returns how many were removed.
    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.start) < self.window);
        before.saturating_sub(self.windows.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}
