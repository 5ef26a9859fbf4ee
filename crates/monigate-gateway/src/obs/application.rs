//! Application request aggregate.
//!
//! Every completed request updates one shared aggregate: totals, running
//! average latency, error rate, and a sliding one-minute request count. The
//! whole read-modify-write happens inside one critical section, so readers
//! never see (say) a fresh `total_requests` paired with a stale `error_count`.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;

use monigate_core::RequestEvent;

/// Trailing span for `requests_per_minute`.
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct Aggregate {
    total_requests: u64,
    error_count: u64,
    total_response_time_ms: f64,
    avg_response_time_ms: f64,
    error_rate_percent: f64,
    requests_per_minute: u32,
    recent: VecDeque<Instant>,
}

impl Aggregate {
    /// Drop timestamps at least `RATE_WINDOW` old. Timestamps arrive in
    /// completion order, so expired ones are always at the front.
    fn prune(&mut self, now: Instant) {
        while let Some(&t) = self.recent.front() {
            if now.saturating_duration_since(t) >= RATE_WINDOW {
                self.recent.pop_front();
            } else {
                break;
            }
        }
        self.requests_per_minute = u32::try_from(self.recent.len()).unwrap_or(u32::MAX);
    }
}

/// Point-in-time copy of the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationSnapshot {
    pub total_requests: u64,
    pub error_count: u64,
    pub total_response_time_ms: f64,
    pub avg_response_time_ms: f64,
    pub error_rate_percent: f64,
    pub requests_per_minute: u32,
}

#[derive(Debug, Default)]
pub struct ApplicationMetrics {
    inner: Mutex<Aggregate>,
}

impl ApplicationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Aggregate> {
        // poisoned means a recorder panicked; counters stay usable
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, event: &RequestEvent) {
        self.record_at(event, Instant::now());
    }

    pub fn record_at(&self, event: &RequestEvent, now: Instant) {
        let mut a = self.lock();

        a.total_requests += 1;
        a.total_response_time_ms += event.duration_ms;
        a.avg_response_time_ms = a.total_response_time_ms / a.total_requests as f64;

        if event.is_error() {
            a.error_count += 1;
        }
        a.error_rate_percent = a.error_count as f64 / a.total_requests as f64 * 100.0;

        // out-of-order completions are clamped so the deque stays sorted
        let ts = match a.recent.back() {
            Some(&last) if event.timestamp < last => last,
            _ => event.timestamp,
        };
        a.recent.push_back(ts);
        a.prune(now);
    }

    pub fn snapshot(&self) -> ApplicationSnapshot {
        self.snapshot_at(Instant::now())
    }

    /// Copy the aggregate, first expiring timestamps older than the window so
    /// an idle gateway reports a falling rate.
    pub fn snapshot_at(&self, now: Instant) -> ApplicationSnapshot {
        let mut a = self.lock();
        a.prune(now);
        ApplicationSnapshot {
            total_requests: a.total_requests,
            error_count: a.error_count,
            total_response_time_ms: a.total_response_time_ms,
            avg_response_time_ms: a.avg_response_time_ms,
            error_rate_percent: a.error_rate_percent,
            requests_per_minute: a.requests_per_minute,
        }
    }
}
