//! Prometheus registry for the gateway.
//!
//! Counter/gauge/histogram types with dynamic labels backed by `DashMap`.
//! Labels are flattened into sorted key vectors to keep deterministic ordering.
//! Histogram buckets are fixed in microseconds to avoid floating point math.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

type LabelKey = Vec<(String, String)>;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn label_str(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

/// `name{labels}` or bare `name` when there are no labels.
fn series(name: &str, key: &LabelKey) -> String {
    if key.is_empty() {
        name.to_string()
    } else {
        format!("{}{{{}}}", name, label_str(key))
    }
}

/// Entries sorted by label key so scrapes are stable.
fn sorted<V, T>(map: &DashMap<LabelKey, V>, f: impl Fn(&V) -> T) -> Vec<(LabelKey, T)> {
    let mut rows: Vec<(LabelKey, T)> = map.iter().map(|r| (r.key().clone(), f(r.value()))).collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    /// Current value for one label combination (0 if never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Number of distinct label combinations seen.
    pub fn series_count(&self) -> usize {
        self.map.len()
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, help: &str, out: &mut String) {
        let _ = writeln!(out, "# HELP {} {}", name, help);
        let _ = writeln!(out, "# TYPE {} counter", name);
        for (key, val) in sorted(&self.map, |c| c.load(Ordering::Relaxed)) {
            let _ = writeln!(out, "{} {}", series(name, &key), val);
        }
    }
}

#[derive(Default)]
pub struct GaugeVec {
    map: DashMap<LabelKey, AtomicI64>,
}

impl GaugeVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) { self.add(labels, 1); }
    /// Decrement by 1.
    pub fn dec(&self, labels: &[(&str, &str)]) { self.add(labels, -1); }

    /// Add an arbitrary signed delta.
    pub fn add(&self, labels: &[(&str, &str)], v: i64) {
        let gauge = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicI64::new(0));
        gauge.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> i64 {
        self.map
            .get(&label_key(labels))
            .map(|g| g.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format.
    fn render(&self, name: &str, help: &str, out: &mut String) {
        let _ = writeln!(out, "# HELP {} {}", name, help);
        let _ = writeln!(out, "# TYPE {} gauge", name);
        for (key, val) in sorted(&self.map, |g| g.load(Ordering::Relaxed)) {
            let _ = writeln!(out, "{} {}", series(name, &key), val);
        }
    }
}

// Fixed buckets in microseconds:
// 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s
const BUCKETS_MICROS: [u64; 10] = [
    1_000, 5_000, 10_000, 25_000, 50_000, 100_000, 250_000, 500_000, 1_000_000, 2_500_000,
];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; 10],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<LabelKey, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a duration and increment cumulative buckets (microsecond scale).
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(AtomicHistogram::default);
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);

        // cumulative: every bucket whose bound covers the value
        for (i, &b) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Render in Prometheus text exposition format (unit: microseconds).
    fn render(&self, name: &str, help: &str, out: &mut String) {
        let _ = writeln!(out, "# HELP {} {}", name, help);
        let _ = writeln!(out, "# TYPE {} histogram", name);
        let rows = sorted(&self.map, |h| {
            let buckets: Vec<u64> = h.buckets.iter().map(|b| b.load(Ordering::Relaxed)).collect();
            (buckets, h.count.load(Ordering::Relaxed), h.sum.load(Ordering::Relaxed))
        });
        for (key, (buckets, count, sum)) in rows {
            let labels = label_str(&key);
            let prefix = if labels.is_empty() { String::new() } else { format!("{},", labels) };

            for (le, n) in BUCKETS_MICROS.iter().zip(buckets) {
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, n);
            }
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);
            let _ = writeln!(out, "{} {}", series(&format!("{name}_sum"), &key), sum);
            let _ = writeln!(out, "{} {}", series(&format!("{name}_count"), &key), count);
        }
    }
}

/// Decrements the active-connection gauge when dropped, so cancelled or
/// panicking requests are still accounted for.
pub struct ActiveGuard<'a> {
    gauge: &'a GaugeVec,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.gauge.dec(&[]);
    }
}

#[derive(Default)]
pub struct GatewayMetrics {
    pub http_requests: CounterVec,
    pub http_duration: HistogramVec, // In Microseconds
    pub active_connections: GaugeVec,
    pub rate_limited: CounterVec,
    pub auth_failures: CounterVec,
    pub audit_failures: CounterVec,
    pub artifact_errors: CounterVec,
}

impl GatewayMetrics {
    /// Count one completed request under its `{method, route, status_code}` labels.
    pub fn observe_request(&self, method: &str, route: &str, status: u16, elapsed: Duration) {
        let status = status.to_string();
        let labels = [("method", method), ("route", route), ("status_code", status.as_str())];
        self.http_requests.inc(&labels);
        self.http_duration.observe(&labels, elapsed);
    }

    /// Mark a request in flight until the guard drops.
    pub fn track_active(&self) -> ActiveGuard<'_> {
        self.active_connections.inc(&[]);
        ActiveGuard {
            gauge: &self.active_connections,
        }
    }

    pub fn active(&self) -> i64 {
        self.active_connections.get(&[])
    }

    /// Render all registered metrics plus any extra gauge lines provided by callers.
    pub fn render(&self, extra: &[(&str, u64)]) -> String {
        let mut out = String::new();
        self.http_requests.render(
            "monigate_http_requests_total",
            "Completed HTTP requests.",
            &mut out,
        );
        self.http_duration.render(
            "monigate_http_request_duration_micros",
            "HTTP request latency in microseconds.",
            &mut out,
        );
        // always emit the gauge, even before the first request
        if self.active_connections.map.is_empty() {
            self.active_connections.add(&[], 0);
        }
        self.active_connections.render(
            "monigate_http_connections_active",
            "Requests currently in flight.",
            &mut out,
        );
        self.rate_limited.render(
            "monigate_rate_limited_total",
            "Requests rejected by the rate limiter.",
            &mut out,
        );
        self.auth_failures.render(
            "monigate_auth_failures_total",
            "Rejected authentication or authorization attempts.",
            &mut out,
        );
        self.audit_failures.render(
            "monigate_audit_failures_total",
            "Audit records that could not be written.",
            &mut out,
        );
        self.artifact_errors.render(
            "monigate_artifact_errors_total",
            "Artifact reads that failed or could not be parsed.",
            &mut out,
        );

        for (k, v) in extra {
            let _ = writeln!(out, "# TYPE {} gauge\n{} {}", k, k, v);
        }
        out
    }
}
