use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Metrics sink for the dispatch engine.
///
/// Implementations are shared across all in-flight requests and must not
/// block the caller.
pub trait Monitor: Send + Sync {
    /// Record a keyed cache or lookup access, e.g. an access token check.
    fn record_access(&self, key: &str, hit: bool, duration_nanos: u64);
    /// Record a completed request.
    fn record_request(&self, duration: Duration, success: bool);
    /// Record a named downstream operation and the number of records it produced.
    fn record_operation(&self, operation: &str, duration: Duration, rows: u64);
    /// Zero every counter.
    fn reset(&self);
    /// Point-in-time copy of the counters. Has no side effects.
    fn summary(&self) -> MetricsSnapshot;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccessStats {
    pub hits: u64,
    pub misses: u64,
    pub total_nanos: u64,
}

impl AccessStats {
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OperationStats {
    pub count: u64,
    pub total_nanos: u64,
    pub max_nanos: u64,
    pub rows: u64,
}

impl OperationStats {
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.total_nanos / self.count)
        }
    }
}

/// Copy of the monitor's counters at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub requests_failed: u64,
    pub total_latency_nanos: u64,
    pub max_latency_nanos: u64,
    pub access: BTreeMap<String, AccessStats>,
    pub operations: BTreeMap<String, OperationStats>,
}

impl MetricsSnapshot {
    /// Mean request latency; zero when nothing has been recorded.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        if self.requests_total == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.total_latency_nanos / self.requests_total)
        }
    }

    #[must_use]
    pub fn requests_succeeded(&self) -> u64 {
        self.requests_total.saturating_sub(self.requests_failed)
    }
}

#[derive(Default)]
struct AccessCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    total_nanos: AtomicU64,
}

#[derive(Default)]
struct OperationCounters {
    count: AtomicU64,
    total_nanos: AtomicU64,
    max_nanos: AtomicU64,
    rows: AtomicU64,
}

/// Default monitor: atomics for global counters and a `DashMap` for keyed
/// counters.
///
/// Keyed updates take a shard lock only to find or insert the entry; the
/// counters themselves are atomics. All loads and stores use
/// `Ordering::Relaxed`, so a snapshot taken under load is eventually
/// consistent rather than a single atomic view.
#[derive(Default)]
pub struct AtomicMonitor {
    requests_total: AtomicU64,
    requests_failed: AtomicU64,
    total_latency_nanos: AtomicU64,
    max_latency_nanos: AtomicU64,
    access: DashMap<String, AccessCounters>,
    operations: DashMap<String, OperationCounters>,
}

impl AtomicMonitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_access<F: FnOnce(&AccessCounters)>(&self, key: &str, f: F) {
        // Existing keys avoid allocating the owned key
        if let Some(counters) = self.access.get(key) {
            f(&counters);
            return;
        }
        let counters = self.access.entry(key.to_string()).or_default();
        f(&counters);
    }

    fn with_operation<F: FnOnce(&OperationCounters)>(&self, op: &str, f: F) {
        if let Some(counters) = self.operations.get(op) {
            f(&counters);
            return;
        }
        let counters = self.operations.entry(op.to_string()).or_default();
        f(&counters);
    }
}

fn nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

impl Monitor for AtomicMonitor {
    fn record_access(&self, key: &str, hit: bool, duration_nanos: u64) {
        self.with_access(key, |c| {
            if hit {
                c.hits.fetch_add(1, Ordering::Relaxed);
            } else {
                c.misses.fetch_add(1, Ordering::Relaxed);
            }
            c.total_nanos.fetch_add(duration_nanos, Ordering::Relaxed);
        });
    }

    fn record_request(&self, duration: Duration, success: bool) {
        let ns = nanos(duration);
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.requests_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.total_latency_nanos.fetch_add(ns, Ordering::Relaxed);
        self.max_latency_nanos.fetch_max(ns, Ordering::Relaxed);
    }

    fn record_operation(&self, operation: &str, duration: Duration, rows: u64) {
        let ns = nanos(duration);
        self.with_operation(operation, |c| {
            c.count.fetch_add(1, Ordering::Relaxed);
            c.total_nanos.fetch_add(ns, Ordering::Relaxed);
            c.max_nanos.fetch_max(ns, Ordering::Relaxed);
            c.rows.fetch_add(rows, Ordering::Relaxed);
        });
    }

    fn reset(&self) {
        self.requests_total.store(0, Ordering::Relaxed);
        self.requests_failed.store(0, Ordering::Relaxed);
        self.total_latency_nanos.store(0, Ordering::Relaxed);
        self.max_latency_nanos.store(0, Ordering::Relaxed);
        self.access.clear();
        self.operations.clear();
    }

    fn summary(&self) -> MetricsSnapshot {
        let access = self
            .access
            .iter()
            .map(|entry| {
                let c = entry.value();
                (
                    entry.key().clone(),
                    AccessStats {
                        hits: c.hits.load(Ordering::Relaxed),
                        misses: c.misses.load(Ordering::Relaxed),
                        total_nanos: c.total_nanos.load(Ordering::Relaxed),
                    },
                )
            })
            .collect();
        let operations = self
            .operations
            .iter()
            .map(|entry| {
                let c = entry.value();
                (
                    entry.key().clone(),
                    OperationStats {
                        count: c.count.load(Ordering::Relaxed),
                        total_nanos: c.total_nanos.load(Ordering::Relaxed),
                        max_nanos: c.max_nanos.load(Ordering::Relaxed),
                        rows: c.rows.load(Ordering::Relaxed),
                    },
                )
            })
            .collect();
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            total_latency_nanos: self.total_latency_nanos.load(Ordering::Relaxed),
            max_latency_nanos: self.max_latency_nanos.load(Ordering::Relaxed),
            access,
            operations,
        }
    }
}

/// Monitor that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMonitor;

impl Monitor for NoopMonitor {
    fn record_access(&self, _key: &str, _hit: bool, _duration_nanos: u64) {}
    fn record_request(&self, _duration: Duration, _success: bool) {}
    fn record_operation(&self, _operation: &str, _duration: Duration, _rows: u64) {}
    fn reset(&self) {}
    fn summary(&self) -> MetricsSnapshot {
        MetricsSnapshot::default()
    }
}
