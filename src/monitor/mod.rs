//! # Monitor Module
//!
//! Lock-free metrics for the dispatch engine.
//!
//! [`AtomicMonitor`] is the default sink. It counts requests, failures and
//! latency with plain atomics, and keeps per-key access counters (cache
//! hit/miss) and per-operation counters in `DashMap`s. [`NoopMonitor`]
//! discards everything and is useful in tests and benchmarks.
//!
//! A [`MetricsSnapshot`] can be rendered for scraping with
//! [`MetricsSnapshot::to_prometheus`]:
//!
//! ```rust
//! use std::time::Duration;
//! use vortex::monitor::{AtomicMonitor, Monitor};
//!
//! let monitor = AtomicMonitor::new();
//! monitor.record_request(Duration::from_millis(3), true);
//! let text = monitor.summary().to_prometheus("vortex");
//! assert!(text.contains("vortex_requests_total 1"));
//! ```

mod core;
mod prometheus;
#[cfg(test)]
mod tests;

pub use core::{AccessStats, AtomicMonitor, MetricsSnapshot, Monitor, NoopMonitor, OperationStats};
