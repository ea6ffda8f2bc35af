use super::MetricsSnapshot;
use std::fmt::Write;

impl MetricsSnapshot {
    /// Render the snapshot in the Prometheus text exposition format.
    ///
    /// Every metric name is prefixed with `prefix` followed by an underscore.
    /// Keyed counters carry the key as a `key` or `operation` label.
    #[must_use]
    pub fn to_prometheus(&self, prefix: &str) -> String {
        let mut out = String::with_capacity(1024);
        header(&mut out, prefix, "requests_total", "counter", "Total number of dispatched requests");
        let _ = writeln!(out, "{prefix}_requests_total {}", self.requests_total);
        header(&mut out, prefix, "requests_failed_total", "counter", "Requests that ended with a failure");
        let _ = writeln!(out, "{prefix}_requests_failed_total {}", self.requests_failed);
        header(&mut out, prefix, "request_latency_seconds", "gauge", "Average request latency in seconds");
        let _ = writeln!(
            out,
            "{prefix}_request_latency_seconds {}",
            self.average_latency().as_secs_f64()
        );
        header(&mut out, prefix, "request_latency_max_seconds", "gauge", "Slowest request latency in seconds");
        let _ = writeln!(
            out,
            "{prefix}_request_latency_max_seconds {}",
            self.max_latency_nanos as f64 / 1e9
        );

        if !self.access.is_empty() {
            header(&mut out, prefix, "access_hits_total", "counter", "Keyed lookups served from cache");
            for (key, stats) in &self.access {
                let _ = writeln!(out, "{prefix}_access_hits_total{{key=\"{}\"}} {}", escape(key), stats.hits);
            }
            header(&mut out, prefix, "access_misses_total", "counter", "Keyed lookups that missed the cache");
            for (key, stats) in &self.access {
                let _ = writeln!(out, "{prefix}_access_misses_total{{key=\"{}\"}} {}", escape(key), stats.misses);
            }
        }

        if !self.operations.is_empty() {
            header(&mut out, prefix, "operation_total", "counter", "Downstream operations executed");
            for (op, stats) in &self.operations {
                let _ = writeln!(out, "{prefix}_operation_total{{operation=\"{}\"}} {}", escape(op), stats.count);
            }
            header(&mut out, prefix, "operation_rows_total", "counter", "Records produced by downstream operations");
            for (op, stats) in &self.operations {
                let _ = writeln!(out, "{prefix}_operation_rows_total{{operation=\"{}\"}} {}", escape(op), stats.rows);
            }
            header(&mut out, prefix, "operation_latency_seconds", "gauge", "Average operation latency in seconds");
            for (op, stats) in &self.operations {
                let _ = writeln!(
                    out,
                    "{prefix}_operation_latency_seconds{{operation=\"{}\"}} {}",
                    escape(op),
                    stats.average_latency().as_secs_f64()
                );
            }
        }
        out
    }
}

fn header(out: &mut String, prefix: &str, name: &str, kind: &str, help: &str) {
    let _ = writeln!(out, "# HELP {prefix}_{name} {help}");
    let _ = writeln!(out, "# TYPE {prefix}_{name} {kind}");
}

fn escape(label: &str) -> String {
    label
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
