use super::*;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_request_counters() {
    let m = AtomicMonitor::new();
    m.record_request(Duration::from_millis(10), true);
    m.record_request(Duration::from_millis(30), false);
    let s = m.summary();
    assert_eq!(s.requests_total, 2);
    assert_eq!(s.requests_failed, 1);
    assert_eq!(s.requests_succeeded(), 1);
    assert_eq!(s.average_latency(), Duration::from_millis(20));
    assert_eq!(s.max_latency_nanos, 30_000_000);
}

#[test]
fn test_access_and_operation_counters() {
    let m = AtomicMonitor::new();
    m.record_access("token", true, 100);
    m.record_access("token", true, 100);
    m.record_access("token", false, 400);
    m.record_operation("http.dispatch", Duration::from_micros(5), 3);
    m.record_operation("http.dispatch", Duration::from_micros(15), 0);

    let s = m.summary();
    let token = s.access["token"];
    assert_eq!((token.hits, token.misses, token.total_nanos), (2, 1, 600));
    assert!((token.hit_ratio() - 2.0 / 3.0).abs() < f64::EPSILON);
    let op = s.operations["http.dispatch"];
    assert_eq!(op.count, 2);
    assert_eq!(op.rows, 3);
    assert_eq!(op.average_latency(), Duration::from_micros(10));
}

#[test]
fn test_summary_is_side_effect_free_and_reset_clears() {
    let m = AtomicMonitor::new();
    m.record_request(Duration::from_millis(1), true);
    assert_eq!(m.summary(), m.summary());
    m.reset();
    assert_eq!(m.summary(), MetricsSnapshot::default());
}

#[test]
fn test_noop_monitor() {
    let m = NoopMonitor;
    m.record_request(Duration::from_millis(1), false);
    assert_eq!(m.summary().requests_total, 0);
}

#[test]
fn test_concurrent_updates_are_not_lost() {
    let m = Arc::new(AtomicMonitor::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let m = Arc::clone(&m);
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    m.record_request(Duration::from_nanos(1), i % 2 == 0);
                    m.record_operation("op", Duration::from_nanos(1), 1);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let s = m.summary();
    assert_eq!(s.requests_total, 8000);
    assert_eq!(s.requests_failed, 4000);
    assert_eq!(s.operations["op"].rows, 8000);
}

#[test]
fn test_prometheus_rendering() {
    let m = AtomicMonitor::new();
    m.record_request(Duration::from_millis(2), true);
    m.record_access("cache \"a\"", false, 1);
    m.record_operation("mcp.dispatch", Duration::from_millis(1), 4);
    let text = m.summary().to_prometheus("vortex");
    assert!(text.contains("# TYPE vortex_requests_total counter"));
    assert!(text.contains("vortex_requests_total 1\n"));
    assert!(text.contains("vortex_requests_failed_total 0\n"));
    assert!(text.contains(r#"vortex_access_misses_total{key="cache \"a\""} 1"#));
    assert!(text.contains(r#"vortex_operation_rows_total{operation="mcp.dispatch"} 4"#));
}

#[test]
fn test_prometheus_omits_empty_keyed_sections() {
    let text = AtomicMonitor::new().summary().to_prometheus("gw");
    assert!(text.contains("gw_requests_total 0"));
    assert!(!text.contains("gw_access_hits_total"));
    assert!(!text.contains("gw_operation_total"));
}
