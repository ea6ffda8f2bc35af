use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use vortex::monitor::{AtomicMonitor, Monitor};

/// Single-threaded recording (baseline)
fn bench_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread_monitor");

    for num_keys in [1, 10, 100] {
        group.bench_with_input(BenchmarkId::new("operations", num_keys), &num_keys, |b, &n| {
            let monitor = AtomicMonitor::new();
            let keys: Vec<String> = (0..n).map(|i| format!("op{i}.dispatch")).collect();
            b.iter(|| {
                for key in &keys {
                    monitor.record_operation(black_box(key), Duration::from_micros(250), 1);
                }
            });
        });
    }

    group.finish();
}

/// All threads hammer the same access key and request counters
fn bench_concurrent_same_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_monitor");
    group.sample_size(10);

    for num_threads in [2, 4, 8, 16] {
        group.bench_with_input(
            BenchmarkId::new("high_contention_same_key", num_threads),
            &num_threads,
            |b, &num_threads| {
                b.iter(|| {
                    let monitor = Arc::new(AtomicMonitor::new());
                    let handles: Vec<_> = (0..num_threads)
                        .map(|_| {
                            let monitor = Arc::clone(&monitor);
                            thread::spawn(move || {
                                for i in 0..1000u64 {
                                    monitor.record_access(black_box("access_token"), i % 4 != 0, 1000 + i % 100);
                                    monitor.record_request(Duration::from_nanos(1000 + i), i % 10 != 0);
                                }
                            })
                        })
                        .collect();
                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

/// Snapshot cost with many populated keys
fn bench_summary(c: &mut Criterion) {
    let monitor = AtomicMonitor::new();
    for i in 0..200 {
        monitor.record_operation(&format!("op{i}.dispatch"), Duration::from_micros(i), i);
        monitor.record_access(&format!("cache{i}"), i % 2 == 0, i);
    }
    c.bench_function("summary_200_keys", |b| b.iter(|| black_box(monitor.summary())));
    c.bench_function("prometheus_200_keys", |b| {
        b.iter(|| black_box(monitor.summary().to_prometheus("vortex")))
    });
}

criterion_group!(benches, bench_single_thread, bench_concurrent_same_key, bench_summary);
criterion_main!(benches);
