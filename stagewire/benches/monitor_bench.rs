//! Benchmarks for the metrics aggregator.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::Rng;
use stagewire::core::SuccessEvent;
use stagewire::monitor::{percentile, Monitor};

fn events(count: usize) -> Vec<SuccessEvent> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            SuccessEvent::new(
                format!("stage{}", i % 4),
                "handle",
                rng.gen_range(0.0001..0.05),
            )
        })
        .collect()
}

fn monitor_benchmark(c: &mut Criterion) {
    let batch = events(10_000);

    c.bench_function("consume_success_10k", |b| {
        b.iter_batched(
            || Monitor::with_capacity(1000),
            |monitor| {
                for event in &batch {
                    monitor.consume_success(black_box(event));
                }
                monitor
            },
            BatchSize::SmallInput,
        );
    });

    let monitor = Monitor::with_capacity(1000);
    for event in &batch {
        monitor.consume_success(event);
    }
    c.bench_function("snapshot_4x1000", |b| {
        b.iter(|| black_box(monitor.snapshot()));
    });

    let mut sorted: Vec<f64> = batch.iter().map(|e| e.duration).collect();
    sorted.sort_by(f64::total_cmp);
    c.bench_function("percentile_p99", |b| {
        b.iter(|| percentile(black_box(&sorted), 0.99));
    });
}

criterion_group!(benches, monitor_benchmark);
criterion_main!(benches);
