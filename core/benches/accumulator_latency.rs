// Latency of turning accumulated estimates into Arrow record batches.
//
// One second of estimates at 3200 Hz is 3200 rows of 15 columns; a minute is 192000.
mod utils;
use utils::create_estimates;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use qpmu_core::SynchrophasorAccumulator;
use std::time::Duration;

fn bench_push(c: &mut Criterion) {
    let estimates = create_estimates(3200);
    c.bench_function("accumulator_push", |b| {
        let mut accumulator = SynchrophasorAccumulator::new(estimates.len());
        let mut rows = estimates.iter().cycle();
        b.iter(|| {
            if let Some(row) = rows.next() {
                accumulator.push(row);
            }
            if accumulator.len() >= estimates.len() {
                black_box(accumulator.finish().unwrap());
            }
        });
    });
}

fn bench_finish(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulator_finish");
    group.measurement_time(Duration::from_secs(10));

    for &rows in &[320, 3200, 32_000, 192_000] {
        let estimates = create_estimates(rows);
        group.bench_with_input(BenchmarkId::new("rows", rows), &rows, |b, &rows| {
            let mut accumulator = SynchrophasorAccumulator::new(rows);
            b.iter(|| {
                for row in &estimates {
                    accumulator.push(row);
                }
                black_box(accumulator.finish().unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_push, bench_finish);
criterion_main!(benches);
