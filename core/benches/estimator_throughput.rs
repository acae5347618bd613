// Per-sample estimation cost of the FFT and SDFT strategies.
//
// Every call to estimate_measurements produces one estimate, so the sample rate the
// estimator can sustain is the inverse of the per-call time. FFT cost grows with
// N log N per call, SDFT cost is constant apart from the periodic re-seed.
//
// Target: a 64-sample window at 3200 Hz must sustain well over 3200 calls per second.
mod utils;
use utils::{create_random_samples, create_ready_estimator, create_waveform};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qpmu_core::EstimationStrategy;
use std::time::{Duration, Instant};

fn bench_window_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate_measurements");
    group.measurement_time(Duration::from_secs(10));
    group.throughput(Throughput::Elements(1));

    let input = create_waveform(4096);

    for &window_size in &[16, 64, 256, 1024] {
        for strategy in [EstimationStrategy::Fft, EstimationStrategy::Sdft] {
            group.bench_with_input(
                BenchmarkId::new(format!("{}", strategy), window_size),
                &window_size,
                |b, &window_size| {
                    let mut estimator = create_ready_estimator(window_size, strategy);
                    let mut samples = input.iter().cycle();
                    b.iter(|| {
                        if let Some(sample) = samples.next() {
                            black_box(estimator.estimate_measurements(sample));
                        }
                    });
                },
            );
        }
    }

    group.finish();
}

// Random counts exercise the full range of angles and magnitudes.
fn bench_random_input(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_input");
    group.throughput(Throughput::Elements(1));

    let input = create_random_samples(4096);
    for strategy in [EstimationStrategy::Fft, EstimationStrategy::Sdft] {
        group.bench_function(format!("{}_64", strategy), |b| {
            let mut estimator = create_ready_estimator(64, strategy);
            let mut samples = input.iter().cycle();
            b.iter(|| {
                if let Some(sample) = samples.next() {
                    black_box(estimator.estimate_measurements(sample));
                }
            });
        });
    }

    group.finish();
}

// One second of samples at 3200 Hz, timed as a block.
fn bench_realtime_rate(c: &mut Criterion) {
    let mut group = c.benchmark_group("realtime_rate");
    group.sample_size(10);

    let sample_rate = 3200;
    let input = create_waveform(sample_rate);

    for strategy in [EstimationStrategy::Fft, EstimationStrategy::Sdft] {
        group.bench_function(format!("{}_one_second", strategy), |b| {
            let mut estimator = create_ready_estimator(64, strategy);
            b.iter_custom(|iters| {
                let start = Instant::now();
                for _ in 0..iters {
                    for sample in &input {
                        black_box(estimator.estimate_measurements(sample));
                    }
                }
                let elapsed = start.elapsed();
                let achieved = (iters as f64 * sample_rate as f64) / elapsed.as_secs_f64();
                eprintln!(
                    "{}: target {} samples/s, achieved {:.0} samples/s",
                    strategy, sample_rate, achieved
                );
                elapsed
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_window_sizes,
    bench_random_input,
    bench_realtime_rate
);
criterion_main!(benches);
