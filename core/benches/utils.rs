use qpmu_core::random::random_sample;
use qpmu_core::{Estimator, Float, Sample, SampleGenerator, WaveformConfig};
use qpmu_core::{EstimationStrategy, Synchrophasor};

pub const VOLTAGE: (Float, Float) = (0.1, -204.8);
pub const CURRENT: (Float, Float) = (0.25, -512.0);

pub fn create_waveform(count: usize) -> Vec<Sample> {
    let config = WaveformConfig {
        frequency_hz: 50.2,
        noise_amplitude: 4.0,
        seed: 11,
        ..WaveformConfig::default()
    };
    SampleGenerator::new(config).take(count).collect()
}

#[allow(dead_code)]
pub fn create_random_samples(count: usize) -> Vec<Sample> {
    (0..count as u64)
        .map(|i| random_sample(i, i * 313, 313))
        .collect()
}

/// An estimator whose window is already full.
#[allow(dead_code)]
pub fn create_ready_estimator(window_size: usize, strategy: EstimationStrategy) -> Estimator {
    let mut estimator = Estimator::new(window_size, strategy, VOLTAGE, CURRENT).unwrap();
    for sample in create_waveform(window_size) {
        estimator.estimate_measurements(&sample);
    }
    estimator
}

#[allow(dead_code)]
pub fn create_estimates(count: usize) -> Vec<Synchrophasor> {
    let mut estimator = create_ready_estimator(64, EstimationStrategy::Sdft);
    create_waveform(count)
        .iter()
        .map(|s| estimator.estimate_measurements(s))
        .collect()
}
