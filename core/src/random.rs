//! # Synthetic Sample Generator
//!
//! This module provides utilities for generating synthetic ADC samples for tests,
//! benchmarks and demos: clean or noisy three-phase waveforms with a known frequency,
//! ROCOF, amplitude and phase, and uniformly random samples.
//!
//! ## Key Components
//!
//! - `WaveformConfig`: Parameters of a three-phase waveform as seen by the ADC.
//! - `SampleGenerator`: An endless iterator of `Sample`s following a `WaveformConfig`.
//! - `random_sample`: A sample with uniformly random channel counts.
//!
//! ## Usage
//!
//! ```
//! use qpmu_core::random::{SampleGenerator, WaveformConfig};
//!
//! let samples: Vec<_> = SampleGenerator::new(WaveformConfig::default()).take(128).collect();
//! assert_eq!(samples.len(), 128);
//! ```

use crate::common::{Sample, CHANNEL_COUNT};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Full-scale count of the 12-bit converter emulated by `random_sample`.
pub const ADC_FULL_SCALE: u64 = 4095;

/// Parameters of a synthetic three-phase waveform.
///
/// Channel `i` carries `adc_offset + amplitudes[i]·cos(θ(t) + phases[i]) + noise`
/// counts, where `θ(t) = 2π(f·t + ½·rocof·t²)`.
///
/// # Fields
///
/// * `sample_rate_hz`: Sampling rate of the converter.
/// * `frequency_hz`: Signal frequency at the first sample.
/// * `rocof_hz_per_s`: Constant rate of change of frequency.
/// * `amplitudes`: Peak amplitude of each channel in counts.
/// * `phases`: Phase of each channel at the first sample, in radians.
/// * `adc_offset`: Count corresponding to zero signal.
/// * `noise_amplitude`: Bound of uniform additive noise in counts.
/// * `start_timestamp_us`: Timestamp of the first sample.
/// * `seed`: Seed of the noise generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformConfig {
    pub sample_rate_hz: f64,
    pub frequency_hz: f64,
    pub rocof_hz_per_s: f64,
    pub amplitudes: [f64; CHANNEL_COUNT],
    pub phases: [f64; CHANNEL_COUNT],
    pub adc_offset: f64,
    pub noise_amplitude: f64,
    pub start_timestamp_us: u64,
    pub seed: u64,
}

impl Default for WaveformConfig {
    /// A balanced 50 Hz system sampled at 3200 Hz, currents lagging by 30°.
    fn default() -> Self {
        let lag = PI / 6.0;
        WaveformConfig {
            sample_rate_hz: 3200.0,
            frequency_hz: 50.0,
            rocof_hz_per_s: 0.0,
            amplitudes: [1000.0, 1000.0, 1000.0, 400.0, 400.0, 400.0],
            phases: [
                0.0,
                -2.0 * PI / 3.0,
                2.0 * PI / 3.0,
                -lag,
                -2.0 * PI / 3.0 - lag,
                2.0 * PI / 3.0 - lag,
            ],
            adc_offset: 2048.0,
            noise_amplitude: 0.0,
            start_timestamp_us: 0,
            seed: 0,
        }
    }
}

impl WaveformConfig {
    /// Timestamp of sample `n`, rounded to whole microseconds.
    pub fn timestamp_us(&self, n: u64) -> u64 {
        self.start_timestamp_us + (n as f64 * 1e6 / self.sample_rate_hz).round() as u64
    }

    /// Phase `θ` of the carrier at sample `n`, excluding the per-channel phase.
    pub fn carrier_phase(&self, n: u64) -> f64 {
        let t = n as f64 / self.sample_rate_hz;
        TAU * (self.frequency_hz * t + 0.5 * self.rocof_hz_per_s * t * t)
    }
}

/// Endless iterator of samples following a `WaveformConfig`.
#[derive(Debug, Clone)]
pub struct SampleGenerator {
    config: WaveformConfig,
    rng: StdRng,
    index: u64,
}

impl SampleGenerator {
    pub fn new(config: WaveformConfig) -> Self {
        SampleGenerator {
            config,
            rng: StdRng::seed_from_u64(config.seed),
            index: 0,
        }
    }
}

impl Iterator for SampleGenerator {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        let n = self.index;
        let config = &self.config;
        let theta = config.carrier_phase(n);

        let mut channels = [0u64; CHANNEL_COUNT];
        for (ch, count) in channels.iter_mut().enumerate() {
            let noise = if config.noise_amplitude > 0.0 {
                self.rng
                    .random_range(-config.noise_amplitude..=config.noise_amplitude)
            } else {
                0.0
            };
            let value =
                config.adc_offset + config.amplitudes[ch] * (theta + config.phases[ch]).cos() + noise;
            *count = value.round().max(0.0) as u64;
        }

        let timestamp_us = config.timestamp_us(n);
        let time_delta_us = if n == 0 {
            config.timestamp_us(1) - config.start_timestamp_us
        } else {
            timestamp_us - config.timestamp_us(n - 1)
        };

        self.index += 1;
        Some(Sample {
            seq_no: n,
            channels,
            timestamp_us,
            time_delta_us,
        })
    }
}

/// Generates a sample with uniformly random 12-bit channel counts.
///
/// # Parameters
///
/// * `seq_no`: Sequence number of the sample.
/// * `timestamp_us`: Timestamp of the sample.
/// * `time_delta_us`: Difference from the previous sample's timestamp.
///
/// # Returns
///
/// A `Sample` with each channel in `0..=ADC_FULL_SCALE`.
pub fn random_sample(seq_no: u64, timestamp_us: u64, time_delta_us: u64) -> Sample {
    let mut rng = rand::rng();
    let mut channels = [0u64; CHANNEL_COUNT];
    for count in channels.iter_mut() {
        *count = rng.random_range(0..=ADC_FULL_SCALE);
    }
    Sample {
        seq_no,
        channels,
        timestamp_us,
        time_delta_us,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_and_deltas() {
        let samples: Vec<Sample> = SampleGenerator::new(WaveformConfig {
            start_timestamp_us: 1_000,
            ..WaveformConfig::default()
        })
        .take(5)
        .collect();
        let timestamps: Vec<u64> = samples.iter().map(|s| s.timestamp_us).collect();
        // 312.5 µs spacing rounded half away from zero
        assert_eq!(timestamps, vec![1_000, 1_313, 1_625, 1_938, 2_250]);
        assert_eq!(samples[0].time_delta_us, 313);
        assert_eq!(samples[1].time_delta_us, 313);
        assert_eq!(samples[2].time_delta_us, 312);
        for (i, s) in samples.iter().enumerate() {
            assert_eq!(s.seq_no, i as u64);
        }
    }

    #[test]
    fn test_clean_waveform_counts() {
        let config = WaveformConfig {
            sample_rate_hz: 400.0,
            ..WaveformConfig::default()
        };
        // 8 samples per 50 Hz cycle: VA peaks at n = 0 and bottoms at n = 4
        let samples: Vec<Sample> = SampleGenerator::new(config).take(8).collect();
        assert_eq!(samples[0].channels[0], 3048);
        assert_eq!(samples[4].channels[0], 1048);
        assert_eq!(samples[2].channels[0], 2048);
    }

    #[test]
    fn test_noise_is_bounded_and_seeded() {
        let config = WaveformConfig {
            amplitudes: [0.0; CHANNEL_COUNT],
            noise_amplitude: 5.0,
            seed: 42,
            ..WaveformConfig::default()
        };
        let first: Vec<Sample> = SampleGenerator::new(config).take(200).collect();
        let second: Vec<Sample> = SampleGenerator::new(config).take(200).collect();
        assert_eq!(first, second);
        for sample in &first {
            for count in sample.channels {
                assert!((2043..=2053).contains(&count), "count {} out of range", count);
            }
        }
    }

    #[test]
    fn test_counts_clamp_at_zero() {
        let config = WaveformConfig {
            adc_offset: 0.0,
            ..WaveformConfig::default()
        };
        assert!(SampleGenerator::new(config)
            .take(64)
            .all(|s| s.channels.iter().all(|c| *c <= 1000)));
    }

    #[test]
    fn test_random_sample_range() {
        for i in 0..100 {
            let sample = random_sample(i, i * 250, 250);
            assert_eq!(sample.seq_no, i);
            assert!(sample.channels.iter().all(|c| *c <= ADC_FULL_SCALE));
        }
    }
}
