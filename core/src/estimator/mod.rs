//! # Synchrophasor Estimator
//!
//! This module provides the `Estimator` facade: the long-lived owner of configuration,
//! calibration, the sample window, the active strategy's transform resources and the
//! frequency tracker. It exposes a single per-sample entry point,
//! `estimate_measurements`, which turns one raw ADC sample into one `Synchrophasor`.
//!
//! ## Key Components
//!
//! - `Estimator`: The facade and its `Filling → Ready` state machine.
//! - `EstimatorConfig`: Serializable construction parameters with defaults.
//! - `EstimationStrategy`: Selection between batch FFT and sliding DFT.
//! - `EstimatorState`: Whether the window has filled.
//! - `FrequencySource`: Phase input of frequency tracking (re-exported from `tracker`).
//!
//! ## Usage
//!
//! ```no_run
//! use qpmu_core::estimator::{EstimationStrategy, Estimator};
//! use qpmu_core::common::Sample;
//!
//! let mut estimator = Estimator::new(64, EstimationStrategy::Fft, (1.0, 0.0), (1.0, 0.0))?;
//! let phasor = estimator.estimate_measurements(&Sample::default());
//! # Ok::<(), qpmu_core::common::EstimatorError>(())
//! ```
//!
//! Calls must be serialized per instance. Reconfiguration means building a new
//! estimator; there is no in-place mutation of window size or strategy.

pub mod fft;
pub mod sdft;
pub mod strategy;
pub mod tracker;

pub use self::tracker::FrequencySource;

use self::fft::FftStrategy;
use self::sdft::SdftStrategy;
use self::strategy::{PhasorStrategy, Strategy};
use self::tracker::FrequencyTracker;
use crate::calibration::{Calibration, CalibrationParams};
use crate::common::{EstimatorError, Sample, Synchrophasor, CHANNEL_COUNT};
use crate::numeric::{Float, PmuFloat};
use crate::phasors::FundamentalBin;
use crate::units::NominalFrequency;
use crate::window::SampleWindow;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default number of samples in the estimation window.
pub const DEFAULT_WINDOW_SIZE: usize = 64;

/// Phasor estimation strategy.
///
/// # Variants
///
/// * `Fft`: Forward DFT of the full window on every estimate, O(N log N) per channel.
/// * `Sdft`: Sliding DFT updated incrementally, O(1) amortized per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimationStrategy {
    #[default]
    Fft,
    Sdft,
}

impl fmt::Display for EstimationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EstimationStrategy::Fft => write!(f, "fft"),
            EstimationStrategy::Sdft => write!(f, "sdft"),
        }
    }
}

impl FromStr for EstimationStrategy {
    type Err = EstimatorError;

    /// Parses "fft" or "sdft", ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fft" => Ok(EstimationStrategy::Fft),
            "sdft" => Ok(EstimationStrategy::Sdft),
            _ => Err(EstimatorError::UnsupportedStrategy {
                message: format!("expected \"fft\" or \"sdft\", got {:?}", s),
            }),
        }
    }
}

/// Lifecycle state of an estimator.
///
/// # Variants
///
/// * `Filling`: The window is below capacity; estimates are the not-ready record.
/// * `Ready`: The window is full; every call produces a real estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorState {
    Filling,
    Ready,
}

/// Construction parameters of an `Estimator`.
///
/// # Fields
///
/// * `window_size`: Samples per estimation window, at least 1.
/// * `strategy`: Estimation strategy.
/// * `voltage`: Calibration of the VA, VB, VC channels.
/// * `current`: Calibration of the IA, IB, IC channels.
/// * `nominal_frequency`: Nominal system frequency.
/// * `frequency_source`: Phase input of frequency tracking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub window_size: usize,
    pub strategy: EstimationStrategy,
    pub voltage: CalibrationParams<Float>,
    pub current: CalibrationParams<Float>,
    pub nominal_frequency: NominalFrequency,
    pub frequency_source: FrequencySource,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        EstimatorConfig {
            window_size: DEFAULT_WINDOW_SIZE,
            strategy: EstimationStrategy::default(),
            voltage: CalibrationParams::default(),
            current: CalibrationParams::default(),
            nominal_frequency: NominalFrequency::default(),
            frequency_source: FrequencySource::default(),
        }
    }
}

/// Per-sample synchrophasor estimator.
///
/// Cloning produces an estimator with its own transform resources and a copy of all
/// accumulated state; the clone and the original then evolve independently. `clone`
/// aborts if the new buffers cannot be allocated; `try_clone` reports that as
/// `EstimatorError::ResourceExhausted`.
#[derive(Debug, Clone)]
pub struct Estimator {
    config: EstimatorConfig,
    calibration: Calibration<Float>,
    window: SampleWindow<Float>,
    strategy: Strategy<Float>,
    tracker: FrequencyTracker<Float>,
    bin: Option<FundamentalBin>,
    processed: u64,
}

impl Estimator {
    /// Creates an estimator with the default nominal frequency and frequency source.
    ///
    /// # Parameters
    ///
    /// * `window_size`: Samples per estimation window, at least 1.
    /// * `strategy`: Estimation strategy.
    /// * `voltage`: Voltage calibration `(scale, offset)`.
    /// * `current`: Current calibration `(scale, offset)`.
    ///
    /// # Returns
    ///
    /// * `Ok(Estimator)`: A fully constructed estimator in the `Filling` state.
    /// * `Err(EstimatorError)`: On invalid configuration or failed resource allocation.
    pub fn new(
        window_size: usize,
        strategy: EstimationStrategy,
        voltage: (Float, Float),
        current: (Float, Float),
    ) -> Result<Self, EstimatorError> {
        Self::with_config(EstimatorConfig {
            window_size,
            strategy,
            voltage: voltage.into(),
            current: current.into(),
            ..EstimatorConfig::default()
        })
    }

    /// Creates an estimator from a full configuration.
    pub fn with_config(config: EstimatorConfig) -> Result<Self, EstimatorError> {
        if config.window_size == 0 {
            return Err(EstimatorError::InvalidWindowSize {
                message: "window size must be at least 1".to_string(),
            });
        }
        if let FrequencySource::Channel(index) = config.frequency_source {
            if index >= CHANNEL_COUNT {
                return Err(EstimatorError::InvalidFrequencySource {
                    message: format!(
                        "channel {} does not exist, expected 0..{}",
                        index, CHANNEL_COUNT
                    ),
                });
            }
        }

        let calibration = Calibration::new(config.voltage, config.current)?;
        let strategy = match config.strategy {
            EstimationStrategy::Fft => Strategy::Fft(FftStrategy::new(config.window_size)?),
            EstimationStrategy::Sdft => Strategy::Sdft(SdftStrategy::new(config.window_size)?),
        };
        let window = SampleWindow::new(config.window_size)?;
        let nominal = Float::from_f64_lossy(config.nominal_frequency.hz());

        info!(
            "Created {} estimator: window {}, nominal {}, {} precision",
            strategy.name(),
            config.window_size,
            config.nominal_frequency,
            Float::NAME
        );

        Ok(Estimator {
            config,
            calibration,
            window,
            strategy,
            tracker: FrequencyTracker::new(config.frequency_source, nominal),
            bin: None,
            processed: 0,
        })
    }

    /// Clones the estimator, reporting allocation failure as
    /// `EstimatorError::ResourceExhausted` where `clone` would abort.
    pub fn try_clone(&self) -> Result<Self, EstimatorError> {
        Ok(Estimator {
            config: self.config,
            calibration: self.calibration,
            window: self.window.try_clone()?,
            strategy: self.strategy.try_clone()?,
            tracker: self.tracker.clone(),
            bin: self.bin,
            processed: self.processed,
        })
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn state(&self) -> EstimatorState {
        if self.window.is_full() {
            EstimatorState::Ready
        } else {
            EstimatorState::Filling
        }
    }

    /// The fundamental bin, selected when the window first filled.
    pub fn fundamental_bin(&self) -> Option<&FundamentalBin> {
        self.bin.as_ref()
    }

    /// Number of samples processed since construction.
    pub fn samples_processed(&self) -> u64 {
        self.processed
    }

    /// Estimates phasors, frequency and ROCOF for one raw sample.
    ///
    /// While the window is filling the result is `Synchrophasor::not_ready`: zero
    /// phasors, nominal frequency and zero ROCOF. Never fails.
    pub fn estimate_measurements(&mut self, sample: &Sample) -> Synchrophasor {
        let calibrated = self.calibration.calibrate(sample);
        self.window.push(calibrated);
        self.strategy.feed(&calibrated);
        self.processed += 1;

        if !self.window.is_full() {
            return Synchrophasor::not_ready(
                sample.timestamp_us,
                Float::from_f64_lossy(self.config.nominal_frequency.hz()),
            );
        }

        let bin = match self.bin {
            Some(bin) => bin,
            None => self.select_bin(),
        };

        let raw = self.strategy.estimate(&self.window, &bin);
        let oldest_index = self.processed - self.config.window_size as u64;

        let mut result = Synchrophasor {
            timestamp_us: sample.timestamp_us,
            ..Synchrophasor::default()
        };
        for (ch, value) in raw.into_iter().enumerate() {
            let polar = bin.to_polar(value, oldest_index);
            result.magnitudes[ch] = polar.magnitude;
            result.phase_angles[ch] = polar.angle;
        }

        let (frequency, rocof) = self
            .tracker
            .update(sample.timestamp_us, &result.phase_angles);
        result.frequency = frequency;
        result.rocof = rocof;
        result
    }

    fn select_bin(&mut self) -> FundamentalBin {
        let bin = FundamentalBin::select(
            self.config.nominal_frequency.hz(),
            self.config.window_size,
            self.window.mean_interval_us(),
        );
        info!(
            "Window of {} samples full, {} estimation on bin {} ({:.3} Hz)",
            self.config.window_size,
            self.strategy.name(),
            bin.index,
            bin.frequency_hz
        );
        let nominal_hz = self.config.nominal_frequency.hz();
        let reference_hz = if bin.deviates_from(nominal_hz) {
            bin.frequency_hz
        } else {
            nominal_hz
        };
        self.tracker
            .set_reference(Float::from_f64_lossy(reference_hz));
        self.bin = Some(bin);
        bin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("FFT".parse::<EstimationStrategy>().unwrap(), EstimationStrategy::Fft);
        assert_eq!(" sdft ".parse::<EstimationStrategy>().unwrap(), EstimationStrategy::Sdft);
        assert!(matches!(
            "goertzel".parse::<EstimationStrategy>(),
            Err(EstimatorError::UnsupportedStrategy { .. })
        ));
    }

    #[test]
    fn test_config_defaults_and_serde() {
        let config = EstimatorConfig::default();
        assert_eq!(config.window_size, 64);
        assert_eq!(config.strategy, EstimationStrategy::Fft);
        assert_eq!(config.voltage, CalibrationParams::new(1.0, 0.0));
        assert_eq!(config.frequency_source, FrequencySource::Channel(0));

        let partial: EstimatorConfig =
            serde_json::from_str(r#"{"window_size": 128, "strategy": "sdft"}"#).unwrap();
        assert_eq!(partial.window_size, 128);
        assert_eq!(partial.strategy, EstimationStrategy::Sdft);
        assert_eq!(partial.nominal_frequency, NominalFrequency::Hz50);

        let json = serde_json::to_string(&config).unwrap();
        let back: EstimatorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_invalid_configuration() {
        let zero = Estimator::new(0, EstimationStrategy::Fft, (1.0, 0.0), (1.0, 0.0));
        assert!(matches!(zero, Err(EstimatorError::InvalidWindowSize { .. })));

        let source = Estimator::with_config(EstimatorConfig {
            frequency_source: FrequencySource::Channel(6),
            ..EstimatorConfig::default()
        });
        assert!(matches!(
            source,
            Err(EstimatorError::InvalidFrequencySource { .. })
        ));

        let calibration = Estimator::new(
            8,
            EstimationStrategy::Sdft,
            (Float::INFINITY, 0.0),
            (1.0, 0.0),
        );
        assert!(matches!(
            calibration,
            Err(EstimatorError::InvalidCalibration { .. })
        ));
    }

    #[test]
    fn test_oversized_window_is_resource_error() {
        for strategy in [EstimationStrategy::Fft, EstimationStrategy::Sdft] {
            let result = Estimator::new(usize::MAX / 2, strategy, (1.0, 0.0), (1.0, 0.0));
            assert!(
                matches!(result, Err(EstimatorError::ResourceExhausted { .. })),
                "{} should fail to allocate",
                strategy
            );
        }
    }

    #[test]
    fn test_state_transition() {
        let mut estimator =
            Estimator::new(4, EstimationStrategy::Fft, (1.0, 0.0), (1.0, 0.0)).unwrap();
        for i in 0..3u64 {
            assert_eq!(estimator.state(), EstimatorState::Filling);
            estimator.estimate_measurements(&Sample {
                seq_no: i,
                timestamp_us: i * 100,
                time_delta_us: 100,
                ..Sample::default()
            });
        }
        assert!(estimator.fundamental_bin().is_none());
        estimator.estimate_measurements(&Sample {
            seq_no: 3,
            timestamp_us: 300,
            time_delta_us: 100,
            ..Sample::default()
        });
        assert_eq!(estimator.state(), EstimatorState::Ready);
        assert_eq!(estimator.samples_processed(), 4);
        assert!(estimator.fundamental_bin().is_some());
    }
}
