//! # ADC Calibration
//!
//! Converts raw per-channel ADC counts into physical units with one affine transform
//! per signal type: `physical = raw * scale + offset`. The voltage pair applies to
//! `VA, VB, VC` and the current pair to `IA, IB, IC`.

use crate::common::{EstimatorError, Sample, CHANNEL_COUNT, SIGNALS};
use crate::numeric::PmuFloat;
use crate::units::SignalType;
use serde::{Deserialize, Serialize};

/// Affine transform `(scale, offset)` for one signal type.
///
/// The default `(1, 0)` passes raw counts through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationParams<F> {
    pub scale: F,
    pub offset: F,
}

impl<F: PmuFloat> CalibrationParams<F> {
    pub fn new(scale: F, offset: F) -> Self {
        CalibrationParams { scale, offset }
    }

    /// Applies the transform to one raw count.
    #[inline]
    pub fn apply(&self, raw: u64) -> F {
        F::from_u64_lossy(raw) * self.scale + self.offset
    }

    fn validate(&self, signal_type: SignalType) -> Result<(), EstimatorError> {
        if self.scale.is_finite() && self.offset.is_finite() {
            Ok(())
        } else {
            Err(EstimatorError::InvalidCalibration {
                message: format!(
                    "{} calibration must be finite, got scale={} offset={}",
                    signal_type, self.scale, self.offset
                ),
            })
        }
    }
}

impl<F: PmuFloat> Default for CalibrationParams<F> {
    fn default() -> Self {
        CalibrationParams {
            scale: F::one(),
            offset: F::zero(),
        }
    }
}

impl<F: PmuFloat> From<(F, F)> for CalibrationParams<F> {
    fn from((scale, offset): (F, F)) -> Self {
        CalibrationParams { scale, offset }
    }
}

/// A sample after calibration: same timing fields, channels in physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibratedSample<F> {
    pub seq_no: u64,
    pub channels: [F; CHANNEL_COUNT],
    pub timestamp_us: u64,
    pub time_delta_us: u64,
}

/// Voltage and current calibration of an estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration<F> {
    pub voltage: CalibrationParams<F>,
    pub current: CalibrationParams<F>,
}

impl<F: PmuFloat> Calibration<F> {
    /// Creates a calibration, rejecting non-finite parameters.
    pub fn new(
        voltage: CalibrationParams<F>,
        current: CalibrationParams<F>,
    ) -> Result<Self, EstimatorError> {
        voltage.validate(SignalType::Voltage)?;
        current.validate(SignalType::Current)?;
        Ok(Calibration { voltage, current })
    }

    /// Parameters applying to a signal type.
    pub fn params(&self, signal_type: SignalType) -> &CalibrationParams<F> {
        match signal_type {
            SignalType::Voltage => &self.voltage,
            SignalType::Current => &self.current,
        }
    }

    /// Converts every channel of a raw sample to physical units.
    pub fn calibrate(&self, raw: &Sample) -> CalibratedSample<F> {
        let mut channels = [F::zero(); CHANNEL_COUNT];
        for (value, signal) in channels.iter_mut().zip(SIGNALS.iter()) {
            *value = self.params(signal.signal_type).apply(raw.channels[signal.index]);
        }
        CalibratedSample {
            seq_no: raw.seq_no,
            channels,
            timestamp_us: raw.timestamp_us,
            time_delta_us: raw.time_delta_us,
        }
    }
}

impl<F: PmuFloat> Default for Calibration<F> {
    fn default() -> Self {
        Calibration {
            voltage: CalibrationParams::default(),
            current: CalibrationParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(channels: [u64; CHANNEL_COUNT]) -> Sample {
        Sample {
            seq_no: 7,
            channels,
            timestamp_us: 1_000,
            time_delta_us: 250,
        }
    }

    #[test]
    fn test_default_passes_counts_through() {
        let calibration = Calibration::<f64>::default();
        let out = calibration.calibrate(&sample([1, 2, 3, 4, 5, 6]));
        assert_eq!(out.channels, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(out.seq_no, 7);
        assert_eq!(out.timestamp_us, 1_000);
        assert_eq!(out.time_delta_us, 250);
    }

    #[test]
    fn test_zero_count_yields_offset() {
        let calibration = Calibration::new(
            CalibrationParams::new(0.5, -100.0),
            CalibrationParams::new(0.01, 2.0),
        )
        .unwrap();
        let out = calibration.calibrate(&sample([0; CHANNEL_COUNT]));
        assert_eq!(&out.channels[..3], &[-100.0; 3]);
        assert_eq!(&out.channels[3..], &[2.0; 3]);
    }

    #[test]
    fn test_groups_are_independent() {
        let calibration = Calibration::new(
            CalibrationParams::new(0.5, -100.0),
            CalibrationParams::new(0.01, 2.0),
        )
        .unwrap();
        let k = 4096;
        let out = calibration.calibrate(&sample([k; CHANNEL_COUNT]));
        for v in &out.channels[..3] {
            assert!((v - (k as f64 * 0.5 - 100.0)).abs() < 1e-9);
        }
        for i in &out.channels[3..] {
            assert!((i - (k as f64 * 0.01 + 2.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_non_finite_params() {
        let result = Calibration::new(
            CalibrationParams::new(f64::NAN, 0.0),
            CalibrationParams::default(),
        );
        assert!(matches!(result, Err(EstimatorError::InvalidCalibration { .. })));

        let result = Calibration::new(
            CalibrationParams::default(),
            CalibrationParams::new(1.0, f64::INFINITY),
        );
        assert!(matches!(result, Err(EstimatorError::InvalidCalibration { .. })));
    }
}
