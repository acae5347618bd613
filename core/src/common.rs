//! # Common Types and Errors
//!
//! This module defines the records exchanged between the estimation core and its
//! collaborators (sample sources, GUIs, CSV exporters) together with the error types
//! used across the crate.
//!
//! ## Key Components
//!
//! - `EstimatorError`: Configuration and resource failures raised at construction.
//! - `ParseError`: Failures while parsing sample text or field orderings.
//! - `Sample`: One raw acquisition from the analog-to-digital converter.
//! - `Signal` and `SIGNALS`: Static metadata of the six channels.
//! - `Synchrophasor`: One estimation result (phasors, frequency, ROCOF).
//! - `SampleField` and `SampleFieldOrdering`: Field layout of a text sample line.
//!
//! ## Usage
//!
//! `Sample` and `Synchrophasor` are fixed-width records; their field order (sequence
//! number, `VA, VB, VC, IA, IB, IC`, timestamp, time delta) is the interchange contract
//! with the text and CSV helpers in `format`.

use crate::numeric::Float;
use crate::phasors::wrap_angle;
use crate::units::{SignalPhase, SignalType, PHASE_COUNT};
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of measured channels (3 phases x 2 signal types).
pub const CHANNEL_COUNT: usize = 6;

/// Number of fields in a sample line produced by the ADC driver.
pub const SAMPLE_FIELD_COUNT: usize = 9;

/// Represents errors raised while building an estimator.
///
/// No partially constructed estimator is ever returned alongside one of these.
///
/// # Variants
///
/// * `InvalidWindowSize`: The window size is zero.
/// * `UnsupportedStrategy`: The requested estimation strategy is unknown.
/// * `InvalidCalibration`: A calibration scale or offset is not finite.
/// * `InvalidFrequencySource`: The frequency reference channel does not exist.
/// * `ResourceExhausted`: Transform buffers could not be allocated.
#[derive(Debug, Clone, PartialEq)]
pub enum EstimatorError {
    InvalidWindowSize { message: String },
    UnsupportedStrategy { message: String },
    InvalidCalibration { message: String },
    InvalidFrequencySource { message: String },
    ResourceExhausted { message: String },
}

impl fmt::Display for EstimatorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EstimatorError::InvalidWindowSize { message } => {
                write!(f, "Invalid window size: {}", message)
            }
            EstimatorError::UnsupportedStrategy { message } => {
                write!(f, "Unsupported strategy: {}", message)
            }
            EstimatorError::InvalidCalibration { message } => {
                write!(f, "Invalid calibration: {}", message)
            }
            EstimatorError::InvalidFrequencySource { message } => {
                write!(f, "Invalid frequency source: {}", message)
            }
            EstimatorError::ResourceExhausted { message } => {
                write!(f, "Resource exhausted: {}", message)
            }
        }
    }
}

impl std::error::Error for EstimatorError {}

/// Represents errors that can occur while parsing sample text.
///
/// # Variants
///
/// * `InvalidLength`: The line does not hold exactly `SAMPLE_FIELD_COUNT` fields.
/// * `InvalidField`: A field is not an unsigned integer.
/// * `InvalidFormat`: A field ordering or option string is malformed.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    InvalidLength { message: String },
    InvalidField { message: String },
    InvalidFormat { message: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::InvalidLength { message } => write!(f, "Invalid length: {}", message),
            ParseError::InvalidField { message } => write!(f, "Invalid field: {}", message),
            ParseError::InvalidFormat { message } => write!(f, "Invalid format: {}", message),
        }
    }
}

impl std::error::Error for ParseError {}

/// One acquisition from the analog-to-digital converter.
///
/// # Fields
///
/// * `seq_no`: Monotonic sequence number.
/// * `channels`: Raw counts ordered `VA, VB, VC, IA, IB, IC`.
/// * `timestamp_us`: Absolute timestamp in microseconds.
/// * `time_delta_us`: Difference from the previous sample's timestamp in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sample {
    pub seq_no: u64,
    pub channels: [u64; CHANNEL_COUNT],
    pub timestamp_us: u64,
    pub time_delta_us: u64,
}

/// Static metadata of one measured channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub index: usize,
    pub name: &'static str,
    pub signal_type: SignalType,
    pub phase: SignalPhase,
}

/// The six channels in acquisition order.
pub const SIGNALS: [Signal; CHANNEL_COUNT] = [
    Signal { index: 0, name: "VA", signal_type: SignalType::Voltage, phase: SignalPhase::A },
    Signal { index: 1, name: "VB", signal_type: SignalType::Voltage, phase: SignalPhase::B },
    Signal { index: 2, name: "VC", signal_type: SignalType::Voltage, phase: SignalPhase::C },
    Signal { index: 3, name: "IA", signal_type: SignalType::Current, phase: SignalPhase::A },
    Signal { index: 4, name: "IB", signal_type: SignalType::Current, phase: SignalPhase::B },
    Signal { index: 5, name: "IC", signal_type: SignalType::Current, phase: SignalPhase::C },
];

/// Channel indices of `(voltage, current)` for phases A, B and C.
pub const SIGNAL_PHASE_PAIRS: [(usize, usize); PHASE_COUNT] = [(0, 3), (1, 4), (2, 5)];

/// Estimated phasors, frequency and rate of change of frequency for one sample.
///
/// Magnitudes are peak amplitudes in volts or amperes, phase angles are in radians
/// within `(-π, π]`, frequency is in Hz and ROCOF in Hz/s.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Synchrophasor {
    pub timestamp_us: u64,
    pub magnitudes: [Float; CHANNEL_COUNT],
    pub phase_angles: [Float; CHANNEL_COUNT],
    pub frequency: Float,
    pub rocof: Float,
}

impl Synchrophasor {
    /// The well-defined result reported while the sample window is still filling:
    /// zero phasors, nominal frequency and zero ROCOF.
    pub fn not_ready(timestamp_us: u64, nominal_frequency: Float) -> Self {
        Synchrophasor {
            timestamp_us,
            magnitudes: [0.0; CHANNEL_COUNT],
            phase_angles: [0.0; CHANNEL_COUNT],
            frequency: nominal_frequency,
            rocof: 0.0,
        }
    }

    /// Phasor of channel `index` in rectangular form.
    ///
    /// # Panics
    ///
    /// Panics if `index >= CHANNEL_COUNT`. The per-phase helpers below take a
    /// `SignalPhase` and cannot go out of range.
    pub fn phasor(&self, index: usize) -> Complex<Float> {
        Complex::from_polar(self.magnitudes[index], self.phase_angles[index])
    }

    /// Angle of the phase voltage minus the angle of the phase current, in `(-π, π]`.
    pub fn phase_difference(&self, phase: SignalPhase) -> Float {
        let (v, i) = SIGNAL_PHASE_PAIRS[phase.index()];
        wrap_angle(self.phase_angles[v] - self.phase_angles[i])
    }

    /// Active power of one phase from peak phasors: `½·V·I·cos(Δφ)`.
    pub fn active_power(&self, phase: SignalPhase) -> Float {
        let (v, i) = SIGNAL_PHASE_PAIRS[phase.index()];
        0.5 * self.magnitudes[v] * self.magnitudes[i] * self.phase_difference(phase).cos()
    }

    /// Reactive power of one phase from peak phasors: `½·V·I·sin(Δφ)`.
    pub fn reactive_power(&self, phase: SignalPhase) -> Float {
        let (v, i) = SIGNAL_PHASE_PAIRS[phase.index()];
        0.5 * self.magnitudes[v] * self.magnitudes[i] * self.phase_difference(phase).sin()
    }
}

/// A field of a sample line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleField {
    SequenceNumber,
    VA,
    VB,
    VC,
    IA,
    IB,
    IC,
    Timestamp,
    TimeDelta,
}

impl SampleField {
    /// All fields in the default driver order.
    pub const ALL: [SampleField; SAMPLE_FIELD_COUNT] = [
        SampleField::SequenceNumber,
        SampleField::VA,
        SampleField::VB,
        SampleField::VC,
        SampleField::IA,
        SampleField::IB,
        SampleField::IC,
        SampleField::Timestamp,
        SampleField::TimeDelta,
    ];

    /// Human-readable name used in headers.
    pub fn name(&self) -> &'static str {
        match self {
            SampleField::SequenceNumber => "Sequence number",
            SampleField::VA => "VA",
            SampleField::VB => "VB",
            SampleField::VC => "VC",
            SampleField::IA => "IA",
            SampleField::IB => "IB",
            SampleField::IC => "IC",
            SampleField::Timestamp => "Timestamp (µs)",
            SampleField::TimeDelta => "Time-delta (µs)",
        }
    }

    /// Channel index for the six measurement fields, `None` otherwise.
    pub fn channel(&self) -> Option<usize> {
        match self {
            SampleField::VA => Some(0),
            SampleField::VB => Some(1),
            SampleField::VC => Some(2),
            SampleField::IA => Some(3),
            SampleField::IB => Some(4),
            SampleField::IC => Some(5),
            _ => None,
        }
    }
}

impl FromStr for SampleField {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seq" | "seqno" | "seq_no" | "sequence" => Ok(SampleField::SequenceNumber),
            "va" => Ok(SampleField::VA),
            "vb" => Ok(SampleField::VB),
            "vc" => Ok(SampleField::VC),
            "ia" => Ok(SampleField::IA),
            "ib" => Ok(SampleField::IB),
            "ic" => Ok(SampleField::IC),
            "ts" | "timestamp" => Ok(SampleField::Timestamp),
            "delta" | "dt" | "timedelta" | "time_delta" => Ok(SampleField::TimeDelta),
            other => Err(ParseError::InvalidFormat {
                message: format!("Unknown sample field: {:?}", other),
            }),
        }
    }
}

/// Position of each field in a sample line; always a permutation of `SampleField::ALL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleFieldOrdering([SampleField; SAMPLE_FIELD_COUNT]);

impl SampleFieldOrdering {
    /// Builds an ordering, rejecting anything that is not a permutation of the nine fields.
    pub fn new(fields: [SampleField; SAMPLE_FIELD_COUNT]) -> Result<Self, ParseError> {
        for field in SampleField::ALL {
            let count = fields.iter().filter(|f| **f == field).count();
            if count != 1 {
                return Err(ParseError::InvalidFormat {
                    message: format!(
                        "Field {:?} must appear exactly once in an ordering, found {}",
                        field, count
                    ),
                });
            }
        }
        Ok(SampleFieldOrdering(fields))
    }

    /// Fields in line order.
    pub fn fields(&self) -> &[SampleField; SAMPLE_FIELD_COUNT] {
        &self.0
    }
}

impl Default for SampleFieldOrdering {
    fn default() -> Self {
        SampleFieldOrdering(SampleField::ALL)
    }
}

impl FromStr for SampleFieldOrdering {
    type Err = ParseError;

    /// Parses a comma-separated list such as `"seq,va,vb,vc,ia,ib,ic,ts,delta"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = s
            .split(',')
            .map(str::parse::<SampleField>)
            .collect::<Result<Vec<_>, _>>()?;
        let fields: [SampleField; SAMPLE_FIELD_COUNT] =
            parsed.try_into().map_err(|v: Vec<SampleField>| ParseError::InvalidLength {
                message: format!(
                    "Field ordering needs {} fields, got {}",
                    SAMPLE_FIELD_COUNT,
                    v.len()
                ),
            })?;
        SampleFieldOrdering::new(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_3;

    #[test]
    fn test_signal_table() {
        for (i, signal) in SIGNALS.iter().enumerate() {
            assert_eq!(signal.index, i);
        }
        assert_eq!(SIGNALS[0].name, "VA");
        assert_eq!(SIGNALS[5].signal_type, SignalType::Current);
        for (v, i) in SIGNAL_PHASE_PAIRS {
            assert_eq!(SIGNALS[v].phase, SIGNALS[i].phase);
            assert_eq!(SIGNALS[v].signal_type, SignalType::Voltage);
            assert_eq!(SIGNALS[i].signal_type, SignalType::Current);
        }
    }

    #[test]
    #[should_panic]
    fn test_phasor_out_of_range() {
        Synchrophasor::not_ready(0, 50.0).phasor(CHANNEL_COUNT);
    }

    #[test]
    fn test_not_ready_record() {
        let record = Synchrophasor::not_ready(42, 50.0);
        assert_eq!(record.timestamp_us, 42);
        assert!(record.magnitudes.iter().all(|m| *m == 0.0));
        assert_eq!(record.frequency, 50.0);
        assert_eq!(record.rocof, 0.0);
    }

    #[test]
    fn test_per_phase_power() {
        let mut record = Synchrophasor::not_ready(0, 50.0);
        record.magnitudes[0] = 230.0;
        record.magnitudes[3] = 10.0;
        record.phase_angles[0] = 0.0;
        record.phase_angles[3] = -FRAC_PI_3 as Float;

        let diff = record.phase_difference(SignalPhase::A);
        assert!((diff - FRAC_PI_3 as Float).abs() < 1e-6);
        // 0.5 * 230 * 10 * cos(60°) = 575
        assert!((record.active_power(SignalPhase::A) - 575.0).abs() < 1e-3);
        assert!(record.reactive_power(SignalPhase::A) > 0.0);
        assert_eq!(record.active_power(SignalPhase::B), 0.0);
    }

    #[test]
    fn test_field_ordering_parsing() {
        let ordering: SampleFieldOrdering = "ts,delta,seq,ia,ib,ic,va,vb,vc".parse().unwrap();
        assert_eq!(ordering.fields()[0], SampleField::Timestamp);
        assert_eq!(ordering.fields()[8], SampleField::VC);

        // VA twice, VB missing
        let duplicate = "seq,va,va,vc,ia,ib,ic,ts,delta".parse::<SampleFieldOrdering>();
        assert!(matches!(duplicate, Err(ParseError::InvalidFormat { .. })));

        let short = "seq,va,vb".parse::<SampleFieldOrdering>();
        assert!(matches!(short, Err(ParseError::InvalidLength { .. })));

        assert_eq!(SampleFieldOrdering::default().fields(), &SampleField::ALL);
    }
}
