//! # Frequency and ROCOF Tracking
//!
//! Derives system frequency and its rate of change from the evolution of the estimated
//! phase angle between consecutive ready estimates:
//!
//! ```text
//! frequency = reference + wrap(Δφ) / (2π·Δt)
//! rocof     = (frequency - previous_frequency) / Δt
//! ```
//!
//! `reference` is the nominal frequency, unless the fundamental bin sits measurably
//! off nominal, in which case it is the bin frequency, at which a signal's phase is
//! stationary. The phase difference is wrapped into `(-π, π]` before conversion.

use crate::common::{CHANNEL_COUNT, SIGNALS};
use crate::numeric::PmuFloat;
use crate::phasors::wrap_angle;
use crate::units::SignalType;
use log::debug;
use serde::{Deserialize, Serialize};

/// Phase input of the frequency tracker.
///
/// # Variants
///
/// * `Channel(i)`: The phase of channel `i` (0 = VA).
/// * `VoltageAverage`: The mean phase advance of VA, VB and VC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencySource {
    Channel(usize),
    VoltageAverage,
}

impl Default for FrequencySource {
    fn default() -> Self {
        FrequencySource::Channel(0)
    }
}

#[derive(Debug, Clone, Copy)]
struct PhasePoint<F> {
    timestamp_us: u64,
    angles: [F; CHANNEL_COUNT],
}

/// Finite-difference frequency and ROCOF tracker.
#[derive(Debug, Clone)]
pub struct FrequencyTracker<F> {
    source: FrequencySource,
    reference: F,
    previous: Option<PhasePoint<F>>,
    frequency: F,
    rocof: F,
    measured: bool,
}

impl<F: PmuFloat> FrequencyTracker<F> {
    /// Creates a tracker in its initial state: nominal frequency, zero ROCOF.
    pub fn new(source: FrequencySource, nominal: F) -> Self {
        FrequencyTracker {
            source,
            reference: nominal,
            previous: None,
            frequency: nominal,
            rocof: F::zero(),
            measured: false,
        }
    }

    /// Sets the frequency at which phase is stationary.
    pub fn set_reference(&mut self, reference: F) {
        self.reference = reference;
    }

    pub fn frequency(&self) -> F {
        self.frequency
    }

    pub fn rocof(&self) -> F {
        self.rocof
    }

    /// Consumes the phase angles of one ready estimate.
    ///
    /// # Parameters
    ///
    /// * `timestamp_us`: Timestamp of the estimate.
    /// * `angles`: Phase angle of every channel in radians.
    ///
    /// # Returns
    ///
    /// `(frequency, rocof)` after the update.
    pub fn update(&mut self, timestamp_us: u64, angles: &[F; CHANNEL_COUNT]) -> (F, F) {
        let current = PhasePoint {
            timestamp_us,
            angles: *angles,
        };
        let previous = match self.previous {
            Some(previous) => previous,
            None => {
                self.previous = Some(current);
                return (self.frequency, self.rocof);
            }
        };

        if timestamp_us <= previous.timestamp_us {
            debug!(
                "Timestamp {} does not advance past {}, holding frequency {} and ROCOF {}",
                timestamp_us, previous.timestamp_us, self.frequency, self.rocof
            );
            return (self.frequency, self.rocof);
        }

        let dt = F::from_u64_lossy(timestamp_us - previous.timestamp_us) * F::from_f64_lossy(1e-6);
        let dphi = self.phase_advance(&previous.angles, angles);
        let frequency = self.reference + dphi / (F::TAU() * dt);

        self.rocof = if self.measured {
            (frequency - self.frequency) / dt
        } else {
            F::zero()
        };
        self.frequency = frequency;
        self.measured = true;
        self.previous = Some(current);
        (self.frequency, self.rocof)
    }

    fn phase_advance(&self, previous: &[F; CHANNEL_COUNT], current: &[F; CHANNEL_COUNT]) -> F {
        match self.source {
            FrequencySource::Channel(index) => wrap_angle(current[index] - previous[index]),
            FrequencySource::VoltageAverage => {
                let (sum, count) = SIGNALS
                    .iter()
                    .filter(|signal| signal.signal_type == SignalType::Voltage)
                    .fold((F::zero(), 0usize), |(sum, count), signal| {
                        let i = signal.index;
                        (sum + wrap_angle(current[i] - previous[i]), count + 1)
                    });
                sum / F::from_usize_lossy(count)
            }
        }
    }
}
