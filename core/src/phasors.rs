//! # Phasor Representation and Fundamental-Bin Utilities
//!
//! This module provides the phasor types produced by the estimation strategies and the
//! rules that turn one DFT bin of a sample window into a physical phasor.
//!
//! ## Key Components
//!
//! - `PhasorPolar`, `PhasorRect`: A phasor in polar (magnitude, angle) or rectangular
//!   (real, imaginary) form, with conversions between the two.
//! - `FundamentalBin`: The DFT bin nearest the nominal system frequency for a given
//!   window size and sample interval, its normalization constant and its phase
//!   reference rotation.
//! - `wrap_angle`: Wraps an angle into `(-π, π]`.
//! - `calc_magnitude`: Calculates the magnitude of a rectangular phasor.
//!
//! ## Usage
//!
//! The estimator selects a `FundamentalBin` once, when its window first fills. Both
//! strategies then report the raw DFT value `X_k` of the window (index 0 at the oldest
//! sample) and `FundamentalBin::to_polar` scales and de-rotates it so that a sinusoid
//! sitting exactly on the bin yields its peak amplitude and a constant phase.

use crate::numeric::PmuFloat;
use log::warn;
use num_complex::Complex;
use serde::{Deserialize, Serialize};

/// Relative deviation of the bin frequency from nominal above which a warning is logged.
pub const BIN_DEVIATION_WARN_RATIO: f64 = 1e-4;

/// Wraps an angle in radians into `(-π, π]`.
///
/// # Parameters
///
/// * `angle`: Any finite angle in radians.
///
/// # Returns
///
/// The equivalent angle in `(-π, π]`.
pub fn wrap_angle<F: PmuFloat>(angle: F) -> F {
    let two_pi = F::TAU();
    let mut wrapped = angle % two_pi;
    if wrapped < F::zero() {
        wrapped = wrapped + two_pi;
    }
    if wrapped > F::PI() {
        wrapped = wrapped - two_pi;
    }
    wrapped
}

/// Calculates the magnitude of a rectangular phasor.
///
/// # Parameters
///
/// * `real`: Real component of the phasor.
/// * `imag`: Imaginary component of the phasor.
///
/// # Returns
///
/// The phasor's magnitude, `sqrt(real² + imag²)`.
pub fn calc_magnitude<F: PmuFloat>(real: F, imag: F) -> F {
    real.hypot(imag)
}

/// A phasor in polar form.
///
/// # Fields
///
/// * `magnitude`: Peak amplitude in physical units (volts or amperes).
/// * `angle`: Phase angle in radians, within `(-π, π]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PhasorPolar<F> {
    pub magnitude: F,
    pub angle: F,
}

impl<F: PmuFloat> PhasorPolar<F> {
    /// Converts the phasor to rectangular form.
    pub fn to_rect(&self) -> PhasorRect<F> {
        PhasorRect {
            real: self.magnitude * self.angle.cos(),
            imag: self.magnitude * self.angle.sin(),
        }
    }
}

/// A phasor in rectangular form.
///
/// # Fields
///
/// * `real`: Real component in physical units.
/// * `imag`: Imaginary component in physical units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PhasorRect<F> {
    pub real: F,
    pub imag: F,
}

impl<F: PmuFloat> PhasorRect<F> {
    /// Converts the phasor to polar form with the angle in `(-π, π]`.
    pub fn to_polar(&self) -> PhasorPolar<F> {
        PhasorPolar {
            magnitude: calc_magnitude(self.real, self.imag),
            angle: wrap_angle(self.imag.atan2(self.real)),
        }
    }
}

impl<F> From<Complex<F>> for PhasorRect<F> {
    fn from(value: Complex<F>) -> Self {
        PhasorRect {
            real: value.re,
            imag: value.im,
        }
    }
}

impl<F> From<PhasorRect<F>> for Complex<F> {
    fn from(value: PhasorRect<F>) -> Self {
        Complex::new(value.real, value.imag)
    }
}

/// The DFT bin read as the fundamental, fixed once the window has filled.
///
/// # Fields
///
/// * `index`: Bin index `k`, within `[0, window_size / 2]`.
/// * `window_size`: DFT length `N`.
/// * `frequency_hz`: Frequency of the bin, `k / (N·Ts)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundamentalBin {
    pub index: usize,
    pub window_size: usize,
    pub frequency_hz: f64,
}

impl FundamentalBin {
    /// Selects the bin nearest the nominal frequency.
    ///
    /// # Parameters
    ///
    /// * `nominal_hz`: Nominal system frequency.
    /// * `window_size`: DFT length `N`, at least 1.
    /// * `interval_us`: Mean sample interval over the window, `None` when unknown.
    ///
    /// # Returns
    ///
    /// `k = round(nominal · N · Ts)` clamped to `[0, N/2]`. With an unknown interval
    /// the window is assumed to span one nominal cycle and `k = min(1, N/2)`.
    pub fn select(nominal_hz: f64, window_size: usize, interval_us: Option<f64>) -> Self {
        let n = window_size.max(1);
        let max_index = n / 2;

        let interval_s = match interval_us {
            Some(us) if us.is_finite() && us > 0.0 => us * 1e-6,
            _ => {
                warn!(
                    "Sample interval unknown, assuming the {}-sample window spans one {} Hz cycle",
                    n, nominal_hz
                );
                return FundamentalBin {
                    index: 1.min(max_index),
                    window_size: n,
                    frequency_hz: nominal_hz,
                };
            }
        };

        let span_s = n as f64 * interval_s;
        let index = ((nominal_hz * span_s).round().max(0.0) as usize).min(max_index);
        let frequency_hz = index as f64 / span_s;

        let bin = FundamentalBin {
            index,
            window_size: n,
            frequency_hz,
        };
        if bin.deviates_from(nominal_hz) {
            warn!(
                "Fundamental bin {} of {} is at {:.4} Hz, nominal is {} Hz (sample rate {:.2} Hz)",
                index,
                n,
                frequency_hz,
                nominal_hz,
                1.0 / interval_s
            );
        }
        bin
    }

    /// True when the bin frequency is off `nominal_hz` by more than the relative
    /// tolerance `BIN_DEVIATION_WARN_RATIO`.
    ///
    /// Within the tolerance the difference comes from timestamp quantization and the
    /// bin is taken to sit on the nominal frequency.
    pub fn deviates_from(&self, nominal_hz: f64) -> bool {
        (self.frequency_hz - nominal_hz).abs() > nominal_hz * BIN_DEVIATION_WARN_RATIO
    }

    /// True for the DC bin and, for even window sizes, the Nyquist bin.
    pub fn is_edge(&self) -> bool {
        self.index == 0 || 2 * self.index == self.window_size
    }

    /// Factor mapping `|X_k|` to the peak amplitude of a sinusoid on the bin:
    /// `2/N`, or `1/N` for the DC and Nyquist bins.
    pub fn normalization<F: PmuFloat>(&self) -> F {
        let n = F::from_usize_lossy(self.window_size);
        if self.is_edge() {
            F::one() / n
        } else {
            F::from_f64_lossy(2.0) / n
        }
    }

    /// `e^{j2π·k·m/N}`, the bin's twiddle factor raised to the power `m`.
    ///
    /// The exponent is reduced modulo `N` in integer arithmetic so that the result
    /// stays exact for arbitrarily large `m`.
    pub fn twiddle<F: PmuFloat>(&self, m: u64) -> Complex<F> {
        let n = self.window_size as u128;
        let turns = (self.index as u128 * (m as u128 % n)) % n;
        let angle = F::TAU() * F::from_u64_lossy(turns as u64) / F::from_usize_lossy(self.window_size);
        Complex::from_polar(F::one(), angle)
    }

    /// Scales and de-rotates a raw window DFT value into a phasor.
    ///
    /// # Parameters
    ///
    /// * `raw`: `X_k` of the current window, index 0 at the oldest sample.
    /// * `oldest_index`: Zero-based count, since construction, of the window's oldest sample.
    ///
    /// # Returns
    ///
    /// The phasor referenced to the first sample ever processed.
    pub fn to_polar<F: PmuFloat>(&self, raw: Complex<F>, oldest_index: u64) -> PhasorPolar<F> {
        let referenced = raw * self.twiddle::<F>(oldest_index).conj() * self.normalization::<F>();
        PhasorRect::from(referenced).to_polar()
    }
}
