//! # Floating-Point Backend
//!
//! The estimator is written once against the `PmuFloat` capability trait and
//! instantiated with a single floating-point type chosen at build time. The
//! crate-wide `Float` alias is `f64` unless the `single-precision` feature is
//! enabled, in which case it is `f32`.
//!
//! ## Key Components
//!
//! - `PmuFloat`: Everything the numeric code needs from a float: FFT support from
//!   `rustfft`, transcendental functions from `num_traits::Float` and conversions
//!   from the integer and `f64` domains.
//! - `Float`: The build-selected precision used by the estimator facade and the
//!   `Sample`/`Synchrophasor` records.

use rustfft::FftNum;
use std::fmt;

/// Build-selected floating-point type of the estimator.
#[cfg(not(feature = "single-precision"))]
pub type Float = f64;

/// Build-selected floating-point type of the estimator.
#[cfg(feature = "single-precision")]
pub type Float = f32;

/// Numeric capabilities required by the calibration, window, transform and
/// tracking code.
///
/// `FftNum` and `num_traits::Float` both provide `abs`; call it as
/// `Float::abs(x)` in generic code to avoid the ambiguity.
pub trait PmuFloat:
    FftNum + num_traits::Float + num_traits::FloatConst + Default + fmt::Display
{
    /// Short name of the type, used in log output.
    const NAME: &'static str;

    /// Converts an `f64`, rounding to the nearest representable value.
    fn from_f64_lossy(value: f64) -> Self;

    /// Converts an unsigned integer (e.g. a raw ADC count), rounding to the
    /// nearest representable value.
    fn from_u64_lossy(value: u64) -> Self;

    /// Converts a count or index.
    fn from_usize_lossy(value: usize) -> Self {
        Self::from_u64_lossy(value as u64)
    }

    /// Widens to `f64`.
    fn to_f64_lossy(self) -> f64;
}

impl PmuFloat for f32 {
    const NAME: &'static str = "f32";

    fn from_f64_lossy(value: f64) -> Self {
        value as f32
    }

    fn from_u64_lossy(value: u64) -> Self {
        value as f32
    }

    fn to_f64_lossy(self) -> f64 {
        self as f64
    }
}

impl PmuFloat for f64 {
    const NAME: &'static str = "f64";

    fn from_f64_lossy(value: f64) -> Self {
        value
    }

    fn from_u64_lossy(value: u64) -> Self {
        value as f64
    }

    fn to_f64_lossy(self) -> f64 {
        self
    }
}
