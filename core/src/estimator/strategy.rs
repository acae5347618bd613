//! # Estimation Strategy Dispatch
//!
//! Both estimation strategies share one contract: observe every calibrated sample as
//! it enters the window, and once the window is full report, per channel, the raw DFT
//! value of the current window at the fundamental bin (index 0 at the oldest sample).
//! The facade scales and references those values, so it never needs to know which
//! strategy is active.

use super::fft::FftStrategy;
use super::sdft::SdftStrategy;
use crate::calibration::CalibratedSample;
use crate::common::{EstimatorError, CHANNEL_COUNT};
use crate::numeric::PmuFloat;
use crate::phasors::FundamentalBin;
use crate::window::SampleWindow;
use num_complex::Complex;

/// Trait for producing fundamental-bin values from a sliding sample window.
pub trait PhasorStrategy<F: PmuFloat> {
    /// Observes a sample that has just been pushed into the window.
    ///
    /// Called for every sample, including while the window is still filling.
    fn feed(&mut self, sample: &CalibratedSample<F>);

    /// Computes `X_k` of the current window for every channel.
    ///
    /// # Parameters
    ///
    /// * `window`: The full sample window, oldest first.
    /// * `bin`: The fundamental bin; fixed for the lifetime of the estimator.
    ///
    /// # Returns
    ///
    /// One raw (unnormalized) DFT value per channel, ordered `VA, VB, VC, IA, IB, IC`.
    fn estimate(
        &mut self,
        window: &SampleWindow<F>,
        bin: &FundamentalBin,
    ) -> [Complex<F>; CHANNEL_COUNT];
}

/// The active estimation strategy of an estimator.
///
/// # Variants
///
/// * `Fft`: Batch transform of the full window on every estimate.
/// * `Sdft`: Incremental sliding-DFT recurrence, O(1) per sample.
#[derive(Debug, Clone)]
pub enum Strategy<F: PmuFloat> {
    Fft(FftStrategy<F>),
    Sdft(SdftStrategy<F>),
}

impl<F: PmuFloat> Strategy<F> {
    /// Short name of the active strategy, used in log output.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Fft(_) => "FFT",
            Strategy::Sdft(_) => "SDFT",
        }
    }

    /// Clones the strategy, reporting allocation failure instead of aborting.
    pub fn try_clone(&self) -> Result<Self, EstimatorError> {
        match self {
            Strategy::Fft(strategy) => Ok(Strategy::Fft(strategy.try_clone()?)),
            Strategy::Sdft(strategy) => Ok(Strategy::Sdft(strategy.try_clone()?)),
        }
    }
}

impl<F: PmuFloat> PhasorStrategy<F> for Strategy<F> {
    fn feed(&mut self, sample: &CalibratedSample<F>) {
        match self {
            Strategy::Fft(strategy) => strategy.feed(sample),
            Strategy::Sdft(strategy) => strategy.feed(sample),
        }
    }

    fn estimate(
        &mut self,
        window: &SampleWindow<F>,
        bin: &FundamentalBin,
    ) -> [Complex<F>; CHANNEL_COUNT] {
        match self {
            Strategy::Fft(strategy) => strategy.estimate(window, bin),
            Strategy::Sdft(strategy) => strategy.estimate(window, bin),
        }
    }
}

/// Allocates a vector of `len` copies of `fill`, reporting allocation failure
/// instead of aborting.
pub(crate) fn try_allocate<T: Clone>(
    len: usize,
    fill: T,
    what: &str,
) -> Result<Vec<T>, EstimatorError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|e| EstimatorError::ResourceExhausted {
            message: format!("{} of {} values: {}", what, len, e),
        })?;
    buffer.resize(len, fill);
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_allocate() {
        let buffer = try_allocate(8, 1.5f64, "test buffer").unwrap();
        assert_eq!(buffer.len(), 8);
        assert!(buffer.iter().all(|v| *v == 1.5));

        let result = try_allocate(usize::MAX, Complex::new(0.0f64, 0.0), "huge buffer");
        match result {
            Err(EstimatorError::ResourceExhausted { message }) => {
                assert!(message.starts_with("huge buffer"))
            }
            other => panic!("Expected ResourceExhausted, got {:?}", other.map(|b| b.len())),
        }
    }
}
