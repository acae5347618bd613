//! # FFT Strategy
//!
//! Batch estimation: on every estimate each channel's window is copied into that
//! channel's complex buffer and transformed in place with a forward DFT of length
//! `window_size`; the fundamental bin is read from the result.
//!
//! ## Key Components
//!
//! - `FftChannel`: Owning handle of one channel's transform plan, in-place buffer and
//!   scratch space. Allocated once, released on drop, re-planned on clone.
//! - `FftStrategy`: Six `FftChannel`s, one per measured channel.

use super::strategy::{try_allocate, PhasorStrategy};
use crate::calibration::CalibratedSample;
use crate::common::{EstimatorError, CHANNEL_COUNT};
use crate::numeric::PmuFloat;
use crate::phasors::FundamentalBin;
use crate::window::SampleWindow;
use log::debug;
use num_complex::Complex;
use num_traits::Zero;
use rustfft::{Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

/// Transform resources of one channel.
///
/// # Fields
///
/// * `plan`: Forward transform of length `window_size`.
/// * `buffer`: Input/output buffer of `window_size` values, transformed in place.
/// * `scratch`: Scratch space required by the plan.
pub struct FftChannel<F: PmuFloat> {
    plan: Arc<dyn Fft<F>>,
    buffer: Vec<Complex<F>>,
    scratch: Vec<Complex<F>>,
}

impl<F: PmuFloat> FftChannel<F> {
    /// Plans a forward transform of `window_size` points and allocates its buffers.
    ///
    /// # Returns
    ///
    /// * `Ok(FftChannel)`: The channel with all resources in place.
    /// * `Err(EstimatorError::ResourceExhausted)`: If a buffer could not be allocated.
    pub fn new(planner: &mut FftPlanner<F>, window_size: usize) -> Result<Self, EstimatorError> {
        let buffer = try_allocate(window_size, Complex::zero(), "FFT buffer")?;
        let plan = planner.plan_fft_forward(window_size);
        let scratch = try_allocate(
            plan.get_inplace_scratch_len(),
            Complex::zero(),
            "FFT scratch",
        )?;
        Ok(FftChannel {
            plan,
            buffer,
            scratch,
        })
    }

    /// Re-plans the transform and allocates fresh buffers like `new`.
    pub fn try_clone(&self) -> Result<Self, EstimatorError> {
        FftChannel::new(&mut FftPlanner::new(), self.len())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Transforms `values` (oldest first) and returns bin `index` of the result.
    ///
    /// `values` must yield exactly `len()` items; missing values are left at zero.
    pub fn transform<I>(&mut self, values: I, index: usize) -> Complex<F>
    where
        I: IntoIterator<Item = F>,
    {
        self.buffer.fill(Complex::zero());
        for (slot, value) in self.buffer.iter_mut().zip(values) {
            *slot = Complex::new(value, F::zero());
        }
        self.plan.process_with_scratch(&mut self.buffer, &mut self.scratch);
        self.buffer[index]
    }
}

impl<F: PmuFloat> Clone for FftChannel<F> {
    /// Re-plans the transform and allocates fresh buffers, so the clone shares no
    /// mutable state with the original.
    ///
    /// Allocation failure aborts, as for any `Vec` clone; `FftChannel::try_clone`
    /// reports it instead.
    fn clone(&self) -> Self {
        let mut planner = FftPlanner::new();
        let plan = planner.plan_fft_forward(self.buffer.len());
        let scratch = vec![Complex::zero(); plan.get_inplace_scratch_len()];
        FftChannel {
            plan,
            buffer: vec![Complex::zero(); self.buffer.len()],
            scratch,
        }
    }
}

impl<F: PmuFloat> fmt::Debug for FftChannel<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FftChannel")
            .field("len", &self.buffer.len())
            .field("scratch_len", &self.scratch.len())
            .finish()
    }
}

/// Batch FFT estimation over the full window.
#[derive(Debug, Clone)]
pub struct FftStrategy<F: PmuFloat> {
    channels: Vec<FftChannel<F>>,
}

impl<F: PmuFloat> FftStrategy<F> {
    /// Allocates one transform channel per measured channel.
    pub fn new(window_size: usize) -> Result<Self, EstimatorError> {
        let mut planner = FftPlanner::new();
        let channels = (0..CHANNEL_COUNT)
            .map(|_| FftChannel::new(&mut planner, window_size))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Planned {} {}-point {} FFT channels",
            CHANNEL_COUNT,
            window_size,
            F::NAME
        );
        Ok(FftStrategy { channels })
    }

    /// Clones the strategy, reporting allocation failure instead of aborting.
    pub fn try_clone(&self) -> Result<Self, EstimatorError> {
        let mut planner = FftPlanner::new();
        let channels = self
            .channels
            .iter()
            .map(|channel| FftChannel::new(&mut planner, channel.len()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FftStrategy { channels })
    }
}

impl<F: PmuFloat> PhasorStrategy<F> for FftStrategy<F> {
    fn feed(&mut self, _sample: &CalibratedSample<F>) {}

    fn estimate(
        &mut self,
        window: &SampleWindow<F>,
        bin: &FundamentalBin,
    ) -> [Complex<F>; CHANNEL_COUNT] {
        let mut out = [Complex::zero(); CHANNEL_COUNT];
        for (ch, (value, channel)) in out.iter_mut().zip(self.channels.iter_mut()).enumerate() {
            *value = channel.transform(window.channel(ch), bin.index);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn window_of(values: &[f64]) -> SampleWindow<f64> {
        let mut window = SampleWindow::new(values.len()).unwrap();
        for (i, v) in values.iter().enumerate() {
            window.push(CalibratedSample {
                seq_no: i as u64,
                channels: [*v; CHANNEL_COUNT],
                timestamp_us: i as u64 * 100,
                time_delta_us: 100,
            });
        }
        window
    }

    #[test]
    fn test_transform_matches_direct_dft() {
        let n = 12;
        let values: Vec<f64> = (0..n).map(|i| (i as f64 * 0.7).sin() + 0.3).collect();
        let mut planner = FftPlanner::new();
        let mut channel = FftChannel::new(&mut planner, n).unwrap();
        for k in 0..=n / 2 {
            let direct: Complex<f64> = values
                .iter()
                .enumerate()
                .map(|(m, x)| Complex::from_polar(*x, -2.0 * PI * (k * m) as f64 / n as f64))
                .sum();
            let fft = channel.transform(values.iter().copied(), k);
            assert!((fft - direct).norm() < 1e-9, "bin {} differs", k);
        }
    }

    #[test]
    fn test_estimate_reads_fundamental_bin() {
        let n = 32;
        let amplitude = 5.0;
        let phase = 0.3;
        let values: Vec<f64> = (0..n)
            .map(|m| amplitude * (2.0 * PI * 2.0 * m as f64 / n as f64 + phase).cos())
            .collect();
        let window = window_of(&values);
        let bin = FundamentalBin {
            index: 2,
            window_size: n,
            frequency_hz: 100.0,
        };
        let mut strategy = FftStrategy::new(n).unwrap();
        let raw = strategy.estimate(&window, &bin);
        for value in raw {
            let polar = bin.to_polar(value, 0);
            assert!((polar.magnitude - amplitude).abs() < 1e-9);
            assert!((polar.angle - phase).abs() < 1e-9);
        }
    }

    #[test]
    fn test_clone_owns_fresh_buffers() {
        let n = 16;
        let values: Vec<f64> = (0..n).map(|m| m as f64).collect();
        let window = window_of(&values);
        let bin = FundamentalBin {
            index: 1,
            window_size: n,
            frequency_hz: 50.0,
        };
        let mut original = FftStrategy::new(n).unwrap();
        let first = original.estimate(&window, &bin);

        let mut copy = original.clone();
        drop(original);
        let second = copy.estimate(&window, &bin);
        for (a, b) in first.iter().zip(second.iter()) {
            assert!((a - b).norm() < 1e-12);
        }
        assert_ne!(
            copy.channels[0].buffer.as_ptr(),
            copy.channels[1].buffer.as_ptr()
        );
    }

    #[test]
    fn test_try_clone_matches_clone() {
        let n = 24;
        let values: Vec<f64> = (0..n).map(|m| (m as f64 * 0.4).cos()).collect();
        let window = window_of(&values);
        let bin = FundamentalBin {
            index: 2,
            window_size: n,
            frequency_hz: 50.0,
        };
        let mut original = FftStrategy::new(n).unwrap();
        let mut copy = original.try_clone().unwrap();
        assert_eq!(copy.channels.len(), CHANNEL_COUNT);
        assert!(copy.channels.iter().all(|c| c.len() == n));

        let a = original.estimate(&window, &bin);
        let b = copy.estimate(&window, &bin);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).norm() < 1e-12);
        }
        assert_ne!(
            original.channels[0].buffer.as_ptr(),
            copy.channels[0].buffer.as_ptr()
        );

        let mut planner = FftPlanner::<f64>::new();
        let channel = FftChannel::new(&mut planner, 5).unwrap();
        assert_eq!(channel.try_clone().unwrap().len(), 5);
    }

    #[test]
    fn test_single_point_window() {
        let window = window_of(&[7.0]);
        let bin = FundamentalBin::select(50.0, 1, None);
        let mut strategy = FftStrategy::new(1).unwrap();
        let raw = strategy.estimate(&window, &bin);
        assert!((bin.to_polar(raw[0], 0).magnitude - 7.0).abs() < 1e-12);
    }
}
