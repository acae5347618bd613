//! # SDFT Strategy
//!
//! Incremental estimation with a sliding DFT. Each channel keeps a ring of its last
//! `window_size` values and the fundamental-bin value `S_k` of that ring. Once the
//! bin is known every new sample updates
//!
//! ```text
//! S_k <- (S_k + x_new - x_old) * e^{j2πk/N}
//! ```
//!
//! in O(1). `S_k` is seeded by a direct DFT when the bin is first supplied and
//! recomputed directly every `N` updates to keep accumulated rounding error bounded.

use super::strategy::{try_allocate, PhasorStrategy};
use crate::calibration::CalibratedSample;
use crate::common::{EstimatorError, CHANNEL_COUNT};
use crate::numeric::PmuFloat;
use crate::phasors::FundamentalBin;
use crate::window::SampleWindow;
use log::debug;
use num_complex::Complex;
use num_traits::Zero;

/// Sliding-DFT state of one channel.
///
/// # Fields
///
/// * `ring`: The last `N` values; `head` indexes the oldest once full.
/// * `len`: Number of values received, saturating at `N`.
/// * `value`: `S_k` of the ring, `None` until seeded.
/// * `updates`: Recurrence steps since the last direct computation.
#[derive(Debug, Clone)]
pub struct SdftWorker<F> {
    ring: Vec<F>,
    head: usize,
    len: usize,
    value: Option<Complex<F>>,
    updates: usize,
}

impl<F: PmuFloat> SdftWorker<F> {
    pub fn new(window_size: usize) -> Result<Self, EstimatorError> {
        Ok(SdftWorker {
            ring: try_allocate(window_size, F::zero(), "SDFT ring")?,
            head: 0,
            len: 0,
            value: None,
            updates: 0,
        })
    }

    /// Copies the worker into a freshly allocated ring.
    pub fn try_clone(&self) -> Result<Self, EstimatorError> {
        let mut ring = try_allocate(self.ring.len(), F::zero(), "SDFT ring")?;
        ring.copy_from_slice(&self.ring);
        Ok(SdftWorker {
            ring,
            head: self.head,
            len: self.len,
            value: self.value,
            updates: self.updates,
        })
    }

    pub fn is_full(&self) -> bool {
        self.len == self.ring.len()
    }

    /// Adds a value, sliding `S_k` forward when it has been seeded.
    ///
    /// # Parameters
    ///
    /// * `x`: The newest channel value.
    /// * `bin`: The fundamental bin, `None` while it is not yet known.
    pub fn push(&mut self, x: F, bin: Option<&FundamentalBin>) {
        let n = self.ring.len();
        if n == 0 {
            return;
        }
        if self.len < n {
            self.ring[self.len] = x;
            self.len += 1;
            return;
        }

        let x_old = self.ring[self.head];
        self.ring[self.head] = x;
        self.head = (self.head + 1) % n;

        if let (Some(value), Some(bin)) = (self.value, bin) {
            self.updates += 1;
            if self.updates >= n {
                self.seed(bin);
            } else {
                self.value = Some((value + x - x_old) * bin.twiddle::<F>(1));
            }
        }
    }

    /// Computes `S_k` directly from the ring, oldest value first.
    pub fn seed(&mut self, bin: &FundamentalBin) -> Complex<F> {
        let n = self.ring.len();
        let mut sum = Complex::zero();
        for m in 0..n {
            let x = self.ring[(self.head + m) % n];
            sum = sum + bin.twiddle::<F>(m as u64).conj() * x;
        }
        self.value = Some(sum);
        self.updates = 0;
        sum
    }

    /// `S_k` of the current ring, seeding it first if necessary.
    pub fn value(&mut self, bin: &FundamentalBin) -> Complex<F> {
        match self.value {
            Some(value) => value,
            None => self.seed(bin),
        }
    }
}

/// Sliding-DFT estimation, one worker per channel.
#[derive(Debug, Clone)]
pub struct SdftStrategy<F> {
    workers: Vec<SdftWorker<F>>,
    bin: Option<FundamentalBin>,
}

impl<F: PmuFloat> SdftStrategy<F> {
    pub fn new(window_size: usize) -> Result<Self, EstimatorError> {
        let workers = (0..CHANNEL_COUNT)
            .map(|_| SdftWorker::new(window_size))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Allocated {} {}-value {} SDFT workers",
            CHANNEL_COUNT,
            window_size,
            F::NAME
        );
        Ok(SdftStrategy { workers, bin: None })
    }

    /// Clones the strategy, reporting allocation failure instead of aborting.
    pub fn try_clone(&self) -> Result<Self, EstimatorError> {
        let workers = self
            .workers
            .iter()
            .map(SdftWorker::try_clone)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SdftStrategy {
            workers,
            bin: self.bin,
        })
    }
}

impl<F: PmuFloat> PhasorStrategy<F> for SdftStrategy<F> {
    fn feed(&mut self, sample: &CalibratedSample<F>) {
        for (worker, x) in self.workers.iter_mut().zip(sample.channels.iter()) {
            worker.push(*x, self.bin.as_ref());
        }
    }

    fn estimate(
        &mut self,
        _window: &SampleWindow<F>,
        bin: &FundamentalBin,
    ) -> [Complex<F>; CHANNEL_COUNT] {
        if self.bin.as_ref() != Some(bin) {
            debug!("Seeding SDFT workers at bin {}", bin.index);
            self.bin = Some(*bin);
            for worker in self.workers.iter_mut() {
                worker.seed(bin);
            }
        }
        let mut out = [Complex::zero(); CHANNEL_COUNT];
        for (value, worker) in out.iter_mut().zip(self.workers.iter_mut()) {
            *value = worker.value(bin);
        }
        out
    }
}
