//! # Sample Window
//!
//! A fixed-capacity FIFO of calibrated samples. It is the unit of history both
//! estimation strategies operate over: once it reaches capacity every push evicts
//! the oldest sample. Samples are kept strictly in insertion order; gaps in the
//! sequence are neither detected nor repaired.

use crate::calibration::CalibratedSample;
use crate::common::EstimatorError;
use std::collections::vec_deque::{self, VecDeque};

#[derive(Debug, Clone)]
pub struct SampleWindow<F> {
    capacity: usize,
    samples: VecDeque<CalibratedSample<F>>,
}

impl<F: Copy> SampleWindow<F> {
    /// Creates an empty window holding at most `capacity` samples, reserving its
    /// storage up front.
    ///
    /// `capacity` is validated by the estimator; a zero capacity window would
    /// evict every sample immediately.
    pub fn new(capacity: usize) -> Result<Self, EstimatorError> {
        let mut samples = VecDeque::new();
        samples
            .try_reserve_exact(capacity)
            .map_err(|e| EstimatorError::ResourceExhausted {
                message: format!("Sample window of {} samples: {}", capacity, e),
            })?;
        Ok(SampleWindow { capacity, samples })
    }

    /// Appends a sample, returning the evicted oldest sample when the window was
    /// already at capacity.
    pub fn push(&mut self, sample: CalibratedSample<F>) -> Option<CalibratedSample<F>> {
        let evicted = if self.samples.len() >= self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Read-only view of the contents, oldest first.
    pub fn snapshot(&self) -> vec_deque::Iter<'_, CalibratedSample<F>> {
        self.samples.iter()
    }

    /// Values of one channel, oldest first.
    pub fn channel(&self, index: usize) -> impl Iterator<Item = F> + '_ {
        self.samples.iter().map(move |s| s.channels[index])
    }

    pub fn oldest(&self) -> Option<&CalibratedSample<F>> {
        self.samples.front()
    }

    pub fn newest(&self) -> Option<&CalibratedSample<F>> {
        self.samples.back()
    }

    /// Copies the window into freshly reserved storage.
    ///
    /// # Returns
    ///
    /// * `Ok(SampleWindow)`: An independent copy with the same capacity and contents.
    /// * `Err(EstimatorError::ResourceExhausted)`: If the storage could not be reserved.
    pub fn try_clone(&self) -> Result<Self, EstimatorError> {
        let mut copy = SampleWindow::new(self.capacity())?;
        copy.samples.extend(self.samples.iter().copied());
        Ok(copy)
    }

    /// Mean interval between consecutive samples in microseconds, derived from the
    /// first and last timestamps. Falls back to the newest sample's own delta when
    /// the window holds a single sample or its timestamps do not advance.
    pub fn mean_interval_us(&self) -> Option<f64> {
        let (oldest, newest) = (self.oldest()?, self.newest()?);
        let span = newest.timestamp_us.saturating_sub(oldest.timestamp_us);
        if self.samples.len() > 1 && span > 0 {
            Some(span as f64 / (self.samples.len() - 1) as f64)
        } else if newest.time_delta_us > 0 {
            Some(newest.time_delta_us as f64)
        } else {
            None
        }
    }
}
