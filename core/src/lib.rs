//! # Synchrophasor Estimation Core
//!
//! This crate turns a stream of raw analog-to-digital samples of three-phase voltage and
//! current into synchrophasor estimates: per-channel magnitude and phase angle plus system
//! frequency and its rate of change (ROCOF), one estimate per incoming sample. It is a
//! pure, synchronous transform; it performs no hardware access, persistence or network I/O.
//!
//! ## Submodules
//!
//! - `numeric`: The `PmuFloat` capability trait and the build-selected `Float` type.
//! - `common`: Shared records (`Sample`, `Synchrophasor`, `Signal`) and error types.
//! - `units`: Signal types, phases and the nominal system frequency.
//! - `calibration`: Affine conversion of raw ADC counts into volts and amperes.
//! - `window`: The fixed-capacity FIFO of calibrated samples.
//! - `phasors`: Phasor representations, fundamental-bin selection and normalization.
//! - `estimator`: The `Estimator` facade and its strategies.
//!   - `strategy`: The `PhasorStrategy` contract and `Strategy` dispatch.
//!   - `fft`: Batch FFT estimation with per-channel transform resources.
//!   - `sdft`: Incremental sliding-DFT estimation.
//!   - `tracker`: Frequency and ROCOF from phase evolution.
//! - `format`: Sample-line parsing and string/CSV rendering.
//! - `random`: Synthetic waveform and random sample generation.
//! - `accumulator`: Columnar accumulation of estimates into Arrow record batches.
//!
//! ## Usage
//!
//! ```
//! use qpmu_core::{EstimationStrategy, Estimator, SampleGenerator, WaveformConfig};
//!
//! let mut estimator = Estimator::new(64, EstimationStrategy::Sdft, (1.0, -2048.0), (1.0, -2048.0))?;
//! for sample in SampleGenerator::new(WaveformConfig::default()).take(256) {
//!     let estimate = estimator.estimate_measurements(&sample);
//!     println!("{}", estimate);
//! }
//! # Ok::<(), qpmu_core::EstimatorError>(())
//! ```

pub mod accumulator;
pub mod calibration;
pub mod common;
pub mod estimator;
pub mod format;
pub mod numeric;
pub mod phasors;
pub mod random;
pub mod units;
pub mod window;

pub use accumulator::SynchrophasorAccumulator;
pub use calibration::{Calibration, CalibrationParams};
pub use common::{
    EstimatorError, ParseError, Sample, SampleField, SampleFieldOrdering, Signal, Synchrophasor,
    CHANNEL_COUNT, SIGNALS,
};
pub use estimator::{
    EstimationStrategy, Estimator, EstimatorConfig, EstimatorState, FrequencySource,
};
pub use numeric::{Float, PmuFloat};
pub use random::{SampleGenerator, WaveformConfig};
pub use units::{NominalFrequency, SignalPhase, SignalType};
