//! # Sample Stream Driver
//!
//! Reads sample lines, runs each through an `Estimator` and writes one CSV row per
//! estimate. Optionally accumulates the estimates for Arrow IPC output.
//!
//! ## Key Components
//!
//! - `run_stream`: The line loop. Malformed lines are logged and skipped.
//! - `write_arrow_file`: Writes a record batch as an Arrow IPC file.
//! - `write_samples`: Writes synthetic sample lines, the input format of `run_stream`.

use arrow::error::ArrowError;
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use log::{debug, info, warn};
use qpmu_core::format::{
    csv_header_for_sample, csv_header_for_synchrophasor, parse_sample, sample_to_csv,
    synchrophasor_to_csv,
};
use qpmu_core::{
    Estimator, EstimatorState, SampleFieldOrdering, SampleGenerator, SynchrophasorAccumulator,
    WaveformConfig,
};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Errors that end a stream.
///
/// # Variants
///
/// * `Io`: Reading input or writing output failed.
/// * `Arrow`: Building or writing the Arrow output failed.
#[derive(Debug)]
pub enum StreamError {
    Io(io::Error),
    Arrow(ArrowError),
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StreamError::Io(e) => write!(f, "I/O error: {}", e),
            StreamError::Arrow(e) => write!(f, "Arrow error: {}", e),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Io(e) => Some(e),
            StreamError::Arrow(e) => Some(e),
        }
    }
}

impl From<io::Error> for StreamError {
    fn from(e: io::Error) -> Self {
        StreamError::Io(e)
    }
}

impl From<ArrowError> for StreamError {
    fn from(e: ArrowError) -> Self {
        StreamError::Arrow(e)
    }
}

/// Options of `run_stream`.
///
/// # Fields
///
/// * `ordering`: Field order of the sample lines.
/// * `skip_filling`: Drop the not-ready estimates produced while the window fills.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamOptions {
    pub ordering: SampleFieldOrdering,
    pub skip_filling: bool,
}

/// Counters of a finished stream.
///
/// # Fields
///
/// * `lines`: Lines read, including blank and comment lines.
/// * `samples`: Lines parsed into samples.
/// * `skipped`: Malformed lines.
/// * `estimates`: CSV rows written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub lines: u64,
    pub samples: u64,
    pub skipped: u64,
    pub estimates: u64,
}

/// Runs every sample line of `input` through `estimator`.
///
/// Blank lines, lines starting with `#` and sample CSV headers are ignored. Writes the
/// synchrophasor CSV header followed by one row per estimate to `output`, and pushes
/// each written estimate to `accumulator` if one is given.
///
/// # Returns
///
/// * `Ok(StreamStats)`: Counters once `input` is exhausted.
/// * `Err(StreamError::Io)`: If reading or writing fails.
pub fn run_stream<R, W>(
    estimator: &mut Estimator,
    input: R,
    output: &mut W,
    options: &StreamOptions,
    mut accumulator: Option<&mut SynchrophasorAccumulator>,
) -> Result<StreamStats, StreamError>
where
    R: BufRead,
    W: Write,
{
    let sample_header = csv_header_for_sample();
    let mut stats = StreamStats::default();
    writeln!(output, "{}", csv_header_for_synchrophasor())?;

    for line in input.lines() {
        let line = line?;
        stats.lines += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed == sample_header {
            continue;
        }

        let sample = match parse_sample(trimmed, &options.ordering) {
            Ok(sample) => sample,
            Err(e) => {
                warn!("Skipping line {}: {}", stats.lines, e);
                stats.skipped += 1;
                continue;
            }
        };
        stats.samples += 1;

        let estimate = estimator.estimate_measurements(&sample);
        if options.skip_filling && estimator.state() == EstimatorState::Filling {
            continue;
        }
        writeln!(output, "{}", synchrophasor_to_csv(&estimate))?;
        if let Some(accumulator) = accumulator.as_deref_mut() {
            accumulator.push(&estimate);
        }
        stats.estimates += 1;
    }

    output.flush()?;
    info!(
        "Stream finished: {} lines, {} samples, {} skipped, {} estimates",
        stats.lines, stats.samples, stats.skipped, stats.estimates
    );
    Ok(stats)
}

/// Writes `batch` to `path` as an Arrow IPC file.
pub fn write_arrow_file(path: &Path, batch: &RecordBatch) -> Result<(), StreamError> {
    let file = File::create(path)?;
    let mut writer = FileWriter::try_new(file, &batch.schema())?;
    writer.write(batch)?;
    writer.finish()?;
    debug!("Wrote {} rows to {}", batch.num_rows(), path.display());
    Ok(())
}

/// Writes the sample CSV header and `count` synthetic sample lines.
pub fn write_samples<W: Write>(
    config: WaveformConfig,
    count: usize,
    output: &mut W,
) -> io::Result<()> {
    writeln!(output, "{}", csv_header_for_sample())?;
    for sample in SampleGenerator::new(config).take(count) {
        writeln!(output, "{}", sample_to_csv(&sample))?;
    }
    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use qpmu_core::EstimationStrategy;

    #[test]
    fn test_ignored_lines() {
        let mut estimator = Estimator::new(4, EstimationStrategy::Fft, (1.0, 0.0), (1.0, 0.0)).unwrap();
        let input = format!(
            "# comment\n\n{}\n1,2048,2048,2048,2048,2048,2048,100,100\n",
            csv_header_for_sample()
        );
        let mut output = Vec::new();
        let stats = run_stream(
            &mut estimator,
            input.as_bytes(),
            &mut output,
            &StreamOptions::default(),
            None,
        )
        .unwrap();
        assert_eq!(
            stats,
            StreamStats {
                lines: 4,
                samples: 1,
                skipped: 0,
                estimates: 1
            }
        );
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("timestamp_us,"));
    }

    #[test]
    fn test_stream_error_display() {
        let error = StreamError::from(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        assert_eq!(error.to_string(), "I/O error: closed");
    }
}
