//! # Text Formats
//!
//! String and CSV rendering of `Sample` and `Synchrophasor`, and parsing of sample lines
//! produced by the ADC driver.
//!
//! ## Key Components
//!
//! - `parse_sample`: Parses one sample line under a `SampleFieldOrdering`.
//! - `csv_header_for_sample`, `sample_to_csv`: CSV form of a sample.
//! - `csv_header_for_synchrophasor`, `synchrophasor_to_csv`: CSV form of an estimate,
//!   angles in radians.
//! - `phasor_to_string`, `phasor_polar_to_string`: Human-readable phasors.
//! - `Display` for `Sample` and `Synchrophasor`: Human-readable records, angles in degrees.

use crate::common::{
    ParseError, Sample, SampleField, SampleFieldOrdering, Synchrophasor, CHANNEL_COUNT,
    SAMPLE_FIELD_COUNT, SIGNALS,
};
use crate::numeric::Float;
use num_complex::Complex;
use std::fmt;

/// Parses a sample line of unsigned integers separated by commas and/or whitespace.
///
/// # Parameters
///
/// * `line`: The text line, e.g. `"12,2048,1000,3096,2048,2100,1996,1313,313"`.
/// * `ordering`: Position of each field in the line.
///
/// # Returns
///
/// * `Ok(Sample)`: The parsed sample.
/// * `Err(ParseError::InvalidLength)`: If the line does not hold exactly nine fields.
/// * `Err(ParseError::InvalidField)`: If a field is not an unsigned integer.
pub fn parse_sample(line: &str, ordering: &SampleFieldOrdering) -> Result<Sample, ParseError> {
    let tokens: Vec<&str> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.len() != SAMPLE_FIELD_COUNT {
        return Err(ParseError::InvalidLength {
            message: format!(
                "Sample line needs {} fields, got {}",
                SAMPLE_FIELD_COUNT,
                tokens.len()
            ),
        });
    }

    let mut sample = Sample::default();
    for (token, field) in tokens.iter().zip(ordering.fields().iter()) {
        let value = token.parse::<u64>().map_err(|e| ParseError::InvalidField {
            message: format!("{} {:?}: {}", field.name(), token, e),
        })?;
        match field {
            SampleField::SequenceNumber => sample.seq_no = value,
            SampleField::Timestamp => sample.timestamp_us = value,
            SampleField::TimeDelta => sample.time_delta_us = value,
            channel => {
                if let Some(index) = channel.channel() {
                    sample.channels[index] = value;
                }
            }
        }
    }
    Ok(sample)
}

/// CSV header matching `sample_to_csv`.
pub fn csv_header_for_sample() -> String {
    let mut columns = vec!["seq_no".to_string()];
    columns.extend(SIGNALS.iter().map(|s| s.name.to_string()));
    columns.push("timestamp_us".to_string());
    columns.push("time_delta_us".to_string());
    columns.join(",")
}

/// Renders a sample as a CSV row in the default field order.
pub fn sample_to_csv(sample: &Sample) -> String {
    let channels: Vec<String> = sample.channels.iter().map(u64::to_string).collect();
    format!(
        "{},{},{},{}",
        sample.seq_no,
        channels.join(","),
        sample.timestamp_us,
        sample.time_delta_us
    )
}

/// CSV header matching `synchrophasor_to_csv`.
pub fn csv_header_for_synchrophasor() -> String {
    let mut columns = vec!["timestamp_us".to_string()];
    columns.extend(SIGNALS.iter().map(|s| format!("{}_magnitude", s.name)));
    columns.extend(SIGNALS.iter().map(|s| format!("{}_angle", s.name)));
    columns.push("frequency".to_string());
    columns.push("rocof".to_string());
    columns.join(",")
}

/// Renders an estimate as a CSV row; angles in radians.
pub fn synchrophasor_to_csv(synchrophasor: &Synchrophasor) -> String {
    let mut fields = Vec::with_capacity(2 * CHANNEL_COUNT + 3);
    fields.push(synchrophasor.timestamp_us.to_string());
    fields.extend(synchrophasor.magnitudes.iter().map(Float::to_string));
    fields.extend(synchrophasor.phase_angles.iter().map(Float::to_string));
    fields.push(synchrophasor.frequency.to_string());
    fields.push(synchrophasor.rocof.to_string());
    fields.join(",")
}

/// Formats a phasor in rectangular form, e.g. `"70.711+70.711j"`.
pub fn phasor_to_string(phasor: Complex<Float>) -> String {
    format!("{:.3}{:+.3}j", phasor.re, phasor.im)
}

/// Formats a phasor in polar form with the angle in degrees, e.g. `"100.000∠45.00°"`.
pub fn phasor_polar_to_string(phasor: Complex<Float>) -> String {
    let (magnitude, angle) = phasor.to_polar();
    format!("{:.3}∠{:.2}°", magnitude, angle.to_degrees())
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Sample #{} @ {} µs (+{} µs):",
            self.seq_no, self.timestamp_us, self.time_delta_us
        )?;
        for signal in SIGNALS.iter() {
            write!(f, " {}={}", signal.name, self.channels[signal.index])?;
        }
        Ok(())
    }
}

impl fmt::Display for Synchrophasor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Synchrophasor @ {} µs:", self.timestamp_us)?;
        for signal in SIGNALS.iter() {
            write!(
                f,
                " {}={}",
                signal.name,
                phasor_polar_to_string(self.phasor(signal.index))
            )?;
        }
        write!(
            f,
            " f={:.3} Hz ROCOF={:.3} Hz/s",
            self.frequency, self.rocof
        )
    }
}
