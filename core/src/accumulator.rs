//! # Synchrophasor Accumulator
//!
//! This module provides `SynchrophasorAccumulator`, which collects estimator output
//! column-wise and produces Arrow record batches for timeseries analysis or export.
//!
//! ## Key Components
//!
//! - `SynchrophasorAccumulator`: Per-column Arrow builders and the fixed output schema.
//! - `synchrophasor_schema`: The schema of every batch produced.
//!
//! ## Usage
//!
//! Push each `Synchrophasor` as it is estimated and call `finish` to drain the
//! accumulated rows into a `RecordBatch`. The schema is
//!
//! | Column | Type |
//! |---|---|
//! | `timestamp` | `Timestamp(Microsecond)` |
//! | `{SIG}_magnitude`, `{SIG}_angle` for `VA` … `IC` | `Float64` |
//! | `frequency`, `rocof` | `Float64` |
//!
//! Angles are in radians.

use crate::common::{Synchrophasor, CHANNEL_COUNT, SIGNALS};
use crate::numeric::PmuFloat;
use arrow::array::{ArrayRef, Float64Builder, TimestampMicrosecondBuilder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// Number of columns in a synchrophasor batch.
pub const SYNCHROPHASOR_COLUMN_COUNT: usize = 1 + 2 * CHANNEL_COUNT + 2;

/// Builds the schema of synchrophasor batches.
pub fn synchrophasor_schema() -> SchemaRef {
    let mut fields = Vec::with_capacity(SYNCHROPHASOR_COLUMN_COUNT);
    fields.push(Field::new(
        "timestamp",
        DataType::Timestamp(TimeUnit::Microsecond, None),
        false,
    ));
    for signal in SIGNALS.iter() {
        fields.push(Field::new(
            format!("{}_magnitude", signal.name),
            DataType::Float64,
            false,
        ));
        fields.push(Field::new(
            format!("{}_angle", signal.name),
            DataType::Float64,
            false,
        ));
    }
    fields.push(Field::new("frequency", DataType::Float64, false));
    fields.push(Field::new("rocof", DataType::Float64, false));
    Arc::new(Schema::new(fields))
}

/// Accumulates synchrophasors into Arrow columns.
///
/// # Fields
///
/// * `schema`: Output schema, see `synchrophasor_schema`.
/// * `timestamps`: Timestamp column builder.
/// * `phasors`: `(magnitude, angle)` column builders per channel.
/// * `frequency`: Frequency column builder.
/// * `rocof`: ROCOF column builder.
/// * `len`: Rows accumulated since the last `finish`.
#[derive(Debug)]
pub struct SynchrophasorAccumulator {
    schema: SchemaRef,
    timestamps: TimestampMicrosecondBuilder,
    phasors: Vec<(Float64Builder, Float64Builder)>,
    frequency: Float64Builder,
    rocof: Float64Builder,
    len: usize,
}

impl SynchrophasorAccumulator {
    /// Creates an empty accumulator with room for `capacity` rows before reallocating.
    pub fn new(capacity: usize) -> Self {
        SynchrophasorAccumulator {
            schema: synchrophasor_schema(),
            timestamps: TimestampMicrosecondBuilder::with_capacity(capacity),
            phasors: (0..CHANNEL_COUNT)
                .map(|_| {
                    (
                        Float64Builder::with_capacity(capacity),
                        Float64Builder::with_capacity(capacity),
                    )
                })
                .collect(),
            frequency: Float64Builder::with_capacity(capacity),
            rocof: Float64Builder::with_capacity(capacity),
            len: 0,
        }
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends one estimate as a row.
    pub fn push(&mut self, synchrophasor: &Synchrophasor) {
        let timestamp = i64::try_from(synchrophasor.timestamp_us).unwrap_or(i64::MAX);
        self.timestamps.append_value(timestamp);
        for (ch, (magnitudes, angles)) in self.phasors.iter_mut().enumerate() {
            magnitudes.append_value(synchrophasor.magnitudes[ch].to_f64_lossy());
            angles.append_value(synchrophasor.phase_angles[ch].to_f64_lossy());
        }
        self.frequency
            .append_value(synchrophasor.frequency.to_f64_lossy());
        self.rocof.append_value(synchrophasor.rocof.to_f64_lossy());
        self.len += 1;
    }

    /// Drains the accumulated rows into a record batch.
    ///
    /// # Returns
    ///
    /// * `Ok(RecordBatch)`: All rows pushed since the last call; possibly empty.
    /// * `Err(ArrowError)`: If the columns do not match the schema.
    pub fn finish(&mut self) -> Result<RecordBatch, ArrowError> {
        let mut columns: Vec<ArrayRef> = Vec::with_capacity(SYNCHROPHASOR_COLUMN_COUNT);
        columns.push(Arc::new(self.timestamps.finish()));
        for (magnitudes, angles) in self.phasors.iter_mut() {
            columns.push(Arc::new(magnitudes.finish()));
            columns.push(Arc::new(angles.finish()));
        }
        columns.push(Arc::new(self.frequency.finish()));
        columns.push(Arc::new(self.rocof.finish()));
        self.len = 0;
        RecordBatch::try_new(self.schema.clone(), columns)
    }
}

impl Default for SynchrophasorAccumulator {
    fn default() -> Self {
        SynchrophasorAccumulator::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::Float;
    use arrow::array::{Array, Float64Array, TimestampMicrosecondArray};

    fn estimate(i: u64) -> Synchrophasor {
        let mut s = Synchrophasor::not_ready(i * 1_000, 50.0);
        s.magnitudes[0] = 100.0 + i as Float;
        s.phase_angles[3] = -0.5;
        s.rocof = 0.25;
        s
    }

    #[test]
    fn test_schema_layout() {
        let schema = synchrophasor_schema();
        assert_eq!(schema.fields().len(), SYNCHROPHASOR_COLUMN_COUNT);
        assert_eq!(schema.fields().len(), 15);
        assert_eq!(schema.field(1).name(), "VA_magnitude");
        assert_eq!(schema.field(2).name(), "VA_angle");
        assert_eq!(schema.field(12).name(), "IC_angle");
        assert_eq!(schema.field(14).name(), "rocof");
    }

    #[test]
    fn test_batch_has_one_row_per_push() {
        let mut accumulator = SynchrophasorAccumulator::new(4);
        for i in 0..10 {
            accumulator.push(&estimate(i));
        }
        assert_eq!(accumulator.len(), 10);

        let batch = accumulator.finish().unwrap();
        assert_eq!(batch.num_rows(), 10);
        assert_eq!(batch.num_columns(), 15);
        assert!(accumulator.is_empty());

        let timestamps = batch
            .column(0)
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .unwrap();
        assert_eq!(timestamps.value(9), 9_000);

        let va = batch
            .column(1)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(va.value(3), 103.0);

        let ia_angle = batch
            .column_by_name("IA_angle")
            .unwrap()
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(ia_angle.value(0), -0.5);
        assert_eq!(ia_angle.null_count(), 0);
    }

    #[test]
    fn test_finish_drains() {
        let mut accumulator = SynchrophasorAccumulator::default();
        accumulator.push(&estimate(0));
        assert_eq!(accumulator.finish().unwrap().num_rows(), 1);
        assert_eq!(accumulator.finish().unwrap().num_rows(), 0);
        accumulator.push(&estimate(1));
        assert_eq!(accumulator.finish().unwrap().num_rows(), 1);
    }
}
