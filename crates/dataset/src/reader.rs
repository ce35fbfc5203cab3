//! Reads SampleRecords from Parquet files.

use crate::types::{DatasetError, DatasetSummary, SampleLabel, SampleRecord};
use arrow::array::*;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::path::{Path, PathBuf};

/// Static methods for reading sample data from Parquet files.
pub struct DatasetReader;

impl DatasetReader {
    /// Read all sample records from a Parquet file.
    ///
    /// Validates that every record has the same width; a file with mixed
    /// widths fails with [`DatasetError::ShapeMismatch`].
    pub fn read_all(path: &Path) -> anyhow::Result<Vec<SampleRecord>> {
        let file = std::fs::File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut records = Vec::new();
        for batch_result in reader {
            let batch = batch_result?;
            let mut batch_records = extract_records_from_batch(&batch)?;
            records.append(&mut batch_records);
        }

        validate_widths(&records)?;

        tracing::debug!(
            count = records.len(),
            path = %path.display(),
            "Read sample records"
        );

        Ok(records)
    }

    /// Read sample records from multiple Parquet files.
    ///
    /// Widths must agree across all files, not just within each one.
    pub fn read_multiple(paths: &[PathBuf]) -> anyhow::Result<Vec<SampleRecord>> {
        let mut all_records = Vec::new();
        for path in paths {
            let mut records = Self::read_all(path)?;
            all_records.append(&mut records);
        }
        validate_widths(&all_records)?;
        Ok(all_records)
    }

    /// Compute summary statistics from a sample Parquet file.
    pub fn read_summary(path: &Path) -> anyhow::Result<DatasetSummary> {
        let records = Self::read_all(path)?;
        Ok(DatasetSummary::from_records(&records))
    }
}

/// Check that all records share one width.
fn validate_widths(records: &[SampleRecord]) -> Result<(), DatasetError> {
    let Some(first) = records.first() else {
        return Ok(());
    };
    let expected = first.width();
    for (index, record) in records.iter().enumerate() {
        if record.width() != expected {
            return Err(DatasetError::ShapeMismatch {
                index,
                expected,
                actual: record.width(),
            });
        }
    }
    Ok(())
}

/// Extract sample records from a single Arrow RecordBatch.
fn extract_records_from_batch(batch: &RecordBatch) -> anyhow::Result<Vec<SampleRecord>> {
    let values = batch
        .column(0)
        .as_any()
        .downcast_ref::<ListArray>()
        .ok_or_else(|| anyhow::anyhow!("Column 0 (values) is not ListArray"))?;

    let labels = batch
        .column(1)
        .as_any()
        .downcast_ref::<BooleanArray>()
        .ok_or_else(|| anyhow::anyhow!("Column 1 (is_normal) is not BooleanArray"))?;

    let mut records = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let row = values.value(i);
        let floats = row
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| anyhow::anyhow!("values items are not Float32Array"))?;

        records.push(SampleRecord {
            values: floats.values().to_vec(),
            label: SampleLabel::from_bool(labels.value(i)),
        });
    }

    Ok(records)
}
