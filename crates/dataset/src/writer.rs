//! Writes SampleRecords to Parquet files using Arrow.

use crate::types::SampleRecord;
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use std::path::PathBuf;
use std::sync::Arc;

/// Arrow schema for sample Parquet files (2 columns).
///
/// The inner list item is declared nullable because that is what
/// `ListBuilder` produces; the writer never actually emits null readings.
pub fn sample_schema() -> Schema {
    Schema::new(vec![
        Field::new(
            "values",
            DataType::List(Arc::new(Field::new("item", DataType::Float32, true))),
            false,
        ),
        Field::new("is_normal", DataType::Boolean, false),
    ])
}

/// Buffers sample records and writes them to a Parquet file.
pub struct DatasetWriter {
    records: Vec<SampleRecord>,
    output_path: PathBuf,
}

impl DatasetWriter {
    /// Create a new writer that will write to the given path.
    pub fn new(output_path: PathBuf) -> Self {
        Self {
            records: Vec::new(),
            output_path,
        }
    }

    /// Buffer a single sample record.
    pub fn record(&mut self, record: SampleRecord) {
        self.records.push(record);
    }

    /// Buffer multiple sample records.
    pub fn record_all(&mut self, records: Vec<SampleRecord>) {
        self.records.extend(records);
    }

    /// Number of buffered records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write all buffered records to the Parquet file and return the output path.
    pub fn finish(self) -> anyhow::Result<PathBuf> {
        let schema = Arc::new(sample_schema());

        let batch = if self.records.is_empty() {
            RecordBatch::new_empty(schema.clone())
        } else {
            build_record_batch(&self.records)?
        };

        let file = std::fs::File::create(&self.output_path)?;
        let mut writer = ArrowWriter::try_new(file, schema, None)?;
        writer.write(&batch)?;
        writer.close()?;

        tracing::info!(
            records = self.records.len(),
            path = %self.output_path.display(),
            "Wrote sample Parquet file"
        );

        Ok(self.output_path)
    }
}

/// Build an Arrow RecordBatch from sample records.
fn build_record_batch(records: &[SampleRecord]) -> anyhow::Result<RecordBatch> {
    let schema = Arc::new(sample_schema());

    let mut values_builder = ListBuilder::new(Float32Builder::new());
    for r in records {
        values_builder.values().append_slice(&r.values);
        values_builder.append(true);
    }
    let values = values_builder.finish();

    let labels: BooleanArray = records.iter().map(|r| Some(r.label.is_normal())).collect();

    let columns: Vec<Arc<dyn arrow::array::Array>> = vec![Arc::new(values), Arc::new(labels)];

    Ok(RecordBatch::try_new(schema, columns)?)
}
