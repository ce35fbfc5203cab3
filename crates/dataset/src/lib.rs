//! Parquet I/O and preprocessing for labeled sample data.
//!
//! Provides types for fixed-width numeric samples with normal/anomalous
//! labels, reading/writing them as Parquet files, and min-max normalization
//! fitted on training data.

pub mod normalizer;
pub mod reader;
pub mod types;
pub mod writer;

pub use normalizer::MinMaxNormalizer;
pub use reader::DatasetReader;
pub use types::{DatasetError, DatasetSplit, DatasetSummary, SampleLabel, SampleRecord};
pub use writer::DatasetWriter;
