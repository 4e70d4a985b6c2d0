//! CSV ingestion into raw records

use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use std::time::Instant;

use polars::prelude::*;
use serde_json::{json, Value};
use tracing::debug;

use super::RawRecord;
use crate::error::{LoanRiskError, Result};

/// Reads delimited text into uncoerced records.
///
/// Every column is read as text, so a late non-numeric or decimal cell
/// never fails the whole file. Typing is left to `Dataset::from_records`.
#[derive(Debug, Clone, Default)]
pub struct DataLoader;

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self
    }

    fn read_options() -> CsvReadOptions {
        // Zero inference rows makes polars type every column as String
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
    }

    /// Load a CSV file from disk
    pub fn load_csv<P: AsRef<Path>>(&self, path: P) -> Result<Vec<RawRecord>> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| LoanRiskError::DataError(format!("{}: {}", path.display(), e)))?;

        let df = Self::read_options()
            .into_reader_with_file_handle(file)
            .finish()?;

        Ok(Self::records_from_frame(&df))
    }

    /// Load CSV from an in-memory buffer (e.g. an upload)
    pub fn load_csv_bytes(&self, bytes: &[u8]) -> Result<Vec<RawRecord>> {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Vec::new());
        }

        let df = Self::read_options()
            .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
            .finish()?;

        Ok(Self::records_from_frame(&df))
    }

    fn records_from_frame(df: &DataFrame) -> Vec<RawRecord> {
        let start = Instant::now();
        let columns = df.get_columns();
        let names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

        let records: Vec<RawRecord> = (0..df.height())
            .map(|i| {
                columns
                    .iter()
                    .zip(names.iter())
                    .map(|(col, name)| {
                        let value = col.get(i).map(any_value_to_json).unwrap_or(Value::Null);
                        (name.clone(), value)
                    })
                    .collect()
            })
            .collect();

        debug!(
            rows = records.len(),
            columns = names.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Converted frame to records"
        );
        records
    }
}

fn any_value_to_json(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(v) => Value::Bool(v),
        AnyValue::String(v) => Value::String(v.trim().to_string()),
        AnyValue::Float64(v) => json!(v),
        AnyValue::Float32(v) => json!(v),
        AnyValue::Int64(v) => json!(v),
        AnyValue::Int32(v) => json!(v),
        other => match other.extract::<f64>() {
            Some(v) => json!(v),
            None => Value::String(other.to_string()),
        },
    }
}
