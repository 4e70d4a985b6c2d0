//! Tabular applicant data
//!
//! Records arrive uncoerced (`RawRecord`) from the CSV loader, HTTP bodies or
//! the CLI. `Dataset::from_records` validates column presence and coerces
//! every required field to a number before any numeric work happens.

pub mod loader;

pub use loader::DataLoader;

use std::collections::HashMap;

use ndarray::{Array1, Array2};
use serde_json::Value;

use crate::config::PipelineConfig;
use crate::error::{LoanRiskError, Result};

/// One uncoerced record keyed by column name
pub type RawRecord = serde_json::Map<String, Value>;

/// Coerce a raw cell to a number. Anything unparseable becomes 0.
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Look up a column in a raw record and coerce it; absent columns become 0
pub fn coerce_field(record: &RawRecord, column: &str) -> f64 {
    record.get(column).map(coerce_number).unwrap_or(0.0)
}

/// A coerced row: feature values by name plus the binary label
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: HashMap<String, f64>,
    label: u8,
}

impl Row {
    /// Build a row from a raw record, coercing every listed column
    pub fn from_record(record: &RawRecord, features: &[String], target: &str) -> Self {
        let values = features
            .iter()
            .map(|name| (name.clone(), coerce_field(record, name)))
            .collect();
        let label = if coerce_field(record, target) != 0.0 { 1 } else { 0 };
        Self { values, label }
    }

    /// Build a row directly from numeric values
    pub fn new(values: HashMap<String, f64>, label: u8) -> Self {
        Self {
            values,
            label: if label != 0 { 1 } else { 0 },
        }
    }

    /// Value of a feature, 0 when absent
    pub fn get(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    /// Binary label (0 or 1)
    pub fn label(&self) -> u8 {
        self.label
    }

    /// Feature values in the given order
    pub fn feature_vector(&self, features: &[String]) -> Vec<f64> {
        features.iter().map(|name| self.get(name)).collect()
    }
}

/// Validated, coerced, non-empty sequence of rows
#[derive(Debug, Clone)]
pub struct Dataset {
    features: Vec<String>,
    target: String,
    rows: Vec<Row>,
}

impl Dataset {
    /// Validate and coerce raw records.
    ///
    /// Fails if there are no records or if the first record lacks any
    /// required feature or the target column.
    pub fn from_records(records: &[RawRecord], config: &PipelineConfig) -> Result<Self> {
        let first = records
            .first()
            .ok_or_else(|| LoanRiskError::ValidationError("dataset is empty".to_string()))?;

        let missing: Vec<&str> = config
            .required_columns()
            .into_iter()
            .filter(|column| !first.contains_key(*column))
            .collect();
        if !missing.is_empty() {
            return Err(LoanRiskError::ValidationError(format!(
                "missing columns: {}",
                missing.join(", ")
            )));
        }

        // Summary columns ride along so the dataset summary can be computed
        // from coerced rows even when they are not model features.
        let mut columns = config.features.clone();
        for extra in [&config.summary.credit, &config.summary.loan_amount, &config.summary.income] {
            if !columns.contains(extra) {
                columns.push(extra.clone());
            }
        }

        let rows = records
            .iter()
            .map(|record| Row::from_record(record, &columns, &config.target))
            .collect();

        Ok(Self {
            features: config.features.clone(),
            target: config.target.clone(),
            rows,
        })
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature names in column order
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Label column name
    pub fn target(&self) -> &str {
        &self.target
    }

    /// All rows
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Rows at the given indices, in index order
    pub fn select(&self, indices: &[usize]) -> Vec<Row> {
        indices.iter().map(|&i| self.rows[i].clone()).collect()
    }

    /// Feature matrix for the given indices
    pub fn matrix(&self, indices: &[usize]) -> Array2<f64> {
        let n_cols = self.features.len();
        let mut x = Array2::zeros((indices.len(), n_cols));
        for (r, &i) in indices.iter().enumerate() {
            for (c, name) in self.features.iter().enumerate() {
                x[[r, c]] = self.rows[i].get(name);
            }
        }
        x
    }

    /// Label vector for the given indices
    pub fn labels(&self, indices: &[usize]) -> Array1<f64> {
        indices.iter().map(|&i| f64::from(self.rows[i].label)).collect()
    }
}
