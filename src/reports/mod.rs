//! Dataset summary and the report read path
//!
//! The summary is computed on the full pre-split dataset during training
//! and persisted next to the metrics records. [`report_summary`] reads both
//! back, substituting zero-valued defaults for anything not yet trained.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SummaryColumns;
use crate::data::Dataset;
use crate::error::Result;
use crate::storage::{load_optional, ArtifactStore, METRICS_KEY, SUMMARY_KEY};
use crate::training::metrics::Metrics;

/// Aggregate statistics over a training dataset
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub rows: usize,
    pub defaults: usize,
    pub non_defaults: usize,
    pub default_rate: f64,
    pub credit_avg: f64,
    pub dti_avg: f64,
}

impl DatasetSummary {
    /// Summarize every row of `dataset`
    pub fn from_dataset(dataset: &Dataset, columns: &SummaryColumns) -> Self {
        let rows = dataset.rows();
        let n = rows.len();
        if n == 0 {
            return Self::default();
        }

        let defaults = rows.iter().filter(|r| r.label() == 1).count();
        let credit_sum: f64 = rows.iter().map(|r| r.get(&columns.credit)).sum();
        let dti_sum: f64 = rows
            .iter()
            .map(|r| r.get(&columns.loan_amount) / r.get(&columns.income).max(1.0))
            .sum();

        Self {
            rows: n,
            defaults,
            non_defaults: n - defaults,
            default_rate: defaults as f64 / n as f64,
            credit_avg: credit_sum / n as f64,
            dti_avg: dti_sum / n as f64,
        }
    }
}

/// Metrics of one model, tagged with the model name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub model: String,
    #[serde(flatten)]
    pub metrics: Metrics,
}

impl ModelReport {
    pub fn new(model: impl Into<String>, metrics: Metrics) -> Self {
        Self {
            model: model.into(),
            metrics,
        }
    }
}

/// Last evaluation of both models, as persisted under the metrics key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub logreg: ModelReport,
    pub tree: ModelReport,
}

impl Default for MetricsRecord {
    fn default() -> Self {
        Self {
            logreg: ModelReport::new("logreg", Metrics::default()),
            tree: ModelReport::new("tree", Metrics::default()),
        }
    }
}

/// Output of the ReportSummary operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    #[serde(flatten)]
    pub summary: DatasetSummary,
    pub last_model_metrics: MetricsRecord,
}

/// Read the last persisted summary and metrics, zero-filled when absent
pub fn report_summary(store: &dyn ArtifactStore) -> Result<ReportSummary> {
    let summary: Option<DatasetSummary> = load_optional(store, SUMMARY_KEY)?;
    let metrics: Option<MetricsRecord> = load_optional(store, METRICS_KEY)?;
    debug!(
        has_summary = summary.is_some(),
        has_metrics = metrics.is_some(),
        "Building report summary"
    );

    Ok(ReportSummary {
        summary: summary.unwrap_or_default(),
        last_model_metrics: metrics.unwrap_or_default(),
    })
}
