//! loanrisk - Loan default risk scoring
//!
//! Trains a logistic regression and a decision tree on tabular applicant
//! data, evaluates both on a seeded hold-out partition, persists the fitted
//! artifacts and serves probability/label predictions from them.
//!
//! # Modules
//!
//! ## Core
//! - [`data`] - Raw records, numeric coercion, validated datasets, CSV loading
//! - [`preprocessing`] - Per-feature standardization
//! - [`training`] - Partitioning, logistic regression, trees, metrics, the Train operation
//! - [`inference`] - Model dispatch and threshold handling
//! - [`reports`] - Dataset summary and the ReportSummary operation
//! - [`storage`] - Artifact persistence
//!
//! ## Services
//! - [`server`] - HTTP server with REST API
//! - [`cli`] - Command-line interface

pub mod error;
pub mod config;

pub mod data;
pub mod preprocessing;
pub mod training;
pub mod inference;
pub mod reports;
pub mod storage;

pub mod server;
pub mod cli;

pub use error::{LoanRiskError, Result};

/// Commonly used types
pub mod prelude {
    pub use crate::config::{PipelineConfig, SummaryColumns, TreeParams};
    pub use crate::data::{DataLoader, Dataset, RawRecord, Row};
    pub use crate::error::{LoanRiskError, Result};
    pub use crate::inference::{InferenceDispatcher, ModelKind, Prediction};
    pub use crate::reports::{report_summary, DatasetSummary, ModelReport, ReportSummary};
    pub use crate::storage::{ArtifactStore, LocalStore, MemoryStore};
    pub use crate::training::{Metrics, TrainEngine, TrainOutcome};
}
