//! Pipeline configuration
//!
//! Everything the training and inference paths need to know about the
//! dataset layout and optimizer settings lives here, passed to each
//! component at construction.

use serde::{Deserialize, Serialize};

use crate::error::{LoanRiskError, Result};
use crate::training::decision_tree::Criterion;

/// Decision boundary used when scoring the held-out partition during training.
pub const EVALUATION_THRESHOLD: f64 = 0.5;

/// Parameters handed to the tree learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth of the tree (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples in each leaf
    pub min_samples_leaf: usize,
    /// Impurity criterion
    pub criterion: Criterion,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: Some(6),
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: Criterion::Gini,
        }
    }
}

/// Columns used to build the dataset summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryColumns {
    /// Credit proxy column averaged into `credit_avg`
    pub credit: String,
    /// Numerator of the debt ratio
    pub loan_amount: String,
    /// Denominator of the debt ratio (floored at 1)
    pub income: String,
}

impl Default for SummaryColumns {
    fn default() -> Self {
        Self {
            credit: "CreditScore".to_string(),
            loan_amount: "LoanAmount".to_string(),
            income: "Income".to_string(),
        }
    }
}

/// Configuration for training and inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Ordered feature column names
    pub features: Vec<String>,
    /// Binary label column
    pub target: String,
    /// Share of rows assigned to the training partition
    pub train_fraction: f64,
    /// Seed for the split shuffle
    pub seed: u64,
    /// Gradient descent step size
    pub learning_rate: f64,
    /// Number of full-batch gradient descent iterations
    pub epochs: usize,
    /// Tree learner parameters
    pub tree: TreeParams,
    /// Summary record columns
    pub summary: SummaryColumns,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            features: ["Age", "Income", "LoanAmount", "CreditScore"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            target: "Default".to_string(),
            train_fraction: 0.8,
            seed: 42,
            learning_rate: 0.1,
            epochs: 400,
            tree: TreeParams::default(),
            summary: SummaryColumns::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a config for the given features and target
    pub fn new(features: &[&str], target: &str) -> Self {
        Self {
            features: features.iter().map(|s| s.to_string()).collect(),
            target: target.to_string(),
            ..Default::default()
        }
    }

    /// Set the train fraction and shuffle seed
    pub fn with_split(mut self, train_fraction: f64, seed: u64) -> Self {
        self.train_fraction = train_fraction;
        self.seed = seed;
        self
    }

    /// Set the learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set the number of epochs
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set the tree learner parameters
    pub fn with_tree(mut self, tree: TreeParams) -> Self {
        self.tree = tree;
        self
    }

    /// Set the summary columns
    pub fn with_summary_columns(mut self, summary: SummaryColumns) -> Self {
        self.summary = summary;
        self
    }

    /// All columns a training record must carry: features then target
    pub fn required_columns(&self) -> Vec<&str> {
        self.features
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.target.as_str()))
            .collect()
    }

    /// Check parameter ranges before any numeric work
    pub fn validate(&self) -> Result<()> {
        if self.features.is_empty() {
            return Err(LoanRiskError::ValidationError(
                "feature list must not be empty".to_string(),
            ));
        }
        if !(self.train_fraction > 0.0 && self.train_fraction <= 1.0) {
            return Err(LoanRiskError::InvalidParameter {
                name: "train_fraction".to_string(),
                value: self.train_fraction.to_string(),
                reason: "must be in (0, 1]".to_string(),
            });
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(LoanRiskError::InvalidParameter {
                name: "learning_rate".to_string(),
                value: self.learning_rate.to_string(),
                reason: "must be a positive number".to_string(),
            });
        }
        if self.epochs == 0 {
            return Err(LoanRiskError::InvalidParameter {
                name: "epochs".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.features.len(), 4);
        assert_eq!(config.target, "Default");
        assert_eq!(config.epochs, 400);
        assert!((config.learning_rate - 0.1).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_required_columns_order() {
        let config = PipelineConfig::new(&["a", "b"], "y");
        assert_eq!(config.required_columns(), vec!["a", "b", "y"]);
    }

    #[test]
    fn test_validate_rejects_bad_split() {
        let config = PipelineConfig::default().with_split(0.0, 1);
        assert!(matches!(
            config.validate(),
            Err(LoanRiskError::InvalidParameter { .. })
        ));

        let config = PipelineConfig::default().with_split(1.5, 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_epochs() {
        let config = PipelineConfig::default().with_epochs(0);
        assert!(config.validate().is_err());
    }
}
