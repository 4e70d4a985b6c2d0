//! Tree model behind the same contract as the logistic model
//!
//! The split search itself sits behind [`TreeLearner`]; the adapter only
//! deals with named rows, persisted artifacts and the 0/1 probability
//! convention.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::decision_tree::DecisionTree;
use crate::config::TreeParams;
use crate::data::{coerce_field, RawRecord, Row};
use crate::error::{LoanRiskError, Result};

/// Fit/predict capability of an external tree algorithm.
///
/// The fitted tree is handed back as an opaque JSON value so any
/// implementation can be persisted and rebuilt without retraining.
pub trait TreeLearner: Send + Sync {
    /// Fit on named rows, returning a serialized tree
    fn fit(&self, rows: &[Row], target: &str, features: &[String]) -> Result<Value>;

    /// Predict the raw label for one feature vector (ordered like `features` at fit time)
    fn predict(&self, tree: &Value, sample: &[f64]) -> Result<f64>;

    /// Predict raw labels for many feature vectors against one tree
    fn predict_many(&self, tree: &Value, samples: &[Vec<f64>]) -> Result<Vec<f64>> {
        samples.iter().map(|s| self.predict(tree, s)).collect()
    }
}

/// Default learner: the in-crate CART classifier
#[derive(Debug, Clone, Default)]
pub struct CartLearner {
    params: TreeParams,
}

impl CartLearner {
    pub fn new(params: TreeParams) -> Self {
        Self { params }
    }
}

impl TreeLearner for CartLearner {
    fn fit(&self, rows: &[Row], _target: &str, features: &[String]) -> Result<Value> {
        let mut x = Array2::zeros((rows.len(), features.len()));
        for (i, row) in rows.iter().enumerate() {
            for (j, name) in features.iter().enumerate() {
                x[[i, j]] = row.get(name);
            }
        }
        let y: Array1<f64> = rows.iter().map(|r| f64::from(r.label())).collect();

        let mut tree = DecisionTree::new()
            .with_max_depth(self.params.max_depth)
            .with_min_samples_split(self.params.min_samples_split)
            .with_min_samples_leaf(self.params.min_samples_leaf)
            .with_criterion(self.params.criterion);
        tree.fit(&x, &y)?;

        tracing::debug!(depth = tree.get_depth(), leaves = tree.get_n_leaves(), "Fitted decision tree");
        Ok(serde_json::to_value(&tree)?)
    }

    fn predict(&self, tree: &Value, sample: &[f64]) -> Result<f64> {
        let tree = DecisionTree::deserialize(tree)?;
        tree.predict_one(sample)
    }

    fn predict_many(&self, tree: &Value, samples: &[Vec<f64>]) -> Result<Vec<f64>> {
        let tree = DecisionTree::deserialize(tree)?;
        samples.iter().map(|s| tree.predict_one(s)).collect()
    }
}

/// Persisted tree model plus the names needed to rebuild a predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeArtifact {
    pub features: Vec<String>,
    pub target: String,
    pub tree: Value,
}

/// Trains and queries tree artifacts through a [`TreeLearner`]
pub struct TreeAdapter<L: TreeLearner = CartLearner> {
    learner: L,
}

impl TreeAdapter<CartLearner> {
    /// Adapter over the default CART learner
    pub fn cart(params: TreeParams) -> Self {
        Self::new(CartLearner::new(params))
    }
}

impl<L: TreeLearner> TreeAdapter<L> {
    pub fn new(learner: L) -> Self {
        Self { learner }
    }

    /// Fit on raw (unstandardized) rows
    pub fn train(&self, rows: &[Row], features: &[String], target: &str) -> Result<TreeArtifact> {
        if rows.is_empty() {
            return Err(LoanRiskError::ValidationError("no training rows".to_string()));
        }
        let tree = self.learner.fit(rows, target, features)?;
        Ok(TreeArtifact {
            features: features.to_vec(),
            target: target.to_string(),
            tree,
        })
    }

    fn label_for(&self, artifact: &TreeArtifact, sample: &[f64]) -> Result<u8> {
        Ok(positive(self.learner.predict(&artifact.tree, sample)?))
    }

    /// Hard 0/1 label for a coerced row
    pub fn predict_label(&self, artifact: &TreeArtifact, row: &Row) -> Result<u8> {
        self.label_for(artifact, &row.feature_vector(&artifact.features))
    }

    /// Degenerate probability: 1.0 when the label is the positive class, else 0.0
    pub fn predict_probability(&self, artifact: &TreeArtifact, row: &Row) -> Result<f64> {
        Ok(f64::from(self.predict_label(artifact, row)?))
    }

    /// Probabilities for a batch of coerced rows, decoding the tree once
    pub fn predict_probabilities(&self, artifact: &TreeArtifact, rows: &[Row]) -> Result<Vec<f64>> {
        let samples: Vec<Vec<f64>> = rows.iter().map(|r| r.feature_vector(&artifact.features)).collect();
        let raw = self.learner.predict_many(&artifact.tree, &samples)?;
        Ok(raw.into_iter().map(|v| f64::from(positive(v))).collect())
    }

    /// Probability for an uncoerced record
    pub fn predict_record(&self, artifact: &TreeArtifact, record: &RawRecord) -> Result<f64> {
        let sample: Vec<f64> = artifact.features.iter().map(|f| coerce_field(record, f)).collect();
        Ok(f64::from(self.label_for(artifact, &sample)?))
    }
}

fn positive(raw: f64) -> u8 {
    if (raw - 1.0).abs() < f64::EPSILON { 1 } else { 0 }
}
