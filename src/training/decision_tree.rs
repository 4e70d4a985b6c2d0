//! Binary CART classifier

use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{LoanRiskError, Result};

/// Decision tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with the predicted class
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Internal node; samples with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        gain: f64,
    },
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Gini,
    Entropy,
}

/// Decision tree over 0/1 labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub criterion: Criterion,
    n_features: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: Criterion::Gini,
            n_features: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Set criterion
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Fit the tree; labels are treated as positive when nonzero
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();

        if n_samples != y.len() {
            return Err(LoanRiskError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(LoanRiskError::ValidationError(
                "cannot fit a tree on zero rows".to_string(),
            ));
        }

        self.n_features = x.ncols();
        let labels: Vec<bool> = y.iter().map(|&v| v != 0.0).collect();
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, &labels, &indices, 0));

        Ok(self)
    }

    fn build_tree(&self, x: &Array2<f64>, labels: &[bool], indices: &[usize], depth: usize) -> TreeNode {
        let n_samples = indices.len();
        let positives = indices.iter().filter(|&&i| labels[i]).count();

        let should_stop = n_samples < self.min_samples_split
            || n_samples <= self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || positives == 0
            || positives == n_samples;

        let leaf = || TreeNode::Leaf {
            value: Self::leaf_value(positives, n_samples),
            n_samples,
        };

        if should_stop {
            return leaf();
        }

        match self.find_best_split(x, labels, indices, positives) {
            Some((feature_idx, threshold, gain)) => {
                let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[[i, feature_idx]] <= threshold);

                if left_indices.len() < self.min_samples_leaf || right_indices.len() < self.min_samples_leaf {
                    return leaf();
                }

                let left = Box::new(self.build_tree(x, labels, &left_indices, depth + 1));
                let right = Box::new(self.build_tree(x, labels, &right_indices, depth + 1));

                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    n_samples,
                    gain,
                }
            }
            None => leaf(),
        }
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        labels: &[bool],
        indices: &[usize],
        positives: usize,
    ) -> Option<(usize, f64, f64)> {
        let n = indices.len();
        let parent_impurity = self.impurity(positives, n);

        // Each feature independently finds its best split
        let feature_results: Vec<Option<(usize, f64, f64)>> = (0..self.n_features)
            .into_par_iter()
            .map(|feature_idx| {
                let mut pairs: Vec<(f64, bool)> = indices
                    .iter()
                    .map(|&i| (x[[i, feature_idx]], labels[i]))
                    .collect();
                pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

                let mut best: Option<(f64, f64)> = None;
                let mut left_count = 0usize;
                let mut left_pos = 0usize;

                // Sweep sorted values, scoring a cut between each distinct pair
                for k in 0..n - 1 {
                    left_count += 1;
                    if pairs[k].1 {
                        left_pos += 1;
                    }
                    if pairs[k].0 == pairs[k + 1].0 {
                        continue;
                    }
                    let right_count = n - left_count;
                    if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                        continue;
                    }

                    let weighted = (left_count as f64 * self.impurity(left_pos, left_count)
                        + right_count as f64 * self.impurity(positives - left_pos, right_count))
                        / n as f64;
                    let gain = parent_impurity - weighted;

                    if gain > best.map_or(0.0, |b| b.1) {
                        best = Some(((pairs[k].0 + pairs[k + 1].0) / 2.0, gain));
                    }
                }

                best.map(|(threshold, gain)| (feature_idx, threshold, gain))
            })
            .collect();

        // Ties resolve to the lowest feature index for reproducible trees
        feature_results.into_iter().flatten().fold(None, |acc, cand| match acc {
            Some(best) if best.2 >= cand.2 => Some(best),
            _ => Some(cand),
        })
    }

    fn impurity(&self, positives: usize, count: usize) -> f64 {
        if count == 0 {
            return 0.0;
        }
        let p = positives as f64 / count as f64;
        let q = 1.0 - p;
        match self.criterion {
            Criterion::Gini => 1.0 - p * p - q * q,
            Criterion::Entropy => {
                let term = |v: f64| if v > 0.0 { -v * v.ln() } else { 0.0 };
                term(p) + term(q)
            }
        }
    }

    /// Majority class; ties go to the negative class
    fn leaf_value(positives: usize, n_samples: usize) -> f64 {
        if positives * 2 > n_samples {
            1.0
        } else {
            0.0
        }
    }

    /// Predict the class of a single sample
    pub fn predict_one(&self, sample: &[f64]) -> Result<f64> {
        let root = self.root.as_ref().ok_or(LoanRiskError::ModelNotFitted)?;
        if sample.len() != self.n_features {
            return Err(LoanRiskError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", sample.len()),
            });
        }
        Self::predict_sample(root, sample)
    }

    /// Make predictions for every row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let predictions = x
            .rows()
            .into_iter()
            .map(|row| self.predict_one(&row.to_vec()))
            .collect::<Result<Vec<f64>>>()?;
        Ok(Array1::from_vec(predictions))
    }

    fn predict_sample(node: &TreeNode, sample: &[f64]) -> Result<f64> {
        match node {
            TreeNode::Leaf { value, .. } => Ok(*value),
            TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                let x = sample.get(*feature_idx).ok_or_else(|| LoanRiskError::ShapeError {
                    expected: format!("feature index < {}", sample.len()),
                    actual: format!("feature index {}", feature_idx),
                })?;
                if *x <= *threshold {
                    Self::predict_sample(left, sample)
                } else {
                    Self::predict_sample(right, sample)
                }
            }
        }
    }

    /// Get tree depth
    pub fn get_depth(&self) -> usize {
        self.root.as_ref().map_or(0, Self::node_depth)
    }

    fn node_depth(node: &TreeNode) -> usize {
        match node {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => 1 + Self::node_depth(left).max(Self::node_depth(right)),
        }
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        self.root.as_ref().map_or(0, Self::count_leaves)
    }

    fn count_leaves(node: &TreeNode) -> usize {
        match node {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => Self::count_leaves(left) + Self::count_leaves(right),
        }
    }
}
