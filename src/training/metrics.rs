//! Confusion-matrix metrics shared by both model types

use serde::{Deserialize, Serialize};

use crate::error::{LoanRiskError, Result};

/// Guards the F1 denominator when precision and recall are both 0
const F1_EPSILON: f64 = 1e-12;

/// Four-way count of prediction outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
}

impl ConfusionMatrix {
    /// Count paired (true, predicted) 0/1 labels
    pub fn from_labels(y_true: &[u8], y_pred: &[u8]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(LoanRiskError::ValidationError(format!(
                "label length {} does not match prediction length {}",
                y_true.len(),
                y_pred.len()
            )));
        }

        let mut cm = Self::default();
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t, p) {
                (1, 1) => cm.tp += 1,
                (0, 0) => cm.tn += 1,
                (0, 1) => cm.fp += 1,
                (1, 0) => cm.fn_ += 1,
                _ => {
                    return Err(LoanRiskError::ValidationError(format!(
                        "labels must be 0 or 1, got ({}, {})",
                        t, p
                    )))
                }
            }
        }
        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }
}

/// Scores derived from a confusion matrix; never stored apart from its counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    #[serde(flatten)]
    pub confusion: ConfusionMatrix,
}

impl Metrics {
    /// Derive scores; zero denominators yield 0 instead of failing
    pub fn from_confusion(cm: ConfusionMatrix) -> Self {
        let ratio = |num: usize, den: usize| num as f64 / den.max(1) as f64;

        let accuracy = ratio(cm.tp + cm.tn, cm.total());
        let precision = ratio(cm.tp, cm.tp + cm.fp);
        let recall = ratio(cm.tp, cm.tp + cm.fn_);
        let f1 = 2.0 * precision * recall / (precision + recall).max(F1_EPSILON);

        Self {
            accuracy,
            precision,
            recall,
            f1,
            confusion: cm,
        }
    }

    /// Confusion matrix and scores in one step
    pub fn compute(y_true: &[u8], y_pred: &[u8]) -> Result<Self> {
        Ok(Self::from_confusion(ConfusionMatrix::from_labels(y_true, y_pred)?))
    }

    /// Threshold probabilities into 0/1 labels (`p >= threshold`)
    pub fn labels_at(probabilities: &[f64], threshold: f64) -> Vec<u8> {
        probabilities.iter().map(|&p| u8::from(p >= threshold)).collect()
    }
}
