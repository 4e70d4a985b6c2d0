//! Logistic regression fit by full-batch gradient descent

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::data::{coerce_field, RawRecord};
use crate::error::{LoanRiskError, Result};
use crate::preprocessing::{row_with_bias, with_bias, StandardScaler};

/// Numerically stable logistic function
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Gradient descent settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticTrainer {
    pub learning_rate: f64,
    pub epochs: usize,
}

impl Default for LogisticTrainer {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticTrainer {
    pub fn new() -> Self {
        Self {
            learning_rate: 0.1,
            epochs: 400,
        }
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Fit weights on a standardized matrix that already carries the bias column.
    ///
    /// Weights start at zero and take exactly `epochs` steps of
    /// `w -= lr * X^T (sigmoid(Xw) - y) / n`.
    pub fn train(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Array1<f64>> {
        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(LoanRiskError::ValidationError("no training rows".to_string()));
        }
        if n_samples != y.len() {
            return Err(LoanRiskError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }

        let mut weights = Array1::<f64>::zeros(x.ncols());
        let scale = self.learning_rate / n_samples as f64;

        for _ in 0..self.epochs {
            let predictions = x.dot(&weights).mapv(sigmoid);
            let errors = &predictions - y;
            let gradient = x.t().dot(&errors);
            weights.scaled_add(-scale, &gradient);
        }

        Ok(weights)
    }

    /// Standardize raw training features, prepend the bias and fit.
    pub fn fit(&self, features: &[String], x_raw: &Array2<f64>, y: &Array1<f64>) -> Result<LogisticArtifact> {
        if x_raw.nrows() == 0 {
            return Err(LoanRiskError::ValidationError("no training rows".to_string()));
        }
        if x_raw.ncols() != features.len() {
            return Err(LoanRiskError::ShapeError {
                expected: format!("{} columns", features.len()),
                actual: format!("{} columns", x_raw.ncols()),
            });
        }
        let scaler = StandardScaler::fit(x_raw)?;
        let xb = with_bias(&scaler.transform(x_raw)?);
        let weights = self.train(&xb, y)?;

        Ok(LogisticArtifact {
            features: features.to_vec(),
            means: scaler.means().to_vec(),
            sigmas: scaler.sigmas().to_vec(),
            weights: weights.to_vec(),
        })
    }
}

/// Persisted logistic model: normalization stats plus weights (bias first)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticArtifact {
    pub features: Vec<String>,
    pub means: Vec<f64>,
    pub sigmas: Vec<f64>,
    pub weights: Vec<f64>,
}

impl LogisticArtifact {
    fn scaler(&self) -> Result<StandardScaler> {
        if self.weights.len() != self.means.len() + 1 {
            return Err(LoanRiskError::ShapeError {
                expected: format!("{} weights", self.means.len() + 1),
                actual: format!("{} weights", self.weights.len()),
            });
        }
        StandardScaler::from_stats(self.means.clone(), self.sigmas.clone())
    }

    /// `sigmoid(w · [1, standardize(raw)])` for a raw feature vector
    pub fn predict_probability(&self, raw: &[f64]) -> Result<f64> {
        let scaler = self.scaler()?;
        let z = scaler.apply(ndarray::ArrayView1::from(raw))?;
        let xb = row_with_bias(&z);
        let w = Array1::from_vec(self.weights.clone());
        Ok(sigmoid(xb.dot(&w)))
    }

    /// Probability for a raw record; absent or non-numeric fields count as 0
    pub fn predict_record(&self, record: &RawRecord) -> Result<f64> {
        let raw: Vec<f64> = self.features.iter().map(|f| coerce_field(record, f)).collect();
        self.predict_probability(&raw)
    }

    /// Probabilities for every row of a raw feature matrix
    pub fn predict_matrix(&self, x_raw: &Array2<f64>) -> Result<Array1<f64>> {
        let scaler = self.scaler()?;
        let xb = with_bias(&scaler.transform(x_raw)?);
        let w = Array1::from_vec(self.weights.clone());
        Ok(xb.dot(&w).mapv(sigmoid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn features() -> Vec<String> {
        vec!["a".to_string(), "b".to_string()]
    }

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(1000.0) <= 1.0);
        assert!(sigmoid(-1000.0) >= 0.0);
        assert!(sigmoid(-1000.0).is_finite());
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_separates_simple_classes() {
        let x = array![[1.0, 2.0], [2.0, 3.0], [3.0, 4.0], [4.0, 5.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let model = LogisticTrainer::new().fit(&features(), &x, &y).unwrap();

        assert_eq!(model.weights.len(), 3);
        assert!(model.predict_probability(&[1.0, 2.0]).unwrap() < 0.5);
        assert!(model.predict_probability(&[4.0, 5.0]).unwrap() > 0.5);
    }

    #[test]
    fn test_empty_training_matrix() {
        let x = Array2::<f64>::zeros((0, 2));
        let y = Array1::<f64>::zeros(0);
        let err = LogisticTrainer::new().fit(&features(), &x, &y).unwrap_err();
        assert!(matches!(err, LoanRiskError::ValidationError(_)));
    }

    #[test]
    fn test_single_epoch_step() {
        // One step from zero weights: every prediction is 0.5
        let x = array![[1.0, 1.0], [1.0, -1.0]];
        let y = array![1.0, 0.0];
        let w = LogisticTrainer::new()
            .with_epochs(1)
            .with_learning_rate(1.0)
            .train(&x, &y)
            .unwrap();
        // gradient = X^T [-0.5, 0.5] / 2 = [0, -0.5]
        assert!(w[0].abs() < 1e-12);
        assert!((w[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_predict_record_coerces_missing() {
        let model = LogisticArtifact {
            features: features(),
            means: vec![0.0, 0.0],
            sigmas: vec![1.0, 1.0],
            weights: vec![0.0, 1.0, 1.0],
        };
        let record: RawRecord = serde_json::json!({"a": "oops"}).as_object().cloned().unwrap();
        let p = model.predict_record(&record).unwrap();
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_malformed_artifact_rejected() {
        let model = LogisticArtifact {
            features: features(),
            means: vec![0.0, 0.0],
            sigmas: vec![1.0, 1.0],
            weights: vec![0.0, 1.0],
        };
        assert!(model.predict_probability(&[1.0, 1.0]).is_err());
    }

    #[test]
    fn test_predict_matrix_matches_single_rows() {
        let x = array![[1.0, 2.0], [2.0, 3.0], [3.0, 4.0], [4.0, 5.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let model = LogisticTrainer::new().with_epochs(50).fit(&features(), &x, &y).unwrap();

        let batch = model.predict_matrix(&x).unwrap();
        for (i, row) in x.rows().into_iter().enumerate() {
            let single = model.predict_probability(&row.to_vec()).unwrap();
            assert!((batch[i] - single).abs() < 1e-12);
        }
    }
}
