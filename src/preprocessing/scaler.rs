//! Standard (z-score) feature scaling

use ndarray::{concatenate, Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{LoanRiskError, Result};

/// Per-feature mean and population standard deviation, fit on training rows only.
///
/// A zero standard deviation is stored as 1 so `apply` is always defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Array1<f64>,
    sigmas: Array1<f64>,
}

impl StandardScaler {
    /// Compute column-wise mean and standard deviation (divide by N)
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        let means = x.mean_axis(Axis(0)).ok_or_else(|| {
            LoanRiskError::ValidationError("cannot fit scaler on an empty matrix".to_string())
        })?;
        let sigmas = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s });

        Ok(Self { means, sigmas })
    }

    /// Rebuild a scaler from stored statistics
    pub fn from_stats(means: Vec<f64>, sigmas: Vec<f64>) -> Result<Self> {
        if means.len() != sigmas.len() {
            return Err(LoanRiskError::ShapeError {
                expected: format!("{} sigmas", means.len()),
                actual: format!("{} sigmas", sigmas.len()),
            });
        }
        let sigmas = sigmas
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();
        Ok(Self {
            means: Array1::from_vec(means),
            sigmas,
        })
    }

    /// Number of features the scaler was fit on
    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    pub fn means(&self) -> &Array1<f64> {
        &self.means
    }

    pub fn sigmas(&self) -> &Array1<f64> {
        &self.sigmas
    }

    /// `(value - mean) / sigma` per column. Never refits.
    pub fn apply(&self, row: ArrayView1<f64>) -> Result<Array1<f64>> {
        if row.len() != self.n_features() {
            return Err(LoanRiskError::ShapeError {
                expected: format!("{} features", self.n_features()),
                actual: format!("{} features", row.len()),
            });
        }
        Ok((&row - &self.means) / &self.sigmas)
    }

    /// Standardize every row of a matrix
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(LoanRiskError::ShapeError {
                expected: format!("{} columns", self.n_features()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok((x - &self.means.view().insert_axis(Axis(0))) / &self.sigmas.view().insert_axis(Axis(0)))
    }
}

/// Prepend a constant 1 column for the bias weight
pub fn with_bias(x: &Array2<f64>) -> Array2<f64> {
    let ones = Array2::ones((x.nrows(), 1));
    // Shapes agree on axis 0 by construction.
    concatenate![Axis(1), ones, x.view()]
}

/// Prepend 1 to a single standardized row
pub fn row_with_bias(row: &Array1<f64>) -> Array1<f64> {
    std::iter::once(1.0).chain(row.iter().copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_population_stats() {
        let x = array![[1.0, 5.0], [3.0, 5.0]];
        let scaler = StandardScaler::fit(&x).unwrap();

        assert_eq!(scaler.means().to_vec(), vec![2.0, 5.0]);
        // population std of [1, 3] is 1; constant column is floored to 1
        assert!((scaler.sigmas()[0] - 1.0).abs() < 1e-12);
        assert_eq!(scaler.sigmas()[1], 1.0);
    }

    #[test]
    fn test_fit_empty_matrix_fails() {
        let x = Array2::<f64>::zeros((0, 3));
        assert!(StandardScaler::fit(&x).is_err());
    }

    #[test]
    fn test_transform_zero_mean_unit_variance() {
        let x = array![[1.0, 10.0, 7.0], [2.0, 20.0, 7.0], [3.0, 60.0, 7.0], [6.0, 30.0, 7.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        let z = scaler.transform(&x).unwrap();

        for j in 0..2 {
            let col = z.column(j);
            let mean = col.mean().unwrap();
            let var = col.mapv(|v| (v - mean).powi(2)).mean().unwrap();
            assert!(mean.abs() < 1e-10, "column {} mean {}", j, mean);
            assert!((var - 1.0).abs() < 1e-10, "column {} variance {}", j, var);
        }
        // constant column: centered, sigma treated as 1
        assert!(z.column(2).iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_apply_matches_transform() {
        let x = array![[1.0, 2.0], [2.0, 3.0], [3.0, 4.0], [4.0, 5.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        let z = scaler.transform(&x).unwrap();
        let row = scaler.apply(x.row(2)).unwrap();
        assert_eq!(row, z.row(2).to_owned());
    }

    #[test]
    fn test_apply_rejects_wrong_width() {
        let scaler = StandardScaler::from_stats(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();
        let row = array![1.0, 2.0, 3.0];
        assert!(scaler.apply(row.view()).is_err());
    }

    #[test]
    fn test_bias_column() {
        let x = array![[2.0, 3.0], [4.0, 5.0]];
        let xb = with_bias(&x);
        assert_eq!(xb, array![[1.0, 2.0, 3.0], [1.0, 4.0, 5.0]]);
        assert_eq!(row_with_bias(&array![7.0]), array![1.0, 7.0]);
    }
}
