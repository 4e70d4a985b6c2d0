//! Error types for the loanrisk pipeline

use thiserror::Error;

/// Result type alias for loanrisk operations
pub type Result<T> = std::result::Result<T, LoanRiskError>;

/// Main error type for training, storage and inference
#[derive(Error, Debug)]
pub enum LoanRiskError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Unknown model: {0} (expected \"logreg\" or \"tree\")")]
    UnknownModel(String),

    /// Inference requested for a model that has not been trained yet
    #[error("{0} model not trained yet")]
    NotReady(String),

    /// Store lookup on an absent key
    #[error("Artifact not found: {0}")]
    NotFound(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,
}

impl LoanRiskError {
    /// Errors caused by bad caller input rather than by the system.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            LoanRiskError::ValidationError(_)
                | LoanRiskError::InvalidParameter { .. }
                | LoanRiskError::UnknownModel(_)
                | LoanRiskError::DataError(_)
                | LoanRiskError::ShapeError { .. }
        )
    }
}

impl From<polars::error::PolarsError> for LoanRiskError {
    fn from(err: polars::error::PolarsError) -> Self {
        LoanRiskError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for LoanRiskError {
    fn from(err: serde_json::Error) -> Self {
        LoanRiskError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for LoanRiskError {
    fn from(err: ndarray::ShapeError) -> Self {
        LoanRiskError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LoanRiskError::ValidationError("dataset is empty".to_string());
        assert_eq!(err.to_string(), "Validation error: dataset is empty");

        let err = LoanRiskError::NotReady("logreg".to_string());
        assert_eq!(err.to_string(), "logreg model not trained yet");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LoanRiskError = io_err.into();
        assert!(matches!(err, LoanRiskError::IoError(_)));
        assert!(!err.is_caller_error());
    }

    #[test]
    fn test_caller_errors() {
        assert!(LoanRiskError::UnknownModel("svm".into()).is_caller_error());
        assert!(!LoanRiskError::NotReady("tree".into()).is_caller_error());
        assert!(!LoanRiskError::NotFound("tree".into()).is_caller_error());
    }
}
