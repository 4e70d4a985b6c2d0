//! Error types for the server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::LoanRiskError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<LoanRiskError> for ServerError {
    fn from(err: LoanRiskError) -> Self {
        match err {
            LoanRiskError::NotReady(_) => ServerError::NotFound(err.to_string()),
            e if e.is_caller_error() => ServerError::BadRequest(e.to_string()),
            e => ServerError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ServerError::Internal(msg) => {
                tracing::error!(detail = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred".to_string())
            }
        };

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_mapping() {
        let e: ServerError = LoanRiskError::NotReady("tree".into()).into();
        assert!(matches!(e, ServerError::NotFound(ref m) if m == "tree model not trained yet"));

        let e: ServerError = LoanRiskError::UnknownModel("svm".into()).into();
        assert!(matches!(e, ServerError::BadRequest(_)));

        let e: ServerError = LoanRiskError::ValidationError("dataset is empty".into()).into();
        assert!(matches!(e, ServerError::BadRequest(_)));

        let e: ServerError = LoanRiskError::SerializationError("bad".into()).into();
        assert!(matches!(e, ServerError::Internal(_)));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ServerError::BadRequest("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::Internal("x".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
