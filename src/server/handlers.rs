//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Multipart, Query, State,
    },
    response::Html,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::data::DataLoader;
use crate::inference::{ModelKind, Prediction};
use crate::reports::{report_summary, ModelReport, ReportSummary};
use crate::training::TrainEngine;

use super::error::{Result, ServerError};
use super::state::AppState;

/// Accepted range for the `test_size` query parameter
const TEST_SIZE_RANGE: std::ops::RangeInclusive<f64> = 0.1..=0.5;

// ============================================================================
// Training
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TrainQuery {
    test_size: Option<f64>,
    random_state: Option<u64>,
}

/// Train both models on an uploaded CSV (multipart field `file`)
pub async fn train(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<TrainQuery>, QueryRejection>,
    mut multipart: Multipart,
) -> Result<Json<Vec<ModelReport>>> {
    let Query(query) = query.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let mut config = state.pipeline.clone();
    if let Some(test_size) = query.test_size {
        if !TEST_SIZE_RANGE.contains(&test_size) {
            return Err(ServerError::BadRequest(format!(
                "test_size must be between {} and {}",
                TEST_SIZE_RANGE.start(),
                TEST_SIZE_RANGE.end()
            )));
        }
        config.train_fraction = 1.0 - test_size;
    }
    if let Some(seed) = query.random_state {
        config.seed = seed;
    }

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("data.csv").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(e.to_string()))?;
            info!(file = %file_name, bytes = data.len(), "Received training upload");
            upload = Some(data);
            break;
        }
    }
    let data = upload.ok_or_else(|| ServerError::BadRequest("No file uploaded".to_string()))?;

    let _guard = state.training_lock.lock().await;
    let store = Arc::clone(&state.store);
    let outcome = tokio::task::spawn_blocking(move || {
        let records = DataLoader::new().load_csv_bytes(&data)?;
        TrainEngine::new(config, store).train_records(&records)
    })
    .await
    .map_err(|e| ServerError::Internal(format!("training task failed: {}", e)))??;

    Ok(Json(outcome.reports()))
}

// ============================================================================
// Inference
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    model: Option<String>,
    threshold: Option<f64>,
}

/// Score one JSON object of raw feature values
pub async fn predict(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<PredictQuery>, QueryRejection>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Prediction>> {
    let Query(query) = query.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let Json(body) = body.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let record = match body {
        Value::Object(map) => map,
        _ => return Err(ServerError::BadRequest("request body must be a JSON object".to_string())),
    };

    let kind: ModelKind = query.model.as_deref().unwrap_or("logreg").parse()?;
    let prediction = state.dispatcher.predict(kind, &record, query.threshold)?;
    Ok(Json(prediction))
}

// ============================================================================
// Reports
// ============================================================================

pub async fn summary(State(state): State<Arc<AppState>>) -> Result<Json<ReportSummary>> {
    Ok(Json(report_summary(state.store.as_ref())?))
}

// ============================================================================
// System
// ============================================================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(serde_json::json!({
        "ok": true,
        "version": env!("CARGO_PKG_VERSION"),
        "artifacts": state.store.describe(),
        "uptime_secs": chrono::Utc::now().signed_duration_since(state.started_at).num_seconds(),
        "models": {
            "logreg": state.dispatcher.is_ready(ModelKind::Logreg),
            "tree": state.dispatcher.is_ready(ModelKind::Tree),
        },
    }))
}

pub async fn serve_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>loanrisk</title>
</head>
<body>
    <h1>loanrisk</h1>
    <p>Loan default risk scoring service.</p>
    <ul>
        <li><code>GET /api/health</code></li>
        <li><code>POST /api/train</code> (multipart field <code>file</code>, optional <code>test_size</code>, <code>random_state</code>)</li>
        <li><code>POST /api/predict?model=logreg|tree&amp;threshold=0.5</code></li>
        <li><code>GET /api/reports/summary</code></li>
    </ul>
</body>
</html>
"#;
