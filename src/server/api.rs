//! API route definitions

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{handlers, state::AppState};

async fn handle_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": true,
            "message": "Not found. Visit /api/health to check API status.",
        })),
    )
}

async fn handle_405() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": true,
            "message": "Method not allowed.",
        })),
    )
}

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_upload_size = state.config.max_upload_size;

    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/train", post(handlers::train))
        .route("/predict", post(handlers::predict))
        .route("/reports/summary", get(handlers::summary))
        .fallback(handle_404)
        .method_not_allowed_fallback(handle_405);

    let cors = match std::env::var("CORS_ORIGIN") {
        Ok(origin) if !origin.is_empty() && origin != "*" => match origin.parse::<axum::http::HeaderValue>() {
            Ok(value) => CorsLayer::new().allow_origin(value),
            Err(_) => CorsLayer::new().allow_origin(Any),
        },
        _ => CorsLayer::new().allow_origin(Any),
    }
    .allow_methods(Any)
    .allow_headers(Any);

    Router::new()
        .nest("/api", api_routes)
        .route("/", get(handlers::serve_index))
        .fallback(handle_404)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
