//! Integration test: Server API endpoints

use axum::body::Body;
use axum::http::{Request, StatusCode};
use loanrisk::server::{create_router, AppState, ServerConfig};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "loanrisk-test-boundary";

fn test_app() -> (axum::Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        artifact_dir: dir.path().display().to_string(),
        max_upload_size: 10 * 1024 * 1024,
    };
    let state = Arc::new(AppState::new(config).unwrap());
    (create_router(state), dir)
}

fn loans_csv(n: usize) -> String {
    let mut csv = String::from("Age,Income,LoanAmount,CreditScore,Default\n");
    for i in 0..n {
        let risky = i % 2 == 0;
        let income = if risky { 1800 + i } else { 7000 + i };
        let loan = if risky { 12000 } else { 2500 };
        let credit = if risky { 540 + i % 30 } else { 740 + i % 30 };
        csv.push_str(&format!("{},{},{},{},{}\n", 25 + i % 35, income, loan, credit, u8::from(risky)));
    }
    csv
}

fn multipart_request(uri: &str, csv: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"loans.csv\"\r\nContent-Type: text/csv\r\n\r\n{csv}\r\n--{b}--\r\n",
        b = BOUNDARY,
        csv = csv
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

fn predict_request(query: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/predict{}", query))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 64).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _dir) = test_app();
    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["models"]["logreg"], false);
    assert_eq!(json["models"]["tree"], false);
}

#[tokio::test]
async fn test_root_serves_html() {
    let (app, _dir) = test_app();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (app, _dir) = test_app();
    let response = app
        .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], true);
}

#[tokio::test]
async fn test_predict_before_training_is_404() {
    let (app, _dir) = test_app();
    let response = app
        .oneshot(predict_request("?model=tree", r#"{"Age": 30}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert_eq!(json["message"], "tree model not trained yet");
}

#[tokio::test]
async fn test_predict_unknown_model_is_400() {
    let (app, _dir) = test_app();
    let response = app
        .oneshot(predict_request("?model=forest", r#"{"Age": 30}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_predict_rejects_non_object_body() {
    let (app, _dir) = test_app();
    let response = app.oneshot(predict_request("", "[1, 2, 3]")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_predict_malformed_threshold_is_json_400() {
    let (app, _dir) = test_app();
    let response = app
        .oneshot(predict_request("?model=logreg&threshold=abc", r#"{"Age": 30}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], true);
    assert!(json["message"].as_str().unwrap().contains("query string"));
}

#[tokio::test]
async fn test_train_malformed_random_state_is_json_400() {
    let (app, _dir) = test_app();
    let response = app
        .oneshot(multipart_request("/api/train?random_state=-3", &loans_csv(20)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], true);
}

#[tokio::test]
async fn test_summary_defaults_before_training() {
    let (app, _dir) = test_app();
    let response = app
        .oneshot(Request::builder().uri("/api/reports/summary").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["rows"], 0);
    assert_eq!(json["defaultRate"], 0.0);
    assert_eq!(json["lastModelMetrics"]["logreg"]["model"], "logreg");
    assert_eq!(json["lastModelMetrics"]["tree"]["accuracy"], 0.0);
}

#[tokio::test]
async fn test_train_without_file_is_400() {
    let (app, _dir) = test_app();
    let body = format!("--{b}--\r\n", b = BOUNDARY);
    let request = Request::builder()
        .method("POST")
        .uri("/api/train")
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_train_rejects_out_of_range_test_size() {
    let (app, _dir) = test_app();
    let response = app
        .oneshot(multipart_request("/api/train?test_size=0.9", &loans_csv(20)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_train_missing_columns_is_400() {
    let (app, dir) = test_app();
    let response = app
        .oneshot(multipart_request("/api/train", "Age,Income\n30,1000\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["message"].as_str().unwrap().contains("LoanAmount"));
    assert!(!dir.path().join("logreg.json").exists());
}

#[tokio::test]
async fn test_train_predict_summary_flow() {
    let (app, dir) = test_app();

    let response = app
        .clone()
        .oneshot(multipart_request("/api/train?test_size=0.25&random_state=7", &loans_csv(80)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let reports = json_body(response).await;
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["model"], "logreg");
    assert_eq!(reports[1]["model"], "tree");
    let evaluated = ["tp", "tn", "fp", "fn"]
        .iter()
        .map(|k| reports[0][*k].as_u64().unwrap())
        .sum::<u64>();
    assert_eq!(evaluated, 20);
    for name in ["logreg.json", "tree.json", "summary.json", "metrics.json"] {
        assert!(dir.path().join(name).is_file(), "missing {}", name);
    }

    let response = app
        .clone()
        .oneshot(predict_request(
            "?model=logreg&threshold=0.0",
            r#"{"Age": 30, "Income": 1800, "LoanAmount": 12000, "CreditScore": 540}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let prediction = json_body(response).await;
    assert_eq!(prediction["model"], "logreg");
    assert_eq!(prediction["explanation"]["threshold"], 0.1);
    assert_eq!(prediction["label"], 1);
    let p = prediction["probability"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&p));

    let response = app
        .clone()
        .oneshot(predict_request(
            "?model=tree",
            r#"{"Age": "41", "Income": "9000", "LoanAmount": "2500", "CreditScore": "760"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let prediction = json_body(response).await;
    assert_eq!(prediction["label"], 0);
    assert_eq!(prediction["explanation"]["features"]["Income"], 9000.0);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/reports/summary").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let summary = json_body(response).await;
    assert_eq!(summary["rows"], 80);
    assert_eq!(summary["defaults"], 40);
    assert_eq!(summary["nonDefaults"], 40);
    assert_eq!(summary["lastModelMetrics"]["tree"]["model"], "tree");

    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let health = json_body(response).await;
    assert_eq!(health["models"]["logreg"], true);
    assert_eq!(health["models"]["tree"], true);
}
