use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use nl2sql::config::AppConfig;
use nl2sql::db::seed::{seed_database, SeedOptions};
use nl2sql::llm::{LlmError, TextGenerator};
use nl2sql::web::handlers::api::SESSION_HEADER;
use nl2sql::web::state::AppState;

struct CountStudents;

#[async_trait]
impl TextGenerator for CountStudents {
    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        Ok("SELECT COUNT(*) AS total FROM STUDENT".to_string())
    }
}

fn test_app() -> (TempDir, Router) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("student.db");
    seed_database(&path, &SeedOptions { rng_seed: Some(3) }).unwrap();

    let mut config = AppConfig::default();
    config.database.path = path.to_string_lossy().into_owned();

    let state = AppState::new(config, Arc::new(CountStudents), "TEMPLATE".to_string()).unwrap();
    (dir, nl2sql::web::app(Arc::new(state)))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn ask_request(session: &str, question: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/ask")
        .header("content-type", "application/json")
        .header(SESSION_HEADER, session)
        .body(Body::from(json!({ "question": question }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn ask_runs_generated_sql() {
    let (_dir, app) = test_app();

    let response = app.oneshot(ask_request("tab-1", "How many students?")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["outcome"], "executed");
    assert_eq!(body["sql"], "SELECT COUNT(*) AS total FROM STUDENT");
    assert_eq!(body["result"]["status"], "rows");
    assert_eq!(body["result"]["columns"], json!(["total"]));
    assert_eq!(body["result"]["rows"], json!([[15]]));
}

#[tokio::test]
async fn sessions_are_paced_independently() {
    let (_dir, app) = test_app();

    let first = app.clone().oneshot(ask_request("tab-1", "q")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let again = app.clone().oneshot(ask_request("tab-1", "q")).await.unwrap();
    assert_eq!(again.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(again).await;
    assert_eq!(body["outcome"], "rate_limited");

    let other = app.oneshot(ask_request("tab-2", "q")).await.unwrap();
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn blank_question_is_a_bad_request() {
    let (_dir, app) = test_app();

    let response = app.oneshot(ask_request("tab-1", "   ")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["outcome"], "empty_question");
}

#[tokio::test]
async fn schema_and_relationships_describe_the_database() {
    let (_dir, app) = test_app();

    let response = app
        .clone()
        .oneshot(Request::get("/api/schema").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["tables"]["STUDENT"]["row_count"], 15);
    assert_eq!(body["tables"]["STUDENT"]["columns"][0]["name"], "STUDENT_ID");

    let response = app
        .oneshot(Request::get("/api/relationships").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["relationships"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn status_reports_the_callers_window() {
    let (_dir, app) = test_app();

    app.clone().oneshot(ask_request("tab-9", "q")).await.unwrap();

    let response = app
        .oneshot(
            Request::get("/api/status")
                .header(SESSION_HEADER, "tab-9")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["rate_window"]["requests_in_window"], 1);
    assert_eq!(body["rate_window"]["max_requests"], 15);
    assert_eq!(body["active_sessions"], 1);
}

#[tokio::test]
async fn index_page_renders() {
    let (_dir, app) = test_app();

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let page = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(page.contains("Limit: 15 requests per 60 seconds."));
}

#[tokio::test]
async fn embedded_assets_are_served() {
    let (_dir, app) = test_app();

    let response = app
        .clone()
        .oneshot(Request::get("/static/app.js").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::get("/static/missing.js").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
