use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::db::introspect::{RelationshipEdge, TableDescriptor};
use crate::llm::prompt::PROMPT_VERSION;
use crate::pipeline::AskOutcome;
use crate::rate_limit::sessions::ANONYMOUS_SESSION;
use crate::rate_limit::WindowSnapshot;
use crate::web::state::AppState;

pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Debug, Deserialize, Clone)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub tables: IndexMap<String, TableDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct RelationshipsResponse {
    pub relationships: Vec<RelationshipEdge>,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub prompt_version: String,
    pub uptime_seconds: i64,
    pub active_sessions: usize,
    pub rate_window: WindowSnapshot,
}

fn session_key(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .unwrap_or(ANONYMOUS_SESSION)
        .to_string()
}

// Natural language question -> SQL -> rows
pub async fn ask(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<AskRequest>,
) -> Response {
    let session = session_key(&headers);
    debug!("Question from session {}: {}", session, payload.question);

    let window = state.sessions.session(&session);
    let outcome = {
        let mut window = window.lock().await;
        state.pipeline.ask(&mut window, &payload.question).await
    };

    let status = match &outcome {
        AskOutcome::EmptyQuestion => StatusCode::BAD_REQUEST,
        AskOutcome::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        AskOutcome::GenerationFailed { .. } | AskOutcome::Executed { .. } => StatusCode::OK,
    };

    (status, Json(outcome)).into_response()
}

// Schema
pub async fn get_schema(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SchemaResponse>, (StatusCode, String)> {
    let tables = state.database.describe_schema().await.map_err(|e| {
        error!("Failed to describe schema: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, format!("Schema introspection failed: {}", e))
    })?;

    info!("Schema request: {} tables", tables.len());
    Ok(Json(SchemaResponse { tables }))
}

pub async fn get_relationships(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RelationshipsResponse>, (StatusCode, String)> {
    let relationships = state.database.list_relationships().await.map_err(|e| {
        error!("Failed to list relationships: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, format!("Schema introspection failed: {}", e))
    })?;

    Ok(Json(RelationshipsResponse { relationships }))
}

// System status
pub async fn system_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<SystemStatus> {
    let now = chrono::Utc::now();
    let uptime = now.signed_duration_since(state.startup_time).num_seconds();

    let window = state.sessions.session(&session_key(&headers));
    let rate_window = window.lock().await.snapshot_at(now, state.pipeline.policy());

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        prompt_version: PROMPT_VERSION.to_string(),
        uptime_seconds: uptime,
        active_sessions: state.sessions.len(),
        rate_window,
    })
}
