use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::static_files::static_handler;
use super::state::AppState;

// UI Routes - web interface
pub fn ui_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::ui::index_handler))
        .route("/static/{*path}", get(static_handler))
}

// API Routes - JSON access for the page and for scripts
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new().nest(
        "/api",
        Router::new()
            .route("/ask", post(handlers::api::ask))
            // Read-only catalog views
            .route("/schema", get(handlers::api::get_schema))
            .route("/relationships", get(handlers::api::get_relationships))
            .route("/status", get(handlers::api::system_status)),
    )
}
