use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
};
use minijinja::context;
use std::sync::Arc;

use crate::llm::prompt::PROMPT_VERSION;
use crate::web::state::AppState;
use crate::web::templates::render_template;

// Main UI entry point
pub async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let limits = &state.config.rate_limit;
    let ctx = context! {
        version => env!("CARGO_PKG_VERSION"),
        prompt_version => PROMPT_VERSION,
        database => state.config.database.path.clone(),
        max_requests => limits.max_requests,
        window_secs => limits.window_secs,
        min_interval_secs => limits.min_interval_secs,
    };

    match render_template(&state.template_env, "index.html", ctx) {
        Ok(page) => Html(page).into_response(),
        Err(message) => {
            let page = render_template(&state.template_env, "error.html", context! { message => message.clone() })
                .unwrap_or(message);
            (StatusCode::INTERNAL_SERVER_ERROR, Html(page)).into_response()
        }
    }
}
