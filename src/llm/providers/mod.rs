pub mod gemini;
pub mod ollama;
pub mod remote;

use crate::llm::LlmError;
use std::time::Duration;
use tracing::error;

pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| LlmError::ConnectionError(e.to_string()))
}

/// Turns a non-success response into `LlmError::StatusError`, keeping the body
/// for diagnostics.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!("{} API responded with status code: {} - {}", provider, status, body);
    Err(LlmError::StatusError {
        status: status.as_u16(),
        body,
    })
}
