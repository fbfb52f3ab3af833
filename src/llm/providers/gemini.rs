use crate::config::LlmConfig;
use crate::llm::providers::{build_client, check_status};
use crate::llm::{LlmError, TextGenerator};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Generative Language API (`models/{model}:generateContent`).
pub struct GeminiProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize, Debug)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize, Debug)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<Content>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

impl GeminiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            LlmError::ConfigError(
                "API key is required for the gemini backend (set GOOGLE_API_KEY)".to_string(),
            )
        })?;

        let api_url = config
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Ok(Self {
            client: build_client(config.timeout_secs)?,
            api_url,
            api_key,
            model: config.model.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }
}

fn response_text(response: GenerateResponse) -> Result<String, LlmError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::ResponseError("No candidates in response".to_string()))?;

    let text: String = candidate
        .content
        .map(|content| content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(LlmError::ResponseError(format!(
            "Empty candidate (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(text)
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        info!("Sending request to Gemini with model: {}", self.model);
        let endpoint = self.endpoint();
        debug!("API URL: {}", endpoint);

        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig { temperature: 0.1 },
        };

        let response = self
            .client
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::ConnectionError(e.to_string()))?;

        let response = check_status("Gemini", response).await?;

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ResponseError(e.to_string()))?;

        response_text(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LlmConfig {
        LlmConfig {
            api_key: Some("test-key".to_string()),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let config = LlmConfig::default();
        assert!(matches!(
            GeminiProvider::new(&LlmConfig { api_key: None, ..config }),
            Err(LlmError::ConfigError(_))
        ));
    }

    #[test]
    fn endpoint_includes_model() {
        let provider = GeminiProvider::new(&LlmConfig {
            api_url: Some("http://localhost:9999/v1beta/".to_string()),
            ..config()
        })
        .unwrap();
        assert_eq!(
            provider.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-1.5-flash-8b:generateContent"
        );
    }

    #[test]
    fn joins_candidate_parts() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"SELECT COUNT(*) "},{"text":"FROM STUDENT;"}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(response_text(body).unwrap(), "SELECT COUNT(*) FROM STUDENT;");
    }

    #[test]
    fn blocked_candidate_is_an_error() {
        let body: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        let err = response_text(body).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));

        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(response_text(empty).is_err());
    }
}
