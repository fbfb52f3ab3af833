pub mod models;
pub mod prompt;
pub mod providers;
pub mod translator;

use crate::config::LlmConfig;
use async_trait::async_trait;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
pub enum LlmError {
    ConnectionError(String),
    ResponseError(String),
    ConfigError(String),
    /// The endpoint answered with a non-success HTTP status.
    StatusError { status: u16, body: String },
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::ConnectionError(msg) => write!(f, "LLM connection error: {}", msg),
            LlmError::ResponseError(msg) => write!(f, "LLM response error: {}", msg),
            LlmError::ConfigError(msg) => write!(f, "LLM configuration error: {}", msg),
            LlmError::StatusError { status, body } => {
                write!(f, "LLM API responded with status code: {}", status)?;
                if !body.is_empty() {
                    write!(f, " - Response body: {}", body)?;
                }
                Ok(())
            }
        }
    }
}

impl Error for LlmError {}

/// Coarse class of a failed generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    QuotaExceeded,
    AuthInvalid,
    Other,
}

impl LlmError {
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::StatusError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classifies by HTTP status when the client saw one, otherwise by the
    /// error text ("429"/"quota" and "403").
    pub fn classify(&self) -> FailureKind {
        match self.status() {
            Some(429) => return FailureKind::QuotaExceeded,
            Some(403) => return FailureKind::AuthInvalid,
            _ => {}
        }

        let text = self.to_string();
        if text.contains("429") || text.to_lowercase().contains("quota") {
            FailureKind::QuotaExceeded
        } else if text.contains("403") {
            FailureKind::AuthInvalid
        } else {
            FailureKind::Other
        }
    }
}

/// The external text-generation call: one prompt in, free text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

pub struct LlmManager {
    generator: Arc<dyn TextGenerator>,
}

impl LlmManager {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let generator: Arc<dyn TextGenerator> = match config.backend.as_str() {
            "gemini" => Arc::new(providers::gemini::GeminiProvider::new(config)?),
            "remote" => Arc::new(providers::remote::RemoteLlmProvider::new(config)?),
            "ollama" => Arc::new(providers::ollama::OllamaProvider::new(config)?),
            _ => {
                return Err(LlmError::ConfigError(format!(
                    "Unsupported LLM backend: {}",
                    config.backend
                )))
            }
        };

        Ok(Self { generator })
    }

    pub fn generator(&self) -> Arc<dyn TextGenerator> {
        Arc::clone(&self.generator)
    }
}
