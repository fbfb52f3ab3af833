use serde::Serialize;

use crate::llm::{FailureKind, LlmError};

/// Marker that prefixes every failure text shown in place of SQL.
pub const ERROR_SENTINEL: &str = "❌";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenerationFailure {
    pub kind: FailureKind,
    /// Raw text of the underlying error
    pub detail: String,
}

impl GenerationFailure {
    pub fn from_error(err: &LlmError) -> Self {
        Self {
            kind: err.classify(),
            detail: err.to_string(),
        }
    }

    /// Sentinel-prefixed message for display layers.
    pub fn message(&self) -> String {
        match self.kind {
            FailureKind::QuotaExceeded => format!(
                "{} Rate limit exceeded. Please wait a minute and try again.",
                ERROR_SENTINEL
            ),
            FailureKind::AuthInvalid => format!(
                "{} API key invalid or billing not enabled. Please check your API project.",
                ERROR_SENTINEL
            ),
            FailureKind::Other => format!("{} Error: {}", ERROR_SENTINEL, self.detail),
        }
    }
}

/// Outcome of turning one question into SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum Translation {
    Sql(String),
    Failed(GenerationFailure),
}

impl Translation {
    pub fn sql(&self) -> Option<&str> {
        match self {
            Translation::Sql(sql) => Some(sql),
            Translation::Failed(_) => None,
        }
    }

    /// What a display shows in the "generated SQL" slot.
    pub fn display_text(&self) -> String {
        match self {
            Translation::Sql(sql) => sql.clone(),
            Translation::Failed(failure) => failure.message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_messages_carry_the_sentinel() {
        let quota = GenerationFailure::from_error(&LlmError::ResponseError("429 quota exceeded".into()));
        assert!(quota.message().starts_with(ERROR_SENTINEL));
        assert!(quota.message().contains("Rate limit exceeded"));

        let auth = GenerationFailure::from_error(&LlmError::StatusError {
            status: 403,
            body: String::new(),
        });
        assert!(auth.message().contains("API key invalid"));

        let other = GenerationFailure::from_error(&LlmError::ConnectionError("dns failure".into()));
        assert_eq!(other.message(), "❌ Error: LLM connection error: dns failure");
    }

    #[test]
    fn only_sql_exposes_sql() {
        let ok = Translation::Sql("SELECT 1;".into());
        assert_eq!(ok.sql(), Some("SELECT 1;"));
        assert_eq!(ok.display_text(), "SELECT 1;");

        let failed = Translation::Failed(GenerationFailure {
            kind: FailureKind::Other,
            detail: "boom".into(),
        });
        assert_eq!(failed.sql(), None);
        assert!(failed.display_text().starts_with(ERROR_SENTINEL));
    }
}
