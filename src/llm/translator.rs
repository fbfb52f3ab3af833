use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::llm::models::{GenerationFailure, Translation};
use crate::llm::prompt::build_prompt;
use crate::llm::TextGenerator;
use crate::rate_limit::RateWindowState;

/// Turns questions into SQL through the configured text generator.
pub struct QueryTranslator {
    generator: Arc<dyn TextGenerator>,
    template: String,
}

impl QueryTranslator {
    pub fn new(generator: Arc<dyn TextGenerator>, template: impl Into<String>) -> Self {
        Self {
            generator,
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Asks the generator for SQL answering `question`.
    ///
    /// The caller must already have passed the rate gate on `window`. A
    /// successful call is recorded into `window`; failures are not.
    pub async fn generate_sql(&self, window: &mut RateWindowState, question: &str) -> Translation {
        let prompt = build_prompt(&self.template, question);
        debug!("Prompt length: {} chars", prompt.len());

        match self.generator.generate(&prompt).await {
            Ok(text) => {
                window.record();
                let sql = text.trim().to_string();
                info!("Generated SQL: {}", sql);
                Translation::Sql(sql)
            }
            Err(e) => {
                let failure = GenerationFailure::from_error(&e);
                warn!("SQL generation failed ({:?}): {}", failure.kind, e);
                Translation::Failed(failure)
            }
        }
    }
}
