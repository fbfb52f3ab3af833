use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::executor::ExecutionResult;
use crate::db::QueryRunner;
use crate::llm::models::{GenerationFailure, Translation};
use crate::llm::translator::QueryTranslator;
use crate::rate_limit::{RateDecision, RatePolicy, RateWindowState};

/// What one submitted question turned into.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AskOutcome {
    EmptyQuestion,
    /// Refused by the gate; nothing was sent.
    RateLimited { reason: String },
    /// The model call failed; nothing was executed.
    GenerationFailed {
        failure: GenerationFailure,
        message: String,
    },
    Executed { sql: String, result: ExecutionResult },
}

/// Gate, translate, execute.
pub struct Pipeline {
    translator: QueryTranslator,
    runner: Arc<dyn QueryRunner>,
    policy: RatePolicy,
}

impl Pipeline {
    pub fn new(translator: QueryTranslator, runner: Arc<dyn QueryRunner>, policy: RatePolicy) -> Self {
        Self {
            translator,
            runner,
            policy,
        }
    }

    pub fn policy(&self) -> &RatePolicy {
        &self.policy
    }

    /// Runs one question through the whole flow against `window`.
    ///
    /// Hold the session lock guarding `window` for the whole call.
    pub async fn ask(&self, window: &mut RateWindowState, question: &str) -> AskOutcome {
        let question = question.trim();
        if question.is_empty() {
            return AskOutcome::EmptyQuestion;
        }

        if let RateDecision::Denied(denial) = window.check(&self.policy) {
            warn!("Rate limit: {}", denial);
            return AskOutcome::RateLimited {
                reason: denial.to_string(),
            };
        }

        match self.translator.generate_sql(window, question).await {
            Translation::Sql(sql) => {
                let result = self.runner.run(&sql).await;
                info!("Question answered: {:?}", question);
                AskOutcome::Executed { sql, result }
            }
            Translation::Failed(failure) => AskOutcome::GenerationFailed {
                message: failure.message(),
                failure,
            },
        }
    }
}
