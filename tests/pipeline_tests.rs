use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use nl2sql::db::executor::{CellValue, ExecutionResult};
use nl2sql::db::seed::{seed_database, SeedOptions};
use nl2sql::db::{Database, QueryRunner};
use nl2sql::llm::models::ERROR_SENTINEL;
use nl2sql::llm::translator::QueryTranslator;
use nl2sql::llm::{FailureKind, LlmError, TextGenerator};
use nl2sql::pipeline::{AskOutcome, Pipeline};
use nl2sql::rate_limit::{RatePolicy, RateWindowState};

/// Replies with fixed SQL and remembers every prompt it saw.
struct FixedSql {
    sql: String,
    prompts: Mutex<Vec<String>>,
}

impl FixedSql {
    fn new(sql: &str) -> Arc<Self> {
        Arc::new(Self {
            sql: sql.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for FixedSql {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(format!("  {}\n", self.sql))
    }
}

struct Failing(fn() -> LlmError);

#[async_trait]
impl TextGenerator for Failing {
    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        Err((self.0)())
    }
}

#[derive(Default)]
struct CountingRunner {
    runs: AtomicUsize,
}

#[async_trait]
impl QueryRunner for CountingRunner {
    async fn run(&self, _sql: &str) -> ExecutionResult {
        self.runs.fetch_add(1, Ordering::SeqCst);
        ExecutionResult::Rows(Default::default())
    }
}

fn seeded_database() -> (TempDir, Database) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("student.db");
    seed_database(&path, &SeedOptions { rng_seed: Some(1) }).unwrap();
    (dir, Database::new(path))
}

fn pipeline(generator: Arc<dyn TextGenerator>, runner: Arc<dyn QueryRunner>) -> Pipeline {
    let translator = QueryTranslator::new(generator, "TEMPLATE");
    Pipeline::new(translator, runner, RatePolicy::default())
}

#[tokio::test]
async fn counts_students_end_to_end() {
    let (_dir, database) = seeded_database();
    let generator = FixedSql::new("SELECT COUNT(*) FROM STUDENT;");
    let pipeline = pipeline(generator.clone(), Arc::new(database));

    let mut window = RateWindowState::new();
    let outcome = pipeline.ask(&mut window, "  How many students are there?  ").await;

    match outcome {
        AskOutcome::Executed { sql, result } => {
            assert_eq!(sql, "SELECT COUNT(*) FROM STUDENT;");
            assert_eq!(result.rows(), vec![vec![CellValue::Integer(15)]]);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let prompts = generator.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0], "TEMPLATE\n\nQuestion: How many students are there?");
    assert_eq!(window.history().len(), 1);
}

#[tokio::test]
async fn invalid_sql_comes_back_as_error_row() {
    let (_dir, database) = seeded_database();
    let pipeline = pipeline(FixedSql::new("SELEKT * FROM STUDENT"), Arc::new(database));

    let mut window = RateWindowState::new();
    match pipeline.ask(&mut window, "broken").await {
        AskOutcome::Executed { result, .. } => {
            assert!(result.is_failure());
            let rows = result.rows();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0][0], CellValue::Text("Error".to_string()));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn full_window_refuses_without_calling_out() {
    let generator = FixedSql::new("SELECT 1");
    let runner = Arc::new(CountingRunner::default());
    let pipeline = pipeline(generator.clone(), runner.clone());

    // Fifteen calls, 3.5 s apart, ending 10 s ago.
    let now = Utc::now();
    let mut window = RateWindowState::new();
    for i in (0..15).rev() {
        window.record_at(now - TimeDelta::seconds(10) - TimeDelta::milliseconds(3500 * i));
    }

    match pipeline.ask(&mut window, "one more").await {
        AskOutcome::RateLimited { reason } => {
            assert_eq!(
                reason,
                "Rate limit exceeded. Please wait a minute before making another request."
            );
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    assert_eq!(generator.calls(), 0);
    assert_eq!(runner.runs.load(Ordering::SeqCst), 0);
    assert_eq!(window.history().len(), 15);
}

#[tokio::test]
async fn second_question_too_soon_is_refused() {
    let generator = FixedSql::new("SELECT 1");
    let runner = Arc::new(CountingRunner::default());
    let pipeline = pipeline(generator.clone(), runner.clone());

    let mut window = RateWindowState::new();
    assert!(matches!(
        pipeline.ask(&mut window, "first").await,
        AskOutcome::Executed { .. }
    ));

    match pipeline.ask(&mut window, "second").await {
        AskOutcome::RateLimited { reason } => {
            assert!(reason.starts_with("Please wait "), "{}", reason);
            assert!(reason.ends_with(" seconds before making another request."));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    assert_eq!(generator.calls(), 1);
    assert_eq!(runner.runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn quota_failure_is_reported_and_nothing_runs() {
    let runner = Arc::new(CountingRunner::default());
    let generator = Arc::new(Failing(|| {
        LlmError::ResponseError("429 quota exceeded".to_string())
    }));
    let pipeline = pipeline(generator, runner.clone());

    let mut window = RateWindowState::new();
    match pipeline.ask(&mut window, "anything").await {
        AskOutcome::GenerationFailed { failure, message } => {
            assert_eq!(failure.kind, FailureKind::QuotaExceeded);
            assert!(message.starts_with(ERROR_SENTINEL));
            assert!(message.contains("Rate limit exceeded"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    assert_eq!(runner.runs.load(Ordering::SeqCst), 0);
    assert!(window.history().is_empty());
    assert!(window.last_call().is_none());
}

#[tokio::test]
async fn auth_failure_from_status_code() {
    let runner = Arc::new(CountingRunner::default());
    let generator = Arc::new(Failing(|| LlmError::StatusError {
        status: 403,
        body: "PERMISSION_DENIED".to_string(),
    }));
    let pipeline = pipeline(generator, runner.clone());

    let mut window = RateWindowState::new();
    match pipeline.ask(&mut window, "anything").await {
        AskOutcome::GenerationFailed { failure, message } => {
            assert_eq!(failure.kind, FailureKind::AuthInvalid);
            assert_eq!(
                message,
                "❌ API key invalid or billing not enabled. Please check your API project."
            );
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(runner.runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn blank_question_never_reaches_the_gate() {
    let generator = FixedSql::new("SELECT 1");
    let runner = Arc::new(CountingRunner::default());
    let pipeline = pipeline(generator.clone(), runner.clone());

    let mut window = RateWindowState::new();
    assert_eq!(pipeline.ask(&mut window, "   ").await, AskOutcome::EmptyQuestion);
    assert_eq!(generator.calls(), 0);
    assert!(window.last_call().is_none());
}
