pub mod executor;
pub mod introspect;
pub mod seed;

use async_trait::async_trait;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;

use self::executor::ExecutionResult;
use self::introspect::{RelationshipEdge, TableDescriptor};

/// Runs generated SQL. Only ever handed SQL that came out of a successful
/// translation.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    async fn run(&self, sql: &str) -> ExecutionResult;
}

/// The database file plus a process-wide gate.
///
/// DuckDB refuses a second database instance on a file that is already open,
/// so every per-call connection is opened while holding `gate`.
#[derive(Clone)]
pub struct Database {
    path: PathBuf,
    gate: Arc<Mutex<()>>,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn execute(&self, sql: &str) -> ExecutionResult {
        let _guard = self.gate.lock().await;
        let path = self.path.clone();
        let sql = sql.to_string();

        tokio::task::spawn_blocking(move || executor::execute(&sql, &path))
            .await
            .unwrap_or_else(|join_err| {
                error!("Task join error: {}", join_err);
                ExecutionResult::Failed {
                    message: format!("Database task execution failed: {}", join_err),
                }
            })
    }

    pub async fn describe_schema(
        &self,
    ) -> Result<IndexMap<String, TableDescriptor>, Box<dyn std::error::Error + Send + Sync>> {
        let _guard = self.gate.lock().await;
        let path = self.path.clone();
        let schema = tokio::task::spawn_blocking(move || introspect::describe_schema(&path)).await??;
        Ok(schema)
    }

    pub async fn list_relationships(
        &self,
    ) -> Result<Vec<RelationshipEdge>, Box<dyn std::error::Error + Send + Sync>> {
        let _guard = self.gate.lock().await;
        let path = self.path.clone();
        let edges = tokio::task::spawn_blocking(move || introspect::list_relationships(&path)).await??;
        Ok(edges)
    }
}

#[async_trait]
impl QueryRunner for Database {
    async fn run(&self, sql: &str) -> ExecutionResult {
        self.execute(sql).await
    }
}

