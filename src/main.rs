use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use nl2sql::config::{AppConfig, CliArgs, Command, LoggingConfig};
use nl2sql::db::executor::{CellValue, ExecutionResult};
use nl2sql::db::seed::{seed_database, SeedOptions};
use nl2sql::db::Database;
use nl2sql::llm::prompt::load_template;
use nl2sql::llm::translator::QueryTranslator;
use nl2sql::llm::LlmManager;
use nl2sql::pipeline::{AskOutcome, Pipeline};
use nl2sql::rate_limit::{RatePolicy, RateWindowState};
use nl2sql::util::logging::init_tracing;
use nl2sql::web;
use nl2sql::web::state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Parse command line arguments
    let args = CliArgs::parse();

    // Load configuration
    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(&LoggingConfig::default());
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    init_tracing(&config.logging);

    match args.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Ask { question } => ask(config, &question).await,
        Command::Schema => schema(config).await,
        Command::Seed { rng_seed } => seed(config, rng_seed).await,
    }
}

async fn serve(config: AppConfig) -> Result<(), BoxError> {
    info!("Initializing LLM manager with backend: {}", config.llm.backend);
    let llm_manager = LlmManager::new(&config.llm)?;
    let template = load_template(&config.prompt)?;

    let web_config = config.web.clone();
    let app_state = Arc::new(AppState::new(config, llm_manager.generator(), template)?);

    info!("Starting NL2SQL server on {}:{}", web_config.host, web_config.port);
    match web::run_server(web_config, app_state).await {
        Ok(_) => info!("Server stopped gracefully"),
        Err(e) => {
            error!("Server error: {}", e);
            return Err(e);
        }
    }

    Ok(())
}

async fn ask(config: AppConfig, question: &str) -> Result<(), BoxError> {
    let llm_manager = LlmManager::new(&config.llm)?;
    let template = load_template(&config.prompt)?;
    let translator = QueryTranslator::new(llm_manager.generator(), template);
    let database = Database::new(&config.database.path);
    let pipeline = Pipeline::new(
        translator,
        Arc::new(database),
        RatePolicy::from(&config.rate_limit),
    );

    let mut window = RateWindowState::new();
    match pipeline.ask(&mut window, question).await {
        AskOutcome::EmptyQuestion => println!("Please enter a question."),
        AskOutcome::RateLimited { reason } => println!("{}", reason),
        AskOutcome::GenerationFailed { message, .. } => println!("{}", message),
        AskOutcome::Executed { sql, result } => {
            println!("{}\n", sql);
            if let ExecutionResult::Rows(set) = &result {
                if !set.columns.is_empty() {
                    println!("{}", set.columns.join(" | "));
                }
            }
            for row in result.rows() {
                println!("{}", format_row(&row));
            }
        }
    }

    Ok(())
}

async fn schema(config: AppConfig) -> Result<(), BoxError> {
    let database = Database::new(&config.database.path);
    let tables = database.describe_schema().await?;

    if tables.is_empty() {
        println!("No tables in {}", config.database.path);
        return Ok(());
    }

    for table in tables.values() {
        println!("{} ({} rows)", table.name, table.row_count);
        for column in &table.columns {
            let mut flags = Vec::new();
            if column.primary_key {
                flags.push("PRIMARY KEY");
            }
            if column.not_null {
                flags.push("NOT NULL");
            }
            if flags.is_empty() {
                println!("  {} {}", column.name, column.data_type);
            } else {
                println!("  {} {} [{}]", column.name, column.data_type, flags.join(", "));
            }
        }
    }

    let relationships = database.list_relationships().await?;
    if !relationships.is_empty() {
        println!("\nRelationships:");
        for edge in relationships {
            println!(
                "  {}.{} -> {}.{}",
                edge.from_table, edge.from_column, edge.to_table, edge.to_column
            );
        }
    }

    Ok(())
}

async fn seed(config: AppConfig, rng_seed: Option<u64>) -> Result<(), BoxError> {
    let path = config.database.path.clone();
    let options = SeedOptions { rng_seed };
    let report = tokio::task::spawn_blocking(move || seed_database(&path, &options)).await??;

    println!("Seeded {}:", config.database.path);
    println!("  DEPARTMENTS  {}", report.departments);
    println!("  INSTRUCTORS  {}", report.instructors);
    println!("  COURSES      {}", report.courses);
    println!("  STUDENT      {}", report.students);
    println!("  ENROLLMENTS  {}", report.enrollments);

    let database = Database::new(&config.database.path);
    let sample = database
        .execute("SELECT STUDENT_ID, NAME, CLASS, SECTION, GPA FROM STUDENT ORDER BY STUDENT_ID LIMIT 5")
        .await;
    println!("\nSample students:");
    for row in sample.rows() {
        println!("  {}", format_row(&row));
    }

    Ok(())
}

fn format_row(row: &[CellValue]) -> String {
    row.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}
