use clap::{Parser, Subcommand};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path of the DuckDB file holding the school-records tables
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub backend: String, // "gemini", "remote", or "ollama"
    pub model: String,   // Model name
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Calls allowed inside one rolling window
    pub max_requests: usize,
    pub window_secs: u64,
    /// Minimum spacing between two consecutive calls
    pub min_interval_secs: f64,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PromptConfig {
    /// Replaces the built-in prompt template when set
    pub template_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub web: WebConfig,
    pub llm: LlmConfig,
    pub rate_limit: RateLimitConfig,
    pub prompt: PromptConfig,
    pub logging: LoggingConfig,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Database file to query
    #[arg(short, long, value_name = "FILE")]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the web interface (default)
    Serve,
    /// Translate one question, run the SQL and print the rows
    Ask {
        /// The question in plain English
        question: String,
    },
    /// Print tables, columns and relationships of the database
    Schema,
    /// Recreate the school-records tables with sample data
    Seed {
        /// Seed for the enrollment generator
        #[arg(long)]
        rng_seed: Option<u64>,
    },
}

impl AppConfig {
    pub fn new(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config_builder = Config::builder();

        // Add configuration from file if specified
        if let Some(config_path) = &args.config {
            config_builder = config_builder.add_source(File::from(config_path.as_path()));
        } else {
            // Check for config in default locations
            let default_locations = ["config.toml", "config/config.toml", "/etc/nl2sql/config.toml"];

            for location in default_locations {
                if Path::new(location).exists() {
                    config_builder =
                        config_builder.add_source(File::new(location, config::FileFormat::Toml));
                    break;
                }
            }
        }

        // NL2SQL_LLM__API_KEY -> llm.api_key
        config_builder = config_builder.add_source(
            Environment::with_prefix("NL2SQL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: AppConfig = config_builder.build()?.try_deserialize()?;

        if config.llm.api_key.is_none() {
            config.llm.api_key = std::env::var("GOOGLE_API_KEY").ok();
        }

        config.apply_args(args);
        Ok(config)
    }

    /// Command line flags win over every other source.
    pub fn apply_args(&mut self, args: &CliArgs) {
        if let Some(host) = &args.host {
            self.web.host = host.clone();
        }
        if let Some(port) = args.port {
            self.web.port = port;
        }
        if let Some(database) = &args.database {
            self.database.path = database.clone();
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "student.db".to_string(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: "gemini".to_string(),
            model: "gemini-1.5-flash-8b".to_string(),
            api_key: None,
            api_url: None,
            timeout_secs: 60,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 15,
            window_secs: 60,
            min_interval_secs: 4.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["nl2sql"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn defaults_match_free_tier_limits() {
        let config = AppConfig::default();
        assert_eq!(config.database.path, "student.db");
        assert_eq!(config.rate_limit.max_requests, 15);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.rate_limit.min_interval_secs, 4.0);
        assert_eq!(config.llm.backend, "gemini");
    }

    #[test]
    fn cli_flags_override_loaded_values() {
        let mut config = AppConfig::default();
        config.apply_args(&args(&["--port", "8080", "--database", "other.db", "--host", "0.0.0.0"]));
        assert_eq!(config.web.port, 8080);
        assert_eq!(config.web.host, "0.0.0.0");
        assert_eq!(config.database.path, "other.db");
    }

    #[test]
    fn subcommands_parse() {
        let parsed = args(&["ask", "How many students are there?"]);
        match parsed.command {
            Some(Command::Ask { question }) => assert_eq!(question, "How many students are there?"),
            other => panic!("unexpected command: {other:?}"),
        }

        let parsed = args(&["seed", "--rng-seed", "7"]);
        assert!(matches!(parsed.command, Some(Command::Seed { rng_seed: Some(7) })));
        assert!(args(&[]).command.is_none());
    }
}
