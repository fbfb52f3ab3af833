use minijinja::Environment;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Database;
use crate::llm::translator::QueryTranslator;
use crate::llm::TextGenerator;
use crate::pipeline::Pipeline;
use crate::rate_limit::sessions::SessionRegistry;
use crate::rate_limit::RatePolicy;
use crate::web::templates::init_templates;

/// Shared application state for the web server
pub struct AppState {
    pub config: AppConfig,
    pub database: Database,
    pub pipeline: Pipeline,
    pub sessions: SessionRegistry,
    pub template_env: Environment<'static>,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        generator: Arc<dyn TextGenerator>,
        prompt_template: String,
    ) -> Result<Self, minijinja::Error> {
        let policy = RatePolicy::from(&config.rate_limit);
        let database = Database::new(&config.database.path);
        let translator = QueryTranslator::new(generator, prompt_template);
        let pipeline = Pipeline::new(translator, Arc::new(database.clone()), policy);

        Ok(Self {
            database,
            pipeline,
            sessions: SessionRegistry::new(policy),
            template_env: init_templates()?,
            startup_time: chrono::Utc::now(),
            config,
        })
    }
}
