use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use posty_agent::{LlmDrafter, LlmExtractor, OpenAiClient};
use posty_core::config::{AppConfig, ConfigError, LoadOptions};
use posty_core::{DialogueEngine, EngineDeps};
use posty_db::{
    connect, migrations, DbPool, SqlSenderRegistry, SqlSessionStore, SqlSupplierDirectory,
};

use crate::mailer::WebhookMailer;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub engine: Arc<DialogueEngine>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("outbound client setup failed: {0}")]
    Client(#[source] anyhow::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let llm_client =
        Arc::new(OpenAiClient::from_config(&config.llm).map_err(BootstrapError::Client)?);
    let mailer = WebhookMailer::new(&config.mailer).map_err(BootstrapError::Client)?;

    let engine = Arc::new(DialogueEngine::new(
        EngineDeps {
            directory: Arc::new(SqlSupplierDirectory::new(db_pool.clone())),
            senders: Arc::new(SqlSenderRegistry::new(db_pool.clone())),
            sessions: Arc::new(SqlSessionStore::new(db_pool.clone())),
            transport: Arc::new(mailer),
            extractor: Arc::new(LlmExtractor::new(llm_client.clone())),
            drafter: Arc::new(LlmDrafter::new(llm_client)),
        },
        config.mailer.account.clone(),
    ));

    Ok(Application { config, db_pool, engine })
}
