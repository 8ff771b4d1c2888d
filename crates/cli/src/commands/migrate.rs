use crate::commands::CommandResult;
use posty_core::config::{AppConfig, LoadOptions};
use posty_db::{connect, migrations};

type StepFailure = (&'static str, String, u8);

/// Bring the dialogue schema up to date against the configured database.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "migrate",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "migrate",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    match runtime.block_on(apply_schema(&config)) {
        Ok(applied) => CommandResult::success(
            "migrate",
            format!(
                "dialogue schema is current at `{}` ({applied} migration step(s) recorded)",
                config.database.url
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}

async fn apply_schema(config: &AppConfig) -> Result<i64, StepFailure> {
    let pool = connect(&config.database).await.map_err(|error| {
        ("db_connectivity", format!("cannot open `{}`: {error}", config.database.url), 4u8)
    })?;

    migrations::run_pending(&pool)
        .await
        .map_err(|error| ("migration", format!("schema update stopped: {error}"), 5u8))?;

    let applied = migrations::applied_count(&pool)
        .await
        .map_err(|error| ("migration", format!("schema bookkeeping lookup failed: {error}"), 5u8))?;

    pool.close().await;
    Ok(applied)
}
