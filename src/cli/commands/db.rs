use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::DatabaseManager;

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Apply pending migrations")]
    Migrate,

    #[command(about = "Check that the database is reachable")]
    Ping,
}

pub async fn handle(cmd: DbCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect_lazy(&config.database).context("invalid database configuration")?;

    match cmd {
        DbCommands::Migrate => {
            DatabaseManager::migrate(&pool).await.context("migration failed")?;
            output_format.emit(&json!({ "migrated": true }), || "Migrations applied".to_string())
        }
        DbCommands::Ping => {
            DatabaseManager::health_check(&pool)
                .await
                .context("database unreachable")?;
            output_format.emit(&json!({ "database": "ok" }), || "Database OK".to_string())
        }
    }
}
