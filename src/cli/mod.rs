pub mod commands;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "pharma")]
#[command(about = "Pharma Admin CLI - server, database and Shopify maintenance tasks")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API server")]
    Serve,

    #[command(about = "Database migrations and connectivity")]
    Db {
        #[command(subcommand)]
        cmd: commands::db::DbCommands,
    },

    #[command(about = "Account bootstrap and token issuing")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "Pull orders and products from Shopify")]
    Sync {
        #[command(subcommand)]
        cmd: commands::sync::SyncCommands,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }

    /// JSON mode prints `value`; text mode prints `text`
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
        match self {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => println!("{}", text()),
        }
        Ok(())
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = crate::config::AppConfig::from_env();

    match cli.command {
        Commands::Serve => commands::server::serve(config).await,
        Commands::Db { cmd } => commands::db::handle(cmd, &config, output_format).await,
        Commands::User { cmd } => commands::user::handle(cmd, &config, output_format).await,
        Commands::Sync { cmd } => commands::sync::handle(cmd, &config, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_create_admin() {
        let cli = Cli::try_parse_from([
            "pharma",
            "--json",
            "user",
            "create-admin",
            "--name",
            "Root",
            "--email",
            "root@example.com",
            "--password",
            "correct-horse",
        ])
        .unwrap();

        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        match cli.command {
            Commands::User {
                cmd: commands::user::UserCommands::CreateAdmin { email, .. },
            } => assert_eq!(email, "root@example.com"),
            _ => panic!("expected user create-admin"),
        }
    }

    #[test]
    fn sync_requires_a_target() {
        assert!(Cli::try_parse_from(["pharma", "sync"]).is_err());
        assert!(Cli::try_parse_from(["pharma", "sync", "orders"]).is_ok());
    }
}
