use anyhow::{bail, Context};
use clap::Subcommand;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::models::UserInput;
use crate::database::DatabaseManager;
use crate::services::{AuthService, UserService};
use crate::types::Role;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a super-admin account")]
    CreateAdmin {
        #[arg(long, help = "Display name")]
        name: String,
        #[arg(long, help = "Login email")]
        email: String,
        #[arg(long, help = "Initial password")]
        password: String,
    },

    #[command(about = "Print a bearer token for an existing account")]
    Token {
        #[arg(long, help = "Login email")]
        email: String,
    },
}

pub async fn handle(cmd: UserCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect_lazy(&config.database).context("invalid database configuration")?;
    let users = UserService::new(pool);

    match cmd {
        UserCommands::CreateAdmin { name, email, password } => {
            let user = users
                .create(UserInput {
                    name: Some(name),
                    email: Some(email),
                    password: Some(password),
                    role: Some(Role::SuperAdmin),
                    ..Default::default()
                })
                .await?;
            output_format.emit(&user, || format!("Created super admin {} ({})", user.email, user.id))
        }
        UserCommands::Token { email } => {
            let Some(user) = users.find_by_email(&email).await? else {
                bail!("no account with email {}", email);
            };
            if !user.is_active {
                bail!("account {} is deactivated", user.email);
            }
            let token = AuthService::issue_token(&user, &config.security)?;
            output_format.emit(&json!({ "token": token, "user": user }), || token.clone())
        }
    }
}
