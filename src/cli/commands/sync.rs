use anyhow::Context;
use clap::Subcommand;

use crate::auth::DataScope;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::services::{BulkSyncReport, OrderService, ProductService};
use crate::state::AppState;

#[derive(Subcommand)]
pub enum SyncCommands {
    #[command(about = "Refresh every open order from Shopify")]
    Orders,

    #[command(about = "Refresh every linked product from Shopify")]
    Products,
}

pub async fn handle(cmd: SyncCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let state = AppState::from_config(config.clone()).context("failed to build application state")?;

    let (label, report): (&str, BulkSyncReport) = match cmd {
        SyncCommands::Orders => (
            "orders",
            OrderService::new(state.pool.clone(), state.shopify.clone())
                .sync_all(&DataScope::All)
                .await?,
        ),
        SyncCommands::Products => (
            "products",
            ProductService::new(state.pool.clone(), state.shopify.clone())
                .sync_all()
                .await?,
        ),
    };

    output_format.emit(&report, || {
        format!(
            "Synced {} of {} {} ({} failed)",
            report.synced, report.total, label, report.failed
        )
    })
}
