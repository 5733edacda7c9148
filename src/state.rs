use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::database::{DatabaseError, DatabaseManager};
use crate::shopify::{ShopifyApi, ShopifyClient, ShopifyError};

/// Shared handles passed to every handler through `State`
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub shopify: Arc<dyn ShopifyApi>,
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Shopify(#[from] ShopifyError),
}

impl AppState {
    pub fn new(pool: PgPool, config: Arc<AppConfig>, shopify: Arc<dyn ShopifyApi>) -> Self {
        Self { pool, config, shopify }
    }

    /// Lazy pool plus the HTTP Shopify client, both built from `config`
    pub fn from_config(config: AppConfig) -> Result<Self, StateError> {
        let pool = DatabaseManager::connect_lazy(&config.database)?;
        let shopify = ShopifyClient::from_config(&config.shopify)?;
        Ok(Self::new(pool, Arc::new(config), Arc::new(shopify)))
    }
}
