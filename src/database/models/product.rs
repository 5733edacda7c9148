use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub shopify_product_id: Option<i64>,
    pub shopify_variant_id: Option<i64>,
    pub inventory_quantity: Option<i32>,
    pub is_active: bool,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductInput {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub shopify_product_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub shopify_variant_id: Option<Option<i64>>,
    pub is_active: Option<bool>,
}
