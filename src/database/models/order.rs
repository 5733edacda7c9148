use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::OrderStatus;

/// Local mirror of a Shopify order with patient/doctor snapshots taken at import
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub shopify_order_id: i64,
    pub order_number: Option<String>,
    pub prescription_id: Option<Uuid>,
    pub patient: Option<Value>,
    pub doctor: Option<Value>,
    pub district_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub total_price: Decimal,
    pub currency: String,
    pub financial_status: Option<String>,
    pub fulfillment_status: Option<String>,
    pub status: OrderStatus,
    pub line_items: Value,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderImport {
    pub shopify_order_id: i64,
    pub prescription_id: Option<Uuid>,
}
