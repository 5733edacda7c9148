use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::{OrderStatus, Priority};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Prescription {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub district_id: Uuid,
    pub team_id: Uuid,
    pub product_id: Option<Uuid>,
    pub quantity: i32,
    pub priority: Priority,
    pub order_status: OrderStatus,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// District and team are never accepted from the body; they follow the doctor
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrescriptionInput {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub product_id: Option<Option<Uuid>>,
    pub quantity: Option<i32>,
    pub priority: Option<Priority>,
    pub order_status: Option<OrderStatus>,
    pub notes: Option<String>,
}
