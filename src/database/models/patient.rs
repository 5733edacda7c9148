use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Patient {
    pub id: Uuid,
    /// Medical Record Number
    pub mrn: String,
    pub name: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub district_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientInput {
    pub mrn: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub age: Option<Option<i32>>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub district_id: Option<Option<Uuid>>,
}
