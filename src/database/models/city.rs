use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct City {
    pub id: Uuid,
    pub name: String,
    pub district_id: Uuid,
    pub distributor_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CityInput {
    pub name: Option<String>,
    pub district_id: Option<Uuid>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub distributor_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}
