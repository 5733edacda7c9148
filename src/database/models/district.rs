use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct District {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub kam_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for create (name and code required) and update (all optional)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DistrictInput {
    pub name: Option<String>,
    pub code: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub kam_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}
