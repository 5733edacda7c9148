use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::Role;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub district_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Plain text; hashed before storage
    pub password: Option<String>,
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub district_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub team_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}
