pub mod password;
pub mod scope;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use crate::types::Role;
pub use password::{hash_password, verify_password};
pub use scope::DataScope;

/// JWT payload: `{userId, email, role, team_id, district_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub team_id: Option<Uuid>,
    #[serde(default)]
    pub district_id: Option<Uuid>,
    #[serde(default)]
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    /// `expiry_hours == 0` leaves `exp` unset, producing a non-expiring token
    pub fn new(
        user_id: Uuid,
        email: String,
        role: Role,
        district_id: Option<Uuid>,
        team_id: Option<Uuid>,
        expiry_hours: u64,
    ) -> Self {
        let now = Utc::now();
        let exp = (expiry_hours > 0).then(|| (now + Duration::hours(expiry_hours as i64)).timestamp());

        Self {
            user_id,
            email,
            role,
            team_id,
            district_id,
            iat: now.timestamp(),
            exp,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("JWT secret not configured")]
    InvalidSecret,
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Verify signature and decode claims. `exp` is optional but enforced when present.
pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn kam_claims(expiry_hours: u64) -> Claims {
        Claims::new(
            Uuid::new_v4(),
            "kam@example.com".to_string(),
            Role::Kam,
            Some(Uuid::new_v4()),
            Some(Uuid::new_v4()),
            expiry_hours,
        )
    }

    #[test]
    fn round_trips_claims_without_expiry() {
        let claims = kam_claims(0);
        assert!(claims.exp.is_none());

        let token = generate_jwt(&claims, SECRET).unwrap();
        let decoded = validate_jwt(&token, SECRET).unwrap();

        assert_eq!(decoded.user_id, claims.user_id);
        assert_eq!(decoded.role, Role::Kam);
        assert_eq!(decoded.team_id, claims.team_id);
        assert_eq!(decoded.district_id, claims.district_id);
    }

    #[test]
    fn payload_uses_user_id_camel_case() {
        let value = serde_json::to_value(kam_claims(0)).unwrap();
        assert!(value.get("userId").is_some());
        assert!(value.get("team_id").is_some());
        assert!(value.get("exp").is_none());
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = generate_jwt(&kam_claims(0), SECRET).unwrap();
        assert!(matches!(validate_jwt(&token, "other"), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn rejects_expired_token() {
        let mut claims = kam_claims(1);
        claims.exp = Some(Utc::now().timestamp() - 3600);
        let token = generate_jwt(&claims, SECRET).unwrap();
        assert!(validate_jwt(&token, SECRET).is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(generate_jwt(&kam_claims(0), ""), Err(JwtError::InvalidSecret)));
    }
}
