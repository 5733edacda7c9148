use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::user_service::UserService;
use crate::auth::{generate_jwt, verify_password, Claims};
use crate::config::SecurityConfig;
use crate::database::models::User;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

pub struct AuthService {
    users: UserService,
}

impl AuthService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserService::new(pool),
        }
    }

    /// Unknown email and wrong password are indistinguishable to the caller
    pub async fn login(&self, request: LoginRequest, security: &SecurityConfig) -> Result<LoginResponse, ApiError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(ApiError::bad_request("Email and password are required"));
        }

        let user = match self.users.find_by_email(&request.email).await? {
            Some(user) if verify_password(&request.password, &user.password_hash) => user,
            _ => {
                tracing::warn!("Failed login for {}", request.email.trim());
                return Err(ApiError::unauthorized("Invalid email or password"));
            }
        };

        if !user.is_active {
            tracing::warn!("Login refused for inactive user {}", user.email);
            return Err(ApiError::forbidden("Account is deactivated"));
        }

        let token = Self::issue_token(&user, security)?;
        tracing::info!("User {} logged in as {}", user.email, user.role);
        Ok(LoginResponse { token, user })
    }

    /// Sign a token carrying the user's role and placement
    pub fn issue_token(user: &User, security: &SecurityConfig) -> Result<String, ApiError> {
        let claims = Claims::new(
            user.id,
            user.email.clone(),
            user.role,
            user.district_id,
            user.team_id,
            security.jwt_expiry_hours,
        );
        Ok(generate_jwt(&claims, &security.jwt_secret)?)
    }

    /// The stored record behind a token; deleted users get 401
    pub async fn me(&self, user_id: Uuid) -> Result<User, ApiError> {
        self.users.get(user_id).await.map_err(|e| match e {
            ApiError::NotFound(_) => ApiError::unauthorized("User no longer exists"),
            other => other,
        })
    }
}
