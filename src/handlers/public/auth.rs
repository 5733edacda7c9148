// handlers/public/auth.rs - POST /api/auth/login handler

use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::services::{AuthService, LoginRequest, LoginResponse};
use crate::state::AppState;

/// POST /api/auth/login - Exchange email and password for a bearer token
///
/// Input: `{ "email": "...", "password": "..." }`
///
/// - 400 when the body is missing or malformed
/// - 401 for an unknown email or a wrong password
/// - 403 when the account is deactivated
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let response = AuthService::new(state.pool.clone())
        .login(request, &state.config.security)
        .await?;
    Ok(ApiResponse::success(response))
}
