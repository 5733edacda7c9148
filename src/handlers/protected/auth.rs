use axum::extract::State;

use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::AuthService;
use crate::state::AppState;

/// GET /api/auth/me - The stored record of the authenticated user
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<User> {
    let user = AuthService::new(state.pool.clone()).me(auth.user_id).await?;
    Ok(ApiResponse::success(user))
}
