// handlers/protected/users.rs - /api/users (super_admin only)

use axum::extract::State;

use crate::database::models::{User, UserInput};
use crate::filter::{FilterData, Page};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, IdPath, JsonBody, QueryParams};
use crate::services::{UserFilters, UserService};
use crate::state::AppState;

/// GET /api/users - List accounts, filterable by role, district, team and status
pub async fn list(
    State(state): State<AppState>,
    QueryParams(data): QueryParams<FilterData>,
    QueryParams(filters): QueryParams<UserFilters>,
) -> ApiResult<Page<User>> {
    let page = UserService::new(state.pool.clone())
        .list(data, filters, &state.config.api)
        .await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/users/:id
pub async fn show(State(state): State<AppState>, IdPath(id): IdPath) -> ApiResult<User> {
    let user = UserService::new(state.pool.clone()).get(id).await?;
    Ok(ApiResponse::success(user))
}

/// POST /api/users - Create an account; KAMs need a district and a team of that district
pub async fn create(State(state): State<AppState>, JsonBody(input): JsonBody<UserInput>) -> ApiResult<User> {
    let user = UserService::new(state.pool.clone()).create(input).await?;
    Ok(ApiResponse::created(user))
}

/// PUT /api/users/:id - A supplied password is re-hashed
pub async fn update(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    JsonBody(input): JsonBody<UserInput>,
) -> ApiResult<User> {
    let user = UserService::new(state.pool.clone()).update(id, input).await?;
    Ok(ApiResponse::success(user))
}

/// DELETE /api/users/:id
pub async fn delete(State(state): State<AppState>, auth: AuthUser, IdPath(id): IdPath) -> ApiResult<User> {
    let user = UserService::new(state.pool.clone()).delete(id, auth.user_id).await?;
    Ok(ApiResponse::success(user))
}
