use axum::extract::State;

use crate::database::models::{District, DistrictInput};
use crate::filter::{FilterData, Page};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, IdPath, JsonBody, QueryParams};
use crate::services::{DistrictFilters, DistrictService};
use crate::state::AppState;

/// GET /api/districts - List districts; KAMs only see their own
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(data): QueryParams<FilterData>,
    QueryParams(filters): QueryParams<DistrictFilters>,
) -> ApiResult<Page<District>> {
    let scope = auth.scope()?;
    let page = DistrictService::new(state.pool.clone())
        .list(&scope, data, filters, &state.config.api)
        .await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/districts/:id
pub async fn show(State(state): State<AppState>, auth: AuthUser, IdPath(id): IdPath) -> ApiResult<District> {
    let scope = auth.scope()?;
    let district = DistrictService::new(state.pool.clone()).get(&scope, id).await?;
    Ok(ApiResponse::success(district))
}

/// POST /api/districts - Create a district (code is stored uppercase)
pub async fn create(State(state): State<AppState>, JsonBody(input): JsonBody<DistrictInput>) -> ApiResult<District> {
    let district = DistrictService::new(state.pool.clone()).create(input).await?;
    Ok(ApiResponse::created(district))
}

/// PUT /api/districts/:id
pub async fn update(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    JsonBody(input): JsonBody<DistrictInput>,
) -> ApiResult<District> {
    let district = DistrictService::new(state.pool.clone()).update(id, input).await?;
    Ok(ApiResponse::success(district))
}

/// DELETE /api/districts/:id - Refused while cities, teams or doctors reference it
pub async fn delete(State(state): State<AppState>, IdPath(id): IdPath) -> ApiResult<District> {
    let district = DistrictService::new(state.pool.clone()).delete(id).await?;
    Ok(ApiResponse::success(district))
}
