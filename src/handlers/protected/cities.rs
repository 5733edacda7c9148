use axum::extract::State;

use crate::database::models::{City, CityInput};
use crate::filter::{FilterData, Page};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, IdPath, JsonBody, QueryParams};
use crate::services::{CityFilters, CityService};
use crate::state::AppState;

/// GET /api/cities - List cities, optionally `?district_id=`
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(data): QueryParams<FilterData>,
    QueryParams(filters): QueryParams<CityFilters>,
) -> ApiResult<Page<City>> {
    let scope = auth.scope()?;
    let page = CityService::new(state.pool.clone())
        .list(&scope, data, filters, &state.config.api)
        .await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/cities/:id
pub async fn show(State(state): State<AppState>, auth: AuthUser, IdPath(id): IdPath) -> ApiResult<City> {
    let scope = auth.scope()?;
    let city = CityService::new(state.pool.clone()).get(&scope, id).await?;
    Ok(ApiResponse::success(city))
}

/// POST /api/cities - Names are unique regardless of case
pub async fn create(State(state): State<AppState>, JsonBody(input): JsonBody<CityInput>) -> ApiResult<City> {
    let city = CityService::new(state.pool.clone()).create(input).await?;
    Ok(ApiResponse::created(city))
}

/// PUT /api/cities/:id
pub async fn update(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    JsonBody(input): JsonBody<CityInput>,
) -> ApiResult<City> {
    let city = CityService::new(state.pool.clone()).update(id, input).await?;
    Ok(ApiResponse::success(city))
}

/// DELETE /api/cities/:id
pub async fn delete(State(state): State<AppState>, IdPath(id): IdPath) -> ApiResult<City> {
    let city = CityService::new(state.pool.clone()).delete(id).await?;
    Ok(ApiResponse::success(city))
}
