use axum::extract::State;

use crate::database::models::{Distributor, DistributorInput};
use crate::filter::{FilterData, Page};
use crate::middleware::{ApiResponse, ApiResult, IdPath, JsonBody, QueryParams};
use crate::services::{DistributorFilters, DistributorService};
use crate::state::AppState;

/// GET /api/distributors - List distributors, optionally `?city_id=`
pub async fn list(
    State(state): State<AppState>,
    QueryParams(data): QueryParams<FilterData>,
    QueryParams(filters): QueryParams<DistributorFilters>,
) -> ApiResult<Page<Distributor>> {
    let page = DistributorService::new(state.pool.clone())
        .list(data, filters, &state.config.api)
        .await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/distributors/:id
pub async fn show(State(state): State<AppState>, IdPath(id): IdPath) -> ApiResult<Distributor> {
    let distributor = DistributorService::new(state.pool.clone()).get(id).await?;
    Ok(ApiResponse::success(distributor))
}

/// POST /api/distributors
pub async fn create(State(state): State<AppState>, JsonBody(input): JsonBody<DistributorInput>) -> ApiResult<Distributor> {
    let distributor = DistributorService::new(state.pool.clone()).create(input).await?;
    Ok(ApiResponse::created(distributor))
}

/// PUT /api/distributors/:id
pub async fn update(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    JsonBody(input): JsonBody<DistributorInput>,
) -> ApiResult<Distributor> {
    let distributor = DistributorService::new(state.pool.clone()).update(id, input).await?;
    Ok(ApiResponse::success(distributor))
}

/// DELETE /api/distributors/:id
pub async fn delete(State(state): State<AppState>, IdPath(id): IdPath) -> ApiResult<Distributor> {
    let distributor = DistributorService::new(state.pool.clone()).delete(id).await?;
    Ok(ApiResponse::success(distributor))
}
