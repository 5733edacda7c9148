use axum::extract::State;

use crate::database::models::{Banner, BannerInput};
use crate::filter::{FilterData, Page};
use crate::middleware::{ApiResponse, ApiResult, IdPath, JsonBody, QueryParams};
use crate::services::{BannerFilters, BannerService};
use crate::state::AppState;

/// GET /api/banners - `?active=true` for the banners currently shown
pub async fn list(
    State(state): State<AppState>,
    QueryParams(data): QueryParams<FilterData>,
    QueryParams(filters): QueryParams<BannerFilters>,
) -> ApiResult<Page<Banner>> {
    let page = BannerService::new(state.pool.clone())
        .list(data, filters, &state.config.api)
        .await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/banners/:id
pub async fn show(State(state): State<AppState>, IdPath(id): IdPath) -> ApiResult<Banner> {
    let banner = BannerService::new(state.pool.clone()).get(id).await?;
    Ok(ApiResponse::success(banner))
}

/// POST /api/banners - `image_url` points at an already uploaded image
pub async fn create(State(state): State<AppState>, JsonBody(input): JsonBody<BannerInput>) -> ApiResult<Banner> {
    let banner = BannerService::new(state.pool.clone()).create(input).await?;
    Ok(ApiResponse::created(banner))
}

/// PUT /api/banners/:id
pub async fn update(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    JsonBody(input): JsonBody<BannerInput>,
) -> ApiResult<Banner> {
    let banner = BannerService::new(state.pool.clone()).update(id, input).await?;
    Ok(ApiResponse::success(banner))
}

/// DELETE /api/banners/:id
pub async fn delete(State(state): State<AppState>, IdPath(id): IdPath) -> ApiResult<Banner> {
    let banner = BannerService::new(state.pool.clone()).delete(id).await?;
    Ok(ApiResponse::success(banner))
}
