use axum::extract::State;

use crate::database::models::{Product, ProductInput};
use crate::filter::{FilterData, Page};
use crate::middleware::{ApiResponse, ApiResult, IdPath, JsonBody, QueryParams};
use crate::services::{BulkSyncReport, ProductFilters, ProductService};
use crate::state::AppState;

fn service(state: &AppState) -> ProductService {
    ProductService::new(state.pool.clone(), state.shopify.clone())
}

/// GET /api/products - `?search=` matches name or SKU
pub async fn list(
    State(state): State<AppState>,
    QueryParams(data): QueryParams<FilterData>,
    QueryParams(filters): QueryParams<ProductFilters>,
) -> ApiResult<Page<Product>> {
    let page = service(&state).list(data, filters, &state.config.api).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/products/:id
pub async fn show(State(state): State<AppState>, IdPath(id): IdPath) -> ApiResult<Product> {
    let product = service(&state).get(id).await?;
    Ok(ApiResponse::success(product))
}

/// POST /api/products - SKU is unique and stored uppercase
pub async fn create(State(state): State<AppState>, JsonBody(input): JsonBody<ProductInput>) -> ApiResult<Product> {
    let product = service(&state).create(input).await?;
    Ok(ApiResponse::created(product))
}

/// PUT /api/products/:id
pub async fn update(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    JsonBody(input): JsonBody<ProductInput>,
) -> ApiResult<Product> {
    let product = service(&state).update(id, input).await?;
    Ok(ApiResponse::success(product))
}

/// DELETE /api/products/:id
pub async fn delete(State(state): State<AppState>, IdPath(id): IdPath) -> ApiResult<Product> {
    let product = service(&state).delete(id).await?;
    Ok(ApiResponse::success(product))
}

/// POST /api/products/:id/sync - Pull price, inventory and status from Shopify
pub async fn sync(State(state): State<AppState>, IdPath(id): IdPath) -> ApiResult<Product> {
    let product = service(&state).sync_one(id).await?;
    Ok(ApiResponse::success(product))
}

/// POST /api/products/sync - Refresh every linked product
pub async fn sync_all(State(state): State<AppState>) -> ApiResult<BulkSyncReport> {
    let report = service(&state).sync_all().await?;
    Ok(ApiResponse::success(report))
}
