// handlers/protected/orders.rs - Shopify-backed orders
//
// List and show serve cached rows. Import and sync talk to Shopify.

use axum::extract::State;

use crate::database::models::{Order, OrderImport};
use crate::filter::{FilterData, Page};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, IdPath, JsonBody, QueryParams};
use crate::services::{BulkSyncReport, OrderFilters, OrderService, OrderSyncOutcome};
use crate::state::AppState;

fn service(state: &AppState) -> OrderService {
    OrderService::new(state.pool.clone(), state.shopify.clone())
}

/// GET /api/orders - Cached orders, optionally `?status=`
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(data): QueryParams<FilterData>,
    QueryParams(filters): QueryParams<OrderFilters>,
) -> ApiResult<Page<Order>> {
    let scope = auth.scope()?;
    let page = service(&state).list(&scope, data, filters, &state.config.api).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/orders/:id
pub async fn show(State(state): State<AppState>, auth: AuthUser, IdPath(id): IdPath) -> ApiResult<Order> {
    let scope = auth.scope()?;
    let order = service(&state).get(&scope, id).await?;
    Ok(ApiResponse::success(order))
}

/// POST /api/orders - Import `{ shopify_order_id, prescription_id? }` from Shopify (502 on Shopify failure)
pub async fn import(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(input): JsonBody<OrderImport>,
) -> ApiResult<Order> {
    let scope = auth.scope()?;
    let order = service(&state).import(&scope, input).await?;
    Ok(ApiResponse::created(order))
}

/// POST /api/orders/:id/sync - Refresh one order; Shopify failure returns the cached row with `synced: false`
pub async fn sync(State(state): State<AppState>, auth: AuthUser, IdPath(id): IdPath) -> ApiResult<OrderSyncOutcome> {
    let scope = auth.scope()?;
    let outcome = service(&state).sync_one(&scope, id).await?;
    Ok(ApiResponse::success(outcome))
}

/// POST /api/orders/sync - Refresh every non-terminal order in scope
pub async fn sync_all(State(state): State<AppState>, auth: AuthUser) -> ApiResult<BulkSyncReport> {
    let scope = auth.scope()?;
    let report = service(&state).sync_all(&scope).await?;
    Ok(ApiResponse::success(report))
}

/// DELETE /api/orders/:id - super_admin only
pub async fn delete(State(state): State<AppState>, IdPath(id): IdPath) -> ApiResult<Order> {
    let order = service(&state).delete(id).await?;
    Ok(ApiResponse::success(order))
}
