use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{DashboardService, DashboardStats};
use crate::state::AppState;

/// GET /api/dashboard/stats - Counts over the caller's visible rows
pub async fn stats(State(state): State<AppState>, auth: AuthUser) -> ApiResult<DashboardStats> {
    let scope = auth.scope()?;
    let stats = DashboardService::new(state.pool.clone()).stats(&scope).await?;
    Ok(ApiResponse::success(stats))
}
