use axum::extract::State;

use crate::database::models::{Prescription, PrescriptionInput};
use crate::filter::{FilterData, Page};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, IdPath, JsonBody, QueryParams};
use crate::services::{PrescriptionFilters, PrescriptionService};
use crate::state::AppState;

/// GET /api/prescriptions - Filter by `order_status`, `priority`, `doctor_id`, `patient_id`
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(data): QueryParams<FilterData>,
    QueryParams(filters): QueryParams<PrescriptionFilters>,
) -> ApiResult<Page<Prescription>> {
    let scope = auth.scope()?;
    let page = PrescriptionService::new(state.pool.clone())
        .list(&scope, data, filters, &state.config.api)
        .await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/prescriptions/:id
pub async fn show(State(state): State<AppState>, auth: AuthUser, IdPath(id): IdPath) -> ApiResult<Prescription> {
    let scope = auth.scope()?;
    let prescription = PrescriptionService::new(state.pool.clone()).get(&scope, id).await?;
    Ok(ApiResponse::success(prescription))
}

/// POST /api/prescriptions - District and team follow the doctor
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(input): JsonBody<PrescriptionInput>,
) -> ApiResult<Prescription> {
    let scope = auth.scope()?;
    let prescription = PrescriptionService::new(state.pool.clone())
        .create(&scope, auth.user_id, input)
        .await?;
    Ok(ApiResponse::created(prescription))
}

/// PUT /api/prescriptions/:id
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
    JsonBody(input): JsonBody<PrescriptionInput>,
) -> ApiResult<Prescription> {
    let scope = auth.scope()?;
    let prescription = PrescriptionService::new(state.pool.clone())
        .update(&scope, id, input)
        .await?;
    Ok(ApiResponse::success(prescription))
}

/// DELETE /api/prescriptions/:id - super_admin only
pub async fn delete(State(state): State<AppState>, IdPath(id): IdPath) -> ApiResult<Prescription> {
    let prescription = PrescriptionService::new(state.pool.clone()).delete(id).await?;
    Ok(ApiResponse::success(prescription))
}
