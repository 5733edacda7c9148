use axum::extract::State;

use crate::database::models::{Doctor, DoctorInput};
use crate::filter::{FilterData, Page};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, IdPath, JsonBody, QueryParams};
use crate::services::{DoctorFilters, DoctorService};
use crate::state::AppState;

/// GET /api/doctors - List doctors; KAMs see their district and team only
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(data): QueryParams<FilterData>,
    QueryParams(filters): QueryParams<DoctorFilters>,
) -> ApiResult<Page<Doctor>> {
    let scope = auth.scope()?;
    let page = DoctorService::new(state.pool.clone())
        .list(&scope, data, filters, &state.config.api)
        .await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/doctors/:id - 403 outside the caller's scope
pub async fn show(State(state): State<AppState>, auth: AuthUser, IdPath(id): IdPath) -> ApiResult<Doctor> {
    let scope = auth.scope()?;
    let doctor = DoctorService::new(state.pool.clone()).get(&scope, id).await?;
    Ok(ApiResponse::success(doctor))
}

/// POST /api/doctors - `kam_id` is assigned from the district+team's active KAM
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(input): JsonBody<DoctorInput>,
) -> ApiResult<Doctor> {
    let scope = auth.scope()?;
    let doctor = DoctorService::new(state.pool.clone()).create(&scope, input).await?;
    Ok(ApiResponse::created(doctor))
}

/// PUT /api/doctors/:id
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
    JsonBody(input): JsonBody<DoctorInput>,
) -> ApiResult<Doctor> {
    let scope = auth.scope()?;
    let doctor = DoctorService::new(state.pool.clone()).update(&scope, id, input).await?;
    Ok(ApiResponse::success(doctor))
}

/// PATCH /api/doctors/:id/toggle-status - Flip `is_active`
pub async fn toggle_status(State(state): State<AppState>, auth: AuthUser, IdPath(id): IdPath) -> ApiResult<Doctor> {
    let scope = auth.scope()?;
    let doctor = DoctorService::new(state.pool.clone()).toggle_status(&scope, id).await?;
    Ok(ApiResponse::success(doctor))
}

/// DELETE /api/doctors/:id - super_admin only
pub async fn delete(State(state): State<AppState>, IdPath(id): IdPath) -> ApiResult<Doctor> {
    let doctor = DoctorService::new(state.pool.clone()).delete(id).await?;
    Ok(ApiResponse::success(doctor))
}
