use axum::extract::State;

use crate::database::models::{Patient, PatientInput};
use crate::filter::{FilterData, Page};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, IdPath, JsonBody, QueryParams};
use crate::services::{PatientFilters, PatientService};
use crate::state::AppState;

/// GET /api/patients - List patients; `?search=` matches name or MRN
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(data): QueryParams<FilterData>,
    QueryParams(filters): QueryParams<PatientFilters>,
) -> ApiResult<Page<Patient>> {
    let scope = auth.scope()?;
    let page = PatientService::new(state.pool.clone())
        .list(&scope, data, filters, &state.config.api)
        .await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/patients/:id
pub async fn show(State(state): State<AppState>, auth: AuthUser, IdPath(id): IdPath) -> ApiResult<Patient> {
    let scope = auth.scope()?;
    let patient = PatientService::new(state.pool.clone()).get(&scope, id).await?;
    Ok(ApiResponse::success(patient))
}

/// POST /api/patients - MRN is unique and stored uppercase
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(input): JsonBody<PatientInput>,
) -> ApiResult<Patient> {
    let scope = auth.scope()?;
    let patient = PatientService::new(state.pool.clone())
        .create(&scope, auth.user_id, input)
        .await?;
    Ok(ApiResponse::created(patient))
}

/// PUT /api/patients/:id
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath,
    JsonBody(input): JsonBody<PatientInput>,
) -> ApiResult<Patient> {
    let scope = auth.scope()?;
    let patient = PatientService::new(state.pool.clone()).update(&scope, id, input).await?;
    Ok(ApiResponse::success(patient))
}

/// DELETE /api/patients/:id - super_admin only
pub async fn delete(State(state): State<AppState>, IdPath(id): IdPath) -> ApiResult<Patient> {
    let patient = PatientService::new(state.pool.clone()).delete(id).await?;
    Ok(ApiResponse::success(patient))
}
