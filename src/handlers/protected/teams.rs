use axum::extract::State;

use crate::database::models::{Team, TeamInput};
use crate::filter::{FilterData, Page};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, IdPath, JsonBody, QueryParams};
use crate::services::{TeamFilters, TeamService};
use crate::state::AppState;

/// GET /api/teams - List teams, optionally `?district_id=`
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(data): QueryParams<FilterData>,
    QueryParams(filters): QueryParams<TeamFilters>,
) -> ApiResult<Page<Team>> {
    let scope = auth.scope()?;
    let page = TeamService::new(state.pool.clone())
        .list(&scope, data, filters, &state.config.api)
        .await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/teams/:id
pub async fn show(State(state): State<AppState>, auth: AuthUser, IdPath(id): IdPath) -> ApiResult<Team> {
    let scope = auth.scope()?;
    let team = TeamService::new(state.pool.clone()).get(&scope, id).await?;
    Ok(ApiResponse::success(team))
}

/// POST /api/teams
pub async fn create(State(state): State<AppState>, JsonBody(input): JsonBody<TeamInput>) -> ApiResult<Team> {
    let team = TeamService::new(state.pool.clone()).create(input).await?;
    Ok(ApiResponse::created(team))
}

/// PUT /api/teams/:id
pub async fn update(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    JsonBody(input): JsonBody<TeamInput>,
) -> ApiResult<Team> {
    let team = TeamService::new(state.pool.clone()).update(id, input).await?;
    Ok(ApiResponse::success(team))
}

/// DELETE /api/teams/:id
pub async fn delete(State(state): State<AppState>, IdPath(id): IdPath) -> ApiResult<Team> {
    let team = TeamService::new(state.pool.clone()).delete(id).await?;
    Ok(ApiResponse::success(team))
}
