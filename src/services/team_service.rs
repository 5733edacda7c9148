use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ensure_detached, ensure_reference, ensure_unreferenced, Dependent};
use crate::auth::DataScope;
use crate::config::ApiConfig;
use crate::database::models::{Team, TeamInput};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::{Filter, FilterData, Page};
use crate::validation::{self, MAX_NAME_LEN};

const SEARCHABLE: &[&str] = &["name"];
const SORTABLE: &[&str] = &["name", "created_at", "updated_at"];
const DEPENDENTS: &[Dependent] = &[
    ("doctors", "team_id", "doctors"),
    ("prescriptions", "team_id", "prescriptions"),
];
/// Rows that carry the team's district alongside the team
const PLACED: &[Dependent] = &[
    ("users", "team_id", "users"),
    ("doctors", "team_id", "doctors"),
    ("prescriptions", "team_id", "prescriptions"),
    ("orders", "team_id", "orders"),
];

#[derive(Debug, Default, Deserialize)]
pub struct TeamFilters {
    pub district_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

pub struct TeamService {
    repo: Repository<Team>,
}

impl TeamService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new("teams", "Team", pool),
        }
    }

    pub async fn list(
        &self,
        scope: &DataScope,
        data: FilterData,
        filters: TeamFilters,
        api: &ApiConfig,
    ) -> Result<Page<Team>, ApiError> {
        let mut filter = Filter::new("teams")?;
        filter.assign(data, SEARCHABLE, SORTABLE, api)?;
        filter
            .where_eq_opt("district_id", filters.district_id)?
            .where_eq_opt("is_active", filters.is_active)?;
        filter.scope_district(scope, "district_id")?;
        Ok(filter.fetch_page(self.repo.pool()).await?)
    }

    pub async fn get(&self, scope: &DataScope, id: Uuid) -> Result<Team, ApiError> {
        let team = self.repo.select_404(id).await?;
        scope.ensure_district(Some(team.district_id))?;
        Ok(team)
    }

    pub async fn create(&self, input: TeamInput) -> Result<Team, ApiError> {
        let name = validation::required_text(&validation::required(input.name, "name")?, "name", MAX_NAME_LEN)?;
        let district_id = validation::required(input.district_id, "district_id")?;

        ensure_reference(self.repo.pool(), "districts", "district_id", district_id).await?;
        self.ensure_name_free(district_id, &name, None).await?;

        let team = sqlx::query_as::<_, Team>(
            "INSERT INTO teams (name, district_id, is_active) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&name)
        .bind(district_id)
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(self.repo.pool())
        .await?;

        Ok(team)
    }

    pub async fn update(&self, id: Uuid, input: TeamInput) -> Result<Team, ApiError> {
        let current = self.repo.select_404(id).await?;

        let name = match input.name {
            Some(name) => validation::required_text(&name, "name", MAX_NAME_LEN)?,
            None => current.name.clone(),
        };
        let district_id = input.district_id.unwrap_or(current.district_id);
        if district_id != current.district_id {
            ensure_reference(self.repo.pool(), "districts", "district_id", district_id).await?;
            ensure_detached(self.repo.pool(), "move team to another district", id, PLACED).await?;
        }
        if district_id != current.district_id || !name.eq_ignore_ascii_case(&current.name) {
            self.ensure_name_free(district_id, &name, Some(id)).await?;
        }

        let team = sqlx::query_as::<_, Team>(
            "UPDATE teams SET name = $2, district_id = $3, is_active = $4, updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&name)
        .bind(district_id)
        .bind(input.is_active.unwrap_or(current.is_active))
        .fetch_one(self.repo.pool())
        .await?;

        Ok(team)
    }

    pub async fn delete(&self, id: Uuid) -> Result<Team, ApiError> {
        self.repo.select_404(id).await?;
        ensure_unreferenced(self.repo.pool(), "team", id, DEPENDENTS).await?;
        Ok(self.repo.delete_404(id).await?)
    }

    /// 400 unless `team_id` exists and belongs to `district_id`
    pub async fn ensure_in_district(&self, team_id: Uuid, district_id: Uuid) -> Result<Team, ApiError> {
        let team = self
            .repo
            .select_one(team_id)
            .await?
            .ok_or_else(|| ApiError::field("team_id", "team_id does not reference an existing record"))?;

        if team.district_id != district_id {
            return Err(ApiError::field("team_id", "Team does not belong to the selected district"));
        }
        Ok(team)
    }

    async fn ensure_name_free(&self, district_id: Uuid, name: &str, exclude: Option<Uuid>) -> Result<(), ApiError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM teams WHERE district_id = $1 AND lower(name) = lower($2) \
             AND ($3::uuid IS NULL OR id <> $3))",
        )
        .bind(district_id)
        .bind(name)
        .bind(exclude)
        .fetch_one(self.repo.pool())
        .await?;

        if taken {
            return Err(ApiError::bad_request("Team with this name already exists in the district"));
        }
        Ok(())
    }
}
