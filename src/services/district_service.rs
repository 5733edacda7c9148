use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ensure_unreferenced, Dependent};
use crate::auth::DataScope;
use crate::config::ApiConfig;
use crate::database::models::{District, DistrictInput, User};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::{Filter, FilterData, Page};
use crate::types::Role;
use crate::validation::{self, MAX_NAME_LEN};

const SEARCHABLE: &[&str] = &["name", "code"];
const SORTABLE: &[&str] = &["name", "code", "created_at", "updated_at"];
const DEPENDENTS: &[Dependent] = &[
    ("cities", "district_id", "cities"),
    ("teams", "district_id", "teams"),
    ("doctors", "district_id", "doctors"),
];

#[derive(Debug, Default, Deserialize)]
pub struct DistrictFilters {
    pub is_active: Option<bool>,
}

pub struct DistrictService {
    repo: Repository<District>,
}

impl DistrictService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new("districts", "District", pool),
        }
    }

    /// KAMs only ever see their own district
    pub async fn list(
        &self,
        scope: &DataScope,
        data: FilterData,
        filters: DistrictFilters,
        api: &ApiConfig,
    ) -> Result<Page<District>, ApiError> {
        let mut filter = Filter::new("districts")?;
        filter.assign(data, SEARCHABLE, SORTABLE, api)?;
        filter.where_eq_opt("is_active", filters.is_active)?;
        filter.scope_district(scope, "id")?;
        Ok(filter.fetch_page(self.repo.pool()).await?)
    }

    pub async fn get(&self, scope: &DataScope, id: Uuid) -> Result<District, ApiError> {
        let district = self.repo.select_404(id).await?;
        scope.ensure_district(Some(district.id))?;
        Ok(district)
    }

    pub async fn create(&self, input: DistrictInput) -> Result<District, ApiError> {
        let name = validation::required_text(&validation::required(input.name, "name")?, "name", MAX_NAME_LEN)?;
        let code = validation::code(&validation::required(input.code, "code")?, "code")?;
        let kam_id = input.kam_id.flatten();

        self.ensure_code_free(&code, None).await?;
        if let Some(kam_id) = kam_id {
            self.ensure_kam(kam_id).await?;
        }

        let district = sqlx::query_as::<_, District>(
            "INSERT INTO districts (name, code, kam_id, is_active) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&name)
        .bind(&code)
        .bind(kam_id)
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(self.repo.pool())
        .await?;

        tracing::info!("Created district {} ({})", district.code, district.id);
        Ok(district)
    }

    pub async fn update(&self, id: Uuid, input: DistrictInput) -> Result<District, ApiError> {
        let current = self.repo.select_404(id).await?;

        let name = match input.name {
            Some(name) => validation::required_text(&name, "name", MAX_NAME_LEN)?,
            None => current.name,
        };
        let code = match input.code {
            Some(code) => {
                let code = validation::code(&code, "code")?;
                self.ensure_code_free(&code, Some(id)).await?;
                code
            }
            None => current.code,
        };
        let kam_id = match input.kam_id {
            Some(Some(kam_id)) => {
                self.ensure_kam(kam_id).await?;
                Some(kam_id)
            }
            Some(None) => None,
            None => current.kam_id,
        };

        let district = sqlx::query_as::<_, District>(
            "UPDATE districts SET name = $2, code = $3, kam_id = $4, is_active = $5, updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&name)
        .bind(&code)
        .bind(kam_id)
        .bind(input.is_active.unwrap_or(current.is_active))
        .fetch_one(self.repo.pool())
        .await?;

        Ok(district)
    }

    pub async fn delete(&self, id: Uuid) -> Result<District, ApiError> {
        self.repo.select_404(id).await?;
        ensure_unreferenced(self.repo.pool(), "district", id, DEPENDENTS).await?;

        let district = self.repo.delete_404(id).await?;
        tracing::info!("Deleted district {} ({})", district.code, district.id);
        Ok(district)
    }

    async fn ensure_code_free(&self, code: &str, exclude: Option<Uuid>) -> Result<(), ApiError> {
        if self.repo.is_taken("code", code, exclude).await? {
            return Err(ApiError::bad_request("District with this code already exists"));
        }
        Ok(())
    }

    async fn ensure_kam(&self, user_id: Uuid) -> Result<(), ApiError> {
        let users = Repository::<User>::new("users", "User", self.repo.pool().clone());
        match users.select_one(user_id).await? {
            Some(user) if user.role == Role::Kam => Ok(()),
            Some(_) => Err(ApiError::field("kam_id", "kam_id must reference a KAM user")),
            None => Err(ApiError::field("kam_id", "kam_id does not reference an existing record")),
        }
    }
}
