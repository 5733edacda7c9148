use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::ensure_reference;
use crate::auth::DataScope;
use crate::config::ApiConfig;
use crate::database::models::{City, CityInput};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::{Filter, FilterData, Page};
use crate::validation::{self, MAX_NAME_LEN};

const SEARCHABLE: &[&str] = &["name"];
const SORTABLE: &[&str] = &["name", "created_at", "updated_at"];

pub const DUPLICATE_CITY: &str = "City with this name already exists";

#[derive(Debug, Default, Deserialize)]
pub struct CityFilters {
    pub district_id: Option<Uuid>,
    pub distributor_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

pub struct CityService {
    repo: Repository<City>,
}

impl CityService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new("cities", "City", pool),
        }
    }

    pub async fn list(
        &self,
        scope: &DataScope,
        data: FilterData,
        filters: CityFilters,
        api: &ApiConfig,
    ) -> Result<Page<City>, ApiError> {
        let mut filter = Filter::new("cities")?;
        filter.assign(data, SEARCHABLE, SORTABLE, api)?;
        filter
            .where_eq_opt("district_id", filters.district_id)?
            .where_eq_opt("distributor_id", filters.distributor_id)?
            .where_eq_opt("is_active", filters.is_active)?;
        filter.scope_district(scope, "district_id")?;
        Ok(filter.fetch_page(self.repo.pool()).await?)
    }

    pub async fn get(&self, scope: &DataScope, id: Uuid) -> Result<City, ApiError> {
        let city = self.repo.select_404(id).await?;
        scope.ensure_district(Some(city.district_id))?;
        Ok(city)
    }

    pub async fn create(&self, input: CityInput) -> Result<City, ApiError> {
        let name = validation::required_text(&validation::required(input.name, "name")?, "name", MAX_NAME_LEN)?;
        let district_id = validation::required(input.district_id, "district_id")?;
        let distributor_id = input.distributor_id.flatten();

        self.ensure_name_free(&name, None).await?;
        ensure_reference(self.repo.pool(), "districts", "district_id", district_id).await?;
        if let Some(distributor_id) = distributor_id {
            ensure_reference(self.repo.pool(), "distributors", "distributor_id", distributor_id).await?;
        }

        let city = sqlx::query_as::<_, City>(
            "INSERT INTO cities (name, district_id, distributor_id, is_active) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(&name)
        .bind(district_id)
        .bind(distributor_id)
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(self.repo.pool())
        .await?;

        Ok(city)
    }

    pub async fn update(&self, id: Uuid, input: CityInput) -> Result<City, ApiError> {
        let current = self.repo.select_404(id).await?;

        let name = match input.name {
            Some(name) => {
                let name = validation::required_text(&name, "name", MAX_NAME_LEN)?;
                self.ensure_name_free(&name, Some(id)).await?;
                name
            }
            None => current.name,
        };
        let district_id = match input.district_id {
            Some(district_id) => {
                ensure_reference(self.repo.pool(), "districts", "district_id", district_id).await?;
                district_id
            }
            None => current.district_id,
        };
        let distributor_id = match input.distributor_id {
            Some(Some(distributor_id)) => {
                ensure_reference(self.repo.pool(), "distributors", "distributor_id", distributor_id).await?;
                Some(distributor_id)
            }
            Some(None) => None,
            None => current.distributor_id,
        };

        let city = sqlx::query_as::<_, City>(
            "UPDATE cities SET name = $2, district_id = $3, distributor_id = $4, is_active = $5, updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&name)
        .bind(district_id)
        .bind(distributor_id)
        .bind(input.is_active.unwrap_or(current.is_active))
        .fetch_one(self.repo.pool())
        .await?;

        Ok(city)
    }

    /// Distributors pointing at the city are unlinked by the foreign key
    pub async fn delete(&self, id: Uuid) -> Result<City, ApiError> {
        Ok(self.repo.delete_404(id).await?)
    }

    async fn ensure_name_free(&self, name: &str, exclude: Option<Uuid>) -> Result<(), ApiError> {
        if self.repo.is_taken("name", name, exclude).await? {
            return Err(ApiError::bad_request(DUPLICATE_CITY));
        }
        Ok(())
    }
}
