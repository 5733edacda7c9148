use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::ensure_reference;
use crate::config::ApiConfig;
use crate::database::models::{Distributor, DistributorInput};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::{Filter, FilterData, Page};
use crate::validation::{self, MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN};

const SEARCHABLE: &[&str] = &["name", "contact_person", "phone", "email"];
const SORTABLE: &[&str] = &["name", "contact_person", "created_at", "updated_at"];

#[derive(Debug, Default, Deserialize)]
pub struct DistributorFilters {
    pub city_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

pub struct DistributorService {
    repo: Repository<Distributor>,
}

impl DistributorService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new("distributors", "Distributor", pool),
        }
    }

    pub async fn list(&self, data: FilterData, filters: DistributorFilters, api: &ApiConfig) -> Result<Page<Distributor>, ApiError> {
        let mut filter = Filter::new("distributors")?;
        filter.assign(data, SEARCHABLE, SORTABLE, api)?;
        filter
            .where_eq_opt("city_id", filters.city_id)?
            .where_eq_opt("is_active", filters.is_active)?;
        Ok(filter.fetch_page(self.repo.pool()).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Distributor, ApiError> {
        Ok(self.repo.select_404(id).await?)
    }

    pub async fn create(&self, input: DistributorInput) -> Result<Distributor, ApiError> {
        let name = validation::required_text(&validation::required(input.name, "name")?, "name", MAX_NAME_LEN)?;
        let contact_person = validation::optional_text(input.contact_person.as_deref(), "contact_person", MAX_NAME_LEN)?;
        let phone = validation::optional_text(input.phone.as_deref(), "phone", MAX_SHORT_TEXT_LEN)?;
        let email = validation::optional_email(input.email.as_deref(), "email")?;
        let address = validation::optional_text(input.address.as_deref(), "address", MAX_ADDRESS_LEN)?;
        let city_id = input.city_id.flatten();
        if let Some(city_id) = city_id {
            ensure_reference(self.repo.pool(), "cities", "city_id", city_id).await?;
        }

        let distributor = sqlx::query_as::<_, Distributor>(
            "INSERT INTO distributors (name, contact_person, phone, email, address, city_id, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(&name)
        .bind(contact_person)
        .bind(phone)
        .bind(email)
        .bind(address)
        .bind(city_id)
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(self.repo.pool())
        .await?;

        Ok(distributor)
    }

    pub async fn update(&self, id: Uuid, input: DistributorInput) -> Result<Distributor, ApiError> {
        let current = self.repo.select_404(id).await?;

        let name = match input.name {
            Some(name) => validation::required_text(&name, "name", MAX_NAME_LEN)?,
            None => current.name,
        };
        let contact_person = validation::merge_text(input.contact_person, current.contact_person, "contact_person", MAX_NAME_LEN)?;
        let phone = validation::merge_text(input.phone, current.phone, "phone", MAX_SHORT_TEXT_LEN)?;
        let email = match input.email {
            Some(email) => validation::optional_email(Some(&email), "email")?,
            None => current.email,
        };
        let address = validation::merge_text(input.address, current.address, "address", MAX_ADDRESS_LEN)?;
        let city_id = match input.city_id {
            Some(Some(city_id)) => {
                ensure_reference(self.repo.pool(), "cities", "city_id", city_id).await?;
                Some(city_id)
            }
            Some(None) => None,
            None => current.city_id,
        };

        let distributor = sqlx::query_as::<_, Distributor>(
            "UPDATE distributors SET name = $2, contact_person = $3, phone = $4, email = $5, address = $6, \
             city_id = $7, is_active = $8, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&name)
        .bind(contact_person)
        .bind(phone)
        .bind(email)
        .bind(address)
        .bind(city_id)
        .bind(input.is_active.unwrap_or(current.is_active))
        .fetch_one(self.repo.pool())
        .await?;

        Ok(distributor)
    }

    pub async fn delete(&self, id: Uuid) -> Result<Distributor, ApiError> {
        Ok(self.repo.delete_404(id).await?)
    }
}
