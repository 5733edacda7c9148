use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::team_service::TeamService;
use super::user_service::active_kam;
use super::{ensure_unreferenced, Dependent};
use crate::auth::DataScope;
use crate::config::ApiConfig;
use crate::database::models::{Doctor, DoctorInput};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::{Filter, FilterData, Page};
use crate::validation::{self, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN};

const SEARCHABLE: &[&str] = &["name", "specialty", "phone", "email"];
const SORTABLE: &[&str] = &["name", "specialty", "is_active", "created_at", "updated_at"];
const DEPENDENTS: &[Dependent] = &[("prescriptions", "doctor_id", "prescriptions")];

#[derive(Debug, Default, Deserialize)]
pub struct DoctorFilters {
    pub district_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub kam_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

pub struct DoctorService {
    repo: Repository<Doctor>,
}

impl DoctorService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new("doctors", "Doctor", pool),
        }
    }

    pub async fn list(
        &self,
        scope: &DataScope,
        data: FilterData,
        filters: DoctorFilters,
        api: &ApiConfig,
    ) -> Result<Page<Doctor>, ApiError> {
        let mut filter = Filter::new("doctors")?;
        filter.assign(data, SEARCHABLE, SORTABLE, api)?;
        filter
            .where_eq_opt("district_id", filters.district_id)?
            .where_eq_opt("team_id", filters.team_id)?
            .where_eq_opt("kam_id", filters.kam_id)?
            .where_eq_opt("is_active", filters.is_active)?;
        filter.scope_team(scope)?;
        Ok(filter.fetch_page(self.repo.pool()).await?)
    }

    pub async fn get(&self, scope: &DataScope, id: Uuid) -> Result<Doctor, ApiError> {
        let doctor = self.repo.select_404(id).await?;
        scope.ensure_team(Some(doctor.district_id), Some(doctor.team_id))?;
        Ok(doctor)
    }

    /// A KAM's doctor is always placed in the KAM's own district and team
    pub async fn create(&self, scope: &DataScope, input: DoctorInput) -> Result<Doctor, ApiError> {
        let name = validation::required_text(&validation::required(input.name, "name")?, "name", MAX_NAME_LEN)?;
        let specialty = validation::optional_text(input.specialty.as_deref(), "specialty", MAX_NAME_LEN)?;
        let phone = validation::optional_text(input.phone.as_deref(), "phone", MAX_SHORT_TEXT_LEN)?;
        let email = validation::optional_email(input.email.as_deref(), "email")?;

        let (district_id, team_id) = match scope {
            DataScope::Team { district_id, team_id } => (*district_id, *team_id),
            DataScope::All => (
                validation::required(input.district_id, "district_id")?,
                validation::required(input.team_id, "team_id")?,
            ),
        };
        TeamService::new(self.repo.pool().clone())
            .ensure_in_district(team_id, district_id)
            .await?;
        let kam_id = active_kam(self.repo.pool(), district_id, team_id, None).await?;

        let doctor = sqlx::query_as::<_, Doctor>(
            "INSERT INTO doctors (name, specialty, phone, email, district_id, team_id, kam_id, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(&name)
        .bind(specialty)
        .bind(phone)
        .bind(email)
        .bind(district_id)
        .bind(team_id)
        .bind(kam_id)
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(self.repo.pool())
        .await?;

        tracing::debug!("Created doctor {} with KAM {:?}", doctor.id, doctor.kam_id);
        Ok(doctor)
    }

    /// KAMs cannot move a doctor out of their scope; placement fields from them are ignored
    pub async fn update(&self, scope: &DataScope, id: Uuid, input: DoctorInput) -> Result<Doctor, ApiError> {
        let current = self.get(scope, id).await?;

        let name = match input.name {
            Some(name) => validation::required_text(&name, "name", MAX_NAME_LEN)?,
            None => current.name,
        };
        let specialty = validation::merge_text(input.specialty, current.specialty, "specialty", MAX_NAME_LEN)?;
        let phone = validation::merge_text(input.phone, current.phone, "phone", MAX_SHORT_TEXT_LEN)?;
        let email = match input.email {
            Some(email) => validation::optional_email(Some(&email), "email")?,
            None => current.email,
        };

        let (district_id, team_id) = if scope.is_unrestricted() {
            (
                input.district_id.unwrap_or(current.district_id),
                input.team_id.unwrap_or(current.team_id),
            )
        } else {
            (current.district_id, current.team_id)
        };
        if (district_id, team_id) != (current.district_id, current.team_id) {
            TeamService::new(self.repo.pool().clone())
                .ensure_in_district(team_id, district_id)
                .await?;
        }
        let kam_id = active_kam(self.repo.pool(), district_id, team_id, None).await?;

        let doctor = sqlx::query_as::<_, Doctor>(
            "UPDATE doctors SET name = $2, specialty = $3, phone = $4, email = $5, district_id = $6, \
             team_id = $7, kam_id = $8, is_active = $9, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&name)
        .bind(specialty)
        .bind(phone)
        .bind(email)
        .bind(district_id)
        .bind(team_id)
        .bind(kam_id)
        .bind(input.is_active.unwrap_or(current.is_active))
        .fetch_one(self.repo.pool())
        .await?;

        Ok(doctor)
    }

    /// Flip `is_active`; applying it twice restores the original value
    pub async fn toggle_status(&self, scope: &DataScope, id: Uuid) -> Result<Doctor, ApiError> {
        self.get(scope, id).await?;

        let doctor = sqlx::query_as::<_, Doctor>(
            "UPDATE doctors SET is_active = NOT is_active, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(self.repo.pool())
        .await?;

        tracing::info!("Doctor {} is now {}", doctor.id, if doctor.is_active { "active" } else { "inactive" });
        Ok(doctor)
    }

    pub async fn delete(&self, id: Uuid) -> Result<Doctor, ApiError> {
        self.repo.select_404(id).await?;
        ensure_unreferenced(self.repo.pool(), "doctor", id, DEPENDENTS).await?;
        Ok(self.repo.delete_404(id).await?)
    }
}
