use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ensure_reference, ensure_unreferenced, Dependent};
use crate::auth::DataScope;
use crate::config::ApiConfig;
use crate::database::models::{Patient, PatientInput};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::{Filter, FilterData, Page};
use crate::validation::{self, MAX_ADDRESS_LEN, MAX_CODE_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN};

const SEARCHABLE: &[&str] = &["name", "mrn", "phone"];
const SORTABLE: &[&str] = &["name", "mrn", "age", "created_at", "updated_at"];
const DEPENDENTS: &[Dependent] = &[("prescriptions", "patient_id", "prescriptions")];
const MAX_AGE: i32 = 150;

#[derive(Debug, Default, Deserialize)]
pub struct PatientFilters {
    pub district_id: Option<Uuid>,
    pub gender: Option<String>,
}

pub struct PatientService {
    repo: Repository<Patient>,
}

/// MRNs are trimmed and compared uppercase
fn mrn(value: &str) -> Result<String, ApiError> {
    Ok(validation::required_text(value, "mrn", MAX_CODE_LEN)?.to_uppercase())
}

fn age(value: Option<i32>) -> Result<Option<i32>, ApiError> {
    match value {
        Some(age) if !(0..=MAX_AGE).contains(&age) => {
            Err(ApiError::field("age", format!("age must be between 0 and {MAX_AGE}")))
        }
        other => Ok(other),
    }
}

impl PatientService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new("patients", "Patient", pool),
        }
    }

    pub async fn list(
        &self,
        scope: &DataScope,
        data: FilterData,
        filters: PatientFilters,
        api: &ApiConfig,
    ) -> Result<Page<Patient>, ApiError> {
        let mut filter = Filter::new("patients")?;
        filter.assign(data, SEARCHABLE, SORTABLE, api)?;
        filter
            .where_eq_opt("district_id", filters.district_id)?
            .where_eq_opt("gender", filters.gender)?;
        filter.scope_district(scope, "district_id")?;
        Ok(filter.fetch_page(self.repo.pool()).await?)
    }

    pub async fn get(&self, scope: &DataScope, id: Uuid) -> Result<Patient, ApiError> {
        let patient = self.repo.select_404(id).await?;
        scope.ensure_district(patient.district_id)?;
        Ok(patient)
    }

    pub async fn create(&self, scope: &DataScope, created_by: Uuid, input: PatientInput) -> Result<Patient, ApiError> {
        let mrn = mrn(&validation::required(input.mrn, "mrn")?)?;
        let name = validation::required_text(&validation::required(input.name, "name")?, "name", MAX_NAME_LEN)?;
        let age = age(input.age.flatten())?;
        let gender = validation::optional_text(input.gender.as_deref(), "gender", MAX_SHORT_TEXT_LEN)?;
        let phone = validation::optional_text(input.phone.as_deref(), "phone", MAX_SHORT_TEXT_LEN)?;
        let address = validation::optional_text(input.address.as_deref(), "address", MAX_ADDRESS_LEN)?;

        let district_id = match scope.district_id() {
            Some(own) => Some(own),
            None => input.district_id.flatten(),
        };
        if let (true, Some(district_id)) = (scope.is_unrestricted(), district_id) {
            ensure_reference(self.repo.pool(), "districts", "district_id", district_id).await?;
        }
        self.ensure_mrn_free(&mrn, None).await?;

        let patient = sqlx::query_as::<_, Patient>(
            "INSERT INTO patients (mrn, name, age, gender, phone, address, district_id, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(&mrn)
        .bind(&name)
        .bind(age)
        .bind(gender)
        .bind(phone)
        .bind(address)
        .bind(district_id)
        .bind(created_by)
        .fetch_one(self.repo.pool())
        .await?;

        Ok(patient)
    }

    pub async fn update(&self, scope: &DataScope, id: Uuid, input: PatientInput) -> Result<Patient, ApiError> {
        let current = self.get(scope, id).await?;

        let mrn = match input.mrn {
            Some(value) => {
                let mrn = mrn(&value)?;
                self.ensure_mrn_free(&mrn, Some(id)).await?;
                mrn
            }
            None => current.mrn,
        };
        let name = match input.name {
            Some(name) => validation::required_text(&name, "name", MAX_NAME_LEN)?,
            None => current.name,
        };
        let age = match input.age {
            Some(value) => age(value)?,
            None => current.age,
        };
        let gender = validation::merge_text(input.gender, current.gender, "gender", MAX_SHORT_TEXT_LEN)?;
        let phone = validation::merge_text(input.phone, current.phone, "phone", MAX_SHORT_TEXT_LEN)?;
        let address = validation::merge_text(input.address, current.address, "address", MAX_ADDRESS_LEN)?;

        let district_id = match (scope.is_unrestricted(), input.district_id) {
            (true, Some(Some(district_id))) => {
                ensure_reference(self.repo.pool(), "districts", "district_id", district_id).await?;
                Some(district_id)
            }
            (true, Some(None)) => None,
            _ => current.district_id,
        };

        let patient = sqlx::query_as::<_, Patient>(
            "UPDATE patients SET mrn = $2, name = $3, age = $4, gender = $5, phone = $6, address = $7, \
             district_id = $8, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&mrn)
        .bind(&name)
        .bind(age)
        .bind(gender)
        .bind(phone)
        .bind(address)
        .bind(district_id)
        .fetch_one(self.repo.pool())
        .await?;

        Ok(patient)
    }

    pub async fn delete(&self, id: Uuid) -> Result<Patient, ApiError> {
        self.repo.select_404(id).await?;
        ensure_unreferenced(self.repo.pool(), "patient", id, DEPENDENTS).await?;
        Ok(self.repo.delete_404(id).await?)
    }

    async fn ensure_mrn_free(&self, mrn: &str, exclude: Option<Uuid>) -> Result<(), ApiError> {
        if self.repo.is_taken("mrn", mrn, exclude).await? {
            return Err(ApiError::bad_request("Patient with this MRN already exists"));
        }
        Ok(())
    }
}
