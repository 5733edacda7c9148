use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::ensure_reference;
use crate::auth::DataScope;
use crate::config::ApiConfig;
use crate::database::models::{Doctor, Patient, Prescription, PrescriptionInput};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::{Filter, FilterData, Page};
use crate::types::{OrderStatus, Priority};
use crate::validation::{self, MAX_NOTE_LEN};

const SEARCHABLE: &[&str] = &["notes"];
const SORTABLE: &[&str] = &["priority", "order_status", "quantity", "created_at", "updated_at"];

#[derive(Debug, Default, Deserialize)]
pub struct PrescriptionFilters {
    pub order_status: Option<OrderStatus>,
    pub priority: Option<Priority>,
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
}

pub struct PrescriptionService {
    repo: Repository<Prescription>,
}

fn quantity(value: i32) -> Result<i32, ApiError> {
    if value < 1 {
        return Err(ApiError::field("quantity", "quantity must be at least 1"));
    }
    Ok(value)
}

impl PrescriptionService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: Repository::new("prescriptions", "Prescription", pool),
        }
    }

    pub async fn list(
        &self,
        scope: &DataScope,
        data: FilterData,
        filters: PrescriptionFilters,
        api: &ApiConfig,
    ) -> Result<Page<Prescription>, ApiError> {
        let mut filter = Filter::new("prescriptions")?;
        filter.assign(data, SEARCHABLE, SORTABLE, api)?;
        filter
            .where_eq_opt("order_status", filters.order_status.map(|s| s.as_str()))?
            .where_eq_opt("priority", filters.priority.map(|p| p.as_str()))?
            .where_eq_opt("doctor_id", filters.doctor_id)?
            .where_eq_opt("patient_id", filters.patient_id)?
            .where_eq_opt("product_id", filters.product_id)?;
        filter.scope_team(scope)?;
        Ok(filter.fetch_page(self.repo.pool()).await?)
    }

    pub async fn get(&self, scope: &DataScope, id: Uuid) -> Result<Prescription, ApiError> {
        let prescription = self.repo.select_404(id).await?;
        scope.ensure_team(Some(prescription.district_id), Some(prescription.team_id))?;
        Ok(prescription)
    }

    /// District and team are copied from the prescribing doctor
    pub async fn create(&self, scope: &DataScope, created_by: Uuid, input: PrescriptionInput) -> Result<Prescription, ApiError> {
        let patient_id = validation::required(input.patient_id, "patient_id")?;
        let doctor_id = validation::required(input.doctor_id, "doctor_id")?;
        let quantity = quantity(input.quantity.unwrap_or(1))?;
        let notes = validation::optional_text(input.notes.as_deref(), "notes", MAX_NOTE_LEN)?;
        let product_id = input.product_id.flatten();

        self.load_patient(scope, patient_id).await?;
        let doctor = self.load_doctor(scope, doctor_id).await?;
        if let Some(product_id) = product_id {
            ensure_reference(self.repo.pool(), "products", "product_id", product_id).await?;
        }

        let prescription = sqlx::query_as::<_, Prescription>(
            "INSERT INTO prescriptions (patient_id, doctor_id, district_id, team_id, product_id, quantity, \
             priority, order_status, notes, created_by) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(patient_id)
        .bind(doctor.id)
        .bind(doctor.district_id)
        .bind(doctor.team_id)
        .bind(product_id)
        .bind(quantity)
        .bind(input.priority.unwrap_or_default())
        .bind(input.order_status.unwrap_or_default())
        .bind(notes)
        .bind(created_by)
        .fetch_one(self.repo.pool())
        .await?;

        tracing::debug!("Created prescription {} for doctor {}", prescription.id, doctor.id);
        Ok(prescription)
    }

    pub async fn update(&self, scope: &DataScope, id: Uuid, input: PrescriptionInput) -> Result<Prescription, ApiError> {
        let current = self.get(scope, id).await?;

        let patient_id = match input.patient_id {
            Some(patient_id) if patient_id != current.patient_id => {
                self.load_patient(scope, patient_id).await?;
                patient_id
            }
            _ => current.patient_id,
        };
        let (doctor_id, district_id, team_id) = match input.doctor_id {
            Some(doctor_id) if doctor_id != current.doctor_id => {
                let doctor = self.load_doctor(scope, doctor_id).await?;
                (doctor.id, doctor.district_id, doctor.team_id)
            }
            _ => (current.doctor_id, current.district_id, current.team_id),
        };
        let product_id = match input.product_id {
            Some(Some(product_id)) => {
                ensure_reference(self.repo.pool(), "products", "product_id", product_id).await?;
                Some(product_id)
            }
            Some(None) => None,
            None => current.product_id,
        };
        let quantity = match input.quantity {
            Some(value) => quantity(value)?,
            None => current.quantity,
        };
        let notes = validation::merge_text(input.notes, current.notes, "notes", MAX_NOTE_LEN)?;

        let prescription = sqlx::query_as::<_, Prescription>(
            "UPDATE prescriptions SET patient_id = $2, doctor_id = $3, district_id = $4, team_id = $5, \
             product_id = $6, quantity = $7, priority = $8, order_status = $9, notes = $10, updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(patient_id)
        .bind(doctor_id)
        .bind(district_id)
        .bind(team_id)
        .bind(product_id)
        .bind(quantity)
        .bind(input.priority.unwrap_or(current.priority))
        .bind(input.order_status.unwrap_or(current.order_status))
        .bind(notes)
        .fetch_one(self.repo.pool())
        .await?;

        Ok(prescription)
    }

    /// Orders that referenced the prescription keep their snapshots
    pub async fn delete(&self, id: Uuid) -> Result<Prescription, ApiError> {
        Ok(self.repo.delete_404(id).await?)
    }

    /// Mirror a synced order's status onto its prescription
    pub async fn set_order_status(&self, id: Uuid, status: OrderStatus) -> Result<(), ApiError> {
        sqlx::query(
            "UPDATE prescriptions SET order_status = $2, updated_at = now() \
             WHERE id = $1 AND order_status IS DISTINCT FROM $2",
        )
        .bind(id)
        .bind(status)
        .execute(self.repo.pool())
        .await?;
        Ok(())
    }

    async fn load_patient(&self, scope: &DataScope, patient_id: Uuid) -> Result<Patient, ApiError> {
        let patient = Repository::<Patient>::new("patients", "Patient", self.repo.pool().clone())
            .select_one(patient_id)
            .await?
            .ok_or_else(|| ApiError::field("patient_id", "patient_id does not reference an existing record"))?;
        scope.ensure_district(patient.district_id)?;
        Ok(patient)
    }

    async fn load_doctor(&self, scope: &DataScope, doctor_id: Uuid) -> Result<Doctor, ApiError> {
        let doctor = Repository::<Doctor>::new("doctors", "Doctor", self.repo.pool().clone())
            .select_one(doctor_id)
            .await?
            .ok_or_else(|| ApiError::field("doctor_id", "doctor_id does not reference an existing record"))?;
        scope.ensure_team(Some(doctor.district_id), Some(doctor.team_id))?;
        Ok(doctor)
    }
}
