//! Resource services: pre-save checks, scope enforcement and SQL for each `/api/*` resource.
//!
//! Handlers stay thin and call into these. Every service works on a cloned `PgPool` and
//! returns `ApiError` directly so rule violations carry their HTTP status.

pub mod auth_service;
pub mod banner_service;
pub mod city_service;
pub mod dashboard_service;
pub mod distributor_service;
pub mod district_service;
pub mod doctor_service;
pub mod order_service;
pub mod patient_service;
pub mod prescription_service;
pub mod product_service;
pub mod team_service;
pub mod user_service;

pub use auth_service::{AuthService, LoginRequest, LoginResponse};
pub use banner_service::{BannerFilters, BannerService};
pub use city_service::{CityFilters, CityService};
pub use dashboard_service::{DashboardService, DashboardStats};
pub use distributor_service::{DistributorFilters, DistributorService};
pub use district_service::{DistrictFilters, DistrictService};
pub use doctor_service::{DoctorFilters, DoctorService};
pub use order_service::{BulkSyncReport, OrderFilters, OrderService, OrderSyncOutcome};
pub use patient_service::{PatientFilters, PatientService};
pub use prescription_service::{PrescriptionFilters, PrescriptionService};
pub use product_service::{ProductFilters, ProductService};
pub use team_service::{TeamFilters, TeamService};
pub use user_service::{UserFilters, UserService};

use sqlx::PgPool;
use uuid::Uuid;

use crate::database::repository::count_references;
use crate::error::ApiError;

/// 400 unless `id` names an existing row of `table`
pub(crate) async fn ensure_reference(pool: &PgPool, table: &'static str, field: &str, id: Uuid) -> Result<(), ApiError> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM \"{}\" WHERE id = $1)", table);
    let found: bool = sqlx::query_scalar(&sql).bind(id).fetch_one(pool).await?;
    if found {
        Ok(())
    } else {
        Err(ApiError::field(field, format!("{field} does not reference an existing record")))
    }
}

/// A dependent table checked before delete: `(table, column, plural noun)`
pub(crate) type Dependent = (&'static str, &'static str, &'static str);

/// 400 while any dependent row still points at `id`
pub(crate) async fn ensure_unreferenced(pool: &PgPool, label: &str, id: Uuid, dependents: &[Dependent]) -> Result<(), ApiError> {
    ensure_detached(pool, &format!("delete {label}"), id, dependents).await
}

/// 400 naming `action` while any dependent row still points at `id`
pub(crate) async fn ensure_detached(pool: &PgPool, action: &str, id: Uuid, dependents: &[Dependent]) -> Result<(), ApiError> {
    for (table, column, noun) in dependents {
        let count = count_references(pool, table, column, id).await?;
        if count > 0 {
            return Err(ApiError::bad_request(format!(
                "Cannot {action}: still referenced by {count} {noun}"
            )));
        }
    }
    Ok(())
}
