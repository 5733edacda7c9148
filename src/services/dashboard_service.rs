use serde::Serialize;
use sqlx::PgPool;

use crate::auth::DataScope;
use crate::error::ApiError;
use crate::filter::{Filter, FilterValue};
use crate::types::OrderStatus;

#[derive(Debug, Default, Serialize)]
pub struct OrderCounts {
    pub total: i64,
    pub pending: i64,
    pub processing: i64,
    pub fulfilled: i64,
    pub cancelled: i64,
}

#[derive(Debug, Default, Serialize)]
pub struct DashboardStats {
    pub doctors: i64,
    pub active_doctors: i64,
    pub patients: i64,
    pub prescriptions: i64,
    pub orders: OrderCounts,
}

pub struct DashboardService {
    pool: PgPool,
}

impl DashboardService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Counts over the rows the caller is allowed to see
    pub async fn stats(&self, scope: &DataScope) -> Result<DashboardStats, ApiError> {
        let doctors = self.team_count("doctors", scope, None).await?;
        let active_doctors = self.team_count("doctors", scope, Some(("is_active", true.into()))).await?;

        let mut patients = Filter::new("patients")?;
        patients.scope_district(scope, "district_id")?;
        let patients = patients.count(&self.pool).await?;

        let prescriptions = self.team_count("prescriptions", scope, None).await?;

        let mut orders = OrderCounts::default();
        for status in OrderStatus::ALL {
            let count = self
                .team_count("orders", scope, Some(("status", status.as_str().into())))
                .await?;
            match status {
                OrderStatus::Pending => orders.pending = count,
                OrderStatus::Processing => orders.processing = count,
                OrderStatus::Fulfilled => orders.fulfilled = count,
                OrderStatus::Cancelled => orders.cancelled = count,
            }
            orders.total += count;
        }

        Ok(DashboardStats {
            doctors,
            active_doctors,
            patients,
            prescriptions,
            orders,
        })
    }

    async fn team_count(
        &self,
        table: &str,
        scope: &DataScope,
        condition: Option<(&str, FilterValue)>,
    ) -> Result<i64, ApiError> {
        let mut filter = Filter::new(table)?;
        if let Some((column, value)) = condition {
            filter.where_eq(column, value)?;
        }
        filter.scope_team(scope)?;
        Ok(filter.count(&self.pool).await?)
    }
}
