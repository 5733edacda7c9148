use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use super::prescription_service::PrescriptionService;
use crate::auth::DataScope;
use crate::config::ApiConfig;
use crate::database::models::{Doctor, Order, OrderImport, Patient, Prescription};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::{Filter, FilterData, Page};
use crate::shopify::{ShopifyApi, ShopifyError, ShopifyOrder};
use crate::types::OrderStatus;

const SEARCHABLE: &[&str] = &["order_number", "financial_status", "fulfillment_status"];
const SORTABLE: &[&str] = &["order_number", "total_price", "status", "last_synced_at", "created_at", "updated_at"];

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilters {
    pub status: Option<OrderStatus>,
    pub prescription_id: Option<Uuid>,
}

/// Result of a single-order sync; `synced == false` means the cached row was returned
#[derive(Debug, Serialize)]
pub struct OrderSyncOutcome {
    pub order: Order,
    pub synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkSyncReport {
    pub total: usize,
    pub synced: usize,
    pub failed: usize,
}

pub struct OrderService {
    repo: Repository<Order>,
    shopify: Arc<dyn ShopifyApi>,
}

fn patient_snapshot(patient: &Patient) -> Value {
    json!({
        "id": patient.id,
        "mrn": patient.mrn,
        "name": patient.name,
        "phone": patient.phone,
    })
}

fn doctor_snapshot(doctor: &Doctor) -> Value {
    json!({
        "id": doctor.id,
        "name": doctor.name,
        "specialty": doctor.specialty,
    })
}

fn line_items(remote: &ShopifyOrder) -> Value {
    serde_json::to_value(&remote.line_items).unwrap_or_else(|_| json!([]))
}

impl OrderService {
    pub fn new(pool: PgPool, shopify: Arc<dyn ShopifyApi>) -> Self {
        Self {
            repo: Repository::new("orders", "Order", pool),
            shopify,
        }
    }

    /// Cached rows only; Shopify is not contacted
    pub async fn list(
        &self,
        scope: &DataScope,
        data: FilterData,
        filters: OrderFilters,
        api: &ApiConfig,
    ) -> Result<Page<Order>, ApiError> {
        let mut filter = Filter::new("orders")?;
        filter.assign(data, SEARCHABLE, SORTABLE, api)?;
        filter
            .where_eq_opt("status", filters.status.map(|s| s.as_str()))?
            .where_eq_opt("prescription_id", filters.prescription_id)?;
        filter.scope_team(scope)?;
        Ok(filter.fetch_page(self.repo.pool()).await?)
    }

    pub async fn get(&self, scope: &DataScope, id: Uuid) -> Result<Order, ApiError> {
        let order = self.repo.select_404(id).await?;
        scope.ensure_team(order.district_id, order.team_id)?;
        Ok(order)
    }

    /// Pull a Shopify order into the local store, snapshotting the prescription's patient and doctor
    pub async fn import(&self, scope: &DataScope, input: OrderImport) -> Result<Order, ApiError> {
        if input.shopify_order_id <= 0 {
            return Err(ApiError::field("shopify_order_id", "shopify_order_id must be a positive Shopify id"));
        }
        if self.find_by_shopify_id(input.shopify_order_id).await?.is_some() {
            return Err(ApiError::bad_request("Order has already been imported"));
        }

        let (prescription, patient, doctor) = match input.prescription_id {
            Some(prescription_id) => {
                let prescription = PrescriptionService::new(self.repo.pool().clone())
                    .get(scope, prescription_id)
                    .await?;
                let patient = Repository::<Patient>::new("patients", "Patient", self.repo.pool().clone())
                    .select_one(prescription.patient_id)
                    .await?;
                let doctor = Repository::<Doctor>::new("doctors", "Doctor", self.repo.pool().clone())
                    .select_one(prescription.doctor_id)
                    .await?;
                (Some(prescription), patient, doctor)
            }
            None => (None, None, None),
        };

        let (district_id, team_id) = match (&prescription, scope) {
            (Some(p), _) => (Some(p.district_id), Some(p.team_id)),
            (None, DataScope::Team { district_id, team_id }) => (Some(*district_id), Some(*team_id)),
            (None, DataScope::All) => (None, None),
        };

        let remote = self.shopify.fetch_order(input.shopify_order_id).await?;
        let status = remote.status();

        let order = sqlx::query_as::<_, Order>(
            "INSERT INTO orders (shopify_order_id, order_number, prescription_id, patient, doctor, district_id, \
             team_id, total_price, currency, financial_status, fulfillment_status, status, line_items, last_synced_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, now()) RETURNING *",
        )
        .bind(remote.id)
        .bind(remote.display_number())
        .bind(prescription.as_ref().map(|p| p.id))
        .bind(patient.as_ref().map(patient_snapshot))
        .bind(doctor.as_ref().map(doctor_snapshot))
        .bind(district_id)
        .bind(team_id)
        .bind(remote.total())
        .bind(remote.currency.clone().unwrap_or_else(|| "USD".to_string()))
        .bind(&remote.financial_status)
        .bind(&remote.fulfillment_status)
        .bind(status)
        .bind(line_items(&remote))
        .fetch_one(self.repo.pool())
        .await?;

        self.mirror_status(prescription.as_ref(), status).await?;
        tracing::info!("Imported Shopify order {} as {} ({})", remote.id, order.id, status);
        Ok(order)
    }

    /// Refresh one order from Shopify. Shopify failures fall back to the cached row.
    pub async fn sync_one(&self, scope: &DataScope, id: Uuid) -> Result<OrderSyncOutcome, ApiError> {
        let cached = self.get(scope, id).await?;

        match self.refresh(&cached).await {
            Ok(order) => Ok(OrderSyncOutcome {
                order,
                synced: true,
                error: None,
            }),
            Err(e) => {
                tracing::warn!(
                    "Sync of order {} (Shopify {}) failed, serving cached data: {}",
                    cached.id,
                    cached.shopify_order_id,
                    e
                );
                Ok(OrderSyncOutcome {
                    order: cached,
                    synced: false,
                    error: Some(e.to_string()),
                })
            }
        }
    }

    /// Sync every non-terminal order in scope, one at a time
    pub async fn sync_all(&self, scope: &DataScope) -> Result<BulkSyncReport, ApiError> {
        let mut filter = Filter::new("orders")?;
        for status in OrderStatus::ALL.into_iter().filter(OrderStatus::is_terminal) {
            filter.where_neq("status", status.as_str())?;
        }
        filter.scope_team(scope)?;
        let pending: Vec<Order> = filter.fetch_all(self.repo.pool()).await?;

        let mut report = BulkSyncReport {
            total: pending.len(),
            ..Default::default()
        };
        tracing::info!("Bulk order sync started for {} orders", report.total);

        for order in &pending {
            match self.refresh(order).await {
                Ok(_) => report.synced += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!("Bulk sync: order {} (Shopify {}) failed: {}", order.id, order.shopify_order_id, e);
                }
            }
        }

        tracing::info!(
            "Bulk order sync finished: {} synced, {} failed of {}",
            report.synced,
            report.failed,
            report.total
        );
        Ok(report)
    }

    pub async fn delete(&self, id: Uuid) -> Result<Order, ApiError> {
        Ok(self.repo.delete_404(id).await?)
    }

    async fn find_by_shopify_id(&self, shopify_order_id: i64) -> Result<Option<Order>, ApiError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE shopify_order_id = $1")
            .bind(shopify_order_id)
            .fetch_optional(self.repo.pool())
            .await?;
        Ok(order)
    }

    /// Fetch, map and write back. Concurrent refreshes of one order are last-write-wins.
    async fn refresh(&self, order: &Order) -> Result<Order, SyncError> {
        let remote = self.shopify.fetch_order(order.shopify_order_id).await?;
        let status = remote.status();

        let updated = sqlx::query_as::<_, Order>(
            "UPDATE orders SET order_number = COALESCE($2, order_number), total_price = $3, currency = $4, \
             financial_status = $5, fulfillment_status = $6, status = $7, line_items = $8, \
             last_synced_at = now(), updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(order.id)
        .bind(remote.display_number())
        .bind(remote.total())
        .bind(remote.currency.clone().unwrap_or_else(|| order.currency.clone()))
        .bind(&remote.financial_status)
        .bind(&remote.fulfillment_status)
        .bind(status)
        .bind(line_items(&remote))
        .fetch_one(self.repo.pool())
        .await
        .map_err(|e| SyncError::Store(e.into()))?;

        if let Some(prescription_id) = updated.prescription_id {
            PrescriptionService::new(self.repo.pool().clone())
                .set_order_status(prescription_id, status)
                .await
                .map_err(SyncError::Store)?;
        }

        if order.status != status {
            tracing::info!("Order {} moved {} -> {}", order.id, order.status, status);
        }
        Ok(updated)
    }

    async fn mirror_status(&self, prescription: Option<&Prescription>, status: OrderStatus) -> Result<(), ApiError> {
        if let Some(prescription) = prescription {
            PrescriptionService::new(self.repo.pool().clone())
                .set_order_status(prescription.id, status)
                .await?;
        }
        Ok(())
    }
}

/// Why one order failed to refresh
#[derive(Debug, thiserror::Error)]
enum SyncError {
    #[error(transparent)]
    Shopify(#[from] ShopifyError),
    #[error("{0}")]
    Store(ApiError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use crate::shopify::ShopifyProduct;

    struct Unreachable;

    #[async_trait]
    impl ShopifyApi for Unreachable {
        async fn fetch_order(&self, _order_id: i64) -> Result<ShopifyOrder, ShopifyError> {
            Err(ShopifyError::NotConfigured)
        }

        async fn fetch_product(&self, _product_id: i64) -> Result<ShopifyProduct, ShopifyError> {
            Err(ShopifyError::NotConfigured)
        }
    }

    fn cached_order() -> Order {
        Order {
            id: Uuid::new_v4(),
            shopify_order_id: 1001,
            order_number: Some("#1001".into()),
            prescription_id: None,
            patient: None,
            doctor: None,
            district_id: None,
            team_id: None,
            total_price: Default::default(),
            currency: "PKR".into(),
            financial_status: Some("pending".into()),
            fulfillment_status: None,
            status: OrderStatus::Pending,
            line_items: json!([]),
            last_synced_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn lazy_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://postgres@127.0.0.1:1/pharma_admin")
            .unwrap()
    }

    #[tokio::test]
    async fn refresh_surfaces_shopify_failure_without_touching_the_store() {
        let service = OrderService::new(lazy_pool(), Arc::new(Unreachable));
        let err = service.refresh(&cached_order()).await.unwrap_err();
        assert!(matches!(err, SyncError::Shopify(ShopifyError::NotConfigured)));
    }

    #[test]
    fn outcome_omits_error_when_synced() {
        let outcome = OrderSyncOutcome {
            order: cached_order(),
            synced: true,
            error: None,
        };
        let value = serde_json::to_value(outcome).unwrap();
        assert_eq!(value["synced"], json!(true));
        assert!(value.get("error").is_none());
        assert_eq!(value["order"]["order_number"], json!("#1001"));
    }

    #[test]
    fn snapshots_keep_identifying_fields() {
        let patient = Patient {
            id: Uuid::new_v4(),
            mrn: "MRN-1".into(),
            name: "Ayesha".into(),
            age: Some(30),
            gender: None,
            phone: Some("0300".into()),
            address: Some("not copied".into()),
            district_id: None,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let snapshot = patient_snapshot(&patient);
        assert_eq!(snapshot["mrn"], json!("MRN-1"));
        assert!(snapshot.get("address").is_none());
    }
}
