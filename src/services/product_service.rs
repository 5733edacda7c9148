use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::order_service::BulkSyncReport;
use crate::config::ApiConfig;
use crate::database::models::{Product, ProductInput};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::{Filter, FilterData, Page};
use crate::shopify::{ShopifyApi, ShopifyProduct};
use crate::validation::{self, MAX_NAME_LEN, MAX_NOTE_LEN};

const SEARCHABLE: &[&str] = &["name", "sku", "description"];
const SORTABLE: &[&str] = &["name", "sku", "price", "inventory_quantity", "created_at", "updated_at"];

#[derive(Debug, Default, Deserialize)]
pub struct ProductFilters {
    pub is_active: Option<bool>,
}

pub struct ProductService {
    repo: Repository<Product>,
    shopify: Arc<dyn ShopifyApi>,
}

fn price(value: Decimal) -> Result<Decimal, ApiError> {
    if value.is_sign_negative() {
        return Err(ApiError::field("price", "price must not be negative"));
    }
    Ok(value.round_dp(2))
}

fn shopify_id(value: Option<i64>, field: &str) -> Result<Option<i64>, ApiError> {
    match value {
        Some(id) if id <= 0 => Err(ApiError::field(field, format!("{field} must be a positive Shopify id"))),
        other => Ok(other),
    }
}

/// Fields taken from Shopify on sync
#[derive(Debug, PartialEq)]
struct RemoteFields {
    price: Option<Decimal>,
    inventory_quantity: Option<i32>,
    variant_id: Option<i64>,
    is_active: bool,
}

impl RemoteFields {
    /// The linked variant wins when it still exists, otherwise the first variant
    fn from_product(remote: &ShopifyProduct, variant_id: Option<i64>) -> Self {
        let variant = remote.variant(variant_id);
        Self {
            price: variant.and_then(|v| v.price()),
            inventory_quantity: variant
                .and_then(|v| v.inventory_quantity)
                .map(|q| q.clamp(i32::MIN as i64, i32::MAX as i64) as i32),
            variant_id: variant.map(|v| v.id).or(variant_id),
            is_active: remote.is_active(),
        }
    }
}

impl ProductService {
    pub fn new(pool: PgPool, shopify: Arc<dyn ShopifyApi>) -> Self {
        Self {
            repo: Repository::new("products", "Product", pool),
            shopify,
        }
    }

    pub async fn list(&self, data: FilterData, filters: ProductFilters, api: &ApiConfig) -> Result<Page<Product>, ApiError> {
        let mut filter = Filter::new("products")?;
        filter.assign(data, SEARCHABLE, SORTABLE, api)?;
        filter.where_eq_opt("is_active", filters.is_active)?;
        Ok(filter.fetch_page(self.repo.pool()).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Product, ApiError> {
        Ok(self.repo.select_404(id).await?)
    }

    pub async fn create(&self, input: ProductInput) -> Result<Product, ApiError> {
        let name = validation::required_text(&validation::required(input.name, "name")?, "name", MAX_NAME_LEN)?;
        let sku = validation::code(&validation::required(input.sku, "sku")?, "sku")?;
        let price = price(validation::required(input.price, "price")?)?;
        let description = validation::optional_text(input.description.as_deref(), "description", MAX_NOTE_LEN)?;
        let shopify_product_id = shopify_id(input.shopify_product_id.flatten(), "shopify_product_id")?;
        let shopify_variant_id = shopify_id(input.shopify_variant_id.flatten(), "shopify_variant_id")?;

        self.ensure_sku_free(&sku, None).await?;

        let product = sqlx::query_as::<_, Product>(
            "INSERT INTO products (name, sku, price, description, shopify_product_id, shopify_variant_id, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(&name)
        .bind(&sku)
        .bind(price)
        .bind(description)
        .bind(shopify_product_id)
        .bind(shopify_variant_id)
        .bind(input.is_active.unwrap_or(true))
        .fetch_one(self.repo.pool())
        .await?;

        Ok(product)
    }

    pub async fn update(&self, id: Uuid, input: ProductInput) -> Result<Product, ApiError> {
        let current = self.repo.select_404(id).await?;

        let name = match input.name {
            Some(name) => validation::required_text(&name, "name", MAX_NAME_LEN)?,
            None => current.name,
        };
        let sku = match input.sku {
            Some(sku) => {
                let sku = validation::code(&sku, "sku")?;
                self.ensure_sku_free(&sku, Some(id)).await?;
                sku
            }
            None => current.sku,
        };
        let price = match input.price {
            Some(value) => price(value)?,
            None => current.price,
        };
        let description = validation::merge_text(input.description, current.description, "description", MAX_NOTE_LEN)?;
        let shopify_product_id = match input.shopify_product_id {
            Some(value) => shopify_id(value, "shopify_product_id")?,
            None => current.shopify_product_id,
        };
        let shopify_variant_id = match input.shopify_variant_id {
            Some(value) => shopify_id(value, "shopify_variant_id")?,
            None => current.shopify_variant_id,
        };

        let product = sqlx::query_as::<_, Product>(
            "UPDATE products SET name = $2, sku = $3, price = $4, description = $5, shopify_product_id = $6, \
             shopify_variant_id = $7, is_active = $8, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&name)
        .bind(&sku)
        .bind(price)
        .bind(description)
        .bind(shopify_product_id)
        .bind(shopify_variant_id)
        .bind(input.is_active.unwrap_or(current.is_active))
        .fetch_one(self.repo.pool())
        .await?;

        Ok(product)
    }

    /// Prescriptions naming the product are unlinked by the foreign key
    pub async fn delete(&self, id: Uuid) -> Result<Product, ApiError> {
        Ok(self.repo.delete_404(id).await?)
    }

    /// Pull price, inventory and status from the linked Shopify product
    pub async fn sync_one(&self, id: Uuid) -> Result<Product, ApiError> {
        let product = self.repo.select_404(id).await?;
        self.refresh(&product).await
    }

    /// Refresh every linked product, one at a time
    pub async fn sync_all(&self) -> Result<BulkSyncReport, ApiError> {
        let linked: Vec<Product> =
            sqlx::query_as::<_, Product>("SELECT * FROM products WHERE shopify_product_id IS NOT NULL ORDER BY name")
                .fetch_all(self.repo.pool())
                .await?;

        let mut report = BulkSyncReport {
            total: linked.len(),
            ..Default::default()
        };

        for product in &linked {
            match self.refresh(product).await {
                Ok(_) => report.synced += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!("Bulk sync: product {} ({}) failed: {}", product.sku, product.id, e);
                }
            }
        }

        tracing::info!(
            "Bulk product sync finished: {} synced, {} failed of {}",
            report.synced,
            report.failed,
            report.total
        );
        Ok(report)
    }

    async fn refresh(&self, product: &Product) -> Result<Product, ApiError> {
        let shopify_product_id = product
            .shopify_product_id
            .ok_or_else(|| ApiError::bad_request("Product is not linked to a Shopify product"))?;

        let remote = self.shopify.fetch_product(shopify_product_id).await?;
        let fields = RemoteFields::from_product(&remote, product.shopify_variant_id);

        let updated = sqlx::query_as::<_, Product>(
            "UPDATE products SET price = COALESCE($2, price), inventory_quantity = $3, shopify_variant_id = $4, \
             is_active = $5, last_synced_at = now(), updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(product.id)
        .bind(fields.price)
        .bind(fields.inventory_quantity)
        .bind(fields.variant_id)
        .bind(fields.is_active)
        .fetch_one(self.repo.pool())
        .await?;

        if product.is_active && !updated.is_active {
            tracing::info!("Product {} deactivated: Shopify status is {:?}", updated.sku, remote.status);
        }
        Ok(updated)
    }

    async fn ensure_sku_free(&self, sku: &str, exclude: Option<Uuid>) -> Result<(), ApiError> {
        if self.repo.is_taken("sku", sku, exclude).await? {
            return Err(ApiError::bad_request("Product with this SKU already exists"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn remote(status: &str) -> ShopifyProduct {
        serde_json::from_value(json!({
            "id": 632910392,
            "status": status,
            "variants": [
                {"id": 1, "price": "10.00", "inventory_quantity": 5},
                {"id": 2, "price": "12.75", "inventory_quantity": 9}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn linked_variant_supplies_price_and_stock() {
        let fields = RemoteFields::from_product(&remote("active"), Some(2));
        assert_eq!(
            fields,
            RemoteFields {
                price: Some("12.75".parse().unwrap()),
                inventory_quantity: Some(9),
                variant_id: Some(2),
                is_active: true,
            }
        );
    }

    #[test]
    fn missing_variant_falls_back_to_first_and_archived_deactivates() {
        let fields = RemoteFields::from_product(&remote("archived"), Some(77));
        assert_eq!(fields.variant_id, Some(1));
        assert_eq!(fields.price, Some("10.00".parse().unwrap()));
        assert!(!fields.is_active);
    }

    #[test]
    fn price_rules() {
        assert!(price("-0.01".parse().unwrap()).is_err());
        assert_eq!(price("9.999".parse().unwrap()).unwrap(), "10.00".parse::<Decimal>().unwrap());
        assert!(shopify_id(Some(0), "shopify_product_id").is_err());
        assert_eq!(shopify_id(None, "shopify_product_id").unwrap(), None);
    }
}
