use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::OrderStatus;

#[derive(Debug, Deserialize)]
pub(crate) struct OrderEnvelope {
    pub order: ShopifyOrder,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductEnvelope {
    pub product: ShopifyProduct,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyOrder {
    pub id: i64,
    /// Display name such as `#1001`
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub order_number: Option<i64>,
    #[serde(default)]
    pub financial_status: Option<String>,
    #[serde(default)]
    pub fulfillment_status: Option<String>,
    #[serde(default)]
    pub cancelled_at: Option<String>,
    #[serde(default)]
    pub total_price: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub line_items: Vec<ShopifyLineItem>,
}

impl ShopifyOrder {
    pub fn status(&self) -> OrderStatus {
        super::map_order_status(
            self.financial_status.as_deref(),
            self.fulfillment_status.as_deref(),
            self.cancelled_at.is_some(),
        )
    }

    /// Shopify sends money as strings; unparseable totals read as zero
    pub fn total(&self) -> Decimal {
        self.total_price
            .as_deref()
            .and_then(|p| p.parse().ok())
            .unwrap_or_default()
    }

    pub fn display_number(&self) -> Option<String> {
        self.name
            .clone()
            .or_else(|| self.order_number.map(|n| format!("#{}", n)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyLineItem {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub variant_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyProduct {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    /// `active`, `draft` or `archived`
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub variants: Vec<ShopifyVariant>,
}

impl ShopifyProduct {
    pub fn is_active(&self) -> bool {
        self.status.as_deref().map_or(true, |s| s.eq_ignore_ascii_case("active"))
    }

    /// The linked variant if it still exists, otherwise the first one
    pub fn variant(&self, variant_id: Option<i64>) -> Option<&ShopifyVariant> {
        variant_id
            .and_then(|id| self.variants.iter().find(|v| v.id == id))
            .or_else(|| self.variants.first())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyVariant {
    pub id: i64,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
}

impl ShopifyVariant {
    pub fn price(&self) -> Option<Decimal> {
        self.price.as_deref().and_then(|p| p.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_admin_order_payload() {
        let payload = json!({
            "order": {
                "id": 450789469,
                "name": "#1001",
                "order_number": 1001,
                "financial_status": "paid",
                "fulfillment_status": null,
                "cancelled_at": null,
                "total_price": "598.94",
                "currency": "PKR",
                "line_items": [{"id": 1, "title": "Insulin pen", "quantity": 2, "price": "299.47", "sku": "INS-1"}],
                "customer": {"first_name": "ignored"}
            }
        });

        let envelope: OrderEnvelope = serde_json::from_value(payload).unwrap();
        let order = envelope.order;
        assert_eq!(order.status(), OrderStatus::Processing);
        assert_eq!(order.total(), "598.94".parse::<Decimal>().unwrap());
        assert_eq!(order.display_number().as_deref(), Some("#1001"));
        assert_eq!(order.line_items[0].quantity, 2);
    }

    #[test]
    fn variant_falls_back_to_first() {
        let product: ShopifyProduct = serde_json::from_value(json!({
            "id": 7,
            "status": "draft",
            "variants": [{"id": 10, "price": "12.50"}, {"id": 11, "price": "15.00", "inventory_quantity": 4}]
        }))
        .unwrap();

        assert!(!product.is_active());
        assert_eq!(product.variant(Some(11)).unwrap().inventory_quantity, Some(4));
        assert_eq!(product.variant(Some(99)).unwrap().id, 10);
        assert_eq!(product.variant(None).unwrap().price(), Some("12.50".parse().unwrap()));
    }
}
