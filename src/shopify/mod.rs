//! Shopify Admin REST API integration.
//!
//! Shopify is the system of record for orders and product pricing. The admin API is
//! polled on demand (single order, bulk loop, product refresh); nothing is pushed to
//! Shopify and nothing runs on a schedule.

mod client;
pub mod types;

pub use client::ShopifyClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::OrderStatus;

/// Errors that can occur when talking to Shopify
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// Store URL or access token missing
    #[error("Shopify integration is not configured")]
    NotConfigured,

    #[error("Invalid Shopify store URL: {0}")]
    InvalidStoreUrl(String),

    /// HTTP request failed (connect, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Shopify answered with a non-success status
    #[error("Shopify returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read-only view of the Shopify admin API used by the sync services
#[async_trait]
pub trait ShopifyApi: Send + Sync {
    async fn fetch_order(&self, order_id: i64) -> Result<ShopifyOrder, ShopifyError>;

    async fn fetch_product(&self, product_id: i64) -> Result<ShopifyProduct, ShopifyError>;
}

/// Collapse Shopify's financial and fulfillment flags into the internal order status.
///
/// Cancellation wins over everything, then fulfillment, then payment.
pub fn map_order_status(
    financial_status: Option<&str>,
    fulfillment_status: Option<&str>,
    cancelled: bool,
) -> OrderStatus {
    let financial = financial_status.map(str::to_ascii_lowercase);
    let fulfillment = fulfillment_status.map(str::to_ascii_lowercase);

    if cancelled || matches!(financial.as_deref(), Some("refunded") | Some("voided")) {
        return OrderStatus::Cancelled;
    }

    match fulfillment.as_deref() {
        Some("fulfilled") => return OrderStatus::Fulfilled,
        Some("partial") => return OrderStatus::Processing,
        _ => {}
    }

    match financial.as_deref() {
        Some("paid") | Some("partially_paid") | Some("authorized") | Some("partially_refunded") => {
            OrderStatus::Processing
        }
        _ => OrderStatus::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_wins() {
        assert_eq!(map_order_status(Some("paid"), Some("fulfilled"), true), OrderStatus::Cancelled);
        assert_eq!(map_order_status(Some("refunded"), None, false), OrderStatus::Cancelled);
        assert_eq!(map_order_status(Some("voided"), None, false), OrderStatus::Cancelled);
    }

    #[test]
    fn fulfillment_beats_payment() {
        assert_eq!(map_order_status(Some("pending"), Some("fulfilled"), false), OrderStatus::Fulfilled);
        assert_eq!(map_order_status(Some("pending"), Some("partial"), false), OrderStatus::Processing);
    }

    #[test]
    fn payment_moves_to_processing() {
        assert_eq!(map_order_status(Some("paid"), None, false), OrderStatus::Processing);
        assert_eq!(map_order_status(Some("PARTIALLY_PAID"), None, false), OrderStatus::Processing);
        assert_eq!(map_order_status(Some("authorized"), Some("unfulfilled"), false), OrderStatus::Processing);
    }

    #[test]
    fn everything_else_is_pending() {
        assert_eq!(map_order_status(None, None, false), OrderStatus::Pending);
        assert_eq!(map_order_status(Some("pending"), Some("restocked"), false), OrderStatus::Pending);
    }

    #[test]
    fn error_display() {
        let err = ShopifyError::NotFound("order 42".to_string());
        assert_eq!(err.to_string(), "Not found: order 42");
    }
}
