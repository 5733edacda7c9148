use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use super::types::{OrderEnvelope, ProductEnvelope, ShopifyOrder, ShopifyProduct};
use super::{ShopifyApi, ShopifyError};
use crate::config::ShopifyConfig;

/// Shopify Admin REST client authenticated with a private-app access token
#[derive(Clone)]
pub struct ShopifyClient {
    http: reqwest::Client,
    /// `https://{store}/admin/api/{version}/`; `None` when the integration is not configured
    base_url: Option<Url>,
    access_token: String,
}

impl ShopifyClient {
    pub fn from_config(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let base_url = if config.is_configured() {
            Some(Self::admin_base_url(&config.store_url, &config.api_version)?)
        } else {
            tracing::warn!("Shopify store URL or access token missing; order and product sync disabled");
            None
        };

        Ok(Self {
            http,
            base_url,
            access_token: config.access_token.clone(),
        })
    }

    /// Accepts `store.myshopify.com`, `https://store.myshopify.com/` or a full admin URL
    pub fn admin_base_url(store_url: &str, api_version: &str) -> Result<Url, ShopifyError> {
        let trimmed = store_url.trim().trim_end_matches('/');
        let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        let parsed = Url::parse(&with_scheme).map_err(|_| ShopifyError::InvalidStoreUrl(store_url.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ShopifyError::InvalidStoreUrl(store_url.to_string()))?;

        let authority = match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Url::parse(&format!("{}://{}/admin/api/{}/", parsed.scheme(), authority, api_version))
            .map_err(|_| ShopifyError::InvalidStoreUrl(store_url.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, what: String) -> Result<T, ShopifyError> {
        let base = self.base_url.as_ref().ok_or(ShopifyError::NotConfigured)?;
        let url = base
            .join(path)
            .map_err(|_| ShopifyError::InvalidStoreUrl(base.to_string()))?;

        tracing::debug!("Shopify GET {}", url);
        let response = self
            .http
            .get(url)
            .header("X-Shopify-Access-Token", &self.access_token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ShopifyError::NotFound(what));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ShopifyApi for ShopifyClient {
    async fn fetch_order(&self, order_id: i64) -> Result<ShopifyOrder, ShopifyError> {
        let envelope: OrderEnvelope = self
            .get_json(&format!("orders/{}.json", order_id), format!("order {}", order_id))
            .await?;
        Ok(envelope.order)
    }

    async fn fetch_product(&self, product_id: i64) -> Result<ShopifyProduct, ShopifyError> {
        let envelope: ProductEnvelope = self
            .get_json(&format!("products/{}.json", product_id), format!("product {}", product_id))
            .await?;
        Ok(envelope.product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_store_urls() {
        let expected = "https://demo.myshopify.com/admin/api/2024-01/";
        for input in [
            "demo.myshopify.com",
            "https://demo.myshopify.com/",
            "https://demo.myshopify.com/admin",
        ] {
            assert_eq!(ShopifyClient::admin_base_url(input, "2024-01").unwrap().as_str(), expected);
        }
    }

    #[test]
    fn keeps_explicit_ports() {
        let base = ShopifyClient::admin_base_url("http://127.0.0.1:8089/", "2024-01").unwrap();
        assert_eq!(base.as_str(), "http://127.0.0.1:8089/admin/api/2024-01/");

        // Default ports are implied by the scheme
        let base = ShopifyClient::admin_base_url("https://demo.myshopify.com:443", "2024-01").unwrap();
        assert_eq!(base.as_str(), "https://demo.myshopify.com/admin/api/2024-01/");
    }

    #[test]
    fn joins_resource_paths_under_version() {
        let base = ShopifyClient::admin_base_url("demo.myshopify.com", "2024-01").unwrap();
        assert_eq!(
            base.join("orders/42.json").unwrap().as_str(),
            "https://demo.myshopify.com/admin/api/2024-01/orders/42.json"
        );
    }

    #[tokio::test]
    async fn unconfigured_client_refuses_calls() {
        let client = ShopifyClient::from_config(&crate::config::AppConfig::development().shopify).unwrap();
        assert!(matches!(client.fetch_order(1).await, Err(ShopifyError::NotConfigured)));
    }
}
