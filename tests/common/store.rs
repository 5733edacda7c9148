//! In-process app over a real Postgres named by `DATABASE_URL`, with Shopify faked.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use pharma_admin::auth::{generate_jwt, Claims};
use pharma_admin::config::AppConfig;
use pharma_admin::database::models::{User, UserInput};
use pharma_admin::database::DatabaseManager;
use pharma_admin::routes;
use pharma_admin::services::UserService;
use pharma_admin::shopify::{ShopifyApi, ShopifyError, ShopifyOrder, ShopifyProduct};
use pharma_admin::state::AppState;
use pharma_admin::types::Role;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use super::JWT_SECRET;

pub const PASSWORD: &str = "correct-horse-battery";

/// Orders served from memory; anything missing answers 404
#[derive(Default)]
pub struct FakeShopify {
    orders: Mutex<HashMap<i64, ShopifyOrder>>,
}

impl FakeShopify {
    pub fn put_order(&self, order: Value) -> Result<i64> {
        let order: ShopifyOrder = serde_json::from_value(order)?;
        let id = order.id;
        self.orders.lock().expect("shopify fake poisoned").insert(id, order);
        Ok(id)
    }

    pub fn remove_order(&self, id: i64) {
        self.orders.lock().expect("shopify fake poisoned").remove(&id);
    }
}

#[async_trait]
impl ShopifyApi for FakeShopify {
    async fn fetch_order(&self, order_id: i64) -> Result<ShopifyOrder, ShopifyError> {
        self.orders
            .lock()
            .expect("shopify fake poisoned")
            .get(&order_id)
            .cloned()
            .ok_or_else(|| ShopifyError::NotFound(format!("order {}", order_id)))
    }

    async fn fetch_product(&self, product_id: i64) -> Result<ShopifyProduct, ShopifyError> {
        Err(ShopifyError::NotFound(format!("product {}", product_id)))
    }
}

pub struct Store {
    pub app: Router,
    pub pool: PgPool,
    pub shopify: Arc<FakeShopify>,
    /// Bearer token of a freshly created super-admin
    pub admin: String,
}

impl Store {
    /// `None` when `DATABASE_URL` is unset, so the caller can skip
    pub async fn connect() -> Result<Option<Self>> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping database-backed test");
            return Ok(None);
        };

        let mut config = AppConfig::development();
        config.database.url = url;
        config.database.max_connections = 5;
        config.database.connection_timeout = 5;
        config.security.jwt_secret = JWT_SECRET.to_string();
        config.api.enable_request_logging = false;

        let pool = DatabaseManager::connect_lazy(&config.database)?;
        DatabaseManager::migrate(&pool).await?;

        let admin = UserService::new(pool.clone())
            .create(UserInput {
                name: Some("Test Admin".to_string()),
                email: Some(unique_email("admin")),
                password: Some(PASSWORD.to_string()),
                role: Some(Role::SuperAdmin),
                ..Default::default()
            })
            .await?;

        let shopify = Arc::new(FakeShopify::default());
        let state = AppState::new(pool.clone(), Arc::new(config), shopify.clone());

        Ok(Some(Self {
            app: routes::app(state),
            pool,
            shopify,
            admin: token_for(&admin),
        }))
    }

    pub async fn call(&self, method: Method, uri: &str, token: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token));
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.app.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Ok((status, body))
    }

    /// POST as super-admin, expecting 201; returns the new row
    pub async fn create(&self, uri: &str, body: Value) -> Result<Value> {
        let (status, response) = self.call(Method::POST, uri, &self.admin, Some(body)).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "POST {} returned {}: {}", uri, status, response);
        Ok(response["data"].clone())
    }

    pub async fn district(&self) -> Result<Uuid> {
        let code = unique("D");
        let district = self
            .create("/api/districts", json!({ "name": format!("District {}", code), "code": code }))
            .await?;
        id_of(&district)
    }

    pub async fn team(&self, district_id: Uuid) -> Result<Uuid> {
        let team = self
            .create("/api/teams", json!({ "name": unique("Team"), "district_id": district_id }))
            .await?;
        id_of(&team)
    }

    pub async fn doctor(&self, district_id: Uuid, team_id: Uuid) -> Result<Value> {
        self.create(
            "/api/doctors",
            json!({ "name": unique("Dr"), "district_id": district_id, "team_id": team_id }),
        )
        .await
    }

    /// An active KAM placed on `district_id` + `team_id`, with a token carrying that placement
    pub async fn kam(&self, district_id: Uuid, team_id: Uuid) -> Result<(User, String)> {
        let user = UserService::new(self.pool.clone())
            .create(UserInput {
                name: Some(unique("Kam")),
                email: Some(unique_email("kam")),
                password: Some(PASSWORD.to_string()),
                role: Some(Role::Kam),
                district_id: Some(Some(district_id)),
                team_id: Some(Some(team_id)),
                ..Default::default()
            })
            .await?;
        let token = token_for(&user);
        Ok((user, token))
    }
}

pub fn token_for(user: &User) -> String {
    let claims = Claims::new(user.id, user.email.clone(), user.role, user.district_id, user.team_id, 1);
    generate_jwt(&claims, JWT_SECRET).expect("failed to sign test token")
}

pub fn id_of(row: &Value) -> Result<Uuid> {
    let id = row["id"].as_str().with_context(|| format!("row has no id: {}", row))?;
    Ok(id.parse()?)
}

pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}@example.com", unique(prefix))
}

/// Positive id that will not collide with earlier runs
pub fn shopify_id() -> i64 {
    (Uuid::new_v4().as_u128() >> 66) as i64 + 1
}
