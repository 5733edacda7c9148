use axum::{
    extract::DefaultBodyLimit,
    handler::Handler,
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, require_role, SUPER_ADMIN_ONLY};
use crate::state::AppState;

/// Wrap a handler so only super-admins reach it
macro_rules! super_admin {
    ($handler:expr) => {
        $handler.layer(from_fn_with_state(SUPER_ADMIN_ONLY, require_role))
    };
}

/// Full application router
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(auth_routes())
        .merge(district_routes())
        .merge(city_routes())
        .merge(distributor_routes())
        .merge(team_routes())
        .merge(user_routes())
        .merge(doctor_routes())
        .merge(patient_routes())
        .merge(prescription_routes())
        .merge(order_routes())
        .merge(product_routes())
        .merge(banner_routes())
        .merge(dashboard_routes())
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let mut app = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/api/auth/login", post(public::login))
        // Protected API
        .merge(protected)
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes))
        .layer(cors_layer(&state.config));

    if state.config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app.with_state(state)
}

/// Configured origins, or any origin when none are listed
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

fn auth_routes() -> Router<AppState> {
    use protected::auth;

    Router::new().route("/api/auth/me", get(auth::me))
}

fn district_routes() -> Router<AppState> {
    use protected::districts;

    Router::new()
        .route(
            "/api/districts",
            get(districts::list).post(super_admin!(districts::create)),
        )
        .route(
            "/api/districts/:id",
            get(districts::show)
                .put(super_admin!(districts::update))
                .delete(super_admin!(districts::delete)),
        )
}

fn city_routes() -> Router<AppState> {
    use protected::cities;

    Router::new()
        .route("/api/cities", get(cities::list).post(super_admin!(cities::create)))
        .route(
            "/api/cities/:id",
            get(cities::show)
                .put(super_admin!(cities::update))
                .delete(super_admin!(cities::delete)),
        )
}

fn distributor_routes() -> Router<AppState> {
    use protected::distributors;

    Router::new()
        .route(
            "/api/distributors",
            get(distributors::list).post(super_admin!(distributors::create)),
        )
        .route(
            "/api/distributors/:id",
            get(distributors::show)
                .put(super_admin!(distributors::update))
                .delete(super_admin!(distributors::delete)),
        )
}

fn team_routes() -> Router<AppState> {
    use protected::teams;

    Router::new()
        .route("/api/teams", get(teams::list).post(super_admin!(teams::create)))
        .route(
            "/api/teams/:id",
            get(teams::show)
                .put(super_admin!(teams::update))
                .delete(super_admin!(teams::delete)),
        )
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    Router::new()
        .route(
            "/api/users",
            get(super_admin!(users::list)).post(super_admin!(users::create)),
        )
        .route(
            "/api/users/:id",
            get(super_admin!(users::show))
                .put(super_admin!(users::update))
                .delete(super_admin!(users::delete)),
        )
}

fn doctor_routes() -> Router<AppState> {
    use protected::doctors;

    Router::new()
        .route("/api/doctors", get(doctors::list).post(doctors::create))
        .route(
            "/api/doctors/:id",
            get(doctors::show)
                .put(doctors::update)
                .delete(super_admin!(doctors::delete)),
        )
        .route("/api/doctors/:id/toggle-status", patch(doctors::toggle_status))
}

fn patient_routes() -> Router<AppState> {
    use protected::patients;

    Router::new()
        .route("/api/patients", get(patients::list).post(patients::create))
        .route(
            "/api/patients/:id",
            get(patients::show)
                .put(patients::update)
                .delete(super_admin!(patients::delete)),
        )
}

fn prescription_routes() -> Router<AppState> {
    use protected::prescriptions;

    Router::new()
        .route(
            "/api/prescriptions",
            get(prescriptions::list).post(prescriptions::create),
        )
        .route(
            "/api/prescriptions/:id",
            get(prescriptions::show)
                .put(prescriptions::update)
                .delete(super_admin!(prescriptions::delete)),
        )
}

fn order_routes() -> Router<AppState> {
    use protected::orders;

    Router::new()
        .route("/api/orders", get(orders::list).post(orders::import))
        .route("/api/orders/sync", post(orders::sync_all))
        .route(
            "/api/orders/:id",
            get(orders::show).delete(super_admin!(orders::delete)),
        )
        .route("/api/orders/:id/sync", post(orders::sync))
}

fn product_routes() -> Router<AppState> {
    use protected::products;

    Router::new()
        .route(
            "/api/products",
            get(products::list).post(super_admin!(products::create)),
        )
        .route("/api/products/sync", post(super_admin!(products::sync_all)))
        .route(
            "/api/products/:id",
            get(products::show)
                .put(super_admin!(products::update))
                .delete(super_admin!(products::delete)),
        )
        .route("/api/products/:id/sync", post(super_admin!(products::sync)))
}

fn banner_routes() -> Router<AppState> {
    use protected::banners;

    Router::new()
        .route("/api/banners", get(banners::list).post(super_admin!(banners::create)))
        .route(
            "/api/banners/:id",
            get(banners::show)
                .put(super_admin!(banners::update))
                .delete(super_admin!(banners::delete)),
        )
}

fn dashboard_routes() -> Router<AppState> {
    use protected::dashboard;

    Router::new().route("/api/dashboard/stats", get(dashboard::stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{generate_jwt, Claims};
    use crate::types::Role;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    const SECRET: &str = "router-test-secret";

    /// Nothing listens on port 1, so every query fails fast
    fn test_app() -> Router {
        let mut config = AppConfig::development();
        config.database.url = "postgres://postgres@127.0.0.1:1/pharma_admin_test".to_string();
        config.database.connection_timeout = 1;
        config.security.jwt_secret = SECRET.to_string();
        config.api.enable_request_logging = false;
        app(AppState::from_config(config).unwrap())
    }

    fn token(role: Role, district_id: Option<Uuid>, team_id: Option<Uuid>) -> String {
        let claims = Claims::new(Uuid::new_v4(), "someone@example.com".into(), role, district_id, team_id, 0);
        generate_jwt(&claims, SECRET).unwrap()
    }

    fn kam_token() -> String {
        token(Role::Kam, Some(Uuid::new_v4()), Some(Uuid::new_v4()))
    }

    fn request(method: &str, uri: &str, bearer: Option<&str>, body: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(bearer) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", bearer));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(req: Request<Body>) -> (StatusCode, Value) {
        let response = test_app().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn root_is_public() {
        let (status, body) = send(request("GET", "/", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], Value::Bool(true));
    }

    #[tokio::test]
    async fn health_reports_unreachable_database() {
        let (status, body) = send(request("GET", "/health", None, None)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], Value::Bool(false));
    }

    #[tokio::test]
    async fn missing_token_is_401() {
        let (status, body) = send(request("GET", "/api/doctors", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], Value::Bool(false));
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn forged_token_is_401() {
        let claims = Claims::new(Uuid::new_v4(), "x@example.com".into(), Role::SuperAdmin, None, None, 0);
        let forged = generate_jwt(&claims, "some-other-secret").unwrap();
        let (status, _) = send(request("GET", "/api/auth/me", Some(&forged), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn kam_cannot_reach_admin_routes() {
        let kam = kam_token();

        let (status, body) = send(request("POST", "/api/districts", Some(&kam), Some(r#"{"name":"Lahore","code":"LHR"}"#))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["message"], "Insufficient permissions");

        let (status, _) = send(request("GET", "/api/users", Some(&kam), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let id = Uuid::new_v4();
        let (status, _) = send(request("DELETE", &format!("/api/doctors/{}", id), Some(&kam), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(request("POST", "/api/products/sync", Some(&kam), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unplaced_kam_is_refused_scoped_data() {
        let kam = token(Role::Kam, Some(Uuid::new_v4()), None);

        let (status, _) = send(request("GET", "/api/doctors", Some(&kam), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(request("POST", "/api/orders/sync", Some(&kam), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn malformed_input_is_400() {
        let admin = token(Role::SuperAdmin, None, None);

        let (status, body) = send(request("POST", "/api/cities", Some(&admin), Some("{not json"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_JSON");

        let (status, body) = send(request("GET", "/api/doctors/not-a-uuid", Some(&admin), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Invalid id: expected a UUID");

        let (status, _) = send(request("GET", "/api/doctors?page=abc", Some(&admin), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(request("GET", "/api/doctors?page=9223372036854775807", Some(&admin), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn login_requires_a_body() {
        let (status, body) = send(request("POST", "/api/auth/login", None, Some("{}"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], Value::Bool(false));
    }
}
