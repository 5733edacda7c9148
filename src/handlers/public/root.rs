use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::state::AppState;

/// GET / - Service banner and route map
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Pharma Admin API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": "/health (public)",
                "login": "POST /api/auth/login (public)",
                "me": "/api/auth/me",
                "districts": "/api/districts[/:id]",
                "cities": "/api/cities[/:id]",
                "distributors": "/api/distributors[/:id]",
                "teams": "/api/teams[/:id]",
                "users": "/api/users[/:id] (super_admin)",
                "doctors": "/api/doctors[/:id][/toggle-status]",
                "patients": "/api/patients[/:id]",
                "prescriptions": "/api/prescriptions[/:id]",
                "orders": "/api/orders[/:id][/sync], /api/orders/sync",
                "products": "/api/products[/:id][/sync], /api/products/sync",
                "banners": "/api/banners[/:id]",
                "dashboard": "/api/dashboard/stats",
            }
        }
    }))
}

/// GET /health - 200 when the database answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": {
                        "message": "Database unavailable",
                        "code": "SERVICE_UNAVAILABLE"
                    },
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
