mod common;

use anyhow::Result;
use pharma_admin::auth::Role;
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    for path in ["/api/doctors", "/api/dashboard/stats", "/api/auth/me", "/api/orders"] {
        let res = client.get(server.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", path);
    }

    let res = client
        .get(server.url("/api/doctors"))
        .bearer_auth("not.a.token")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = res.json::<Value>().await?;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    Ok(())
}

#[tokio::test]
async fn kam_is_kept_out_of_admin_routes() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let kam = common::kam_token();

    let res = client
        .post(server.url("/api/districts"))
        .bearer_auth(&kam)
        .json(&json!({ "name": "Karachi", "code": "KHI" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client.get(server.url("/api/users")).bearer_auth(&kam).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(server.url(&format!("/api/prescriptions/{}", Uuid::new_v4())))
        .bearer_auth(&kam)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn kam_without_team_cannot_read_scoped_data() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let kam = common::token(Role::Kam, Some(Uuid::new_v4()), None);

    for path in ["/api/doctors", "/api/prescriptions", "/api/dashboard/stats"] {
        let res = client.get(server.url(path)).bearer_auth(&kam).send().await?;
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "{}", path);
    }

    Ok(())
}

#[tokio::test]
async fn bad_ids_are_400_and_database_outage_is_503() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let admin = common::super_admin_token();

    let res = client
        .get(server.url("/api/patients/12345"))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client.get(server.url("/api/districts")).bearer_auth(&admin).send().await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);

    Ok(())
}
