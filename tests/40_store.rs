mod common;

// These tests run against the Postgres named by DATABASE_URL and skip when it is unset.
// Every fixture carries a unique name, so runs can share one database.

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::store::{id_of, shopify_id, unique, unique_email, Store, PASSWORD};

#[tokio::test]
async fn duplicate_city_name_is_rejected_regardless_of_case() -> Result<()> {
    let Some(store) = Store::connect().await? else { return Ok(()) };
    let district_id = store.district().await?;
    let name = unique("Multan");

    store
        .create("/api/cities", json!({ "name": name, "district_id": district_id }))
        .await?;

    let (status, body) = store
        .call(
            Method::POST,
            "/api/cities",
            &store.admin,
            Some(json!({ "name": name.to_uppercase(), "district_id": district_id })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "City with this name already exists");

    Ok(())
}

#[tokio::test]
async fn kam_only_reads_doctors_of_own_team() -> Result<()> {
    let Some(store) = Store::connect().await? else { return Ok(()) };
    let district_id = store.district().await?;
    let own_team = store.team(district_id).await?;
    let other_team = store.team(district_id).await?;
    let (_, kam) = store.kam(district_id, own_team).await?;

    let own = id_of(&store.doctor(district_id, own_team).await?)?;
    let other = id_of(&store.doctor(district_id, other_team).await?)?;

    let (status, body) = store.call(Method::GET, "/api/doctors?limit=1000", &kam, None).await?;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().cloned().unwrap_or_default();
    assert!(items.iter().all(|d| d["team_id"] == json!(own_team)), "foreign doctor listed: {}", body);
    assert!(items.iter().any(|d| d["id"] == json!(own)));
    assert!(!items.iter().any(|d| d["id"] == json!(other)));

    let (status, _) = store.call(Method::GET, &format!("/api/doctors/{}", other), &kam, None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = store
        .call(Method::PATCH, &format!("/api/doctors/{}/toggle-status", other), &kam, None)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn toggling_a_doctor_twice_restores_status() -> Result<()> {
    let Some(store) = Store::connect().await? else { return Ok(()) };
    let district_id = store.district().await?;
    let team_id = store.team(district_id).await?;
    let doctor = store.doctor(district_id, team_id).await?;
    assert_eq!(doctor["is_active"], true);
    let uri = format!("/api/doctors/{}/toggle-status", id_of(&doctor)?);

    let (status, body) = store.call(Method::PATCH, &uri, &store.admin, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);

    let (status, body) = store.call(Method::PATCH, &uri, &store.admin, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], true);

    Ok(())
}

#[tokio::test]
async fn only_one_active_kam_per_district_and_team() -> Result<()> {
    let Some(store) = Store::connect().await? else { return Ok(()) };
    let district_id = store.district().await?;
    let team_id = store.team(district_id).await?;

    let first = store
        .create(
            "/api/users",
            json!({
                "name": unique("Kam"),
                "email": unique_email("kam"),
                "password": PASSWORD,
                "role": "kam",
                "district_id": district_id,
                "team_id": team_id,
            }),
        )
        .await?;
    assert!(first.get("password_hash").is_none());

    let second = json!({
        "name": unique("Kam"),
        "email": unique_email("kam"),
        "password": PASSWORD,
        "role": "kam",
        "district_id": district_id,
        "team_id": team_id,
    });
    let (status, body) = store
        .call(Method::POST, "/api/users", &store.admin, Some(second.clone()))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "An active KAM is already assigned to this district and team");

    // An inactive second KAM does not compete
    let mut inactive = second;
    inactive["is_active"] = json!(false);
    store.create("/api/users", inactive).await?;

    // New doctors of the team are assigned to the active KAM
    let doctor = store.doctor(district_id, team_id).await?;
    assert_eq!(doctor["kam_id"], first["id"]);

    Ok(())
}

#[tokio::test]
async fn occupied_team_cannot_change_district() -> Result<()> {
    let Some(store) = Store::connect().await? else { return Ok(()) };
    let home = store.district().await?;
    let elsewhere = store.district().await?;

    let occupied = store.team(home).await?;
    store.doctor(home, occupied).await?;
    let (status, body) = store
        .call(
            Method::PUT,
            &format!("/api/teams/{}", occupied),
            &store.admin,
            Some(json!({ "district_id": elsewhere })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"]["message"].as_str().unwrap_or_default();
    assert!(message.starts_with("Cannot move team to another district"), "{}", message);

    let (status, body) = store
        .call(Method::GET, &format!("/api/teams/{}", occupied), &store.admin, None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["district_id"], json!(home));

    // An empty team may move
    let empty = store.team(home).await?;
    let (status, body) = store
        .call(
            Method::PUT,
            &format!("/api/teams/{}", empty),
            &store.admin,
            Some(json!({ "district_id": elsewhere })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["district_id"], json!(elsewhere));

    Ok(())
}

/// District, team, doctor, patient and prescription; returns the prescription id
async fn prescription(store: &Store) -> Result<uuid::Uuid> {
    let district_id = store.district().await?;
    let team_id = store.team(district_id).await?;
    let doctor = store.doctor(district_id, team_id).await?;
    let patient = store
        .create(
            "/api/patients",
            json!({ "mrn": unique("mrn"), "name": "Ayesha Khan", "district_id": district_id }),
        )
        .await?;
    let prescription = store
        .create(
            "/api/prescriptions",
            json!({ "patient_id": id_of(&patient)?, "doctor_id": id_of(&doctor)?, "quantity": 2 }),
        )
        .await?;
    assert_eq!(prescription["district_id"], json!(district_id));
    assert_eq!(prescription["team_id"], json!(team_id));
    id_of(&prescription)
}

fn shopify_order(id: i64, financial: &str, fulfillment: Option<&str>) -> serde_json::Value {
    json!({
        "id": id,
        "name": "#1001",
        "financial_status": financial,
        "fulfillment_status": fulfillment,
        "total_price": "120.50",
        "currency": "PKR",
        "line_items": [{ "id": 1, "title": "Amoxicillin 500mg", "sku": "AMX-500", "quantity": 2, "price": "60.25" }]
    })
}

#[tokio::test]
async fn order_sync_writes_back_and_mirrors_prescription_status() -> Result<()> {
    let Some(store) = Store::connect().await? else { return Ok(()) };
    let prescription_id = prescription(&store).await?;
    let shopify_order_id = store.shopify.put_order(shopify_order(shopify_id(), "pending", None))?;

    let order = store
        .create(
            "/api/orders",
            json!({ "shopify_order_id": shopify_order_id, "prescription_id": prescription_id }),
        )
        .await?;
    assert_eq!(order["status"], "pending");
    assert_eq!(order["patient"]["name"], "Ayesha Khan");
    assert!(order["doctor"]["id"].is_string());
    let order_id = id_of(&order)?;

    let (status, body) = store
        .call(
            Method::POST,
            "/api/orders",
            &store.admin,
            Some(json!({ "shopify_order_id": shopify_order_id })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    store.shopify.put_order(shopify_order(shopify_order_id, "paid", Some("fulfilled")))?;
    let (status, body) = store
        .call(Method::POST, &format!("/api/orders/{}/sync", order_id), &store.admin, None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["synced"], true);
    assert_eq!(body["data"]["order"]["status"], "fulfilled");
    assert_eq!(body["data"]["order"]["fulfillment_status"], "fulfilled");
    assert!(body["data"]["order"]["last_synced_at"].is_string());

    let (status, body) = store
        .call(Method::GET, &format!("/api/prescriptions/{}", prescription_id), &store.admin, None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order_status"], "fulfilled");

    Ok(())
}

#[tokio::test]
async fn failed_sync_serves_the_cached_order() -> Result<()> {
    let Some(store) = Store::connect().await? else { return Ok(()) };
    let prescription_id = prescription(&store).await?;
    let shopify_order_id = store.shopify.put_order(shopify_order(shopify_id(), "paid", None))?;

    let order = store
        .create(
            "/api/orders",
            json!({ "shopify_order_id": shopify_order_id, "prescription_id": prescription_id }),
        )
        .await?;
    assert_eq!(order["status"], "processing");

    store.shopify.remove_order(shopify_order_id);
    let (status, body) = store
        .call(Method::POST, &format!("/api/orders/{}/sync", id_of(&order)?), &store.admin, None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["synced"], false);
    assert!(body["data"]["error"].is_string());
    assert_eq!(body["data"]["order"]["id"], order["id"]);
    assert_eq!(body["data"]["order"]["status"], "processing");

    Ok(())
}
