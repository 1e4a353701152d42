//! Integration tests for the admin dashboard and catalog management.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p fastlanche-server)
//! - An admin account (fl-cli admin create)
//!
//! Run with: cargo test -p fastlanche-integration-tests -- --ignored

use fastlanche_integration_tests::{ApiClient, json_body};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running API server and admin account"]
async fn test_dashboard_counts_new_order() {
    let admin = ApiClient::admin().await;
    let product = admin.create_product("7.50").await;

    let before: Value = json_body(admin.get("/api/admin/dashboard").await).await;

    let (api, _) = ApiClient::customer().await;
    let resp = api
        .post(
            "/api/orders",
            &json!({ "items": [{ "productId": product["id"], "quantity": 1 }] }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let after: Value = json_body(admin.get("/api/admin/dashboard").await).await;
    let count = |stats: &Value, key: &str| stats[key].as_i64().expect("numeric count");

    assert_eq!(count(&after, "totalOrders"), count(&before, "totalOrders") + 1);
    assert_eq!(
        count(&after, "pendingOrders"),
        count(&before, "pendingOrders") + 1
    );
    assert!(count(&after, "productCount") >= 1);
    assert!(after["totalSales"].is_string());
}

#[tokio::test]
#[ignore = "Requires running API server and admin account"]
async fn test_category_with_products_cannot_be_deleted() {
    let admin = ApiClient::admin().await;
    let product = admin.create_product("3.00").await;
    let category_path = format!("/api/categories/{}", product["categoryId"]);

    let resp = admin.delete(&category_path).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let listed: Vec<Value> = json_body(
        admin
            .get(&format!("/api/products?categoryId={}", product["categoryId"]))
            .await,
    )
    .await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], product["id"]);

    let resp = admin.delete(&format!("/api/products/{}", product["id"])).await;
    assert!(resp.status().is_success());
    let resp = admin.delete(&category_path).await;
    assert!(resp.status().is_success());
    assert_eq!(admin.get(&category_path).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_catalog_writes_require_admin() {
    let (api, _) = ApiClient::customer().await;

    let resp = api.post("/api/categories", &json!({ "name": "Sneaky" })).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = ApiClient::new().get("/api/categories").await;
    assert_eq!(resp.status(), StatusCode::OK);
}
