//! Integration tests for the payment workflow.
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

/// Place a one-item order as a fresh customer.
async fn placed_order(admin: &ApiClient) -> (ApiClient, Value) {
    let product = admin.create_product("10.00").await;
    let (api, _) = ApiClient::customer().await;
    let order = json_body(
        api.post(
            "/api/orders",
            &json!({ "items": [{ "productId": product["id"], "quantity": 1 }] }),
        )
        .await,
    )
    .await;
    (api, order)
}

async fn pay(api: &ApiClient, order: &Value) -> reqwest::Response {
    api.post(
        "/api/payments",
        &json!({ "orderId": order["id"], "method": "pix", "amount": "10.00" }),
    )
    .await
}

#[tokio::test]
#[ignore = "Requires running API server and admin account"]
async fn test_payment_confirms_order_once() {
    let admin = ApiClient::admin().await;
    let (api, order) = placed_order(&admin).await;

    let resp = pay(&api, &order).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let payment: Value = json_body(resp).await;
    assert_eq!(payment["status"], "pending");
    assert_eq!(payment["orderId"], order["id"]);

    let current: Value = json_body(api.get(&format!("/api/orders/{}", order["id"])).await).await;
    assert_eq!(current["status"], "confirmed");

    let again = pay(&api, &order).await;
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);

    let stored: Value =
        json_body(api.get(&format!("/api/orders/{}/payment", order["id"])).await).await;
    assert_eq!(stored["id"], payment["id"]);
}

#[tokio::test]
#[ignore = "Requires running API server and admin account"]
async fn test_approved_payment_sends_order_to_kitchen() {
    let admin = ApiClient::admin().await;
    let (api, order) = placed_order(&admin).await;
    let payment: Value = json_body(pay(&api, &order).await).await;

    let resp = admin
        .patch(
            &format!("/api/payments/{}/status", payment["id"]),
            &json!({ "status": "approved" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let current: Value = json_body(api.get(&format!("/api/orders/{}", order["id"])).await).await;
    assert_eq!(current["status"], "preparing");
}

#[tokio::test]
#[ignore = "Requires running API server and admin account"]
async fn test_rejected_payment_cancels_order() {
    let admin = ApiClient::admin().await;
    let (api, order) = placed_order(&admin).await;
    let payment: Value = json_body(pay(&api, &order).await).await;

    let resp = admin
        .patch(
            &format!("/api/payments/{}/status", payment["id"]),
            &json!({ "status": "rejected" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let current: Value = json_body(api.get(&format!("/api/orders/{}", order["id"])).await).await;
    assert_eq!(current["status"], "canceled");
}

#[tokio::test]
#[ignore = "Requires running API server and admin account"]
async fn test_payment_for_someone_elses_order_is_forbidden() {
    let admin = ApiClient::admin().await;
    let (_, order) = placed_order(&admin).await;
    let (stranger, _) = ApiClient::customer().await;

    let resp = pay(&stranger, &order).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running API server and admin account"]
async fn test_zero_amount_is_rejected() {
    let admin = ApiClient::admin().await;
    let (api, order) = placed_order(&admin).await;

    let resp = api
        .post(
            "/api/payments",
            &json!({ "orderId": order["id"], "method": "card", "amount": "0" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
