//! Integration tests for placing and tracking orders.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The API server running (cargo run -p fastlanche-server)
//! - An admin account (fl-cli admin create)
//!
//! Run with: cargo test -p fastlanche-integration-tests -- --ignored

use fastlanche_integration_tests::{ApiClient, error_paths, json_body};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::sync::{Mutex, MutexGuard};

/// Held by every test here that posts an order, so tickets issued in this
/// binary come out in test order.
static ORDERS: Mutex<()> = Mutex::const_new(());

async fn placing_orders() -> MutexGuard<'static, ()> {
    ORDERS.lock().await
}

/// Position of a ticket in the daily sequence, `A01` being 0.
fn ticket_position(code: &str) -> u32 {
    let letter = u32::from(code.as_bytes()[0] - b'A');
    let number: u32 = code[1..].parse().expect("ticket number");
    letter * 99 + number - 1
}

/// `A01`..`Z99`.
fn is_ticket_code(code: &str) -> bool {
    let mut chars = code.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && code.len() == 3
        && chars.all(|c| c.is_ascii_digit())
        && &code[1..] != "00"
}

// ============================================================================
// Placement
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and admin account"]
async fn test_order_snapshots_prices_and_issues_ticket() {
    let _orders = placing_orders().await;
    let admin = ApiClient::admin().await;
    let product = admin.create_product("12.50").await;
    let (api, user) = ApiClient::customer().await;

    let resp = api
        .post(
            "/api/orders",
            &json!({ "items": [{ "productId": product["id"], "quantity": 2 }] }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = json_body(resp).await;

    assert_eq!(order["status"], "pending");
    assert_eq!(order["userId"], user["id"]);
    assert_eq!(order["total"], "25.00");
    // Falls back to the address given at registration
    assert_eq!(order["address"], "Rua das Flores, 42");

    let ticket = order["ticketNumber"].as_str().expect("ticket number");
    assert!(is_ticket_code(ticket), "unexpected ticket {ticket}");

    let items = order["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["price"], "12.50");
    assert_eq!(items[0]["subtotal"], "25.00");
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_empty_order_is_rejected() {
    let _orders = placing_orders().await;
    let (api, _) = ApiClient::customer().await;

    let resp = api
        .post("/api/orders", &json!({ "address": "Rua A, 1", "items": [] }))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(resp).await;
    assert_eq!(error_paths(&body), vec!["items".to_string()]);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_order_with_unknown_product_is_rejected() {
    let _orders = placing_orders().await;
    let (api, _) = ApiClient::customer().await;

    let resp = api
        .post(
            "/api/orders",
            &json!({
                "address": "Rua A, 1",
                "items": [{ "productId": i32::MAX, "quantity": 1 }],
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(resp).await;
    assert_eq!(error_paths(&body), vec!["items[0].productId".to_string()]);
}

#[tokio::test]
#[ignore = "Requires running API server"]
async fn test_order_requires_login() {
    let resp = ApiClient::new()
        .post("/api/orders", &json!({ "address": "Rua A, 1", "items": [] }))
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running API server and admin account"]
async fn test_rejected_order_does_not_consume_ticket() {
    let _orders = placing_orders().await;
    let admin = ApiClient::admin().await;
    let product = admin.create_product("6.00").await;
    let (api, user) = ApiClient::customer().await;
    let valid = json!({ "items": [{ "productId": product["id"], "quantity": 1 }] });

    let first: Value = json_body(api.post("/api/orders", &valid).await).await;

    let resp = api
        .post(
            "/api/orders",
            &json!({ "items": [{ "productId": product["id"], "quantity": 0 }] }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let second: Value = json_body(api.post("/api/orders", &valid).await).await;

    let first = first["ticketNumber"].as_str().expect("ticket number");
    let second = second["ticketNumber"].as_str().expect("ticket number");
    // After Z99 the sequence starts again at A01
    assert_eq!(
        ticket_position(second),
        (ticket_position(first) + 1) % (26 * 99),
        "expected {second} to follow {first}"
    );

    let mine: Vec<Value> =
        json_body(api.get(&format!("/api/users/{}/orders", user["id"])).await).await;
    assert_eq!(mine.len(), 2);
}

// ============================================================================
// Access and status
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and admin account"]
async fn test_order_hidden_from_other_customers() {
    let _orders = placing_orders().await;
    let admin = ApiClient::admin().await;
    let product = admin.create_product("5.00").await;
    let (owner, _) = ApiClient::customer().await;
    let (stranger, _) = ApiClient::customer().await;

    let order: Value = json_body(
        owner
            .post(
                "/api/orders",
                &json!({ "items": [{ "productId": product["id"], "quantity": 1 }] }),
            )
            .await,
    )
    .await;
    let path = format!("/api/orders/{}", order["id"]);

    assert_eq!(owner.get(&path).await.status(), StatusCode::OK);
    assert_eq!(stranger.get(&path).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(admin.get(&path).await.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server and admin account"]
async fn test_admin_advances_order_status() {
    let _orders = placing_orders().await;
    let admin = ApiClient::admin().await;
    let product = admin.create_product("8.00").await;
    let (api, user) = ApiClient::customer().await;

    let order: Value = json_body(
        api.post(
            "/api/orders",
            &json!({ "items": [{ "productId": product["id"], "quantity": 1 }] }),
        )
        .await,
    )
    .await;

    let resp = admin
        .patch(
            &format!("/api/orders/{}/status", order["id"]),
            &json!({ "status": "ready" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = json_body(resp).await;
    assert_eq!(updated["status"], "ready");

    let resp = api
        .patch(
            &format!("/api/orders/{}/status", order["id"]),
            &json!({ "status": "completed" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let mine: Vec<Value> =
        json_body(api.get(&format!("/api/users/{}/orders", user["id"])).await).await;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["status"], "ready");
}
