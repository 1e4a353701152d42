//! Order route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use fastlanche_core::{OrderId, OrderStatus, UserId};

use super::ensure_access;
use crate::db::users::UserRepository;
use crate::error::{ApiJson, AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{NewOrderItem, Order, OrderWithItems, Payment};
use crate::state::AppState;

/// Order placement body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Delivery address; defaults to the address on the account.
    pub address: Option<String>,
    pub items: Vec<NewOrderItem>,
}

/// Status change body.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// GET /api/orders (admin)
pub async fn index(State(state): State<AppState>) -> Result<ApiJson<Vec<Order>>> {
    Ok(ApiJson(state.orders().list_orders().await?))
}

/// POST /api/orders
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<CreateOrderRequest>,
) -> Result<impl IntoResponse> {
    let address = match body.address {
        Some(address) => address,
        None => UserRepository::new(state.pool())
            .get_by_id(user.id)
            .await?
            .and_then(|u| u.address)
            .unwrap_or_default(),
    };

    let order = state
        .orders()
        .create_order(user.id, &address, &body.items)
        .await?;
    Ok((StatusCode::CREATED, ApiJson(order)))
}

/// GET /api/orders/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<ApiJson<OrderWithItems>> {
    let order = state
        .orders()
        .get_order_with_items(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

    ensure_access(&user, order.order.user_id)?;
    Ok(ApiJson(order))
}

/// PATCH /api/orders/{id}/status (admin)
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> Result<ApiJson<Order>> {
    Ok(ApiJson(state.orders().update_status(id, body.status).await?))
}

/// GET /api/orders/{id}/payment
pub async fn payment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<ApiJson<Payment>> {
    let order = state
        .orders()
        .get_order_with_items(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;
    ensure_access(&user, order.order.user_id)?;

    let payment = state
        .payments()
        .get_payment_for_order(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id} has no payment")))?;
    Ok(ApiJson(payment))
}

/// GET /api/users/{user_id}/orders
pub async fn for_user(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(user_id): Path<UserId>,
) -> Result<ApiJson<Vec<Order>>> {
    ensure_access(&user, user_id)?;
    Ok(ApiJson(state.orders().list_orders_for_user(user_id).await?))
}
