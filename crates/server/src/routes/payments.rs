//! Payment route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use fastlanche_core::{Money, OrderId, PaymentId, PaymentMethod, PaymentStatus};

use super::ensure_access;
use crate::db::orders::OrderRepository;
use crate::error::{ApiJson, AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Payment;
use crate::state::AppState;

/// Payment registration body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub order_id: OrderId,
    pub method: PaymentMethod,
    pub amount: Money,
    pub external_id: Option<String>,
}

/// Payment outcome body.
#[derive(Debug, Deserialize)]
pub struct PaymentStatusUpdate {
    pub status: PaymentStatus,
}

/// POST /api/payments
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<CreatePaymentRequest>,
) -> Result<impl IntoResponse> {
    let order = OrderRepository::new(state.pool())
        .get(body.order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", body.order_id)))?;
    ensure_access(&user, order.user_id)?;

    let (payment, _order) = state
        .payments()
        .create_payment(
            body.order_id,
            body.method,
            body.amount,
            body.external_id.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, ApiJson(payment)))
}

/// GET /api/payments/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<PaymentId>,
) -> Result<ApiJson<Payment>> {
    let payment = state.payments().get_payment(id).await?;

    let owner = OrderRepository::new(state.pool())
        .get(payment.order_id)
        .await?
        .map(|order| order.user_id)
        .ok_or_else(|| AppError::NotFound(format!("payment {id} not found")))?;
    ensure_access(&user, owner)?;

    Ok(ApiJson(payment))
}

/// PATCH /api/payments/{id}/status (admin)
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<PaymentId>,
    ApiJson(body): ApiJson<PaymentStatusUpdate>,
) -> Result<ApiJson<Payment>> {
    let (payment, _order) = state
        .payments()
        .update_payment_status(id, body.status)
        .await?;
    Ok(ApiJson(payment))
}
