//! Payments.

use chrono::{DateTime, Utc};
use serde::Serialize;

use fastlanche_core::{Money, OrderId, PaymentId, PaymentMethod, PaymentStatus};

/// A payment registered against an order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub amount: Money,
    /// Reference from the payment provider (PIX transaction id, card NSU).
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
