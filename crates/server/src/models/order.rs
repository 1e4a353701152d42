//! Orders and order items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fastlanche_core::{Money, OrderId, OrderItemId, OrderStatus, ProductId, UserId};

use super::Product;

/// An order header.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    /// Sum of item subtotals at creation time.
    pub total: Money,
    pub address: String,
    pub ticket_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line of an order. `price` is the unit price when the order was placed.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Money,
    pub subtotal: Money,
}

/// An order item with its product.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemDetail {
    #[serde(flatten)]
    pub item: OrderItem,
    /// `None` only if the product row was removed after ordering.
    pub product: Option<Product>,
}

/// An order with all of its items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
}

/// One cart line in an order request.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
}
