//! Real-time order notifications.
//!
//! ```text
//! OrderService / PaymentService (after commit)
//!       │ notify_new_order / notify_order_status_updated
//!       ▼
//! Notifier
//!   ├── admin: broadcast::Sender<OrderEvent>           (every order)
//!   └── customers: UserId → broadcast::Sender          (own orders only)
//!         │
//!         ▼
//! WebSocket sessions (GET /ws), one forwarder task per subscribed channel
//! ```
//!
//! Delivery is fire-and-forget: an event published while nobody listens on
//! a channel is dropped, and a subscriber that falls too far behind skips
//! the events it missed.

pub mod socket;

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;

use fastlanche_core::{OrderStatus, UserId};

use crate::models::{Order, OrderWithItems};

/// Per-channel buffer. Subscribers more than this many events behind lag.
const CHANNEL_CAPACITY: usize = 256;

/// An audience for order events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Staff screens; receives every order.
    Admin,
    /// One customer's own orders.
    Customer(UserId),
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::Customer(user_id) => write!(f, "customer-{user_id}"),
        }
    }
}

/// An event pushed to subscribers, serialized as `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum OrderEvent {
    /// A new order with its items and products.
    #[serde(rename = "order:new")]
    New(Box<OrderWithItems>),
    /// An order's status changed.
    #[serde(rename = "order:updated")]
    Updated(Box<Order>),
    /// An order became ready for pickup.
    #[serde(rename = "order:ready")]
    Ready(Box<Order>),
}

/// Fan-out hub for order events.
///
/// Cheaply cloneable; all clones share the same channels.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

struct NotifierInner {
    admin: broadcast::Sender<OrderEvent>,
    customers: DashMap<UserId, broadcast::Sender<OrderEvent>>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        let (admin, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(NotifierInner {
                admin,
                customers: DashMap::new(),
            }),
        }
    }

    /// Start receiving events published to `channel` from now on.
    #[must_use]
    pub fn subscribe(&self, channel: Channel) -> broadcast::Receiver<OrderEvent> {
        match channel {
            Channel::Admin => self.inner.admin.subscribe(),
            Channel::Customer(user_id) => self
                .inner
                .customers
                .entry(user_id)
                .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
                .subscribe(),
        }
    }

    /// Drop a customer channel once its last receiver is gone.
    ///
    /// Call after dropping a receiver obtained from [`Self::subscribe`].
    pub fn release(&self, channel: Channel) {
        if let Channel::Customer(user_id) = channel {
            self.inner
                .customers
                .remove_if(&user_id, |_, tx| tx.receiver_count() == 0);
        }
    }

    /// Number of live receivers on `channel`.
    #[must_use]
    pub fn subscriber_count(&self, channel: Channel) -> usize {
        match channel {
            Channel::Admin => self.inner.admin.receiver_count(),
            Channel::Customer(user_id) => self
                .inner
                .customers
                .get(&user_id)
                .map_or(0, |tx| tx.receiver_count()),
        }
    }

    /// Announce a new order to admins and to its owner.
    pub fn notify_new_order(&self, order: &OrderWithItems) {
        tracing::debug!(order_id = %order.order.id, "Publishing order:new");
        self.publish(order.order.user_id, &OrderEvent::New(Box::new(order.clone())));
    }

    /// Announce a status change to admins and to the order's owner.
    ///
    /// An order entering `ready` additionally gets an `order:ready` event.
    pub fn notify_order_status_updated(&self, order: &Order) {
        tracing::debug!(order_id = %order.id, status = %order.status, "Publishing order:updated");
        self.publish(order.user_id, &OrderEvent::Updated(Box::new(order.clone())));

        if order.status == OrderStatus::Ready {
            self.publish(order.user_id, &OrderEvent::Ready(Box::new(order.clone())));
        }
    }

    fn publish(&self, owner: UserId, event: &OrderEvent) {
        // send() only fails when there are no receivers
        let _ = self.inner.admin.send(event.clone());

        if let Some(tx) = self.inner.customers.get(&owner) {
            let _ = tx.send(event.clone());
        }
    }
}
