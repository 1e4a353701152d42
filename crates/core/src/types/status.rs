//! Status enums for orders, payments, and user roles.
//!
//! Each enum maps 1:1 to a Postgres enum type created by the server's
//! migrations and serializes as `snake_case` on the wire.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// The intended progression is
/// `pending → confirmed → preparing → ready → delivery → completed`, with
/// `canceled` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Submitted, not yet paid.
    #[default]
    Pending,
    /// A payment has been registered.
    Confirmed,
    /// Payment approved, kitchen is working on it.
    Preparing,
    /// Ready for pickup; the ticket gets called.
    Ready,
    /// Out for delivery.
    Delivery,
    /// Delivered or picked up.
    Completed,
    /// Canceled by an admin or by a rejected payment.
    Canceled,
}

impl OrderStatus {
    /// All statuses, in progression order.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Confirmed,
        Self::Preparing,
        Self::Ready,
        Self::Delivery,
        Self::Completed,
        Self::Canceled,
    ];

    /// Statuses counted as "pending" on the admin dashboard.
    pub const OPEN: [Self; 4] = [Self::Pending, Self::Confirmed, Self::Preparing, Self::Ready];

    /// Whether the order still needs attention from the kitchen.
    #[must_use]
    pub fn is_open(self) -> bool {
        Self::OPEN.contains(&self)
    }

    /// Whether no further transitions are expected.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }

    /// Whether `next` follows the normal forward progression from `self`.
    ///
    /// Admins may still set any status; this only classifies the move.
    #[must_use]
    pub const fn progression_allows(self, next: Self) -> bool {
        match (self, next) {
            (Self::Pending, Self::Confirmed)
            | (Self::Confirmed, Self::Preparing)
            | (Self::Preparing, Self::Ready)
            | (Self::Ready, Self::Delivery | Self::Completed)
            | (Self::Delivery, Self::Completed) => true,
            (current, Self::Canceled) => !current.is_terminal(),
            _ => false,
        }
    }

    /// The wire and database name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Delivery => "delivery",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl PaymentStatus {
    /// The order status forced when a payment moves into this state.
    ///
    /// Approval sends the order to the kitchen and rejection cancels it.
    /// Moving back to `pending` leaves the order alone.
    #[must_use]
    pub const fn order_effect(self) -> Option<OrderStatus> {
        match self {
            Self::Pending => None,
            Self::Approved => Some(OrderStatus::Preparing),
            Self::Rejected => Some(OrderStatus::Canceled),
        }
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Instant bank transfer.
    Pix,
    /// Credit or debit card.
    Card,
}

/// User role gating authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_statuses_match_dashboard_definition() {
        let open: Vec<_> = OrderStatus::ALL.into_iter().filter(|s| s.is_open()).collect();
        assert_eq!(
            open,
            vec![
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Preparing,
                OrderStatus::Ready,
            ]
        );
    }

    #[test]
    fn test_forward_progression() {
        assert!(OrderStatus::Pending.progression_allows(OrderStatus::Confirmed));
        assert!(OrderStatus::Ready.progression_allows(OrderStatus::Delivery));
        assert!(OrderStatus::Ready.progression_allows(OrderStatus::Completed));
        assert!(OrderStatus::Preparing.progression_allows(OrderStatus::Canceled));
        assert!(!OrderStatus::Completed.progression_allows(OrderStatus::Canceled));
        assert!(!OrderStatus::Ready.progression_allows(OrderStatus::Pending));
        assert!(!OrderStatus::Pending.progression_allows(OrderStatus::Ready));
    }

    #[test]
    fn test_payment_effects() {
        assert_eq!(PaymentStatus::Pending.order_effect(), None);
        assert_eq!(
            PaymentStatus::Approved.order_effect(),
            Some(OrderStatus::Preparing)
        );
        assert_eq!(
            PaymentStatus::Rejected.order_effect(),
            Some(OrderStatus::Canceled)
        );
    }

    #[test]
    fn test_order_status_round_trips_through_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.to_string().parse::<OrderStatus>(), Ok(status));
        }
        assert!("entregue".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Delivery).ok().as_deref(),
            Some("\"delivery\"")
        );
        assert_eq!(
            serde_json::from_str::<PaymentMethod>("\"pix\"").ok(),
            Some(PaymentMethod::Pix)
        );
        assert!(serde_json::from_str::<OrderStatus>("\"shipped\"").is_err());
    }
}
