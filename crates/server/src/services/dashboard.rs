//! Admin dashboard figures.

use serde::Serialize;
use sqlx::PgPool;

use fastlanche_core::{Money, OrderStatus};

use crate::db::RepositoryError;
use crate::db::dashboard::{self, StatusTotals};
use crate::db::products::ProductRepository;

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_orders: i64,
    /// Sum of `completed` order totals.
    pub total_sales: Money,
    /// Orders not yet handed over or canceled.
    pub pending_orders: i64,
    pub product_count: i64,
}

impl DashboardStats {
    /// Fold per-status totals into the dashboard figures.
    #[must_use]
    pub fn tally(totals: &[StatusTotals], product_count: i64) -> Self {
        let mut stats = Self {
            total_orders: 0,
            total_sales: Money::ZERO,
            pending_orders: 0,
            product_count,
        };

        for row in totals {
            stats.total_orders += row.orders;
            if row.status.is_open() {
                stats.pending_orders += row.orders;
            }
            if row.status == OrderStatus::Completed {
                stats.total_sales = stats.total_sales + row.sales;
            }
        }

        stats
    }
}

/// Compute the dashboard figures.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn stats(pool: &PgPool) -> Result<DashboardStats, RepositoryError> {
    let totals = dashboard::totals_by_status(pool).await?;
    let product_count = ProductRepository::new(pool).count().await?;
    Ok(DashboardStats::tally(&totals, product_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: OrderStatus, orders: i64, cents: i64) -> StatusTotals {
        StatusTotals {
            status,
            orders,
            sales: Money::from_cents(cents),
        }
    }

    #[test]
    fn test_tally() {
        let totals = [
            row(OrderStatus::Pending, 3, 9000),
            row(OrderStatus::Preparing, 2, 5000),
            row(OrderStatus::Ready, 1, 2500),
            row(OrderStatus::Delivery, 1, 1800),
            row(OrderStatus::Completed, 4, 12050),
            row(OrderStatus::Canceled, 2, 4000),
        ];

        let stats = DashboardStats::tally(&totals, 17);

        assert_eq!(stats.total_orders, 13);
        assert_eq!(stats.pending_orders, 6);
        assert_eq!(stats.total_sales, Money::from_cents(12050));
        assert_eq!(stats.product_count, 17);
    }

    #[test]
    fn test_tally_without_orders() {
        let stats = DashboardStats::tally(&[], 0);
        assert_eq!(stats.total_orders, 0);
        assert_eq!(stats.pending_orders, 0);
        assert_eq!(stats.total_sales, Money::ZERO);
    }
}
