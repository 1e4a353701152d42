//! Aggregate queries for the admin dashboard.

use sqlx::PgPool;

use fastlanche_core::{Money, OrderStatus};

use super::RepositoryError;

/// Order count and summed totals for one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct StatusTotals {
    pub status: OrderStatus,
    pub orders: i64,
    pub sales: Money,
}

/// Group all orders by status.
///
/// Statuses with no orders are absent.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn totals_by_status(pool: &PgPool) -> Result<Vec<StatusTotals>, RepositoryError> {
    let rows = sqlx::query_as::<_, StatusTotals>(
        r"
        SELECT status, COUNT(*) AS orders, SUM(total) AS sales
        FROM orders
        GROUP BY status
        ",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
