//! Payment repository.

use sqlx::{PgConnection, PgPool};

use fastlanche_core::{Money, OrderId, PaymentId, PaymentMethod, PaymentStatus};

use super::RepositoryError;
use crate::models::Payment;

/// Repository for payment database operations.
pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    /// Create a new payment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a payment by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(payment)
    }

    /// Get the payment registered for an order, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Payment>, RepositoryError> {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE order_id = $1")
            .bind(order_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(payment)
    }

    // =========================================================================
    // Transactional writes
    // =========================================================================

    /// Whether an order already has a payment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists_for_order(
        conn: &mut PgConnection,
        order_id: OrderId,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM payments WHERE order_id = $1)",
        )
        .bind(order_id)
        .fetch_one(conn)
        .await?;
        Ok(exists)
    }

    /// Insert a `pending` payment.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order already has a payment.
    pub async fn insert(
        conn: &mut PgConnection,
        order_id: OrderId,
        method: PaymentMethod,
        amount: Money,
        external_id: Option<&str>,
    ) -> Result<Payment, RepositoryError> {
        sqlx::query_as::<_, Payment>(
            r"
            INSERT INTO payments (order_id, method, status, amount, external_id)
            VALUES ($1, $2, 'pending', $3, $4)
            RETURNING *
            ",
        )
        .bind(order_id)
        .bind(method)
        .bind(amount)
        .bind(external_id)
        .fetch_one(conn)
        .await
        .map_err(|e| RepositoryError::from_write(e, "payment for this order"))
    }

    /// Set a payment's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_status(
        conn: &mut PgConnection,
        id: PaymentId,
        status: PaymentStatus,
    ) -> Result<Option<Payment>, RepositoryError> {
        let payment = sqlx::query_as::<_, Payment>(
            r"
            UPDATE payments SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(conn)
        .await?;
        Ok(payment)
    }
}
