//! Payment workflow.
//!
//! A payment and the order status change it causes are written in the same
//! transaction. The order change is announced after commit.

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use fastlanche_core::{Money, OrderId, OrderStatus, PaymentId, PaymentMethod, PaymentStatus};

use crate::db::RepositoryError;
use crate::db::orders::OrderRepository;
use crate::db::payments::PaymentRepository;
use crate::models::{Order, Payment};
use crate::realtime::Notifier;
use crate::services::orders::{OrderError, apply_status};
use crate::validation::ValidationErrors;

/// Errors from payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("invalid payment: {0}")]
    Validation(ValidationErrors),

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error("payment {0} not found")]
    NotFound(PaymentId),

    /// Each order takes at most one payment.
    #[error("order {0} already has a payment")]
    AlreadyPaid(OrderId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for PaymentError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

impl From<OrderError> for PaymentError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(id) => Self::OrderNotFound(id),
            OrderError::Validation(errors) => Self::Validation(errors),
            OrderError::Repository(e) => Self::Repository(e),
        }
    }
}

/// Payment workflow service.
pub struct PaymentService<'a> {
    pool: &'a PgPool,
    payments: PaymentRepository<'a>,
    notifier: &'a Notifier,
}

impl<'a> PaymentService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, notifier: &'a Notifier) -> Self {
        Self {
            pool,
            payments: PaymentRepository::new(pool),
            notifier,
        }
    }

    /// Register the payment for an order and mark the order `confirmed`.
    ///
    /// The payment starts `pending`.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Validation` if `amount` is not positive or too
    /// large to store.
    /// Returns `PaymentError::OrderNotFound` if the order doesn't exist.
    /// Returns `PaymentError::AlreadyPaid` if the order already has a payment.
    /// Returns `PaymentError::Repository` if the database operation fails.
    #[instrument(skip(self, external_id))]
    pub async fn create_payment(
        &self,
        order_id: OrderId,
        method: PaymentMethod,
        amount: Money,
        external_id: Option<&str>,
    ) -> Result<(Payment, Order), PaymentError> {
        validate_amount(amount).map_err(PaymentError::Validation)?;

        let mut tx = self.pool.begin().await?;

        // Serializes concurrent payments for the same order
        OrderRepository::lock(&mut tx, order_id)
            .await?
            .ok_or(PaymentError::OrderNotFound(order_id))?;

        if PaymentRepository::exists_for_order(&mut tx, order_id).await? {
            tracing::warn!(%order_id, "Rejected duplicate payment");
            return Err(PaymentError::AlreadyPaid(order_id));
        }

        let payment = PaymentRepository::insert(&mut tx, order_id, method, amount, external_id)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => PaymentError::AlreadyPaid(order_id),
                other => PaymentError::Repository(other),
            })?;

        let order = apply_status(&mut tx, order_id, OrderStatus::Confirmed).await?;
        tx.commit().await?;

        tracing::info!(
            payment_id = %payment.id,
            %order_id,
            %amount,
            "Payment registered"
        );

        self.notifier.notify_order_status_updated(&order);
        Ok((payment, order))
    }

    /// Record a payment outcome and move the order accordingly.
    ///
    /// `approved` sends the order to `preparing` and `rejected` cancels it.
    /// Setting `pending` leaves the order alone. Returns the order only when
    /// it changed.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::NotFound` if the payment doesn't exist.
    /// Returns `PaymentError::Repository` if the database operation fails.
    #[instrument(skip(self))]
    pub async fn update_payment_status(
        &self,
        payment_id: PaymentId,
        status: PaymentStatus,
    ) -> Result<(Payment, Option<Order>), PaymentError> {
        let mut tx = self.pool.begin().await?;

        let payment = PaymentRepository::set_status(&mut tx, payment_id, status)
            .await?
            .ok_or(PaymentError::NotFound(payment_id))?;

        let order = match status.order_effect() {
            Some(order_status) => {
                Some(apply_status(&mut tx, payment.order_id, order_status).await?)
            }
            None => None,
        };

        tx.commit().await?;

        tracing::info!(%payment_id, ?status, "Payment status changed");

        if let Some(order) = &order {
            self.notifier.notify_order_status_updated(order);
        }
        Ok((payment, order))
    }

    /// # Errors
    ///
    /// Returns `PaymentError::NotFound` if the payment doesn't exist.
    /// Returns `PaymentError::Repository` if the database operation fails.
    pub async fn get_payment(&self, payment_id: PaymentId) -> Result<Payment, PaymentError> {
        self.payments
            .get(payment_id)
            .await?
            .ok_or(PaymentError::NotFound(payment_id))
    }

    /// # Errors
    ///
    /// Returns `PaymentError::Repository` if the database operation fails.
    pub async fn get_payment_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<Payment>, PaymentError> {
        Ok(self.payments.get_for_order(order_id).await?)
    }
}

/// A payment amount must be positive and fit the `amount` column.
fn validate_amount(amount: Money) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if amount <= Money::ZERO {
        errors.add("amount", "must be greater than zero");
    }
    errors.require_storable("amount", amount);
    errors.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(amount: Money) -> Vec<String> {
        validate_amount(amount)
            .err()
            .map(|e| e.errors().iter().map(|f| f.message.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_amount_must_be_positive() {
        assert_eq!(rejected(Money::ZERO), vec!["must be greater than zero"]);
        assert_eq!(rejected(Money::from_cents(-500)), vec!["must be greater than zero"]);
        assert!(validate_amount(Money::from_cents(1)).is_ok());
    }

    #[test]
    fn test_amount_must_fit_column() {
        assert!(validate_amount(Money::max_storable()).is_ok());
        assert_eq!(
            rejected(Money::from_cents(10_000_000_000)),
            vec!["must not exceed 99999999.99"]
        );
    }
}
