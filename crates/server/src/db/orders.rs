//! Order repository.

use sqlx::{PgConnection, PgPool};

use fastlanche_core::{Money, OrderId, OrderStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderItem};

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order header by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(order)
    }

    /// Items of an order, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;
        Ok(items)
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
            .fetch_all(self.pool)
            .await?;
        Ok(orders)
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    // =========================================================================
    // Transactional writes
    // =========================================================================

    /// Insert an order header with status `pending`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        conn: &mut PgConnection,
        user_id: UserId,
        total: Money,
        address: &str,
        ticket_number: &str,
    ) -> Result<Order, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            INSERT INTO orders (user_id, status, total, address, ticket_number)
            VALUES ($1, 'pending', $2, $3, $4)
            RETURNING *
            ",
        )
        .bind(user_id)
        .bind(total)
        .bind(address)
        .bind(ticket_number)
        .fetch_one(conn)
        .await?;
        Ok(order)
    }

    /// Insert one order item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_item(
        conn: &mut PgConnection,
        order_id: OrderId,
        product_id: ProductId,
        quantity: i32,
        price: Money,
        subtotal: Money,
    ) -> Result<OrderItem, RepositoryError> {
        let item = sqlx::query_as::<_, OrderItem>(
            r"
            INSERT INTO order_items (order_id, product_id, quantity, price, subtotal)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            ",
        )
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .bind(price)
        .bind(subtotal)
        .fetch_one(conn)
        .await?;
        Ok(item)
    }

    /// Lock an order row for the rest of the transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock(
        conn: &mut PgConnection,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(order)
    }

    /// Set an order's status and bump `updated_at`.
    ///
    /// Returns the updated order and the status it had before, or `None` if
    /// the order doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_status(
        conn: &mut PgConnection,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<(Order, OrderStatus)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            order: Order,
            previous_status: OrderStatus,
        }

        let row = sqlx::query_as::<_, Row>(
            r"
            WITH previous AS (
                SELECT id, status FROM orders WHERE id = $1 FOR UPDATE
            )
            UPDATE orders o
            SET status = $2, updated_at = NOW()
            FROM previous
            WHERE o.id = previous.id
            RETURNING o.*, previous.status AS previous_status
            ",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(conn)
        .await?;

        Ok(row.map(|r| (r.order, r.previous_status)))
    }
}
