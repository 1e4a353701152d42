//! Order workflow.
//!
//! Order creation prices every line from the catalog, issues a ticket, and
//! writes the order with its items in one transaction. Status changes are
//! persisted first and announced to the notifier only after commit.

use std::collections::HashMap;

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use fastlanche_core::{Money, OrderId, OrderStatus, ProductId, UserId};

use crate::db::RepositoryError;
use crate::db::orders::OrderRepository;
use crate::db::products::ProductRepository;
use crate::models::{NewOrderItem, Order, OrderItemDetail, OrderWithItems, Product};
use crate::realtime::Notifier;
use crate::services::tickets;
use crate::validation::ValidationErrors;

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The request was rejected before anything was written.
    #[error("invalid order: {0}")]
    Validation(ValidationErrors),

    #[error("order {0} not found")]
    NotFound(OrderId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// One priced order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Money,
    pub subtotal: Money,
}

/// A validated, priced order that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub address: String,
    pub lines: Vec<DraftLine>,
    pub total: Money,
}

impl OrderDraft {
    /// Validate the requested items against the catalog and price them.
    ///
    /// Prices always come from `products`, never from the client. Every
    /// problem is reported, each under the path of the offending field.
    ///
    /// # Errors
    ///
    /// Returns the collected `ValidationErrors` if the address is blank, the
    /// item list is empty, a quantity is not positive, a product is missing
    /// or unavailable, or a subtotal or the total is too large to store.
    pub fn build(
        address: &str,
        items: &[NewOrderItem],
        products: &[Product],
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("address", address);
        if items.is_empty() {
            errors.add("items", "must contain at least one item");
        }

        let catalog: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();
        let mut lines = Vec::with_capacity(items.len());

        for (i, item) in items.iter().enumerate() {
            if item.quantity <= 0 {
                errors.add(format!("items[{i}].quantity"), "must be greater than zero");
            }

            match catalog.get(&item.product_id) {
                None => errors.add(
                    format!("items[{i}].productId"),
                    format!("product {} does not exist", item.product_id),
                ),
                Some(product) if !product.available => errors.add(
                    format!("items[{i}].productId"),
                    format!("product {} is not available", item.product_id),
                ),
                Some(product) => {
                    let subtotal = product.price.times(item.quantity);
                    if !subtotal.is_storable() {
                        errors.add(
                            format!("items[{i}].quantity"),
                            format!("subtotal must not exceed {}", Money::max_storable()),
                        );
                    }
                    lines.push(DraftLine {
                        product_id: product.id,
                        quantity: item.quantity,
                        price: product.price,
                        subtotal,
                    });
                }
            }
        }

        let total: Money = lines.iter().map(|line| line.subtotal).sum();
        if errors.is_empty() {
            errors.require_storable("total", total);
        }
        errors.finish()?;

        Ok(Self {
            address: address.trim().to_string(),
            lines,
            total,
        })
    }
}

/// Order workflow service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
    orders: OrderRepository<'a>,
    products: ProductRepository<'a>,
    notifier: &'a Notifier,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, notifier: &'a Notifier) -> Self {
        Self {
            pool,
            orders: OrderRepository::new(pool),
            products: ProductRepository::new(pool),
            notifier,
        }
    }

    /// Place an order for `user_id`.
    ///
    /// The order starts `pending` with a fresh ticket number. Nothing is
    /// written unless every item validates.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` if the request is invalid.
    /// Returns `OrderError::Repository` if the database operation fails.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        address: &str,
        items: &[NewOrderItem],
    ) -> Result<OrderWithItems, OrderError> {
        let mut tx = self.pool.begin().await?;

        let product_ids: Vec<ProductId> = items.iter().map(|item| item.product_id).collect();
        let products = ProductRepository::lock_for_order(&mut tx, &product_ids).await?;

        let draft = OrderDraft::build(address, items, &products).map_err(|errors| {
            tracing::warn!(%errors, "Rejected order");
            OrderError::Validation(errors)
        })?;

        let today = chrono::Local::now().date_naive();
        let ticket = tickets::issue_ticket(&mut tx, today).await?;

        let order = OrderRepository::insert(
            &mut tx,
            user_id,
            draft.total,
            &draft.address,
            &ticket.to_string(),
        )
        .await?;

        for line in &draft.lines {
            OrderRepository::insert_item(
                &mut tx,
                order.id,
                line.product_id,
                line.quantity,
                line.price,
                line.subtotal,
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            %ticket,
            total = %order.total,
            "Order created"
        );

        let created = self
            .get_order_with_items(order.id)
            .await?
            .ok_or(OrderError::NotFound(order.id))?;
        self.notifier.notify_new_order(&created);

        Ok(created)
    }

    /// Set an order's status.
    ///
    /// Any status is accepted so staff can correct mistakes; moves outside
    /// the normal progression are logged.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order doesn't exist.
    /// Returns `OrderError::Repository` if the database operation fails.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;
        let order = apply_status(&mut tx, order_id, status).await?;
        tx.commit().await?;

        self.notifier.notify_order_status_updated(&order);
        Ok(order)
    }

    /// Load an order with its items and their products.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the database operation fails.
    pub async fn get_order_with_items(
        &self,
        order_id: OrderId,
    ) -> Result<Option<OrderWithItems>, OrderError> {
        let Some(order) = self.orders.get(order_id).await? else {
            return Ok(None);
        };

        let items = self.orders.items(order_id).await?;
        let product_ids: Vec<ProductId> = items.iter().map(|item| item.product_id).collect();
        let products: HashMap<ProductId, Product> = self
            .products
            .get_many(&product_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let items = items
            .into_iter()
            .map(|item| OrderItemDetail {
                product: products.get(&item.product_id).cloned(),
                item,
            })
            .collect();

        Ok(Some(OrderWithItems { order, items }))
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the database operation fails.
    pub async fn list_orders(&self) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list().await?)
    }

    /// One user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the database operation fails.
    pub async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list_for_user(user_id).await?)
    }
}

/// Persist a status change inside an open transaction.
///
/// Shared by the order and payment workflows. The caller notifies after
/// committing.
pub(crate) async fn apply_status(
    conn: &mut sqlx::PgConnection,
    order_id: OrderId,
    status: OrderStatus,
) -> Result<Order, OrderError> {
    let (order, previous) = OrderRepository::set_status(conn, order_id, status)
        .await?
        .ok_or(OrderError::NotFound(order_id))?;

    if previous.progression_allows(status) {
        tracing::info!(%order_id, from = %previous, to = %status, "Order status changed");
    } else {
        tracing::warn!(
            %order_id,
            from = %previous,
            to = %status,
            "Order status changed outside the normal progression"
        );
    }

    Ok(order)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use fastlanche_core::CategoryId;

    use super::*;

    fn product(id: i32, cents: i64, available: bool) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Produto {id}"),
            description: None,
            price: Money::from_cents(cents),
            image_url: None,
            is_featured: false,
            is_promotion: false,
            old_price: None,
            category_id: CategoryId::new(1),
            available,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(product_id: i32, quantity: i32) -> NewOrderItem {
        NewOrderItem {
            product_id: ProductId::new(product_id),
            quantity,
        }
    }

    fn paths(errors: &ValidationErrors) -> Vec<&str> {
        errors.errors().iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn test_prices_lines_from_catalog() {
        let products = [product(1, 2190, true), product(2, 800, true)];
        let draft =
            OrderDraft::build(" Rua A, 12 ", &[item(1, 2), item(2, 3)], &products).unwrap();

        assert_eq!(draft.address, "Rua A, 12");
        assert_eq!(draft.lines.len(), 2);
        assert_eq!(draft.lines[0].price, Money::from_cents(2190));
        assert_eq!(draft.lines[0].subtotal, Money::from_cents(4380));
        assert_eq!(draft.lines[1].subtotal, Money::from_cents(2400));
        assert_eq!(draft.total, Money::from_cents(6780));
    }

    #[test]
    fn test_same_product_on_two_lines() {
        let products = [product(1, 1000, true)];
        let draft = OrderDraft::build("Rua A", &[item(1, 1), item(1, 2)], &products).unwrap();
        assert_eq!(draft.lines.len(), 2);
        assert_eq!(draft.total, Money::from_cents(3000));
    }

    #[test]
    fn test_empty_order_is_rejected() {
        let errors = OrderDraft::build("Rua A", &[], &[]).unwrap_err();
        assert_eq!(paths(&errors), vec!["items"]);
    }

    #[test]
    fn test_blank_address_is_rejected() {
        let products = [product(1, 1000, true)];
        let errors = OrderDraft::build("  ", &[item(1, 1)], &products).unwrap_err();
        assert_eq!(paths(&errors), vec!["address"]);
    }

    #[test]
    fn test_unavailable_product_is_rejected() {
        let products = [product(1, 1000, true), product(2, 500, false)];
        let errors =
            OrderDraft::build("Rua A", &[item(1, 1), item(2, 1)], &products).unwrap_err();
        assert_eq!(paths(&errors), vec!["items[1].productId"]);
        assert!(errors.errors()[0].message.contains("not available"));
    }

    #[test]
    fn test_oversized_line_is_rejected() {
        let products = [product(1, 2190, true)];
        let errors = OrderDraft::build("Rua A", &[item(1, 50_000_000)], &products).unwrap_err();
        assert_eq!(paths(&errors), vec!["items[0].quantity"]);
    }

    #[test]
    fn test_oversized_total_is_rejected() {
        // Each line fits the column on its own; together they do not
        let products = [product(1, 1_000_000_000, true)];
        let errors =
            OrderDraft::build("Rua A", &[item(1, 9), item(1, 9)], &products).unwrap_err();
        assert_eq!(paths(&errors), vec!["total"]);
    }

    #[test]
    fn test_total_at_column_limit_is_accepted() {
        let products = [product(1, 9_999_999_999, true)];
        let draft = OrderDraft::build("Rua A", &[item(1, 1)], &products).unwrap();
        assert_eq!(draft.total, Money::max_storable());
    }

    #[test]
    fn test_reports_every_bad_item() {
        let products = [product(1, 1000, true)];
        let errors =
            OrderDraft::build("Rua A", &[item(1, 0), item(99, 1), item(1, -2)], &products)
                .unwrap_err();
        assert_eq!(
            paths(&errors),
            vec!["items[0].quantity", "items[1].productId", "items[2].quantity"]
        );
    }
}
