//! Database operations for the ordering backend.
//!
//! ## Tables
//!
//! - `users` - Customer and admin accounts
//! - `categories`, `products` - The catalog
//! - `orders`, `order_items` - Orders and their price snapshots
//! - `payments` - At most one payment per order
//! - `system_info` - Key/value state (the daily ticket counter)
//! - `tower_sessions.session` - Session storage
//!
//! Repositories hold a `&PgPool` for standalone reads and writes. Writes that
//! must commit together with others (order creation, payment side effects)
//! are associated functions taking `&mut PgConnection`, so the caller owns
//! the transaction.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p fastlanche-cli -- migrate
//! ```

pub mod categories;
pub mod dashboard;
pub mod orders;
pub mod payments;
pub mod products;
pub mod system_info;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors returned by repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique or foreign-key constraint violation.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a sqlx error, turning constraint violations into `Conflict`.
    ///
    /// `what` describes the conflicting entity for the error message.
    pub(crate) fn from_write(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict(format!("{what} already exists"));
            }
            if db_err.is_foreign_key_violation() {
                return Self::Conflict(format!("{what} references a missing or in-use row"));
            }
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
