//! Database migration command.
//!
//! Applies the server schema from `crates/server/migrations/`, then creates
//! the `tower_sessions` table used by the session store.

use sqlx::migrate::MigrateError;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use super::{DATABASE_URL_VAR, connect, database_url};

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] MigrateError),
}

/// Run all migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = database_url().ok_or(MigrationError::MissingEnvVar(DATABASE_URL_VAR))?;
    let pool = connect(&database_url).await?;

    tracing::info!("Running schema migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Running session store migration...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
