//! `system_info` key/value storage.
//!
//! Values are JSONB. Reads that feed a read-modify-write go through
//! [`lock`], which holds the row lock until the caller's transaction ends.

use serde_json::Value as JsonValue;
use sqlx::PgConnection;

use super::RepositoryError;

/// Key holding the daily ticket counter.
pub const TICKET_COUNTER_KEY: &str = "ticket_counter";

/// Lock the row for `key` and return its value, inserting `seed` first if the
/// key is missing.
///
/// Concurrent callers on the same key queue behind the first until its
/// transaction commits or rolls back.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn lock(
    conn: &mut PgConnection,
    key: &str,
    seed: &JsonValue,
) -> Result<JsonValue, RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO system_info (key, value)
        VALUES ($1, $2)
        ON CONFLICT (key) DO NOTHING
        ",
    )
    .bind(key)
    .bind(seed)
    .execute(&mut *conn)
    .await?;

    let value =
        sqlx::query_scalar::<_, JsonValue>("SELECT value FROM system_info WHERE key = $1 FOR UPDATE")
            .bind(key)
            .fetch_one(&mut *conn)
            .await?;
    Ok(value)
}

/// Set a value, inserting the key if needed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn set(
    conn: &mut PgConnection,
    key: &str,
    value: &JsonValue,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO system_info (key, value)
        VALUES ($1, $2)
        ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = NOW()
        ",
    )
    .bind(key)
    .bind(value)
    .execute(conn)
    .await?;
    Ok(())
}
