//! CLI subcommands.

pub mod admin;
pub mod migrate;

use secrecy::SecretString;
use sqlx::PgPool;

/// Name of the primary database URL variable.
pub const DATABASE_URL_VAR: &str = "FASTLANCHE_DATABASE_URL";

/// Read the database URL, falling back to `DATABASE_URL`.
///
/// Loads `.env` first if present.
pub fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();
    std::env::var(DATABASE_URL_VAR)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

/// Connect with the server's pool settings.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn connect(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Connecting to database...");
    fastlanche_server::db::create_pool(database_url).await
}
