//! Admin account management.
//!
//! Self-registration only creates customers, so the first admin (and any
//! later ones) are created here.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use fastlanche_core::{Email, EmailError, Role, UserId};
use fastlanche_server::db::RepositoryError;
use fastlanche_server::db::users::{NewUser, UserRepository};
use fastlanche_server::services::auth::{self, AuthError, MIN_PASSWORD_LENGTH};

use super::{DATABASE_URL_VAR, connect, database_url};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Password must be at least {} characters", MIN_PASSWORD_LENGTH)]
    WeakPassword,

    #[error("Display name is required")]
    MissingName,

    /// User already exists.
    #[error("A user already exists with email: {0}")]
    UserExists(String),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] AuthError),
}

/// Create an admin account.
///
/// # Errors
///
/// Returns an error if the input is invalid, the email is taken, or the
/// database is unreachable.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &SecretString,
) -> Result<UserId, AdminError> {
    let email = Email::parse(email)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AdminError::MissingName);
    }
    if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AdminError::WeakPassword);
    }

    let database_url = database_url().ok_or(AdminError::MissingEnvVar(DATABASE_URL_VAR))?;
    let pool = connect(&database_url).await?;

    tracing::info!("Creating admin user: {email}");

    let password_hash = auth::hash_password(password.expose_secret())?;
    let user = UserRepository::new(&pool)
        .create(&NewUser {
            name,
            email: &email,
            password_hash: &password_hash,
            address: None,
            phone: None,
            role: Role::Admin,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id)
}
