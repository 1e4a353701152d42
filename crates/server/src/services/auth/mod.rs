//! Authentication service.
//!
//! Email and password accounts hashed with Argon2id. Self-registration always
//! creates customers; admins are created from the CLI.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::instrument;

use fastlanche_core::{Email, Role};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, UserRepository};
use crate::models::User;
use crate::validation::ValidationErrors;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Self-registration payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl Registration {
    /// Check every field and return the parsed email.
    ///
    /// # Errors
    ///
    /// Returns every failing field at once.
    pub fn validate(&self) -> Result<Email, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("name", &self.name);

        let email = Email::parse(&self.email)
            .map_err(|e| errors.add("email", e.to_string()))
            .ok();

        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                "password",
                format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
            );
        }

        errors.finish()?;
        email.ok_or_else(|| ValidationErrors::single("email", "is required"))
    }
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if a field is invalid.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<User, AuthError> {
        let email = registration.validate().map_err(AuthError::Validation)?;
        let password_hash = hash_password(&registration.password)?;

        let user = self
            .users
            .create(&NewUser {
                name: registration.name.trim(),
                email: &email,
                password_hash: &password_hash,
                address: registration.address.as_deref(),
                phone: registration.phone.as_deref(),
                role: Role::Customer,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        // A malformed email can't match any account
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        tracing::info!(user_id = %user.id, role = %user.role, "User logged in");
        Ok(user)
    }
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn registration(name: &str, email: &str, password: &str) -> Registration {
        Registration {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            address: None,
            phone: None,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("segredo123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("segredo123", &hash).is_ok());
        assert!(matches!(
            verify_password("errado", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_registration_normalizes_email() {
        let email = registration("Ana", " Ana@Example.com ", "123456")
            .validate()
            .unwrap();
        assert_eq!(email.as_str(), "ana@example.com");
    }

    #[test]
    fn test_registration_reports_all_fields() {
        let errors = registration(" ", "nope", "12345").validate().unwrap_err();
        let paths: Vec<_> = errors.errors().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["name", "email", "password"]);
    }
}
