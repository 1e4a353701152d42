//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error response is JSON: `{"message": "..."}`, plus an `errors` array
//! of `{path, message}` for validation failures.

use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AuthError, CatalogError, OrderError, PaymentError};
use crate::validation::{FieldError, ValidationErrors};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [FieldError]>,
}

/// A classified error: status, public message, and field errors.
type Classified<'a> = (StatusCode, String, Option<&'a [FieldError]>);

const INTERNAL_MESSAGE: &str = "Internal server error";

impl AppError {
    fn classify(&self) -> Classified<'_> {
        let internal = (
            StatusCode::INTERNAL_SERVER_ERROR,
            INTERNAL_MESSAGE.to_string(),
            None,
        );

        match self {
            Self::Database(err) => classify_repository(err).unwrap_or(internal),
            Self::Internal(_) => internal,

            Self::Auth(err) => match err {
                AuthError::Validation(errors) => validation(errors),
                AuthError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string(), None)
                }
                AuthError::UserAlreadyExists => (
                    StatusCode::BAD_REQUEST,
                    "An account with this email already exists".to_string(),
                    None,
                ),
                AuthError::Repository(e) => classify_repository(e).unwrap_or(internal),
                AuthError::PasswordHash => internal,
            },

            Self::Order(err) => match err {
                OrderError::Validation(errors) => validation(errors),
                OrderError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string(), None),
                OrderError::Repository(e) => classify_repository(e).unwrap_or(internal),
            },

            Self::Payment(err) => match err {
                PaymentError::Validation(errors) => validation(errors),
                PaymentError::OrderNotFound(_) | PaymentError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, err.to_string(), None)
                }
                PaymentError::AlreadyPaid(_) => (StatusCode::BAD_REQUEST, err.to_string(), None),
                PaymentError::Repository(e) => classify_repository(e).unwrap_or(internal),
            },

            Self::Catalog(err) => match err {
                CatalogError::Validation(errors) => validation(errors),
                CatalogError::CategoryNotFound(_) | CatalogError::ProductNotFound(_) => {
                    (StatusCode::NOT_FOUND, err.to_string(), None)
                }
                CatalogError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
                CatalogError::Repository(e) => classify_repository(e).unwrap_or(internal),
            },

            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
        }
    }
}

fn validation(errors: &ValidationErrors) -> Classified<'_> {
    (
        StatusCode::BAD_REQUEST,
        "Validation failed".to_string(),
        Some(errors.errors()),
    )
}

/// Client-facing repository errors; `None` means a server error.
fn classify_repository(err: &RepositoryError) -> Option<Classified<'static>> {
    match err {
        RepositoryError::NotFound => Some((StatusCode::NOT_FOUND, "Not found".to_string(), None)),
        RepositoryError::Conflict(msg) => Some((StatusCode::BAD_REQUEST, msg.clone(), None)),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => None,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, errors) = self.classify();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(ErrorBody { message, errors })).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// JSON body extractor whose rejections use the `AppError` body shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        Json(self.0).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use fastlanche_core::{OrderId, PaymentId};

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::UserAlreadyExists)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Payment(PaymentError::AlreadyPaid(OrderId::new(1)))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Payment(PaymentError::NotFound(PaymentId::new(1)))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Catalog(CatalogError::Conflict("in use".to_string()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("items", "must contain at least one item");
        let (status, body) = body_json(AppError::Order(OrderError::Validation(errors))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"][0]["path"], "items");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("bad row 7".to_string()));
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("errors").is_none());
    }
}
