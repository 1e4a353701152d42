//! Authentication middleware and extractors.
//!
//! Each router group declares a [`Policy`] enforced by [`require_policy`].
//! Handlers then read the user with [`RequireAuth`]; the policy layer has
//! already placed it in the request extensions.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};

/// Access level of a router group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Anyone.
    Public,
    /// Any logged-in user.
    Authenticated,
    /// Logged-in admins only.
    Admin,
}

impl Policy {
    /// Decide whether `user` may pass.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` when a login is required and missing.
    /// Returns `AppError::Forbidden` when an admin is required.
    pub fn check(self, user: Option<&CurrentUser>) -> Result<(), AppError> {
        match (self, user) {
            (Self::Public, _) => Ok(()),
            (Self::Authenticated | Self::Admin, None) => {
                Err(AppError::Unauthorized("Authentication required".to_string()))
            }
            (Self::Admin, Some(user)) if !user.is_admin() => {
                Err(AppError::Forbidden("Admin access required".to_string()))
            }
            (Self::Authenticated | Self::Admin, Some(_)) => Ok(()),
        }
    }
}

/// Route layer enforcing a [`Policy`].
///
/// ```rust,ignore
/// Router::new()
///     .route("/dashboard", get(dashboard))
///     .route_layer(middleware::from_fn_with_state(Policy::Admin, require_policy))
/// ```
///
/// # Errors
///
/// Rejects the request as described in [`Policy::check`].
pub async fn require_policy(
    State(policy): State<Policy>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if policy == Policy::Public {
        return Ok(next.run(request).await);
    }

    let session = request.extensions().get::<Session>().cloned();
    let user = match session {
        Some(session) => load_user(&session).await,
        None => None,
    };

    if let Err(err) = policy.check(user.as_ref()) {
        tracing::debug!(
            ?policy,
            path = %request.uri().path(),
            user_id = ?user.as_ref().map(|u| u.id),
            "Request rejected by policy"
        );
        return Err(err);
    }

    if let Some(user) = user {
        request.extensions_mut().insert(user);
    }
    Ok(next.run(request).await)
}

async fn load_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    if let Some(user) = parts.extensions.get::<CurrentUser>() {
        return Some(user.clone());
    }
    match parts.extensions.get::<Session>() {
        Some(session) => load_user(session).await,
        None => None,
    }
}

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts)
            .await
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Helper to set the current user in the session.
///
/// Cycles the session ID first so a pre-login session cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to end the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use fastlanche_core::{Email, Role, UserId};

    use super::*;

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            id: UserId::new(5),
            name: "Bruno".to_string(),
            email: Email::parse("bruno@example.com").unwrap(),
            role,
        }
    }

    fn status(result: Result<(), AppError>) -> Option<StatusCode> {
        result.err().map(|e| e.into_response().status())
    }

    #[test]
    fn test_public_allows_anyone() {
        assert!(Policy::Public.check(None).is_ok());
    }

    #[test]
    fn test_authenticated_requires_login() {
        assert_eq!(
            status(Policy::Authenticated.check(None)),
            Some(StatusCode::UNAUTHORIZED)
        );
        assert!(Policy::Authenticated.check(Some(&user(Role::Customer))).is_ok());
    }

    #[test]
    fn test_admin_requires_admin_role() {
        assert_eq!(status(Policy::Admin.check(None)), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(
            status(Policy::Admin.check(Some(&user(Role::Customer)))),
            Some(StatusCode::FORBIDDEN)
        );
        assert!(Policy::Admin.check(Some(&user(Role::Admin))).is_ok());
    }
}
