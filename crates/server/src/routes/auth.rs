//! Authentication route handlers.
//!
//! Login stores a [`CurrentUser`] in the session; the session cookie is the
//! only credential the API accepts.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tower_sessions::Session;

use crate::db::users::UserRepository;
use crate::error::{ApiJson, AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::{AuthService, Registration};
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<ApiJson<User>> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    start_session(&session, &user).await?;
    Ok(ApiJson(user))
}

/// POST /api/auth/register
///
/// Creates a customer account and logs it in.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<Registration>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool()).register(&body).await?;

    start_session(&session, &user).await?;
    Ok((StatusCode::CREATED, ApiJson(user)))
}

/// POST /api/auth/logout
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("failed to end session: {e}")))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<ApiJson<User>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;
    Ok(ApiJson(user))
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user))
        .await
        .map_err(|e| AppError::Internal(format!("failed to store session: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}
