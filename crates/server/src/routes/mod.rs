//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (login/register rate limited per IP)
//! POST   /api/auth/login             - Login, starts a session
//! POST   /api/auth/register          - Create a customer account
//! POST   /api/auth/logout            - End the session
//! GET    /api/auth/me                - Current user (auth)
//!
//! # Catalog (reads public, writes admin)
//! GET    /api/categories             POST (admin)
//! GET    /api/categories/{id}        PUT, DELETE (admin)
//! GET    /api/products[?categoryId]  POST (admin)
//! GET    /api/products/featured
//! GET    /api/products/promotions
//! GET    /api/products/{id}          PUT, DELETE (admin)
//!
//! # Orders
//! GET    /api/orders                 - All orders (admin)
//! POST   /api/orders                 - Place an order (auth)
//! GET    /api/orders/{id}            - Order with items (owner/admin)
//! PATCH  /api/orders/{id}/status     - Change status (admin)
//! GET    /api/orders/{id}/payment    - The order's payment (owner/admin)
//! GET    /api/users/{id}/orders      - A user's orders (owner/admin)
//!
//! # Payments
//! POST   /api/payments               - Register a payment (owner/admin)
//! GET    /api/payments/{id}          - Payment detail (owner/admin)
//! PATCH  /api/payments/{id}/status   - Record the outcome (admin)
//!
//! # Admin
//! GET    /api/admin/dashboard        - Dashboard figures
//!
//! # Real-time
//! GET    /ws                         - WebSocket order notifications
//! ```
//!
//! Owner/admin checks happen in the handlers, after the resource is loaded.

pub mod admin;
pub mod auth;
pub mod categories;
pub mod orders;
pub mod payments;
pub mod products;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use fastlanche_core::UserId;

use crate::config::{AuthRateLimit, ServerConfig};
use crate::error::AppError;
use crate::middleware::{Policy, auth_rate_limiter, require_policy};
use crate::models::CurrentUser;
use crate::realtime::socket;
use crate::state::AppState;

/// Reject access to a resource owned by someone else.
///
/// # Errors
///
/// Returns `AppError::Forbidden` unless `user` owns the resource or is an admin.
pub fn ensure_access(user: &CurrentUser, owner: UserId) -> Result<(), AppError> {
    if user.can_access(owner) {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.id, %owner, "Denied access to another user's data");
        Err(AppError::Forbidden(
            "You do not have access to this resource".to_string(),
        ))
    }
}

/// Apply a policy to every route in `router`.
fn with_policy(router: Router<AppState>, policy: Policy) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(policy, require_policy))
}

/// Login and registration, behind the auth rate limiter when enabled.
fn auth_routes(limit: AuthRateLimit) -> Router<AppState> {
    let router = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register", post(auth::register));

    let router = match auth_rate_limiter(limit) {
        Some(layer) => router.route_layer(layer),
        None => {
            tracing::warn!("Auth rate limiting is disabled");
            router
        }
    };

    router.route("/api/auth/logout", post(auth::logout))
}

/// Routes anyone may call.
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(categories::index))
        .route("/api/categories/{id}", get(categories::show))
        .route("/api/products", get(products::index))
        .route("/api/products/featured", get(products::featured))
        .route("/api/products/promotions", get(products::promotions))
        .route("/api/products/{id}", get(products::show))
        // Subscriptions are gated per channel inside the socket
        .route("/ws", get(socket::handle_ws))
}

/// Routes for any logged-in user. Ownership is checked per handler.
fn authenticated_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/orders", post(orders::create))
        .route("/api/orders/{id}", get(orders::show))
        .route("/api/orders/{id}/payment", get(orders::payment))
        .route("/api/users/{user_id}/orders", get(orders::for_user))
        .route("/api/payments", post(payments::create))
        .route("/api/payments/{id}", get(payments::show))
}

/// Staff-only routes.
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/categories", post(categories::create))
        .route(
            "/api/categories/{id}",
            axum::routing::put(categories::update).delete(categories::delete),
        )
        .route("/api/products", post(products::create))
        .route(
            "/api/products/{id}",
            axum::routing::put(products::update).delete(products::delete),
        )
        .route("/api/orders", get(orders::index))
        .route("/api/orders/{id}/status", patch(orders::update_status))
        .route("/api/payments/{id}/status", patch(payments::update_status))
        .route("/api/admin/dashboard", get(admin::dashboard))
}

/// Create all API routes.
pub fn routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .merge(with_policy(auth_routes(config.auth_rate_limit), Policy::Public))
        .merge(with_policy(public_routes(), Policy::Public))
        .merge(with_policy(authenticated_routes(), Policy::Authenticated))
        .merge(with_policy(admin_routes(), Policy::Admin))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use url::Url;

    use super::*;

    fn config(auth_rate_limit: AuthRateLimit) -> ServerConfig {
        ServerConfig {
            database_url: SecretString::from("postgres://localhost/fastlanche_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: Url::parse("http://localhost:3000").unwrap(),
            cors_origins: Vec::new(),
            establishment_name: "Fast Lanche".to_string(),
            auth_rate_limit,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Router over a pool that never connects; only requests rejected before
    /// any query can be exercised.
    fn app_with(auth_rate_limit: AuthRateLimit) -> Router {
        let config = config(auth_rate_limit);
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/fastlanche_test")
            .unwrap();
        routes(&config).with_state(AppState::new(config, pool))
    }

    fn app() -> Router {
        app_with(AuthRateLimit::default())
    }

    /// Statuses of `count` malformed logins from one client IP. The body is
    /// rejected before any query runs.
    async fn login_statuses(app: Router, count: usize) -> Vec<StatusCode> {
        let mut statuses = Vec::with_capacity(count);
        for _ in 0..count {
            let request = Request::builder()
                .method(Method::POST)
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .header("x-forwarded-for", "203.0.113.9")
                .body(Body::from("{}"))
                .unwrap();
            statuses.push(app.clone().oneshot(request).await.unwrap().status());
        }
        statuses
    }

    async fn status(method: Method, uri: &str) -> StatusCode {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_anonymous_rejected_from_authenticated_routes() {
        assert_eq!(status(Method::POST, "/api/orders").await, StatusCode::UNAUTHORIZED);
        assert_eq!(status(Method::GET, "/api/auth/me").await, StatusCode::UNAUTHORIZED);
        assert_eq!(status(Method::GET, "/api/payments/1").await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_anonymous_rejected_from_admin_routes() {
        assert_eq!(
            status(Method::GET, "/api/admin/dashboard").await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status(Method::GET, "/api/orders").await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(Method::PATCH, "/api/payments/1/status").await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_login_throttled_after_burst() {
        let limit = AuthRateLimit {
            burst: 2,
            replenish_seconds: 60,
        };
        let statuses = login_statuses(app_with(limit), 4).await;
        assert!(statuses[..2].iter().all(|s| *s != StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(
            statuses[2..],
            [StatusCode::TOO_MANY_REQUESTS, StatusCode::TOO_MANY_REQUESTS]
        );
    }

    #[tokio::test]
    async fn test_disabled_limit_never_throttles() {
        let limit = AuthRateLimit {
            burst: 0,
            replenish_seconds: 6,
        };
        let statuses = login_statuses(app_with(limit), 8).await;
        assert!(statuses.iter().all(|s| *s != StatusCode::TOO_MANY_REQUESTS));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        assert_eq!(status(Method::GET, "/api/nope").await, StatusCode::NOT_FOUND);
    }
}
