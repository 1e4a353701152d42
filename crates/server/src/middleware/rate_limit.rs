//! Rate limiting for the login and registration endpoints.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::config::AuthRateLimit;

/// Key extractor for the client IP.
///
/// Prefers the address reported by a reverse proxy, then falls back to the
/// peer address. The server must be served with
/// `into_make_service_with_connect_info::<SocketAddr>()` for the fallback.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        forwarded_ip(req.headers())
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Client IP from `X-Forwarded-For` (first hop) or `X-Real-IP`.
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        })
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create the rate limiter for the auth endpoints.
///
/// Each client IP may send `limit.burst` requests back to back, then one more
/// every `limit.replenish_seconds`. Returns `None` when the limit is
/// disabled (a zero burst or period).
#[must_use]
pub fn auth_rate_limiter(limit: AuthRateLimit) -> Option<RateLimiterLayer> {
    if !limit.is_enabled() {
        return None;
    }
    GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(limit.replenish_seconds)
        .burst_size(limit.burst)
        .finish()
        .map(|config| GovernorLayer::new(Arc::new(config)))
}
