//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::realtime::Notifier;
use crate::services::{CatalogService, OrderService, PaymentService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    notifier: Notifier,
    catalog: CatalogService,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: ServerConfig, pool: PgPool) -> Self {
        let catalog = CatalogService::new(pool.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                notifier: Notifier::new(),
                catalog,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the order notifier.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    /// Get a reference to the cached catalog.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Order workflow bound to this state's pool and notifier.
    #[must_use]
    pub fn orders(&self) -> OrderService<'_> {
        OrderService::new(&self.inner.pool, &self.inner.notifier)
    }

    /// Payment workflow bound to this state's pool and notifier.
    #[must_use]
    pub fn payments(&self) -> PaymentService<'_> {
        PaymentService::new(&self.inner.pool, &self.inner.notifier)
    }
}
