//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::auth::TokenService;
use crate::services::orders::{OrderService, PgCheckoutStore};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and is read-only after
/// startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    tokens: TokenService,
    orders: OrderService<PgCheckoutStore>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The token service is keyed from `config.jwt_secret`.
    #[must_use]
    pub fn new(config: ApiConfig, pool: PgPool) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl_hours);
        let orders = OrderService::new(PgCheckoutStore::new(pool.clone()));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                orders,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the bearer token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get a reference to the order workflow.
    #[must_use]
    pub fn orders(&self) -> &OrderService<PgCheckoutStore> {
        &self.inner.orders
    }
}
