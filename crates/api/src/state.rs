//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::payments::{BraintreeClient, GatewayError};
use crate::services::auth::TokenKeys;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool, session keys, and the payment gateway.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: PgPool,
    tokens: TokenKeys,
    gateway: BraintreeClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the payment gateway client cannot be built.
    pub fn new(config: &ApiConfig, pool: PgPool) -> Result<Self, GatewayError> {
        let tokens = TokenKeys::new(&config.jwt_secret, config.session_ttl_days);
        let gateway = BraintreeClient::new(&config.braintree)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                pool,
                tokens,
                gateway,
            }),
        })
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the session token keys.
    #[must_use]
    pub fn tokens(&self) -> &TokenKeys {
        &self.inner.tokens
    }

    /// Get a reference to the payment gateway client.
    #[must_use]
    pub fn gateway(&self) -> &BraintreeClient {
        &self.inner.gateway
    }
}
