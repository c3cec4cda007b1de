//! Database operations for the shop `PostgreSQL` schema.
//!
//! # Schema: `shop`
//!
//! ## Tables
//!
//! - `users` - Shopper and administrator accounts
//! - `categories` - Catalog categories
//! - `products` - Catalog products, including the optional photo blob
//! - `orders` - Paid orders with the embedded gateway result
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! ```

pub mod categories;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::CategoryRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-index violation onto `Conflict`, passing other errors through.
    fn from_insert(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options().connect(database_url.expose_secret()).await
}

/// Create a pool that connects on first use.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection string cannot be parsed.
pub fn create_lazy_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    pool_options().connect_lazy(database_url.expose_secret())
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
}
