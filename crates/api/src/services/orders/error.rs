//! Order and checkout error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::payments::GatewayError;

/// Errors that can occur during checkout and order management.
#[derive(Debug, Error)]
pub enum OrderError {
    /// A field was missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The buyer's account no longer exists.
    #[error("buyer account not found")]
    UnknownBuyer,

    /// The order does not exist.
    #[error("order not found")]
    NotFound,

    /// The payment gateway failed or declined the payment.
    #[error("payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
