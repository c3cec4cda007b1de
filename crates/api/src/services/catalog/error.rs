//! Catalog error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A field was missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The referenced category or product does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A category or product with the same slug already exists.
    #[error("{0}")]
    Conflict(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CatalogError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Repository(other),
        }
    }
}
