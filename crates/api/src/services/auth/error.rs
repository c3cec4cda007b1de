//! Authentication error types.

use thiserror::Error;

use super::token::TokenError;
use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required field was missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] bazaar_core::EmailError),

    /// No account is registered under the email.
    #[error("email is not registered")]
    UserNotFound,

    /// Wrong password for an existing account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Email and security answer did not match an account.
    #[error("wrong email or answer")]
    WrongEmailOrAnswer,

    /// Session token could not be issued.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
