//! User role management commands.
//!
//! Administrators cannot be created over HTTP; an operator promotes an
//! already-registered account here.
//!
//! # Environment Variables
//!
//! - `BAZAAR_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use thiserror::Error;

use bazaar_api::db::{self, RepositoryError, UserRepository};
use bazaar_core::{Email, UserRole};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No account with this email.
    #[error("No user registered with email: {0}")]
    NotFound(String),

    /// Query failed.
    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

/// Grant the admin role.
///
/// # Errors
///
/// Returns an error if the email is invalid or not registered.
pub async fn promote(email: &str) -> Result<(), UserError> {
    set_role(email, UserRole::Admin).await
}

/// Revoke the admin role.
///
/// # Errors
///
/// Returns an error if the email is invalid or not registered.
pub async fn demote(email: &str) -> Result<(), UserError> {
    set_role(email, UserRole::Consumer).await
}

async fn set_role(email: &str, role: UserRole) -> Result<(), UserError> {
    let email = Email::parse(email).map_err(|_| UserError::InvalidEmail(email.to_owned()))?;

    let database_url =
        super::database_url().ok_or(UserError::MissingEnvVar("BAZAAR_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    let user = UserRepository::new(&pool)
        .set_role(&email, role)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => UserError::NotFound(email.to_string()),
            other => UserError::Repository(other),
        })?;

    tracing::info!(user_id = %user.id, email = %user.email, role = ?user.role, "Role updated");
    Ok(())
}
