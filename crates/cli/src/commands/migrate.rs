//! Database migration command.
//!
//! Applies the migrations embedded from `crates/api/migrations/`. The API
//! server never migrates on start, so this runs before each deploy.
//!
//! # Environment Variables
//!
//! - `BAZAAR_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use thiserror::Error;

use bazaar_api::db;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url =
        super::database_url().ok_or(MigrationError::MissingEnvVar("BAZAAR_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
