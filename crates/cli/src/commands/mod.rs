//! CLI subcommands.

pub mod migrate;
pub mod user;

use secrecy::SecretString;

/// Read the database URL, preferring `BAZAAR_DATABASE_URL`.
fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();

    std::env::var("BAZAAR_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
