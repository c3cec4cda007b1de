//! Bazaar CLI - Database migrations and user management.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! bazaar-cli migrate
//!
//! # Grant admin rights to an existing account
//! bazaar-cli user promote -e admin@example.com
//!
//! # Revoke admin rights
//! bazaar-cli user demote -e admin@example.com
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bazaar-cli")]
#[command(author, version, about = "Bazaar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,
    /// Manage user roles
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Make an existing user an administrator
    Promote {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Make an administrator a regular user again
    Demote {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Promote { email } => commands::user::promote(&email).await?,
            UserAction::Demote { email } => commands::user::demote(&email).await?,
        },
    }
    Ok(())
}
