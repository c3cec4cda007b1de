//! Integration tests for Bazaar.
//!
//! # Running Tests
//!
//! ```bash
//! # Point at a disposable database; migrations are applied automatically
//! export TEST_DATABASE_URL=postgres://localhost/bazaar_test
//!
//! # Run the ignored database-backed tests
//! cargo test -p bazaar-integration-tests -- --ignored
//! ```
//!
//! Tests share one database and run in parallel, so every fixture gets a
//! unique name and assertions never assume an empty table. Tests that need
//! exact table contents use [`IsolatedDb`] instead.

use std::sync::Mutex;

use secrecy::SecretString;
use sqlx::PgPool;
use sqlx::postgres::PgConnectOptions;

use bazaar_api::config::{ApiConfig, BraintreeConfig, BraintreeEnvironment};
use bazaar_api::db::UserRepository;
use bazaar_api::models::{Category, Product, User};
use bazaar_api::payments::{ClientToken, GatewayError, PaymentGateway, Sale};
use bazaar_api::services::auth::{AuthService, RegisterForm, TokenKeys};
use bazaar_api::services::catalog::{CatalogService, CategoryForm, ProductForm};
use bazaar_core::{Price, UserRole};

/// Signing key shared by tests that issue tokens.
pub const TEST_JWT_SECRET: &str = "integration-signing-key-7d2f9b4e1a6c3085";

/// Password every fixture user registers with.
pub const TEST_PASSWORD: &str = "correct horse battery";

/// Security answer every fixture user registers with.
pub const TEST_ANSWER: &str = "blue";

/// Connect to `TEST_DATABASE_URL` and apply migrations.
///
/// # Panics
///
/// Panics if the variable is unset or the database is unreachable.
#[allow(clippy::expect_used)]
pub async fn test_pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = PgPool::connect(&url)
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("../api/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// A freshly created, migrated database owned by a single test.
///
/// Call [`IsolatedDb::drop_database`] at the end of the test; a panicking
/// test leaves its `bazaar_test_*` database behind.
pub struct IsolatedDb {
    pub pool: PgPool,
    admin: PgPool,
    name: String,
}

impl IsolatedDb {
    /// Create a database next to `TEST_DATABASE_URL` and apply migrations.
    ///
    /// # Panics
    ///
    /// Panics if the variable is unset, the server is unreachable, or the
    /// role may not create databases.
    #[allow(clippy::expect_used)]
    pub async fn create() -> Self {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
        let options: PgConnectOptions = url.parse().expect("TEST_DATABASE_URL must be valid");
        let admin = PgPool::connect_with(options.clone())
            .await
            .expect("Failed to connect to test database");

        let name = format!("bazaar_test_{}", uuid::Uuid::new_v4().simple());
        sqlx::query(&format!(r#"CREATE DATABASE "{name}""#))
            .execute(&admin)
            .await
            .expect("Failed to create isolated database");

        let pool = PgPool::connect_with(options.database(&name))
            .await
            .expect("Failed to connect to isolated database");
        sqlx::migrate!("../api/migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Self { pool, admin, name }
    }

    /// Close the pool and drop the database.
    ///
    /// # Panics
    ///
    /// Panics if the database cannot be dropped.
    #[allow(clippy::expect_used)]
    pub async fn drop_database(self) {
        self.pool.close().await;
        sqlx::query(&format!(r#"DROP DATABASE IF EXISTS "{}""#, self.name))
            .execute(&self.admin)
            .await
            .expect("Failed to drop isolated database");
    }
}

/// A name no other test run will produce.
#[must_use]
pub fn unique(prefix: &str) -> String {
    format!("{prefix} {}", uuid::Uuid::new_v4().simple())
}

/// Token keys signed with [`TEST_JWT_SECRET`].
#[must_use]
pub fn test_tokens() -> TokenKeys {
    TokenKeys::new(&SecretString::from(TEST_JWT_SECRET), 7)
}

/// API configuration for an in-process router.
#[allow(clippy::expect_used)]
#[must_use]
pub fn test_config() -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from(
            std::env::var("TEST_DATABASE_URL").unwrap_or_default(),
        ),
        host: "127.0.0.1".parse().expect("valid address"),
        port: 0,
        jwt_secret: SecretString::from(TEST_JWT_SECRET),
        session_ttl_days: 7,
        braintree: BraintreeConfig {
            environment: BraintreeEnvironment::Sandbox,
            merchant_id: "merchant".to_owned(),
            public_key: "public".to_owned(),
            private_key: SecretString::from("private"),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Register a consumer with a unique email.
///
/// # Panics
///
/// Panics if registration fails.
#[allow(clippy::expect_used)]
pub async fn register_user(pool: &PgPool) -> User {
    let email = format!("{}@example.com", uuid::Uuid::new_v4().simple());
    AuthService::new(pool, &test_tokens())
        .register(&RegisterForm {
            name: Some("Test Shopper".to_owned()),
            email: Some(email),
            password: Some(TEST_PASSWORD.to_owned()),
            phone: Some("555-0100".to_owned()),
            address: Some("1 Test Street".to_owned()),
            answer: Some(TEST_ANSWER.to_owned()),
        })
        .await
        .expect("Failed to register user")
}

/// Register a user and grant the admin role.
///
/// # Panics
///
/// Panics if registration or promotion fails.
#[allow(clippy::expect_used)]
pub async fn register_admin(pool: &PgPool) -> User {
    let user = register_user(pool).await;
    UserRepository::new(pool)
        .set_role(&user.email, UserRole::Admin)
        .await
        .expect("Failed to promote user")
}

/// Create a category with a unique name.
///
/// # Panics
///
/// Panics if creation fails.
#[allow(clippy::expect_used)]
pub async fn create_category(pool: &PgPool) -> Category {
    CatalogService::new(pool)
        .create_category(&CategoryForm {
            name: Some(unique("Category")),
        })
        .await
        .expect("Failed to create category")
}

/// Product form fields with a unique name.
#[must_use]
pub fn product_form(category: &Category, price: &str) -> ProductForm {
    ProductForm {
        name: Some(unique("Product")),
        description: Some("Hand thrown stoneware".to_owned()),
        price: Some(price.to_owned()),
        category: Some(category.id.to_string()),
        quantity: Some("5".to_owned()),
        shipping: Some("true".to_owned()),
        photo: None,
    }
}

/// Create a product in a category at a price.
///
/// # Panics
///
/// Panics if creation fails.
#[allow(clippy::expect_used)]
pub async fn create_product(pool: &PgPool, category: &Category, price: &str) -> Product {
    CatalogService::new(pool)
        .create_product(product_form(category, price))
        .await
        .expect("Failed to create product")
}

/// In-memory payment gateway that records every charge.
#[derive(Debug, Default)]
pub struct MockGateway {
    decline: bool,
    charges: Mutex<Vec<(String, String)>>,
}

impl MockGateway {
    /// A gateway that approves every charge.
    #[must_use]
    pub fn approving() -> Self {
        Self::default()
    }

    /// A gateway that declines every charge.
    #[must_use]
    pub fn declining() -> Self {
        Self {
            decline: true,
            ..Self::default()
        }
    }

    /// `(nonce, amount)` for every charge attempted so far.
    #[must_use]
    pub fn charges(&self) -> Vec<(String, String)> {
        self.charges
            .lock()
            .map(|charges| charges.clone())
            .unwrap_or_default()
    }
}

impl PaymentGateway for MockGateway {
    async fn client_token(&self) -> Result<ClientToken, GatewayError> {
        Ok(ClientToken {
            client_token: "mock-client-token".to_owned(),
        })
    }

    async fn charge(&self, nonce: &str, amount: Price) -> Result<Sale, GatewayError> {
        let amount = amount.to_gateway_amount();
        if let Ok(mut charges) = self.charges.lock() {
            charges.push((nonce.to_owned(), amount.clone()));
        }

        let id = format!("txn_{}", uuid::Uuid::new_v4().simple());
        if self.decline {
            return Err(GatewayError::Declined {
                id,
                status: "PROCESSOR_DECLINED".to_owned(),
            });
        }

        Ok(Sale {
            id,
            status: "SUBMITTED_FOR_SETTLEMENT".to_owned(),
            amount,
            currency_iso_code: Some("USD".to_owned()),
        })
    }
}
