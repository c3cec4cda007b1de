//! Order repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use bazaar_core::{OrderId, OrderStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::BuyerSummary;

const ORDER_COLUMNS: &str = r"
    o.id, o.product_ids, o.payment, o.buyer_id, u.name AS buyer_name,
    o.status, o.created_at, o.updated_at
";

const BUYER_JOIN: &str = "JOIN shop.users u ON u.id = o.buyer_id";

/// A stored order before its product references are resolved.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub id: OrderId,
    /// Product references in cart order. May include deleted products.
    pub product_ids: Vec<ProductId>,
    pub payment: serde_json::Value,
    pub buyer: BuyerSummary,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    product_ids: Vec<Uuid>,
    payment: serde_json::Value,
    buyer_id: Uuid,
    buyer_name: String,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for OrderRecord {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            product_ids: row.product_ids.into_iter().map(ProductId::new).collect(),
            payment: row.payment,
            buyer: BuyerSummary {
                id: UserId::new(row.buyer_id),
                name: row.buyer_name,
            },
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a paid order with the default status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        buyer: UserId,
        product_ids: &[ProductId],
        payment: &serde_json::Value,
    ) -> Result<OrderId, RepositoryError> {
        let id = sqlx::query_scalar::<_, OrderId>(
            r"
            INSERT INTO shop.orders (buyer_id, product_ids, payment)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(buyer)
        .bind(product_ids)
        .bind(payment)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Orders placed by one buyer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_buyer(&self, buyer: UserId) -> Result<Vec<OrderRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders o {BUYER_JOIN}
             WHERE o.buyer_id = $1 ORDER BY o.created_at DESC"
        ))
        .bind(buyer)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<OrderRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders o {BUYER_JOIN} ORDER BY o.created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Overwrite an order's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<OrderRecord, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            WITH o AS (
                UPDATE shop.orders SET status = $2, updated_at = now()
                WHERE id = $1
                RETURNING *
            )
            SELECT {ORDER_COLUMNS} FROM o {BUYER_JOIN}
            "
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }
}
