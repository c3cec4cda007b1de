//! Order service.
//!
//! Order history views, admin status changes, and checkout through the
//! payment gateway (see [`checkout`]).

pub mod checkout;
mod error;

pub use checkout::{CartItem, CheckoutService, PaymentForm, Receipt};
pub use error::OrderError;

use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;
use sqlx::PgPool;
use tracing::instrument;

use bazaar_core::{OrderId, OrderStatus, ProductId, UserId, parse_id};

use crate::db::RepositoryError;
use crate::db::orders::{OrderRecord, OrderRepository};
use crate::db::products::ProductRepository;
use crate::models::{Order, ProductSummary};

use super::non_blank;

/// Status update request body.
#[derive(Debug, Default, Deserialize)]
pub struct StatusForm {
    pub status: Option<String>,
}

/// Order history and administration.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// Orders placed by a buyer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if a query fails.
    pub async fn list_for_buyer(&self, buyer: UserId) -> Result<Vec<Order>, OrderError> {
        let records = self.orders.list_for_buyer(buyer).await?;
        self.resolve(records).await
    }

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if a query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, OrderError> {
        let records = self.orders.list_all().await?;
        self.resolve(records).await
    }

    /// Overwrite an order's status with any valid label.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` for a malformed id or unknown label.
    /// Returns `OrderError::NotFound` if the order doesn't exist.
    #[instrument(skip(self, form))]
    pub async fn set_status(&self, id: &str, form: &StatusForm) -> Result<Order, OrderError> {
        let id = parse_id::<OrderId>(id)
            .ok_or_else(|| OrderError::Validation("Invalid order id".into()))?;
        let status = parse_status(form.status.as_deref())?;

        let record = self
            .orders
            .set_status(id, status)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => OrderError::NotFound,
                other => other.into(),
            })?;

        tracing::info!(order_id = %id, status = %status, "Order status updated");
        let mut resolved = self.resolve(vec![record]).await?;
        resolved.pop().ok_or(OrderError::NotFound)
    }

    /// Attach product summaries, dropping references to deleted products.
    async fn resolve(&self, records: Vec<OrderRecord>) -> Result<Vec<Order>, OrderError> {
        let ids: Vec<ProductId> = records
            .iter()
            .flat_map(|r| r.product_ids.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let summaries = if ids.is_empty() {
            HashMap::new()
        } else {
            self.products.summaries(&ids).await?
        };

        Ok(records
            .into_iter()
            .map(|record| attach_products(record, &summaries))
            .collect())
    }
}

fn attach_products(record: OrderRecord, summaries: &HashMap<ProductId, ProductSummary>) -> Order {
    Order {
        id: record.id,
        products: record
            .product_ids
            .iter()
            .filter_map(|id| summaries.get(id).cloned())
            .collect(),
        payment: record.payment,
        buyer: record.buyer,
        status: record.status,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

fn parse_status(label: Option<&str>) -> Result<OrderStatus, OrderError> {
    let label = non_blank(label).ok_or_else(|| OrderError::Validation("Status is required".into()))?;
    label.parse().map_err(|_| {
        let allowed: Vec<&str> = OrderStatus::ALL.iter().map(|s| s.label()).collect();
        OrderError::Validation(format!("Status must be one of: {}", allowed.join(", ")))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use bazaar_core::{Price, Slug};

    use super::*;
    use crate::models::BuyerSummary;

    fn summary(name: &str) -> ProductSummary {
        ProductSummary {
            id: ProductId::generate(),
            name: name.to_owned(),
            slug: Slug::from_name(name).unwrap(),
            description: String::new(),
            price: Price::ZERO,
        }
    }

    #[test]
    fn test_dangling_products_are_dropped() {
        let mug = summary("Mug");
        let gone = ProductId::generate();
        let record = OrderRecord {
            id: OrderId::generate(),
            product_ids: vec![mug.id, gone, mug.id],
            payment: serde_json::json!({ "success": true }),
            buyer: BuyerSummary {
                id: UserId::generate(),
                name: "Ada".to_owned(),
            },
            status: OrderStatus::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let summaries = HashMap::from([(mug.id, mug.clone())]);

        let order = attach_products(record, &summaries);
        assert_eq!(order.products.len(), 2);
        assert!(order.products.iter().all(|p| p.id == mug.id));
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(Some("Shipped")).unwrap(), OrderStatus::Shipped);
        assert_eq!(
            parse_status(Some(" Not Process ")).unwrap(),
            OrderStatus::NotProcess
        );
        assert!(matches!(
            parse_status(Some("Lost")),
            Err(OrderError::Validation(ref m)) if m.contains("Cancelled")
        ));
        assert!(matches!(parse_status(None), Err(OrderError::Validation(_))));
    }
}
