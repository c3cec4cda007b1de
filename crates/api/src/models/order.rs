//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{OrderId, OrderStatus, UserId};

use super::ProductSummary;

/// The buyer fields attached to an order view.
#[derive(Debug, Clone, Serialize)]
pub struct BuyerSummary {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
}

/// An order with its products resolved.
///
/// Products that no longer exist are left out of `products`.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub products: Vec<ProductSummary>,
    /// Gateway result recorded at checkout.
    pub payment: serde_json::Value,
    pub buyer: BuyerSummary,
    pub status: OrderStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}
