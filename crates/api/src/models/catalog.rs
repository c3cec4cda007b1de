//! Catalog domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{CategoryId, Price, ProductId, Slug};

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
}

/// A product with its category expanded. The photo is never loaded here.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub price: Price,
    /// `None` when the referenced category has been deleted.
    pub category: Option<Category>,
    pub quantity: i32,
    pub shipping: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// The slim product shape embedded in order views.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub price: Price,
}

/// Raw photo bytes with the content type they were uploaded with.
#[derive(Debug, Clone)]
pub struct ProductPhoto {
    pub content_type: String,
    pub bytes: Vec<u8>,
}
