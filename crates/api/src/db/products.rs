//! Product repository for database operations.
//!
//! Every product read joins its category so responses carry it expanded.
//! The photo column is only ever read by [`ProductRepository::photo`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use bazaar_core::{CategoryId, PageRequest, Price, ProductId, Slug};

use super::RepositoryError;
use crate::models::{Category, Product, ProductPhoto, ProductSummary};

const PRODUCT_COLUMNS: &str = r"
    p.id, p.name, p.slug, p.description, p.price, p.category_id, p.quantity,
    p.shipping, p.created_at, p.updated_at,
    c.name AS category_name, c.slug AS category_slug
";

const CATEGORY_JOIN: &str = "LEFT JOIN shop.categories c ON c.id = p.category_id";

/// Validated product fields to write. Slug is derived by the caller.
#[derive(Debug, Clone)]
pub struct ProductFields {
    pub name: String,
    pub slug: Slug,
    pub description: String,
    pub price: Price,
    pub category_id: CategoryId,
    pub quantity: i32,
    pub shipping: bool,
    /// Replaces the stored photo when present.
    pub photo: Option<ProductPhoto>,
}

/// Optional constraints for [`ProductRepository::filter`].
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Match products in any of these categories. Empty matches all.
    pub category_ids: Vec<CategoryId>,
    /// Inclusive `[low, high]` price bounds.
    pub price_range: Option<(Price, Price)>,
}

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    slug: String,
    description: String,
    price: Price,
    category_id: Uuid,
    quantity: i32,
    shipping: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_name: Option<String>,
    category_slug: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let category = match (row.category_name, row.category_slug) {
            (Some(name), Some(slug)) => Some(Category {
                id: CategoryId::new(row.category_id),
                name,
                slug: Slug::from_stored(slug),
            }),
            _ => None,
        };

        Self {
            id: ProductId::new(row.id),
            name: row.name,
            slug: Slug::from_stored(row.slug),
            description: row.description,
            price: row.price,
            category,
            quantity: row.quantity,
            shipping: row.shipping,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductSummaryRow {
    id: Uuid,
    name: String,
    slug: String,
    description: String,
    price: Price,
}

impl From<ProductSummaryRow> for ProductSummary {
    fn from(row: ProductSummaryRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            slug: Slug::from_stored(row.slug),
            description: row.description,
            price: row.price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PhotoRow {
    photo: Option<Vec<u8>>,
    photo_content_type: Option<String>,
}

/// Escape `LIKE` metacharacters so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, fields: &ProductFields) -> Result<Product, RepositoryError> {
        let (photo, content_type) = split_photo(fields.photo.as_ref());

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            WITH p AS (
                INSERT INTO shop.products
                    (name, slug, description, price, category_id, quantity, shipping,
                     photo, photo_content_type)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
            )
            SELECT {PRODUCT_COLUMNS} FROM p {CATEGORY_JOIN}
            "
        ))
        .bind(&fields.name)
        .bind(fields.slug.as_str())
        .bind(&fields.description)
        .bind(fields.price)
        .bind(fields.category_id)
        .bind(fields.quantity)
        .bind(fields.shipping)
        .bind(photo)
        .bind(content_type)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "product slug already exists"))?;

        Ok(row.into())
    }

    /// Overwrite a product's fields. The photo is kept unless a new one is given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update(
        &self,
        id: ProductId,
        fields: &ProductFields,
    ) -> Result<Product, RepositoryError> {
        let (photo, content_type) = split_photo(fields.photo.as_ref());

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            WITH p AS (
                UPDATE shop.products
                SET name = $2, slug = $3, description = $4, price = $5,
                    category_id = $6, quantity = $7, shipping = $8,
                    photo = COALESCE($9, photo),
                    photo_content_type = COALESCE($10, photo_content_type),
                    updated_at = now()
                WHERE id = $1
                RETURNING *
            )
            SELECT {PRODUCT_COLUMNS} FROM p {CATEGORY_JOIN}
            "
        ))
        .bind(id)
        .bind(&fields.name)
        .bind(fields.slug.as_str())
        .bind(&fields.description)
        .bind(fields.price)
        .bind(fields.category_id)
        .bind(fields.quantity)
        .bind(fields.shipping)
        .bind(photo)
        .bind(content_type)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "product slug already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Most recently created products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        self.fetch_many(
            &format!(
                "SELECT {PRODUCT_COLUMNS} FROM shop.products p {CATEGORY_JOIN}
                 ORDER BY p.created_at DESC LIMIT $1"
            ),
            |q| q.bind(limit),
        )
        .await
    }

    /// One fixed-size page of products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn page(&self, page: PageRequest) -> Result<Vec<Product>, RepositoryError> {
        self.fetch_many(
            &format!(
                "SELECT {PRODUCT_COLUMNS} FROM shop.products p {CATEGORY_JOIN}
                 ORDER BY p.created_at DESC, p.id OFFSET $1 LIMIT $2"
            ),
            |q| q.bind(page.offset()).bind(page.limit()),
        )
        .await
    }

    /// Get a product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.products p {CATEGORY_JOIN} WHERE p.slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Products matching every supplied constraint.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn filter(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let (low, high) = filter.price_range.unzip();

        self.fetch_many(
            &format!(
                r"
                SELECT {PRODUCT_COLUMNS} FROM shop.products p {CATEGORY_JOIN}
                WHERE (cardinality($1::uuid[]) = 0 OR p.category_id = ANY($1))
                  AND ($2::numeric IS NULL OR p.price BETWEEN $2 AND $3)
                ORDER BY p.created_at DESC
                "
            ),
            |q| q.bind(filter.category_ids.as_slice()).bind(low).bind(high),
        )
        .await
    }

    /// Total number of products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM shop.products")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Case-insensitive literal substring match on name or description.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, keyword: &str) -> Result<Vec<Product>, RepositoryError> {
        let pattern = format!("%{}%", escape_like(keyword));

        self.fetch_many(
            &format!(
                r"
                SELECT {PRODUCT_COLUMNS} FROM shop.products p {CATEGORY_JOIN}
                WHERE p.name ILIKE $1 ESCAPE '\' OR p.description ILIKE $1 ESCAPE '\'
                ORDER BY p.created_at DESC
                "
            ),
            |q| q.bind(pattern.as_str()),
        )
        .await
    }

    /// Other products in a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn related(
        &self,
        product_id: ProductId,
        category_id: CategoryId,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        self.fetch_many(
            &format!(
                r"
                SELECT {PRODUCT_COLUMNS} FROM shop.products p {CATEGORY_JOIN}
                WHERE p.category_id = $1 AND p.id <> $2
                ORDER BY p.created_at DESC
                LIMIT $3
                "
            ),
            |q| q.bind(category_id).bind(product_id).bind(limit),
        )
        .await
    }

    /// Every product referencing a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        self.fetch_many(
            &format!(
                "SELECT {PRODUCT_COLUMNS} FROM shop.products p {CATEGORY_JOIN}
                 WHERE p.category_id = $1 ORDER BY p.created_at DESC"
            ),
            |q| q.bind(category_id),
        )
        .await
    }

    /// Load a product's photo. `Ok(None)` means the product has none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn photo(&self, id: ProductId) -> Result<Option<ProductPhoto>, RepositoryError> {
        let row = sqlx::query_as::<_, PhotoRow>(
            "SELECT photo, photo_content_type FROM shop.products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.photo.map(|bytes| ProductPhoto {
            content_type: row
                .photo_content_type
                .unwrap_or_else(|| "application/octet-stream".to_owned()),
            bytes,
        }))
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Current stored prices for the given products. Unknown ids are absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn prices(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Price>, RepositoryError> {
        let rows = sqlx::query_as::<_, (Uuid, Price)>(
            "SELECT id, price FROM shop.products WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, price)| (ProductId::new(id), price))
            .collect())
    }

    /// Slim summaries for the given products. Unknown ids are absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn summaries(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, ProductSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductSummaryRow>(
            "SELECT id, name, slug, description, price FROM shop.products WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let summary = ProductSummary::from(row);
                (summary.id, summary)
            })
            .collect())
    }

    async fn fetch_many<'q, F>(&self, sql: &'q str, bind: F) -> Result<Vec<Product>, RepositoryError>
    where
        F: FnOnce(
            sqlx::query::QueryAs<'q, sqlx::Postgres, ProductRow, sqlx::postgres::PgArguments>,
        ) -> sqlx::query::QueryAs<'q, sqlx::Postgres, ProductRow, sqlx::postgres::PgArguments>,
    {
        let rows = bind(sqlx::query_as::<_, ProductRow>(sql))
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

fn split_photo(photo: Option<&ProductPhoto>) -> (Option<&[u8]>, Option<&str>) {
    photo.map_or((None, None), |p| {
        (Some(p.bytes.as_slice()), Some(p.content_type.as_str()))
    })
}
