//! Category repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use bazaar_core::{CategoryId, Slug};

use super::RepositoryError;
use crate::models::Category;

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    slug: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            slug: Slug::from_stored(row.slug),
        }
    }
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, name: &str, slug: &Slug) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO shop.categories (name, slug)
            VALUES ($1, $2)
            RETURNING id, name, slug
            ",
        )
        .bind(name)
        .bind(slug.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "category slug already exists"))?;

        Ok(row.into())
    }

    /// Rename a category and replace its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update(
        &self,
        id: CategoryId,
        name: &str,
        slug: &Slug,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE shop.categories
            SET name = $2, slug = $3, updated_at = now()
            WHERE id = $1
            RETURNING id, name, slug
            ",
        )
        .bind(id)
        .bind(name)
        .bind(slug.as_str())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "category slug already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// List every category ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug FROM shop.categories ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug FROM shop.categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Delete a category. Products keep their reference to it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
