//! Category route handlers.

use axum::extract::{Path, State};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::Category;
use crate::response::{ApiResponse, Empty};
use crate::routes::AppJson;
use crate::services::catalog::{CatalogService, CategoryForm};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CategoryPayload {
    pub category: Category,
}

#[derive(Debug, Serialize)]
pub struct CategoriesPayload {
    pub categories: Vec<Category>,
}

/// Create a category.
#[instrument(skip_all)]
pub async fn create(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    AppJson(form): AppJson<CategoryForm>,
) -> Result<ApiResponse<CategoryPayload>> {
    let category = CatalogService::new(state.pool())
        .create_category(&form)
        .await?;

    Ok(ApiResponse::created(
        "New category created",
        CategoryPayload { category },
    ))
}

/// Rename a category.
#[instrument(skip(state, form))]
pub async fn update(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(form): AppJson<CategoryForm>,
) -> Result<ApiResponse<CategoryPayload>> {
    let category = CatalogService::new(state.pool())
        .update_category(&id, &form)
        .await?;

    Ok(ApiResponse::ok(
        "Category updated successfully",
        CategoryPayload { category },
    ))
}

/// List all categories.
pub async fn index(State(state): State<AppState>) -> Result<ApiResponse<CategoriesPayload>> {
    let categories = CatalogService::new(state.pool()).list_categories().await?;
    Ok(ApiResponse::ok(
        "All categories list",
        CategoriesPayload { categories },
    ))
}

/// Fetch one category by slug.
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ApiResponse<CategoryPayload>> {
    let category = CatalogService::new(state.pool()).get_category(&slug).await?;
    Ok(ApiResponse::ok(
        "Get single category successfully",
        CategoryPayload { category },
    ))
}

/// Delete a category. Products that referenced it are left in place.
#[instrument(skip(state))]
pub async fn destroy(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Empty>> {
    CatalogService::new(state.pool()).delete_category(&id).await?;
    Ok(ApiResponse::message("Category deleted successfully"))
}
