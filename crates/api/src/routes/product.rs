//! Product route handlers.

use axum::{
    extract::{
        Multipart, Path, State,
        multipart::MultipartRejection,
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::{Category, Product};
use crate::response::{ApiResponse, Empty};
use crate::routes::AppJson;
use crate::services::catalog::{CatalogService, FilterForm, PhotoUpload, ProductForm};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProductPayload {
    pub product: Product,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListPayload {
    pub count_total: usize,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct ProductsPayload {
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct CountPayload {
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct SearchPayload {
    pub results: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct CategoryProductsPayload {
    pub category: Category,
    pub products: Vec<Product>,
}

/// Create a product from a multipart form.
#[instrument(skip_all)]
pub async fn create(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<ProductPayload>> {
    let form = read_product_form(multipart?).await?;
    let product = CatalogService::new(state.pool())
        .create_product(form)
        .await?;

    Ok(ApiResponse::created(
        "Product created successfully",
        ProductPayload { product },
    ))
}

/// Replace a product's fields; the photo is kept unless a new one is sent.
#[instrument(skip(state, multipart))]
pub async fn update(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<ProductPayload>> {
    let form = read_product_form(multipart?).await?;
    let product = CatalogService::new(state.pool())
        .update_product(&id, form)
        .await?;

    Ok(ApiResponse::ok(
        "Product updated successfully",
        ProductPayload { product },
    ))
}

/// The most recently created products.
pub async fn index(State(state): State<AppState>) -> Result<ApiResponse<ProductListPayload>> {
    let products = CatalogService::new(state.pool()).list_products().await?;
    Ok(ApiResponse::ok(
        "All Products",
        ProductListPayload {
            count_total: products.len(),
            products,
        },
    ))
}

/// Fetch one product by slug.
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ApiResponse<ProductPayload>> {
    let product = CatalogService::new(state.pool()).get_product(&slug).await?;
    Ok(ApiResponse::ok(
        "Single product fetched",
        ProductPayload { product },
    ))
}

/// Raw photo bytes with their content type, or `204` if the product has none.
pub async fn photo(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let photo = CatalogService::new(state.pool()).product_photo(&id).await?;

    Ok(match photo {
        Some(photo) => (
            [(header::CONTENT_TYPE, photo.content_type)],
            photo.bytes,
        )
            .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// Delete a product.
#[instrument(skip(state))]
pub async fn destroy(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Empty>> {
    CatalogService::new(state.pool()).delete_product(&id).await?;
    Ok(ApiResponse::message("Product deleted successfully"))
}

/// Products matching the checked categories and price range.
pub async fn filter(
    State(state): State<AppState>,
    AppJson(form): AppJson<FilterForm>,
) -> Result<ApiResponse<ProductsPayload>> {
    let products = CatalogService::new(state.pool())
        .filter_products(&form)
        .await?;
    Ok(ApiResponse::ok("Filtered products", ProductsPayload { products }))
}

/// Total number of products.
pub async fn count(State(state): State<AppState>) -> Result<ApiResponse<CountPayload>> {
    let total = CatalogService::new(state.pool()).count_products().await?;
    Ok(ApiResponse::ok("Product count", CountPayload { total }))
}

/// One page of products.
pub async fn page(
    State(state): State<AppState>,
    Path(page): Path<String>,
) -> Result<ApiResponse<ProductsPayload>> {
    let products = CatalogService::new(state.pool())
        .list_products_page(&page)
        .await?;
    Ok(ApiResponse::ok("Product page", ProductsPayload { products }))
}

/// Case-insensitive search over names and descriptions.
pub async fn search(
    State(state): State<AppState>,
    Path(keyword): Path<String>,
) -> Result<ApiResponse<SearchPayload>> {
    let results = CatalogService::new(state.pool())
        .search_products(&keyword)
        .await?;
    Ok(ApiResponse::ok("Search results", SearchPayload { results }))
}

/// Other products in the same category.
pub async fn related(
    State(state): State<AppState>,
    Path((pid, cid)): Path<(String, String)>,
) -> Result<ApiResponse<ProductsPayload>> {
    let products = CatalogService::new(state.pool())
        .related_products(&pid, &cid)
        .await?;
    Ok(ApiResponse::ok("Related products", ProductsPayload { products }))
}

/// A category and its products.
pub async fn by_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ApiResponse<CategoryProductsPayload>> {
    let (category, products) = CatalogService::new(state.pool())
        .products_by_category(&slug)
        .await?;
    Ok(ApiResponse::ok(
        "Products by category",
        CategoryProductsPayload { category, products },
    ))
}

// =============================================================================
// Multipart
// =============================================================================

/// Collect the text fields and the optional `photo` file. Unknown fields are
/// skipped; an empty file part counts as no photo.
async fn read_product_form(mut multipart: Multipart) -> Result<ProductForm> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == "photo" {
            let content_type = field.content_type().map(str::to_owned);
            let bytes = field.bytes().await?;
            if !bytes.is_empty() {
                form.photo = Some(PhotoUpload {
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let slot = match name.as_str() {
            "name" => &mut form.name,
            "description" => &mut form.description,
            "price" => &mut form.price,
            "category" => &mut form.category,
            "quantity" => &mut form.quantity,
            "shipping" => &mut form.shipping,
            _ => continue,
        };
        *slot = Some(field.text().await?);
    }

    Ok(form)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{body::Body, extract::FromRequest, http::Request};

    use super::*;
    use crate::error::AppError;

    const BOUNDARY: &str = "XbazaarX";

    fn multipart_request(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, content_type, value) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match content_type {
                Some(ct) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{name}.bin\"\r\nContent-Type: {ct}\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(value.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn parse(request: Request<Body>) -> ProductForm {
        let multipart = Multipart::from_request(request, &()).await.unwrap();
        read_product_form(multipart).await.unwrap()
    }

    #[tokio::test]
    async fn test_reads_text_fields_and_photo() {
        let form = parse(multipart_request(&[
            ("name", None, "Blue Mug"),
            ("price", None, "12.50"),
            ("quantity", None, "4"),
            ("shipping", None, "1"),
            ("color", None, "blue"),
            ("photo", Some("image/png"), "PNGDATA"),
        ]))
        .await;

        assert_eq!(form.name.as_deref(), Some("Blue Mug"));
        assert_eq!(form.price.as_deref(), Some("12.50"));
        assert_eq!(form.quantity.as_deref(), Some("4"));
        assert_eq!(form.shipping.as_deref(), Some("1"));
        assert!(form.description.is_none());

        let photo = form.photo.unwrap();
        assert_eq!(photo.content_type.as_deref(), Some("image/png"));
        assert_eq!(photo.bytes, b"PNGDATA");
    }

    #[tokio::test]
    async fn test_empty_photo_part_is_ignored() {
        let form = parse(multipart_request(&[
            ("name", None, "Bowl"),
            ("photo", Some("image/jpeg"), ""),
        ]))
        .await;

        assert_eq!(form.name.as_deref(), Some("Bowl"));
        assert!(form.photo.is_none());
    }

    #[tokio::test]
    async fn test_non_multipart_body_is_validation_error() {
        let request = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let rejection = Multipart::from_request(request, &()).await.unwrap_err();
        assert!(matches!(AppError::from(rejection), AppError::Validation(_)));
    }
}
