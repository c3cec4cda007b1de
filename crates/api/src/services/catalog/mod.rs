//! Catalog service.
//!
//! Category and product management, browsing, search, and photo storage.

mod error;

pub use error::CatalogError;

use serde::Deserialize;
use sqlx::PgPool;
use tracing::instrument;

use bazaar_core::{CategoryId, PageRequest, Price, ProductId, Slug, parse_id};

use crate::db::RepositoryError;
use crate::db::categories::CategoryRepository;
use crate::db::products::{ProductFields, ProductFilter, ProductRepository};
use crate::models::{Category, Product, ProductPhoto};

use super::non_blank;

/// Largest accepted photo upload, in bytes.
pub const MAX_PHOTO_BYTES: usize = 1_000_000;

/// Number of products returned by the unpaged listing.
pub const RECENT_PRODUCTS_LIMIT: i64 = 12;

/// Number of related products returned.
pub const RELATED_PRODUCTS_LIMIT: i64 = 3;

const DEFAULT_PHOTO_CONTENT_TYPE: &str = "application/octet-stream";

/// Raw product fields as submitted in a multipart form.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<String>,
    pub shipping: Option<String>,
    pub photo: Option<PhotoUpload>,
}

/// An uploaded photo file.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Category request body.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryForm {
    pub name: Option<String>,
}

/// Product filter request body.
///
/// `checked` lists category ids; `radio` is an optional `[low, high]` price
/// range.
#[derive(Debug, Default, Deserialize)]
pub struct FilterForm {
    #[serde(default)]
    pub checked: Vec<String>,
    #[serde(default)]
    pub radio: Vec<Price>,
}

/// Catalog service.
pub struct CatalogService<'a> {
    categories: CategoryRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            categories: CategoryRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if the name is blank.
    /// Returns `CatalogError::Conflict` if the derived slug is taken.
    #[instrument(skip(self, form))]
    pub async fn create_category(&self, form: &CategoryForm) -> Result<Category, CatalogError> {
        let (name, slug) = category_name(form)?;

        let category = self
            .categories
            .create(name, &slug)
            .await
            .map_err(|e| conflict_as(e, "Category Already Exists"))?;

        tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
        Ok(category)
    }

    /// Rename a category, regenerating its slug.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if the name is blank.
    /// Returns `CatalogError::NotFound` if the category doesn't exist.
    /// Returns `CatalogError::Conflict` if the derived slug is taken.
    #[instrument(skip(self, form))]
    pub async fn update_category(
        &self,
        id: &str,
        form: &CategoryForm,
    ) -> Result<Category, CatalogError> {
        let id = parse_id::<CategoryId>(id).ok_or_else(|| invalid_id("category"))?;
        let (name, slug) = category_name(form)?;

        self.categories
            .update(id, name, &slug)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CatalogError::NotFound("Category"),
                other => conflict_as(other, "Category Already Exists"),
            })
    }

    /// Every category, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.categories.list_all().await?)
    }

    /// Look up a category by slug.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no category has the slug.
    pub async fn get_category(&self, slug: &str) -> Result<Category, CatalogError> {
        self.categories
            .get_by_slug(slug)
            .await?
            .ok_or(CatalogError::NotFound("Category"))
    }

    /// Delete a category. Products referencing it are left in place.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the category doesn't exist.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: &str) -> Result<(), CatalogError> {
        let id = parse_id::<CategoryId>(id).ok_or_else(|| invalid_id("category"))?;

        self.categories.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => CatalogError::NotFound("Category"),
            other => other.into(),
        })
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Create a product from form fields.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if a field is missing or malformed
    /// or the photo is too large.
    /// Returns `CatalogError::Conflict` if the derived slug is taken.
    #[instrument(skip(self, form))]
    pub async fn create_product(&self, form: ProductForm) -> Result<Product, CatalogError> {
        let fields = validate_product(form)?;

        let product = self
            .products
            .create(&fields)
            .await
            .map_err(|e| conflict_as(e, "A product with this name already exists"))?;

        tracing::info!(product_id = %product.id, slug = %product.slug, "Product created");
        Ok(product)
    }

    /// Overwrite a product from form fields. The photo is replaced only when a
    /// new one is uploaded.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if a field is missing or malformed.
    /// Returns `CatalogError::NotFound` if the product doesn't exist.
    /// Returns `CatalogError::Conflict` if the derived slug is taken.
    #[instrument(skip(self, form))]
    pub async fn update_product(
        &self,
        id: &str,
        form: ProductForm,
    ) -> Result<Product, CatalogError> {
        let id = parse_id::<ProductId>(id).ok_or_else(|| invalid_id("product"))?;
        let fields = validate_product(form)?;

        self.products
            .update(id, &fields)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CatalogError::NotFound("Product"),
                other => conflict_as(other, "A product with this name already exists"),
            })
    }

    /// The most recently created products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.list_recent(RECENT_PRODUCTS_LIMIT).await?)
    }

    /// Look up a product by slug.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no product has the slug.
    pub async fn get_product(&self, slug: &str) -> Result<Product, CatalogError> {
        self.products
            .get_by_slug(slug)
            .await?
            .ok_or(CatalogError::NotFound("Product"))
    }

    /// Load a product's photo. `Ok(None)` means the product has none.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product doesn't exist.
    pub async fn product_photo(&self, id: &str) -> Result<Option<ProductPhoto>, CatalogError> {
        let id = parse_id::<ProductId>(id).ok_or_else(|| invalid_id("product"))?;

        self.products.photo(id).await.map_err(|e| match e {
            RepositoryError::NotFound => CatalogError::NotFound("Product"),
            other => other.into(),
        })
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product doesn't exist.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: &str) -> Result<(), CatalogError> {
        let id = parse_id::<ProductId>(id).ok_or_else(|| invalid_id("product"))?;

        self.products.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => CatalogError::NotFound("Product"),
            other => other.into(),
        })
    }

    /// Products in any of the checked categories and within the price range.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for malformed category ids or a
    /// price range that is not exactly two values.
    pub async fn filter_products(&self, form: &FilterForm) -> Result<Vec<Product>, CatalogError> {
        let filter = build_filter(form)?;
        Ok(self.products.filter(&filter).await?)
    }

    /// Total number of products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn count_products(&self) -> Result<i64, CatalogError> {
        Ok(self.products.count().await?)
    }

    /// One page of products, newest first. Pages past the end are empty.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if the page number is not a positive integer.
    pub async fn list_products_page(&self, page: &str) -> Result<Vec<Product>, CatalogError> {
        let page = page
            .parse::<u32>()
            .map_err(|_| CatalogError::Validation("Page must be a positive whole number".into()))
            .and_then(|n| {
                PageRequest::new(n).map_err(|e| CatalogError::Validation(capitalize(&e.to_string())))
            })?;

        Ok(self.products.page(page).await?)
    }

    /// Case-insensitive literal search over names and descriptions.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if the keyword is blank.
    pub async fn search_products(&self, keyword: &str) -> Result<Vec<Product>, CatalogError> {
        let keyword = non_blank(Some(keyword))
            .ok_or_else(|| CatalogError::Validation("Keyword is required".into()))?;

        Ok(self.products.search(keyword).await?)
    }

    /// Other products from the same category.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` if either id is malformed.
    pub async fn related_products(
        &self,
        product_id: &str,
        category_id: &str,
    ) -> Result<Vec<Product>, CatalogError> {
        let product_id = parse_id::<ProductId>(product_id).ok_or_else(|| invalid_id("product"))?;
        let category_id =
            parse_id::<CategoryId>(category_id).ok_or_else(|| invalid_id("category"))?;

        Ok(self
            .products
            .related(product_id, category_id, RELATED_PRODUCTS_LIMIT)
            .await?)
    }

    /// A category and every product referencing it.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no category has the slug.
    pub async fn products_by_category(
        &self,
        slug: &str,
    ) -> Result<(Category, Vec<Product>), CatalogError> {
        let category = self.get_category(slug).await?;
        let products = self.products.list_by_category(category.id).await?;
        Ok((category, products))
    }
}

// =============================================================================
// Validation
// =============================================================================

fn category_name(form: &CategoryForm) -> Result<(&str, Slug), CatalogError> {
    let name = non_blank(form.name.as_deref())
        .ok_or_else(|| CatalogError::Validation("Name is required".into()))?;
    let slug = Slug::from_name(name).ok_or_else(|| {
        CatalogError::Validation("Name must contain at least one letter or digit".into())
    })?;
    Ok((name, slug))
}

/// Check every product field, stopping at the first failure.
fn validate_product(form: ProductForm) -> Result<ProductFields, CatalogError> {
    let name = required(form.name.as_deref(), "Name")?;
    let description = required(form.description.as_deref(), "Description")?;
    let price = required(form.price.as_deref(), "Price")?;
    let category = required(form.category.as_deref(), "Category")?;
    let quantity = required(form.quantity.as_deref(), "Quantity")?;

    let slug = Slug::from_name(name).ok_or_else(|| {
        CatalogError::Validation("Name must contain at least one letter or digit".into())
    })?;
    let price = Price::parse(price)
        .map_err(|e| CatalogError::Validation(capitalize(&e.to_string())))?;
    let category_id = parse_id::<CategoryId>(category).ok_or_else(|| invalid_id("category"))?;
    let quantity = quantity
        .parse::<i32>()
        .ok()
        .filter(|q| *q >= 0)
        .ok_or_else(|| {
            CatalogError::Validation("Quantity must be a non-negative whole number".into())
        })?;
    let shipping = parse_flag(form.shipping.as_deref())?;

    let photo = match form.photo {
        Some(upload) if upload.bytes.len() > MAX_PHOTO_BYTES => {
            return Err(CatalogError::Validation(
                "Photo should be less than 1MB".into(),
            ));
        }
        Some(upload) if upload.bytes.is_empty() => None,
        Some(upload) => Some(ProductPhoto {
            content_type: upload
                .content_type
                .filter(|ct| !ct.is_empty())
                .unwrap_or_else(|| DEFAULT_PHOTO_CONTENT_TYPE.to_owned()),
            bytes: upload.bytes,
        }),
        None => None,
    };

    Ok(ProductFields {
        name: name.to_owned(),
        slug,
        description: description.to_owned(),
        price,
        category_id,
        quantity,
        shipping,
        photo,
    })
}

fn build_filter(form: &FilterForm) -> Result<ProductFilter, CatalogError> {
    let category_ids = form
        .checked
        .iter()
        .map(|id| parse_id::<CategoryId>(id).ok_or_else(|| invalid_id("category")))
        .collect::<Result<Vec<_>, _>>()?;

    let price_range = match form.radio.as_slice() {
        [] => None,
        [low, high] => Some((*low, *high)),
        _ => {
            return Err(CatalogError::Validation(
                "Price range must be [low, high]".into(),
            ));
        }
    };

    Ok(ProductFilter {
        category_ids,
        price_range,
    })
}

/// Form checkbox values: absent means `false`.
fn parse_flag(value: Option<&str>) -> Result<bool, CatalogError> {
    match non_blank(value).map(str::to_ascii_lowercase).as_deref() {
        None | Some("0" | "false" | "no" | "off") => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some(_) => Err(CatalogError::Validation(
            "Shipping must be true or false".into(),
        )),
    }
}

fn required<'v>(value: Option<&'v str>, field: &str) -> Result<&'v str, CatalogError> {
    non_blank(value).ok_or_else(|| CatalogError::Validation(format!("{field} is required")))
}

fn invalid_id(kind: &str) -> CatalogError {
    CatalogError::Validation(format!("Invalid {kind} id"))
}

fn conflict_as(err: RepositoryError, message: &str) -> CatalogError {
    match err {
        RepositoryError::Conflict(_) => CatalogError::Conflict(message.to_owned()),
        other => other.into(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            name: Some("Red Mug".into()),
            description: Some("A red item".into()),
            price: Some("10".into()),
            category: Some(CategoryId::generate().to_string()),
            quantity: Some("4".into()),
            shipping: Some("1".into()),
            photo: None,
        }
    }

    fn validation_message(result: Result<ProductFields, CatalogError>) -> String {
        match result {
            Err(CatalogError::Validation(message)) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_form_derives_slug() {
        let fields = validate_product(form()).unwrap();
        assert_eq!(fields.slug.as_str(), "red-mug");
        assert_eq!(fields.price.to_string(), "10.00");
        assert_eq!(fields.quantity, 4);
        assert!(fields.shipping);
        assert!(fields.photo.is_none());
    }

    #[test]
    fn test_oversized_price_is_validation_error() {
        let message = validation_message(validate_product(ProductForm {
            price: Some("100000000000".into()),
            ..form()
        }));
        assert_eq!(message, "Price must be less than 10000000000");
    }

    #[test]
    fn test_rename_changes_slug() {
        let fields = validate_product(ProductForm {
            name: Some("Blue Mug".into()),
            ..form()
        })
        .unwrap();
        assert_eq!(fields.slug.as_str(), "blue-mug");
    }

    #[test]
    fn test_first_missing_field_is_reported() {
        let message = validation_message(validate_product(ProductForm {
            description: None,
            quantity: None,
            ..form()
        }));
        assert_eq!(message, "Description is required");
    }

    #[test]
    fn test_negative_values_are_rejected() {
        let message = validation_message(validate_product(ProductForm {
            price: Some("-1".into()),
            ..form()
        }));
        assert_eq!(message, "Price cannot be negative");

        let message = validation_message(validate_product(ProductForm {
            quantity: Some("-3".into()),
            ..form()
        }));
        assert!(message.starts_with("Quantity"));
    }

    #[test]
    fn test_photo_size_limit() {
        let at_limit = validate_product(ProductForm {
            photo: Some(PhotoUpload {
                content_type: Some("image/jpeg".into()),
                bytes: vec![0; MAX_PHOTO_BYTES],
            }),
            ..form()
        })
        .unwrap();
        assert_eq!(at_limit.photo.unwrap().content_type, "image/jpeg");

        let message = validation_message(validate_product(ProductForm {
            photo: Some(PhotoUpload {
                content_type: Some("image/jpeg".into()),
                bytes: vec![0; MAX_PHOTO_BYTES + 1],
            }),
            ..form()
        }));
        assert_eq!(message, "Photo should be less than 1MB");
    }

    #[test]
    fn test_photo_without_content_type_gets_default() {
        let fields = validate_product(ProductForm {
            photo: Some(PhotoUpload {
                content_type: None,
                bytes: vec![1, 2, 3],
            }),
            ..form()
        })
        .unwrap();
        assert_eq!(fields.photo.unwrap().content_type, DEFAULT_PHOTO_CONTENT_TYPE);
    }

    #[test]
    fn test_parse_flag() {
        assert!(!parse_flag(None).unwrap());
        assert!(!parse_flag(Some("false")).unwrap());
        assert!(parse_flag(Some("TRUE")).unwrap());
        assert!(parse_flag(Some("maybe")).is_err());
    }

    #[test]
    fn test_filter_price_range_only() {
        let filter = build_filter(&FilterForm {
            checked: vec![],
            radio: vec![Price::parse("10").unwrap(), Price::parse("20").unwrap()],
        })
        .unwrap();
        assert!(filter.category_ids.is_empty());
        assert_eq!(
            filter.price_range,
            Some((Price::parse("10").unwrap(), Price::parse("20").unwrap()))
        );
    }

    #[test]
    fn test_filter_rejects_bad_input() {
        assert!(build_filter(&FilterForm {
            checked: vec!["nope".into()],
            radio: vec![],
        })
        .is_err());
        assert!(build_filter(&FilterForm {
            checked: vec![],
            radio: vec![Price::ZERO],
        })
        .is_err());
    }

    #[test]
    fn test_filter_form_json() {
        let form: FilterForm = serde_json::from_str(r#"{"checked":[],"radio":[0,19.99]}"#).unwrap();
        assert_eq!(form.radio.len(), 2);
        let empty: FilterForm = serde_json::from_str("{}").unwrap();
        assert!(empty.checked.is_empty() && empty.radio.is_empty());
    }

    #[test]
    fn test_category_name() {
        let form = CategoryForm {
            name: Some("  Kitchen & Dining ".into()),
        };
        let (name, slug) = category_name(&form).unwrap();
        assert_eq!(name, "Kitchen & Dining");
        assert_eq!(slug.as_str(), "kitchen-dining");
        assert!(category_name(&CategoryForm::default()).is_err());
    }
}
