//! HTTP route handlers for the shop API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                          - Welcome message
//!
//! # Auth
//! POST /api/v1/auth/register                      - Register
//! POST /api/v1/auth/login                         - Login, returns a session token
//! POST /api/v1/auth/forgot-password               - Reset password with security answer
//! GET  /api/v1/auth/user-auth                     - Signed-in guard check
//! GET  /api/v1/auth/admin-auth                    - Admin guard check
//! PUT  /api/v1/auth/profile                       - Update own profile
//! GET  /api/v1/auth/orders                        - Own orders
//! GET  /api/v1/auth/all-orders                    - All orders (admin)
//! PUT  /api/v1/auth/order-status/{id}             - Set order status (admin)
//!
//! # Categories
//! POST   /api/v1/category/create-category         - Create (admin)
//! PUT    /api/v1/category/update-category/{id}    - Rename (admin)
//! GET    /api/v1/category/get-category            - List
//! GET    /api/v1/category/single-category/{slug}  - Fetch one
//! DELETE /api/v1/category/delete-category/{id}    - Delete (admin)
//!
//! # Products
//! POST   /api/v1/product/create-product           - Create (admin, multipart)
//! PUT    /api/v1/product/update-product/{id}      - Update (admin, multipart)
//! GET    /api/v1/product/get-product              - Recent products
//! GET    /api/v1/product/get-product/{slug}       - Fetch one
//! GET    /api/v1/product/product-photo/{id}       - Photo bytes
//! DELETE /api/v1/product/delete-product/{id}      - Delete (admin)
//! POST   /api/v1/product/product-filters          - Filter by category and price
//! GET    /api/v1/product/product-count            - Count
//! GET    /api/v1/product/product-list/{page}      - One page
//! GET    /api/v1/product/search/{keyword}         - Keyword search
//! GET    /api/v1/product/related-product/{pid}/{cid} - Same-category products
//! GET    /api/v1/product/product-category/{slug}  - Products in a category
//!
//! # Payments
//! GET  /api/v1/product/braintree/token            - Gateway client token
//! POST /api/v1/product/braintree/payment          - Checkout (signed in)
//! ```

pub mod auth;
pub mod category;
pub mod payment;
pub mod product;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRequest},
    routing::{delete, get, post, put},
};

use crate::error::AppError;
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;

/// Request body cap for product forms. Larger than the photo limit so an
/// oversized photo is rejected with a validation message rather than a 413.
const PRODUCT_BODY_LIMIT: usize = 5 * 1024 * 1024;

/// JSON body extractor whose rejection renders as the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/user-auth", get(auth::user_auth))
        .route("/admin-auth", get(auth::admin_auth))
        .route("/profile", put(auth::update_profile))
        .route("/orders", get(auth::orders))
        .route("/all-orders", get(auth::all_orders))
        .route("/order-status/{id}", put(auth::order_status))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/create-category", post(category::create))
        .route("/update-category/{id}", put(category::update))
        .route("/get-category", get(category::index))
        .route("/single-category/{slug}", get(category::show))
        .route("/delete-category/{id}", delete(category::destroy))
}

/// Create the product and payment routes router.
pub fn product_routes() -> Router<AppState> {
    let uploads = Router::new()
        .route("/create-product", post(product::create))
        .route("/update-product/{id}", put(product::update))
        .layer(DefaultBodyLimit::max(PRODUCT_BODY_LIMIT));

    Router::new()
        .merge(uploads)
        .route("/get-product", get(product::index))
        .route("/get-product/{slug}", get(product::show))
        .route("/product-photo/{id}", get(product::photo))
        .route("/delete-product/{id}", delete(product::destroy))
        .route("/product-filters", post(product::filter))
        .route("/product-count", get(product::count))
        .route("/product-list/{page}", get(product::page))
        .route("/search/{keyword}", get(product::search))
        .route("/related-product/{pid}/{cid}", get(product::related))
        .route("/product-category/{slug}", get(product::by_category))
        .route("/braintree/token", get(payment::token))
        .route("/braintree/payment", post(payment::checkout))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .nest("/api/v1/auth", auth_routes())
        .nest("/api/v1/category", category_routes())
        .nest("/api/v1/product", product_routes())
}

async fn welcome() -> ApiResponse<Empty> {
    ApiResponse::message("Welcome to the Bazaar API")
}
