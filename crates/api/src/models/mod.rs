//! Domain models returned by repositories and rendered by routes.
//!
//! Identifiers serialize as `_id`, which is the key storefront clients send
//! back in cart payloads.

pub mod catalog;
pub mod order;
pub mod user;

pub use catalog::{Category, Product, ProductPhoto, ProductSummary};
pub use order::{BuyerSummary, Order};
pub use user::User;
