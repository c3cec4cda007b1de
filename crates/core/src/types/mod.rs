//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod page;
pub mod price;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use page::{PageError, PageRequest};
pub use price::{Price, PriceError};
pub use slug::Slug;
pub use status::*;
