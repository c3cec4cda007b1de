//! Bazaar Core - Shared domain types.
//!
//! This crate provides the types used across all Bazaar components:
//! - `api` - The REST backend (auth, catalog, orders, payments)
//! - `cli` - Command-line tools for migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, slugs, prices, statuses, and paging

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
