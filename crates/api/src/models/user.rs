//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{Email, UserId, UserRole};

/// A shop account as exposed to clients.
///
/// Password and security-answer hashes never live on this type; the
/// repository returns them separately when a flow needs to verify one.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    #[serde(rename = "_id")]
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email address.
    pub email: Email,
    /// Contact phone number.
    pub phone: String,
    /// Shipping address.
    pub address: String,
    /// Consumer or admin.
    pub role: UserRole,
    /// When the user was created.
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}
