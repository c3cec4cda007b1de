//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login, password reset, profile updates, session tokens
//! - `catalog` - Category and product management
//! - `orders` - Checkout through the payment gateway and order tracking
//!
//! Services borrow the pool and collaborators from [`crate::state::AppState`]
//! for the duration of one request.

pub mod auth;
pub mod catalog;
pub mod orders;

/// Returns the trimmed value, or `None` when absent or blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Mug ")), Some("Mug"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(Some("")), None);
        assert_eq!(non_blank(None), None);
    }
}
