//! URL-safe slugs derived from display names.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A URL-safe identifier derived from a display name.
///
/// Slugs consist of lowercase ASCII letters and digits separated by single
/// hyphens, with no leading or trailing hyphen. Apostrophes are dropped so
/// possessives stay in one word; every other non-alphanumeric run becomes a
/// single hyphen.
///
/// ```
/// use bazaar_core::Slug;
///
/// assert_eq!(Slug::from_name("Red Mug").unwrap().as_str(), "red-mug");
/// assert_eq!(Slug::from_name("  Kid's  T-Shirt (XL) ").unwrap().as_str(), "kids-t-shirt-xl");
/// assert!(Slug::from_name("!!!").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from a display name.
    ///
    /// Returns `None` when the name has no ASCII letters or digits.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let mut out = String::with_capacity(name.len());
        let mut pending_hyphen = false;

        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_hyphen && !out.is_empty() {
                    out.push('-');
                }
                pending_hyphen = false;
                out.push(c.to_ascii_lowercase());
            } else if c != '\'' && c != '\u{2019}' {
                pending_hyphen = true;
            }
        }

        if out.is_empty() { None } else { Some(Self(out)) }
    }

    /// Wrap a slug read back from storage.
    ///
    /// Stored slugs were produced by [`Slug::from_name`], so no re-validation
    /// happens here.
    #[must_use]
    pub const fn from_stored(s: String) -> Self {
        Self(s)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
