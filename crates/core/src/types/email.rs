//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty (after trimming).
    #[error("email cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not contain exactly one @ symbol.
    #[error("email must contain exactly one @ symbol")]
    BadAtSymbol,
    /// The local part (before @) or the domain (after @) is empty.
    #[error("email must have text on both sides of @")]
    EmptyPart,
    /// The input contains whitespace.
    #[error("email cannot contain whitespace")]
    Whitespace,
}

/// A normalized email address.
///
/// Parsing trims surrounding whitespace and lowercases the address, so the
/// unique index on `users.email` treats `Ann@Shop.io` and `ann@shop.io` as the
/// same account.
///
/// ## Examples
///
/// ```
/// use bazaar_core::Email;
///
/// let email = Email::parse("  Ann@Shop.io ").unwrap();
/// assert_eq!(email.as_str(), "ann@shop.io");
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("a@b@c").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalize an `Email`.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than 254
    /// characters, contains whitespace, or does not have exactly one @ with
    /// text on both sides.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.chars().any(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        let mut parts = s.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(EmailError::BadAtSymbol);
        };
        if local.is_empty() || domain.is_empty() {
            return Err(EmailError::EmptyPart);
        }

        Ok(Self(s.to_lowercase()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_case_and_whitespace() {
        let email = Email::parse("\tBuyer@Example.COM\n").unwrap();
        assert_eq!(email.as_str(), "buyer@example.com");
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("plain"), Err(EmailError::BadAtSymbol));
        assert_eq!(Email::parse("a@b@c.io"), Err(EmailError::BadAtSymbol));
        assert_eq!(Email::parse("@shop.io"), Err(EmailError::EmptyPart));
        assert_eq!(Email::parse("ann@"), Err(EmailError::EmptyPart));
        assert_eq!(Email::parse("ann smith@shop.io"), Err(EmailError::Whitespace));
    }

    #[test]
    fn test_too_long() {
        let long = format!("{}@shop.io", "x".repeat(250));
        assert!(matches!(Email::parse(&long), Err(EmailError::TooLong { max: 254 })));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Email = serde_json::from_str("\"Ann@Shop.io\"").unwrap();
        assert_eq!(ok.as_str(), "ann@shop.io");
        assert!(serde_json::from_str::<Email>("\"nope\"").is_err());
    }
}
