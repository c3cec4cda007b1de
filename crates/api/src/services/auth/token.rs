//! Signed session tokens.
//!
//! Tokens are HS256 JWTs whose subject is the user id.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bazaar_core::UserId;

/// Errors from issuing or verifying a session token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    /// Bad signature, expired, or not a JWT.
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    /// The subject claim is not a user id.
    #[error("token subject is not a user id")]
    BadSubject,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenKeys {
    /// Build keys from a shared secret and a lifetime in days.
    #[must_use]
    pub fn new(secret: &SecretString, ttl_days: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl: Duration::days(ttl_days),
        }
    }

    /// Issue a token for a user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encode` if signing fails.
    pub fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        let now = Utc::now();
        self.sign(&Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        })
    }

    /// Verify a token and return the user it was issued to.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` for bad signatures or expired tokens, and
    /// `TokenError::BadSubject` if the subject is not a user id.
    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(TokenError::Invalid)?;

        data.claims.sub.parse().map_err(|_| TokenError::BadSubject)
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.encoding).map_err(TokenError::Encode)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn keys(secret: &str) -> TokenKeys {
        TokenKeys::new(&SecretString::from(secret), 7)
    }

    #[test]
    fn test_issue_then_verify() {
        let keys = keys("Qw7#Lp2@Zx9!Mn4$Rt6%Vb8^Hk1&Jd3*");
        let user = UserId::generate();
        let token = keys.issue(user).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), user);
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let token = keys("first-signing-key-0123456789abcdef")
            .issue(UserId::generate())
            .unwrap();
        let err = keys("second-signing-key-0123456789abcdef")
            .verify(&token)
            .unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let keys = keys("Qw7#Lp2@Zx9!Mn4$Rt6%Vb8^Hk1&Jd3*");
        let issued = Utc::now() - Duration::days(8);
        let token = keys
            .sign(&Claims {
                sub: UserId::generate().to_string(),
                iat: issued.timestamp(),
                exp: (issued + Duration::days(7)).timestamp(),
            })
            .unwrap();
        assert!(matches!(keys.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_non_uuid_subject_is_rejected() {
        let keys = keys("Qw7#Lp2@Zx9!Mn4$Rt6%Vb8^Hk1&Jd3*");
        let now = Utc::now();
        let token = keys
            .sign(&Claims {
                sub: "42".to_owned(),
                iat: now.timestamp(),
                exp: (now + Duration::hours(1)).timestamp(),
            })
            .unwrap();
        assert!(matches!(keys.verify(&token), Err(TokenError::BadSubject)));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(keys("Qw7#Lp2@Zx9!Mn4$Rt6%Vb8^Hk1&Jd3*").verify("not.a.jwt").is_err());
    }
}
