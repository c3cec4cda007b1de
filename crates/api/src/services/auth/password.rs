//! Argon2id hashing for passwords and security answers.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::AuthError;

/// Hash a secret using Argon2id.
pub fn hash_secret(secret: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Returns true if `secret` matches the stored hash.
///
/// An unparseable stored hash never matches.
#[must_use]
pub fn verify_secret(secret: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_secret("hunter22").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_secret("hunter22", &hash));
        assert!(!verify_secret("hunter23", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_secret("same").unwrap();
        let b = hash_secret("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_hash_never_matches() {
        assert!(!verify_secret("anything", "not-a-phc-string"));
    }
}
