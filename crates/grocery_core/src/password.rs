//! crates/grocery_core/src/password.rs
//!
//! Argon2id password hashing. The salt is embedded in the PHC-formatted digest,
//! so a single text column holds everything needed to verify later.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::warn;

#[derive(Debug, thiserror::Error)]
#[error("Failed to hash password: {0}")]
pub struct HashError(pub(crate) String);

/// Hashes a plaintext password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HashError(e.to_string()))
}

/// Checks a plaintext password against a stored digest.
///
/// A digest that cannot be parsed yields `false`.
pub fn verify_password(password: &str, digest: &str) -> bool {
    let parsed_hash = match PasswordHash::new(digest) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Stored password digest is malformed: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let digest = hash_password("secret").unwrap();
        assert!(verify_password("secret", &digest));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let digest = hash_password("secret").unwrap();
        assert!(!verify_password("Secret", &digest));
        assert!(!verify_password("", &digest));
    }

    #[test]
    fn digest_never_contains_plaintext_and_is_salted() {
        let first = hash_password("secret").unwrap();
        let second = hash_password("secret").unwrap();
        assert!(!first.contains("secret"));
        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_digest_is_false_not_error() {
        assert!(!verify_password("secret", "not-a-digest"));
        assert!(!verify_password("secret", ""));
    }
}
