use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password must not be empty")]
    Empty,

    #[error("password hashing failed")]
    Hash,

    #[error("stored digest is malformed")]
    MalformedDigest,

    #[error("password verification failed")]
    Verify,
}

/// One-way password hashing (Argon2id) with a random per-password salt.
///
/// Only the PHC-formatted digest ever leaves this module; the plaintext is
/// dropped after hashing/verification.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        if plaintext.is_empty() {
            return Err(PasswordError::Empty);
        }

        let salt = SaltString::generate(&mut OsRng);
        let digest = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|_| PasswordError::Hash)?;

        Ok(digest.to_string())
    }

    /// True iff `plaintext` matches `digest`.
    pub fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(digest).map_err(|_| PasswordError::MalformedDigest)?;

        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(_) => Err(PasswordError::Verify),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hasher = PasswordHasher::new();
        let digest = hasher.hash("pw123").unwrap();

        assert!(hasher.verify("pw123", &digest).unwrap());
        assert!(!hasher.verify("pw124", &digest).unwrap());
    }

    #[test]
    fn same_password_different_digests() {
        let hasher = PasswordHasher::new();
        let a = hasher.hash("pw123").unwrap();
        let b = hasher.hash("pw123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn empty_password_rejected() {
        let hasher = PasswordHasher::new();
        assert!(matches!(hasher.hash(""), Err(PasswordError::Empty)));
    }

    #[test]
    fn malformed_digest_rejected() {
        let hasher = PasswordHasher::new();
        assert!(matches!(
            hasher.verify("pw123", "not-a-phc-digest"),
            Err(PasswordError::MalformedDigest)
        ));
    }
}
