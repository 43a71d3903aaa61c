//! Credential Verifier
//! Mission: Salted adaptive password hashing with fail-closed verification

use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use rand::{distributions::Alphanumeric, Rng};
use tracing::warn;

/// Length of server-generated passwords (create-user without a password,
/// password reset).
pub const GENERATED_PASSWORD_LEN: usize = 16;

/// Hash a plaintext password with bcrypt at the default cost.
pub fn hash_password(plaintext: &str) -> Result<String> {
    hash(plaintext, DEFAULT_COST).context("Failed to hash password")
}

/// Compare a plaintext password against a stored bcrypt hash.
///
/// Fails closed: a malformed hash or any verification error counts as a
/// mismatch. The cause is logged server-side; the plaintext never is.
pub fn verify_password(plaintext: &str, stored_hash: &str) -> bool {
    match verify(plaintext, stored_hash) {
        Ok(matched) => matched,
        Err(err) => {
            warn!("Password verification error: {}", err);
            false
        }
    }
}

/// Generate a random alphanumeric password.
pub fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify_roundtrip() {
        let hash = hash_password("secret123").unwrap();
        assert!(verify_password("secret123", &hash));
    }

    #[test]
    fn test_mutated_password_rejected() {
        let hash = hash_password("secret123").unwrap();
        assert!(!verify_password("secret124", &hash));
        assert!(!verify_password("Secret123", &hash));
        assert!(!verify_password("", &hash));
    }

    #[test]
    fn test_malformed_hash_fails_closed() {
        assert!(!verify_password("secret123", "not-a-bcrypt-hash"));
        assert!(!verify_password("secret123", ""));
    }

    #[test]
    fn test_hashes_are_salted() {
        let h1 = hash_password("secret123").unwrap();
        let h2 = hash_password("secret123").unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_generated_password_shape() {
        let p1 = generate_password();
        let p2 = generate_password();

        assert_eq!(p1.len(), GENERATED_PASSWORD_LEN);
        assert!(p1.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(p1, p2);
    }
}
