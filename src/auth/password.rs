//! Credential hashing with Argon2id.
//!
//! Digests are PHC strings with an embedded random salt, so verification
//! needs no side-channel state and comparison is delegated to the algorithm.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a plaintext password into a self-contained PHC digest.
///
/// # Errors
///
/// Returns an error only if the underlying hasher rejects the input.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let digest = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?;

    Ok(digest.to_string())
}

/// Verify a plaintext password against a stored digest.
///
/// A malformed digest verifies as `false`, never as an error.
#[must_use]
pub fn verify_password(password: &str, digest: &str) -> bool {
    PasswordHash::new(digest).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() -> Result<()> {
        let digest = hash_password("correct horse battery staple")?;
        assert!(digest.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery staple", &digest));
        assert!(!verify_password("correct horse battery", &digest));
        Ok(())
    }

    #[test]
    fn same_password_hashes_differently() -> Result<()> {
        let first = hash_password("hunter2")?;
        let second = hash_password("hunter2")?;
        assert_ne!(first, second);
        assert!(verify_password("hunter2", &first));
        assert!(verify_password("hunter2", &second));
        Ok(())
    }

    #[test]
    fn malformed_digest_is_false_not_error() {
        assert!(!verify_password("password", "not-a-phc-string"));
        assert!(!verify_password("password", ""));
    }

    #[test]
    fn empty_password_round_trips() -> Result<()> {
        let digest = hash_password("")?;
        assert!(verify_password("", &digest));
        assert!(!verify_password("x", &digest));
        Ok(())
    }
}
