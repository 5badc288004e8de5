//! Password hashing utilities
//!
//! bcrypt runs on the blocking pool so hashing never stalls the async
//! workers. Errors never carry the plaintext or the digest.
//!
//! bcrypt only reads the first 72 bytes of its input, so longer passwords
//! are refused outright instead of being silently truncated.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::support::errors::{DomainError, DomainResult, InfraError};

/// Longest password bcrypt hashes without truncation.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// bcrypt hasher with a fixed cost factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hasher with an explicit bcrypt cost (4..=31).
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub async fn hash(&self, password: &str) -> DomainResult<String> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(DomainError::validation(
                "password",
                format!("password must be at most {} bytes", MAX_PASSWORD_BYTES),
            ));
        }
        let password = password.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || hash(password, cost))
            .await
            .map_err(|e| crypto_err(format!("hash task failed: {}", e)))?
            .map_err(|e| crypto_err(bcrypt_reason(&e)))
    }

    /// Check `password` against a stored digest.
    ///
    /// A malformed digest is a storage problem, not a mismatch. Passwords
    /// over [`MAX_PASSWORD_BYTES`] never match.
    pub async fn verify(&self, password: &str, digest: &str) -> DomainResult<bool> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        let password = password.to_string();
        let digest = digest.to_string();
        tokio::task::spawn_blocking(move || verify(password, &digest))
            .await
            .map_err(|e| crypto_err(format!("verify task failed: {}", e)))?
            .map_err(|e| crypto_err(bcrypt_reason(&e)))
    }
}

fn crypto_err(reason: String) -> DomainError {
    DomainError::Storage(InfraError::Crypto(reason))
}

fn bcrypt_reason(e: &bcrypt::BcryptError) -> String {
    match e {
        bcrypt::BcryptError::CostNotAllowed(cost) => format!("cost {} not allowed", cost),
        bcrypt::BcryptError::InvalidHash(_) => "malformed password digest".to_string(),
        _ => "bcrypt failure".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hasher = PasswordHasher::with_cost(4);
        let hashed = hasher.hash("Passw0rd!").await.unwrap();

        assert_ne!(hashed, "Passw0rd!");
        assert!(hasher.verify("Passw0rd!", &hashed).await.unwrap());
        assert!(!hasher.verify("Passw0rd?", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn salts_every_hash() {
        let hasher = PasswordHasher::with_cost(4);
        let first = hasher.hash("Passw0rd!").await.unwrap();
        let second = hasher.hash("Passw0rd!").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn malformed_digest_is_an_error_without_leaking_it() {
        let hasher = PasswordHasher::with_cost(4);
        let err = hasher
            .verify("Passw0rd!", "not-a-bcrypt-digest")
            .await
            .unwrap_err();
        let source = std::error::Error::source(&err).unwrap().to_string();
        assert!(!source.contains("not-a-bcrypt-digest"));
        assert!(!source.contains("Passw0rd!"));
    }

    #[tokio::test]
    async fn shared_72_byte_prefix_does_not_verify() {
        let hasher = PasswordHasher::with_cost(4);
        let prefix = "a".repeat(MAX_PASSWORD_BYTES);
        let digest = hasher.hash(&prefix).await.unwrap();

        assert!(hasher.verify(&prefix, &digest).await.unwrap());
        let longer = format!("{}9?attacker", prefix);
        assert!(!hasher.verify(&longer, &digest).await.unwrap());
    }

    #[tokio::test]
    async fn refuses_to_hash_past_72_bytes() {
        let hasher = PasswordHasher::with_cost(4);
        let err = hasher
            .hash(&format!("{}1!correct-tail", "a".repeat(72)))
            .await
            .unwrap_err();
        assert_eq!(err.field(), Some("password"));

        // multi-byte characters count by their encoded length
        let err = hasher.hash(&"é".repeat(40)).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[test]
    fn default_cost_is_bcrypt_default() {
        assert_eq!(PasswordHasher::new().cost(), DEFAULT_COST);
    }
}
