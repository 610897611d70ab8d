use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("stored password hash is unreadable: {0}")]
    Verify(String),
    #[error("password worker failed: {0}")]
    Worker(String),
}

/// One-way password hashing used for registration and login.
///
/// Implementations are CPU-bound and synchronous; async callers go through
/// `hash_blocking` / `verify_blocking` so request tasks never run them inline.
pub trait PasswordHasher: Send + Sync + 'static {
    fn hash(&self, plain: &str) -> Result<String, PasswordError>;

    /// `Ok(false)` on mismatch. `Err` only when the stored hash itself is unusable.
    fn verify(&self, plain: &str, hash: &str) -> Result<bool, PasswordError>;
}

/// bcrypt with a fixed cost factor (12 in production).
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        bcrypt::hash(plain, self.cost).map_err(|e| PasswordError::Hash(e.to_string()))
    }

    fn verify(&self, plain: &str, hash: &str) -> Result<bool, PasswordError> {
        bcrypt::verify(plain, hash).map_err(|e| PasswordError::Verify(e.to_string()))
    }
}

pub async fn hash_blocking(
    hasher: std::sync::Arc<dyn PasswordHasher>,
    plain: String,
) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hasher.hash(&plain))
        .await
        .map_err(|e| PasswordError::Worker(e.to_string()))?
}

pub async fn verify_blocking(
    hasher: std::sync::Arc<dyn PasswordHasher>,
    plain: String,
    hash: String,
) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash))
        .await
        .map_err(|e| PasswordError::Worker(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn hash_then_verify() {
        let hasher = BcryptHasher::new(4);
        let hash = hasher.hash("s3cret-pass").unwrap();

        assert_ne!(hash, "s3cret-pass");
        assert!(hasher.verify("s3cret-pass", &hash).unwrap());
        assert!(!hasher.verify("wrong-pass", &hash).unwrap());
    }

    #[test]
    fn hash_embeds_cost() {
        let hash = BcryptHasher::new(5).hash("pw").unwrap();
        assert!(hash.starts_with("$2b$05$"));
    }

    #[test]
    fn unreadable_hash_is_an_error() {
        let err = BcryptHasher::new(4)
            .verify("pw", "not-a-bcrypt-hash")
            .unwrap_err();
        assert!(matches!(err, PasswordError::Verify(_)));
    }

    #[tokio::test]
    async fn blocking_helpers_round_trip() {
        let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(4));
        let hash = hash_blocking(hasher.clone(), "pw".to_string()).await.unwrap();
        assert!(verify_blocking(hasher, "pw".to_string(), hash).await.unwrap());
    }
}
