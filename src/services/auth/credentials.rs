use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::services::auth::identity::{IdentityError, IdentityResolver};
use crate::services::auth::password::{PasswordError, PasswordHasher, verify_blocking};
use crate::services::auth::token_codec::TokenCodec;

const DECOY_PASSWORD: &str = "decoy-password-for-unknown-users";

/// Login failures. Unknown user and wrong password are the same variant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("authentication backend failure")]
    Internal,
}

#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub token: String,
    pub username: String,
    /// Authorization scheme the client must use with `token` (e.g. "Bearer").
    pub scheme: String,
}

/// Username/password login: resolve the account, check the bcrypt hash, mint a token.
pub struct CredentialVerifier {
    identities: IdentityResolver,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<TokenCodec>,
    ttl: Duration,
    scheme: String,
    // Unknown usernames are verified against this so they cost the same as a wrong password.
    decoy_hash: String,
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("identities", &self.identities)
            .field("ttl", &self.ttl)
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

impl CredentialVerifier {
    pub fn new(
        identities: IdentityResolver,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<TokenCodec>,
        ttl: Duration,
        scheme: impl Into<String>,
    ) -> Result<Self, PasswordError> {
        let decoy_hash = hasher.hash(DECOY_PASSWORD)?;

        Ok(Self {
            identities,
            hasher,
            tokens,
            ttl,
            scheme: scheme.into(),
            decoy_hash,
        })
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginSuccess, AuthFailure> {
        let user = match self.identities.load_by_username(username).await {
            Ok(user) => Some(user),
            Err(IdentityError::NotFound) => None,
            Err(IdentityError::Store(e)) => {
                error!(error = %e, "user lookup failed during login");
                return Err(AuthFailure::Internal);
            }
        };

        let hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| self.decoy_hash.clone());

        let matches = verify_blocking(self.hasher.clone(), password.to_string(), hash)
            .await
            .map_err(|e| {
                error!(username = %username, error = %e, "password verification failed");
                AuthFailure::Internal
            })?;

        let Some(user) = user.filter(|_| matches) else {
            warn!(username = %username, "login rejected");
            return Err(AuthFailure::InvalidCredentials);
        };

        let token = self
            .tokens
            .generate(&user.username, Utc::now(), self.ttl)
            .map_err(|e| {
                error!(username = %user.username, error = %e, "failed to issue token");
                AuthFailure::Internal
            })?;

        info!(username = %user.username, "login succeeded");

        Ok(LoginSuccess {
            token,
            username: user.username,
            scheme: self.scheme.clone(),
        })
    }
}
