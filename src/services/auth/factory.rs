/// Factory: build the auth services from application `Config`.
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::config::Config;
use crate::repos::UserStore;
use crate::services::auth::{
    CredentialVerifier, IdentityResolver, PasswordHasher, SigningSecret, TokenCodec,
};

/// Process-level auth services. The signing secret inside `tokens` is fixed for the
/// lifetime of the process and shared read-only.
#[derive(Clone, Debug)]
pub struct AuthServices {
    pub tokens: Arc<TokenCodec>,
    pub identities: IdentityResolver,
    pub credentials: Arc<CredentialVerifier>,
}

pub fn build_auth_services(
    config: &Config,
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
) -> anyhow::Result<AuthServices> {
    let secret = SigningSecret::from_base64(&config.jwt.secret).context("invalid JWT_SECRET")?;
    let tokens = Arc::new(TokenCodec::new(secret));

    let identities = IdentityResolver::new(store);

    let credentials = CredentialVerifier::new(
        identities.clone(),
        hasher,
        tokens.clone(),
        Duration::from_millis(config.jwt.expiration_ms),
        config.jwt.token_prefix.clone(),
    )
    .context("failed to initialise password hasher")?;

    Ok(AuthServices {
        tokens,
        identities,
        credentials: Arc::new(credentials),
    })
}
