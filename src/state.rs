/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - tokens: TokenCodec (署名鍵は起動時に固定、read-only 共有)
 *   - identities / credentials / users
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::auth::{AuthServices, CredentialVerifier, IdentityResolver, TokenCodec};
use crate::services::users::UserService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub tokens: Arc<TokenCodec>,
    pub identities: IdentityResolver,
    pub credentials: Arc<CredentialVerifier>,
    pub users: UserService,
    /// Scheme label expected before the token in `Authorization`.
    pub token_prefix: Arc<str>,
}

impl AppState {
    pub fn new(auth: AuthServices, users: UserService, token_prefix: impl Into<Arc<str>>) -> Self {
        Self {
            tokens: auth.tokens,
            identities: auth.identities,
            credentials: auth.credentials,
            users,
            token_prefix: token_prefix.into(),
        }
    }
}
