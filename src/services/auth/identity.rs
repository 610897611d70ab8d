use std::sync::Arc;

use thiserror::Error;

use crate::repos::{RepoError, User, UserStore};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("user not found")]
    NotFound,
    #[error("user store failure: {0}")]
    Store(#[from] RepoError),
}

/// Loads accounts by username from the user store.
///
/// Every call is a fresh store read; nothing is cached, so role or account changes
/// take effect on the next request.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn UserStore>,
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("store", &self.store.backend_name())
            .finish()
    }
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn load_by_username(&self, username: &str) -> Result<User, IdentityError> {
        self.store
            .find_by_username(username)
            .await?
            .ok_or(IdentityError::NotFound)
    }
}
