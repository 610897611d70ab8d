//! Account registration and listing.
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::repos::{RepoError, RepoResult, User, UserStore};
use crate::services::auth::password::{PasswordHasher, hash_blocking};

/// Role granted to every self-registered account.
pub const DEFAULT_ROLE: &str = "USER";

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("username or email already exists")]
    Conflict,
    #[error("registration failed")]
    Internal,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService")
            .field("store", &self.store.backend_name())
            .finish_non_exhaustive()
    }
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    /// Hash the password and persist a new account with the default role.
    pub async fn register(&self, account: NewAccount) -> Result<User, RegistrationError> {
        let password_hash = hash_blocking(self.hasher.clone(), account.password)
            .await
            .map_err(|e| {
                error!(error = %e, "password hashing failed");
                RegistrationError::Internal
            })?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: account.username,
            email: account.email,
            password_hash,
            roles: vec![DEFAULT_ROLE.to_string()],
            created_at: now,
            updated_at: now,
        };

        let saved = self.store.save(&user).await.map_err(|e| match e {
            RepoError::Conflict => RegistrationError::Conflict,
            RepoError::Db(e) => {
                error!(error = %e, "failed to save user");
                RegistrationError::Internal
            }
        })?;

        info!(user_id = %saved.id, username = %saved.username, "user registered");
        Ok(saved)
    }

    pub async fn list_usernames(&self) -> RepoResult<Vec<String>> {
        self.store.list_usernames().await
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    pub async fn ping(&self) -> RepoResult<()> {
        self.store.ping().await
    }
}
