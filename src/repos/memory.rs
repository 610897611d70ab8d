//! In-process `UserStore` for development runs without `DATABASE_URL`, and for tests.
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::user_repo::{User, UserStore};

/// Cheap to clone; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn save(&self, user: &User) -> RepoResult<User> {
        let mut users = self.users.write().await;

        let taken = users.values().any(|existing| {
            existing.id != user.id
                && (existing.username == user.username
                    || (existing.email.is_some() && existing.email == user.email))
        });
        if taken {
            return Err(RepoError::Conflict);
        }

        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn list_usernames(&self) -> RepoResult<Vec<String>> {
        let users = self.users.read().await;
        let mut rows: Vec<&User> = users.values().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows.into_iter().map(|u| u.username.clone()).collect())
    }

    async fn ping(&self) -> RepoResult<()> {
        Ok(())
    }
}
