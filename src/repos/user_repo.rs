/*
 * Responsibility
 * - users テーブル向け SQLx 操作
 * - UserStore trait: 認証コアが依存する「ユーザー検索・保存」の契約
 * - DB エラーは RepoError に変換して返す (unique 違反は Conflict)
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};

/// Stored account record. `password_hash` is a bcrypt hash, never the plain password.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lookup / persistence interface consumed by the auth services.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    // Returns the backend name (for logging).
    fn backend_name(&self) -> &'static str;

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;

    // Insert, or update the record with the same id.
    // A username/email already owned by another id => `RepoError::Conflict`.
    async fn save(&self, user: &User) -> RepoResult<User>;

    async fn list_usernames(&self) -> RepoResult<Vec<String>>;

    async fn ping(&self) -> RepoResult<()>;
}

#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, roles, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn save(&self, user: &User) -> RepoResult<User> {
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash, roles, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
            SET
                username = EXCLUDED.username,
                email = EXCLUDED.email,
                password_hash = EXCLUDED.password_hash,
                roles = EXCLUDED.roles,
                updated_at = EXCLUDED.updated_at
            RETURNING id, username, email, password_hash, roles, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(user.email.as_deref())
        .bind(&user.password_hash)
        .bind(&user.roles)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn list_usernames(&self) -> RepoResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT username
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(names)
    }

    async fn ping(&self) -> RepoResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)?;
        Ok(())
    }
}
