/*
 * Responsibility
 * - ユーザーストア (認証コアから見た外部コラボレータ) の公開インターフェース
 */
pub mod error;
pub mod memory;
pub mod user_repo;

pub use error::{RepoError, RepoResult};
pub use memory::InMemoryUserStore;
pub use user_repo::{PgUserStore, User, UserStore};
