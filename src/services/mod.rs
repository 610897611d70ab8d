/*
 * Responsibility
 * - ドメインサービス (認証コア / ユーザー登録)
 */
pub mod auth;
pub mod users;
