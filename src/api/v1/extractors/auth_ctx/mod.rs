/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - 認証コンテキスト（RequestContext / Principal）を handler に提供する
 * - HTTP / axum 依存は core に閉じ込め、型定義は types に分離する
 *
 * Public API:
 * - Principal
 * - RequestContext
 * - Authenticated
 */

mod core;
mod types;

pub use self::core::Authenticated;
pub use types::{Principal, RequestContext};
