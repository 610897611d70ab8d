/*
 * Responsibility
 * - URL 構造を定義
 * - public: /health, /api/auth/login, /api/auth/register (+ 旧パス /login, /register)
 * - protected: /, /api/v1/me (Principal が無ければ route_layer で 401)
 * - AuthenticationFilter は全ルート (fallback 含む) に掛ける
 * - method 不一致は 405 envelope (protected 側は guard の内側なので未認証なら 401 が先)
 */
use axum::{
    Router,
    extract::OriginalUri,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::api::v1::extractors::RequestContext;
use crate::api::v1::handlers::{
    auth::{login, register},
    health::health,
    users::{list_usernames, me},
};
use crate::error::AppError;
use crate::middleware::auth::{access, unauthorized::Unauthorized};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api/auth/login", post(login))
        .route("/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/register", post(register))
        .method_not_allowed_fallback(method_not_allowed);

    let protected = access::require_principal(
        Router::new()
            .route("/", get(list_usernames))
            .route("/api/v1/me", get(me))
            .method_not_allowed_fallback(method_not_allowed),
    );

    let router = public.merge(protected).fallback(fallback);

    access::apply(router, state)
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

// 未定義パスも protected 扱い: 未認証なら 401、認証済みなら 404
async fn fallback(ctx: RequestContext, OriginalUri(uri): OriginalUri) -> Response {
    if ctx.is_authenticated() {
        AppError::not_found(uri.path()).into_response()
    } else {
        Unauthorized::missing(uri.path()).into_response()
    }
}
