//! Bearer token 検証 → RequestContext を extensions に入れる (AuthenticationFilter)
//!
//! - filter はリクエストを中断しない。失敗は「未認証」として下流に流す
//! - 401 を返すかどうかは protected route 側の guard / extractor が決める

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::api::v1::extractors::{Principal, RequestContext};
use crate::middleware::auth::unauthorized::Unauthorized;
use crate::services::auth::IdentityError;
use crate::state::AppState;

/// Run the authentication filter on every request routed through `router`.
///
/// ```ignore
/// let app = middleware::auth::access::apply(router, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, authentication_filter))
}

/// Reject requests without a Principal before they reach any handler in `router`.
pub fn require_principal(router: Router<AppState>) -> Router<AppState> {
    router.route_layer(middleware::from_fn(principal_guard))
}

async fn authentication_filter(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let ctx = authenticate(&state, req.headers()).await;

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(ctx);

    next.run(req).await
}

async fn principal_guard(req: Request<Body>, next: Next) -> Response {
    let authenticated = req
        .extensions()
        .get::<RequestContext>()
        .is_some_and(RequestContext::is_authenticated);

    if authenticated {
        return next.run(req).await;
    }

    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    Unauthorized::missing(path).into_response()
}

/// Resolve the request's identity from its credential header.
///
/// Every failure path yields an anonymous context; nothing here retries.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> RequestContext {
    let Some(token) = bearer_token(headers, &state.token_prefix) else {
        return RequestContext::anonymous();
    };

    let now = Utc::now();

    // token の中身はログに出さない (kind のみ)
    let claims = match state.tokens.parse_at(token, now) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(error = %err, kind = ?err, "access token rejected");
            return RequestContext::anonymous();
        }
    };

    let user = match state.identities.load_by_username(&claims.subject).await {
        Ok(user) => user,
        Err(IdentityError::NotFound) => {
            tracing::warn!(subject = %claims.subject, "token subject no longer exists");
            return RequestContext::anonymous();
        }
        Err(IdentityError::Store(err)) => {
            tracing::error!(subject = %claims.subject, error = %err, "user lookup failed");
            return RequestContext::anonymous();
        }
    };

    if !state.tokens.validate_at(token, &user.username, now) {
        tracing::warn!(subject = %claims.subject, "token subject does not match account");
        return RequestContext::anonymous();
    }

    tracing::debug!(username = %user.username, "request authenticated");
    RequestContext::authenticated(Principal::from_user(&user))
}

/// `Authorization: <prefix> <token>`. Any other shape means "no credential".
fn bearer_token<'a>(headers: &'a HeaderMap, prefix: &str) -> Option<&'a str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let rest = value.strip_prefix(prefix)?.strip_prefix(' ')?;
    Some(rest.trim())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn extracts_token_after_prefix() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi"), "Bearer"), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_header_is_none() {
        assert_eq!(bearer_token(&HeaderMap::new(), "Bearer"), None);
    }

    #[test]
    fn other_scheme_is_none() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz"), "Bearer"), None);
        assert_eq!(bearer_token(&headers("Bearerabc"), "Bearer"), None);
    }

    #[test]
    fn custom_prefix() {
        assert_eq!(bearer_token(&headers("Token abc"), "Token"), Some("abc"));
        assert_eq!(bearer_token(&headers("Bearer abc"), "Token"), None);
    }

    #[test]
    fn prefix_with_blank_token_is_empty() {
        assert_eq!(bearer_token(&headers("Bearer "), "Bearer"), Some(""));
    }
}
