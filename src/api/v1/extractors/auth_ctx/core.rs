use std::convert::Infallible;

use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::request::Parts;

use crate::middleware::auth::unauthorized::Unauthorized;

use super::{Principal, RequestContext};

/// Handler で Principal を受け取るための extractor
/// middleware が RequestContext を request.extensions() に insert 済みである前提
/// Principal が無い場合は 401 envelope を返す
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = Unauthorized;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.principal.clone())
            .map(Authenticated)
            .ok_or_else(|| Unauthorized::missing(request_path(parts)))
    }
}

/// 認証の有無にかかわらず RequestContext を受け取る extractor
/// filter を通っていない場合は anonymous 扱い
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Path as the client sent it, before any router nesting strips a prefix.
fn request_path(parts: &Parts) -> String {
    parts
        .extensions
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.path().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string())
}
