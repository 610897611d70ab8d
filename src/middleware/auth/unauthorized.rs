//! 401 response for requests that reach a protected route without a Principal.
//!
//! This is the only body clients ever see for an authentication failure, whatever
//! the underlying cause (missing header, bad token, deleted account, wrong password).
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub const DEFAULT_REASON: &str = "Full authentication is required to access this resource";
pub const BAD_CREDENTIALS: &str = "Bad credentials";
const ERROR_TITLE: &str = "Authentication Required";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unauthorized {
    reason: String,
    path: String,
}

#[derive(Debug, Serialize)]
pub struct UnauthorizedBody {
    pub success: bool,
    pub status: u16,
    pub message: String,
    pub error: &'static str,
    pub path: String,
}

impl Unauthorized {
    pub fn new(reason: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            path: path.into(),
        }
    }

    /// No Principal was bound to the request.
    pub fn missing(path: impl Into<String>) -> Self {
        Self::new(DEFAULT_REASON, path)
    }

    /// Login rejected. Does not say which field was wrong.
    pub fn bad_credentials(path: impl Into<String>) -> Self {
        Self::new(BAD_CREDENTIALS, path)
    }

    pub fn body(&self) -> UnauthorizedBody {
        UnauthorizedBody {
            success: false,
            status: StatusCode::UNAUTHORIZED.as_u16(),
            message: format!("Unauthorized: {}", self.reason),
            error: ERROR_TITLE,
            path: self.path.clone(),
        }
    }
}

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        tracing::warn!(path = %self.path, reason = %self.reason, "unauthorized request");
        (StatusCode::UNAUTHORIZED, Json(self.body())).into_response()
    }
}
