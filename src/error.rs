/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error envelope)
 * - RepoError / RegistrationError を統一的に変換
 * - 認証失敗 (401) はここではなく middleware::auth::unauthorized が担当
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::users::RegistrationError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub timestamp: String,
    pub status: u16,
    pub error: &'static str,
    pub message: String,
    pub details: Option<String>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {message}")]
    BadRequest { message: String },
    #[error("username or email already exists")]
    Conflict,
    #[error("not found: {resource}")]
    NotFound { resource: String },
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("request timed out")]
    Timeout,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, message, details) = match self {
            AppError::BadRequest { message } => ("Validation Failed", message, None),
            AppError::Conflict => (
                "Duplicate Key Error",
                "Username or email already exists".to_string(),
                None,
            ),
            AppError::NotFound { resource } => (
                "Not Found",
                format!("{resource} not found"),
                Some(resource),
            ),
            AppError::MethodNotAllowed => (
                "Method Not Allowed",
                "This HTTP method is not supported for this endpoint".to_string(),
                None,
            ),
            AppError::Timeout => ("Request Timeout", "request timed out".to_string(), None),
            AppError::Internal => (
                "Internal Server Error",
                "internal server error".to_string(),
                None,
            ),
        };

        let body = ErrorResponse {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            status: status.as_u16(),
            error,
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AppError::Conflict,
            RepoError::Db(e) => {
                tracing::error!(error = %e, "repository failure");
                AppError::Internal
            }
        }
    }
}

impl From<RegistrationError> for AppError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::Conflict => AppError::Conflict,
            RegistrationError::Internal => AppError::Internal,
        }
    }
}
