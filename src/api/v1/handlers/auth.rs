/*
 * Responsibility
 * - POST /api/auth/login, POST /api/auth/register (+ /login, /register)
 * - Json を受け、DTO validation → service 呼び出し
 * - login 失敗は AppError ではなく 401 envelope (Unauthorized) で返す
 */
use axum::{
    Json,
    extract::{OriginalUri, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    api::v1::dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        users::UserResponse,
    },
    error::AppError,
    middleware::auth::unauthorized::Unauthorized,
    services::{auth::AuthFailure, users::NewAccount},
    state::AppState,
};

pub async fn login(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, Response> {
    let Json(req) = payload.map_err(|e| AppError::bad_request(e.body_text()).into_response())?;

    match state.credentials.login(&req.username, &req.password).await {
        Ok(ok) => Ok(Json(LoginResponse {
            token: ok.token,
            username: ok.username,
            token_type: ok.scheme,
        })),
        Err(AuthFailure::InvalidCredentials) => {
            Err(Unauthorized::bad_credentials(uri.path()).into_response())
        }
        Err(AuthFailure::Internal) => Err(AppError::Internal.into_response()),
    }
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let Json(req) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    req.validate().map_err(AppError::bad_request)?;

    let email = req.normalized_email();
    let user = state
        .users
        .register(NewAccount {
            username: req.username.trim().to_string(),
            email,
            password: req.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}
