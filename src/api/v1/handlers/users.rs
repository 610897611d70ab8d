/*
 * Responsibility
 * - protected な users 系 handler (GET /, GET /api/v1/me)
 * - identity は Authenticated extractor で明示的に受け取る
 */
use axum::{Json, extract::State};

use crate::{
    api::v1::{dto::users::MeResponse, extractors::Authenticated},
    error::AppError,
    state::AppState,
};

pub async fn list_usernames(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> Result<Json<Vec<String>>, AppError> {
    tracing::debug!(username = %principal.username, "listing usernames");
    let names = state.users.list_usernames().await?;
    Ok(Json(names))
}

pub async fn me(Authenticated(principal): Authenticated) -> Json<MeResponse> {
    Json(MeResponse::from(principal))
}
