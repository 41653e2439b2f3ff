//! 登录/登出处理器

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use shelf_errors::{AppError, AppResult};

use crate::api::http::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub username: String,
    pub role: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Response> {
    let principal = state
        .sessions
        .login(&request.username, &request.password)
        .await?;

    let cookie = state
        .guard
        .resolver()
        .issue_cookie(principal.identity())
        .map_err(|e| AppError::internal(format!("Failed to build session cookie: {}", e)))?;

    let body = SessionView {
        username: principal.identity().to_string(),
        role: principal.role().to_string(),
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

pub async fn logout(State(state): State<AppState>) -> AppResult<Response> {
    let cookie = state
        .guard
        .resolver()
        .clear_cookie()
        .map_err(|e| AppError::internal(format!("Failed to build session cookie: {}", e)))?;

    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]).into_response())
}
