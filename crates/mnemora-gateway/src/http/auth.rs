//! Auth & users (A1): `POST /auth/register`, `POST /auth/login`, `GET /auth/me`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use mnemora_core::AppError;
use mnemora_users::auth::{issue_token, verify_password};
use mnemora_users::User;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::AppState;
use crate::error::{GatewayError, GatewayResult};
use crate::token::CurrentUser;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            is_active: u.is_active,
            created_at: u.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> GatewayResult<Json<UserResponse>> {
    let user = state.users.register(&req.username, &req.email, &req.password)?;
    info!(username = %user.username, "user registered");
    Ok(Json(user.into()))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> GatewayResult<Json<LoginResponse>> {
    let user = state
        .users
        .find_by_username(&req.username)?
        .ok_or_else(|| GatewayError(AppError::Auth("invalid username or password".to_string())))?;

    if !verify_password(&req.password, &user.password_hash).map_err(AppError::from)? {
        return Err(GatewayError(AppError::Auth(
            "invalid username or password".to_string(),
        )));
    }
    if !user.is_active {
        return Err(GatewayError(AppError::Disabled(
            "account is disabled".to_string(),
        )));
    }

    let client_ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_string());
    state.users.record_login(&user.id, client_ip.as_deref())?;

    let token = issue_token(&user.id, &state.config.auth.jwt_secret, state.config.auth.jwt_ttl_days)
        .map_err(AppError::from)?;

    info!(username = %user.username, "user logged in");
    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    CurrentUser { user_id }: CurrentUser,
) -> GatewayResult<Json<UserResponse>> {
    let user = state
        .users
        .get_user(&user_id)?
        .ok_or_else(|| GatewayError(AppError::NotFound(format!("user {user_id}"))))?;
    Ok(Json(user.into()))
}
