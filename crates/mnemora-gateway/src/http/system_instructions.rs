//! Admin CRUD (A2): `/system-instructions`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use mnemora_core::AppError;
use mnemora_users::SystemInstruction;
use serde::Deserialize;

use crate::app::AppState;
use crate::error::{GatewayError, GatewayResult};
use crate::token::CurrentUser;

#[derive(Deserialize)]
pub struct CreateRequest {
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub sort_order: i64,
}

#[derive(Deserialize)]
pub struct UpdateRequest {
    pub name: String,
    pub content: String,
    pub is_active: bool,
    pub is_default: bool,
    pub sort_order: i64,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
) -> GatewayResult<Json<Vec<SystemInstruction>>> {
    Ok(Json(state.users.list_system_instructions()?))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Json(req): Json<CreateRequest>,
) -> GatewayResult<Json<SystemInstruction>> {
    let instruction = state.users.create_system_instruction(
        &req.name,
        &req.content,
        req.is_active,
        req.is_default,
        req.sort_order,
    )?;
    Ok(Json(instruction))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateRequest>,
) -> GatewayResult<Json<SystemInstruction>> {
    let instruction = SystemInstruction {
        id,
        name: req.name,
        content: req.content,
        is_active: req.is_active,
        is_default: req.is_default,
        sort_order: req.sort_order,
    };
    state.users.update_system_instruction(&instruction)?;
    Ok(Json(instruction))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> GatewayResult<()> {
    state
        .users
        .get_system_instruction(&id)?
        .ok_or_else(|| GatewayError(AppError::NotFound(format!("system instruction {id}"))))?;
    state.users.delete_system_instruction(&id)?;
    Ok(())
}
