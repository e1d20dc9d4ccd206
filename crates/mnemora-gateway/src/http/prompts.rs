//! Admin CRUD (A2): per-user custom prompts, `/prompts`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use mnemora_users::UserCustomPrompt;
use serde::Deserialize;

use crate::app::AppState;
use crate::error::GatewayResult;
use crate::token::CurrentUser;

#[derive(Deserialize)]
pub struct UpsertRequest {
    pub system_instruction_id: String,
    pub content: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i64,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentUser { user_id }: CurrentUser,
) -> GatewayResult<Json<Vec<UserCustomPrompt>>> {
    Ok(Json(state.users.list_prompts_for_user(&user_id)?))
}

pub async fn upsert(
    State(state): State<Arc<AppState>>,
    CurrentUser { user_id }: CurrentUser,
    Json(req): Json<UpsertRequest>,
) -> GatewayResult<Json<UserCustomPrompt>> {
    let prompt = state.users.upsert_prompt(
        &user_id,
        &req.system_instruction_id,
        &req.content,
        req.is_active,
        req.sort_order,
    )?;
    Ok(Json(prompt))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    CurrentUser { user_id }: CurrentUser,
    Path(system_instruction_id): Path<String>,
) -> GatewayResult<()> {
    state.users.delete_prompt(&user_id, &system_instruction_id)?;
    Ok(())
}
