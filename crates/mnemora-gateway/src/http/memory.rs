//! `/memory/*` — list, soft-delete, bulk cutoff, and the emotion diagnostic
//! endpoint (§4.9, §6).

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use mnemora_core::AppError;
use mnemora_emotion::CharacterEmotionState;
use mnemora_memory::ConversationMemory;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::{GatewayError, GatewayResult};
use crate::token::CurrentUser;

#[derive(Deserialize)]
pub struct ScopeQuery {
    system_instruction_id: Option<String>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    CurrentUser { user_id }: CurrentUser,
    Query(q): Query<ScopeQuery>,
) -> GatewayResult<Json<Vec<ConversationMemory>>> {
    let memories = state
        .memory
        .list(&user_id, q.system_instruction_id.as_deref(), false)?;
    Ok(Json(memories))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    CurrentUser { user_id }: CurrentUser,
    Path(id): Path<String>,
) -> GatewayResult<()> {
    state
        .memory
        .get(&id, &user_id)?
        .ok_or_else(|| GatewayError(AppError::NotFound(format!("memory {id}"))))?;
    state.memory.soft_delete(&id, &user_id)?;
    Ok(())
}

#[derive(Deserialize)]
pub struct ClearOldQuery {
    system_instruction_id: Option<String>,
    months: i64,
}

#[derive(Serialize)]
pub struct ClearOldResponse {
    deleted: usize,
}

pub async fn clear_old(
    State(state): State<Arc<AppState>>,
    CurrentUser { user_id }: CurrentUser,
    Query(q): Query<ClearOldQuery>,
) -> GatewayResult<Json<ClearOldResponse>> {
    if !(1..=12).contains(&q.months) {
        return Err(GatewayError(AppError::Validation(
            "months must be between 1 and 12".to_string(),
        )));
    }
    let deleted = state
        .memory
        .cutoff_delete(&user_id, q.system_instruction_id.as_deref(), q.months)?;
    Ok(Json(ClearOldResponse { deleted }))
}

#[derive(Deserialize)]
pub struct EmotionQuery {
    system_instruction_id: String,
}

pub async fn emotion(
    State(state): State<Arc<AppState>>,
    CurrentUser { user_id }: CurrentUser,
    Query(q): Query<EmotionQuery>,
) -> GatewayResult<Json<CharacterEmotionState>> {
    let state_snapshot = state.emotion.get_state(&user_id, &q.system_instruction_id)?;
    Ok(Json(state_snapshot))
}
