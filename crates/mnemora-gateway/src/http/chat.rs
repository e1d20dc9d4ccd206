//! `POST /chat` — the chat orchestrator's HTTP face (§4.6, §6).

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use mnemora_llm::{Message, Role, Usage};
use mnemora_core::AppError;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::{GatewayError, GatewayResult};
use crate::orchestrator::{self, ChatTurn};
use crate::token::CurrentUser;

#[derive(Debug, Deserialize)]
pub struct ChatMessageWire {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    pub messages: Vec<ChatMessageWire>,
    #[serde(default)]
    pub system_instruction: Option<String>,
    #[serde(default)]
    pub system_instruction_id: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Accepted for wire compatibility; streaming responses are not
    /// implemented and this flag is ignored.
    #[serde(default)]
    #[allow(dead_code)]
    pub stream: Option<bool>,
}

#[derive(Serialize)]
pub struct ChatResponseBody {
    pub message: String,
    pub usage: Usage,
}

fn parse_role(role: &str) -> Result<Role, GatewayError> {
    match role {
        "user" => Ok(Role::User),
        "assistant" => Ok(Role::Assistant),
        "system" => Ok(Role::System),
        other => Err(GatewayError(AppError::Validation(format!(
            "unknown message role: {other}"
        )))),
    }
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    CurrentUser { user_id }: CurrentUser,
    Json(body): Json<ChatRequestBody>,
) -> GatewayResult<Json<ChatResponseBody>> {
    if body.messages.is_empty() {
        return Err(GatewayError(AppError::Validation(
            "messages must not be empty".to_string(),
        )));
    }

    let mut messages = Vec::with_capacity(body.messages.len());
    for m in &body.messages {
        if m.content.trim().is_empty() {
            return Err(GatewayError(AppError::Validation(
                "message content must not be empty".to_string(),
            )));
        }
        messages.push(Message {
            role: parse_role(&m.role)?,
            content: m.content.clone(),
        });
    }

    let outcome = orchestrator::chat(
        state,
        ChatTurn {
            user_id,
            system_instruction_id: body.system_instruction_id,
            system_instruction: body.system_instruction,
            messages,
            temperature: body.temperature,
            max_tokens: body.max_tokens,
        },
    )
    .await?;

    Ok(Json(ChatResponseBody {
        message: outcome.message,
        usage: outcome.usage,
    }))
}
