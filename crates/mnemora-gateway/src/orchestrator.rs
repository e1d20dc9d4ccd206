//! Chat orchestrator (C6): the per-turn operation that composes the
//! effective prompt and dispatches to the LLM gateway, per §4.6.

use std::sync::Arc;

use mnemora_core::AppError;
use mnemora_emotion::EmotionEngine;
use mnemora_llm::{Message, Role, Usage};
use mnemora_memory::{retrieve, ConversationMemory, RetrievalConfig, ScoredMemory};
use mnemora_users::{SystemInstruction, UserCustomPrompt};
use tracing::warn;

use crate::app::AppState;

pub struct ChatTurn {
    pub user_id: String,
    pub system_instruction_id: Option<String>,
    pub system_instruction: Option<String>,
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

pub struct ChatOutcome {
    pub message: String,
    pub usage: Usage,
}

/// Runs steps 1-10 of §4.6. The chat response is returned only after the
/// LLM call completes; the cleaning/GC/emotion work spawned in step 8 is
/// detached and never awaited here.
pub async fn chat(state: Arc<AppState>, turn: ChatTurn) -> Result<ChatOutcome, AppError> {
    let batch_size = state.config.memory.batch_size.max(1);
    let total_messages = turn.messages.len();
    let should_clean = total_messages >= batch_size;

    let sid = resolve_system_instruction_id(&state, turn.system_instruction_id.as_deref())?;
    let system_instruction_text = resolve_system_instruction_text(
        &state,
        turn.system_instruction.as_deref(),
        &sid,
    )?;

    let recent = state.memory.recent(&turn.user_id, &sid, 3)?;

    let last_user_message = turn
        .messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.clone())
        .unwrap_or_default();

    let query_embedding = state.gateway.embed(&last_user_message).await;
    let retrieved = retrieve(
        &state.memory,
        &turn.user_id,
        &sid,
        &last_user_message,
        query_embedding.as_deref(),
        chrono::Utc::now(),
        RetrievalConfig::default(),
    )?;

    let custom_prompt = state.users.get_prompt(&turn.user_id, &sid)?;
    let secondary_prompt = compose_secondary_prompt(custom_prompt.as_ref(), &recent, &retrieved);

    spawn_background_work(
        state.clone(),
        turn.user_id.clone(),
        sid.clone(),
        turn.messages.clone(),
        should_clean,
        batch_size,
    );

    let temperature = turn.temperature.unwrap_or(state.config.llm.temperature);
    let max_tokens = turn.max_tokens.unwrap_or(state.config.llm.max_tokens);

    let response = state
        .gateway
        .complete(
            turn.messages,
            temperature,
            max_tokens,
            Some(system_instruction_text),
            Some(secondary_prompt),
        )
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let accessed_ids: Vec<String> = retrieved.into_iter().map(|r| r.memory.id).collect();
    if let Err(e) = state.memory.bump_access(&accessed_ids) {
        warn!(err = %e, "bump_access failed after chat turn");
    }

    Ok(ChatOutcome {
        message: response.content,
        usage: response.usage,
    })
}

/// Explicit id > the unique active default > the first instruction by
/// `sort_order` > a hardcoded bootstrap persona when the store has none yet.
fn resolve_system_instruction_id(
    state: &AppState,
    explicit_id: Option<&str>,
) -> Result<String, AppError> {
    if let Some(id) = explicit_id {
        return match state.users.get_system_instruction(id)? {
            Some(found) => Ok(found.id),
            None => Err(AppError::NotFound(format!("system instruction {id}"))),
        };
    }
    if let Some(default) = state.users.get_default_system_instruction()? {
        return Ok(default.id);
    }
    if let Some(first) = state.users.list_system_instructions()?.into_iter().next() {
        return Ok(first.id);
    }
    Ok("default".to_string())
}

fn resolve_system_instruction_text(
    state: &AppState,
    explicit_text: Option<&str>,
    sid: &str,
) -> Result<String, AppError> {
    if let Some(text) = explicit_text {
        return Ok(text.to_string());
    }
    if let Some(instruction) = state.users.get_system_instruction(sid)? {
        return Ok(instruction.content);
    }
    Ok("You are a helpful, friendly assistant.".to_string())
}

fn compose_secondary_prompt(
    custom_prompt: Option<&UserCustomPrompt>,
    recent: &[ConversationMemory],
    retrieved: &[ScoredMemory],
) -> String {
    let mut sections = Vec::new();

    if let Some(prompt) = custom_prompt {
        if prompt.is_active {
            sections.push(prompt.content.clone());
        }
    }

    if !recent.is_empty() {
        let mut block = String::from("Recent memories:\n");
        for memory in recent {
            block.push_str(&format!(
                "- {} · {}{}\n",
                memory.created_at_timestamp.to_rfc3339(),
                memory.summary,
                entity_suffix(memory).map(|s| format!(" · {s}")).unwrap_or_default(),
            ));
        }
        sections.push(block.trim_end().to_string());
    }

    if !retrieved.is_empty() {
        let mut block = String::from("Relevant memories:\n");
        for scored in retrieved {
            block.push_str(&format!("- {}\n", scored.memory.summary));
            for point in &scored.memory.key_points {
                block.push_str(&format!("  - {point}\n"));
            }
        }
        sections.push(block.trim_end().to_string());
    }

    sections.join("\n\n")
}

fn entity_suffix(memory: &ConversationMemory) -> Option<String> {
    let mut parts = Vec::new();
    if !memory.entities.people.is_empty() {
        parts.push(format!("people: {}", memory.entities.people.join(", ")));
    }
    if !memory.entities.locations.is_empty() {
        parts.push(format!("locations: {}", memory.entities.locations.join(", ")));
    }
    if !memory.entities.events.is_empty() {
        parts.push(format!("events: {}", memory.entities.events.join(", ")));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

/// Step 8: a detached task sharing the process-wide stores, not the
/// request's lifecycle. Its failures are logged and never surfaced to the
/// caller — the chat response above has already been (or is about to be)
/// returned regardless of what happens here.
fn spawn_background_work(
    state: Arc<AppState>,
    user_id: String,
    sid: String,
    messages: Vec<Message>,
    should_clean: bool,
    batch_size: usize,
) {
    tokio::spawn(async move {
        if should_clean {
            match mnemora_cleaner::clean_batch(
                &state.gateway,
                &state.memory,
                &user_id,
                &sid,
                &messages,
                batch_size,
            )
            .await
            {
                Ok(Some(_)) => {}
                Ok(None) => {}
                Err(e) => warn!(err = %e, user_id, "detached cleaning task failed"),
            }
        }

        if let Err(e) = state
            .emotion
            .process_conversation(&state.gateway, &user_id, &sid, &messages)
            .await
        {
            warn!(err = %e, user_id, "detached emotion update failed");
        }

        let rolling_months = state.config.memory.rolling_cleanup_months;
        if let Err(e) = state.memory.cutoff_delete(&user_id, Some(&sid), rolling_months) {
            warn!(err = %e, user_id, "rolling soft-delete failed");
        }
    });
}
