//! Step 2 of the cleaner pipeline: a single LLM call that decides whether a
//! batch of dialogue is worth remembering and, if so, distills it.

use mnemora_llm::{Gateway, Message, Role};
use mnemora_memory::{Entities, MemoryType};

use crate::error::{CleanerError, Result};

const SYSTEM_PROMPT: &str = "You distill a stretch of conversation into a structured memory \
record for a companion AI. Decide whether anything here is worth remembering long-term. \
Extract entities, resolving relative dates (\"today\", \"next Friday\") to absolute ISO-8601 \
dates using the batch's timestamp as \"now\". Return strict JSON with exactly these fields: \
{\"summary\": string, \"key_points\": [string], \"importance_score\": integer 1-10, \
\"should_remember\": boolean, \"memory_type\": \"active\" | \"passive\", \"reason\": string, \
\"entities\": {\"dates\": [string], \"locations\": [string], \"people\": [string], \"events\": \
[string]}}. \"active\" means the user explicitly asked to be remembered; \"passive\" means you \
inferred it matters. Set should_remember to false for small talk, chit-chat, or anything with \
no lasting relevance.";

pub struct ClassifyResult {
    pub summary: String,
    pub key_points: Vec<String>,
    pub importance_score: i32,
    pub should_remember: bool,
    pub memory_type: MemoryType,
    pub entities: Entities,
}

pub async fn classify(gateway: &Gateway, transcript: &str, now: chrono::DateTime<chrono::Utc>) -> Result<ClassifyResult> {
    let user_turn = format!(
        "Current timestamp (UTC): {}\n\nConversation:\n{transcript}",
        now.to_rfc3339()
    );

    let resp = gateway
        .complete(
            vec![Message {
                role: Role::User,
                content: user_turn,
            }],
            0.2,
            800,
            Some(SYSTEM_PROMPT.to_string()),
            None,
        )
        .await
        .map_err(CleanerError::Upstream)?;

    let json = gateway.extract_json(&resp.content)?;

    let summary = json
        .get("summary")
        .and_then(|v| v.as_str())
        .ok_or_else(|| CleanerError::Malformed("missing summary".to_string()))?
        .to_string();

    let key_points = json
        .get("key_points")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let importance_score = json
        .get("importance_score")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| CleanerError::Malformed("missing importance_score".to_string()))?
        .clamp(1, 10) as i32;

    let should_remember = json
        .get("should_remember")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| CleanerError::Malformed("missing should_remember".to_string()))?;

    let memory_type = json
        .get("memory_type")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok())
        .unwrap_or(MemoryType::Passive);

    let entities: Entities = json
        .get("entities")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|_| CleanerError::Malformed("malformed entities".to_string()))?
        .unwrap_or_default();

    Ok(ClassifyResult {
        summary,
        key_points,
        importance_score,
        should_remember,
        memory_type,
        entities,
    })
}
