//! LLM-backed emotion delta analyzer: given recent messages and the current
//! VA state, asks the model for `{delta_valence, delta_arousal, reasoning}`.

use mnemora_llm::{Gateway, Message};
use tracing::warn;

use crate::error::JudgeError;

const MAX_ATTEMPTS: u32 = 3;
const MAX_MESSAGES: usize = 6;

const SYSTEM_PROMPT: &str = "You analyze the emotional impact of a conversation on a \
character's mood, expressed as a Valence/Arousal delta. Valence ranges from -1 (very \
negative) to 1 (very positive). Arousal ranges from -1 (very calm) to 1 (very excited). \
Return strict JSON: {\"delta_valence\": number, \"delta_arousal\": number, \"reasoning\": \
string}. Keep |delta| <= 0.3 for ordinary content, up to 0.5 only for extreme content.";

/// Retried up to 3 times; on total failure returns `(0, 0, \"analysis failed\")` so a
/// judge outage never blocks the chat turn that triggered it.
pub async fn analyze(
    gateway: &Gateway,
    messages: &[Message],
    valence: f64,
    arousal: f64,
) -> (f64, f64, String) {
    let recent: Vec<Message> = messages
        .iter()
        .rev()
        .take(MAX_MESSAGES)
        .rev()
        .cloned()
        .collect();

    for attempt in 1..=MAX_ATTEMPTS {
        match try_once(gateway, &recent, valence, arousal).await {
            Ok(result) => return result,
            Err(e) => warn!(attempt, err = %e, "emotion judge attempt failed"),
        }
    }

    (0.0, 0.0, "analysis failed".to_string())
}

async fn try_once(
    gateway: &Gateway,
    recent: &[Message],
    valence: f64,
    arousal: f64,
) -> Result<(f64, f64, String), JudgeError> {
    let context = format!(
        "Current mood: valence={valence:.2}, arousal={arousal:.2}.\n\nRecent messages:\n{}",
        recent
            .iter()
            .map(|m| format!("{:?}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    );

    let resp = gateway
        .complete(
            vec![Message {
                role: mnemora_llm::Role::User,
                content: context,
            }],
            0.3,
            300,
            Some(SYSTEM_PROMPT.to_string()),
            None,
        )
        .await?;

    let json = gateway.extract_json(&resp.content)?;

    let delta_valence = json
        .get("delta_valence")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| JudgeError::Malformed("missing delta_valence".to_string()))?;
    let delta_arousal = json
        .get("delta_arousal")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| JudgeError::Malformed("missing delta_arousal".to_string()))?;
    let reasoning = json
        .get("reasoning")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();

    Ok((delta_valence.clamp(-0.5, 0.5), delta_arousal.clamp(-0.5, 0.5), reasoning))
}
