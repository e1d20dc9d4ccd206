//! Step 4 of the cleaner pipeline: a second, independent LLM call rating how
//! emotionally significant a batch of dialogue was, distinct from the
//! per-character Valence/Arousal mood tracked by `mnemora-emotion`.

use mnemora_llm::{Gateway, Message, Role};
use tracing::warn;

const MAX_ATTEMPTS: u32 = 3;
const DEFAULT_WEIGHT: f64 = 0.5;

const SYSTEM_PROMPT: &str = "Rate how emotionally significant this conversation was for the \
user on a scale of 1 to 10, where 1 is utterly mundane (scheduling, small talk) and 10 is a \
major emotional event (a loss, a breakup, a long-awaited success). Return strict JSON: \
{\"score\": integer 1-10}.";

/// Retried up to 3 times; on repeated parse failure defaults to the neutral
/// midpoint rather than skipping persistence of the memory.
pub async fn score(gateway: &Gateway, transcript: &str) -> f64 {
    for attempt in 1..=MAX_ATTEMPTS {
        match try_once(gateway, transcript).await {
            Ok(weight) => return weight,
            Err(e) => warn!(attempt, err = %e, "emotion score attempt failed"),
        }
    }
    DEFAULT_WEIGHT
}

async fn try_once(gateway: &Gateway, transcript: &str) -> Result<f64, String> {
    let resp = gateway
        .complete(
            vec![Message {
                role: Role::User,
                content: transcript.to_string(),
            }],
            0.2,
            100,
            Some(SYSTEM_PROMPT.to_string()),
            None,
        )
        .await
        .map_err(|e| e.to_string())?;

    let json = gateway.extract_json(&resp.content).map_err(|e| e.to_string())?;
    let score = json
        .get("score")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| "missing score".to_string())?;

    Ok(normalize(score))
}

/// `score` is on a 1-10 scale; normalized into `[0.1, 1.0]`.
fn normalize(score: i64) -> f64 {
    (score as f64 / 10.0).clamp(0.1, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_clamps_into_range() {
        assert_eq!(normalize(0), 0.1);
        assert_eq!(normalize(1), 0.1);
        assert_eq!(normalize(10), 1.0);
        assert_eq!(normalize(5), 0.5);
    }
}
