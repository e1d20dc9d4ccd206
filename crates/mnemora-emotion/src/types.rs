use serde::{Deserialize, Serialize};

/// Persisted VA state for one (user, character). `char_id` is the scoping
/// `system_instruction_id` — each system instruction is a distinct
/// "character" the assistant can play.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterEmotionState {
    pub user_id: String,
    pub char_id: String,
    pub valence: f64,
    pub arousal: f64,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl CharacterEmotionState {
    pub fn initial(user_id: impl Into<String>, char_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            char_id: char_id.into(),
            valence: 0.0,
            arousal: 0.0,
            updated_at: chrono::Utc::now(),
        }
    }
}

/// One labeled VA point, used in [`EmotionSnapshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledVa {
    pub valence: f64,
    pub arousal: f64,
    pub label: String,
}

impl LabeledVa {
    pub fn new(valence: f64, arousal: f64) -> Self {
        let label = crate::math::label(valence, arousal).to_string();
        Self {
            valence,
            arousal,
            label,
        }
    }
}

/// Result of a single `process_conversation` call: before/after state and
/// the delta the judge produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionSnapshot {
    pub previous: LabeledVa,
    pub delta_valence: f64,
    pub delta_arousal: f64,
    pub reasoning: String,
    pub current: LabeledVa,
}
