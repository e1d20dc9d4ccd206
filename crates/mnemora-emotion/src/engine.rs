use std::sync::Mutex;

use chrono::Utc;
use mnemora_llm::{Gateway, Message};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use crate::error::Result;
use crate::math;
use crate::types::{CharacterEmotionState, EmotionSnapshot, LabeledVa};

/// C3: VA arithmetic + the LLM-backed judge, persisting state per
/// (user, character). A judge failure never prevents the chat turn that
/// triggered it from completing — callers see a snapshot either way.
pub struct EmotionEngine {
    conn: Mutex<Connection>,
}

impl EmotionEngine {
    pub fn new(conn: Connection) -> Result<Self> {
        crate::db::init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Read-only accessor: returns the current state, creating `(0, 0)` on
    /// first read without requiring `process_conversation` first. Backs the
    /// `GET /memory/emotion` diagnostic endpoint.
    pub fn get_state(&self, user_id: &str, char_id: &str) -> Result<CharacterEmotionState> {
        let conn = self.conn.lock().unwrap();
        load_or_create(&conn, user_id, char_id)
    }

    /// Load or create state, call the judge, apply the math, persist, and
    /// return a snapshot with labeled previous/current points.
    pub async fn process_conversation(
        &self,
        gateway: &Gateway,
        user_id: &str,
        char_id: &str,
        messages: &[Message],
    ) -> Result<EmotionSnapshot> {
        let previous = {
            let conn = self.conn.lock().unwrap();
            load_or_create(&conn, user_id, char_id)?
        };

        let (delta_valence, delta_arousal, reasoning) =
            judge_or_default(gateway, messages, previous.valence, previous.arousal).await;

        let (new_valence, new_arousal) =
            math::update(previous.valence, previous.arousal, delta_valence, delta_arousal);

        {
            let conn = self.conn.lock().unwrap();
            persist(&conn, user_id, char_id, new_valence, new_arousal)?;
        }

        Ok(EmotionSnapshot {
            previous: LabeledVa::new(previous.valence, previous.arousal),
            delta_valence,
            delta_arousal,
            reasoning,
            current: LabeledVa::new(new_valence, new_arousal),
        })
    }
}

async fn judge_or_default(
    gateway: &Gateway,
    messages: &[Message],
    valence: f64,
    arousal: f64,
) -> (f64, f64, String) {
    if messages.is_empty() {
        warn!("process_conversation called with no messages; using zero delta");
        return (0.0, 0.0, "analysis failed".to_string());
    }
    crate::judge::analyze(gateway, messages, valence, arousal).await
}

fn load_or_create(conn: &Connection, user_id: &str, char_id: &str) -> Result<CharacterEmotionState> {
    let existing = conn
        .query_row(
            "SELECT valence, arousal, updated_at FROM character_emotion_states
             WHERE user_id = ?1 AND char_id = ?2",
            params![user_id, char_id],
            |row| {
                Ok(CharacterEmotionState {
                    user_id: user_id.to_string(),
                    char_id: char_id.to_string(),
                    valence: row.get(0)?,
                    arousal: row.get(1)?,
                    updated_at: row.get(2)?,
                })
            },
        )
        .optional()?;

    if let Some(state) = existing {
        return Ok(state);
    }

    let state = CharacterEmotionState::initial(user_id, char_id);
    conn.execute(
        "INSERT INTO character_emotion_states (user_id, char_id, valence, arousal, updated_at)
         VALUES (?1, ?2, 0, 0, ?3)",
        params![user_id, char_id, state.updated_at],
    )?;
    Ok(state)
}

fn persist(conn: &Connection, user_id: &str, char_id: &str, valence: f64, arousal: f64) -> Result<()> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO character_emotion_states (user_id, char_id, valence, arousal, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(user_id, char_id) DO UPDATE SET
            valence = excluded.valence, arousal = excluded.arousal, updated_at = excluded.updated_at",
        params![user_id, char_id, valence, arousal, now],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_state_creates_zero_state_on_first_read() {
        let engine = EmotionEngine::new(Connection::open_in_memory().unwrap()).unwrap();
        let state = engine.get_state("u1", "c1").unwrap();
        assert_eq!(state.valence, 0.0);
        assert_eq!(state.arousal, 0.0);
    }

    #[tokio::test]
    async fn process_conversation_with_no_messages_leaves_state_unchanged() {
        let engine = EmotionEngine::new(Connection::open_in_memory().unwrap()).unwrap();
        let gateway = mnemora_llm::Gateway::new(
            mnemora_llm::ProviderRouter::new(vec![mnemora_llm::ProviderSlot::new(
                Box::new(NeverCalled),
                0,
            )]),
            "test-model",
        );
        let snapshot = engine
            .process_conversation(&gateway, "u1", "c1", &[])
            .await
            .unwrap();
        assert_eq!(snapshot.current.valence, 0.0);
        assert_eq!(snapshot.reasoning, "analysis failed");
    }

    struct NeverCalled;

    #[async_trait::async_trait]
    impl mnemora_llm::LlmProvider for NeverCalled {
        fn name(&self) -> &str {
            "never-called"
        }
        async fn complete(
            &self,
            _req: &mnemora_llm::ChatRequest,
        ) -> std::result::Result<mnemora_llm::ChatResponse, mnemora_llm::ProviderError> {
            panic!("should not be called when there are no messages")
        }
        async fn embed(&self, _text: &str) -> std::result::Result<Vec<f32>, mnemora_llm::ProviderError> {
            panic!("not used in this test")
        }
    }
}
