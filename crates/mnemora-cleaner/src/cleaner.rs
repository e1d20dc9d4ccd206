//! C4: the top-level conversation cleaner pipeline, run as a detached
//! background task after every `batch_size`-message round of a chat.

use chrono::Utc;
use mnemora_llm::{Gateway, Message};
use mnemora_memory::{ConversationMemory, MemoryStore};
use tracing::{info, warn};

use crate::{category, classify, emotion_score, format};
use crate::error::Result;

/// Runs the full format -> classify -> (abort if not worth remembering) ->
/// categorize -> score -> embed -> persist pipeline for one batch.
///
/// Returns `Ok(None)` when the classifier decided nothing was worth
/// remembering, or when the classifier call itself failed to produce
/// parseable JSON after its single attempt — a malformed classify reply
/// aborts the batch rather than persisting a guessed-at memory.
pub async fn clean_batch(
    gateway: &Gateway,
    store: &MemoryStore,
    user_id: &str,
    system_instruction_id: &str,
    messages: &[Message],
    batch_size: usize,
) -> Result<Option<ConversationMemory>> {
    let transcript = format::format_transcript(messages);
    let now = Utc::now();

    let classified = match classify::classify(gateway, &transcript, now).await {
        Ok(c) => c,
        Err(e) => {
            warn!(err = %e, user_id, "cleaner classify step failed, dropping batch");
            return Ok(None);
        }
    };

    if !classified.should_remember {
        info!(user_id, "cleaner classified batch as not worth remembering");
        return Ok(None);
    }

    let memory_category = category::classify_category(&classified.summary, &classified.entities);
    let emotional_weight = emotion_score::score(gateway, &transcript).await;
    let embedding = gateway.embed(&classified.summary).await;

    let conversation_round = (messages.len() / batch_size) * batch_size;

    let memory = ConversationMemory {
        id: uuid::Uuid::now_v7().to_string(),
        user_id: user_id.to_string(),
        system_instruction_id: system_instruction_id.to_string(),
        summary: classified.summary,
        key_points: classified.key_points,
        original_content: None,
        entities: classified.entities,
        embedding,
        memory_type: classified.memory_type,
        memory_category,
        importance_score: classified.importance_score,
        semantic_importance: ConversationMemory::derive_semantic_importance(classified.importance_score),
        emotional_weight,
        created_at_timestamp: now,
        last_accessed: now,
        access_count: 1,
        is_deleted: false,
        deleted_at: None,
        conversation_round: conversation_round as i64,
    };

    store.insert(&memory)?;
    info!(
        user_id,
        category = %memory.memory_category,
        importance = memory.importance_score,
        "cleaner persisted new memory"
    );
    Ok(Some(memory))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemora_llm::{ChatRequest, ChatResponse, LlmProvider, ProviderError, ProviderRouter, ProviderSlot, Role, Usage};
    use rusqlite::Connection;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedProvider {
        call_count: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, _req: &ChatRequest) -> std::result::Result<ChatResponse, ProviderError> {
            let n = self.call_count.fetch_add(1, Ordering::SeqCst);
            let content = if n == 0 {
                r#"{"summary": "User met Alice at the park", "key_points": ["met Alice"],
                    "importance_score": 7, "should_remember": true, "memory_type": "passive",
                    "reason": "social event", "entities": {"dates": [], "locations": ["the park"],
                    "people": ["Alice"], "events": ["met Alice"]}}"#
                    .to_string()
            } else {
                r#"{"score": 6}"#.to_string()
            };
            Ok(ChatResponse {
                content,
                usage: Usage::default(),
            })
        }

        async fn embed(&self, _text: &str) -> std::result::Result<Vec<f32>, ProviderError> {
            Err(ProviderError::Unavailable("no embeddings endpoint".to_string()))
        }
    }

    fn test_gateway() -> Gateway {
        Gateway::new(
            ProviderRouter::new(vec![ProviderSlot::new(
                Box::new(ScriptedProvider {
                    call_count: AtomicUsize::new(0),
                }),
                0,
            )]),
            "test-model",
        )
    }

    #[tokio::test]
    async fn clean_batch_persists_a_memory_when_worth_remembering() {
        let gateway = test_gateway();
        let store = MemoryStore::new(Connection::open_in_memory().unwrap()).unwrap();
        let messages = vec![Message {
            role: Role::User,
            content: "I met Alice at the park today".to_string(),
        }];

        let memory = clean_batch(&gateway, &store, "u1", "s1", &messages, 1)
            .await
            .unwrap()
            .expect("should have persisted a memory");

        assert_eq!(memory.summary, "User met Alice at the park");
        assert_eq!(memory.importance_score, 7);
        assert!(memory.embedding.is_none());
        assert_eq!(store.list("u1", None, false).unwrap().len(), 1);
    }

    struct NotRememberProvider;

    #[async_trait::async_trait]
    impl LlmProvider for NotRememberProvider {
        fn name(&self) -> &str {
            "not-remember"
        }
        async fn complete(&self, _req: &ChatRequest) -> std::result::Result<ChatResponse, ProviderError> {
            Ok(ChatResponse {
                content: r#"{"summary": "small talk", "key_points": [], "importance_score": 1,
                    "should_remember": false, "memory_type": "passive", "reason": "chit-chat",
                    "entities": {"dates": [], "locations": [], "people": [], "events": []}}"#
                    .to_string(),
                usage: Usage::default(),
            })
        }
        async fn embed(&self, _text: &str) -> std::result::Result<Vec<f32>, ProviderError> {
            panic!("should not reach embedding for a dropped batch")
        }
    }

    #[tokio::test]
    async fn clean_batch_drops_batches_the_classifier_says_are_not_worth_remembering() {
        let gateway = Gateway::new(
            ProviderRouter::new(vec![ProviderSlot::new(Box::new(NotRememberProvider), 0)]),
            "test-model",
        );
        let store = MemoryStore::new(Connection::open_in_memory().unwrap()).unwrap();
        let messages = vec![Message {
            role: Role::User,
            content: "lol nice".to_string(),
        }];

        let result = clean_batch(&gateway, &store, "u1", "s1", &messages, 1)
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(store.list("u1", None, false).unwrap().is_empty());
    }
}
