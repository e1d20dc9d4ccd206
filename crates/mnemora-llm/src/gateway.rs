//! The top-level LLM gateway: a thin façade over the [`ProviderRouter`] that
//! owns the prompt-assembly contract (`system_instruction` then `prompt`
//! prepended ahead of the caller's turns) and the process-wide embedding
//! fallback latch.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use crate::json::{self, ParseError};
use crate::provider::{ChatRequest, ChatResponse, LlmProvider, Message, ProviderError};
use crate::router::ProviderRouter;

pub struct Gateway {
    router: ProviderRouter,
    model: String,
    /// Latches `true` on the first embedding failure. Per-process, never
    /// reset: once the embeddings endpoint has failed, the gateway stops
    /// trying it and every caller falls back to lexical similarity.
    embedding_fallback: AtomicBool,
}

impl Gateway {
    pub fn new(router: ProviderRouter, model: impl Into<String>) -> Self {
        Self {
            router,
            model: model.into(),
            embedding_fallback: AtomicBool::new(false),
        }
    }

    /// Chat completion. `system_instruction` and `prompt` are synthesized as
    /// leading system-role turns, `system_instruction` first.
    pub async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
        system_instruction: Option<String>,
        prompt: Option<String>,
    ) -> Result<ChatResponse, ProviderError> {
        let req = ChatRequest {
            model: self.model.clone(),
            system_instruction,
            prompt,
            messages,
            temperature,
            max_tokens,
        };
        self.router.complete(&req).await
    }

    /// Embed `text`. Returns `None` once the embedding path has latched into
    /// permanent fallback (either from this call or a previous one) — the
    /// caller (the retriever, the cleaner) falls back to lexical similarity
    /// or a null embedding rather than treating this as a hard error.
    pub async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        if self.embedding_fallback.load(Ordering::Relaxed) {
            return None;
        }
        match self.router.embed(text).await {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(err = %e, "embedding call failed, latching permanent fallback for this process");
                self.embedding_fallback.store(true, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn embedding_in_fallback(&self) -> bool {
        self.embedding_fallback.load(Ordering::Relaxed)
    }

    /// Extract a single JSON object from a raw LLM reply. The sole place in
    /// the workspace permitted to do this (§4.1) — the cleaner and the
    /// emotion judge call through here rather than parsing text themselves.
    pub fn extract_json(&self, raw: &str) -> Result<serde_json::Value, ParseError> {
        json::extract_json_object(raw)
    }
}
