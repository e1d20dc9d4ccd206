use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single message in a chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Request to a chat-completion provider.
///
/// `system_instruction` and `prompt`, when present, are prepended as
/// synthesized system-role turns ahead of `messages` — `system_instruction`
/// first, then `prompt`.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    pub prompt: Option<String>,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Token accounting returned alongside a completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Response from a chat-completion provider.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub usage: Usage,
}

/// Common interface for chat-completion + embedding providers.
///
/// Additional concrete providers can be added behind this trait without
/// touching the cleaner, the emotion judge, or the chat orchestrator — they
/// all depend only on `LlmProvider`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging and error messages.
    fn name(&self) -> &str;

    async fn complete(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError>;

    /// Embed a piece of text into a dense vector. Providers without an
    /// embeddings endpoint return `ProviderError::Unavailable`; callers fall
    /// back to lexical similarity when this happens (see the retriever).
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}
