//! The one concrete provider shipped with the core binary: an HTTP client
//! speaking the OpenAI chat-completions + embeddings wire format. No vendor
//! integration beyond the wire protocol is in scope here — additional
//! providers plug in behind [`LlmProvider`] without touching the cleaner,
//! the judge, or the chat orchestrator.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::provider::{ChatRequest, ChatResponse, LlmProvider, ProviderError, Role, Usage};

pub struct OpenAiCompatProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    embedding_model: String,
}

impl OpenAiCompatProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, embedding_model: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builds");
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            embedding_model: embedding_model.into(),
        }
    }
}

#[derive(Serialize)]
struct CompletionsBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionsResponse {
    choices: Vec<CompletionsChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct CompletionsChoice {
    message: WireChoiceMessage,
}

#[derive(Deserialize)]
struct WireChoiceMessage {
    content: String,
}

#[derive(Deserialize, Default)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Serialize)]
struct EmbeddingsBody<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingsDatum>,
}

#[derive(Deserialize)]
struct EmbeddingsDatum {
    embedding: Vec<f32>,
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    }
}

async fn read_error_body(resp: reqwest::Response) -> ProviderError {
    let status = resp.status().as_u16();
    let message = resp
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    ProviderError::Api { status, message }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai-compat"
    }

    async fn complete(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let mut messages = Vec::with_capacity(req.messages.len() + 2);
        if let Some(ref instruction) = req.system_instruction {
            messages.push(WireMessage {
                role: "system",
                content: instruction,
            });
        }
        if let Some(ref prompt) = req.prompt {
            messages.push(WireMessage {
                role: "system",
                content: prompt,
            });
        }
        for m in &req.messages {
            messages.push(WireMessage {
                role: role_str(m.role),
                content: &m.content,
            });
        }

        let body = CompletionsBody {
            model: &req.model,
            messages,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        };

        let resp = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(1000);
            return Err(ProviderError::RateLimited { retry_after_ms });
        }
        if !resp.status().is_success() {
            return Err(read_error_body(resp).await);
        }

        let parsed: CompletionsResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::Parse("empty choices array".to_string()))?;

        let usage = parsed
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(ChatResponse { content, usage })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let body = EmbeddingsBody {
            model: &self.embedding_model,
            input: text,
        };

        let resp = self
            .http
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited {
                retry_after_ms: 1000,
            });
        }
        if !resp.status().is_success() {
            return Err(read_error_body(resp).await);
        }

        let parsed: EmbeddingsResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ProviderError::Parse("empty embeddings data array".to_string()))
    }
}
