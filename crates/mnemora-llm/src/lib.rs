//! `mnemora-llm` — the LLM gateway (C1): a pluggable-provider abstraction
//! for chat completion and text embedding, plus the one place permitted to
//! extract a JSON object out of a raw model reply.
//!
//! One concrete provider ships with the core binary: [`openai_compat`], an
//! HTTP client speaking the OpenAI chat-completions + embeddings wire
//! format. Additional providers implement [`provider::LlmProvider`] and slot
//! into a [`router::ProviderRouter`] without the cleaner, the judge, or the
//! chat orchestrator noticing.

pub mod gateway;
pub mod json;
pub mod openai_compat;
pub mod provider;
pub mod router;

pub use gateway::Gateway;
pub use json::ParseError;
pub use openai_compat::OpenAiCompatProvider;
pub use provider::{ChatRequest, ChatResponse, LlmProvider, Message, ProviderError, Role, Usage};
pub use router::{ProviderRouter, ProviderSlot};
