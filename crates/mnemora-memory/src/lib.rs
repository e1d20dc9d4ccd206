//! `mnemora-memory` — the memory store (C2) and the hybrid retriever +
//! reranker (C5): the `ConversationMemory` data model, its SQLite-backed
//! CRUD/query surface, and the scoring pipeline that turns a query into a
//! ranked top-K of relevant memories.

pub mod db;
pub mod error;
pub mod retriever;
pub mod similarity;
pub mod store;
pub mod types;

pub use error::{MemoryError, Result};
pub use retriever::{retrieve, RetrievalConfig, ScoredMemory};
pub use store::MemoryStore;
pub use types::{ConversationMemory, Entities, MemoryCategory, MemoryType};
