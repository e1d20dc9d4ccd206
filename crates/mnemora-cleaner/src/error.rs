use mnemora_llm::{ParseError, ProviderError};

#[derive(Debug, thiserror::Error)]
pub enum CleanerError {
    #[error("classifier call failed: {0}")]
    Upstream(#[from] ProviderError),

    #[error("classifier reply was not parseable JSON: {0}")]
    Parse(#[from] ParseError),

    #[error("classifier reply was missing or had a malformed field: {0}")]
    Malformed(String),

    #[error("memory store error: {0}")]
    Memory(#[from] mnemora_memory::MemoryError),
}

pub type Result<T> = std::result::Result<T, CleanerError>;
