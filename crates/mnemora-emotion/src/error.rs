use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmotionError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Failure of a single judge attempt. Never surfaced past `Judge::analyze` —
/// the engine retries up to 3 times then falls back to `(0, 0)`.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("upstream error: {0}")]
    Upstream(#[from] mnemora_llm::ProviderError),

    #[error("parse error: {0}")]
    Parse(#[from] mnemora_llm::ParseError),

    #[error("malformed judge response: {0}")]
    Malformed(String),
}

impl From<EmotionError> for mnemora_core::AppError {
    fn from(e: EmotionError) -> Self {
        match e {
            EmotionError::Database(inner) => mnemora_core::AppError::Storage(inner.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, EmotionError>;
