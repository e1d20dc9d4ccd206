use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("memory not found: {id}")]
    NotFound { id: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<MemoryError> for mnemora_core::AppError {
    fn from(e: MemoryError) -> Self {
        match e {
            MemoryError::Database(inner) => mnemora_core::AppError::Storage(inner.to_string()),
            MemoryError::NotFound { id } => mnemora_core::AppError::NotFound(id),
            MemoryError::Serialization(msg) => mnemora_core::AppError::Storage(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, MemoryError>;
