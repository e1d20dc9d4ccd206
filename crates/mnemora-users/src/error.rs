use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("auth error: {0}")]
    Auth(String),

    #[error("account disabled: {0}")]
    Disabled(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl From<UserError> for mnemora_core::AppError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::Validation(msg) => mnemora_core::AppError::Validation(msg),
            UserError::NotFound(id) => mnemora_core::AppError::NotFound(id),
            UserError::Auth(msg) => mnemora_core::AppError::Auth(msg),
            UserError::Disabled(msg) => mnemora_core::AppError::Disabled(msg),
            UserError::Database(inner) => mnemora_core::AppError::Storage(inner.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, UserError>;
