use thiserror::Error;

/// The shared error taxonomy every component surfaces through.
///
/// Each crate keeps its own richer error enum for internal matching; at the
/// boundary it converts into one of these kinds, which is all the HTTP layer
/// and the background-task logger need to know about.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("auth error: {0}")]
    Auth(String),

    #[error("account disabled: {0}")]
    Disabled(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// Short error code string sent to clients alongside the HTTP status.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Auth(_) => "AUTH_ERROR",
            AppError::Disabled(_) => "ACCOUNT_DISABLED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
            AppError::Parse(_) => "PARSE_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
