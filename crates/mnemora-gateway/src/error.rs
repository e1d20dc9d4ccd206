//! Maps the shared [`mnemora_core::AppError`] taxonomy onto HTTP status
//! codes and the `{detail}` JSON body (§7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mnemora_core::AppError;
use serde_json::json;

pub struct GatewayError(pub AppError);

impl From<AppError> for GatewayError {
    fn from(e: AppError) -> Self {
        GatewayError(e)
    }
}

impl From<mnemora_memory::MemoryError> for GatewayError {
    fn from(e: mnemora_memory::MemoryError) -> Self {
        GatewayError(AppError::from(e))
    }
}

impl From<mnemora_users::UserError> for GatewayError {
    fn from(e: mnemora_users::UserError) -> Self {
        GatewayError(AppError::from(e))
    }
}

impl From<mnemora_emotion::EmotionError> for GatewayError {
    fn from(e: mnemora_emotion::EmotionError) -> Self {
        GatewayError(AppError::from(e))
    }
}

impl From<mnemora_llm::ProviderError> for GatewayError {
    fn from(e: mnemora_llm::ProviderError) -> Self {
        GatewayError(AppError::Upstream(e.to_string()))
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Disabled(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
