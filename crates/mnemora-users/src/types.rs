use serde::{Deserialize, Serialize};

/// Account record. `password_hash` is never serialized back to a client —
/// handlers build a separate response DTO that omits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub last_login_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_login_ip: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A persona the assistant can play. `is_default` scopes which instruction a
/// chat turn falls back to when the caller names neither an explicit id nor
/// text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInstruction {
    pub id: String,
    pub name: String,
    pub content: String,
    pub is_active: bool,
    pub is_default: bool,
    pub sort_order: i64,
}

/// Per-(user, character) override layered on top of a `SystemInstruction`'s
/// own content in the chat orchestrator's secondary prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCustomPrompt {
    pub id: String,
    pub user_id: String,
    pub system_instruction_id: String,
    pub content: String,
    pub is_active: bool,
    pub sort_order: i64,
}
