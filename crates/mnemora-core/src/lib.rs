//! `mnemora-core` — shared types, configuration, and error taxonomy used by
//! every other crate in the workspace.

pub mod config;
pub mod error;
pub mod types;

pub use config::MnemoraConfig;
pub use error::{AppError, Result};
pub use types::{CharId, MemoryId, PromptId, SystemInstructionId, UserId};
