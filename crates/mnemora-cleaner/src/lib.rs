//! `mnemora-cleaner` — the conversation cleaner (C4): distills a batch of
//! chat messages into a `ConversationMemory`, run as a detached background
//! task after every `batch_size`-message round.

pub mod category;
pub mod classify;
pub mod cleaner;
pub mod emotion_score;
pub mod error;
pub mod format;

pub use cleaner::clean_batch;
pub use error::{CleanerError, Result};
