//! Persistence for conversations.
//!
//! A store holds whole [`Conversation`] snapshots keyed by id. The tree
//! engine never touches a store; sessions are loaded, mutated in memory, and
//! saved back.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::InMemoryConversationStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::session::{Conversation, ConversationId, ConversationSummary};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Conversation not found: {id}")]
    NotFound { id: String },

    #[error("Storage I/O error: {message}")]
    Io { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Conversation {id} is corrupt: {message}")]
    Corrupt { id: String, message: String },

    #[error("In-memory store lock poisoned: {message}")]
    LockPoisoned { message: String },
}

impl StoreError {
    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn corrupt(id: impl ToString, message: impl Into<String>) -> Self {
        Self::Corrupt {
            id: id.to_string(),
            message: message.into(),
        }
    }

    pub fn lock_poisoned(message: impl Into<String>) -> Self {
        Self::LockPoisoned {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Insert or overwrite.
    async fn save(&self, conversation: &Conversation) -> Result<(), StoreError>;

    async fn load(&self, id: ConversationId) -> Result<Conversation, StoreError>;

    async fn delete(&self, id: ConversationId) -> Result<(), StoreError>;

    /// Most recently updated first.
    async fn list(&self) -> Result<Vec<ConversationSummary>, StoreError>;
}

fn sort_newest_first(summaries: &mut [ConversationSummary]) {
    summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
}
