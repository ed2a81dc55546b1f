mod chat;
mod conversation;
mod history;

pub use chat::{ChatSession, EditPolicy, SessionOptions};
pub use conversation::{Conversation, ConversationId, ConversationSummary};
pub use history::{DEFAULT_UNDO_LIMIT, SnapshotHistory};
