use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{ConversationStore, StoreError, sort_newest_first};
use crate::session::{Conversation, ConversationId, ConversationSummary};

/// Keeps conversations in a map. Used by tests and by callers that never
/// need to outlive the process.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    conversations: RwLock<HashMap<ConversationId, Conversation>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn save(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let mut conversations = self
            .conversations
            .write()
            .map_err(|_| StoreError::lock_poisoned("conversations"))?;
        conversations.insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn load(&self, id: ConversationId) -> Result<Conversation, StoreError> {
        let conversations = self
            .conversations
            .read()
            .map_err(|_| StoreError::lock_poisoned("conversations"))?;
        conversations
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(id))
    }

    async fn delete(&self, id: ConversationId) -> Result<(), StoreError> {
        let mut conversations = self
            .conversations
            .write()
            .map_err(|_| StoreError::lock_poisoned("conversations"))?;
        conversations
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(id))
    }

    async fn list(&self) -> Result<Vec<ConversationSummary>, StoreError> {
        let conversations = self
            .conversations
            .read()
            .map_err(|_| StoreError::lock_poisoned("conversations"))?;
        let mut summaries: Vec<_> = conversations.values().map(Conversation::summary).collect();
        sort_newest_first(&mut summaries);
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_load_delete() {
        let store = InMemoryConversationStore::new();
        let conversation = Conversation::new(Some("scratch".to_string()));

        store.save(&conversation).await.unwrap();
        assert_eq!(store.load(conversation.id).await.unwrap(), conversation);
        assert_eq!(store.list().await.unwrap().len(), 1);

        store.delete(conversation.id).await.unwrap();
        assert!(matches!(
            store.load(conversation.id).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete(conversation.id).await,
            Err(StoreError::NotFound { .. })
        ));
    }
}
