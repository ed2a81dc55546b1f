use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{ConversationStore, StoreError, sort_newest_first};
use crate::session::{Conversation, ConversationId, ConversationSummary};

/// One pretty-printed JSON document per conversation, named `<id>.json`.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous version intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::io(format!("creating {}: {e}", dir.display())))?;
        debug!(target: "arbor::store", dir = %dir.display(), "Opened conversation store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: ConversationId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    async fn read_file(&self, id: ConversationId, path: &Path) -> Result<Conversation, StoreError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::not_found(id)),
            Err(e) => return Err(StoreError::io(format!("reading {}: {e}", path.display()))),
        };

        let conversation: Conversation = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::corrupt(id, e.to_string()))?;
        if conversation.id != id {
            return Err(StoreError::corrupt(
                id,
                format!("file holds conversation {}", conversation.id),
            ));
        }
        conversation
            .tree
            .validate()
            .map_err(|e| StoreError::corrupt(id, e.to_string()))?;
        Ok(conversation)
    }
}

#[async_trait]
impl ConversationStore for JsonFileStore {
    async fn save(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let path = self.path_for(conversation.id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(conversation)
            .map_err(|e| StoreError::serialization(e.to_string()))?;

        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::io(format!("writing {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::io(format!("renaming {}: {e}", tmp.display())))?;

        debug!(
            target: "arbor::store",
            id = %conversation.id,
            nodes = conversation.tree.len(),
            "Saved conversation"
        );
        Ok(())
    }

    async fn load(&self, id: ConversationId) -> Result<Conversation, StoreError> {
        self.read_file(id, &self.path_for(id)).await
    }

    async fn delete(&self, id: ConversationId) -> Result<(), StoreError> {
        let path = self.path_for(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::not_found(id)),
            Err(e) => Err(StoreError::io(format!("removing {}: {e}", path.display()))),
        }
    }

    async fn list(&self) -> Result<Vec<ConversationSummary>, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| StoreError::io(format!("listing {}: {e}", self.dir.display())))?;

        let mut summaries = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<ConversationId>().ok())
            else {
                continue;
            };

            match self.read_file(id, &path).await {
                Ok(conversation) => summaries.push(conversation.summary()),
                Err(e) => warn!(
                    target: "arbor::store",
                    path = %path.display(),
                    "Skipping unreadable conversation: {e}"
                ),
            }
        }

        sort_newest_first(&mut summaries);
        Ok(summaries)
    }
}
