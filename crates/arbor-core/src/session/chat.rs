//! The chat layer: decides when to branch and keeps undo history on top of
//! the pure tree operations.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::debug;

use super::conversation::Conversation;
use super::history::{DEFAULT_UNDO_LIMIT, SnapshotHistory};
use crate::context::TreeContext;
use crate::conversation::{
    BranchInfo, BranchPoint, Direction, MessageNode, MessageTree, NewNode, NodeId, NodePatch, Role,
};
use crate::error::{Error, Result};

/// What editing an existing message does.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum EditPolicy {
    /// Keep the original and add the edit as a new sibling.
    #[default]
    Branch,
    /// Overwrite the message content.
    InPlace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub edit_policy: EditPolicy,
    pub undo_limit: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            edit_policy: EditPolicy::default(),
            undo_limit: DEFAULT_UNDO_LIMIT,
        }
    }
}

pub struct ChatSession {
    conversation: Conversation,
    ctx: TreeContext,
    options: SessionOptions,
    history: SnapshotHistory,
}

impl ChatSession {
    pub fn new(conversation: Conversation, ctx: TreeContext, options: SessionOptions) -> Self {
        Self {
            conversation,
            ctx,
            history: SnapshotHistory::new(options.undo_limit),
            options,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn into_conversation(self) -> Conversation {
        self.conversation
    }

    pub fn tree(&self) -> &MessageTree {
        &self.conversation.tree
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    /// Append a message after the last visible one.
    pub fn send(&mut self, draft: NewNode) -> Result<NodeId> {
        let parent = self.tree().active_leaf();
        let (next, id) = self.tree().insert(&self.ctx, draft, parent.as_ref())?;
        self.commit(next);
        Ok(id)
    }

    /// Start an empty assistant reply that streamed chunks will fill in.
    pub fn begin_reply(&mut self, model: impl Into<String>) -> Result<NodeId> {
        self.send(NewNode::assistant(String::new(), model).streaming())
    }

    /// Streaming token delivery. Unknown nodes are ignored.
    pub fn append_chunk(&mut self, node_id: &NodeId, chunk: &str) {
        let patch = NodePatch::append(chunk);
        if self
            .conversation
            .tree
            .patch_node(self.ctx.clock(), node_id, &patch)
        {
            self.conversation.touch();
        } else {
            debug!(target: "arbor::session::stream", %node_id, "Dropping chunk for unknown node");
        }
    }

    pub fn finish_reply(&mut self, node_id: &NodeId) {
        let next = self
            .tree()
            .update_content(self.ctx.clock(), node_id, &NodePatch::streaming(false));
        self.replace(next);
    }

    /// Stop a reply in flight. A streaming assistant reply that never
    /// received content is discarded; partial content is kept. Nodes that
    /// are not streaming are left alone.
    pub fn abort_reply(&mut self, node_id: &NodeId) -> Result<()> {
        let Some(node) = self.tree().get(node_id) else {
            return Ok(());
        };
        if !node.is_streaming {
            return Ok(());
        }
        if node.role == Role::Assistant && node.content.is_empty() && !node.has_children() {
            debug!(target: "arbor::session::stream", %node_id, "Discarding empty draft reply");
            let next = self.tree().delete_subtree(node_id)?;
            self.replace(next);
        } else {
            self.finish_reply(node_id);
        }
        Ok(())
    }

    /// Edit a message according to the session's [`EditPolicy`]. Returns the
    /// id of the node now holding the edited content.
    pub fn edit(&mut self, node_id: &NodeId, content: impl Into<String>) -> Result<NodeId> {
        let node = self.require(node_id)?;
        match self.options.edit_policy {
            EditPolicy::Branch => {
                let draft = NewNode::with_role(node.role, content).with_model(node.model.clone());
                let (next, id) = self.tree().insert(&self.ctx, draft, node.parent_id())?;
                self.commit(next);
                Ok(id)
            }
            EditPolicy::InPlace => {
                let patch = NodePatch::content(content);
                let next = self.tree().update_content(self.ctx.clock(), node_id, &patch);
                self.commit(next);
                Ok(node_id.clone())
            }
        }
    }

    /// Ask for another assistant answer. For an assistant message the new
    /// reply is its sibling; for a user message it is a new child. The reply
    /// starts empty and streaming.
    pub fn regenerate(&mut self, node_id: &NodeId, model: Option<String>) -> Result<NodeId> {
        let node = self.require(node_id)?;
        let parent = match node.role {
            Role::Assistant => node.parent_id().cloned(),
            Role::User => Some(node.id.clone()),
            Role::System => {
                return Err(Error::InvalidOperation(format!(
                    "cannot regenerate system message {node_id}"
                )));
            }
        };
        let draft = NewNode::with_role(Role::Assistant, String::new())
            .with_model(model.or_else(|| node.model.clone()))
            .streaming();
        let (next, id) = self.tree().insert(&self.ctx, draft, parent.as_ref())?;
        self.commit(next);
        Ok(id)
    }

    pub fn switch_branch(&mut self, point: &BranchPoint, index: usize) -> Result<()> {
        let next = self.tree().switch_active_branch(point, index)?;
        self.commit(next);
        Ok(())
    }

    pub fn step_branch(&mut self, node_id: &NodeId, direction: Direction) -> Result<()> {
        let next = self.tree().step_branch(node_id, direction)?;
        self.commit(next);
        Ok(())
    }

    pub fn activate(&mut self, node_id: &NodeId) -> Result<()> {
        let next = self.tree().activate(node_id)?;
        self.commit(next);
        Ok(())
    }

    pub fn delete(&mut self, node_id: &NodeId) -> Result<()> {
        let next = self.tree().delete_subtree(node_id)?;
        self.commit(next);
        Ok(())
    }

    pub fn visible_path(&self) -> Vec<Arc<MessageNode>> {
        self.tree().visible_path()
    }

    pub fn branch_info(&self, node_id: &NodeId) -> Option<BranchInfo> {
        self.tree().branch_info(node_id)
    }

    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.conversation.tree) {
            Some(previous) => {
                self.replace(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.conversation.tree) {
            Some(next) => {
                self.replace(next);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn require(&self, node_id: &NodeId) -> Result<Arc<MessageNode>> {
        self.tree()
            .get(node_id)
            .cloned()
            .ok_or_else(|| Error::node_not_found(node_id))
    }

    fn commit(&mut self, next: MessageTree) {
        let previous = std::mem::replace(&mut self.conversation.tree, next);
        self.history.record(previous);
        self.conversation.touch();
    }

    fn replace(&mut self, next: MessageTree) {
        self.conversation.tree = next;
        self.conversation.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TEST_MODEL, fixed_context};

    fn session(policy: EditPolicy) -> ChatSession {
        ChatSession::new(
            Conversation::new(None),
            fixed_context(),
            SessionOptions {
                edit_policy: policy,
                undo_limit: 10,
            },
        )
    }

    fn contents(session: &ChatSession) -> Vec<String> {
        session
            .visible_path()
            .iter()
            .map(|node| node.content.clone())
            .collect()
    }

    #[test]
    fn streaming_reply_fills_in_without_touching_history() {
        let mut session = session(EditPolicy::Branch);
        session.send(NewNode::user("hello")).unwrap();
        let reply = session.begin_reply(TEST_MODEL).unwrap();
        assert!(session.tree().get(&reply).unwrap().is_streaming);

        session.append_chunk(&reply, "Hi");
        session.append_chunk(&reply, " there");
        session.finish_reply(&reply);

        let node = session.tree().get(&reply).unwrap();
        assert_eq!(node.content, "Hi there");
        assert!(!node.is_streaming);

        // One undo step removes the reply as a whole.
        assert!(session.undo());
        assert_eq!(contents(&session), vec!["hello"]);
    }

    #[test]
    fn chunks_for_deleted_nodes_are_dropped() {
        let mut session = session(EditPolicy::Branch);
        session.send(NewNode::user("hello")).unwrap();
        let reply = session.begin_reply(TEST_MODEL).unwrap();
        session.delete(&reply).unwrap();
        let before = session.tree().clone();
        session.append_chunk(&reply, "late");
        assert_eq!(session.tree(), &before);
    }

    #[test]
    fn aborting_an_empty_reply_discards_it() {
        let mut session = session(EditPolicy::Branch);
        let question = session.send(NewNode::user("hello")).unwrap();
        let reply = session.begin_reply(TEST_MODEL).unwrap();
        session.abort_reply(&reply).unwrap();
        assert!(session.tree().get(&reply).is_none());
        assert!(session.tree().get(&question).unwrap().child_ids.is_empty());
        session.tree().validate().unwrap();

        let partial = session.begin_reply(TEST_MODEL).unwrap();
        session.append_chunk(&partial, "Hal");
        session.abort_reply(&partial).unwrap();
        let node = session.tree().get(&partial).unwrap();
        assert_eq!(node.content, "Hal");
        assert!(!node.is_streaming);
    }

    #[test]
    fn aborting_leaves_non_streaming_nodes_alone() {
        let mut session = session(EditPolicy::Branch);
        let question = session.send(NewNode::user("")).unwrap();
        session.abort_reply(&question).unwrap();
        assert!(session.tree().get(&question).is_some());

        let reply = session.begin_reply(TEST_MODEL).unwrap();
        session.finish_reply(&reply);
        let before = session.tree().clone();
        session.abort_reply(&reply).unwrap();
        assert_eq!(session.tree(), &before);
        assert!(session.tree().get(&reply).unwrap().content.is_empty());
    }

    #[test]
    fn chunks_do_not_leak_into_earlier_snapshots() {
        let mut session = session(EditPolicy::Branch);
        session.send(NewNode::user("hello")).unwrap();
        let reply = session.begin_reply(TEST_MODEL).unwrap();
        session.append_chunk(&reply, "Hi");
        let snapshot = session.tree().clone();

        session.append_chunk(&reply, " there");
        assert_eq!(snapshot.get(&reply).unwrap().content, "Hi");
        assert_eq!(session.tree().get(&reply).unwrap().content, "Hi there");
    }

    #[test]
    fn branch_edit_keeps_original_as_sibling() {
        let mut session = session(EditPolicy::Branch);
        let q = session.send(NewNode::user("What is Rust?")).unwrap();
        session
            .send(NewNode::assistant("A systems language.", TEST_MODEL))
            .unwrap();

        let edited = session.edit(&q, "What is Go?").unwrap();
        assert_ne!(edited, q);
        assert_eq!(contents(&session), vec!["What is Go?"]);
        let info = session.tree().root_branch_info(&edited).unwrap();
        assert_eq!((info.current, info.total), (2, 2));

        session.step_branch(&edited, Direction::Previous).unwrap();
        assert_eq!(contents(&session), vec!["What is Rust?", "A systems language."]);
    }

    #[test]
    fn in_place_edit_overwrites() {
        let mut session = session(EditPolicy::InPlace);
        let q = session.send(NewNode::user("typo")).unwrap();
        let edited = session.edit(&q, "fixed").unwrap();
        assert_eq!(edited, q);
        assert_eq!(contents(&session), vec!["fixed"]);
        assert_eq!(session.tree().len(), 1);
    }

    #[test]
    fn regenerate_assistant_adds_sibling_and_user_adds_child() {
        let mut session = session(EditPolicy::Branch);
        let q = session.send(NewNode::user("q")).unwrap();
        let a = session.send(NewNode::assistant("a", TEST_MODEL)).unwrap();

        let again = session.regenerate(&a, None).unwrap();
        let node = session.tree().get(&again).unwrap();
        assert_eq!(node.parent_id(), Some(&q));
        assert_eq!(node.model.as_deref(), Some(TEST_MODEL));
        assert_eq!(session.branch_info(&again).unwrap().current, 2);

        let child = session.regenerate(&q, Some("other".to_string())).unwrap();
        assert_eq!(session.tree().get(&child).unwrap().branch_index, 2);
    }

    #[test]
    fn regenerate_system_message_is_rejected() {
        let mut session = session(EditPolicy::Branch);
        let s = session.send(NewNode::system("be nice")).unwrap();
        assert!(matches!(
            session.regenerate(&s, None),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn failed_operation_leaves_snapshot_and_history_alone() {
        let mut session = session(EditPolicy::Branch);
        let q = session.send(NewNode::user("q")).unwrap();
        let before = session.tree().clone();
        assert!(session.switch_branch(&BranchPoint::Node(q), 5).is_err());
        assert_eq!(session.tree(), &before);
        assert!(session.undo());
        assert!(session.tree().is_empty());
        assert!(!session.undo());
        assert!(session.redo());
        assert_eq!(session.tree(), &before);
    }
}
