//! Message node types for the conversation tree.
//!
//! - `MessageNode` - one message version with its structural links
//! - `NewNode` - the caller's draft handed to `insert`
//! - `NodePatch` - a shallow content/flag update applied by `update_content`

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

/// Opaque node identifier, assigned once at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Role in the conversation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    #[default]
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageNode {
    pub id: NodeId,
    pub role: Role,
    pub content: String,
    /// Milliseconds since the Unix epoch of creation or last content edit.
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// `None` for top-level nodes (children of the root sentinel).
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub child_ids: Vec<NodeId>,
    pub branch_index: usize,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_streaming: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_editing: bool,
}

impl MessageNode {
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn parent_id(&self) -> Option<&NodeId> {
        self.parent_id.as_ref()
    }

    pub fn child_ids(&self) -> &[NodeId] {
        &self.child_ids
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn has_children(&self) -> bool {
        !self.child_ids.is_empty()
    }
}

/// Caller-supplied fields for a node that does not exist yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewNode {
    pub role: Role,
    pub content: String,
    pub model: Option<String>,
    pub is_streaming: bool,
    pub is_editing: bool,
}

impl NewNode {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn assistant(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            model: Some(model.into()),
            ..Self::default()
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn streaming(mut self) -> Self {
        self.is_streaming = true;
        self
    }
}

/// Shallow update for a node's mutable fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodePatch {
    pub content: Option<String>,
    /// Appended after `content` is applied.
    pub append: Option<String>,
    pub model: Option<String>,
    pub is_streaming: Option<bool>,
    pub is_editing: Option<bool>,
}

impl NodePatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn append(chunk: impl Into<String>) -> Self {
        Self {
            append: Some(chunk.into()),
            ..Self::default()
        }
    }

    pub fn streaming(is_streaming: bool) -> Self {
        Self {
            is_streaming: Some(is_streaming),
            ..Self::default()
        }
    }

    pub fn editing(is_editing: bool) -> Self {
        Self {
            is_editing: Some(is_editing),
            ..Self::default()
        }
    }

    /// Merge into `node`. Returns true when the content value changed.
    pub(crate) fn apply_to(&self, node: &mut MessageNode) -> bool {
        let mut content_changed = false;
        if let Some(content) = &self.content {
            if node.content != *content {
                node.content.clone_from(content);
                content_changed = true;
            }
        }
        if let Some(chunk) = self.append.as_deref().filter(|chunk| !chunk.is_empty()) {
            node.content.push_str(chunk);
            content_changed = true;
        }
        if let Some(model) = &self.model {
            node.model = Some(model.clone());
        }
        if let Some(is_streaming) = self.is_streaming {
            node.is_streaming = is_streaming;
        }
        if let Some(is_editing) = self.is_editing {
            node.is_editing = is_editing;
        }
        content_changed
    }
}
