use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::node::NodeId;

/// A place where alternatives hang: a node, or the conversation root for
/// top-level siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BranchPoint {
    Root,
    Node(NodeId),
}

impl BranchPoint {
    /// The branch point a node with the given parent hangs from.
    pub fn of_parent(parent_id: Option<&NodeId>) -> Self {
        parent_id.map_or(BranchPoint::Root, |id| BranchPoint::Node(id.clone()))
    }
}

impl fmt::Display for BranchPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchPoint::Root => f.write_str("conversation root"),
            BranchPoint::Node(id) => write!(f, "node {id}"),
        }
    }
}

/// Active child index per branch point.
///
/// Kept apart from the node pool so switching never rewrites node content.
/// A missing entry means "newest child".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRegistry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    root: Option<usize>,
    #[serde(default)]
    nodes: HashMap<NodeId, usize>,
}

impl BranchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw stored index, if any.
    pub fn get(&self, point: &BranchPoint) -> Option<usize> {
        match point {
            BranchPoint::Root => self.root,
            BranchPoint::Node(id) => self.nodes.get(id).copied(),
        }
    }

    pub fn set(&mut self, point: &BranchPoint, index: usize) {
        match point {
            BranchPoint::Root => self.root = Some(index),
            BranchPoint::Node(id) => {
                self.nodes.insert(id.clone(), index);
            }
        }
    }

    pub fn remove(&mut self, point: &BranchPoint) -> Option<usize> {
        match point {
            BranchPoint::Root => self.root.take(),
            BranchPoint::Node(id) => self.nodes.remove(id),
        }
    }

    /// Index to follow at `point` given its current child count: the stored
    /// index clamped into range, or the last child when nothing is stored.
    pub fn active_index(&self, point: &BranchPoint, child_count: usize) -> Option<usize> {
        let last = child_count.checked_sub(1)?;
        Some(self.get(point).map_or(last, |stored| stored.min(last)))
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + usize::from(self.root.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> impl Iterator<Item = (BranchPoint, usize)> + '_ {
        self.root
            .map(|index| (BranchPoint::Root, index))
            .into_iter()
            .chain(
                self.nodes
                    .iter()
                    .map(|(id, index)| (BranchPoint::Node(id.clone()), *index)),
            )
    }
}
