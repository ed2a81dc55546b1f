use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::node::{MessageNode, NodeId};
use super::registry::BranchPoint;

/// Every node ever created in one conversation, inactive alternatives
/// included, plus the ordered list of top-level siblings.
///
/// Nodes are shared behind `Arc`, so cloning a pool to produce the next
/// snapshot copies pointers; operations copy-on-write only the nodes they
/// touch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePool {
    nodes: HashMap<NodeId, Arc<MessageNode>>,
    #[serde(default)]
    roots: Vec<NodeId>,
}

impl NodePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &NodeId) -> Option<&Arc<MessageNode>> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Arc<MessageNode>> {
        self.nodes.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Top-level siblings in creation order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// The first top-level node, if the conversation is not empty.
    pub fn root_id(&self) -> Option<&NodeId> {
        self.roots.first()
    }

    /// Ordered children of a branch point. `None` when the point names a node
    /// that is not in the pool.
    pub fn children(&self, point: &BranchPoint) -> Option<&[NodeId]> {
        match point {
            BranchPoint::Root => Some(&self.roots),
            BranchPoint::Node(id) => self.nodes.get(id).map(|node| node.child_ids()),
        }
    }

    /// The node's siblings including itself, in branch order.
    pub fn siblings(&self, id: &NodeId) -> Option<&[NodeId]> {
        let node = self.nodes.get(id)?;
        self.children(&BranchPoint::of_parent(node.parent_id()))
    }

    /// `id` followed by every descendant, parents before children.
    pub fn descendants(&self, id: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.nodes.contains_key(id) {
            return out;
        }
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.child_ids().iter().rev().cloned());
            }
            out.push(current);
        }
        out
    }

    /// Ids starting with `prefix`, for resolving abbreviated ids.
    pub fn ids_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a NodeId> {
        self.nodes
            .keys()
            .filter(move |id| id.as_str().starts_with(prefix))
    }

    pub(crate) fn insert_node(&mut self, node: MessageNode) {
        self.nodes.insert(node.id.clone(), Arc::new(node));
    }

    pub(crate) fn remove_node(&mut self, id: &NodeId) -> Option<Arc<MessageNode>> {
        self.nodes.remove(id)
    }

    /// Mutable access that clones the node first if another snapshot shares it.
    pub(crate) fn node_mut(&mut self, id: &NodeId) -> Option<&mut MessageNode> {
        self.nodes.get_mut(id).map(Arc::make_mut)
    }

    pub(crate) fn children_mut(&mut self, point: &BranchPoint) -> Option<&mut Vec<NodeId>> {
        match point {
            BranchPoint::Root => Some(&mut self.roots),
            BranchPoint::Node(id) => self.node_mut(id).map(|node| &mut node.child_ids),
        }
    }

    /// Rewrite `branch_index` of every child of `point` to its position.
    pub(crate) fn renumber_children(&mut self, point: &BranchPoint) {
        let Some(children) = self.children(point).map(<[NodeId]>::to_vec) else {
            return;
        };
        for (index, child_id) in children.iter().enumerate() {
            if let Some(child) = self.nodes.get(child_id) {
                if child.branch_index == index {
                    continue;
                }
            }
            if let Some(child) = self.node_mut(child_id) {
                child.branch_index = index;
            }
        }
    }
}
