use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use super::inspect::{self, BranchInfo};
use super::node::{MessageNode, NewNode, NodeId, NodePatch};
use super::ops::{self, Direction};
use super::path;
use super::pool::NodePool;
use super::registry::{BranchPoint, BranchRegistry};
use crate::context::{Clock, TreeContext};
use crate::error::{Error, Result};

/// One immutable version of a conversation's structure: the node pool and
/// the branch registry, always replaced together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageTree {
    pool: NodePool,
    registry: BranchRegistry,
}

impl MessageTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(pool: NodePool, registry: BranchRegistry) -> Self {
        Self { pool, registry }
    }

    pub fn pool(&self) -> &NodePool {
        &self.pool
    }

    pub fn registry(&self) -> &BranchRegistry {
        &self.registry
    }

    pub fn root_id(&self) -> Option<&NodeId> {
        self.pool.root_id()
    }

    pub fn get(&self, id: &NodeId) -> Option<&Arc<MessageNode>> {
        self.pool.get(id)
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn insert(
        &self,
        ctx: &TreeContext,
        draft: NewNode,
        parent_id: Option<&NodeId>,
    ) -> Result<(Self, NodeId)> {
        let inserted = ops::insert(&self.pool, &self.registry, draft, parent_id, ctx)?;
        Ok((
            Self::from_parts(inserted.pool, inserted.registry),
            inserted.node_id,
        ))
    }

    pub fn update_content(&self, clock: &dyn Clock, node_id: &NodeId, patch: &NodePatch) -> Self {
        Self {
            pool: ops::update_content(&self.pool, node_id, patch, clock),
            registry: self.registry.clone(),
        }
    }

    /// Apply `patch` to this snapshot directly. Nodes shared with other
    /// snapshots are copied first, so those snapshots never change. Returns
    /// false for unknown ids.
    pub fn patch_node(&mut self, clock: &dyn Clock, node_id: &NodeId, patch: &NodePatch) -> bool {
        let Some(node) = self.pool.node_mut(node_id) else {
            return false;
        };
        if patch.apply_to(node) {
            node.timestamp = clock.now_millis();
        }
        true
    }

    pub fn delete_subtree(&self, node_id: &NodeId) -> Result<Self> {
        let (pool, registry) = ops::delete_subtree(&self.pool, &self.registry, node_id)?;
        Ok(Self::from_parts(pool, registry))
    }

    pub fn switch_active_branch(&self, point: &BranchPoint, index: usize) -> Result<Self> {
        let registry = ops::switch_active_branch(&self.pool, &self.registry, point, index)?;
        Ok(self.with_registry(registry))
    }

    pub fn activate(&self, node_id: &NodeId) -> Result<Self> {
        let registry = ops::activate(&self.pool, &self.registry, node_id)?;
        Ok(self.with_registry(registry))
    }

    pub fn step_branch(&self, node_id: &NodeId, direction: Direction) -> Result<Self> {
        let registry = ops::step_branch(&self.pool, &self.registry, node_id, direction)?;
        Ok(self.with_registry(registry))
    }

    pub fn visible_path(&self) -> Vec<Arc<MessageNode>> {
        path::visible_path(&self.pool, &self.registry)
    }

    pub fn visible_path_from(&self, start: &NodeId) -> Vec<Arc<MessageNode>> {
        path::visible_path_from(&self.pool, &self.registry, start)
    }

    pub fn active_leaf(&self) -> Option<NodeId> {
        path::active_leaf(&self.pool, &self.registry)
    }

    pub fn ancestors(&self, node_id: &NodeId) -> Vec<Arc<MessageNode>> {
        path::ancestors(&self.pool, node_id)
    }

    pub fn branch_info(&self, node_id: &NodeId) -> Option<BranchInfo> {
        inspect::branch_info(&self.pool, node_id)
    }

    pub fn root_branch_info(&self, node_id: &NodeId) -> Option<BranchInfo> {
        inspect::root_branch_info(&self.pool, node_id)
    }

    fn with_registry(&self, registry: BranchRegistry) -> Self {
        Self {
            pool: self.pool.clone(),
            registry,
        }
    }

    /// Check every structural invariant, reporting the first breach.
    pub fn validate(&self) -> Result<()> {
        let violation = |msg: String| Err(Error::InvariantViolation(msg));

        for (index, root_id) in self.pool.roots().iter().enumerate() {
            let Some(root) = self.pool.get(root_id) else {
                return violation(format!("root {root_id} is not in the pool"));
            };
            if root.parent_id.is_some() {
                return violation(format!("root {root_id} has a parent"));
            }
            if root.branch_index != index {
                return violation(format!(
                    "root {root_id} has branch_index {} but sits at {index}",
                    root.branch_index
                ));
            }
        }

        for node in self.pool.nodes() {
            let mut seen = HashSet::new();
            for (index, child_id) in node.child_ids.iter().enumerate() {
                if !seen.insert(child_id) {
                    return violation(format!("{} lists child {child_id} twice", node.id));
                }
                let Some(child) = self.pool.get(child_id) else {
                    return violation(format!("{} lists missing child {child_id}", node.id));
                };
                if child.parent_id.as_ref() != Some(&node.id) {
                    return violation(format!(
                        "{child_id} is listed under {} but points elsewhere",
                        node.id
                    ));
                }
                if child.branch_index != index {
                    return violation(format!(
                        "{child_id} has branch_index {} but sits at {index}",
                        child.branch_index
                    ));
                }
            }
            if node.parent_id.is_none() && !self.pool.roots().contains(&node.id) {
                return violation(format!("{} has no parent and is not a root", node.id));
            }
        }

        // Every node reachable from the roots exactly once: a strict forest.
        let mut visited = HashSet::new();
        let mut stack: Vec<&NodeId> = self.pool.roots().iter().collect();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                return violation(format!("{id} is reachable twice"));
            }
            if let Some(node) = self.pool.get(id) {
                stack.extend(node.child_ids.iter());
            }
        }
        if visited.len() != self.pool.len() {
            return violation(format!(
                "{} of {} nodes are unreachable from the roots",
                self.pool.len() - visited.len(),
                self.pool.len()
            ));
        }

        for (point, index) in self.registry.entries() {
            let Some(children) = self.pool.children(&point) else {
                return violation(format!("registry entry for missing {point}"));
            };
            if index >= children.len() {
                return violation(format!(
                    "registry selects {index} at {point} which has {} children",
                    children.len()
                ));
            }
        }

        Ok(())
    }
}
