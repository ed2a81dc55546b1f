use serde::Serialize;
use std::fmt;

use super::node::NodeId;
use super::pool::NodePool;
use super::registry::BranchPoint;

/// Navigation metadata for one node among its siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BranchInfo {
    pub total: usize,
    /// 1-based position.
    pub current: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

impl BranchInfo {
    fn at(position: usize, total: usize) -> Self {
        let current = position + 1;
        Self {
            total,
            current,
            has_previous: current > 1,
            has_next: current < total,
        }
    }

    pub fn has_alternatives(&self) -> bool {
        self.total > 1
    }
}

impl fmt::Display for BranchInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.current, self.total)
    }
}

/// Position of `node_id` among its parent's children. `None` for unknown
/// nodes and for top-level nodes.
pub fn branch_info(pool: &NodePool, node_id: &NodeId) -> Option<BranchInfo> {
    let node = pool.get(node_id)?;
    let parent_id = node.parent_id()?;
    position_under(pool, &BranchPoint::Node(parent_id.clone()), node_id)
}

/// Position of a top-level node among the conversation's top-level siblings.
/// `None` for unknown nodes and for nodes that have a parent.
pub fn root_branch_info(pool: &NodePool, node_id: &NodeId) -> Option<BranchInfo> {
    let node = pool.get(node_id)?;
    if !node.is_root() {
        return None;
    }
    position_under(pool, &BranchPoint::Root, node_id)
}

fn position_under(pool: &NodePool, point: &BranchPoint, node_id: &NodeId) -> Option<BranchInfo> {
    let siblings = pool.children(point)?;
    let position = siblings.iter().position(|id| id == node_id)?;
    Some(BranchInfo::at(position, siblings.len()))
}
