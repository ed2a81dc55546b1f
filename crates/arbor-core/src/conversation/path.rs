use std::sync::Arc;
use tracing::{debug, warn};

use super::node::{MessageNode, NodeId};
use super::pool::NodePool;
use super::registry::{BranchPoint, BranchRegistry};

/// The linear conversation to display: the active top-level node, then at
/// every branch point the registry's chosen child, down to a leaf.
///
/// Recomputed from scratch on each call; cost is proportional to the length
/// of the path, not to the size of the pool.
pub fn visible_path(pool: &NodePool, registry: &BranchRegistry) -> Vec<Arc<MessageNode>> {
    let roots = pool.roots();
    let Some(start) = registry
        .active_index(&BranchPoint::Root, roots.len())
        .and_then(|index| roots.get(index))
    else {
        return Vec::new();
    };
    visible_path_from(pool, registry, start)
}

/// Like [`visible_path`], but starting at an arbitrary node.
pub fn visible_path_from(
    pool: &NodePool,
    registry: &BranchRegistry,
    start: &NodeId,
) -> Vec<Arc<MessageNode>> {
    let mut path: Vec<Arc<MessageNode>> = Vec::new();
    let mut current = pool.get(start).cloned();

    while let Some(node) = current {
        if path.len() >= pool.len() {
            warn!(
                target: "arbor::tree::path",
                %start,
                "Visible path longer than the pool; stopping"
            );
            break;
        }
        current = registry
            .active_index(&BranchPoint::Node(node.id.clone()), node.child_ids.len())
            .and_then(|index| node.child_ids.get(index))
            .and_then(|id| pool.get(id))
            .cloned();
        path.push(node);
    }

    debug!(
        target: "arbor::tree::path",
        "Visible path: [{}]",
        path.iter()
            .map(|node| node.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    path
}

/// Last node of the visible path; where the next message is appended.
pub fn active_leaf(pool: &NodePool, registry: &BranchRegistry) -> Option<NodeId> {
    visible_path(pool, registry)
        .last()
        .map(|node| node.id.clone())
}

/// Root-to-node chain ending at `node_id`. Empty if the node is unknown.
pub fn ancestors(pool: &NodePool, node_id: &NodeId) -> Vec<Arc<MessageNode>> {
    let mut chain = Vec::new();
    let mut current = pool.get(node_id).cloned();
    while let Some(node) = current {
        if chain.len() >= pool.len() {
            break;
        }
        current = node.parent_id().and_then(|id| pool.get(id)).cloned();
        chain.push(node);
    }
    chain.reverse();
    chain
}
