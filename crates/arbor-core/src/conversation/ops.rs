//! Tree operations.
//!
//! Each operation reads a pool/registry snapshot and returns fresh values;
//! inputs are never modified. On error nothing is produced, so the caller's
//! previous snapshot stays authoritative.

use tracing::{debug, warn};

use super::node::{MessageNode, NewNode, NodeId, NodePatch};
use super::pool::NodePool;
use super::registry::{BranchPoint, BranchRegistry};
use crate::context::{Clock, TreeContext};
use crate::error::{Error, Result};

/// Result of a successful [`insert`].
#[derive(Debug, Clone)]
pub struct Inserted {
    pub pool: NodePool,
    pub registry: BranchRegistry,
    pub node_id: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Append `draft` as the newest child of `parent_id`, or as a new top-level
/// sibling when `parent_id` is `None`. The new child becomes the active
/// branch at its branch point.
pub fn insert(
    pool: &NodePool,
    registry: &BranchRegistry,
    draft: NewNode,
    parent_id: Option<&NodeId>,
    ctx: &TreeContext,
) -> Result<Inserted> {
    let point = BranchPoint::of_parent(parent_id);
    let branch_index = pool
        .children(&point)
        .map(<[NodeId]>::len)
        .ok_or_else(|| Error::NotFound(format!("parent {point}")))?;

    let id = ctx.next_id(draft.role);
    if pool.contains(&id) {
        return Err(Error::InvariantViolation(format!(
            "generated id {id} already exists"
        )));
    }

    debug!(
        target: "arbor::tree::insert",
        %id,
        role = %draft.role,
        %point,
        branch_index,
        "Inserting node"
    );

    let node = MessageNode {
        id: id.clone(),
        role: draft.role,
        content: draft.content,
        timestamp: ctx.now_millis(),
        model: draft.model,
        parent_id: parent_id.cloned(),
        child_ids: Vec::new(),
        branch_index,
        is_streaming: draft.is_streaming,
        is_editing: draft.is_editing,
    };

    let mut pool = pool.clone();
    let mut registry = registry.clone();
    pool.insert_node(node);
    pool.children_mut(&point)
        .ok_or_else(|| Error::NotFound(format!("parent {point}")))?
        .push(id.clone());

    // The very first node is the conversation root; there is nothing to select.
    if !(point == BranchPoint::Root && branch_index == 0) {
        registry.set(&point, branch_index);
    }

    Ok(Inserted {
        pool,
        registry,
        node_id: id,
    })
}

/// Shallow-merge `patch` into a node. Unknown ids leave the pool unchanged:
/// late stream updates may target a node that has since been deleted.
pub fn update_content(
    pool: &NodePool,
    node_id: &NodeId,
    patch: &NodePatch,
    clock: &dyn Clock,
) -> NodePool {
    if !pool.contains(node_id) {
        debug!(
            target: "arbor::tree::update_content",
            %node_id,
            "Ignoring update for unknown node"
        );
        return pool.clone();
    }

    let mut next = pool.clone();
    if let Some(node) = next.node_mut(node_id) {
        if patch.apply_to(node) {
            node.timestamp = clock.now_millis();
        }
    }
    next
}

/// Remove `node_id` and its whole subtree, close the gap in its parent's
/// children and purge registry entries of every removed node.
///
/// The parent's active index keeps selecting the same sibling when that
/// sibling shifts down; if the active sibling itself was removed, the
/// sibling that moved into its slot becomes active, or the new last child
/// when it was the last one.
pub fn delete_subtree(
    pool: &NodePool,
    registry: &BranchRegistry,
    node_id: &NodeId,
) -> Result<(NodePool, BranchRegistry)> {
    let node = pool.get(node_id).ok_or_else(|| Error::node_not_found(node_id))?;
    let point = BranchPoint::of_parent(node.parent_id());
    let doomed = pool.descendants(node_id);

    debug!(
        target: "arbor::tree::delete_subtree",
        %node_id,
        removed = doomed.len(),
        "Deleting subtree"
    );

    let mut pool = pool.clone();
    let mut registry = registry.clone();
    for id in &doomed {
        pool.remove_node(id);
        registry.remove(&BranchPoint::Node(id.clone()));
    }

    let children = pool.children_mut(&point).ok_or_else(|| {
        Error::InvariantViolation(format!("{point} missing while deleting {node_id}"))
    })?;
    let position = children.iter().position(|c| c == node_id).ok_or_else(|| {
        Error::InvariantViolation(format!("{node_id} is not listed under {point}"))
    })?;
    children.remove(position);
    let remaining = children.len();
    pool.renumber_children(&point);

    if remaining == 0 {
        registry.remove(&point);
    } else if let Some(active) = registry.get(&point) {
        if active > position {
            registry.set(&point, active - 1);
        } else if active >= remaining {
            registry.set(&point, remaining - 1);
        }
    }

    Ok((pool, registry))
}

/// Select the child at `index` under `point`. Touches only that entry:
/// descendant branch points keep their own choices.
pub fn switch_active_branch(
    pool: &NodePool,
    registry: &BranchRegistry,
    point: &BranchPoint,
    index: usize,
) -> Result<BranchRegistry> {
    let len = pool
        .children(point)
        .map(<[NodeId]>::len)
        .ok_or_else(|| Error::NotFound(point.to_string()))?;
    if index >= len {
        return Err(Error::OutOfRange {
            point: point.clone(),
            index,
            len,
        });
    }

    debug!(target: "arbor::tree::switch", %point, index, "Switching active branch");

    let mut registry = registry.clone();
    registry.set(point, index);
    Ok(registry)
}

/// Point every branch point above `node_id` at the path leading to it, so
/// the node shows up on the visible path. Choices below the node are kept.
pub fn activate(
    pool: &NodePool,
    registry: &BranchRegistry,
    node_id: &NodeId,
) -> Result<BranchRegistry> {
    let mut registry = registry.clone();
    let mut current = pool.get(node_id).ok_or_else(|| Error::node_not_found(node_id))?;

    // The parent chain is acyclic, so this walks at most `pool.len()` steps.
    for _ in 0..pool.len() {
        let point = BranchPoint::of_parent(current.parent_id());
        let index = pool
            .children(&point)
            .and_then(|children| children.iter().position(|c| c == current.id()))
            .ok_or_else(|| {
                Error::InvariantViolation(format!("{} is not listed under {point}", current.id()))
            })?;
        registry.set(&point, index);

        let Some(parent_id) = current.parent_id() else {
            return Ok(registry);
        };
        current = pool.get(parent_id).ok_or_else(|| {
            Error::InvariantViolation(format!("parent {parent_id} of {} missing", current.id()))
        })?;
    }

    warn!(target: "arbor::tree::activate", %node_id, "Parent chain longer than the pool");
    Err(Error::InvariantViolation(format!("cycle above node {node_id}")))
}

/// Switch from `node_id` to its previous or next sibling.
pub fn step_branch(
    pool: &NodePool,
    registry: &BranchRegistry,
    node_id: &NodeId,
    direction: Direction,
) -> Result<BranchRegistry> {
    let node = pool.get(node_id).ok_or_else(|| Error::node_not_found(node_id))?;
    let point = BranchPoint::of_parent(node.parent_id());
    let siblings = pool.children(&point).unwrap_or_default();
    let position = siblings.iter().position(|c| c == node_id).ok_or_else(|| {
        Error::InvariantViolation(format!("{node_id} is not listed under {point}"))
    })?;

    let target = match direction {
        Direction::Previous => position.checked_sub(1),
        Direction::Next => Some(position + 1).filter(|next| *next < siblings.len()),
    };
    let Some(target) = target else {
        let which = match direction {
            Direction::Previous => "previous",
            Direction::Next => "next",
        };
        return Err(Error::InvalidOperation(format!(
            "node {node_id} has no {which} alternative"
        )));
    };

    switch_active_branch(pool, registry, &point, target)
}
