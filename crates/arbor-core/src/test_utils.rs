//! Deterministic collaborators and fixtures for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::context::{Clock, IdGenerator, TreeContext};
use crate::conversation::{MessageTree, NewNode, NodeId, Role};
use crate::error::Result;

pub const TEST_MODEL: &str = "test-model";

/// `<role>_<n>` ids with `n` counting up from 1.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self, role: Role) -> NodeId {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        NodeId::new(format!("{role}_{n}"))
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, millis: u64) {
        self.now.store(millis, Ordering::Relaxed);
    }

    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}

/// Sequential ids and a clock frozen at 1000ms.
pub fn fixed_context() -> TreeContext {
    context_with_clock(Arc::new(ManualClock::new(1_000)))
}

/// Sequential ids and a caller-held clock.
pub fn context_with_clock(clock: Arc<ManualClock>) -> TreeContext {
    TreeContext::new(Arc::new(SequentialIdGenerator::new()), clock)
}

/// A single chain of messages alternating user/assistant, starting with a
/// user message at the root. Returns the tree and the ids in order.
pub fn linear_tree(ctx: &TreeContext, contents: &[&str]) -> Result<(MessageTree, Vec<NodeId>)> {
    let mut tree = MessageTree::new();
    let mut ids: Vec<NodeId> = Vec::with_capacity(contents.len());
    for (i, content) in contents.iter().enumerate() {
        let draft = if i % 2 == 0 {
            NewNode::user(*content)
        } else {
            NewNode::assistant(*content, TEST_MODEL)
        };
        let (next, id) = tree.insert(ctx, draft, ids.last())?;
        tree = next;
        ids.push(id);
    }
    Ok((tree, ids))
}
