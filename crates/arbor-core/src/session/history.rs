use std::collections::VecDeque;

use crate::conversation::MessageTree;

pub const DEFAULT_UNDO_LIMIT: usize = 50;

/// Bounded undo/redo stacks of whole tree snapshots. Snapshots share their
/// nodes, so keeping many of them costs pointers, not message bodies.
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    undo: VecDeque<MessageTree>,
    redo: Vec<MessageTree>,
    limit: usize,
}

impl Default for SnapshotHistory {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_LIMIT)
    }
}

impl SnapshotHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
        }
    }

    /// Remember `previous` before a new snapshot replaces it. Clears redo.
    pub fn record(&mut self, previous: MessageTree) {
        self.redo.clear();
        self.push_undo(previous);
    }

    pub fn undo(&mut self, current: &MessageTree) -> Option<MessageTree> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current.clone());
        Some(previous)
    }

    pub fn redo(&mut self, current: &MessageTree) -> Option<MessageTree> {
        let next = self.redo.pop()?;
        self.push_undo(current.clone());
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    fn push_undo(&mut self, snapshot: MessageTree) {
        if self.limit == 0 {
            return;
        }
        self.undo.push_back(snapshot);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }
}
