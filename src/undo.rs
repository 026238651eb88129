use std::collections::VecDeque;

/// Bounded history of serialized documents.
#[derive(Debug, Clone)]
pub struct UndoStack {
    snapshots: VecDeque<String>,
    depth: usize,
}

impl UndoStack {
    pub fn new(depth: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(depth.min(64)),
            depth: depth.max(1),
        }
    }

    /// Record a snapshot unless it equals the latest one. The oldest entry
    /// is dropped once the stack is full.
    pub fn push(&mut self, snapshot: String) -> bool {
        if self.snapshots.back() == Some(&snapshot) {
            return false;
        }
        if self.snapshots.len() == self.depth {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snapshot);
        true
    }

    /// Most recent snapshot that differs from `current`. Snapshots equal to
    /// `current` are discarded on the way; the returned one stays on the
    /// stack as the new latest state.
    pub fn undo(&mut self, current: &str) -> Option<String> {
        while let Some(top) = self.snapshots.back() {
            if top != current {
                return Some(top.clone());
            }
            self.snapshots.pop_back();
        }
        None
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
