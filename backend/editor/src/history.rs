//! Bounded undo/redo history of document snapshots.

use std::collections::VecDeque;

use mdforge_core::{Document, Range};

use crate::comments::CommentList;

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub document: Document,
    pub selection: Option<Range>,
    /// Anchor placements at the time, restored by id on undo and redo.
    pub comments: CommentList,
}

#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self { undo: VecDeque::new(), redo: Vec::new(), limit }
    }

    /// Record the state before a mutation. Clears the redo stack and drops
    /// the oldest entries past the limit.
    pub fn record(&mut self, before: Snapshot) {
        if self.limit == 0 {
            return;
        }
        self.redo.clear();
        self.undo.push_back(before);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }

    /// Step back: returns the snapshot to restore and keeps `current` for redo.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo.pop()?;
        self.undo.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn len(&self) -> usize {
        self.undo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdforge_core::Node;

    fn snap(text: &str) -> Snapshot {
        Snapshot {
            document: Document::new(vec![Node::paragraph(text)]),
            selection: None,
            comments: CommentList::new(),
        }
    }

    #[test]
    fn undo_redo_walks_both_ways() {
        let mut history = History::new(10);
        history.record(snap("a"));
        history.record(snap("b"));

        assert_eq!(history.undo(snap("c")), Some(snap("b")));
        assert_eq!(history.undo(snap("b")), Some(snap("a")));
        assert_eq!(history.undo(snap("a")), None);
        assert_eq!(history.redo(snap("a")), Some(snap("b")));
        assert!(history.can_redo());
    }

    #[test]
    fn bounded_and_redo_cleared_on_record() {
        let mut history = History::new(2);
        for t in ["a", "b", "c"] {
            history.record(snap(t));
        }
        assert_eq!(history.len(), 2);
        history.undo(snap("d"));
        history.record(snap("e"));
        assert!(!history.can_redo());
    }
}
