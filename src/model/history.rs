use std::collections::VecDeque;

use super::document::Document;

/// Maximum number of undo snapshots kept; oldest entries are evicted first.
pub const UNDO_CAPACITY: usize = 50;

/// Bounded undo/redo stacks of whole-document snapshots.
///
/// Recording a new snapshot invalidates the redo stack; undo/redo move the
/// current document between the two stacks without recording anything
/// themselves.
#[derive(Debug, Default)]
pub struct UndoHistory {
    undo: VecDeque<Document>,
    redo: Vec<Document>,
}

impl UndoHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pre-mutation document. Clears the redo stack.
    pub fn record(&mut self, snapshot: Document) {
        if self.undo.len() == UNDO_CAPACITY {
            self.undo.pop_front();
        }
        self.undo.push_back(snapshot);
        self.redo.clear();
    }

    /// Pop the most recent snapshot, parking `current` on the redo stack.
    pub fn undo(&mut self, current: Document) -> Option<Document> {
        let snapshot = self.undo.pop_back()?;
        self.redo.push(current);
        Some(snapshot)
    }

    /// Pop the most recently undone snapshot, parking `current` for undo.
    pub fn redo(&mut self, current: Document) -> Option<Document> {
        let snapshot = self.redo.pop()?;
        if self.undo.len() == UNDO_CAPACITY {
            self.undo.pop_front();
        }
        self.undo.push_back(current);
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_version(v: u32) -> Document {
        Document {
            schema_version: v,
            ..Document::default()
        }
    }

    #[test]
    fn record_clears_redo() {
        let mut history = UndoHistory::new();
        history.record(doc_with_version(1));
        let restored = history.undo(doc_with_version(2)).unwrap();
        assert_eq!(restored.schema_version, 1);
        assert!(history.can_redo());

        history.record(doc_with_version(3));
        assert!(!history.can_redo());
    }

    #[test]
    fn oldest_snapshot_is_evicted_at_capacity() {
        let mut history = UndoHistory::new();
        for v in 0..(UNDO_CAPACITY as u32 + 5) {
            history.record(doc_with_version(v));
        }
        // Walk the stack all the way down: the earliest surviving snapshot is
        // the one recorded after the evictions.
        let mut last = None;
        let mut current = doc_with_version(999);
        while history.can_undo() {
            let snap = history.undo(current).unwrap();
            current = snap.clone();
            last = Some(snap);
        }
        assert_eq!(last.unwrap().schema_version, 5);
    }
}
