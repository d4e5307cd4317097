//! Undo/redo management for document edits.
//!
//! Provides:
//! - `UndoManager` trait for abstracting undo implementations
//! - `History<E>` - bounded undo/redo stacks of recorded edits
//!
//! Synthetic reveal swaps are never pushed here; only user-visible edits are.

/// Trait for managing undo/redo operations.
///
/// Implementations must actually perform the undo/redo, not just track state.
pub trait UndoManager {
    /// Check if undo is available.
    fn can_undo(&self) -> bool;

    /// Check if redo is available.
    fn can_redo(&self) -> bool;

    /// Perform undo. Returns true if successful.
    fn undo(&mut self) -> bool;

    /// Perform redo. Returns true if successful.
    fn redo(&mut self) -> bool;

    /// Clear all undo/redo history.
    fn clear_history(&mut self);
}

/// Bounded undo/redo stacks.
#[derive(Debug, Clone)]
pub struct History<E> {
    undo_stack: Vec<E>,
    redo_stack: Vec<E>,
    max_steps: usize,
}

impl<E> Default for History<E> {
    fn default() -> Self {
        Self::new(100)
    }
}

impl<E> History<E> {
    pub fn new(max_steps: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    /// Record a new user edit. Clears the redo stack.
    pub fn record(&mut self, edit: E) {
        self.redo_stack.clear();
        self.undo_stack.push(edit);

        // Trim if over max
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.remove(0);
        }
    }

    /// Pop the most recent edit for undoing.
    pub fn take_undo(&mut self) -> Option<E> {
        self.undo_stack.pop()
    }

    /// Pop the most recently undone edit for redoing.
    pub fn take_redo(&mut self) -> Option<E> {
        self.redo_stack.pop()
    }

    /// Push an edit that was just undone.
    pub fn push_redo(&mut self, edit: E) {
        self.redo_stack.push(edit);
    }

    /// Push an edit that was just redone. Unlike `record`, keeps the redo stack.
    pub fn push_undo(&mut self, edit: E) {
        self.undo_stack.push(edit);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Every edit on either stack, undo stack first.
    pub fn entries(&self) -> impl Iterator<Item = &E> {
        self.undo_stack.iter().chain(self.redo_stack.iter())
    }

    /// Number of undoable edits.
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new(10);
        history.record(1);
        history.record(2);

        let undone = history.take_undo().unwrap();
        history.push_redo(undone);
        assert!(history.can_redo());

        history.record(3);
        assert!(!history.can_redo());
        assert_eq!(history.undo_len(), 2);
    }

    #[test]
    fn test_push_undo_keeps_redo() {
        let mut history = History::new(10);
        history.record("a");
        history.record("b");

        let b = history.take_undo().unwrap();
        history.push_redo(b);
        let a = history.take_undo().unwrap();
        history.push_redo(a);

        let redone = history.take_redo().unwrap();
        assert_eq!(redone, "a");
        history.push_undo(redone);
        assert!(history.can_redo());
    }

    #[test]
    fn test_max_steps() {
        let mut history = History::new(3);
        for i in 0..4 {
            history.record(i);
        }

        // Oldest edit was evicted
        assert_eq!(history.take_undo(), Some(3));
        assert_eq!(history.take_undo(), Some(2));
        assert_eq!(history.take_undo(), Some(1));
        assert_eq!(history.take_undo(), None);
    }
}
