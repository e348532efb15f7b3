//! Undo/redo history for annotation editors.
//!
//! Editors keep their mutable state in a plain cloneable value (keypoints
//! plus connections, or a shape list) and push a copy of it here before
//! every mutation. Undo swaps the current value with the most recent
//! snapshot; redo reverses that.

/// Default number of snapshots kept before the oldest is dropped.
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Configuration for the undo stack
#[derive(Debug, Clone, Copy)]
pub struct UndoConfig {
    /// Maximum number of snapshots to keep in history
    pub max_history: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

/// How an editor reverts changes.
///
/// An editor picks one policy at construction and keeps it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndoPolicy {
    /// Full snapshot history with redo.
    #[default]
    Snapshot,
    /// Undo only removes the most recent append; no redo.
    PopLast,
}

/// Snapshot-based undo stack for any cloneable state.
///
/// Maintains two stacks:
/// - `undo_stack`: states to go back to (most recent at the end)
/// - `redo_stack`: states undone, available for redo (most recent at the end)
///
/// Pushing a new snapshot clears the redo stack.
#[derive(Debug, Clone)]
pub struct UndoStack<T: Clone> {
    undo_stack: Vec<T>,
    redo_stack: Vec<T>,
    config: UndoConfig,
}

impl<T: Clone> Default for UndoStack<T> {
    fn default() -> Self {
        Self::with_config(UndoConfig::default())
    }
}

impl<T: Clone> UndoStack<T> {
    /// Create a new empty undo stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: UndoConfig) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            config,
        }
    }

    /// Record `current` before it is mutated (call this BEFORE making a change).
    ///
    /// This clears the redo stack since a new change invalidates the redo history.
    pub fn snapshot(&mut self, current: &T) {
        self.undo_stack.push(current.clone());
        self.redo_stack.clear();

        while self.undo_stack.len() > self.config.max_history.max(1) {
            self.undo_stack.remove(0);
        }
        log::trace!("Undo: snapshot taken ({} in history)", self.undo_stack.len());
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Restore the most recent snapshot into `state`.
    ///
    /// The replaced value moves to the redo stack. Returns false when
    /// there is nothing to undo, leaving `state` untouched.
    pub fn undo(&mut self, state: &mut T) -> bool {
        let Some(previous) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(std::mem::replace(state, previous));
        log::debug!("Undo ({} left)", self.undo_stack.len());
        true
    }

    /// Re-apply the most recently undone state into `state`.
    ///
    /// Returns false when there is nothing to redo.
    pub fn redo(&mut self, state: &mut T) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(std::mem::replace(state, next));
        log::debug!("Redo ({} left)", self.redo_stack.len());
        true
    }

    /// Get number of undo steps available
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get number of redo steps available
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        log::debug!("Undo history cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_stack_basic() {
        let mut stack: UndoStack<Vec<u32>> = UndoStack::new();
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());

        let mut state = vec![1];
        stack.snapshot(&state);
        state.push(2);
        assert!(stack.can_undo());
        assert!(!stack.can_redo());

        assert!(stack.undo(&mut state));
        assert_eq!(state, vec![1]);
        assert!(!stack.can_undo());
        assert!(stack.can_redo());

        assert!(stack.redo(&mut state));
        assert_eq!(state, vec![1, 2]);
        assert!(stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_empty_undo_and_redo_are_noops() {
        let mut stack: UndoStack<u32> = UndoStack::new();
        let mut state = 7;
        assert!(!stack.undo(&mut state));
        assert!(!stack.redo(&mut state));
        assert_eq!(state, 7);
    }

    #[test]
    fn test_snapshot_clears_redo() {
        let mut stack = UndoStack::new();
        let mut state = String::from("a");

        stack.snapshot(&state);
        state.push('b');
        stack.undo(&mut state);
        assert!(stack.can_redo());

        stack.snapshot(&state);
        state.push('c');
        assert!(!stack.can_redo());
        assert!(!stack.redo(&mut state));
        assert_eq!(state, "ac");
    }

    #[test]
    fn test_multi_level_round_trip() {
        let mut stack = UndoStack::new();
        let mut state = 0;
        for next in 1..=3 {
            stack.snapshot(&state);
            state = next;
        }

        assert!(stack.undo(&mut state));
        assert!(stack.undo(&mut state));
        assert_eq!(state, 1);
        assert!(stack.redo(&mut state));
        assert_eq!(state, 2);
        assert!(stack.redo(&mut state));
        assert_eq!(state, 3);
        assert!(!stack.redo(&mut state));
    }

    #[test]
    fn test_max_history() {
        let mut stack = UndoStack::with_config(UndoConfig { max_history: 3 });
        let mut state = 0;
        for i in 1..=5 {
            stack.snapshot(&state);
            state = i;
        }
        assert_eq!(stack.undo_count(), 3);

        while stack.undo(&mut state) {}
        assert_eq!(state, 2);
    }
}
