//! Bounded undo stack of full-surface snapshots.
//!
//! The stack always holds the pre-draw state at its floor, so undo can never
//! walk past a blank board. There is no redo; pushing after an undo discards
//! the undone states.

use crate::engine::CanvasSnapshot;

/// Upper bound on retained snapshots. The oldest entry is evicted beyond
/// this, which silently becomes the new undo floor.
pub const MAX_HISTORY: usize = 30;

/// Snapshot stack with a cursor at the current state.
#[derive(Default)]
pub struct History {
    snapshots: Vec<CanvasSnapshot>,
    cursor: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new current state. Any states undone past are dropped first.
    pub fn push(&mut self, snapshot: CanvasSnapshot) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(snapshot);
        if self.snapshots.len() > MAX_HISTORY {
            self.snapshots.remove(0);
        }
        self.cursor = self.snapshots.len() - 1;
    }

    /// Step back one state. `None` at the floor; undoing an empty history is
    /// a no-op.
    pub fn undo(&mut self) -> Option<&CanvasSnapshot> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.snapshots.get(self.cursor)
    }

    pub fn current(&self) -> Option<&CanvasSnapshot> {
        self.snapshots.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
