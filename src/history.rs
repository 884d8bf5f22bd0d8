use crate::board::{Board, Color, Piece};

/// Copy of the mutable game fields, taken right before a transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub board: Board,
    pub turn: Color,
    pub is_over: bool,
    pub pending_promotion: Option<Piece>,
    pub casualties: Vec<Piece>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
}

impl History {
    /// Stores the state preceding a new transition. Any undone future is dropped.
    pub fn record(&mut self, snapshot: Snapshot) {
        self.undo_stack.push(snapshot);
        if !self.redo_stack.is_empty() {
            log::debug!("Dropping {} redo entries", self.redo_stack.len());
            self.redo_stack.clear();
        }
    }

    /// Pops the last recorded state, parking `current` on the redo stack.
    /// Returns `None` and leaves both stacks alone when there is nothing to undo.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(next)
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }
}
