//! # History
//!
//! Linear undo/redo over a live document tree. Each commit diffs the tree against the memento at
//! the cursor and appends the result, discarding anything that had been undone. Undo and redo move
//! the cursor and roll the memento there back onto the tree.
//!
//! Index zero of the timeline is an empty sentinel, and can't be undone to. The first real commit
//! is index one. Calling [`History::undo`] or [`History::redo`] without checking
//! [`History::can_undo`]/[`History::can_redo`] first is a bug in the caller and panics.

mod memento;

pub use memento::Memento;

use std::sync::Arc;

use crate::node::DocumentNode;

pub struct History {
    timeline: Vec<Arc<Memento>>,
    /// Index of the currently applied memento. Always in bounds.
    cursor: usize,
}
impl Default for History {
    fn default() -> Self {
        Self {
            timeline: vec![Arc::new(Memento::empty())],
            cursor: 0,
        }
    }
}
impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Record the current state of `live`. Any redo-able mementos are discarded.
    pub fn commit(&mut self, live: &DocumentNode) {
        let discarded = self.timeline.len() - (self.cursor + 1);
        self.timeline.truncate(self.cursor + 1);
        let next = self.timeline[self.cursor].create_next(live);
        self.timeline.push(next);
        self.cursor += 1;
        log::debug!(
            "Commit {} ({} redo steps discarded)",
            self.cursor,
            discarded
        );
    }
    /// Step back one commit, rolling `live` back to match.
    ///
    /// # Panics
    /// If there is nothing to undo.
    pub fn undo(&mut self, live: &mut DocumentNode) {
        assert!(
            self.can_undo(),
            "undo at cursor {} of {}",
            self.cursor,
            self.timeline.len()
        );
        self.cursor -= 1;
        self.timeline[self.cursor].rollback(live);
        log::debug!("Undo to {}", self.cursor);
    }
    /// Step forward one commit, rolling `live` forward to match.
    ///
    /// # Panics
    /// If there is nothing to redo.
    pub fn redo(&mut self, live: &mut DocumentNode) {
        assert!(
            self.can_redo(),
            "redo at cursor {} of {}",
            self.cursor,
            self.timeline.len()
        );
        self.cursor += 1;
        self.timeline[self.cursor].rollback(live);
        log::debug!("Redo to {}", self.cursor);
    }
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 1
    }
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.timeline.len()
    }
    /// Number of mementos, including the sentinel. Never zero.
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.timeline.len()
    }
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }
    /// The memento at the cursor.
    #[must_use]
    pub fn current(&self) -> &Arc<Memento> {
        &self.timeline[self.cursor]
    }
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<Memento>> {
        self.timeline.get(index)
    }
    /// Has `live` diverged from the memento at the cursor? Before the first commit, this is
    /// always true.
    #[must_use]
    pub fn has_changes(&self, live: &DocumentNode) -> bool {
        !self.current().matches(live)
    }
}
