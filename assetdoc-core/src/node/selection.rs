//! # Selection
//!
//! Per-folder record of which children are selected, and which one is "active" (the anchor of the most
//! recent explicit selection, used for range selection). This is session state for the editor: it
//! is not captured by history.
//!
//! Indices here are positions within the owning folder. The folder keeps them consistent as children
//! are inserted, removed and swapped. The active index is allowed to point outside of the folder, in
//! which case it reads as none.

use std::collections::BTreeSet;

#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct SelectionState {
    selected: BTreeSet<usize>,
    active: Option<usize>,
}
impl SelectionState {
    #[must_use]
    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }
    /// Select an index. Returns true if it was not already selected.
    pub fn select(&mut self, index: usize) -> bool {
        self.selected.insert(index)
    }
    /// Deselect an index. Returns true if it was selected.
    pub fn deselect(&mut self, index: usize) -> bool {
        self.selected.remove(&index)
    }
    /// Flip the selection of an index, ctrl-click style. Returns the new selection state.
    pub fn toggle(&mut self, index: usize) -> bool {
        if self.deselect(index) {
            false
        } else {
            self.select(index)
        }
    }
    /// Select every index between the active anchor and `to`, inclusive, shift-click style.
    /// With no anchor, this selects `to` alone and makes it the anchor.
    ///
    /// Returns the number of newly selected indices.
    pub fn select_range(&mut self, to: usize) -> usize {
        let anchor = match self.active {
            Some(anchor) => anchor,
            None => {
                self.active = Some(to);
                to
            }
        };
        let (low, high) = if anchor <= to {
            (anchor, to)
        } else {
            (to, anchor)
        };
        (low..=high).filter(|&idx| self.selected.insert(idx)).count()
    }
    /// Deselect everything. The active index is left as-is.
    ///
    /// Returns the number of selections prior to clearing.
    pub fn clear(&mut self) -> usize {
        let count = self.selected.len();
        self.selected.clear();
        count
    }
    /// The raw active index, which may be stale.
    #[must_use]
    pub fn active(&self) -> Option<usize> {
        self.active
    }
    /// Set the active index, returning the previous one.
    pub fn set_active(&mut self, active: Option<usize>) -> Option<usize> {
        std::mem::replace(&mut self.active, active)
    }
    /// Selected indices, ascending.
    pub fn selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected.iter().copied()
    }
    #[must_use]
    pub fn count(&self) -> usize {
        self.selected.len()
    }

    // Bookkeeping for the folder, as its children move around.

    pub(crate) fn on_inserted(&mut self, index: usize) {
        self.selected = self
            .selected
            .iter()
            .map(|&idx| if idx >= index { idx + 1 } else { idx })
            .collect();
        if let Some(active) = self.active.as_mut() {
            if *active >= index {
                *active += 1;
            }
        }
    }
    pub(crate) fn on_removed(&mut self, index: usize) {
        self.selected = self
            .selected
            .iter()
            .filter(|&&idx| idx != index)
            .map(|&idx| if idx > index { idx - 1 } else { idx })
            .collect();
        self.active = match self.active {
            Some(active) if active == index => None,
            Some(active) if active > index => Some(active - 1),
            other => other,
        };
    }
    pub(crate) fn on_swapped(&mut self, a: usize, b: usize) {
        let (has_a, has_b) = (self.is_selected(a), self.is_selected(b));
        if has_a != has_b {
            self.selected.remove(if has_a { &a } else { &b });
            self.selected.insert(if has_a { b } else { a });
        }
        self.active = match self.active {
            Some(active) if active == a => Some(b),
            Some(active) if active == b => Some(a),
            other => other,
        };
    }
    /// Drop everything at or past `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.selected.retain(|&idx| idx < len);
        if self.active.is_some_and(|active| active >= len) {
            self.active = None;
        }
    }
}

#[cfg(test)]
mod test {
    use super::SelectionState;

    #[test]
    fn range_from_anchor() {
        let mut state = SelectionState::default();
        state.select(5);
        state.set_active(Some(5));
        assert_eq!(state.select_range(2), 3);
        assert_eq!(state.selected().collect::<Vec<_>>(), [2, 3, 4, 5]);
        // Anchor doesn't move on a range select.
        assert_eq!(state.active(), Some(5));
    }
    #[test]
    fn range_without_anchor() {
        let mut state = SelectionState::default();
        assert_eq!(state.select_range(3), 1);
        assert_eq!(state.active(), Some(3));
    }
    #[test]
    fn toggle() {
        let mut state = SelectionState::default();
        assert!(state.toggle(1));
        assert!(state.is_selected(1));
        assert!(!state.toggle(1));
        assert!(!state.is_selected(1));
    }
    #[test]
    fn shifting() {
        let mut state = SelectionState::default();
        state.select(1);
        state.select(3);
        state.set_active(Some(3));

        state.on_inserted(2);
        assert_eq!(state.selected().collect::<Vec<_>>(), [1, 4]);
        assert_eq!(state.active(), Some(4));

        state.on_removed(1);
        assert_eq!(state.selected().collect::<Vec<_>>(), [3]);
        assert_eq!(state.active(), Some(3));

        state.on_removed(3);
        assert_eq!(state.count(), 0);
        assert_eq!(state.active(), None);
    }
    #[test]
    fn swapping() {
        let mut state = SelectionState::default();
        state.select(0);
        state.set_active(Some(0));
        state.on_swapped(0, 2);
        assert_eq!(state.selected().collect::<Vec<_>>(), [2]);
        assert_eq!(state.active(), Some(2));
    }
}
