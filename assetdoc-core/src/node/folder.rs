//! # Folders
//!
//! An ordered, owned collection of same-kind children under one node, plus its selection side table.

use std::sync::Arc;

use super::{DocumentNode, NodeKind, SelectionState};
use crate::registry::{TypeRegistry, TypeTag};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FolderError {
    #[error("folder holds {expected} but the node is {found}")]
    KindMismatch { expected: TypeTag, found: TypeTag },
    #[error("index {index} out of bounds for folder of length {len}")]
    OutOfBounds { index: usize, len: usize },
    #[error("node was constructed from a different registry")]
    ForeignRegistry,
}

#[derive(Clone)]
pub struct Folder {
    kind: TypeTag,
    /// Kind of the owning node. A back-reference only, the folder is owned by that node.
    owner: TypeTag,
    nodes: Vec<DocumentNode>,
    selection: SelectionState,
    registry: Arc<TypeRegistry>,
}
impl Folder {
    pub(crate) fn new(kind: TypeTag, owner: TypeTag, registry: Arc<TypeRegistry>) -> Self {
        Self {
            kind,
            owner,
            nodes: Vec::new(),
            selection: SelectionState::default(),
            registry,
        }
    }
    /// The kind of every child in this folder.
    #[must_use]
    pub fn kind(&self) -> TypeTag {
        self.kind
    }
    /// The kind of the node that owns this folder.
    #[must_use]
    pub fn owner(&self) -> TypeTag {
        self.owner
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, DocumentNode> {
        self.nodes.iter()
    }
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, DocumentNode> {
        self.nodes.iter_mut()
    }
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&DocumentNode> {
        self.nodes.get(index)
    }
    pub fn get_mut(&mut self, index: usize) -> Option<&mut DocumentNode> {
        self.nodes.get_mut(index)
    }
    /// Iterate every child viewed as `T`. Children that can't be viewed as `T` are skipped.
    pub fn iter_as<T: NodeKind>(&self) -> impl Iterator<Item = &T> + '_ {
        self.nodes.iter().filter_map(DocumentNode::data::<T>)
    }
    /// Access the data of the child at `index` as a `T`.
    ///
    /// # Panics
    /// If `index` is out of bounds or the child can't be viewed as `T`. The caller is expected to
    /// know the kind of the folder already - see [`Self::try_at`] otherwise.
    #[must_use]
    pub fn at<T: NodeKind>(&self, index: usize) -> &T {
        match self.try_at::<T>(index) {
            Ok(data) => data,
            Err(e) => panic!("Folder::at::<{}>: {e}", T::NAME),
        }
    }
    /// Mutable counterpart of [`Self::at`].
    ///
    /// # Panics
    /// Under the same conditions as [`Self::at`].
    pub fn at_mut<T: NodeKind>(&mut self, index: usize) -> &mut T {
        let len = self.nodes.len();
        let expected = self.kind;
        let Some(node) = self.nodes.get_mut(index) else {
            panic!(
                "Folder::at_mut::<{}>: {}",
                T::NAME,
                FolderError::OutOfBounds { index, len }
            );
        };
        let found = node.kind();
        match node.data_mut::<T>() {
            Some(data) => data,
            None => panic!(
                "Folder::at_mut::<{}>: {}",
                T::NAME,
                FolderError::KindMismatch { expected, found }
            ),
        }
    }
    /// Checked access to the data of the child at `index` as a `T`.
    pub fn try_at<T: NodeKind>(&self, index: usize) -> Result<&T, FolderError> {
        let node = self.nodes.get(index).ok_or(FolderError::OutOfBounds {
            index,
            len: self.nodes.len(),
        })?;
        node.data::<T>().ok_or(FolderError::KindMismatch {
            expected: self.registry.tag_of::<T>().unwrap_or(self.kind),
            found: node.kind(),
        })
    }
    /// Construct a default child of this folder's kind and append it.
    pub fn add(&mut self) -> &mut DocumentNode {
        let node = match self.registry.construct(self.kind, Some(self.owner)) {
            Ok(node) => node,
            // Folders are only ever made for registered kinds, and registries are frozen.
            Err(e) => panic!("folder of unconstructible kind: {e}"),
        };
        self.nodes.push(node);
        // Just pushed, can't be empty.
        let last = self.nodes.len() - 1;
        &mut self.nodes[last]
    }
    /// Append an existing node, which must be of this folder's kind. Returns its index.
    pub fn push(&mut self, node: DocumentNode) -> Result<usize, FolderError> {
        let index = self.nodes.len();
        self.insert(index, node)?;
        Ok(index)
    }
    /// Insert an existing node, which must be of this folder's kind, at `index`.
    pub fn insert(&mut self, index: usize, mut node: DocumentNode) -> Result<(), FolderError> {
        self.check_insertable(&node)?;
        if index > self.nodes.len() {
            return Err(FolderError::OutOfBounds {
                index,
                len: self.nodes.len(),
            });
        }
        node.set_parent_kind(Some(self.owner));
        self.nodes.insert(index, node);
        self.selection.on_inserted(index);
        Ok(())
    }
    /// Take ownership of the child at `index`, shifting later children down.
    pub fn remove(&mut self, index: usize) -> Option<DocumentNode> {
        if index >= self.nodes.len() {
            return None;
        }
        let mut node = self.nodes.remove(index);
        node.set_parent_kind(None);
        self.selection.on_removed(index);
        Some(node)
    }
    /// Swap two children. Returns false if either is out of bounds.
    pub fn swap(&mut self, a: usize, b: usize) -> bool {
        if a >= self.nodes.len() || b >= self.nodes.len() {
            return false;
        }
        self.nodes.swap(a, b);
        self.selection.on_swapped(a, b);
        true
    }
    /// Remove every child.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.selection.truncate(0);
    }
    fn check_insertable(&self, node: &DocumentNode) -> Result<(), FolderError> {
        if !Arc::ptr_eq(node.registry(), &self.registry) {
            return Err(FolderError::ForeignRegistry);
        }
        if node.kind() != self.kind {
            return Err(FolderError::KindMismatch {
                expected: self.kind,
                found: node.kind(),
            });
        }
        Ok(())
    }
    /// Grow with default children or shrink by truncation to exactly `len` children.
    pub(crate) fn resize(&mut self, len: usize) {
        if len < self.nodes.len() {
            self.nodes.truncate(len);
            self.selection.truncate(len);
        } else {
            self.nodes.reserve(len - self.nodes.len());
            while self.nodes.len() < len {
                self.add();
            }
        }
    }

    // Selection

    #[must_use]
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }
    #[must_use]
    pub fn is_selected(&self, index: usize) -> bool {
        self.selection.is_selected(index)
    }
    /// Select the child at `index`. Returns true if it was newly selected, false if it already was or
    /// is out of bounds.
    pub fn select(&mut self, index: usize) -> bool {
        index < self.nodes.len() && self.selection.select(index)
    }
    /// Deselect the child at `index`. Returns true if it was selected.
    pub fn deselect(&mut self, index: usize) -> bool {
        self.selection.deselect(index)
    }
    /// Flip the selection of the child at `index`. Returns the new state.
    pub fn toggle_selection(&mut self, index: usize) -> bool {
        if index < self.nodes.len() {
            self.selection.toggle(index)
        } else {
            false
        }
    }
    /// Range-select from the active child to `to`. Returns the number of newly selected children.
    ///
    /// A stale active child counts as no anchor: `to` alone is selected and becomes active.
    pub fn select_range(&mut self, to: usize) -> usize {
        if to >= self.nodes.len() {
            return 0;
        }
        if self.active_selection().is_none() {
            self.selection.set_active(None);
        }
        self.selection.select_range(to)
    }
    /// Clear the selection. The active selection does not change.
    ///
    /// Returns the number of selections prior to clearing.
    pub fn clear_selection(&mut self) -> usize {
        self.selection.clear()
    }
    #[must_use]
    pub fn selection_count(&self) -> usize {
        self.selection.count()
    }
    /// The active selection, or None if unset or no longer in range.
    #[must_use]
    pub fn active_selection(&self) -> Option<usize> {
        self.selection.active().filter(|&idx| idx < self.nodes.len())
    }
    /// Set the active selection, returning the previous one.
    pub fn set_active_selection(&mut self, index: Option<usize>) -> Option<usize> {
        self.selection.set_active(index)
    }
}
impl std::fmt::Debug for Folder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Folder")
            .field("kind", &self.registry.name_of(self.kind).unwrap_or("?"))
            .field("nodes", &self.nodes)
            .field("selection", &self.selection)
            .finish()
    }
}
impl<'a> IntoIterator for &'a Folder {
    type Item = &'a DocumentNode;
    type IntoIter = std::slice::Iter<'a, DocumentNode>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
