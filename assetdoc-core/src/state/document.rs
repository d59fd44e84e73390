use std::sync::Arc;

use crate::history::History;
use crate::node::DocumentNode;
use crate::registry::{RegistryError, TypeRegistry, TypeTag};

pub type ID = crate::SessionID<Document>;

/// An open document: a live tree and its undo history.
pub struct Document {
    id: ID,
    /// The path from which the file was loaded or saved, or None if opened as new.
    pub path: Option<std::path::PathBuf>,
    /// Name of the document, inferred from its path or generated.
    pub name: String,
    root: DocumentNode,
    history: History,
}
impl Document {
    /// Open a document around an existing tree. Its initial state is committed, so every later edit
    /// can be undone.
    #[must_use]
    pub fn new(root: DocumentNode) -> Self {
        let mut history = History::new();
        history.commit(&root);
        Self {
            id: ID::default(),
            path: None,
            name: "New Document".into(),
            root,
            history,
        }
    }
    /// Open a new document rooted at a default constructed `root_kind`.
    pub fn with_root_kind(
        registry: &Arc<TypeRegistry>,
        root_kind: TypeTag,
    ) -> Result<Self, RegistryError> {
        registry.construct(root_kind, None).map(Self::new)
    }
    #[must_use]
    pub fn id(&self) -> ID {
        self.id
    }
    #[must_use]
    pub fn root(&self) -> &DocumentNode {
        &self.root
    }
    /// Edit the live tree. Edits aren't recorded until [`Self::commit`].
    pub fn root_mut(&mut self) -> &mut DocumentNode {
        &mut self.root
    }
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }
    pub fn commit(&mut self) {
        self.history.commit(&self.root);
    }
    /// Commit only if the tree differs from the last commit. Returns whether a commit happened.
    pub fn commit_if_changed(&mut self) -> bool {
        let changed = self.is_dirty();
        if changed {
            self.commit();
        }
        changed
    }
    /// # Panics
    /// If there's nothing to undo, see [`Self::can_undo`].
    pub fn undo(&mut self) {
        self.history.undo(&mut self.root);
    }
    /// # Panics
    /// If there's nothing to redo, see [`Self::can_redo`].
    pub fn redo(&mut self) {
        self.history.redo(&mut self.root);
    }
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
    /// Are there uncommitted edits?
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.history.has_changes(&self.root)
    }
}
