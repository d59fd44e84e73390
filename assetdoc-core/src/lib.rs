//! # assetdoc-core
//!
//! A generic document model for asset editors. Heterogeneous node kinds are registered at runtime
//! in a [`TypeRegistry`], arranged into a tree of [`DocumentNode`]s and [`Folder`]s, and edited in
//! place. A [`History`] of copy-on-write [`Memento`]s gives linear undo and redo over the whole tree.

pub mod history;
pub mod id;
pub mod node;
pub mod registry;
pub mod state;

#[cfg(test)]
pub(crate) mod test_kinds;

pub use history::{History, Memento};
pub use id::SessionID;
pub use node::{DocumentNode, Folder, NodeData, NodeKind, NodePath};
pub use registry::{TypeRegistry, TypeTag};
pub use state::{Document, DocumentID, DocumentProvider};
