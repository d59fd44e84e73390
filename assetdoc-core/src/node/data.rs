//! # Node data
//!
//! The "own data" of a node: its value attributes, excluding any children. Concrete asset kinds
//! implement [`NodeKind`], and get the type-erased [`NodeData`] capabilities for free.

use std::any::Any;
use std::sync::Arc;

/// A concrete kind of document node, such as a model, material or bone.
///
/// Only the node's own values belong in here. Children are stored by the
/// [`DocumentNode`](super::DocumentNode) in folders, never inline.
pub trait NodeKind: Clone + PartialEq + Default + std::fmt::Debug + Send + Sync + 'static {
    /// Stable, human readable name of the kind. Must be unique within a registry.
    const NAME: &'static str;
}

/// Type-erased capabilities the history needs from every node's own data.
///
/// Implemented for every [`NodeKind`]. Editor code rarely needs this directly, prefer the typed
/// accessors on [`DocumentNode`](super::DocumentNode).
pub trait NodeData: Any + std::fmt::Debug + Send + Sync {
    fn kind_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Extract an immutable, shareable copy of the own data.
    fn snapshot(&self) -> Arc<dyn NodeData>;
    fn boxed_clone(&self) -> Box<dyn NodeData>;
    /// Value equality of own data. Data of differing kinds is never equal.
    fn same_as(&self, other: &dyn NodeData) -> bool;
    /// Overwrite own data from `other`. Returns false, leaving `self` untouched, if the kinds differ.
    fn restore_from(&mut self, other: &dyn NodeData) -> bool;
}

impl<T: NodeKind> NodeData for T {
    fn kind_name(&self) -> &'static str {
        T::NAME
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn snapshot(&self) -> Arc<dyn NodeData> {
        Arc::new(self.clone())
    }
    fn boxed_clone(&self) -> Box<dyn NodeData> {
        Box::new(self.clone())
    }
    fn same_as(&self, other: &dyn NodeData) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }
    fn restore_from(&mut self, other: &dyn NodeData) -> bool {
        match other.as_any().downcast_ref::<T>() {
            Some(other) => {
                self.clone_from(other);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::NodeData;
    use crate::test_kinds::{Model, Texture};

    #[test]
    fn compare_and_restore() {
        let mut a = Model {
            name: "body".into(),
            scale: 1.0,
        };
        let b = Model {
            name: "head".into(),
            scale: 2.0,
        };
        assert!(!a.same_as(&b));
        assert!(a.restore_from(&b));
        assert!(a.same_as(&b));
    }
    #[test]
    fn mismatched_kinds() {
        let mut model = Model::default();
        let texture = Texture::default();
        assert!(!model.same_as(&texture));
        assert!(!model.restore_from(&texture));
        assert_eq!(model, Model::default());
    }
    #[test]
    fn snapshot_is_independent() {
        let mut model = Model::default();
        let snap = model.snapshot();
        model.name.push_str("changed");
        assert!(!model.same_as(snap.as_ref()));
        assert_eq!(snap.kind_name(), "Model");
    }
}
