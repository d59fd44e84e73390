//! # Mementos
//!
//! Immutable snapshots of a node subtree's data. A memento is produced by diffing the live tree
//! against the previous memento: own-data that compares equal is shared by `Arc` rather than copied,
//! and whole subtrees that didn't change are reused outright. Memory per commit is thus proportional
//! to what changed, not to the size of the document.
//!
//! Children are matched up by *position* within their folder. Inserting near the front of a folder
//! makes every later sibling look changed. That costs extra snapshots, never correctness.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::node::{DocumentNode, NodeData};
use crate::registry::TypeTag;

pub struct Memento {
    /// None only for uncaptured placeholders.
    kind: Option<TypeTag>,
    data: Option<Arc<dyn NodeData>>,
    /// Child snapshots by position. May hold empty entries for folders that were deleted,
    /// which are absent from `lut`.
    folders: BTreeMap<TypeTag, Vec<Arc<Memento>>>,
    /// Folders present on the node at capture time.
    lut: BTreeSet<TypeTag>,
    /// The memento this one was diffed from.
    previous: Option<Arc<Memento>>,
}
impl Memento {
    /// A placeholder capturing nothing. Diffing anything against it snapshots everything.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            kind: None,
            data: None,
            folders: BTreeMap::new(),
            lut: BTreeSet::new(),
            previous: None,
        }
    }
    /// Snapshot a tree from scratch.
    #[must_use]
    pub fn capture(live: &DocumentNode) -> Arc<Self> {
        Arc::new(Self::empty()).create_next(live)
    }
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.kind.is_none()
    }
    /// Diff `live` against this memento, producing the memento of its current state.
    ///
    /// If nothing at all changed, this returns `self` again.
    #[must_use]
    pub fn create_next(self: &Arc<Self>, live: &DocumentNode) -> Arc<Self> {
        let (data, data_unchanged) = match &self.data {
            Some(data) if self.kind == Some(live.kind()) && live.data_eq(data.as_ref()) => {
                (Arc::clone(data), true)
            }
            _ => {
                log::trace!("snapshotting changed {}", live.kind_name());
                (live.snapshot_data(), false)
            }
        };

        let lut: BTreeSet<TypeTag> = live.folder_tags().collect();
        let mut unchanged = data_unchanged && lut == self.lut;
        let mut folders = BTreeMap::new();
        // Deleted folders keep an empty entry, but leave the lut.
        for &deleted in self.lut.difference(&lut) {
            log::trace!("folder {deleted} deleted");
            folders.insert(deleted, Vec::new());
        }
        for folder in live.folders() {
            let previous = self.children(folder.kind());
            if previous.len() != folder.len() {
                log::trace!(
                    "folder {} resized {} -> {}",
                    folder.kind(),
                    previous.len(),
                    folder.len()
                );
                unchanged = false;
            }
            let children: Vec<_> = folder
                .iter()
                .enumerate()
                .map(|(idx, child)| match previous.get(idx) {
                    Some(previous) => previous.create_next(child),
                    None => Self::capture(child),
                })
                .collect();
            unchanged = unchanged
                && children
                    .iter()
                    .zip(previous)
                    .all(|(new, old)| Arc::ptr_eq(new, old));
            folders.insert(folder.kind(), children);
        }

        if unchanged {
            return Arc::clone(self);
        }
        Arc::new(Self {
            kind: Some(live.kind()),
            data: Some(data),
            folders,
            lut,
            previous: (!self.is_placeholder()).then(|| Arc::clone(self)),
        })
    }
    /// Mutate `live` in place to match this memento.
    ///
    /// Nodes whose data already compares equal are left alone. Folders are added, removed, grown
    /// and truncated to match the captured shape. Selections are not versioned, entries past the
    /// end of a shrunken folder are dropped.
    pub fn rollback(&self, live: &mut DocumentNode) {
        let (Some(kind), Some(data)) = (self.kind, self.data.as_deref()) else {
            debug_assert!(false, "rollback onto a placeholder memento");
            log::warn!("Ignoring rollback onto a placeholder memento");
            return;
        };
        if live.kind() != kind {
            log::trace!("replacing {} with a fresh {kind}", live.kind_name());
            match live.registry().construct(kind, live.parent_kind()) {
                Ok(fresh) => *live = fresh,
                Err(err) => {
                    log::warn!("Can't roll back a node of kind {kind}: {err}");
                    return;
                }
            }
        }
        if !live.data_eq(data) {
            log::trace!("restoring {}", live.kind_name());
            live.restore_data(data);
        }

        let stale: Vec<TypeTag> = live
            .folder_tags()
            .filter(|tag| !self.lut.contains(tag))
            .collect();
        for tag in stale {
            log::trace!("removing folder {tag}");
            live.remove_folder(tag);
        }
        for &tag in &self.lut {
            let children = self.children(tag);
            let folder = live.folder_entry(tag);
            folder.resize(children.len());
            let owner = folder.owner();
            for (node, memento) in folder.iter_mut().zip(children) {
                memento.rollback(node);
                node.set_parent_kind(Some(owner));
            }
        }
    }
    /// Does `live` hold exactly the state captured here? Allocation free.
    #[must_use]
    pub fn matches(&self, live: &DocumentNode) -> bool {
        let data_matches = self.kind == Some(live.kind())
            && self.data.as_deref().is_some_and(|data| live.data_eq(data));
        data_matches
            && live.folder_count() == self.lut.len()
            && live.folders().all(|folder| {
                let children = self.children(folder.kind());
                self.lut.contains(&folder.kind())
                    && children.len() == folder.len()
                    && children
                        .iter()
                        .zip(folder.iter())
                        .all(|(memento, node)| memento.matches(node))
            })
    }
    #[must_use]
    pub fn kind(&self) -> Option<TypeTag> {
        self.kind
    }
    #[must_use]
    pub fn data(&self) -> Option<&dyn NodeData> {
        self.data.as_deref()
    }
    /// Snapshots of the children in the folder for exactly `kind`. Empty if there was no such folder.
    #[must_use]
    pub fn children(&self, kind: TypeTag) -> &[Arc<Memento>] {
        self.folders.get(&kind).map_or(&[], Vec::as_slice)
    }
    /// Kinds of the folders present at capture time.
    pub fn folder_tags(&self) -> impl Iterator<Item = TypeTag> + '_ {
        self.lut.iter().copied()
    }
    #[must_use]
    pub fn previous(&self) -> Option<&Arc<Memento>> {
        self.previous.as_ref()
    }
    /// Is own-data the very same allocation, rather than merely equal?
    #[must_use]
    pub fn shares_data_with(&self, other: &Memento) -> bool {
        match (&self.data, &other.data) {
            (Some(a), Some(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            _ => false,
        }
    }
}
impl Drop for Memento {
    fn drop(&mut self) {
        // `previous` chains grow by one per commit. Unlink iteratively rather than letting the
        // default drop recurse down the whole chain.
        let mut next = self.previous.take();
        while let Some(previous) = next {
            next = match Arc::try_unwrap(previous) {
                Ok(mut previous) => previous.previous.take(),
                // Still referenced elsewhere, the rest of the chain lives on.
                Err(_) => None,
            };
        }
    }
}
impl std::fmt::Debug for Memento {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memento")
            .field("kind", &self.kind)
            .field("data", &self.data)
            .field("folders", &self.folders)
            .field("lut", &self.lut)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_kinds::{self, Bone, Model, Scene, Texture};

    /// Scene with three models, the middle one holding two bones.
    fn tree() -> DocumentNode {
        let registry = test_kinds::registry();
        let mut scene = registry
            .construct(registry.tag_of::<Scene>().unwrap(), None)
            .unwrap();
        for name in ["left", "middle", "right"] {
            let model = scene.add_child::<Model>().unwrap();
            model.data_mut::<Model>().unwrap().name = name.into();
        }
        let middle = scene.folder_of_mut::<Model>().unwrap().get_mut(1).unwrap();
        middle.add_child::<Bone>().unwrap();
        middle.add_child::<Bone>().unwrap();
        scene
    }
    fn models(node: &DocumentNode) -> Vec<String> {
        node.children::<Model>().map(|m| m.name.clone()).collect()
    }

    #[test]
    fn round_trip() {
        let mut live = tree();
        let memento = Memento::capture(&live);
        assert!(memento.matches(&live));

        // Mangle it thoroughly.
        live.data_mut::<Scene>().unwrap().name = "renamed".into();
        let models_folder = live.folder_of_mut::<Model>().unwrap();
        models_folder.remove(0);
        models_folder.at_mut::<Model>(0).scale = 3.0;
        models_folder.get_mut(0).unwrap().add_child::<Bone>().unwrap();
        live.add_child::<Texture>().unwrap();
        assert!(!memento.matches(&live));

        memento.rollback(&mut live);
        assert!(memento.matches(&live));
        assert_eq!(models(&live), ["left", "middle", "right"]);
        assert_eq!(live.node_count(), 6);
        assert!(live.folder_of::<Texture>().is_none());
        // Nothing differs, so diffing again hands back the same memento.
        assert!(Arc::ptr_eq(&memento.create_next(&live), &memento));
    }
    #[test]
    fn unchanged_data_is_shared() {
        let mut live = tree();
        let first = Memento::capture(&live);
        let model = live.registry().tag_of::<Model>().unwrap();
        live.folder_of_mut::<Model>().unwrap().at_mut::<Model>(2).scale = 5.0;
        let second = first.create_next(&live);

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.shares_data_with(&first));
        assert!(Arc::ptr_eq(second.previous().unwrap(), &first));
        let (old, new) = (first.children(model), second.children(model));
        // Untouched subtrees are reused whole, the changed one is not.
        assert!(Arc::ptr_eq(&old[0], &new[0]));
        assert!(Arc::ptr_eq(&old[1], &new[1]));
        assert!(!Arc::ptr_eq(&old[2], &new[2]));
        assert!(!new[2].shares_data_with(&old[2]));
    }
    #[test]
    fn deleted_folder() {
        let mut live = tree();
        let first = Memento::capture(&live);
        let model = live.registry().tag_of::<Model>().unwrap();
        live.remove_folder(model);

        let second = first.create_next(&live);
        assert_eq!(second.folder_tags().count(), 0);
        assert!(second.children(model).is_empty());
        assert!(second.matches(&live));

        first.rollback(&mut live);
        assert_eq!(models(&live), ["left", "middle", "right"]);
        second.rollback(&mut live);
        assert!(!live.has_folder(model));
    }
    #[test]
    fn grow_restores_values() {
        let mut live = tree();
        let memento = Memento::capture(&live);
        live.folder_of_mut::<Model>().unwrap().clear();
        memento.rollback(&mut live);
        assert_eq!(models(&live), ["left", "middle", "right"]);
        let scene = live.kind();
        let middle = live.folder_of::<Model>().unwrap().get(1).unwrap();
        assert_eq!(middle.children::<Bone>().count(), 2);
        assert_eq!(middle.parent_kind(), Some(scene));
    }
    #[test]
    fn kind_replacement() {
        let registry = test_kinds::registry();
        let mut live = registry
            .construct(registry.tag_of::<Model>().unwrap(), None)
            .unwrap();
        live.data_mut::<Model>().unwrap().name = "hero".into();
        let memento = Memento::capture(&live);

        live = registry
            .construct(registry.tag_of::<Texture>().unwrap(), None)
            .unwrap();
        assert!(!memento.matches(&live));
        memento.rollback(&mut live);
        assert_eq!(live.data::<Model>().map(|m| m.name.as_str()), Some("hero"));
    }
    #[test]
    fn shrinking_prunes_selection() {
        let mut live = tree();
        let memento = Memento::capture(&live);
        let folder = live.folder_of_mut::<Model>().unwrap();
        folder.add();
        folder.select(1);
        folder.select(3);
        folder.set_active_selection(Some(3));

        memento.rollback(&mut live);
        let folder = live.folder_of::<Model>().unwrap();
        assert_eq!(folder.len(), 3);
        assert_eq!(folder.selection().selected().collect::<Vec<_>>(), [1]);
        assert_eq!(folder.active_selection(), None);
    }
    #[test]
    fn long_chain_drops() {
        let registry = test_kinds::registry();
        let mut live = registry
            .construct(registry.tag_of::<Scene>().unwrap(), None)
            .unwrap();
        let mut memento = Memento::capture(&live);
        for i in 0..100_000 {
            live.data_mut::<Scene>().unwrap().name = i.to_string();
            memento = memento.create_next(&live);
        }
        assert!(memento.previous().is_some());
        drop(memento);
    }
}
