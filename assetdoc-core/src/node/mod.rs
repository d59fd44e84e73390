//! # Document nodes
//!
//! The live, mutable document tree. Every node owns its type-erased own-data and zero or more
//! [`Folder`]s of children, keyed by the kind of child they hold. Ownership is strictly a tree: a node
//! lives in exactly one folder (or is a root), and cloning a node deep-clones everything below it.
//!
//! Folder lookup is aware of the registry's kind relationships. Asking for a folder of some kind will
//! settle for a folder of a related kind when no exact match exists, see [`DocumentNode::get_folder`].

mod data;
mod folder;
mod path;
mod selection;

pub use data::{NodeData, NodeKind};
pub use folder::{Folder, FolderError};
pub use path::{DisplayPath, NodePath, PathError, PathStep};
pub use selection::SelectionState;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::registry::{RegistryError, TypeRegistry, TypeTag};

pub struct DocumentNode {
    kind: TypeTag,
    data: Box<dyn NodeData>,
    // Ordered by tag, so iteration order is stable.
    folders: BTreeMap<TypeTag, Folder>,
    /// Kind of the node owning this one, None at a root. Never used for ownership.
    parent: Option<TypeTag>,
    registry: Arc<TypeRegistry>,
}
impl DocumentNode {
    pub(crate) fn from_parts(
        kind: TypeTag,
        data: Box<dyn NodeData>,
        parent: Option<TypeTag>,
        registry: Arc<TypeRegistry>,
    ) -> Self {
        Self {
            kind,
            data,
            folders: BTreeMap::new(),
            parent,
            registry,
        }
    }
    #[must_use]
    pub fn kind(&self) -> TypeTag {
        self.kind
    }
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        self.data.kind_name()
    }
    /// The kind of the node that owns this one, or None if this is a root or detached.
    #[must_use]
    pub fn parent_kind(&self) -> Option<TypeTag> {
        self.parent
    }
    pub(crate) fn set_parent_kind(&mut self, parent: Option<TypeTag>) {
        self.parent = parent;
    }
    #[must_use]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }
    /// The own data, type-erased.
    #[must_use]
    pub fn data_dyn(&self) -> &dyn NodeData {
        self.data.as_ref()
    }
    /// View own data as a `T`. Works for the node's exact kind, and for any kind it is-a.
    #[must_use]
    pub fn data<T: NodeKind>(&self) -> Option<&T> {
        self.registry.view::<T>(self.kind, self.data.as_any())
    }
    pub fn data_mut<T: NodeKind>(&mut self) -> Option<&mut T> {
        self.registry.view_mut::<T>(self.kind, self.data.as_any_mut())
    }

    // History capabilities

    /// Extract a copy of own data, not including children.
    #[must_use]
    pub fn snapshot_data(&self) -> Arc<dyn NodeData> {
        self.data.snapshot()
    }
    /// Overwrite own data, leaving children untouched. Returns false if `from` is of another kind.
    pub fn restore_data(&mut self, from: &dyn NodeData) -> bool {
        self.data.restore_from(from)
    }
    /// Compare own data, ignoring children.
    #[must_use]
    pub fn data_eq(&self, other: &dyn NodeData) -> bool {
        self.data.same_as(other)
    }

    // Folders

    /// Find the folder for `kind`.
    ///
    /// An exact match wins. Otherwise, the registered parents of `kind` are searched, then its
    /// children, recursively and in registration order. So, with "Material is-a Texture" registered,
    /// asking a node that only has Materials for its Textures finds the Material folder.
    #[must_use]
    pub fn get_folder(&self, kind: TypeTag) -> Option<&Folder> {
        self.get_folder_restricted(kind, false, false)
    }
    /// [`Self::get_folder`], optionally restricted from searching parent or child kinds.
    #[must_use]
    pub fn get_folder_restricted(
        &self,
        kind: TypeTag,
        searched_from_parent: bool,
        searched_from_child: bool,
    ) -> Option<&Folder> {
        let resolved = self.resolve_folder(kind, searched_from_parent, searched_from_child)?;
        self.folders.get(&resolved)
    }
    pub fn get_folder_mut(&mut self, kind: TypeTag) -> Option<&mut Folder> {
        let resolved = self.resolve_folder(kind, false, false)?;
        self.folders.get_mut(&resolved)
    }
    fn resolve_folder(
        &self,
        kind: TypeTag,
        searched_from_parent: bool,
        searched_from_child: bool,
    ) -> Option<TypeTag> {
        if self.folders.contains_key(&kind) {
            return Some(kind);
        }
        let relationships = self.registry.lookup_relationships(kind)?;
        if !searched_from_child {
            for &parent in relationships.parents {
                assert_ne!(parent, kind, "kind registered as its own parent");
                if let Some(found) = self.resolve_folder(parent, true, false) {
                    return Some(found);
                }
            }
        }
        if !searched_from_parent {
            // The folder may be of a more specialized kind.
            for &child in relationships.children {
                assert_ne!(child, kind, "kind registered as its own child");
                if let Some(found) = self.resolve_folder(child, false, true) {
                    return Some(found);
                }
            }
        }
        None
    }
    /// The folder of exactly `kind`, ignoring kind relationships.
    #[must_use]
    pub fn folder(&self, kind: TypeTag) -> Option<&Folder> {
        self.folders.get(&kind)
    }
    pub fn folder_mut(&mut self, kind: TypeTag) -> Option<&mut Folder> {
        self.folders.get_mut(&kind)
    }
    #[must_use]
    pub fn has_folder(&self, kind: TypeTag) -> bool {
        self.folders.contains_key(&kind)
    }
    /// Get the folder that [`Self::get_folder`] resolves, or add an empty one of exactly `kind`.
    ///
    /// # Panics
    /// If `kind` is not registered.
    pub fn get_or_add_folder(&mut self, kind: TypeTag) -> &mut Folder {
        let resolved = self.resolve_folder(kind, false, false).unwrap_or(kind);
        self.folder_entry(resolved)
    }
    /// Add an empty folder of `kind`.
    ///
    /// The caller must have made sure no folder of exactly `kind` exists. In debug builds that's
    /// asserted; otherwise the existing folder is returned untouched.
    ///
    /// # Panics
    /// If `kind` is not registered.
    pub fn add_folder(&mut self, kind: TypeTag) -> &mut Folder {
        debug_assert!(
            !self.folders.contains_key(&kind),
            "add_folder: {kind} already exists"
        );
        self.folder_entry(kind)
    }
    /// The folder of exactly `kind`, added if missing. Unlike [`Self::get_or_add_folder`], related
    /// kinds are not considered.
    ///
    /// # Panics
    /// If `kind` is not registered.
    pub fn folder_entry(&mut self, kind: TypeTag) -> &mut Folder {
        assert!(
            self.registry.contains(kind),
            "folder for unregistered kind {kind}"
        );
        let owner = self.kind;
        let registry = &self.registry;
        self.folders
            .entry(kind)
            .or_insert_with(|| Folder::new(kind, owner, Arc::clone(registry)))
    }
    /// Remove the folder of exactly `kind`, and all of its children.
    pub fn remove_folder(&mut self, kind: TypeTag) -> Option<Folder> {
        self.folders.remove(&kind)
    }
    /// Kinds of every folder present, in tag order.
    pub fn folder_tags(&self) -> impl Iterator<Item = TypeTag> + '_ {
        self.folders.keys().copied()
    }
    pub fn folders(&self) -> impl Iterator<Item = &Folder> + '_ {
        self.folders.values()
    }
    #[must_use]
    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    // Typed conveniences

    /// Resolve the folder holding `T`s.
    #[must_use]
    pub fn folder_of<T: NodeKind>(&self) -> Option<&Folder> {
        self.get_folder(self.registry.tag_of::<T>()?)
    }
    pub fn folder_of_mut<T: NodeKind>(&mut self) -> Option<&mut Folder> {
        let kind = self.registry.tag_of::<T>()?;
        self.get_folder_mut(kind)
    }
    /// Iterate the data of every child viewable as `T`.
    pub fn children<T: NodeKind>(&self) -> impl Iterator<Item = &T> + '_ {
        self.folder_of::<T>()
            .into_iter()
            .flat_map(|folder| folder.iter_as::<T>())
    }
    /// Data of the `index`th child from the folder of `T`s.
    #[must_use]
    pub fn child<T: NodeKind>(&self, index: usize) -> Option<&T> {
        self.folder_of::<T>()?.get(index)?.data::<T>()
    }
    /// Add a default constructed `T`, creating its folder if needed.
    ///
    /// A related folder is used only if its children can be viewed as `T`, so the returned node
    /// always is one. Otherwise the child goes in the folder of exactly `T`.
    pub fn add_child<T: NodeKind>(&mut self) -> Result<&mut DocumentNode, RegistryError> {
        let kind = self
            .registry
            .tag_of::<T>()
            .ok_or(RegistryError::Unregistered(std::any::type_name::<T>()))?;
        let folder = match self.resolve_folder(kind, false, false) {
            Some(found) if self.registry.can_view_as(found, kind) => found,
            _ => kind,
        };
        Ok(self.folder_entry(folder).add())
    }

    // Navigation

    /// Follow `path` down from this node. Each step names the exact folder, related kinds are not
    /// considered, so a node has only the one path.
    #[must_use]
    pub fn resolve(&self, path: &NodePath) -> Option<&DocumentNode> {
        path.steps()
            .iter()
            .try_fold(self, |node, step| node.folder(step.folder)?.get(step.index))
    }
    pub fn resolve_mut(&mut self, path: &NodePath) -> Option<&mut DocumentNode> {
        path.steps().iter().try_fold(self, |node, step| {
            node.folder_mut(step.folder)?.get_mut(step.index)
        })
    }
    /// Count of this node and all of its descendants.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self
            .folders
            .values()
            .flat_map(Folder::iter)
            .map(DocumentNode::node_count)
            .sum::<usize>()
    }
}
/// Deep clone. The copy shares no nodes with the original, only the (immutable) registry.
impl Clone for DocumentNode {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            data: self.data.boxed_clone(),
            folders: self.folders.clone(),
            parent: self.parent,
            registry: Arc::clone(&self.registry),
        }
    }
}
impl std::fmt::Debug for DocumentNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentNode")
            .field("data", &self.data)
            .field("folders", &self.folders.values().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_kinds::{self, Bone, Material, Model, Scene, Texture, Track};

    fn scene() -> DocumentNode {
        let registry = test_kinds::registry();
        registry
            .construct(registry.tag_of::<Scene>().unwrap(), None)
            .unwrap()
    }

    #[test]
    fn base_request_finds_derived_folder() {
        let mut scene = scene();
        scene.add_child::<Material>().unwrap();
        let texture = scene.registry().tag_of::<Texture>().unwrap();
        let material = scene.registry().tag_of::<Material>().unwrap();
        let found = scene.get_folder(texture).unwrap();
        assert_eq!(found.kind(), material);
        // Restricted from searching children, nothing is found.
        assert!(scene.get_folder_restricted(texture, true, false).is_none());
    }
    #[test]
    fn derived_request_finds_base_folder() {
        let mut scene = scene();
        scene.add_child::<Texture>().unwrap();
        let texture = scene.registry().tag_of::<Texture>().unwrap();
        let material = scene.registry().tag_of::<Material>().unwrap();
        assert_eq!(scene.get_folder(material).map(Folder::kind), Some(texture));
        assert!(scene.get_folder_restricted(material, false, true).is_none());
    }
    #[test]
    fn unrelated_kinds_not_found() {
        let mut builder = crate::TypeRegistry::builder();
        let scene_kind = builder.register_type::<Scene>().unwrap();
        let texture = builder.register_type::<Texture>().unwrap();
        builder.register_type::<Material>().unwrap();
        let registry = builder.build();

        let mut scene = registry.construct(scene_kind, None).unwrap();
        scene.add_child::<Material>().unwrap();
        assert!(scene.get_folder(texture).is_none());
    }
    #[test]
    fn has_a_resolves_too() {
        let mut scene = scene();
        scene.add_child::<Bone>().unwrap();
        let track = scene.registry().tag_of::<Track>().unwrap();
        assert!(scene.get_folder(track).is_some());
    }
    #[test]
    fn get_or_add_idempotent() {
        let mut scene = scene();
        let model = scene.registry().tag_of::<Model>().unwrap();
        scene.get_or_add_folder(model).add();
        scene.get_or_add_folder(model).add();
        assert_eq!(scene.folder_count(), 1);
        assert_eq!(scene.folder(model).map(Folder::len), Some(2));

        // A texture request lands in the existing material folder rather than a new one.
        scene.add_child::<Material>().unwrap();
        let texture = scene.registry().tag_of::<Texture>().unwrap();
        scene.get_or_add_folder(texture).add();
        assert_eq!(scene.folder_count(), 2);
        assert!(!scene.has_folder(texture));
        assert_eq!(scene.children::<Material>().count(), 2);
    }
    #[test]
    fn add_child_is_always_viewable() {
        let mut root = scene();
        let texture = root.registry().tag_of::<Texture>().unwrap();
        let material = root.registry().tag_of::<Material>().unwrap();

        // Only a base folder around: a derived child gets its own folder.
        root.add_child::<Texture>().unwrap();
        let added = root.add_child::<Material>().unwrap();
        assert_eq!(added.kind(), material);
        assert!(added.data::<Material>().is_some());
        assert_eq!(root.folder(texture).map(Folder::len), Some(1));
        assert_eq!(root.folder(material).map(Folder::len), Some(1));

        // Only a derived folder around: it takes base children, viewed through the projection.
        let mut root = scene();
        root.add_child::<Material>().unwrap();
        let added = root.add_child::<Texture>().unwrap();
        assert_eq!(added.kind(), material);
        assert!(added.data::<Texture>().is_some());
        assert_eq!(root.folder(material).map(Folder::len), Some(2));
        assert!(!root.has_folder(texture));
    }
    #[test]
    fn add_child_ignores_has_a() {
        let mut root = scene();
        let bone = root.registry().tag_of::<Bone>().unwrap();
        let track = root.registry().tag_of::<Track>().unwrap();
        root.add_child::<Bone>().unwrap();
        let added = root.add_child::<Track>().unwrap();
        assert_eq!(added.kind(), track);
        assert!(added.data::<Track>().is_some());
        assert_eq!(root.folder(bone).map(Folder::len), Some(1));

        let mut root = scene();
        root.add_child::<Track>().unwrap();
        let added = root.add_child::<Bone>().unwrap();
        assert_eq!(added.kind(), bone);
        assert!(added.data::<Bone>().is_some());
        assert_eq!(root.folder(track).map(Folder::len), Some(1));
    }
    #[test]
    fn deep_clone_is_independent() {
        let mut root = scene();
        for _ in 0..2 {
            let model = root.add_child::<Model>().unwrap();
            model.add_child::<Bone>().unwrap();
        }
        let mut copy = root.clone();
        assert_eq!(copy.node_count(), 5);

        let path = NodePath::root()
            .join(root.registry().tag_of::<Model>().unwrap(), 1)
            .join(root.registry().tag_of::<Bone>().unwrap(), 0);
        copy.resolve_mut(&path)
            .unwrap()
            .data_mut::<Bone>()
            .unwrap()
            .name = "changed".into();

        assert_eq!(root.resolve(&path).unwrap().data::<Bone>().unwrap().name, "");
        assert_eq!(
            copy.resolve(&path).unwrap().data::<Bone>().unwrap().name,
            "changed"
        );
    }
    #[test]
    fn paths_name_exact_folders() {
        let mut root = scene();
        root.add_child::<Material>().unwrap();
        let texture = root.registry().tag_of::<Texture>().unwrap();
        let material = root.registry().tag_of::<Material>().unwrap();
        assert!(root.resolve(&NodePath::root().join(material, 0)).is_some());
        assert!(root.resolve(&NodePath::root().join(texture, 0)).is_none());
        assert!(root.resolve_mut(&NodePath::root().join(texture, 0)).is_none());
    }
    #[test]
    fn typed_children() {
        let mut root = scene();
        root.add_child::<Model>()
            .unwrap()
            .data_mut::<Model>()
            .unwrap()
            .name = "teapot".into();
        assert_eq!(root.child::<Model>(0).map(|m| m.name.as_str()), Some("teapot"));
        assert!(root.child::<Model>(1).is_none());
        assert!(root.child::<Bone>(0).is_none());
    }
    #[test]
    fn capability_round_trip() {
        let mut root = scene();
        let model = root.add_child::<Model>().unwrap();
        let before = model.snapshot_data();
        model.data_mut::<Model>().unwrap().scale = 4.0;
        assert!(!model.data_eq(before.as_ref()));
        assert!(model.restore_data(before.as_ref()));
        assert!(model.data_eq(before.as_ref()));
    }
    #[test]
    #[should_panic(expected = "unregistered kind")]
    fn folder_for_unregistered_kind() {
        let mut builder = crate::TypeRegistry::builder();
        let scene_kind = builder.register_type::<Scene>().unwrap();
        let registry = builder.build();
        let mut root = registry.construct(scene_kind, None).unwrap();
        // A tag from a bigger registry.
        let bone = test_kinds::registry().tag_of::<Bone>().unwrap();
        root.get_or_add_folder(bone);
    }
}
