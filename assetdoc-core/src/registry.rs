//! # Type registry
//!
//! The runtime catalogue of node kinds. Every kind that may appear in a document is registered here
//! at startup, receiving a [`TypeTag`] and a factory. Relationships between kinds ("a Material is-a
//! Texture") are recorded as [`Mirror`] edges, which folder lookup follows when no exact folder
//! exists.
//!
//! Registration happens on a [`TypeRegistryBuilder`]. Once built, the registry is frozen behind an
//! `Arc` and shared by every node constructed from it - kinds cannot be added mid-document.

use std::any::{Any, TypeId};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::node::{DocumentNode, NodeData, NodeKind};

pub type RegistryID = crate::SessionID<TypeRegistry>;

/// Identifies a registered node kind within one registry.
///
/// Tags are handed out in registration order. They are not derived from Rust type names, and are
/// meaningless in any other registry.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TypeTag(u32);
impl TypeTag {
    /// Position of the kind in registration order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TypeTag#{}", self.0)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{} is not a registered kind", .0)]
    UnknownType(TypeTag),
    #[error("no kind named {:?}", .0)]
    UnknownName(String),
    #[error("rust type {} was never registered", .0)]
    Unregistered(&'static str),
    #[error("kind {:?} is already registered with a different factory", .0)]
    ConflictingFactory(&'static str),
    #[error("name {:?} is already taken by a different type", .0)]
    NameClash(&'static str),
    #[error("kind {:?} can't be related to itself", .0)]
    SelfRelation(&'static str),
    #[error("relating {derived:?} to {base:?} would make them mutual ancestors")]
    Cycle {
        derived: &'static str,
        base: &'static str,
    },
}

/// Views derived data as base data. The runtime stand-in for a base-class pointer adjustment.
#[derive(Copy, Clone)]
pub struct Projection {
    as_ref: fn(&dyn Any) -> Option<&dyn Any>,
    as_mut: fn(&mut dyn Any) -> Option<&mut dyn Any>,
}
impl Projection {
    /// Project `D` onto the `B` it contains.
    #[must_use]
    pub fn of<D, B>() -> Self
    where
        D: AsRef<B> + AsMut<B> + Any,
        B: Any,
    {
        fn project_ref<D: AsRef<B> + Any, B: Any>(data: &dyn Any) -> Option<&dyn Any> {
            data.downcast_ref::<D>()
                .map(|d| AsRef::<B>::as_ref(d) as &dyn Any)
        }
        fn project_mut<D: AsMut<B> + Any, B: Any>(data: &mut dyn Any) -> Option<&mut dyn Any> {
            data.downcast_mut::<D>()
                .map(|d| AsMut::<B>::as_mut(d) as &mut dyn Any)
        }
        Self {
            as_ref: project_ref::<D, B>,
            as_mut: project_mut::<D, B>,
        }
    }
}
impl std::fmt::Debug for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Projection")
    }
}

/// How a derived kind relates to its base.
#[derive(Copy, Clone, Debug)]
pub enum Relation {
    /// The derived kind is-a base, and its data can be viewed as the base's data.
    IsA(Projection),
    /// The derived kind has-a base as a member. A marker only, for folder resolution.
    HasA { slot: usize },
}

/// A registered edge between two kinds.
#[derive(Copy, Clone, Debug)]
pub struct Mirror {
    pub derived: TypeTag,
    pub base: TypeTag,
    pub relation: Relation,
}

/// Parent and child edges of a kind, in registration order.
#[derive(Copy, Clone, Debug)]
pub struct Relationships<'a> {
    /// Kinds this kind is-a or has-a.
    pub parents: &'a [TypeTag],
    /// Kinds that are-a or have-a this kind.
    pub children: &'a [TypeTag],
}

type Spawner = Box<dyn Fn() -> Box<dyn NodeData> + Send + Sync>;

struct KindEntry {
    name: &'static str,
    spawn: Spawner,
    parents: SmallVec<[TypeTag; 2]>,
    children: SmallVec<[TypeTag; 2]>,
}

pub struct TypeRegistry {
    id: RegistryID,
    kinds: Vec<KindEntry>,
    by_type: hashbrown::HashMap<TypeId, TypeTag>,
    by_name: hashbrown::HashMap<&'static str, TypeTag>,
    mirrors: Vec<Mirror>,
}

/// Accumulates kinds and relationships, then freezes them into a [`TypeRegistry`].
pub struct TypeRegistryBuilder {
    registry: TypeRegistry,
}
impl Default for TypeRegistryBuilder {
    fn default() -> Self {
        Self {
            registry: TypeRegistry {
                id: RegistryID::default(),
                kinds: Vec::new(),
                by_type: hashbrown::HashMap::new(),
                by_name: hashbrown::HashMap::new(),
                mirrors: Vec::new(),
            },
        }
    }
}
impl TypeRegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Register `T`, default constructed through [`Default`].
    ///
    /// Registering the same kind twice is harmless, and returns the same tag. Whatever factory the
    /// first registration installed stays in effect.
    pub fn register_type<T: NodeKind>(&mut self) -> Result<TypeTag, RegistryError> {
        if let Some(&tag) = self.registry.by_type.get(&TypeId::of::<T>()) {
            return Ok(tag);
        }
        self.insert_kind::<T>(T::default)
    }
    /// Register `T` with a plugin-provided factory, for kinds whose sane defaults differ from
    /// [`Default`].
    ///
    /// Function pointers can't be reliably compared, so any explicit factory for an already
    /// registered kind is rejected, as is a different type under a name that's already taken. The
    /// first registration stays in effect.
    pub fn register_type_with<T: NodeKind>(
        &mut self,
        factory: fn() -> T,
    ) -> Result<TypeTag, RegistryError> {
        if self.registry.by_type.contains_key(&TypeId::of::<T>()) {
            log::warn!("Ignoring re-registration of {:?} with a new factory", T::NAME);
            return Err(RegistryError::ConflictingFactory(T::NAME));
        }
        self.insert_kind::<T>(factory)
    }
    fn insert_kind<T: NodeKind>(&mut self, factory: fn() -> T) -> Result<TypeTag, RegistryError> {
        let registry = &mut self.registry;
        if registry.by_name.contains_key(T::NAME) {
            log::warn!(
                "Ignoring registration of {}, name {:?} is taken",
                std::any::type_name::<T>(),
                T::NAME
            );
            return Err(RegistryError::NameClash(T::NAME));
        }

        // Four billion kinds ought to be enough for anybody.
        #[allow(clippy::cast_possible_truncation)]
        let tag = TypeTag(registry.kinds.len() as u32);
        registry.kinds.push(KindEntry {
            name: T::NAME,
            spawn: Box::new(move || -> Box<dyn NodeData> { Box::new(factory()) }),
            parents: SmallVec::new(),
            children: SmallVec::new(),
        });
        registry.by_type.insert(TypeId::of::<T>(), tag);
        registry.by_name.insert(T::NAME, tag);
        log::trace!("Registered kind {:?} as {tag}", T::NAME);
        Ok(tag)
    }
    /// Record that `derived` relates to `base`, for folder resolution.
    ///
    /// Relations are rejected if they relate a kind to itself, or if `base` already descends from
    /// `derived`. Recording the same edge twice is a no-op.
    pub fn register_relationship(
        &mut self,
        derived: TypeTag,
        base: TypeTag,
        relation: Relation,
    ) -> Result<&mut Self, RegistryError> {
        let registry = &mut self.registry;
        let derived_name = registry
            .name_of(derived)
            .ok_or(RegistryError::UnknownType(derived))?;
        let base_name = registry
            .name_of(base)
            .ok_or(RegistryError::UnknownType(base))?;
        if derived == base {
            return Err(RegistryError::SelfRelation(derived_name));
        }
        if registry.descends_from(base, derived) {
            log::warn!("Rejected cyclic relation {derived_name:?} -> {base_name:?}");
            return Err(RegistryError::Cycle {
                derived: derived_name,
                base: base_name,
            });
        }
        if registry.kinds[derived.index()].parents.contains(&base) {
            return Ok(self);
        }

        registry.kinds[derived.index()].parents.push(base);
        registry.kinds[base.index()].children.push(derived);
        registry.mirrors.push(Mirror {
            derived,
            base,
            relation,
        });
        Ok(self)
    }
    /// `D` is-a `B`. Both must already be registered.
    pub fn register_parent<D, B>(&mut self) -> Result<&mut Self, RegistryError>
    where
        D: NodeKind + AsRef<B> + AsMut<B>,
        B: NodeKind,
    {
        let derived = self.registry.try_tag_of::<D>()?;
        let base = self.registry.try_tag_of::<B>()?;
        self.register_relationship(derived, base, Relation::IsA(Projection::of::<D, B>()))
    }
    /// `D` has-a `B` as the member at `slot`. Both must already be registered.
    pub fn register_member<D: NodeKind, B: NodeKind>(
        &mut self,
        slot: usize,
    ) -> Result<&mut Self, RegistryError> {
        let derived = self.registry.try_tag_of::<D>()?;
        let base = self.registry.try_tag_of::<B>()?;
        self.register_relationship(derived, base, Relation::HasA { slot })
    }
    /// Look up a tag while still registering.
    #[must_use]
    pub fn tag_of<T: NodeKind>(&self) -> Option<TypeTag> {
        self.registry.tag_of::<T>()
    }
    /// Freeze the registry.
    #[must_use]
    pub fn build(self) -> Arc<TypeRegistry> {
        log::debug!(
            "Built registry {} with {} kinds and {} relations",
            self.registry.id,
            self.registry.kinds.len(),
            self.registry.mirrors.len()
        );
        Arc::new(self.registry)
    }
}

impl TypeRegistry {
    #[must_use]
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }
    #[must_use]
    pub fn id(&self) -> RegistryID {
        self.id
    }
    /// Construct a default node of the given kind. `parent` is the kind of the node that will own it,
    /// if any.
    pub fn construct(
        self: &Arc<Self>,
        kind: TypeTag,
        parent: Option<TypeTag>,
    ) -> Result<DocumentNode, RegistryError> {
        let data = self.spawn_data(kind)?;
        Ok(DocumentNode::from_parts(kind, data, parent, Arc::clone(self)))
    }
    pub fn construct_named(self: &Arc<Self>, name: &str) -> Result<DocumentNode, RegistryError> {
        let kind = self
            .tag_by_name(name)
            .ok_or_else(|| RegistryError::UnknownName(name.to_owned()))?;
        self.construct(kind, None)
    }
    /// Run the factory of a kind, without wrapping the result in a node.
    pub fn spawn_data(&self, kind: TypeTag) -> Result<Box<dyn NodeData>, RegistryError> {
        let entry = self
            .kinds
            .get(kind.index())
            .ok_or(RegistryError::UnknownType(kind))?;
        Ok((entry.spawn)())
    }
    /// The parents and children of a kind, or None if it's not registered.
    #[must_use]
    pub fn lookup_relationships(&self, kind: TypeTag) -> Option<Relationships<'_>> {
        self.kinds.get(kind.index()).map(|entry| Relationships {
            parents: &entry.parents,
            children: &entry.children,
        })
    }
    /// Every recorded edge, in registration order.
    #[must_use]
    pub fn mirrors(&self) -> &[Mirror] {
        &self.mirrors
    }
    #[must_use]
    pub fn contains(&self, kind: TypeTag) -> bool {
        kind.index() < self.kinds.len()
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
    #[must_use]
    pub fn tag_of<T: Any>(&self) -> Option<TypeTag> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }
    fn try_tag_of<T: NodeKind>(&self) -> Result<TypeTag, RegistryError> {
        self.tag_of::<T>()
            .ok_or(RegistryError::Unregistered(std::any::type_name::<T>()))
    }
    #[must_use]
    pub fn tag_by_name(&self, name: &str) -> Option<TypeTag> {
        self.by_name.get(name).copied()
    }
    #[must_use]
    pub fn name_of(&self, kind: TypeTag) -> Option<&'static str> {
        self.kinds.get(kind.index()).map(|entry| entry.name)
    }
    /// Iterate registered kinds in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeTag, &'static str)> + '_ {
        (0u32..)
            .zip(self.kinds.iter())
            .map(|(idx, entry)| (TypeTag(idx), entry.name))
    }
    /// Does `kind` reach `ancestor` through any chain of parent edges? A kind does not descend from
    /// itself.
    #[must_use]
    pub fn descends_from(&self, kind: TypeTag, ancestor: TypeTag) -> bool {
        let Some(entry) = self.kinds.get(kind.index()) else {
            return false;
        };
        entry
            .parents
            .iter()
            .any(|&parent| parent == ancestor || self.descends_from(parent, ancestor))
    }
    /// Can data of kind `kind` be viewed as data of kind `target`? True for the kind itself and for
    /// any kind it is-a. Has-a edges don't count.
    #[must_use]
    pub fn can_view_as(&self, kind: TypeTag, target: TypeTag) -> bool {
        self.upcast_path(kind, target).is_some()
    }
    /// View data of kind `kind` as a `T`, following is-a projections as needed.
    #[must_use]
    pub fn view<'a, T: Any>(&self, kind: TypeTag, data: &'a dyn Any) -> Option<&'a T> {
        if let Some(exact) = data.downcast_ref::<T>() {
            return Some(exact);
        }
        let path = self.upcast_path(kind, self.tag_of::<T>()?)?;
        path.iter()
            .try_fold(data, |data, projection| (projection.as_ref)(data))?
            .downcast_ref::<T>()
    }
    /// Mutable counterpart of [`Self::view`].
    #[must_use]
    pub fn view_mut<'a, T: Any>(&self, kind: TypeTag, data: &'a mut dyn Any) -> Option<&'a mut T> {
        if data.is::<T>() {
            return data.downcast_mut::<T>();
        }
        let path = self.upcast_path(kind, self.tag_of::<T>()?)?;
        path.iter()
            .try_fold(data, |data, projection| (projection.as_mut)(data))?
            .downcast_mut::<T>()
    }
    /// Chain of is-a projections leading from `from` up to `to`.
    fn upcast_path(&self, from: TypeTag, to: TypeTag) -> Option<SmallVec<[Projection; 4]>> {
        if from == to {
            return Some(SmallVec::new());
        }
        self.mirrors
            .iter()
            .filter(|mirror| mirror.derived == from)
            .find_map(|mirror| {
                let Relation::IsA(projection) = mirror.relation else {
                    return None;
                };
                let mut rest = self.upcast_path(mirror.base, to)?;
                rest.insert(0, projection);
                Some(rest)
            })
    }
}
impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("id", &self.id)
            .field("kinds", &self.iter().map(|(_, name)| name).collect::<Vec<_>>())
            .field("mirrors", &self.mirrors.len())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_kinds::{self, Bone, Material, Model, Scene, Texture, Track};

    #[test]
    fn register_idempotent() {
        let mut builder = TypeRegistry::builder();
        let first = builder.register_type::<Model>().unwrap();
        let second = builder.register_type::<Model>().unwrap();
        assert_eq!(first, second);
        assert_eq!(builder.build().len(), 1);
    }
    #[test]
    fn conflicting_factory_rejected() {
        fn big_texture() -> Texture {
            Texture {
                name: "big".into(),
                width: 1024,
                height: 1024,
            }
        }
        let mut builder = TypeRegistry::builder();
        let tag = builder.register_type::<Texture>().unwrap();
        assert_eq!(
            builder.register_type_with::<Texture>(big_texture),
            Err(RegistryError::ConflictingFactory("Texture"))
        );
        // The first registration is still in effect.
        let registry = builder.build();
        let node = registry.construct(tag, None).unwrap();
        assert_eq!(node.data::<Texture>(), Some(&Texture::default()));
    }
    #[test]
    fn name_clash_rejected() {
        #[derive(Clone, PartialEq, Default, Debug)]
        struct Impostor;
        impl NodeKind for Impostor {
            const NAME: &'static str = "Model";
        }
        let mut builder = TypeRegistry::builder();
        builder.register_type::<Model>().unwrap();
        assert_eq!(
            builder.register_type::<Impostor>(),
            Err(RegistryError::NameClash("Model"))
        );
    }
    #[test]
    fn construct_unknown() {
        let registry = test_kinds::registry();
        let bogus = TypeTag(999);
        assert_eq!(
            registry.construct(bogus, None).err(),
            Some(RegistryError::UnknownType(bogus))
        );
        assert!(matches!(
            registry.construct_named("Spline"),
            Err(RegistryError::UnknownName(_))
        ));
    }
    #[test]
    fn plain_reregistration_keeps_custom_factory() {
        fn wide_texture() -> Texture {
            Texture {
                name: String::new(),
                width: 256,
                height: 16,
            }
        }
        let mut builder = TypeRegistry::builder();
        let tag = builder.register_type_with::<Texture>(wide_texture).unwrap();
        assert_eq!(builder.register_type::<Texture>(), Ok(tag));
        assert_eq!(
            builder.register_type_with::<Texture>(wide_texture),
            Err(RegistryError::ConflictingFactory("Texture"))
        );
        let registry = builder.build();
        assert_eq!(registry.len(), 1);
        let node = registry.construct(tag, None).unwrap();
        assert_eq!(node.data::<Texture>().map(|t| t.width), Some(256));
    }
    #[test]
    fn view_compatibility() {
        let registry = test_kinds::registry();
        let tag = |name: &str| registry.tag_by_name(name).unwrap();
        assert!(registry.can_view_as(tag("Material"), tag("Texture")));
        assert!(registry.can_view_as(tag("Texture"), tag("Texture")));
        assert!(!registry.can_view_as(tag("Texture"), tag("Material")));
        // Has-a is not a view.
        assert!(!registry.can_view_as(tag("Bone"), tag("Track")));
        assert!(!registry.can_view_as(tag("Track"), tag("Bone")));
    }
    #[test]
    fn custom_factory_used() {
        fn lit_model() -> Model {
            Model {
                name: "unnamed".into(),
                scale: 1.0,
            }
        }
        let mut builder = TypeRegistry::builder();
        let tag = builder.register_type_with::<Model>(lit_model).unwrap();
        let registry = builder.build();
        let node = registry.construct(tag, None).unwrap();
        assert_eq!(node.data::<Model>().map(|m| m.scale), Some(1.0));
    }
    #[test]
    fn relationships_in_order() {
        let registry = test_kinds::registry();
        let texture = registry.tag_of::<Texture>().unwrap();
        let material = registry.tag_of::<Material>().unwrap();
        let relations = registry.lookup_relationships(texture).unwrap();
        assert!(relations.parents.is_empty());
        assert_eq!(relations.children, &[material]);
        let relations = registry.lookup_relationships(material).unwrap();
        assert_eq!(relations.parents, &[texture]);
        assert!(registry.descends_from(material, texture));
        assert!(!registry.descends_from(texture, material));
    }
    #[test]
    fn self_and_cyclic_relations_rejected() {
        let mut builder = TypeRegistry::builder();
        let bone = builder.register_type::<Bone>().unwrap();
        let track = builder.register_type::<Track>().unwrap();
        let scene = builder.register_type::<Scene>().unwrap();
        assert_eq!(
            builder
                .register_relationship(bone, bone, Relation::HasA { slot: 0 })
                .err(),
            Some(RegistryError::SelfRelation("Bone"))
        );
        builder.register_member::<Bone, Track>(0).unwrap();
        builder
            .register_relationship(track, scene, Relation::HasA { slot: 0 })
            .unwrap();
        // Scene -> Bone would close the loop Bone -> Track -> Scene -> Bone
        assert!(matches!(
            builder.register_relationship(scene, bone, Relation::HasA { slot: 1 }),
            Err(RegistryError::Cycle { .. })
        ));
        let registry = builder.build();
        assert_eq!(registry.mirrors().len(), 2);
    }
    #[test]
    fn relate_unregistered() {
        let mut builder = TypeRegistry::builder();
        builder.register_type::<Material>().unwrap();
        assert!(matches!(
            builder.register_parent::<Material, Texture>(),
            Err(RegistryError::Unregistered(_))
        ));
    }
    #[test]
    fn view_through_projection() {
        let registry = test_kinds::registry();
        let material_tag = registry.tag_of::<Material>().unwrap();
        let mut material = Material {
            texture: Texture {
                name: "brick".into(),
                width: 64,
                height: 32,
            },
            cull_back: true,
        };
        let texture = registry
            .view::<Texture>(material_tag, &material)
            .unwrap();
        assert_eq!(texture.name, "brick");
        // Has-a edges have no projection.
        let bone_tag = registry.tag_of::<Bone>().unwrap();
        assert!(registry.view::<Track>(bone_tag, &Bone::default()).is_none());

        registry
            .view_mut::<Texture>(material_tag, &mut material)
            .unwrap()
            .width = 128;
        assert_eq!(material.texture.width, 128);
    }
}
