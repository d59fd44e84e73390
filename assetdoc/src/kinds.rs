//! # Demo asset kinds
//!
//! A small plugin's worth of node kinds for playing with the shell. Real importers would register
//! their own the same way.

use std::sync::Arc;

use assetdoc_core::{registry::RegistryError, DocumentNode, NodeKind, TypeRegistry};

#[derive(Clone, PartialEq, Default, Debug)]
pub struct Scene {
    pub name: String,
}
impl NodeKind for Scene {
    const NAME: &'static str = "Scene";
}

#[derive(Clone, PartialEq, Debug)]
pub struct Model {
    pub name: String,
    pub scale: f32,
    pub visible: bool,
}
impl Default for Model {
    fn default() -> Self {
        Self {
            name: String::new(),
            scale: 1.0,
            visible: true,
        }
    }
}
impl NodeKind for Model {
    const NAME: &'static str = "Model";
}

#[derive(Clone, PartialEq, Debug)]
pub struct Texture {
    pub name: String,
    pub width: u32,
    pub height: u32,
}
impl Default for Texture {
    fn default() -> Self {
        Self {
            name: String::new(),
            width: 64,
            height: 64,
        }
    }
}
impl NodeKind for Texture {
    const NAME: &'static str = "Texture";
}

/// A texture plus how to draw it.
#[derive(Clone, PartialEq, Default, Debug)]
pub struct Material {
    pub texture: Texture,
    pub double_sided: bool,
}
impl NodeKind for Material {
    const NAME: &'static str = "Material";
}
impl AsRef<Texture> for Material {
    fn as_ref(&self) -> &Texture {
        &self.texture
    }
}
impl AsMut<Texture> for Material {
    fn as_mut(&mut self) -> &mut Texture {
        &mut self.texture
    }
}

#[derive(Clone, PartialEq, Default, Debug)]
pub struct Bone {
    pub name: String,
    pub position: [f32; 3],
}
impl NodeKind for Bone {
    const NAME: &'static str = "Bone";
}

#[derive(Clone, PartialEq, Default, Debug)]
pub struct Track {
    pub name: String,
    pub frames: u32,
}
impl NodeKind for Track {
    const NAME: &'static str = "Track";
}

/// Registry holding every demo kind.
pub fn registry() -> Result<Arc<TypeRegistry>, RegistryError> {
    let mut builder = TypeRegistry::builder();
    builder.register_type::<Scene>()?;
    builder.register_type::<Model>()?;
    builder.register_type::<Texture>()?;
    builder.register_type::<Material>()?;
    builder.register_type::<Bone>()?;
    builder.register_type::<Track>()?;
    builder
        .register_parent::<Material, Texture>()?
        .register_member::<Bone, Track>(0)?;
    Ok(builder.build())
}

/// The display name of a node, for any demo kind.
#[must_use]
pub fn name(node: &DocumentNode) -> Option<&str> {
    // Texture also covers Material.
    node.data::<Scene>()
        .map(|s| s.name.as_str())
        .or_else(|| node.data::<Model>().map(|m| m.name.as_str()))
        .or_else(|| node.data::<Texture>().map(|t| t.name.as_str()))
        .or_else(|| node.data::<Bone>().map(|b| b.name.as_str()))
        .or_else(|| node.data::<Track>().map(|t| t.name.as_str()))
}
/// Rename a node of any demo kind. Returns false if it's not one of ours.
pub fn rename(node: &mut DocumentNode, new_name: &str) -> bool {
    let slot = if node.data::<Scene>().is_some() {
        node.data_mut::<Scene>().map(|s| &mut s.name)
    } else if node.data::<Model>().is_some() {
        node.data_mut::<Model>().map(|m| &mut m.name)
    } else if node.data::<Texture>().is_some() {
        node.data_mut::<Texture>().map(|t| &mut t.name)
    } else if node.data::<Bone>().is_some() {
        node.data_mut::<Bone>().map(|b| &mut b.name)
    } else {
        node.data_mut::<Track>().map(|t| &mut t.name)
    };
    match slot {
        Some(slot) => {
            new_name.clone_into(slot);
            true
        }
        None => false,
    }
}
