//! Small asset kinds shared by the unit tests.

use std::sync::Arc;

use crate::node::NodeKind;
use crate::registry::TypeRegistry;

#[derive(Clone, PartialEq, Default, Debug)]
pub struct Scene {
    pub name: String,
}
impl NodeKind for Scene {
    const NAME: &'static str = "Scene";
}

#[derive(Clone, PartialEq, Default, Debug)]
pub struct Model {
    pub name: String,
    pub scale: f32,
}
impl NodeKind for Model {
    const NAME: &'static str = "Model";
}

#[derive(Clone, PartialEq, Default, Debug)]
pub struct Texture {
    pub name: String,
    pub width: u32,
    pub height: u32,
}
impl NodeKind for Texture {
    const NAME: &'static str = "Texture";
}

/// Is-a [`Texture`].
#[derive(Clone, PartialEq, Default, Debug)]
pub struct Material {
    pub texture: Texture,
    pub cull_back: bool,
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

/// Has-a relation target of [`Bone`].
#[derive(Clone, PartialEq, Default, Debug)]
pub struct Track {
    pub frames: u32,
}
impl NodeKind for Track {
    const NAME: &'static str = "Track";
}

fn unit_model() -> Model {
    Model {
        name: String::new(),
        scale: 1.0,
    }
}

/// Every kind above, with Material is-a Texture and Bone has-a Track.
pub fn registry() -> Arc<TypeRegistry> {
    let mut builder = TypeRegistry::builder();
    builder.register_type::<Scene>().unwrap();
    builder.register_type_with::<Model>(unit_model).unwrap();
    builder.register_type::<Texture>().unwrap();
    builder.register_type::<Material>().unwrap();
    builder.register_type::<Bone>().unwrap();
    builder.register_type::<Track>().unwrap();
    builder.register_parent::<Material, Texture>().unwrap();
    builder.register_member::<Bone, Track>(0).unwrap();
    builder.build()
}
