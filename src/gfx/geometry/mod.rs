//! # Procedural Geometry Generation
//!
//! This module provides the editor's built-in shapes, generated procedurally so no model files
//! are needed for basic scenes.
//!
//! ## Supported Primitives
//!
//! - **Cube**: 24-vertex cube with flat faces
//! - **Sphere**: UV sphere
//! - **Plane**: Single quad facing +Y
//! - **Cylinder**: Capped cylinder
//! - **Cone**: Capped cone
//!
//! ## Usage
//!
//! ```no_run
//! use thistle::gfx::geometry::{create_primitive_object, PrimitiveKind};
//! # fn demo(resources: &mut thistle::gfx::resources::ResourceManager) -> thistle::Result<()> {
//! let cube = create_primitive_object(PrimitiveKind::Cube, "Cube_1", resources)?;
//! # Ok(())
//! # }
//! ```

pub mod primitives;

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use primitives::*;

use crate::error::{Error, Result};
use crate::gfx::backend::GraphicsApi;
use crate::gfx::resources::{Material, ResourceManager};
use crate::gfx::scene::{Mesh, SceneObject, Vertex};

/// Shader every new primitive is bound to.
pub const DEFAULT_SHADER: &str = "default";

/// Represents generated geometry data ready for GPU upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryData {
    pub vertices: Vec<Vertex>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Uploads the geometry into a new mesh.
    pub fn into_mesh(self, gl: Rc<dyn GraphicsApi>) -> Result<Mesh> {
        Mesh::with_geometry(gl, self.vertices, self.indices)
    }
}

/// The shapes the editor can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Cube,
    Sphere,
    Plane,
    Cylinder,
    Cone,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 5] = [
        PrimitiveKind::Cube,
        PrimitiveKind::Sphere,
        PrimitiveKind::Plane,
        PrimitiveKind::Cylinder,
        PrimitiveKind::Cone,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Cube => "Cube",
            PrimitiveKind::Sphere => "Sphere",
            PrimitiveKind::Plane => "Plane",
            PrimitiveKind::Cylinder => "Cylinder",
            PrimitiveKind::Cone => "Cone",
        }
    }

    /// Guesses the shape from an object name such as `Sphere_3`; defaults to a cube.
    pub fn from_object_name(name: &str) -> Self {
        [
            PrimitiveKind::Sphere,
            PrimitiveKind::Plane,
            PrimitiveKind::Cylinder,
            PrimitiveKind::Cone,
        ]
        .into_iter()
        .find(|kind| name.contains(kind.name()))
        .unwrap_or(PrimitiveKind::Cube)
    }

    /// Geometry with the editor's default dimensions.
    pub fn geometry(self) -> GeometryData {
        match self {
            PrimitiveKind::Cube => create_cube(1.0),
            PrimitiveKind::Sphere => create_sphere(1.0, 32),
            PrimitiveKind::Plane => create_plane(1.0, 1.0),
            PrimitiveKind::Cylinder => create_cylinder(0.5, 2.0, 32),
            PrimitiveKind::Cone => create_cone(0.5, 1.0, 32),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PrimitiveKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PrimitiveKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::UnknownPrimitive(s.to_string()))
    }
}

/// Builds a scene object for `kind` with the default shader and editor material.
///
/// The default shader is loaded from the shader directory on first use; failing to load it is
/// an error because the object could never be drawn.
pub fn create_primitive_object(
    kind: PrimitiveKind,
    name: &str,
    resources: &mut ResourceManager,
) -> Result<SceneObject> {
    let shader = resources.ensure_shader(DEFAULT_SHADER).map_err(|err| {
        log::error!("Failed to load default shaders for {}: {}", name, err);
        err
    })?;

    let mesh = kind.geometry().into_mesh(resources.gl().clone())?;

    let mut object = SceneObject::new(name);
    object.set_mesh(mesh);
    object.set_primitive(Some(kind));
    object.set_shader(Some(shader));
    object.set_material(Material::editor_default());
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_name() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(kind.to_string().parse::<PrimitiveKind>().unwrap(), kind);
        }
        assert!(matches!(
            "Torus".parse::<PrimitiveKind>(),
            Err(Error::UnknownPrimitive(_))
        ));
    }

    #[test]
    fn test_kind_from_object_name() {
        assert_eq!(PrimitiveKind::from_object_name("Sphere_2"), PrimitiveKind::Sphere);
        assert_eq!(PrimitiveKind::from_object_name("MyCone"), PrimitiveKind::Cone);
        assert_eq!(PrimitiveKind::from_object_name("Thing"), PrimitiveKind::Cube);
    }
}
