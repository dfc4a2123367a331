//! Phong material description
//!
//! Materials are plain values owned by each scene object and pushed to the bound shader as the
//! `material.*` uniform block every draw.

use cgmath::Vector3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Vector3::new(0.1, 0.1, 0.1),
            diffuse: Vector3::new(0.8, 0.8, 0.8),
            specular: Vector3::new(0.5, 0.5, 0.5),
            shininess: 32.0,
        }
    }
}

impl Material {
    pub fn new(
        ambient: Vector3<f32>,
        diffuse: Vector3<f32>,
        specular: Vector3<f32>,
        shininess: f32,
    ) -> Self {
        Self {
            ambient,
            diffuse,
            specular,
            shininess,
        }
    }

    /// The material given to freshly created primitives and imported models.
    pub fn editor_default() -> Self {
        Self {
            ambient: Vector3::new(0.1, 0.1, 0.1),
            diffuse: Vector3::new(0.7, 0.7, 0.7),
            specular: Vector3::new(1.0, 1.0, 1.0),
            shininess: 32.0,
        }
    }

    /// Uniform color for all three terms, handy for quick tinting from the UI.
    pub fn from_color(color: Vector3<f32>) -> Self {
        Self {
            ambient: color * 0.1,
            diffuse: color,
            ..Self::editor_default()
        }
    }
}
