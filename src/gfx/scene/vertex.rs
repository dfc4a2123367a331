//! # Vertex Data Structures
//!
//! This module defines the vertex format shared by primitives, imported models and the
//! built-in shaders.

use std::mem;

use crate::gfx::backend::{VertexAttribute, VertexLayout};

/// A 3D vertex with position, normal and texture coordinate.
///
/// # Memory Layout
///
/// The `#[repr(C)]` attribute keeps the field order, which the attribute layout below relies on:
/// - location 0: position (3 floats)
/// - location 1: normal (3 floats)
/// - location 2: texture coordinate (2 floats)
///
/// # Examples
///
/// ```no_run
/// use thistle::gfx::scene::Vertex;
///
/// let vertex = Vertex::new([0.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.5, 0.5]);
/// ```
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// 3D position coordinates [x, y, z]
    pub position: [f32; 3],
    /// Unit normal [nx, ny, nz] for lighting calculations
    pub normal: [f32; 3],
    /// Texture coordinate [u, v]
    pub tex_coord: [f32; 2],
}

const FLOAT: i32 = mem::size_of::<f32>() as i32;

const VERTEX_ATTRIBUTES: [VertexAttribute; 3] = [
    VertexAttribute {
        location: 0,
        components: 3,
        offset: 0,
    },
    VertexAttribute {
        location: 1,
        components: 3,
        offset: 3 * FLOAT,
    },
    VertexAttribute {
        location: 2,
        components: 2,
        offset: 6 * FLOAT,
    },
];

impl Vertex {
    /// Attribute layout matching the `#[repr(C)]` field order.
    pub const LAYOUT: VertexLayout = VertexLayout {
        stride: mem::size_of::<Vertex>() as i32,
        attributes: &VERTEX_ATTRIBUTES,
    };

    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_matches_struct() {
        assert_eq!(mem::size_of::<Vertex>(), 32);
        assert_eq!(Vertex::LAYOUT.stride, 32);
        assert_eq!(Vertex::LAYOUT.attributes[2].offset, 24);
    }
}
