//! # Primitive Shape Generation
//!
//! This module contains functions to generate the editor's built-in shapes.
//! All shapes are centered at the origin with outward normals and texture coordinates.

use std::f32::consts::PI;

use super::GeometryData;
use crate::gfx::scene::Vertex;

/// Generate a cube centered at the origin
///
/// Each face has its own four vertices so normals stay flat: 24 vertices, 36 indices.
pub fn create_cube(size: f32) -> GeometryData {
    let h = size / 2.0;

    #[rustfmt::skip]
    let vertices = vec![
        // Front face
        Vertex::new([-h, -h,  h], [0.0, 0.0, 1.0], [0.0, 0.0]),
        Vertex::new([ h, -h,  h], [0.0, 0.0, 1.0], [1.0, 0.0]),
        Vertex::new([ h,  h,  h], [0.0, 0.0, 1.0], [1.0, 1.0]),
        Vertex::new([-h,  h,  h], [0.0, 0.0, 1.0], [0.0, 1.0]),
        // Back face
        Vertex::new([-h, -h, -h], [0.0, 0.0, -1.0], [1.0, 0.0]),
        Vertex::new([-h,  h, -h], [0.0, 0.0, -1.0], [1.0, 1.0]),
        Vertex::new([ h,  h, -h], [0.0, 0.0, -1.0], [0.0, 1.0]),
        Vertex::new([ h, -h, -h], [0.0, 0.0, -1.0], [0.0, 0.0]),
        // Top face
        Vertex::new([-h,  h, -h], [0.0, 1.0, 0.0], [0.0, 1.0]),
        Vertex::new([-h,  h,  h], [0.0, 1.0, 0.0], [0.0, 0.0]),
        Vertex::new([ h,  h,  h], [0.0, 1.0, 0.0], [1.0, 0.0]),
        Vertex::new([ h,  h, -h], [0.0, 1.0, 0.0], [1.0, 1.0]),
        // Bottom face
        Vertex::new([-h, -h, -h], [0.0, -1.0, 0.0], [0.0, 0.0]),
        Vertex::new([ h, -h, -h], [0.0, -1.0, 0.0], [1.0, 0.0]),
        Vertex::new([ h, -h,  h], [0.0, -1.0, 0.0], [1.0, 1.0]),
        Vertex::new([-h, -h,  h], [0.0, -1.0, 0.0], [0.0, 1.0]),
        // Right face
        Vertex::new([ h, -h, -h], [1.0, 0.0, 0.0], [1.0, 0.0]),
        Vertex::new([ h,  h, -h], [1.0, 0.0, 0.0], [1.0, 1.0]),
        Vertex::new([ h,  h,  h], [1.0, 0.0, 0.0], [0.0, 1.0]),
        Vertex::new([ h, -h,  h], [1.0, 0.0, 0.0], [0.0, 0.0]),
        // Left face
        Vertex::new([-h, -h, -h], [-1.0, 0.0, 0.0], [0.0, 0.0]),
        Vertex::new([-h, -h,  h], [-1.0, 0.0, 0.0], [1.0, 0.0]),
        Vertex::new([-h,  h,  h], [-1.0, 0.0, 0.0], [1.0, 1.0]),
        Vertex::new([-h,  h, -h], [-1.0, 0.0, 0.0], [0.0, 1.0]),
    ];

    // Two triangles per face, counter-clockwise
    let indices = (0..6u32)
        .flat_map(|face| {
            let base = face * 4;
            [base, base + 1, base + 2, base + 2, base + 3, base]
        })
        .collect();

    GeometryData { vertices, indices }
}

/// Generate a UV sphere with `segments` slices and `segments` stacks
pub fn create_sphere(radius: f32, segments: u32) -> GeometryData {
    let segments = segments.max(3);
    let mut data = GeometryData::default();

    for y in 0..=segments {
        for x in 0..=segments {
            let x_segment = x as f32 / segments as f32;
            let y_segment = y as f32 / segments as f32;

            let theta = x_segment * 2.0 * PI;
            let phi = y_segment * PI;

            let direction = [theta.cos() * phi.sin(), phi.cos(), theta.sin() * phi.sin()];
            data.vertices.push(Vertex::new(
                [
                    radius * direction[0],
                    radius * direction[1],
                    radius * direction[2],
                ],
                direction,
                [x_segment, y_segment],
            ));
        }
    }

    let row = segments + 1;
    for y in 0..segments {
        for x in 0..segments {
            let top_left = y * row + x;
            let top_right = top_left + 1;
            let bottom_left = (y + 1) * row + x;
            let bottom_right = bottom_left + 1;

            data.indices
                .extend_from_slice(&[top_left, bottom_left, top_right]);
            data.indices
                .extend_from_slice(&[top_right, bottom_left, bottom_right]);
        }
    }

    data
}

/// Generate a flat plane in the XZ plane facing +Y
pub fn create_plane(width: f32, height: f32) -> GeometryData {
    let (hw, hh) = (width / 2.0, height / 2.0);
    let up = [0.0, 1.0, 0.0];

    GeometryData {
        vertices: vec![
            Vertex::new([-hw, 0.0, -hh], up, [0.0, 0.0]),
            Vertex::new([hw, 0.0, -hh], up, [1.0, 0.0]),
            Vertex::new([hw, 0.0, hh], up, [1.0, 1.0]),
            Vertex::new([-hw, 0.0, hh], up, [0.0, 1.0]),
        ],
        indices: vec![0, 1, 2, 2, 3, 0],
    }
}

/// Generate a capped cylinder along the Y axis
///
/// Layout: two cap centers, then per ring step four vertices
/// (top rim, bottom rim, top side, bottom side). Caps and sides use separate
/// vertices so their normals stay independent.
pub fn create_cylinder(radius: f32, height: f32, segments: u32) -> GeometryData {
    let segments = segments.max(3);
    let half_height = height / 2.0;
    let angle_step = 2.0 * PI / segments as f32;
    let mut data = GeometryData::default();

    let top_center = 0;
    let bottom_center = 1;
    data.vertices
        .push(Vertex::new([0.0, half_height, 0.0], [0.0, 1.0, 0.0], [0.5, 0.5]));
    data.vertices
        .push(Vertex::new([0.0, -half_height, 0.0], [0.0, -1.0, 0.0], [0.5, 0.5]));

    for i in 0..=segments {
        let angle = i as f32 * angle_step;
        let (sin, cos) = angle.sin_cos();
        let (x, z) = (radius * cos, radius * sin);
        let cap_uv = [0.5 + 0.5 * cos, 0.5 + 0.5 * sin];
        let side_normal = normalize([x, 0.0, z]);
        let u = i as f32 / segments as f32;

        data.vertices
            .push(Vertex::new([x, half_height, z], [0.0, 1.0, 0.0], cap_uv));
        data.vertices
            .push(Vertex::new([x, -half_height, z], [0.0, -1.0, 0.0], cap_uv));
        data.vertices
            .push(Vertex::new([x, half_height, z], side_normal, [u, 1.0]));
        data.vertices
            .push(Vertex::new([x, -half_height, z], side_normal, [u, 0.0]));
    }

    for i in 0..segments {
        let next = (i + 1) % segments;
        data.indices
            .extend_from_slice(&[top_center, 2 + i * 4, 2 + next * 4]);
        data.indices
            .extend_from_slice(&[bottom_center, 3 + next * 4, 3 + i * 4]);
    }

    for i in 0..segments {
        let current = 4 + i * 4;
        let next = 4 + ((i + 1) % segments) * 4;
        data.indices
            .extend_from_slice(&[current, current + 1, next]);
        data.indices
            .extend_from_slice(&[next, current + 1, next + 1]);
    }

    data
}

/// Generate a cone along the Y axis with its tip at +height/2
pub fn create_cone(radius: f32, height: f32, segments: u32) -> GeometryData {
    let segments = segments.max(3);
    let half_height = height / 2.0;
    let angle_step = 2.0 * PI / segments as f32;
    let mut data = GeometryData::default();

    let tip = 0;
    let base_center = 1;
    data.vertices
        .push(Vertex::new([0.0, half_height, 0.0], [0.0, 1.0, 0.0], [0.5, 0.5]));
    data.vertices
        .push(Vertex::new([0.0, -half_height, 0.0], [0.0, -1.0, 0.0], [0.5, 0.5]));

    for i in 0..=segments {
        let angle = i as f32 * angle_step;
        let (sin, cos) = angle.sin_cos();
        let (x, z) = (radius * cos, radius * sin);
        let position = [x, -half_height, z];

        data.vertices.push(Vertex::new(
            position,
            [0.0, -1.0, 0.0],
            [0.5 + 0.5 * cos, 0.5 + 0.5 * sin],
        ));
        data.vertices.push(Vertex::new(
            position,
            normalize([x, radius * 0.5, z]),
            [i as f32 / segments as f32, 0.0],
        ));
    }

    for i in 0..segments {
        let next = (i + 1) % segments;
        data.indices
            .extend_from_slice(&[base_center, 2 + i * 2, 2 + next * 2]);
    }
    for i in 0..segments {
        let next = (i + 1) % segments;
        data.indices
            .extend_from_slice(&[tip, 3 + next * 2, 3 + i * 2]);
    }

    data
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let length = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if length > 0.0 {
        [v[0] / length, v[1] / length, v[2] / length]
    } else {
        v
    }
}
