use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::gfx::backend::{GraphicsApi, MeshBuffers, Primitive};

use super::vertex::Vertex;

/// How a mesh's index stream is assembled at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    #[default]
    Triangles,
    /// Three-vertex patches for tessellation pipelines.
    Patches,
}

/// Vertices per patch in [`DrawMode::Patches`].
pub const PATCH_VERTICES: i32 = 3;

/// A static triangle list and the GPU buffers mirroring it.
///
/// Every call to [`set_vertices`](Mesh::set_vertices) or [`set_indices`](Mesh::set_indices)
/// releases the current buffers and uploads the data again; there are no partial updates.
/// An empty index list means the mesh is drawn non-indexed.
pub struct Mesh {
    gl: Rc<dyn GraphicsApi>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    buffers: Option<MeshBuffers>,
}

impl Mesh {
    /// An empty mesh with no GPU buffers.
    pub fn new(gl: Rc<dyn GraphicsApi>) -> Self {
        Self {
            gl,
            vertices: Vec::new(),
            indices: Vec::new(),
            buffers: None,
        }
    }

    /// Builds a mesh and uploads it once.
    pub fn with_geometry(
        gl: Rc<dyn GraphicsApi>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
    ) -> Result<Self> {
        let mut mesh = Self::new(gl);
        mesh.vertices = vertices;
        mesh.indices = indices;
        mesh.rebuild()?;
        Ok(mesh)
    }

    pub fn set_vertices(&mut self, vertices: Vec<Vertex>) -> Result<()> {
        self.vertices = vertices;
        self.rebuild()
    }

    pub fn set_indices(&mut self, indices: Vec<u32>) -> Result<()> {
        self.indices = indices;
        self.rebuild()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        if self.indices.is_empty() {
            self.vertices.len() / 3
        } else {
            self.indices.len() / 3
        }
    }

    /// Whether GPU buffers currently exist.
    pub fn is_uploaded(&self) -> bool {
        self.buffers.is_some()
    }

    /// Issues one draw. Does nothing while the mesh has no vertices.
    pub fn draw(&self, mode: DrawMode) {
        let Some(buffers) = self.buffers else {
            return;
        };
        if self.vertices.is_empty() {
            return;
        }

        let primitive = match mode {
            DrawMode::Triangles => Primitive::Triangles,
            DrawMode::Patches => {
                self.gl.set_patch_vertices(PATCH_VERTICES);
                Primitive::Patches
            }
        };

        if self.indices.is_empty() {
            self.gl
                .draw(buffers.vertex_array, primitive, self.vertices.len(), false);
        } else {
            self.gl
                .draw(buffers.vertex_array, primitive, self.indices.len(), true);
        }
    }

    fn rebuild(&mut self) -> Result<()> {
        self.release();
        if self.vertices.is_empty() {
            return Ok(());
        }

        let indices = (!self.indices.is_empty()).then_some(self.indices.as_slice());
        let buffers = self
            .gl
            .create_vertex_buffers(bytemuck::cast_slice(&self.vertices), indices, Vertex::LAYOUT)
            .map_err(Error::Backend)?;
        self.buffers = Some(buffers);
        Ok(())
    }

    fn release(&mut self) {
        if let Some(buffers) = self.buffers.take() {
            self.gl.delete_vertex_buffers(buffers);
        }
    }

    /// Smooth per-vertex normals from an indexed triangle list.
    ///
    /// Face normals are accumulated unnormalised, so larger triangles weigh more, then each
    /// vertex normal is normalised. Vertices no triangle references get a zero normal.
    pub fn compute_smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
        let mut normals = vec![[0.0f32; 3]; positions.len()];

        for triangle in indices.chunks_exact(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
                continue;
            }
            let (v0, v1, v2) = (positions[i0], positions[i1], positions[i2]);

            let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
            let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
            let face_normal = [
                edge1[1] * edge2[2] - edge1[2] * edge2[1],
                edge1[2] * edge2[0] - edge1[0] * edge2[2],
                edge1[0] * edge2[1] - edge1[1] * edge2[0],
            ];

            for index in [i0, i1, i2] {
                normals[index][0] += face_normal[0];
                normals[index][1] += face_normal[1];
                normals[index][2] += face_normal[2];
            }
        }

        for normal in normals.iter_mut() {
            let length = (normal[0].powi(2) + normal[1].powi(2) + normal[2].powi(2)).sqrt();
            if length > 0.0 {
                normal[0] /= length;
                normal[1] /= length;
                normal[2] /= length;
            }
        }

        normals
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mesh")
            .field("vertices", &self.vertices.len())
            .field("indices", &self.indices.len())
            .field("uploaded", &self.buffers.is_some())
            .finish()
    }
}
