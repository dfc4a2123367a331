use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::gfx::backend::GraphicsApi;
use crate::gfx::scene::{DrawMode, Mesh, Vertex};

/// Imported geometry: every mesh of an OBJ file, flattened into one list.
pub struct Model {
    gl: Rc<dyn GraphicsApi>,
    meshes: Vec<Mesh>,
    directory: PathBuf,
    file_path: PathBuf,
    loaded: bool,
}

impl Model {
    pub fn new(gl: Rc<dyn GraphicsApi>) -> Self {
        Self {
            gl,
            meshes: Vec::new(),
            directory: PathBuf::new(),
            file_path: PathBuf::new(),
            loaded: false,
        }
    }

    /// Loads (or reloads) the model from an OBJ file.
    ///
    /// Faces are triangulated and each vertex gets a single index. Missing normals are computed as
    /// smooth vertex normals, texture V is flipped, and missing texture coordinates default to
    /// (0, 0). The current meshes and source path are only replaced once the whole file has been
    /// converted.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let (models, _materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|err| {
            log::error!("ERROR::IMPORT::{}: {}", path.display(), err);
            Error::Import {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }
        })?;

        if models.iter().all(|m| m.mesh.positions.is_empty()) {
            return Err(Error::Import {
                path: path.to_path_buf(),
                reason: "file contains no geometry".to_string(),
            });
        }

        let mut meshes = Vec::with_capacity(models.len());
        for model in &models {
            let vertices = convert_vertices(&model.mesh);
            meshes.push(Mesh::with_geometry(
                self.gl.clone(),
                vertices,
                model.mesh.indices.clone(),
            )?);
        }

        self.meshes = meshes;
        self.file_path = path.to_path_buf();
        self.directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        self.loaded = true;
        log::info!(
            "Loaded model {} ({} meshes, {} triangles)",
            path.display(),
            self.meshes.len(),
            self.triangle_count()
        );
        Ok(())
    }

    /// Draws every mesh with the currently bound program.
    pub fn draw(&self, mode: DrawMode) {
        if !self.loaded {
            log::error!("Model not loaded: {}", self.file_path.display());
            return;
        }
        for mesh in &self.meshes {
            mesh.draw(mode);
        }
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Directory of the source file, for resolving relative assets.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(Mesh::vertex_count).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("file_path", &self.file_path)
            .field("meshes", &self.meshes.len())
            .field("loaded", &self.loaded)
            .finish()
    }
}

fn convert_vertices(mesh: &tobj::Mesh) -> Vec<Vertex> {
    let positions: Vec<[f32; 3]> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();

    // Use normals from the file if there is one per vertex, otherwise calculate them
    let normals: Vec<[f32; 3]> = if mesh.normals.len() == mesh.positions.len() {
        mesh.normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect()
    } else {
        Mesh::compute_smooth_normals(&positions, &mesh.indices)
    };

    let has_tex_coords = mesh.texcoords.len() / 2 == positions.len();

    positions
        .iter()
        .enumerate()
        .map(|(i, position)| {
            let tex_coord = if has_tex_coords {
                [mesh.texcoords[2 * i], 1.0 - mesh.texcoords[2 * i + 1]]
            } else {
                [0.0, 0.0]
            };
            Vertex::new(*position, normals[i], tex_coord)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::backend::HeadlessBackend;
    use std::io::Write;

    const QUAD_OBJ: &str = "\
o quad
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
f 1/1 2/2 3/3 4/4
";

    fn write_obj(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_triangulates_and_generates_normals() {
        let file = write_obj(QUAD_OBJ);
        let gl = Rc::new(HeadlessBackend::new());
        let mut model = Model::new(gl);
        model.load_from_file(file.path()).unwrap();

        assert!(model.is_loaded());
        assert_eq!(model.meshes().len(), 1);
        assert_eq!(model.triangle_count(), 2);

        let mesh = &model.meshes()[0];
        for vertex in mesh.vertices() {
            assert!((vertex.normal[2] - 1.0).abs() < 1e-5);
        }
        // V is flipped on import
        let first = mesh.vertices()[0];
        assert_eq!(first.tex_coord, [0.0, 1.0]);
        assert_eq!(model.directory(), file.path().parent().unwrap());
    }

    #[test]
    fn test_missing_file_is_import_error() {
        let gl = Rc::new(HeadlessBackend::new());
        let mut model = Model::new(gl);
        let err = model.load_from_file("/nonexistent/model.obj").unwrap_err();
        assert!(matches!(err, Error::Import { .. }));
        assert!(!model.is_loaded());
    }

    #[test]
    fn test_draw_before_load_is_noop() {
        let gl = Rc::new(HeadlessBackend::new());
        let model = Model::new(gl.clone());
        model.draw(DrawMode::Triangles);
        assert!(gl.draw_calls().is_empty());
    }

    #[test]
    fn test_reload_replaces_meshes() {
        let file = write_obj(QUAD_OBJ);
        let gl = Rc::new(HeadlessBackend::new());
        let mut model = Model::new(gl.clone());
        model.load_from_file(file.path()).unwrap();
        model.load_from_file(file.path()).unwrap();
        assert_eq!(model.meshes().len(), 1);
        assert_eq!(gl.live_objects().vertex_arrays, 1);
    }

    #[test]
    fn test_failed_reload_keeps_source_path() {
        let file = write_obj(QUAD_OBJ);
        let gl = Rc::new(HeadlessBackend::new());
        let mut model = Model::new(gl);
        model.load_from_file(file.path()).unwrap();

        let missing = file.path().with_file_name("missing.obj");
        assert!(model.load_from_file(&missing).is_err());

        assert!(model.is_loaded());
        assert_eq!(model.meshes().len(), 1);
        assert_eq!(model.file_path(), file.path());
        assert_eq!(model.directory(), file.path().parent().unwrap());
    }
}
