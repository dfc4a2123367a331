use std::cell::Cell;
use std::f32::consts::TAU;

use cgmath::{Deg, InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4};

use crate::gfx::backend::Capability;
use crate::gfx::camera::Camera;
use crate::gfx::geometry::PrimitiveKind;
use crate::gfx::resources::{Material, ModelHandle, ResourceManager, ShaderHandle};

use super::mesh::{DrawMode, Mesh};

/// Shader used by [`SceneObject::draw_highlight`].
pub const HIGHLIGHT_SHADER: &str = "highlight";

const HIGHLIGHT_COLOR: [f32; 4] = [1.0, 0.6, 0.0, 0.3];
const HIGHLIGHT_PULSE_SPEED: f32 = 3.0;

/// Identity of an object within its scene. Never reused by that scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectId(pub u64);

/// What an object draws: an owned mesh, a shared model, or nothing yet.
#[derive(Debug, Default)]
pub enum Geometry {
    #[default]
    None,
    Mesh(Mesh),
    Model(ModelHandle),
}

/// One drawable entry in a scene.
///
/// The transform is composed as translate · rotateX · rotateY · rotateZ · scale with Euler
/// angles in degrees. It is cached and rebuilt lazily after any setter changes a component.
#[derive(Debug)]
pub struct SceneObject {
    id: ObjectId,
    name: String,
    visible: bool,
    highlighted: bool,

    position: Vector3<f32>,
    rotation: Vector3<f32>,
    scale: Vector3<f32>,
    transform: Cell<Matrix4<f32>>,
    transform_dirty: Cell<bool>,

    material: Material,
    geometry: Geometry,
    shader: Option<ShaderHandle>,
    primitive: Option<PrimitiveKind>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ObjectId::default(),
            name: name.into(),
            visible: true,
            highlighted: false,
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
            transform: Cell::new(Matrix4::identity()),
            transform_dirty: Cell::new(false),
            material: Material::default(),
            geometry: Geometry::None,
            shader: None,
            primitive: None,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: ObjectId) {
        self.id = id;
    }

    /// Per-frame hook; objects are static for now.
    pub fn update(&mut self, _dt: f32) {}

    /// Draws the mesh or model with the program the caller bound.
    ///
    /// Does nothing when the object is hidden or has no shader.
    pub fn draw(&self, resources: &ResourceManager, mode: DrawMode) {
        if !self.visible || self.shader.is_none() {
            return;
        }
        self.draw_geometry(resources, mode);
    }

    fn draw_geometry(&self, resources: &ResourceManager, mode: DrawMode) {
        match &self.geometry {
            Geometry::Mesh(mesh) => mesh.draw(mode),
            Geometry::Model(handle) => match resources.model(*handle) {
                Some(model) => model.draw(mode),
                None => log::debug!("Model of '{}' has been released", self.name),
            },
            Geometry::None => {}
        }
    }

    /// Draws the pulsing selection overlay with the `highlight` shader.
    ///
    /// Alpha blending is enabled for this draw only. Returns whether anything was drawn.
    pub fn draw_highlight(&self, resources: &ResourceManager, camera: &Camera, time: f32) -> bool {
        if !self.visible || !self.highlighted {
            return false;
        }
        let Some(shader) = resources.shader_by_name(HIGHLIGHT_SHADER) else {
            return false;
        };

        let gl = resources.gl();
        gl.set_capability(Capability::Blend, true);
        gl.set_alpha_blending();

        shader.use_program();
        shader.set_vec4("highlightColor", Vector4::from(HIGHLIGHT_COLOR));
        shader.set_float("highlightPulse", highlight_pulse(time));
        shader.set_mat4("model", &self.transform());
        shader.set_mat4("view", &camera.view_matrix());
        shader.set_mat4("projection", &camera.projection_matrix());
        self.draw_geometry(resources, DrawMode::Triangles);

        gl.set_capability(Capability::Blend, false);
        true
    }

    // Transform

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
        self.transform_dirty.set(true);
    }

    /// Euler angles in degrees.
    pub fn rotation(&self) -> Vector3<f32> {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Vector3<f32>) {
        self.rotation = rotation;
        self.transform_dirty.set(true);
    }

    pub fn scale(&self) -> Vector3<f32> {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vector3<f32>) {
        self.scale = scale;
        self.transform_dirty.set(true);
    }

    /// The model matrix, rebuilt only if a component changed since the last call.
    pub fn transform(&self) -> Matrix4<f32> {
        if self.transform_dirty.get() {
            self.transform.set(compose_transform(
                self.position,
                self.rotation,
                self.scale,
            ));
            self.transform_dirty.set(false);
        }
        self.transform.get()
    }

    /// Whether the next [`transform`](Self::transform) call recomputes the matrix.
    pub fn is_transform_dirty(&self) -> bool {
        self.transform_dirty.get()
    }

    /// Replaces the matrix directly.
    ///
    /// Position and scale are read back from the translation column and the basis column
    /// lengths. Rotation is left as it was.
    pub fn set_transform(&mut self, matrix: Matrix4<f32>) {
        self.position = matrix.w.truncate();
        self.scale = Vector3::new(
            matrix.x.truncate().magnitude(),
            matrix.y.truncate().magnitude(),
            matrix.z.truncate().magnitude(),
        );
        self.transform.set(matrix);
        self.transform_dirty.set(false);
    }

    // Geometry

    /// Takes ownership of `mesh`, dropping any model reference.
    pub fn set_mesh(&mut self, mesh: Mesh) {
        self.geometry = Geometry::Mesh(mesh);
    }

    /// References a shared model, dropping any owned mesh.
    pub fn set_model(&mut self, model: ModelHandle) {
        self.geometry = Geometry::Model(model);
        self.primitive = None;
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.geometry {
            Geometry::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.geometry {
            Geometry::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn model(&self) -> Option<ModelHandle> {
        match self.geometry {
            Geometry::Model(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn has_model(&self) -> bool {
        matches!(self.geometry, Geometry::Model(_))
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Shape this object was created as, if it is a primitive.
    pub fn primitive(&self) -> Option<PrimitiveKind> {
        self.primitive
    }

    pub fn set_primitive(&mut self, primitive: Option<PrimitiveKind>) {
        self.primitive = primitive;
    }

    // Appearance

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn set_highlighted(&mut self, highlighted: bool) {
        self.highlighted = highlighted;
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut Material {
        &mut self.material
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn shader(&self) -> Option<ShaderHandle> {
        self.shader
    }

    pub fn set_shader(&mut self, shader: Option<ShaderHandle>) {
        self.shader = shader;
    }
}

/// translate · rotateX · rotateY · rotateZ · scale, angles in degrees.
pub fn compose_transform(
    position: Vector3<f32>,
    rotation: Vector3<f32>,
    scale: Vector3<f32>,
) -> Matrix4<f32> {
    Matrix4::from_translation(position)
        * Matrix4::from_angle_x(Deg(rotation.x))
        * Matrix4::from_angle_y(Deg(rotation.y))
        * Matrix4::from_angle_z(Deg(rotation.z))
        * Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z)
}

/// Highlight animation phase in [0, 2π).
pub fn highlight_pulse(time: f32) -> f32 {
    (time * HIGHLIGHT_PULSE_SPEED).rem_euclid(TAU)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::backend::HeadlessBackend;
    use std::rc::Rc;

    #[test]
    fn test_transform_is_lazy() {
        let mut object = SceneObject::new("Cube_1");
        object.set_position(Vector3::new(1.0, 2.0, 3.0));
        assert!(object.is_transform_dirty());

        let first = object.transform();
        assert!(!object.is_transform_dirty());
        assert_eq!(first, object.transform());
        assert_eq!(first.w, Vector4::new(1.0, 2.0, 3.0, 1.0));
    }

    #[test]
    fn test_set_transform_recovers_position_and_scale_only() {
        let mut object = SceneObject::new("Cube_1");
        object.set_rotation(Vector3::new(10.0, 0.0, 0.0));
        let matrix = compose_transform(
            Vector3::new(4.0, 5.0, 6.0),
            Vector3::new(0.0, 45.0, 0.0),
            Vector3::new(2.0, 3.0, 4.0),
        );
        object.set_transform(matrix);

        assert_eq!(object.position(), Vector3::new(4.0, 5.0, 6.0));
        let scale = object.scale();
        assert!((scale - Vector3::new(2.0, 3.0, 4.0)).magnitude() < 1e-5);
        assert_eq!(object.rotation(), Vector3::new(10.0, 0.0, 0.0));
        assert_eq!(object.transform(), matrix);
    }

    #[test]
    fn test_mesh_and_model_are_exclusive() {
        let gl: Rc<HeadlessBackend> = Rc::new(HeadlessBackend::new());
        let mut object = SceneObject::new("thing");
        object.set_mesh(Mesh::new(gl));
        assert!(object.mesh().is_some());
        assert!(object.model().is_none());

        object.set_model(ModelHandle::default());
        assert!(object.mesh().is_none());
        assert!(object.has_model());

        let gl: Rc<HeadlessBackend> = Rc::new(HeadlessBackend::new());
        object.set_mesh(Mesh::new(gl));
        assert!(object.model().is_none());
    }

    #[test]
    fn test_pulse_wraps() {
        assert_eq!(highlight_pulse(0.0), 0.0);
        let p = highlight_pulse(1000.0);
        assert!((0.0..TAU).contains(&p));
    }
}
