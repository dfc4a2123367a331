use std::fs;
use std::path::Path;

use cgmath::Vector3;

use crate::error::{Error, Result};
use crate::gfx::geometry::{create_primitive_object, PrimitiveKind, DEFAULT_SHADER};
use crate::gfx::resources::{Material, ResourceManager, ShaderHandle};

use super::object::{ObjectId, SceneObject};
use super::serialization::{
    self, LightRecord, ObjectRecord, ObjectSource, ObjectSpec, SceneRecord, OBJECT_TYPE_MODEL,
    OBJECT_TYPE_PRIMITIVE,
};

/// A point light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vector3<f32>,
    pub color: Vector3<f32>,
    pub intensity: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 10.0, 10.0),
            color: Vector3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
        }
    }
}

impl Light {
    pub fn new(position: Vector3<f32>, color: Vector3<f32>, intensity: f32) -> Self {
        Self {
            position,
            color,
            intensity,
        }
    }
}

/// Objects in draw order plus the light list.
///
/// Lights are addressed by index. Removing a light shifts the indices of every light after it,
/// so indices must not be held across removals.
#[derive(Debug)]
pub struct Scene {
    objects: Vec<SceneObject>,
    lights: Vec<Light>,
    next_id: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// An empty scene with one default light.
    pub fn new() -> Self {
        let mut scene = Self {
            objects: Vec::new(),
            lights: Vec::new(),
            next_id: 0,
        };
        scene.add_default_light();
        scene
    }

    pub fn update(&mut self, dt: f32) {
        for object in &mut self.objects {
            object.update(dt);
        }
    }

    // Objects

    /// Appends `object` and returns it with its newly assigned id.
    pub fn add_object(&mut self, mut object: SceneObject) -> &mut SceneObject {
        self.next_id += 1;
        object.set_id(ObjectId(self.next_id));
        self.objects.push(object);
        let last = self.objects.len() - 1;
        &mut self.objects[last]
    }

    /// Removes the object with `id`; `None` if no such object exists.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<SceneObject> {
        let index = self.objects.iter().position(|o| o.id() == id)?;
        Some(self.objects.remove(index))
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id() == id)
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut [SceneObject] {
        &mut self.objects
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn clear_objects(&mut self) {
        self.objects.clear();
    }

    // Lights

    /// Adds a white light at (5, 5, 5) with intensity 2 and returns its index.
    pub fn add_default_light(&mut self) -> usize {
        self.add_light(Light::new(
            Vector3::new(5.0, 5.0, 5.0),
            Vector3::new(1.0, 1.0, 1.0),
            2.0,
        ))
    }

    pub fn add_light(&mut self, light: Light) -> usize {
        self.lights.push(light);
        self.lights.len() - 1
    }

    /// Removes the light at `index`. Out-of-range indices are ignored.
    ///
    /// Lights after `index` move down by one, so indices held across a removal go stale.
    pub fn remove_light(&mut self, index: usize) -> Option<Light> {
        (index < self.lights.len()).then(|| self.lights.remove(index))
    }

    pub fn light(&self, index: usize) -> Option<&Light> {
        self.lights.get(index)
    }

    pub fn light_mut(&mut self, index: usize) -> Option<&mut Light> {
        self.lights.get_mut(index)
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn clear_lights(&mut self) {
        self.lights.clear();
    }

    // Persistence

    /// Serializes the scene as pretty-printed JSON.
    ///
    /// Shader and model names are resolved through `resources`.
    pub fn to_json(&self, resources: &ResourceManager) -> Result<String> {
        let record = SceneRecord {
            lights: self.lights.iter().map(LightRecord::from).collect(),
            objects: self
                .objects
                .iter()
                .map(|object| object_record(object, resources))
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&record)?)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>, resources: &ResourceManager) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json(resources)?;
        fs::write(path, json).map_err(|err| {
            log::error!("Failed to open file for writing: {}: {}", path.display(), err);
            Error::Io(err)
        })?;
        log::info!("Saved scene to {}", path.display());
        Ok(())
    }

    /// Replaces the scene with the contents of a JSON scene file.
    ///
    /// The file is parsed before anything is cleared, so an unreadable or malformed file leaves
    /// the scene untouched. Objects whose model or primitive cannot be created are skipped.
    pub fn load_from_file(
        &mut self,
        path: impl AsRef<Path>,
        resources: &mut ResourceManager,
    ) -> Result<()> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| {
            log::error!("Failed to open file for reading: {}", path.display());
            Error::FileRead {
                path: path.to_path_buf(),
                source,
            }
        })?;
        self.load_from_json(&text, resources).map_err(|err| {
            log::error!("Error loading scene from {}: {}", path.display(), err);
            err
        })?;
        log::info!(
            "Loaded scene from {} ({} objects, {} lights)",
            path.display(),
            self.objects.len(),
            self.lights.len()
        );
        Ok(())
    }

    /// Like [`load_from_file`](Self::load_from_file) for JSON text already in memory.
    pub fn load_from_json(&mut self, text: &str, resources: &mut ResourceManager) -> Result<()> {
        let spec = serialization::parse_scene(text)?;

        self.objects.clear();
        self.lights = spec.lights;
        if self.lights.is_empty() {
            self.lights.push(Light::new(
                Vector3::new(5.0, 5.0, 5.0),
                Vector3::new(1.0, 1.0, 1.0),
                1.0,
            ));
        }

        for object in spec.objects {
            let name = object.name.clone();
            match build_object(object, resources) {
                Ok(object) => {
                    self.add_object(object);
                }
                Err(err) => log::warn!("Skipping object '{}': {}", name, err),
            }
        }
        Ok(())
    }
}

fn object_record(object: &SceneObject, resources: &ResourceManager) -> ObjectRecord {
    let material = object.material();
    let mut record = ObjectRecord {
        name: object.name().to_string(),
        visible: object.is_visible(),
        position: object.position().into(),
        rotation: object.rotation().into(),
        scale: object.scale().into(),
        material: material.into(),
        shader: object
            .shader()
            .and_then(|h| resources.shader_name(h))
            .map(str::to_string),
        object_type: OBJECT_TYPE_PRIMITIVE,
        primitive_type: None,
        model_path: None,
        model_name: None,
    };

    match object.model() {
        Some(handle) => {
            record.object_type = OBJECT_TYPE_MODEL;
            match resources.model(handle) {
                Some(model) => {
                    let path = model.file_path().to_string_lossy().into_owned();
                    record.model_name = Some(serialization::model_name_from_path(&path));
                    record.model_path = Some(path);
                }
                None => log::warn!(
                    "Object '{}' refers to a released model; it is saved without a model path and will not load back",
                    object.name()
                ),
            }
        }
        None => {
            let kind = object
                .primitive()
                .unwrap_or_else(|| PrimitiveKind::from_object_name(object.name()));
            record.primitive_type = Some(kind.to_string());
        }
    }
    record
}

fn build_object(spec: ObjectSpec, resources: &mut ResourceManager) -> Result<SceneObject> {
    let mut object = match &spec.source {
        ObjectSource::Primitive(kind) => {
            let kind: PrimitiveKind = kind.parse()?;
            create_primitive_object(kind, &spec.name, resources)?
        }
        ObjectSource::Model { path, name } => {
            let path = path.as_ref().ok_or_else(|| {
                Error::InvalidScene(format!("model path missing for object '{}'", spec.name))
            })?;
            let normalized = path.replace('\\', "/");
            let handle = resources.load_model(name, &normalized)?;

            let mut object = SceneObject::new(spec.name.as_str());
            object.set_model(handle);
            object.set_material(Material::editor_default());
            object.set_shader(resources.shader_handle(DEFAULT_SHADER));
            object
        }
    };

    if let Some(visible) = spec.visible {
        object.set_visible(visible);
    }
    if let Some(position) = spec.position {
        object.set_position(position);
    }
    if let Some(rotation) = spec.rotation {
        object.set_rotation(rotation);
    }
    if let Some(scale) = spec.scale {
        object.set_scale(scale);
    }
    if let Some(patch) = &spec.material {
        patch.apply(object.material_mut());
    }
    if let Some(shader) = &spec.shader {
        if let Some(handle) = resolve_shader(shader, resources) {
            object.set_shader(Some(handle));
        }
    }
    Ok(object)
}

/// The named shader, loading it from the shader directory if needed, else the default shader.
fn resolve_shader(name: &str, resources: &mut ResourceManager) -> Option<ShaderHandle> {
    if let Some(handle) = resources.shader_handle(name) {
        return Some(handle);
    }
    match resources.ensure_shader(name) {
        Ok(handle) => Some(handle),
        Err(_) => {
            log::warn!("Shader '{}' not found, using '{}'", name, DEFAULT_SHADER);
            resources.shader_handle(DEFAULT_SHADER)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_scene_has_default_light() {
        let scene = Scene::new();
        assert_eq!(scene.lights().len(), 1);
        let light = scene.light(0).unwrap();
        assert_eq!(light.position, Vector3::new(5.0, 5.0, 5.0));
        assert_eq!(light.intensity, 2.0);
    }

    #[test]
    fn test_light_indices_out_of_range_are_safe() {
        let mut scene = Scene::new();
        assert!(scene.light(3).is_none());
        assert!(scene.remove_light(3).is_none());
        assert_eq!(scene.lights().len(), 1);
        assert!(scene.remove_light(0).is_some());
        assert!(scene.lights().is_empty());
    }

    #[test]
    fn test_object_ids_are_not_reused() {
        let mut scene = Scene::new();
        let a = scene.add_object(SceneObject::new("a")).id();
        let b = scene.add_object(SceneObject::new("b")).id();
        assert_ne!(a, b);

        assert!(scene.remove_object(a).is_some());
        assert!(scene.remove_object(a).is_none());
        let c = scene.add_object(SceneObject::new("c")).id();
        assert_ne!(a, c);
        assert_eq!(scene.objects()[0].name(), "b");
        assert_eq!(scene.object(c).map(SceneObject::name), Some("c"));
    }
}
