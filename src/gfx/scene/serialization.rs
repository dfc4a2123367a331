//! JSON scene file format
//!
//! Saving goes through the serde record types below. Loading reads a [`serde_json::Value`] and
//! extracts each field on its own, so a missing or malformed field falls back to its default
//! instead of rejecting the whole file.

use cgmath::Vector3;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::gfx::resources::Material;

use super::scene::Light;

pub const OBJECT_TYPE_PRIMITIVE: &str = "primitive";
pub const OBJECT_TYPE_MODEL: &str = "model";

#[derive(Debug, Serialize)]
pub struct SceneRecord {
    pub lights: Vec<LightRecord>,
    pub objects: Vec<ObjectRecord>,
}

#[derive(Debug, Serialize)]
pub struct LightRecord {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
}

impl From<&Light> for LightRecord {
    fn from(light: &Light) -> Self {
        Self {
            position: light.position.into(),
            color: light.color.into(),
            intensity: light.intensity,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MaterialRecord {
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
}

impl From<&Material> for MaterialRecord {
    fn from(material: &Material) -> Self {
        Self {
            ambient: material.ambient.into(),
            diffuse: material.diffuse.into(),
            specular: material.specular.into(),
            shininess: material.shininess,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    pub name: String,
    pub visible: bool,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
    pub material: MaterialRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shader: Option<String>,
    pub object_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primitive_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

/// Where a loaded object's geometry comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectSource {
    /// Primitive type name as written in the file; validated when the object is built.
    Primitive(String),
    Model {
        path: Option<String>,
        name: String,
    },
}

/// Optional material fields; absent ones keep the object's current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialPatch {
    pub ambient: Option<Vector3<f32>>,
    pub diffuse: Option<Vector3<f32>>,
    pub specular: Option<Vector3<f32>>,
    pub shininess: Option<f32>,
}

impl MaterialPatch {
    pub fn apply(&self, material: &mut Material) {
        if let Some(ambient) = self.ambient {
            material.ambient = ambient;
        }
        if let Some(diffuse) = self.diffuse {
            material.diffuse = diffuse;
        }
        if let Some(specular) = self.specular {
            material.specular = specular;
        }
        if let Some(shininess) = self.shininess {
            material.shininess = shininess;
        }
    }
}

/// One object entry of a parsed scene file, before any GPU work.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSpec {
    pub name: String,
    pub source: ObjectSource,
    pub visible: Option<bool>,
    pub position: Option<Vector3<f32>>,
    pub rotation: Option<Vector3<f32>>,
    pub scale: Option<Vector3<f32>>,
    pub material: Option<MaterialPatch>,
    pub shader: Option<String>,
}

/// A scene file parsed into plain values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneSpec {
    pub lights: Vec<Light>,
    pub objects: Vec<ObjectSpec>,
}

/// Parses scene JSON. Only invalid JSON or a non-object document is an error.
pub fn parse_scene(text: &str) -> Result<SceneSpec> {
    let document: Value = serde_json::from_str(text)?;
    if !document.is_object() {
        return Err(Error::InvalidScene(
            "top-level value is not an object".to_string(),
        ));
    }

    let lights = document
        .get("lights")
        .and_then(Value::as_array)
        .map(|lights| lights.iter().map(parse_light).collect())
        .unwrap_or_default();

    let objects = document
        .get("objects")
        .and_then(Value::as_array)
        .map(|objects| objects.iter().map(parse_object).collect())
        .unwrap_or_default();

    Ok(SceneSpec { lights, objects })
}

fn parse_light(value: &Value) -> Light {
    let mut light = Light::default();
    if let Some(position) = vec3_field(value, "position") {
        light.position = position;
    }
    if let Some(color) = vec3_field(value, "color") {
        light.color = color;
    }
    if let Some(intensity) = float_field(value, "intensity") {
        light.intensity = intensity;
    }
    light
}

fn parse_object(value: &Value) -> ObjectSpec {
    let name = string_field(value, "name").unwrap_or_else(|| "Object".to_string());

    let source = match string_field(value, "objectType").as_deref() {
        Some(OBJECT_TYPE_MODEL) => {
            let path = string_field(value, "modelPath").filter(|p| !p.is_empty());
            let name = string_field(value, "modelName")
                .or_else(|| path.as_deref().map(model_name_from_path))
                .unwrap_or_default();
            ObjectSource::Model { path, name }
        }
        _ => ObjectSource::Primitive(
            string_field(value, "primitiveType")
                .or_else(|| string_field(value, "type"))
                .unwrap_or_else(|| "Cube".to_string()),
        ),
    };

    let material = value
        .get("material")
        .filter(|m| m.is_object())
        .map(|m| MaterialPatch {
            ambient: vec3_field(m, "ambient"),
            diffuse: vec3_field(m, "diffuse"),
            specular: vec3_field(m, "specular"),
            shininess: float_field(m, "shininess"),
        });

    ObjectSpec {
        name,
        source,
        visible: value.get("visible").and_then(Value::as_bool),
        position: vec3_field(value, "position"),
        rotation: vec3_field(value, "rotation"),
        scale: vec3_field(value, "scale"),
        material,
        shader: string_field(value, "shader"),
    }
}

/// File stem of a model path, accepting either separator.
pub fn model_name_from_path(path: &str) -> String {
    let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match file.rfind('.') {
        Some(dot) if dot > 0 => file[..dot].to_string(),
        _ => file.to_string(),
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn float_field(value: &Value, key: &str) -> Option<f32> {
    value.get(key).and_then(Value::as_f64).map(|f| f as f32)
}

fn vec3_field(value: &Value, key: &str) -> Option<Vector3<f32>> {
    let array = value.get(key)?.as_array()?;
    if array.len() != 3 {
        return None;
    }
    let x = array[0].as_f64()? as f32;
    let y = array[1].as_f64()? as f32;
    let z = array[2].as_f64()? as f32;
    Some(Vector3::new(x, y, z))
}
