//! Editor configuration
//!
//! Every field has a default, so a config file only needs the values it changes:
//!
//! ```json
//! {
//!   "shader_dir": "assets/shaders",
//!   "render_mode": "Deferred",
//!   "camera": { "fov": 60.0 }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::gfx::camera::fly_camera::{DEFAULT_FAR, DEFAULT_FOV, DEFAULT_NEAR};
use crate::gfx::camera::Camera;
use crate::gfx::rendering::render_engine::{
    DEFAULT_CLEAR_COLOR, DEFAULT_DISPLACEMENT, DEFAULT_TESS_LEVEL,
};
use crate::gfx::rendering::{LightingModel, RenderMode, Renderer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Directory scanned for `.vert`/`.frag` pairs at startup.
    pub shader_dir: PathBuf,
    pub clear_color: [f32; 4],
    pub render_mode: RenderMode,
    pub lighting_model: LightingModel,
    pub depth_test: bool,
    pub camera: CameraConfig,
    pub tessellation: TessellationConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            window_title: "Thistle".to_string(),
            window_width: 1280,
            window_height: 720,
            shader_dir: PathBuf::from("resources/shaders"),
            clear_color: DEFAULT_CLEAR_COLOR,
            render_mode: RenderMode::Solid,
            lighting_model: LightingModel::Phong,
            depth_test: true,
            camera: CameraConfig::default(),
            tessellation: TessellationConfig::default(),
        }
    }
}

impl EditorConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Width over height, guarding against a zero-height window.
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height.max(1) as f32
    }

    /// Copies the render settings onto `renderer`.
    pub fn apply_to_renderer(&self, renderer: &mut Renderer) {
        renderer.set_clear_color(self.clear_color);
        renderer.set_render_mode(self.render_mode);
        renderer.set_lighting_model(self.lighting_model);
        renderer.enable_depth_test(self.depth_test);
        renderer.set_tess_level_outer(self.tessellation.outer_level);
        renderer.set_tess_level_inner(self.tessellation.inner_level);
        renderer.set_displacement_amount(self.tessellation.displacement);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    pub position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: DEFAULT_FOV,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            movement_speed: 2.5,
            mouse_sensitivity: 0.1,
            position: [0.0, 0.0, 5.0],
        }
    }
}

impl CameraConfig {
    pub fn build(&self, aspect: f32) -> Camera {
        let mut camera = Camera::new(self.fov, aspect, self.near, self.far);
        camera.set_position(self.position.into());
        camera.movement_speed = self.movement_speed;
        camera.mouse_sensitivity = self.mouse_sensitivity;
        camera
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TessellationConfig {
    pub outer_level: f32,
    pub inner_level: f32,
    pub displacement: f32,
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self {
            outer_level: DEFAULT_TESS_LEVEL,
            inner_level: DEFAULT_TESS_LEVEL,
            displacement: DEFAULT_DISPLACEMENT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"render_mode": "Deferred", "camera": {{"fov": 60.0}}}}"#
        )
        .unwrap();

        let config = EditorConfig::load(file.path()).unwrap();
        assert_eq!(config.render_mode, RenderMode::Deferred);
        assert_eq!(config.camera.fov, 60.0);
        assert_eq!(config.camera.far, DEFAULT_FAR);
        assert_eq!(config.shader_dir, PathBuf::from("resources/shaders"));
        assert_eq!(config.tessellation.outer_level, 4.0);
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = EditorConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn test_camera_from_config() {
        let camera = CameraConfig::default().build(2.0);
        assert_eq!(camera.position(), cgmath::Vector3::new(0.0, 0.0, 5.0));
        assert_eq!(camera.fov(), 45.0);
        assert_eq!(camera.aspect_ratio(), 2.0);
    }
}
