//! # Thistle Prelude
//!
//! Commonly used types in one import:
//!
//! ```rust
//! use thistle::prelude::*;
//! ```

// Core application types
pub use crate::app::Editor;
pub use crate::config::EditorConfig;
pub use crate::error::{Error, Result};

// Graphics and scene types
pub use crate::gfx::backend::{GlowBackend, GraphicsApi, HeadlessBackend};
pub use crate::gfx::camera::{Camera, CameraController};
pub use crate::gfx::geometry::{create_primitive_object, PrimitiveKind};
pub use crate::gfx::rendering::{LightingModel, RenderMode, RenderPath, Renderer};
pub use crate::gfx::resources::{Material, ModelHandle, ResourceManager, ShaderHandle};
pub use crate::gfx::scene::{Light, ObjectId, Scene, SceneObject};

// UI
pub use crate::ui::{UiRequest, UiState};
pub use imgui::Ui;
