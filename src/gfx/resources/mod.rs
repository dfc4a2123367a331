//! # Resource Management
//!
//! Shaders, imported models and materials.
//!
//! ## Key Components
//!
//! - [`ResourceManager`] - Owns every shader and model, addressed by name or handle
//! - [`Shader`] - A linked program with cached uniform locations and hot reload
//! - [`Model`] - Flattened OBJ geometry
//! - [`Material`] - Phong material values pushed as `material.*` uniforms
//!
//! ## Handles
//!
//! Scene objects refer to shaders and models through [`ShaderHandle`] and [`ModelHandle`].
//! Releasing a resource invalidates its handle; later lookups return `None` instead of touching
//! freed GPU objects.

pub mod manager;
pub mod material;
pub mod model;
pub mod shader;

// Re-export main types
pub use manager::{ModelHandle, ResourceManager, ShaderHandle, ShaderInfo};
pub use material::Material;
pub use model::Model;
pub use shader::{Shader, ShaderSources};
