//! Core rendering functionality
//!
//! Frame rendering for the editor viewport: the multi-mode [`Renderer`] and the deferred
//! shading targets it manages.

pub mod gbuffer;
pub mod render_engine;

// Re-export main types
pub use gbuffer::{GBuffer, ScreenQuad};
pub use render_engine::{LightingModel, RenderMode, RenderPath, RenderStats, Renderer, MAX_LIGHTS};
