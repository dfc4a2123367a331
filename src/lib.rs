// src/lib.rs
//! Thistle scene editor
//!
//! The core of an interactive OpenGL scene editor: forward, deferred and tessellated rendering,
//! hot-reloadable shaders, a fly camera and a JSON scene model. The host application owns the
//! window and the GL context and drives an [`Editor`] each frame.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod performance;
pub mod prelude;
pub mod ui;

// Re-export main types for convenience
pub use app::Editor;
pub use config::EditorConfig;
pub use error::{Error, Result};

/// Initialises `env_logger`, honouring `RUST_LOG` and defaulting to `info`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
