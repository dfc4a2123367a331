//! Error types
//!
//! Every fallible operation in the crate returns [`Result<T>`]. Failures are recovered at the
//! lowest layer that can do something sensible (the renderer falls back to forward shading, a
//! failed shader reload keeps the previous program) and only the message travels upward.

use std::path::PathBuf;

use thiserror::Error;

use crate::gfx::backend::{FramebufferStatus, ShaderStage};

#[derive(Error, Debug)]
pub enum Error {
    /// A source or asset file could not be opened or read.
    #[error("failed to read `{}`: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The scene file is not valid JSON.
    #[error("scene file could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),

    /// The scene file is JSON but not a scene.
    #[error("invalid scene file: {0}")]
    InvalidScene(String),

    /// GLSL compilation failed; `log` is the driver's text, unmodified.
    #[error("ERROR::SHADER::{stage}::COMPILATION_FAILED\n{log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("ERROR::SHADER::PROGRAM::LINKING_FAILED\n{log}")]
    ShaderLink { log: String },

    #[error("failed to import model `{}`: {reason}", path.display())]
    Import { path: PathBuf, reason: String },

    #[error("G-buffer framebuffer is incomplete: {0}")]
    FramebufferIncomplete(FramebufferStatus),

    /// The context cannot provide a feature (for example tessellation below 4.0).
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The backend refused to create an object.
    #[error("graphics backend error: {0}")]
    Backend(String),

    #[error("unknown primitive type `{0}`")]
    UnknownPrimitive(String),

    #[error("resource `{0}` not found")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_keeps_driver_log() {
        let err = Error::ShaderCompile {
            stage: ShaderStage::Fragment,
            log: "0:12(3): error: `colour' undeclared".to_string(),
        };
        let text = err.to_string();
        assert!(text.starts_with("ERROR::SHADER::FRAGMENT::COMPILATION_FAILED"));
        assert!(text.ends_with("0:12(3): error: `colour' undeclared"));
    }

    #[test]
    fn test_file_read_mentions_path() {
        let err = Error::FileRead {
            path: PathBuf::from("shaders/missing.vert"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("shaders/missing.vert"));
    }
}
