//! # Scene Management Module
//!
//! This module holds the editor's scene model: the objects being edited, their geometry and the
//! lights that shade them.
//!
//! ## Key Components
//!
//! - [`Scene`] - Ordered object list plus lights, with JSON save/load
//! - [`SceneObject`] - Transform, material, geometry and shader binding of one object
//! - [`Mesh`] - Vertex/index data and the GPU buffers mirroring it
//! - [`Vertex`] - Interleaved vertex with position, normal and texture coordinates
//!
//! ## Ownership
//!
//! A scene owns its objects. An object owns its [`Mesh`] or refers to a shared model through a
//! [`ModelHandle`](crate::gfx::resources::ModelHandle); shaders are referenced the same way.
//! Handles resolve through the [`ResourceManager`](crate::gfx::resources::ResourceManager) and
//! come back empty once the resource has been released.
//!
//! ```no_run
//! use thistle::gfx::scene::{Scene, SceneObject};
//!
//! let mut scene = Scene::new();
//! let id = scene.add_object(SceneObject::new("Empty")).id();
//! assert!(scene.object(id).is_some());
//! ```

pub mod mesh;
pub mod object;
pub mod scene;
pub mod serialization;
pub mod vertex;

// Re-export main types
pub use mesh::{DrawMode, Mesh, PATCH_VERTICES};
pub use object::{Geometry, ObjectId, SceneObject};
pub use scene::{Light, Scene};
pub use vertex::Vertex;
