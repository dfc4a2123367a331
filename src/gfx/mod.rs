//! # Graphics Module
//!
//! Everything between the editor and the GPU.
//!
//! ## Architecture Overview
//!
//! - **Backend** ([`backend`]) - The [`GraphicsApi`] seam, with a `glow` implementation and a
//!   recording headless one
//! - **Camera System** ([`camera`]) - Fly camera and its input controller
//! - **Geometry** ([`geometry`]) - Procedural primitives
//! - **Rendering Pipeline** ([`rendering`]) - Forward, deferred and tessellated paths
//! - **Resource Management** ([`resources`]) - Named shader and model caches, materials
//! - **Scene Management** ([`scene`]) - Objects, lights and the JSON scene format
//!
//! ## Usage
//!
//! ```no_run
//! use std::rc::Rc;
//! use thistle::gfx::{backend::HeadlessBackend, Camera, Renderer, ResourceManager, Scene};
//!
//! let gl = Rc::new(HeadlessBackend::new());
//! let mut resources = ResourceManager::new(gl.clone(), "resources/shaders");
//! let scene = Scene::new();
//! let camera = Camera::new(45.0, 16.0 / 9.0, 0.1, 1000.0);
//! let mut renderer = Renderer::new(gl, 1280, 720);
//! renderer.initialize();
//! renderer.begin_frame();
//! renderer.render(&scene, &camera, &mut resources);
//! renderer.end_frame();
//! ```
//!
//! [`GraphicsApi`]: backend::GraphicsApi

pub mod backend;
pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::{Camera, CameraController};
pub use rendering::{LightingModel, RenderMode, Renderer};
pub use resources::{Material, ResourceManager};
pub use scene::{Scene, SceneObject};
