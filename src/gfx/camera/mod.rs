pub mod camera_controller;
pub mod fly_camera;

// Re-export main types
pub use camera_controller::CameraController;
pub use fly_camera::Camera;
