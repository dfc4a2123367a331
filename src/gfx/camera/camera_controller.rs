use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use super::fly_camera::Camera;

/// Pixels of trackpad scroll that count as one wheel notch.
const PIXELS_PER_LINE: f32 = 20.0;

/// WASD fly controls with right-button mouse look and scroll zoom.
///
/// Key state is tracked from events and applied once per frame in
/// [`update_camera`](CameraController::update_camera); mouse look and zoom apply immediately.
#[derive(Debug, Default)]
pub struct CameraController {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    up: bool,
    down: bool,
    is_looking: bool,
    last_cursor: Option<(f64, f64)>,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes a window event. Returns true when the event was consumed.
    pub fn handle_window_event(&mut self, event: &WindowEvent, camera: &mut Camera) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => self.process_keyboard(*code, *state),
            WindowEvent::MouseInput { button, state, .. } => {
                self.process_mouse_button(*button, *state)
            }
            WindowEvent::CursorMoved {
                position: PhysicalPosition { x, y },
                ..
            } => self.process_cursor_moved(*x, *y, camera),
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => {
                        *y as f32 / PIXELS_PER_LINE
                    }
                };
                camera.process_mouse_scroll(lines);
                true
            }
            WindowEvent::Focused(false) => {
                self.release_all();
                false
            }
            _ => false,
        }
    }

    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> bool {
        let pressed = state == ElementState::Pressed;
        match key {
            KeyCode::KeyW => self.forward = pressed,
            KeyCode::KeyS => self.backward = pressed,
            KeyCode::KeyA => self.left = pressed,
            KeyCode::KeyD => self.right = pressed,
            KeyCode::Space => self.up = pressed,
            KeyCode::ControlLeft => self.down = pressed,
            _ => return false,
        }
        true
    }

    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) -> bool {
        if button != MouseButton::Right {
            return false;
        }
        self.is_looking = state == ElementState::Pressed;
        true
    }

    /// Rotates the camera by the cursor delta while the right button is held.
    pub fn process_cursor_moved(&mut self, x: f64, y: f64, camera: &mut Camera) -> bool {
        let previous = self.last_cursor.replace((x, y));
        let Some((last_x, last_y)) = previous else {
            return false;
        };
        if !self.is_looking {
            return false;
        }

        // Screen y grows downward
        camera.process_mouse_movement((x - last_x) as f32, (last_y - y) as f32);
        true
    }

    /// Applies held movement keys for a frame of `dt` seconds.
    pub fn update_camera(&self, camera: &mut Camera, dt: f32) {
        let axis = |positive: bool, negative: bool| (positive as i8 - negative as i8) as f32;
        let forward = axis(self.forward, self.backward);
        let strafe = axis(self.right, self.left);
        let lift = axis(self.up, self.down);
        if forward == 0.0 && strafe == 0.0 && lift == 0.0 {
            return;
        }

        let velocity = camera.movement_speed * dt;
        camera.translate_local(forward * velocity, strafe * velocity, lift * velocity);
    }

    /// Forgets held keys and buttons, e.g. when the UI takes the input or focus is lost.
    pub fn release_all(&mut self) {
        *self = Self {
            last_cursor: self.last_cursor,
            ..Self::default()
        };
    }

    pub fn is_looking(&self) -> bool {
        self.is_looking
    }

    pub fn is_moving(&self) -> bool {
        self.forward || self.backward || self.left || self.right || self.up || self.down
    }
}
