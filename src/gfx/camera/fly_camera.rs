use cgmath::{perspective, Deg, InnerSpace, Matrix4, Point3, Vector3};

pub const DEFAULT_FOV: f32 = 45.0;
pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 1000.0;
pub const MIN_FOV: f32 = 1.0;
pub const MAX_FOV: f32 = 90.0;
pub const PITCH_LIMIT: f32 = 89.0;

/// Free-flying perspective camera driven by yaw/pitch Euler angles.
///
/// View and projection matrices are cached and rebuilt by every setter that affects them.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    position: Vector3<f32>,
    front: Vector3<f32>,
    up: Vector3<f32>,
    right: Vector3<f32>,
    world_up: Vector3<f32>,

    yaw: f32,
    pitch: f32,

    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,

    pub movement_speed: f32,
    pub mouse_sensitivity: f32,

    view: Matrix4<f32>,
    projection: Matrix4<f32>,
}

impl Camera {
    /// Camera at (0, 0, 5) looking down -Z.
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Vector3::new(0.0, 0.0, 5.0),
            front: Vector3::new(0.0, 0.0, -1.0),
            up: Vector3::unit_y(),
            right: Vector3::unit_x(),
            world_up: Vector3::unit_y(),
            yaw: -90.0,
            pitch: 0.0,
            fov: fov.clamp(MIN_FOV, MAX_FOV),
            aspect,
            near,
            far,
            movement_speed: 2.5,
            mouse_sensitivity: 0.1,
            view: Matrix4::from_scale(1.0),
            projection: Matrix4::from_scale(1.0),
        };
        camera.update_vectors();
        camera.update_projection_matrix();
        camera
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
        self.update_view_matrix();
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn world_up(&self) -> Vector3<f32> {
        self.world_up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Sets both angles in degrees; pitch is clamped to avoid flipping over the pole.
    pub fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov.clamp(MIN_FOV, MAX_FOV);
        self.update_projection_matrix();
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect
    }

    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_projection_matrix();
    }

    pub fn near_plane(&self) -> f32 {
        self.near
    }

    pub fn set_near_plane(&mut self, near: f32) {
        self.near = near;
        self.update_projection_matrix();
    }

    pub fn far_plane(&self) -> f32 {
        self.far
    }

    pub fn set_far_plane(&mut self, far: f32) {
        self.far = far;
        self.update_projection_matrix();
    }

    /// Moves along the camera basis; `forward`, `strafe` and `lift` are signed distances.
    pub fn translate_local(&mut self, forward: f32, strafe: f32, lift: f32) {
        self.position += self.front * forward + self.right * strafe + self.world_up * lift;
        self.update_view_matrix();
    }

    /// Applies a mouse delta in pixels, scaled by the sensitivity.
    pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32) {
        let yaw = self.yaw + x_offset * self.mouse_sensitivity;
        let pitch = self.pitch + y_offset * self.mouse_sensitivity;
        self.set_orientation(yaw, pitch);
    }

    /// Scroll zoom narrows or widens the field of view.
    pub fn process_mouse_scroll(&mut self, y_offset: f32) {
        self.set_fov(self.fov - y_offset);
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        let front = Vector3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        );
        self.front = front.normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
        self.update_view_matrix();
    }

    fn update_view_matrix(&mut self) {
        let eye = Point3::new(self.position.x, self.position.y, self.position.z);
        self.view = Matrix4::look_at_rh(eye, eye + self.front, self.up);
    }

    fn update_projection_matrix(&mut self) {
        self.projection = perspective(Deg(self.fov), self.aspect, self.near, self.far);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(DEFAULT_FOV, 16.0 / 9.0, DEFAULT_NEAR, DEFAULT_FAR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-5
    }

    #[test]
    fn test_default_orientation_looks_down_negative_z() {
        let camera = Camera::default();
        assert!(approx(camera.front(), Vector3::new(0.0, 0.0, -1.0)));
        assert!(approx(camera.right(), Vector3::new(1.0, 0.0, 0.0)));
        assert!(approx(camera.up(), Vector3::new(0.0, 1.0, 0.0)));
        assert_eq!(camera.position(), Vector3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = Camera::default();
        camera.process_mouse_movement(0.0, 10_000.0);
        assert_eq!(camera.pitch(), PITCH_LIMIT);
        camera.process_mouse_movement(0.0, -20_000.0);
        assert_eq!(camera.pitch(), -PITCH_LIMIT);
    }

    #[test]
    fn test_scroll_clamps_fov() {
        let mut camera = Camera::default();
        camera.process_mouse_scroll(100.0);
        assert_eq!(camera.fov(), MIN_FOV);
        camera.process_mouse_scroll(-500.0);
        assert_eq!(camera.fov(), MAX_FOV);
    }

    #[test]
    fn test_view_matrix_moves_world_opposite_to_camera() {
        let mut camera = Camera::default();
        camera.set_position(Vector3::new(0.0, 0.0, 0.0));
        let origin_ahead = camera.view_matrix() * cgmath::Vector4::new(0.0, 0.0, -3.0, 1.0);
        assert!((origin_ahead.z + 3.0).abs() < 1e-5);

        camera.translate_local(1.0, 0.0, 0.0);
        assert!(approx(camera.position(), Vector3::new(0.0, 0.0, -1.0)));
    }
}
