use glam::{Mat4, Vec2, Vec3};

use crate::util::picking::Viewport;

pub const MIN_DISTANCE: f32 = 2.0;
pub const MAX_DISTANCE: f32 = 30.0;
/// Lowest pitch allowed, slightly below the horizon so the camera never dips under the floor.
const MIN_PITCH: f32 = -0.17;
const MAX_PITCH: f32 = 1.55;

/// Orbit camera around a target point.
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    aspect: f32,

    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    pub fn new() -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 60.0_f32.to_radians(),
            near: 0.1,
            far: 200.0,
            aspect: 16.0 / 9.0,
            yaw: 0.0,
            pitch: 30.0_f32.to_radians(),
            distance: 10.0,
        };
        camera.update_position();
        camera
    }

    /// Look at the room from just outside the front wall, at ceiling height.
    pub fn frame_room(&mut self, size: Vec3) {
        let eye = Vec3::new(0.0, size.y, size.z + 2.0);
        self.target = Vec3::ZERO;
        let diff = eye - self.target;
        self.distance = diff.length().clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.pitch = (diff.y / diff.length()).asin().clamp(MIN_PITCH, MAX_PITCH);
        self.yaw = diff.x.atan2(diff.z);
        self.update_position();
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn viewport(&self, screen_size: Vec2) -> Viewport {
        Viewport {
            view_proj: self.view_projection(),
            screen_size,
            camera_pos: self.position,
            camera_forward: self.forward(),
        }
    }

    /// Orbit around the target by yaw/pitch deltas (in radians).
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(MIN_PITCH, MAX_PITCH);
        self.update_position();
    }

    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - delta).clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.update_position();
    }

    /// Pan the target (and camera) in the camera's local XY plane.
    pub fn pan(&mut self, delta_x: f32, delta_y: f32) {
        let forward = self.forward();
        let right = forward.cross(self.up).normalize_or_zero();
        let cam_up = right.cross(forward).normalize_or_zero();

        self.target += right * delta_x + cam_up * delta_y;
        self.update_position();
    }

    fn update_position(&mut self) {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.position = self.target + Vec3::new(x, y, z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_room_from_the_front() {
        let mut cam = Camera::new();
        cam.frame_room(Vec3::new(4.0, 3.0, 5.0));
        assert!(cam.position.abs_diff_eq(Vec3::new(0.0, 3.0, 7.0), 1e-4));
        assert_eq!(cam.target, Vec3::ZERO);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut cam = Camera::new();
        cam.zoom(100.0);
        assert_eq!(cam.distance, MIN_DISTANCE);
        cam.zoom(-100.0);
        assert_eq!(cam.distance, MAX_DISTANCE);
    }

    #[test]
    fn orbit_stays_above_floor() {
        let mut cam = Camera::new();
        cam.orbit(0.0, -10.0);
        assert_eq!(cam.pitch, MIN_PITCH);
        assert!(cam.position.y > -0.2 * cam.distance);
    }
}
