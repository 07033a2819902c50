/// Camera - viewpoint the lit passes render from.
///
/// Holds position, orientation vectors and the perspective parameters; the
/// view matrix and the projection for a given target size are derived on
/// demand. Moving the camera is the application's job.

use glam::{Mat4, Vec3};
use super::frustum::Frustum;

/// Default near clipping distance
pub const DEFAULT_NEAR: f32 = 0.1;

/// Default far clipping distance
pub const DEFAULT_FAR: f32 = 300.0;

/// Default vertical field of view (45 degrees)
pub const DEFAULT_VERTICAL_FOV: f32 = std::f32::consts::FRAC_PI_4;

/// Perspective camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Vec3,
    forward: Vec3,
    up: Vec3,
    /// World up the camera was set up with
    default_up: Vec3,
    vertical_fov: f32,
    near: f32,
    far: f32,
}

impl Camera {
    /// Camera at `position` looking along `forward` (normalized here)
    pub fn new(position: Vec3, forward: Vec3, up: Vec3) -> Self {
        Self {
            position,
            forward: forward.normalize_or_zero(),
            up: up.normalize_or_zero(),
            default_up: Vec3::Y,
            vertical_fov: DEFAULT_VERTICAL_FOV,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
        }
    }

    /// Camera at `position` looking at `target`, world up +Y
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let forward = (target - position).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        Self::new(position, forward, right.cross(forward))
    }

    // ===== GETTERS =====

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.forward.cross(self.up).normalize_or_zero()
    }

    pub fn default_up(&self) -> Vec3 {
        self.default_up
    }

    /// Vertical field of view in radians
    pub fn vertical_fov(&self) -> f32 {
        self.vertical_fov
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    // ===== DERIVED =====

    /// World to view transform
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward, self.up)
    }

    /// Perspective projection for a `width` x `height` target (0..1 depth)
    pub fn projection_matrix(&self, width: u32, height: u32) -> Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Mat4::perspective_rh(self.vertical_fov, aspect, self.near, self.far)
    }

    /// Culling volume for a `width` x `height` target
    pub fn frustum(&self, width: u32, height: u32) -> Frustum {
        Frustum::new(&self.projection_matrix(width, height), &self.view_matrix())
    }

    // ===== SETTERS =====

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_orientation(&mut self, forward: Vec3, up: Vec3) {
        self.forward = forward.normalize_or_zero();
        self.up = up.normalize_or_zero();
    }

    pub fn set_default_up(&mut self, default_up: Vec3) {
        self.default_up = default_up.normalize_or_zero();
    }

    /// Set field of view (radians) and clipping distances
    pub fn set_perspective(&mut self, vertical_fov: f32, near: f32, far: f32) {
        self.vertical_fov = vertical_fov;
        self.near = near;
        self.far = far;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y)
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
