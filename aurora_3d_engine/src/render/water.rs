/// Water plane clipping and the reflection camera
///
/// The water surface is the horizontal plane `y = water_level`. Clip planes are `(normal, distance)`: geometry with
/// `dot(normal, p) + distance < 0` is clipped.

use glam::{Vec3, Vec4};
use crate::camera::Camera;

/// Default height of the water surface in world space
pub const DEFAULT_WATER_LEVEL: f32 = -4.0;

/// Gap between the water surface and the reflection/refraction clip planes
pub const WATER_CLIP_PLANE_OFFSET: f32 = 0.08;

/// Clip plane far enough to never clip anything
pub const DEFAULT_CLIP_PLANE: Vec4 = Vec4::new(0.0, -1.0, 0.0, 100_000.0);

/// Keeps what is above the water, for the reflection pass
pub fn reflection_clip_plane(water_level: f32) -> Vec4 {
    Vec4::new(0.0, 1.0, 0.0, -(water_level + WATER_CLIP_PLANE_OFFSET))
}

/// Keeps what is below the water, for the refraction pass
pub fn refraction_clip_plane(water_level: f32) -> Vec4 {
    Vec4::new(0.0, -1.0, 0.0, water_level + WATER_CLIP_PLANE_OFFSET)
}

fn mirror_height(y: f32, water_level: f32) -> f32 {
    y - 2.0 * (y - water_level)
}

/// `camera` mirrored about the water plane
pub fn reflection_camera(camera: &Camera, water_level: f32) -> Camera {
    let mut position = camera.position();
    let mut target = position + camera.forward();
    position.y = mirror_height(position.y, water_level);
    target.y = mirror_height(target.y, water_level);

    let up = reflect(-camera.up(), camera.default_up());

    let mut reflected = camera.clone();
    reflected.set_position(position);
    reflected.set_orientation(target - position, up);
    reflected
}

/// Reflect `incident` about the plane with normal `normal`
fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}

#[cfg(test)]
#[path = "water_tests.rs"]
mod tests;
