/// Frustum - six clipping planes plus the corner points of a view volume
///
/// Planes are (A, B, C, D) with an inward unit normal: a point P is inside
/// when `dot(plane.xyz, P) + plane.w >= 0` for all six planes.
/// Depth follows the 0..1 clip range used by Vulkan and glam's `_rh` matrices.

use glam::{Mat4, Vec3, Vec4};

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Corners of the clip volume, near face first (x, y in -1..1, z in 0..1)
const CLIP_CORNERS: [Vec3; 8] = [
    Vec3::new(-1.0, 1.0, 0.0),
    Vec3::new(1.0, 1.0, 0.0),
    Vec3::new(1.0, -1.0, 0.0),
    Vec3::new(-1.0, -1.0, 0.0),
    Vec3::new(-1.0, 1.0, 1.0),
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(-1.0, -1.0, 1.0),
];

/// Culling volume of a camera or a light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract the planes of `projection * view` (Gribb & Hartmann)
    pub fn from_view_projection(view_projection: &Mat4) -> Self {
        let row = |i: usize| view_projection.row(i);
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        // Zero-to-one depth: the near plane is row 2 alone
        let mut planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2];
        for plane in &mut planes {
            let length = plane.truncate().length();
            if length > 0.0 {
                *plane /= length;
            }
        }

        Self { planes }
    }

    pub fn new(projection: &Mat4, view: &Mat4) -> Self {
        Self::from_view_projection(&(*projection * *view))
    }

    /// Signed distance of `point` to plane `index` (positive = inside)
    pub fn distance(&self, index: usize, point: Vec3) -> f32 {
        self.planes[index].truncate().dot(point) + self.planes[index].w
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        (0..6).all(|i| self.distance(i, point) >= 0.0)
    }

    /// Conservative sphere test (no false negatives)
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        (0..6).all(|i| self.distance(i, center) >= -radius)
    }
}

/// World-space corners of the volume `view_projection` maps to clip space
///
/// Near face first, then far face, both in the same winding.
pub fn frustum_corners(view_projection: &Mat4) -> [Vec3; 8] {
    let inverse = view_projection.inverse();
    CLIP_CORNERS.map(|corner| {
        let world = inverse * corner.extend(1.0);
        world.truncate() / world.w
    })
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
