/// Cascaded shadow maps: split computation, per-cascade light matrices and
/// the depth targets they are rendered into.
///
/// Splits blend a logarithmic and a uniform distribution of the camera depth
/// range. Each cascade is the slice of the camera frustum between two splits,
/// enclosed in a bounding sphere; the light looks at the sphere center from
/// one radius away and projects it orthographically.

use std::sync::Arc;
use glam::{Mat4, Vec3};
use crate::camera::{frustum_corners, Camera, Frustum};
use crate::error::{Error, Result};
use crate::graphics_device::{Extent2D, GraphicsDevice, RenderPass, TextureFormat};
use crate::render_pass::depth_only;
use super::offscreen::OffscreenTarget;

/// Weight of the logarithmic split scheme against the uniform one
pub const CASCADE_SPLIT_LAMBDA: f32 = 0.86;

/// Light-space data of one cascade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCascade {
    pub view_matrix: Mat4,
    pub projection_matrix: Mat4,
    /// View-space depth where the cascade starts (negative, looking down -Z)
    pub start_depth: f32,
    /// View-space depth where the cascade ends
    pub end_depth: f32,
}

impl ShadowCascade {
    pub fn frustum(&self) -> Frustum {
        Frustum::new(&self.projection_matrix, &self.view_matrix)
    }
}

/// Normalized split positions in `(0, 1]`, one per cascade, ascending
pub fn cascade_splits(near: f32, far: f32, count: u32, lambda: f32) -> Vec<f32> {
    let min_z = near.min(far);
    let max_z = near.max(far);
    let range = max_z - min_z;
    let ratio = max_z / min_z;

    (0..count)
        .map(|i| {
            let p = (i + 1) as f32 / count as f32;
            let log = min_z * ratio.powf(p);
            let uniform = min_z + range * p;
            let d = lambda * (log - uniform) + uniform;
            (d - min_z) / range
        })
        .collect()
}

/// Light matrices of `count` cascades covering the camera frustum
///
/// `view` and `projection` are the camera's; `light_direction` points from
/// the light into the scene.
pub fn compute_cascades(
    view: &Mat4,
    projection: &Mat4,
    near: f32,
    far: f32,
    light_direction: Vec3,
    count: u32,
) -> Vec<ShadowCascade> {
    let corners = frustum_corners(&(*projection * *view));
    let clip_range = far - near;
    let light_direction = light_direction.normalize_or_zero();
    // look_at degenerates when the light is vertical
    let up = if light_direction.dot(Vec3::Y).abs() > 0.99 { Vec3::Z } else { Vec3::Y };

    let mut last_split = 0.0;
    cascade_splits(near, far, count, CASCADE_SPLIT_LAMBDA)
        .into_iter()
        .map(|split| {
            let mut slice = [Vec3::ZERO; 8];
            for i in 0..4 {
                let ray = corners[i + 4] - corners[i];
                slice[i] = corners[i] + ray * last_split;
                slice[i + 4] = corners[i] + ray * split;
            }

            let center = slice.iter().copied().sum::<Vec3>() / 8.0;
            let radius = slice
                .iter()
                .map(|corner| corner.distance(center))
                .fold(0.0_f32, f32::max);
            // Snap to reduce shimmering while the camera moves
            let radius = (radius * 16.0).ceil() / 16.0;

            let view_matrix = Mat4::look_at_rh(center - light_direction * radius, center, up);
            let projection_matrix =
                Mat4::orthographic_rh(-radius, radius, -radius, radius, 0.0, 2.0 * radius);

            let cascade = ShadowCascade {
                view_matrix,
                projection_matrix,
                start_depth: -(near + last_split * clip_range),
                end_depth: -(near + split * clip_range),
            };
            last_split = split;
            cascade
        })
        .collect()
}

/// Depth targets of every cascade, sharing one depth-only render pass
pub struct ShadowMaps {
    render_pass: Arc<dyn RenderPass>,
    targets: Vec<OffscreenTarget>,
    size: u32,
}

impl ShadowMaps {
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        depth_format: TextureFormat,
        cascade_count: u32,
        size: u32,
    ) -> Result<Self> {
        let render_pass = depth_only(depth_format).create(device.as_ref())?;
        let targets = (0..cascade_count)
            .map(|_| {
                OffscreenTarget::with_render_pass(
                    device.clone(),
                    render_pass.clone(),
                    Extent2D::new(size, size),
                )
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { render_pass, targets, size })
    }

    pub fn render_pass(&self) -> &Arc<dyn RenderPass> {
        &self.render_pass
    }

    pub fn cascade_count(&self) -> usize {
        self.targets.len()
    }

    /// Side of each square shadow map in texels
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn target(&self, cascade: usize) -> Result<&OffscreenTarget> {
        self.targets.get(cascade).ok_or_else(|| {
            Error::InvalidResource(format!(
                "shadow cascade {} out of range ({} cascades)",
                cascade,
                self.targets.len()
            ))
        })
    }

    /// Cascades for `camera` rendering into a `width` x `height` target
    pub fn cascades_for(&self, camera: &Camera, width: u32, height: u32, light_direction: Vec3) -> Vec<ShadowCascade> {
        compute_cascades(
            &camera.view_matrix(),
            &camera.projection_matrix(width, height),
            camera.near(),
            camera.far(),
            light_direction,
            self.targets.len() as u32,
        )
    }
}

#[cfg(test)]
#[path = "shadows_tests.rs"]
mod tests;
