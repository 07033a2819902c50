/// Per-frame render contexts handed to renderers
///
/// Contexts are read-only values. The command buffer being recorded travels
/// next to them as `&mut dyn CommandBuffer`, so a parallel task can get its
/// own secondary buffer while sharing the same context.

use std::sync::Arc;
use glam::{Mat4, Vec2, Vec3, Vec4};
use crate::camera::Frustum;
use crate::graphics_device::{Framebuffer, Rect2D};

/// Base context of one pass
#[derive(Clone)]
pub struct RenderContext {
    /// Framebuffer the pass renders into
    pub framebuffer: Arc<dyn Framebuffer>,
    /// Slot of the frame being recorded, indexes per-frame resources
    pub frame_in_flight_index: usize,
    /// Render area
    pub rect: Rect2D,
}

impl RenderContext {
    pub fn new(framebuffer: Arc<dyn Framebuffer>, frame_in_flight_index: usize, rect: Rect2D) -> Self {
        Self { framebuffer, frame_in_flight_index, rect }
    }

    /// Same frame slot, another target
    pub fn retarget(&self, framebuffer: Arc<dyn Framebuffer>, rect: Rect2D) -> Self {
        Self {
            framebuffer,
            frame_in_flight_index: self.frame_in_flight_index,
            rect,
        }
    }
}

/// Context kinds the pass executor can drive
pub trait PassContext: Sync {
    fn base(&self) -> &RenderContext;
}

impl PassContext for RenderContext {
    fn base(&self) -> &RenderContext {
        self
    }
}

/// Context of one shadow cascade
#[derive(Clone)]
pub struct ShadowsRenderContext {
    pub base: RenderContext,
    pub view_matrix: Mat4,
    pub projection_matrix: Mat4,
    pub cascade_index: u32,
    pub frustum: Frustum,
}

impl PassContext for ShadowsRenderContext {
    fn base(&self) -> &RenderContext {
        &self.base
    }
}

/// Context of a lit scene pass (main, reflection, refraction)
///
/// Per-view arrays all have `view_count` entries.
#[derive(Clone)]
pub struct NormalRenderContext {
    pub base: RenderContext,
    pub view_matrices: Vec<Mat4>,
    pub projection_matrices: Vec<Mat4>,
    pub camera_positions: Vec<Vec3>,
    /// Plane (normal, distance) clipping geometry on its negative side
    pub clip_plane: Vec4,
    /// Vertical field of view in radians
    pub vertical_fov: f32,
    /// Near and far clipping distances
    pub near_far: Vec2,
    pub frusta: Vec<Frustum>,
}

impl NormalRenderContext {
    pub fn view_count(&self) -> usize {
        self.view_matrices.len()
    }
}

impl PassContext for NormalRenderContext {
    fn base(&self) -> &RenderContext {
        &self.base
    }
}
