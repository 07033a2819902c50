//! Render module: per-frame contexts, renderer plugins and the multi-pass
//! master renderer.

mod command_buffers_group;
mod master_renderer;
mod offscreen;
mod render_context;
mod renderer;
mod scene_pass;
mod shadows;
mod water;

pub use command_buffers_group::CommandBuffersGroup;
pub use master_renderer::{MasterRenderer, PassKind};
pub use offscreen::OffscreenTarget;
pub use render_context::{NormalRenderContext, PassContext, RenderContext, ShadowsRenderContext};
pub use renderer::{DefaultRenderer, NormalRenderer, Renderer, RendererSet, ShadowsRenderer};
pub use scene_pass::{record_scene_pass, Recording};
pub use shadows::{cascade_splits, compute_cascades, ShadowCascade, ShadowMaps, CASCADE_SPLIT_LAMBDA};
pub use water::{
    reflection_camera, reflection_clip_plane, refraction_clip_plane, DEFAULT_CLIP_PLANE,
    WATER_CLIP_PLANE_OFFSET, DEFAULT_WATER_LEVEL,
};

// Recording renderer for tests
#[cfg(test)]
pub(crate) mod mock_renderer;
