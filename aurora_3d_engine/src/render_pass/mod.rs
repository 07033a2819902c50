/// Render pass construction: builder and presets

pub mod render_pass_builder;
pub mod presets;

pub use render_pass_builder::RenderPassBuilder;
pub use presets::{
    depth_only, headless_main_pass, main_pass, multisample_with_resolve, offscreen,
    single_sample, DEFAULT_CLEAR_COLOR,
};
