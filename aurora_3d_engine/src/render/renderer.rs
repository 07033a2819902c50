/// Renderer plugin trait and per-pass registration.
///
/// A renderer implements one visual effect for one context kind. The master
/// renderer drives it through the same sequence every pass:
///
/// ```text
/// before_render -> [begin render pass] -> pre_render -> render(node)* -> post_render
///               -> [end render pass]   -> after_render
/// ```
///
/// `before_render` / `after_render` record into the primary command buffer
/// outside the render pass (barriers, uploads). The three middle calls record
/// inside it, into the primary buffer or into the renderer's own secondary
/// buffer when the pass runs in parallel.

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{CommandBuffer, GraphicsDevice, RenderPass};
use crate::scene::SceneNode;
use super::render_context::{NormalRenderContext, PassContext, RenderContext, ShadowsRenderContext};

/// Visual effect recorded in passes with context `C`
pub trait Renderer<C: PassContext>: Send {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Create pipelines and resources for `render_pass`
    fn init(&mut self, device: &Arc<dyn GraphicsDevice>, render_pass: &Arc<dyn RenderPass>) -> Result<()>;

    fn before_render(&mut self, _cmd: &mut dyn CommandBuffer, _ctx: &C) -> Result<()> {
        Ok(())
    }

    fn pre_render(&mut self, _cmd: &mut dyn CommandBuffer, _ctx: &C) -> Result<()> {
        Ok(())
    }

    /// Record `node`; nodes the renderer does not handle are skipped
    fn render(&mut self, cmd: &mut dyn CommandBuffer, ctx: &C, node: &dyn SceneNode) -> Result<()>;

    fn post_render(&mut self, _cmd: &mut dyn CommandBuffer, _ctx: &C) -> Result<()> {
        Ok(())
    }

    fn after_render(&mut self, _cmd: &mut dyn CommandBuffer, _ctx: &C) -> Result<()> {
        Ok(())
    }

    /// Release what `init` created
    fn shut_down(&mut self) {}
}

pub type ShadowsRenderer = dyn Renderer<ShadowsRenderContext>;
pub type NormalRenderer = dyn Renderer<NormalRenderContext>;
pub type DefaultRenderer = dyn Renderer<RenderContext>;

/// Renderers of every pass, in declaration (and replay) order
#[derive(Default)]
pub struct RendererSet {
    pub shadows: Vec<Box<ShadowsRenderer>>,
    pub reflection: Vec<Box<NormalRenderer>>,
    pub refraction: Vec<Box<NormalRenderer>>,
    pub main: Vec<Box<NormalRenderer>>,
    pub debug: Vec<Box<DefaultRenderer>>,
}

impl RendererSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shadows(mut self, renderer: impl Renderer<ShadowsRenderContext> + 'static) -> Self {
        self.shadows.push(Box::new(renderer));
        self
    }

    pub fn with_reflection(mut self, renderer: impl Renderer<NormalRenderContext> + 'static) -> Self {
        self.reflection.push(Box::new(renderer));
        self
    }

    pub fn with_refraction(mut self, renderer: impl Renderer<NormalRenderContext> + 'static) -> Self {
        self.refraction.push(Box::new(renderer));
        self
    }

    pub fn with_main(mut self, renderer: impl Renderer<NormalRenderContext> + 'static) -> Self {
        self.main.push(Box::new(renderer));
        self
    }

    pub fn with_debug(mut self, renderer: impl Renderer<RenderContext> + 'static) -> Self {
        self.debug.push(Box::new(renderer));
        self
    }

    /// Total number of registered renderers
    pub fn len(&self) -> usize {
        self.shadows.len()
            + self.reflection.len()
            + self.refraction.len()
            + self.main.len()
            + self.debug.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Init every renderer of a list in order
///
/// On failure the renderers already initialised are shut down again.
pub(crate) fn init_all<C: PassContext>(
    renderers: &mut [Box<dyn Renderer<C>>],
    device: &Arc<dyn GraphicsDevice>,
    render_pass: &Arc<dyn RenderPass>,
) -> Result<()> {
    for index in 0..renderers.len() {
        if let Err(e) = renderers[index].init(device, render_pass) {
            shut_down_all(&mut renderers[..index]);
            return Err(e);
        }
    }
    Ok(())
}

/// Shut down every renderer of a list, last declared first
pub(crate) fn shut_down_all<C: PassContext>(renderers: &mut [Box<dyn Renderer<C>>]) {
    for renderer in renderers.iter_mut().rev() {
        renderer.shut_down();
    }
}
