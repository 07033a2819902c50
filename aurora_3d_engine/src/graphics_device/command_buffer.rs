/// CommandBuffer and CommandPool traits - for recording rendering commands

use std::any::Any;
use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{Framebuffer, Rect2D, RenderPass, Viewport};

/// Primary buffers are submitted to a queue, secondary ones are replayed from a primary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandBufferLevel {
    Primary,
    Secondary,
}

/// Where the commands of a render pass instance come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubpassContents {
    /// Recorded directly into the primary buffer
    Inline,
    /// Replayed from secondary buffers via `execute_commands`
    SecondaryCommandBuffers,
}

/// Render pass state a secondary buffer continues
pub struct InheritanceInfo<'a> {
    pub render_pass: &'a Arc<dyn RenderPass>,
    pub subpass: u32,
    pub framebuffer: &'a Arc<dyn Framebuffer>,
}

/// Command buffer for recording rendering commands
///
/// A buffer is recorded by one thread at a time; `&mut self` on every
/// recording method makes concurrent recording into the same buffer impossible.
pub trait CommandBuffer: Send + Sync {
    /// Primary or secondary
    fn level(&self) -> CommandBufferLevel;

    /// Begin recording a primary buffer (one-time submit)
    fn begin(&mut self) -> Result<()>;

    /// Begin recording a secondary buffer that continues a render pass
    fn begin_secondary(&mut self, inheritance: &InheritanceInfo) -> Result<()>;

    /// End recording
    fn end(&mut self) -> Result<()>;

    /// Discard recorded commands so the buffer can be recorded again
    fn reset(&mut self) -> Result<()>;

    /// Begin a render pass
    ///
    /// Clear values are taken from the render pass description, one per
    /// attachment in declaration order.
    ///
    /// # Arguments
    ///
    /// * `render_pass` - The render pass to begin
    /// * `framebuffer` - Framebuffer compatible with `render_pass`
    /// * `area` - Render area
    /// * `contents` - Inline commands or secondary buffers
    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn RenderPass>,
        framebuffer: &Arc<dyn Framebuffer>,
        area: Rect2D,
        contents: SubpassContents,
    ) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;

    /// Replay secondary buffers, in slice order
    fn execute_commands(&mut self, secondaries: &[&dyn CommandBuffer]) -> Result<()>;

    /// Set the viewport
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Set the scissor rectangle
    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    /// Draw vertices
    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()>;

    /// Draw indexed vertices
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()>;

    /// Open a debug label region (no-op when debug utils are unavailable)
    fn begin_label(&mut self, name: &str, color: [f32; 4]);

    /// Close the innermost debug label region
    fn end_label(&mut self);

    /// Backend downcast
    fn as_any(&self) -> &dyn Any;
}

/// Pool that command buffers are allocated from
///
/// Buffers allocated from a pool must be dropped before the pool.
pub trait CommandPool: Send + Sync {
    /// Allocate `count` buffers of the given level
    fn allocate(&mut self, level: CommandBufferLevel, count: u32) -> Result<Vec<Box<dyn CommandBuffer>>>;

    /// Reset every buffer allocated from this pool
    fn reset(&mut self) -> Result<()>;

    /// Queue family the pool submits to
    fn queue_family(&self) -> u32;
}
