/// Framebuffer trait - groups attachment images for a render pass
///
/// Created once and reused each frame. Must be recreated only when
/// attachments change (e.g., window resize).

use std::any::Any;
use std::sync::Arc;
use crate::graphics_device::{AttachmentImage, RenderPass};

/// Framebuffer: the attachment images a render pass instance renders into
///
/// Created via `GraphicsDevice::create_framebuffer()`.
pub trait Framebuffer: Send + Sync {
    /// Get the width in pixels
    fn width(&self) -> u32;

    /// Get the height in pixels
    fn height(&self) -> u32;

    /// Backend downcast
    fn as_any(&self) -> &dyn Any;
}

/// Descriptor for creating a framebuffer
pub struct FramebufferDesc<'a> {
    /// The render pass this framebuffer is compatible with
    pub render_pass: &'a Arc<dyn RenderPass>,
    /// One image per render pass attachment, in declaration order
    pub attachments: Vec<Arc<dyn AttachmentImage>>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}
