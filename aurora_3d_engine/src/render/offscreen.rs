/// OffscreenTarget - render pass, attachment images and framebuffer of a pass
/// that does not render into the swapchain (shadow cascades, reflection,
/// refraction).
///
/// Images follow the render pass attachments one to one and are created
/// sampled, so later passes can read them.

use std::sync::Arc;
use crate::engine_warn;
use crate::error::{Error, Result};
use crate::graphics_device::{
    AttachmentImage, AttachmentImageDesc, Extent2D, Framebuffer, FramebufferDesc, GraphicsDevice,
    Rect2D, RenderPass, TextureFormat,
};
use crate::render_pass::offscreen;

pub struct OffscreenTarget {
    device: Arc<dyn GraphicsDevice>,
    render_pass: Arc<dyn RenderPass>,
    /// One image per render pass attachment, declaration order
    images: Vec<Arc<dyn AttachmentImage>>,
    framebuffer: Arc<dyn Framebuffer>,
    extent: Extent2D,
}

impl OffscreenTarget {
    /// Target with its own `offscreen` preset render pass
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        color_formats: &[TextureFormat],
        depth_format: Option<TextureFormat>,
        extent: Extent2D,
    ) -> Result<Self> {
        let render_pass = offscreen(color_formats, depth_format).create(device.as_ref())?;
        Self::with_render_pass(device, render_pass, extent)
    }

    /// Target for an existing single-sampled render pass
    pub fn with_render_pass(
        device: Arc<dyn GraphicsDevice>,
        render_pass: Arc<dyn RenderPass>,
        extent: Extent2D,
    ) -> Result<Self> {
        if render_pass.desc().max_samples().is_multisampled() {
            return Err(Error::InvalidRenderPass(
                "offscreen targets are single-sampled".to_string(),
            ));
        }
        let extent = Extent2D::new(extent.width.max(1), extent.height.max(1));
        let (images, framebuffer) = Self::create_images(&device, &render_pass, extent)?;
        Ok(Self { device, render_pass, images, framebuffer, extent })
    }

    fn create_images(
        device: &Arc<dyn GraphicsDevice>,
        render_pass: &Arc<dyn RenderPass>,
        extent: Extent2D,
    ) -> Result<(Vec<Arc<dyn AttachmentImage>>, Arc<dyn Framebuffer>)> {
        let images = render_pass
            .desc()
            .attachments
            .iter()
            .map(|attachment| {
                let desc = if attachment.is_depth() {
                    AttachmentImageDesc::sampled_depth(extent, attachment.format)
                } else {
                    AttachmentImageDesc::sampled_color(extent, attachment.format)
                };
                device.create_attachment_image(&desc)
            })
            .collect::<Result<Vec<_>>>()?;

        let framebuffer = device.create_framebuffer(&FramebufferDesc {
            render_pass,
            attachments: images.clone(),
            width: extent.width,
            height: extent.height,
        })?;
        Ok((images, framebuffer))
    }

    /// Recreate the images at `extent`
    ///
    /// Returns false when the extent is unchanged or empty.
    pub fn resize(&mut self, extent: Extent2D) -> Result<bool> {
        if extent.is_empty() || extent == self.extent {
            return Ok(false);
        }
        self.device.wait_idle()?;
        let (images, framebuffer) = Self::create_images(&self.device, &self.render_pass, extent)?;
        self.images = images;
        self.framebuffer = framebuffer;
        self.extent = extent;
        Ok(true)
    }

    pub fn render_pass(&self) -> &Arc<dyn RenderPass> {
        &self.render_pass
    }

    pub fn framebuffer(&self) -> &Arc<dyn Framebuffer> {
        &self.framebuffer
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    /// Full-target render area
    pub fn rect(&self) -> Rect2D {
        Rect2D::from_extent(self.extent)
    }

    /// Color images in declaration order
    pub fn color_images(&self) -> Vec<&Arc<dyn AttachmentImage>> {
        self.images.iter().filter(|image| !image.format().is_depth()).collect()
    }

    pub fn depth_image(&self) -> Result<&Arc<dyn AttachmentImage>> {
        self.images
            .iter()
            .find(|image| image.format().is_depth())
            .ok_or(Error::MissingDepthBuffer)
    }
}

impl Drop for OffscreenTarget {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            engine_warn!("aurora3d::OffscreenTarget", "wait_idle before release failed: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "offscreen_tests.rs"]
mod tests;
