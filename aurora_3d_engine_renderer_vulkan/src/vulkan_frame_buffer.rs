/// Framebuffer - Vulkan implementation of the Framebuffer trait
///
/// Wraps a VkFramebuffer over the attachment images of one render pass
/// instance. The images are kept alive as long as the framebuffer.

use ash::vk;
use std::any::Any;
use std::sync::Arc;
use aurora_3d_engine::aurora3d::{Error, Result};
use aurora_3d_engine::aurora3d::graphics_device::{AttachmentImage, Framebuffer, FramebufferDesc};

use crate::vulkan_context::{vk_error, GpuContext};
use crate::vulkan_image::VulkanAttachmentImage;
use crate::vulkan_render_pass::vk_render_pass;

pub struct VulkanFramebuffer {
    pub(crate) framebuffer: vk::Framebuffer,
    width: u32,
    height: u32,
    _attachments: Vec<Arc<dyn AttachmentImage>>,
    ctx: Arc<GpuContext>,
}

impl VulkanFramebuffer {
    pub(crate) fn new(ctx: &Arc<GpuContext>, desc: &FramebufferDesc) -> Result<Self> {
        let expected = desc.render_pass.desc().attachment_count();
        if desc.attachments.len() != expected {
            return Err(Error::InvalidResource(format!(
                "framebuffer has {} attachments, render pass declares {}",
                desc.attachments.len(),
                expected
            )));
        }

        let render_pass = vk_render_pass(desc.render_pass.as_ref())?;
        let views = desc
            .attachments
            .iter()
            .map(|image| {
                image
                    .as_any()
                    .downcast_ref::<VulkanAttachmentImage>()
                    .map(|image| image.view)
                    .ok_or_else(|| {
                        Error::InvalidResource("attachment image was not created by the Vulkan device".to_string())
                    })
            })
            .collect::<Result<Vec<vk::ImageView>>>()?;

        let framebuffer_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass)
            .attachments(&views)
            .width(desc.width)
            .height(desc.height)
            .layers(1);

        let framebuffer = unsafe {
            ctx.device.create_framebuffer(&framebuffer_info, None)
                .map_err(|e| vk_error("Failed to create framebuffer", e))?
        };

        Ok(Self {
            framebuffer,
            width: desc.width,
            height: desc.height,
            _attachments: desc.attachments.clone(),
            ctx: ctx.clone(),
        })
    }
}

impl Framebuffer for VulkanFramebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanFramebuffer {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}

/// Downcast an engine framebuffer to its Vulkan handle
pub(crate) fn vk_framebuffer(framebuffer: &dyn Framebuffer) -> Result<vk::Framebuffer> {
    framebuffer
        .as_any()
        .downcast_ref::<VulkanFramebuffer>()
        .map(|fb| fb.framebuffer)
        .ok_or_else(|| Error::InvalidResource("framebuffer was not created by the Vulkan device".to_string()))
}
