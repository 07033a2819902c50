/// AttachmentImage trait - images bound to framebuffers

use std::any::Any;
use bitflags::bitflags;
use crate::graphics_device::{Extent2D, SampleCount, TextureFormat};

bitflags! {
    /// How an attachment image is used
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageUsage: u32 {
        const COLOR_ATTACHMENT = 1 << 0;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 1;
        const SAMPLED = 1 << 2;
        const TRANSIENT = 1 << 3;
        const TRANSFER_SRC = 1 << 4;
    }
}

/// Descriptor for creating an attachment image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentImageDesc {
    pub extent: Extent2D,
    pub format: TextureFormat,
    pub samples: SampleCount,
    pub usage: ImageUsage,
}

impl AttachmentImageDesc {
    /// Color image that is rendered to then sampled
    pub fn sampled_color(extent: Extent2D, format: TextureFormat) -> Self {
        Self {
            extent,
            format,
            samples: SampleCount::S1,
            usage: ImageUsage::COLOR_ATTACHMENT | ImageUsage::SAMPLED,
        }
    }

    /// Depth image that is rendered to then sampled
    pub fn sampled_depth(extent: Extent2D, format: TextureFormat) -> Self {
        Self {
            extent,
            format,
            samples: SampleCount::S1,
            usage: ImageUsage::DEPTH_STENCIL_ATTACHMENT | ImageUsage::SAMPLED,
        }
    }

    /// Multisampled image whose content never leaves the render pass
    pub fn transient(extent: Extent2D, format: TextureFormat, samples: SampleCount) -> Self {
        let attachment = if format.is_depth() {
            ImageUsage::DEPTH_STENCIL_ATTACHMENT
        } else {
            ImageUsage::COLOR_ATTACHMENT
        };
        Self {
            extent,
            format,
            samples,
            usage: attachment | ImageUsage::TRANSIENT,
        }
    }
}

/// Image with a view, usable as framebuffer attachment
///
/// Presentable swapchain images implement this too; they are owned by the
/// presentation surface and never freed through this handle.
pub trait AttachmentImage: Send + Sync {
    /// Size in pixels
    fn extent(&self) -> Extent2D;

    /// Pixel format
    fn format(&self) -> TextureFormat;

    /// Sample count
    fn samples(&self) -> SampleCount;

    /// Backend downcast
    fn as_any(&self) -> &dyn Any;
}
