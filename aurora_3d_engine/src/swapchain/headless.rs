/// HeadlessSurface - offscreen stand-in for a window surface
///
/// Color images come from `GraphicsDevice::create_attachment_image` and are
/// handed out round-robin. Nothing is shown: present only checks that the
/// acquired image comes back. The swapchain submits frames of a headless
/// surface without semaphores, so frames are paced by their fences alone.

use std::sync::Arc;
use crate::engine_debug;
use crate::error::{Error, Result};
use crate::graphics_device::{
    AcquireOutcome, AttachmentImage, AttachmentImageDesc, Extent2D, GraphicsDevice, ImageUsage,
    PresentMode, PresentOutcome, PresentationSurface, SampleCount, Semaphore, SurfaceCapabilities,
    SwapchainCreateInfo, TextureFormat,
};

const LOG_SOURCE: &str = "aurora3d::HeadlessSurface";

/// Largest edge of a headless image
pub const HEADLESS_MAX_EXTENT: u32 = 16384;

pub struct HeadlessSurface {
    device: Arc<dyn GraphicsDevice>,
    images: Vec<Arc<dyn AttachmentImage>>,
    next_image: usize,
    /// Image handed out and not yet presented
    acquired: Option<u32>,
}

impl HeadlessSurface {
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        Self {
            device,
            images: Vec::new(),
            next_image: 0,
            acquired: None,
        }
    }
}

impl PresentationSurface for HeadlessSurface {
    fn capabilities(&self) -> Result<SurfaceCapabilities> {
        Ok(SurfaceCapabilities {
            min_image_count: 1,
            max_image_count: 0,
            current_extent: None,
            min_extent: Extent2D::new(1, 1),
            max_extent: Extent2D::new(HEADLESS_MAX_EXTENT, HEADLESS_MAX_EXTENT),
        })
    }

    /// Any format the device renders to
    fn supported_formats(&self) -> Result<Vec<TextureFormat>> {
        Ok(self.device.physical_device().color_formats.clone())
    }

    fn supported_present_modes(&self) -> Result<Vec<PresentMode>> {
        Ok(vec![PresentMode::Fifo])
    }

    fn create_swapchain(&mut self, info: &SwapchainCreateInfo) -> Result<Vec<Arc<dyn AttachmentImage>>> {
        if info.image_count == 0 {
            return Err(Error::InvalidResource("headless swapchain needs at least one image".to_string()));
        }
        self.images.clear();
        self.next_image = 0;
        self.acquired = None;

        let desc = AttachmentImageDesc {
            extent: info.extent,
            format: info.format,
            samples: SampleCount::S1,
            usage: ImageUsage::COLOR_ATTACHMENT | ImageUsage::SAMPLED | ImageUsage::TRANSFER_SRC,
        };
        let images = (0..info.image_count)
            .map(|_| self.device.create_attachment_image(&desc))
            .collect::<Result<Vec<_>>>()?;

        engine_debug!(
            LOG_SOURCE,
            "{} offscreen images {}x{} {:?}",
            images.len(),
            info.extent.width,
            info.extent.height,
            info.format
        );
        self.images = images.clone();
        Ok(images)
    }

    /// Next image in order; `signal` is left untouched
    fn acquire_next_image(&mut self, _signal: &dyn Semaphore) -> Result<AcquireOutcome> {
        if self.images.is_empty() {
            return Err(Error::InvalidFrameState("acquire before create_swapchain".to_string()));
        }
        if let Some(pending) = self.acquired {
            return Err(Error::InvalidFrameState(format!("image {} acquired twice", pending)));
        }
        let image_index = self.next_image as u32;
        self.next_image = (self.next_image + 1) % self.images.len();
        self.acquired = Some(image_index);
        Ok(AcquireOutcome::Acquired { image_index, suboptimal: false })
    }

    fn present(&mut self, image_index: u32, _wait: &dyn Semaphore) -> Result<PresentOutcome> {
        match self.acquired.take() {
            Some(acquired) if acquired == image_index => Ok(PresentOutcome::Presented),
            acquired => Err(Error::InvalidFrameState(format!(
                "present of image {} while {:?} is acquired",
                image_index, acquired
            ))),
        }
    }

    fn is_headless(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "headless_tests.rs"]
mod tests;
