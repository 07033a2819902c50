/// PresentationSurface trait - window surface and its presentable images
///
/// The frame manager drives a surface through this trait; it never sees
/// backend swapchain handles.

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{AttachmentImage, Extent2D, PresentMode, Semaphore, TextureFormat};

/// Limits reported by the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    /// 0 = no upper bound
    pub max_image_count: u32,
    /// Defined when the window system dictates the extent
    pub current_extent: Option<Extent2D>,
    pub min_extent: Extent2D,
    pub max_extent: Extent2D,
}

impl SurfaceCapabilities {
    /// Clamp a requested image count into `[min_image_count, max_image_count]`
    pub fn clamp_image_count(&self, requested: u32) -> u32 {
        let count = requested.max(self.min_image_count);
        if self.max_image_count > 0 {
            count.min(self.max_image_count)
        } else {
            count
        }
    }

    /// Current extent if defined, otherwise `requested` clamped to the limits
    pub fn choose_extent(&self, requested: Extent2D) -> Extent2D {
        match self.current_extent {
            Some(extent) => extent,
            None => Extent2D {
                width: requested.width.clamp(self.min_extent.width, self.max_extent.width),
                height: requested.height.clamp(self.min_extent.height, self.max_extent.height),
            },
        }
    }
}

/// Parameters for (re)creating the presentable images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapchainCreateInfo {
    pub image_count: u32,
    pub format: TextureFormat,
    pub extent: Extent2D,
    pub present_mode: PresentMode,
    /// Queue families accessing the images; more than one means concurrent sharing
    pub queue_families: Vec<u32>,
}

/// Result of acquiring a presentable image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    Acquired { image_index: u32, suboptimal: bool },
    /// The surface changed; nothing was acquired
    OutOfDate,
}

/// Result of queueing an image for presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    Presented,
    /// Presented, but the swapchain no longer matches the surface exactly
    Suboptimal,
    OutOfDate,
}

/// Window surface (or offscreen stand-in) able to own a swapchain
pub trait PresentationSurface: Send {
    /// Current surface limits
    fn capabilities(&self) -> Result<SurfaceCapabilities>;

    /// Color formats the surface can present, in driver order
    fn supported_formats(&self) -> Result<Vec<TextureFormat>>;

    /// Present modes the surface supports
    fn supported_present_modes(&self) -> Result<Vec<PresentMode>>;

    /// Create the swapchain, retiring the previous one if any
    ///
    /// Returns the presentable images in swapchain order.
    fn create_swapchain(&mut self, info: &SwapchainCreateInfo) -> Result<Vec<Arc<dyn AttachmentImage>>>;

    /// Acquire the next image, signaling `signal` when it is ready
    fn acquire_next_image(&mut self, signal: &dyn Semaphore) -> Result<AcquireOutcome>;

    /// Queue `image_index` for presentation after `wait` is signaled
    fn present(&mut self, image_index: u32, wait: &dyn Semaphore) -> Result<PresentOutcome>;

    /// True when nothing is shown and acquire/present never touch semaphores
    fn is_headless(&self) -> bool {
        false
    }
}
