/// VulkanSurface - window surface and its VkSwapchainKHR
///
/// Implements `PresentationSurface`: the frame manager asks for limits,
/// (re)creates the swapchain, acquires images and presents. Surface and
/// swapchain are destroyed when this is dropped.

use ash::vk;
use std::sync::Arc;
use aurora_3d_engine::aurora3d::{Error, Result};
use aurora_3d_engine::aurora3d::graphics_device::{
    AcquireOutcome, AttachmentImage, Extent2D, PresentMode, PresentOutcome, PresentationSurface,
    Semaphore, SurfaceCapabilities, SwapchainCreateInfo, TextureFormat,
};
use aurora_3d_engine::{engine_debug, engine_warn};

use crate::vulkan_context::{vk_error, GpuContext, LOG_SOURCE};
use crate::vulkan_format::{format_to_vk, present_mode_to_vk, vk_to_format, vk_to_present_mode, ALL_FORMATS};
use crate::vulkan_image::VulkanAttachmentImage;
use crate::vulkan_sync::vk_semaphore;

pub struct VulkanSurface {
    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,
    swapchain_loader: ash::khr::swapchain::Device,
    /// Null until the first `create_swapchain`
    swapchain: vk::SwapchainKHR,
    present_queue: vk::Queue,
    ctx: Arc<GpuContext>,
}

impl VulkanSurface {
    pub(crate) fn new(
        ctx: &Arc<GpuContext>,
        surface: vk::SurfaceKHR,
        surface_loader: ash::khr::surface::Instance,
        present_queue: vk::Queue,
    ) -> Self {
        let swapchain_loader = ash::khr::swapchain::Device::new(&ctx.instance, &ctx.device);
        Self {
            surface,
            surface_loader,
            swapchain_loader,
            swapchain: vk::SwapchainKHR::null(),
            present_queue,
            ctx: ctx.clone(),
        }
    }

    fn surface_formats(&self) -> Result<Vec<vk::SurfaceFormatKHR>> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_formats(self.ctx.physical_device, self.surface)
                .map_err(|e| vk_error("Failed to query surface formats", e))
        }
    }

    /// Color space paired with `format` by the surface
    fn color_space(&self, format: vk::Format) -> Result<vk::ColorSpaceKHR> {
        Ok(self
            .surface_formats()?
            .iter()
            .find(|f| f.format == format)
            .map(|f| f.color_space)
            .unwrap_or(vk::ColorSpaceKHR::SRGB_NONLINEAR))
    }
}

/// Engine formats among the surface formats
///
/// A single `UNDEFINED` entry means the surface accepts any format.
fn engine_formats(formats: &[vk::SurfaceFormatKHR]) -> Vec<TextureFormat> {
    if formats.len() == 1 && formats[0].format == vk::Format::UNDEFINED {
        return ALL_FORMATS.iter().copied().filter(|f| !f.is_depth()).collect();
    }
    formats.iter().filter_map(|f| vk_to_format(f.format)).collect()
}

fn capabilities_from_vk(caps: &vk::SurfaceCapabilitiesKHR) -> SurfaceCapabilities {
    // u32::MAX means the window system lets the swapchain pick the extent
    let current_extent = if caps.current_extent.width == u32::MAX {
        None
    } else {
        Some(Extent2D::new(caps.current_extent.width, caps.current_extent.height))
    };
    SurfaceCapabilities {
        min_image_count: caps.min_image_count,
        max_image_count: caps.max_image_count,
        current_extent,
        min_extent: Extent2D::new(caps.min_image_extent.width, caps.min_image_extent.height),
        max_extent: Extent2D::new(caps.max_image_extent.width, caps.max_image_extent.height),
    }
}

impl PresentationSurface for VulkanSurface {
    fn capabilities(&self) -> Result<SurfaceCapabilities> {
        let caps = unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(self.ctx.physical_device, self.surface)
                .map_err(|e| vk_error("Failed to query surface capabilities", e))?
        };
        Ok(capabilities_from_vk(&caps))
    }

    fn supported_formats(&self) -> Result<Vec<TextureFormat>> {
        Ok(engine_formats(&self.surface_formats()?))
    }

    fn supported_present_modes(&self) -> Result<Vec<PresentMode>> {
        let modes = unsafe {
            self.surface_loader
                .get_physical_device_surface_present_modes(self.ctx.physical_device, self.surface)
                .map_err(|e| vk_error("Failed to query surface present modes", e))?
        };
        Ok(modes.into_iter().filter_map(vk_to_present_mode).collect())
    }

    fn create_swapchain(&mut self, info: &SwapchainCreateInfo) -> Result<Vec<Arc<dyn AttachmentImage>>> {
        let caps = unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(self.ctx.physical_device, self.surface)
                .map_err(|e| vk_error("Failed to query surface capabilities", e))?
        };
        let vk_format = format_to_vk(info.format);
        let color_space = self.color_space(vk_format)?;

        let sharing_mode = if info.queue_families.len() > 1 {
            vk::SharingMode::CONCURRENT
        } else {
            vk::SharingMode::EXCLUSIVE
        };

        let old_swapchain = self.swapchain;
        let mut create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(self.surface)
            .min_image_count(info.image_count)
            .image_format(vk_format)
            .image_color_space(color_space)
            .image_extent(vk::Extent2D {
                width: info.extent.width,
                height: info.extent.height,
            })
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .pre_transform(caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode_to_vk(info.present_mode))
            .clipped(true)
            .old_swapchain(old_swapchain);
        if sharing_mode == vk::SharingMode::CONCURRENT {
            create_info = create_info.queue_family_indices(&info.queue_families);
        }

        let swapchain = unsafe {
            self.swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(|e| vk_error("Failed to create swapchain", e))?
        };

        // The old swapchain is retired by the create call
        if old_swapchain != vk::SwapchainKHR::null() {
            unsafe {
                self.swapchain_loader.destroy_swapchain(old_swapchain, None);
            }
        }
        self.swapchain = swapchain;

        let images = unsafe {
            self.swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(|e| vk_error("Failed to get swapchain images", e))?
        };

        engine_debug!(LOG_SOURCE,
            "Swapchain created: {} images {}x{} {:?} {:?} {:?}",
            images.len(), info.extent.width, info.extent.height,
            info.format, info.present_mode, sharing_mode);

        images
            .into_iter()
            .map(|image| {
                VulkanAttachmentImage::from_swapchain(&self.ctx, image, info.format, info.extent)
                    .map(|image| Arc::new(image) as Arc<dyn AttachmentImage>)
            })
            .collect()
    }

    fn acquire_next_image(&mut self, signal: &dyn Semaphore) -> Result<AcquireOutcome> {
        if self.swapchain == vk::SwapchainKHR::null() {
            return Err(Error::InvalidFrameState("acquire before the swapchain was created".to_string()));
        }
        let semaphore = vk_semaphore(signal)?;

        let result = unsafe {
            self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                semaphore,
                vk::Fence::null(),
            )
        };
        match result {
            Ok((image_index, suboptimal)) => Ok(AcquireOutcome::Acquired { image_index, suboptimal }),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::OutOfDate),
            Err(e) => Err(vk_error("Failed to acquire next swapchain image", e)),
        }
    }

    fn present(&mut self, image_index: u32, wait: &dyn Semaphore) -> Result<PresentOutcome> {
        let wait_semaphores = [vk_semaphore(wait)?];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let result = {
            let _queues = self.ctx.lock_queues()?;
            unsafe { self.swapchain_loader.queue_present(self.present_queue, &present_info) }
        };
        match result {
            Ok(false) => Ok(PresentOutcome::Presented),
            Ok(true) => Ok(PresentOutcome::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentOutcome::OutOfDate),
            Err(e) => Err(vk_error("Failed to present swapchain image", e)),
        }
    }
}

impl Drop for VulkanSurface {
    fn drop(&mut self) {
        if let Err(e) = self.ctx.wait_idle() {
            engine_warn!(LOG_SOURCE, "wait_idle before surface destruction failed: {}", e);
        }
        unsafe {
            if self.swapchain != vk::SwapchainKHR::null() {
                self.swapchain_loader.destroy_swapchain(self.swapchain, None);
            }
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface_format(format: vk::Format) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }
    }

    #[test]
    fn test_engine_formats_keeps_driver_order() {
        let formats = [
            surface_format(vk::Format::B8G8R8A8_SRGB),
            surface_format(vk::Format::R5G6B5_UNORM_PACK16),
            surface_format(vk::Format::R8G8B8A8_UNORM),
        ];
        assert_eq!(
            engine_formats(&formats),
            vec![TextureFormat::B8G8R8A8_SRGB, TextureFormat::R8G8B8A8_UNORM]
        );
    }

    #[test]
    fn test_engine_formats_undefined_accepts_any() {
        let formats = engine_formats(&[surface_format(vk::Format::UNDEFINED)]);
        assert!(formats.contains(&TextureFormat::B8G8R8A8_UNORM));
        assert!(formats.iter().all(|f| !f.is_depth()));
    }

    #[test]
    fn test_capabilities_undefined_extent() {
        let caps = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            current_extent: vk::Extent2D { width: u32::MAX, height: u32::MAX },
            min_image_extent: vk::Extent2D { width: 1, height: 1 },
            max_image_extent: vk::Extent2D { width: 4096, height: 4096 },
            ..Default::default()
        };
        let capabilities = capabilities_from_vk(&caps);

        assert_eq!(capabilities.current_extent, None);
        assert_eq!(capabilities.clamp_image_count(5), 5);
        assert_eq!(capabilities.choose_extent(Extent2D::new(8000, 600)), Extent2D::new(4096, 600));
    }

    #[test]
    fn test_capabilities_fixed_extent() {
        let caps = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 3,
            current_extent: vk::Extent2D { width: 1280, height: 720 },
            ..Default::default()
        };
        let capabilities = capabilities_from_vk(&caps);

        assert_eq!(capabilities.current_extent, Some(Extent2D::new(1280, 720)));
        assert_eq!(capabilities.clamp_image_count(8), 3);
    }
}
