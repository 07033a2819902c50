/// AttachmentImage - Vulkan image + view usable as framebuffer attachment

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::any::Any;
use std::sync::Arc;
use aurora_3d_engine::aurora3d::{Error, Result};
use aurora_3d_engine::aurora3d::graphics_device::{
    AttachmentImage, AttachmentImageDesc, Extent2D, SampleCount, TextureFormat,
};
use aurora_3d_engine::engine_error;

use crate::vulkan_context::{vk_error, GpuContext, LOG_SOURCE};
use crate::vulkan_format::{aspect_mask, format_to_vk, image_usage_to_vk, sample_count_to_vk};

/// Vulkan attachment image
///
/// Allocated images own their memory. Swapchain images belong to the
/// swapchain; only their view is destroyed here.
pub struct VulkanAttachmentImage {
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    allocation: Option<Allocation>,
    owns_image: bool,
    extent: Extent2D,
    format: TextureFormat,
    samples: SampleCount,
    ctx: Arc<GpuContext>,
}

impl VulkanAttachmentImage {
    /// Create an image, bind device-local memory and create its view
    pub(crate) fn allocate(ctx: &Arc<GpuContext>, desc: &AttachmentImageDesc) -> Result<Self> {
        if desc.extent.is_empty() {
            return Err(Error::InvalidResource(format!(
                "attachment image extent {}x{}",
                desc.extent.width, desc.extent.height
            )));
        }

        unsafe {
            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(format_to_vk(desc.format))
                .extent(vk::Extent3D {
                    width: desc.extent.width,
                    height: desc.extent.height,
                    depth: 1,
                })
                .mip_levels(1)
                .array_layers(1)
                .samples(sample_count_to_vk(desc.samples))
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(image_usage_to_vk(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = ctx.device.create_image(&image_create_info, None)
                .map_err(|e| vk_error("Failed to create attachment image", e))?;

            let requirements = ctx.device.get_image_memory_requirements(image);
            let allocation = {
                let mut allocator = match ctx.lock_allocator() {
                    Ok(allocator) => allocator,
                    Err(e) => {
                        ctx.device.destroy_image(image, None);
                        return Err(e);
                    }
                };
                allocator.allocate(&AllocationCreateDesc {
                    name: "attachment image",
                    requirements,
                    location: MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
            };
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_image(image, None);
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!(LOG_SOURCE,
                        "Out of GPU memory for attachment image ({}x{} {:?}, {:.2} MB): {}",
                        desc.extent.width, desc.extent.height, desc.format, size_mb, e);
                    return Err(Error::OutOfMemory);
                }
            };

            // From here on, Drop releases whatever was created
            let mut attachment = Self {
                image,
                view: vk::ImageView::null(),
                allocation: Some(allocation),
                owns_image: true,
                extent: desc.extent,
                format: desc.format,
                samples: desc.samples,
                ctx: ctx.clone(),
            };

            if let Some(allocation) = attachment.allocation.as_ref() {
                ctx.device.bind_image_memory(image, allocation.memory(), allocation.offset())
                    .map_err(|e| vk_error("Failed to bind attachment image memory", e))?;
            }

            attachment.view = create_view(&ctx.device, image, desc.format)?;
            Ok(attachment)
        }
    }

    /// Wrap a swapchain image, creating a view for it
    pub(crate) fn from_swapchain(
        ctx: &Arc<GpuContext>,
        image: vk::Image,
        format: TextureFormat,
        extent: Extent2D,
    ) -> Result<Self> {
        let view = create_view(&ctx.device, image, format)?;
        Ok(Self {
            image,
            view,
            allocation: None,
            owns_image: false,
            extent,
            format,
            samples: SampleCount::S1,
            ctx: ctx.clone(),
        })
    }
}

fn create_view(device: &ash::Device, image: vk::Image, format: TextureFormat) -> Result<vk::ImageView> {
    let view_create_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format_to_vk(format))
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: aspect_mask(format),
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        });

    unsafe {
        device.create_image_view(&view_create_info, None)
            .map_err(|e| vk_error("Failed to create image view", e))
    }
}

impl AttachmentImage for VulkanAttachmentImage {
    fn extent(&self) -> Extent2D {
        self.extent
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn samples(&self) -> SampleCount {
        self.samples
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanAttachmentImage {
    fn drop(&mut self) {
        unsafe {
            if self.view != vk::ImageView::null() {
                self.ctx.device.destroy_image_view(self.view, None);
            }

            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            if self.owns_image {
                self.ctx.device.destroy_image(self.image, None);
            }
        }
    }
}
