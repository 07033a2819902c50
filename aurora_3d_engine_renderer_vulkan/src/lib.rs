/*!
# Aurora 3D Engine - Vulkan Backend

Vulkan implementation of the `GraphicsDevice` and `PresentationSurface`
traits of `aurora_3d_engine`, built on Ash for the bindings and
gpu-allocator for image memory.

The quickest way in is [`VulkanGraphicsDevice::create_engine`], which
creates the device and the window surface and hands both to `Engine::new`.
Without a window, [`VulkanGraphicsDevice::create_headless_engine`] renders
into offscreen images left shader-readable after each frame.

Validation layers are compiled in only with the `vulkan-validation`
feature; `Config::validation` then turns them on at runtime.
*/

mod vulkan;
mod vulkan_context;
mod vulkan_format;
mod vulkan_image;
mod vulkan_sync;
mod vulkan_render_pass;
mod vulkan_frame_buffer;
mod vulkan_command_buffer;
mod vulkan_swapchain;

#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan::VulkanGraphicsDevice;
pub use vulkan_swapchain::VulkanSurface;

/// Backend types grouped like the core crate's `aurora3d` namespace
pub mod aurora3d {
    pub use crate::vulkan::VulkanGraphicsDevice;
    pub use crate::vulkan_swapchain::VulkanSurface;
    pub use crate::vulkan_context::GpuContext;
    pub use crate::vulkan_image::VulkanAttachmentImage;
    pub use crate::vulkan_sync::{VulkanFence, VulkanSemaphore};
    pub use crate::vulkan_render_pass::VulkanRenderPass;
    pub use crate::vulkan_frame_buffer::VulkanFramebuffer;
    pub use crate::vulkan_command_buffer::{VulkanCommandBuffer, VulkanCommandPool};

    #[cfg(feature = "vulkan-validation")]
    pub use crate::debug::{get_validation_stats, print_validation_stats_report, ValidationStats};
}
