/// Fence and Semaphore - Vulkan synchronization primitives

use ash::vk;
use std::any::Any;
use std::sync::Arc;
use aurora_3d_engine::aurora3d::{Error, Result};
use aurora_3d_engine::aurora3d::graphics_device::{Fence, Semaphore};

use crate::vulkan_context::{vk_error, GpuContext};

pub struct VulkanFence {
    pub(crate) fence: vk::Fence,
    ctx: Arc<GpuContext>,
}

impl VulkanFence {
    pub(crate) fn new(ctx: &Arc<GpuContext>, signaled: bool) -> Result<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let create_info = vk::FenceCreateInfo::default().flags(flags);

        let fence = unsafe {
            ctx.device.create_fence(&create_info, None)
                .map_err(|e| vk_error("Failed to create fence", e))?
        };
        Ok(Self { fence, ctx: ctx.clone() })
    }
}

impl Fence for VulkanFence {
    fn wait(&self, timeout_ns: u64) -> Result<()> {
        unsafe {
            match self.ctx.device.wait_for_fences(&[self.fence], true, timeout_ns) {
                Ok(()) => Ok(()),
                Err(vk::Result::TIMEOUT) => Err(Error::BackendError(format!(
                    "fence wait timed out after {} ns",
                    timeout_ns
                ))),
                Err(e) => Err(vk_error("Failed to wait for fence", e)),
            }
        }
    }

    fn reset(&self) -> Result<()> {
        unsafe {
            self.ctx.device.reset_fences(&[self.fence])
                .map_err(|e| vk_error("Failed to reset fence", e))
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanFence {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_fence(self.fence, None);
        }
    }
}

pub struct VulkanSemaphore {
    pub(crate) semaphore: vk::Semaphore,
    ctx: Arc<GpuContext>,
}

impl VulkanSemaphore {
    pub(crate) fn new(ctx: &Arc<GpuContext>) -> Result<Self> {
        let semaphore = unsafe {
            ctx.device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                .map_err(|e| vk_error("Failed to create semaphore", e))?
        };
        Ok(Self { semaphore, ctx: ctx.clone() })
    }
}

impl Semaphore for VulkanSemaphore {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanSemaphore {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

/// Downcast an engine semaphore to its Vulkan handle
pub(crate) fn vk_semaphore(semaphore: &dyn Semaphore) -> Result<vk::Semaphore> {
    semaphore
        .as_any()
        .downcast_ref::<VulkanSemaphore>()
        .map(|s| s.semaphore)
        .ok_or_else(|| Error::InvalidResource("semaphore was not created by the Vulkan device".to_string()))
}

/// Downcast an engine fence to its Vulkan handle
pub(crate) fn vk_fence(fence: &dyn Fence) -> Result<vk::Fence> {
    fence
        .as_any()
        .downcast_ref::<VulkanFence>()
        .map(|f| f.fence)
        .ok_or_else(|| Error::InvalidResource("fence was not created by the Vulkan device".to_string()))
}
