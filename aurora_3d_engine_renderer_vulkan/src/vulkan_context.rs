/// GpuContext - Vulkan handles shared by every backend object
///
/// Each wrapper (render pass, framebuffer, image, pool, sync object, surface)
/// holds an `Arc<GpuContext>`, so the device outlives every object created
/// from it and objects may be dropped in any order. The last reference
/// tears the device down.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::Mutex;
use aurora_3d_engine::aurora3d::{Error, Result};
use aurora_3d_engine::engine_err;

pub(crate) const LOG_SOURCE: &str = "aurora3d::vulkan";

pub struct GpuContext {
    /// Kept loaded for the lifetime of the instance
    pub(crate) _entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,

    /// Dropped before the device is destroyed
    pub(crate) allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Queues are externally synchronized; submit and present take this lock
    pub(crate) queue_lock: Mutex<()>,

    /// Command buffer labels (present when debug utils are enabled)
    pub(crate) debug_utils_device: Option<ash::ext::debug_utils::Device>,

    /// Validation messenger
    pub(crate) debug_utils_instance: Option<ash::ext::debug_utils::Instance>,
    pub(crate) debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl GpuContext {
    /// Lock the allocator, reporting a poisoned lock as a backend error
    pub(crate) fn lock_allocator(&self) -> Result<std::sync::MutexGuard<'_, Allocator>> {
        self.allocator
            .lock()
            .map_err(|_| engine_err!(LOG_SOURCE, "GPU allocator lock poisoned"))
    }

    /// Lock the queues for a submit or present
    pub(crate) fn lock_queues(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.queue_lock
            .lock()
            .map_err(|_| engine_err!(LOG_SOURCE, "Queue lock poisoned"))
    }

    pub(crate) fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device
                .device_wait_idle()
                .map_err(|e| vk_error("Failed to wait for device idle", e))
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // 1. Free the allocator's memory blocks while the device is alive
            ManuallyDrop::drop(&mut self.allocator);

            // 2. Stop validation callbacks before the instance goes away
            #[cfg(feature = "vulkan-validation")]
            crate::debug::cleanup_debug_config();

            if let (Some(debug_utils), Some(messenger)) =
                (&self.debug_utils_instance, self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            // 3. Device, then instance
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

/// Log a failed Vulkan call and turn it into an engine error
///
/// Out-of-memory results become `Error::OutOfMemory`, everything else
/// `Error::BackendError` carrying the Vulkan result name.
pub(crate) fn vk_error(context: &str, result: vk::Result) -> Error {
    match result {
        vk::Result::ERROR_OUT_OF_DEVICE_MEMORY | vk::Result::ERROR_OUT_OF_HOST_MEMORY => {
            aurora_3d_engine::engine_error!(LOG_SOURCE, "{}: {:?}", context, result);
            Error::OutOfMemory
        }
        _ => engine_err!(LOG_SOURCE, "{}: {:?}", context, result),
    }
}
