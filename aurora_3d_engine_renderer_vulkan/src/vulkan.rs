/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait
///
/// Creation order: entry, instance (+ validation messenger), window surface,
/// physical device pick, logical device with one queue per assignment,
/// allocator. Teardown is the reverse and happens when the last holder of
/// the shared `GpuContext` goes away.
///
/// A headless device skips the surface: no window extensions, no PRESENT
/// queue and no VK_KHR_swapchain.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use rustc_hash::FxHashMap;
use std::ffi::{c_char, CString};
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};
use aurora_3d_engine::aurora3d::{Engine, Error, Result};
use aurora_3d_engine::aurora3d::config::Config;
use aurora_3d_engine::aurora3d::device::{
    pick_physical_device, PhysicalDeviceCandidate, QueueAssignments, QueueFamily, QueueType,
};
use aurora_3d_engine::aurora3d::graphics_device::{
    AttachmentImage, AttachmentImageDesc, CommandPool, Fence, Framebuffer, FramebufferDesc,
    GraphicsDevice, RenderPass, RenderPassDesc, Semaphore, SubmitInfo,
};
use aurora_3d_engine::aurora3d::render::RendererSet;
use aurora_3d_engine::{engine_debug, engine_error, engine_info, engine_warn};

use crate::vulkan_command_buffer::{vk_command_buffer, VulkanCommandPool};
use crate::vulkan_context::{vk_error, GpuContext, LOG_SOURCE};
use crate::vulkan_format::{
    device_kind_from_vk, format_to_vk, pipeline_stage_to_vk, queue_flags_from_vk, ALL_FORMATS,
};
use crate::vulkan_frame_buffer::VulkanFramebuffer;
use crate::vulkan_image::VulkanAttachmentImage;
use crate::vulkan_render_pass::VulkanRenderPass;
use crate::vulkan_swapchain::VulkanSurface;
use crate::vulkan_sync::{vk_fence, vk_semaphore, VulkanFence, VulkanSemaphore};

#[cfg(feature = "vulkan-validation")]
const VALIDATION_LAYER: &std::ffi::CStr = c"VK_LAYER_KHRONOS_validation";

/// Render passes are created with `vkCreateRenderPass2` (core in 1.2)
const MIN_API_VERSION: u32 = vk::API_VERSION_1_2;

/// Vulkan device implementation
///
/// Central object for creating GPU objects and submitting command buffers.
/// Presentation lives in `VulkanSurface`, returned alongside the device.
/// `new_headless` builds a device without any surface for offscreen work.
pub struct VulkanGraphicsDevice {
    physical_device: PhysicalDeviceCandidate,
    queues: QueueAssignments,
    vk_queues: FxHashMap<QueueType, vk::Queue>,
    ctx: Arc<GpuContext>,
}

/// Surface the device must be able to present to
struct PresentTarget<'a> {
    loader: &'a ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
}

/// Instance-level handles created before the device
struct InstanceHandles {
    entry: ash::Entry,
    instance: ash::Instance,
    debug_utils: Option<ash::ext::debug_utils::Instance>,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl InstanceHandles {
    /// Destroy everything when device creation fails half-way
    unsafe fn destroy(self) {
        if let (Some(debug_utils), Some(messenger)) = (&self.debug_utils, self.debug_messenger) {
            debug_utils.destroy_debug_utils_messenger(messenger, None);
        }
        self.instance.destroy_instance(None);
    }
}

impl VulkanGraphicsDevice {
    /// Create the device and the presentation surface of `window`
    ///
    /// # Arguments
    ///
    /// * `window` - Window the surface is created for
    /// * `config` - Engine configuration (application info, validation, GPU index)
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(
        window: &W,
        config: &Config,
    ) -> Result<(Arc<Self>, VulkanSurface)> {
        let display_handle = window.display_handle()
            .map_err(|e| init_error(format!("Failed to get display handle: {}", e)))?;
        let window_handle = window.window_handle()
            .map_err(|e| init_error(format!("Failed to get window handle: {}", e)))?;

        let handles = Self::create_instance(Some(display_handle.as_raw()), config)?;

        unsafe {
            let surface = match ash_window::create_surface(
                &handles.entry,
                &handles.instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            ) {
                Ok(surface) => surface,
                Err(e) => {
                    handles.destroy();
                    return Err(init_error(format!("Failed to create surface: {:?}", e)));
                }
            };
            let surface_loader = ash::khr::surface::Instance::new(&handles.entry, &handles.instance);

            let target = PresentTarget { loader: &surface_loader, surface };
            match Self::create_device(&handles, Some(&target), config) {
                Ok((device, Some(present_queue))) => {
                    let surface = VulkanSurface::new(&device.ctx, surface, surface_loader, present_queue);
                    Ok((Arc::new(device), surface))
                }
                Ok((device, None)) => {
                    // The device context owns the instance from here on
                    surface_loader.destroy_surface(surface, None);
                    drop(device);
                    Err(init_error("No PRESENT queue for the window surface".to_string()))
                }
                Err(e) => {
                    surface_loader.destroy_surface(surface, None);
                    handles.destroy();
                    Err(e)
                }
            }
        }
    }

    /// Create a device for offscreen rendering, without any window
    ///
    /// Devices that cannot present are acceptable. Pair it with
    /// `Engine::new_headless` (or use [`Self::create_headless_engine`]).
    pub fn new_headless(config: &Config) -> Result<Arc<Self>> {
        let handles = Self::create_instance(None, config)?;
        unsafe {
            match Self::create_device(&handles, None, config) {
                Ok((device, _)) => Ok(Arc::new(device)),
                Err(e) => {
                    handles.destroy();
                    Err(e)
                }
            }
        }
    }

    fn create_instance(
        display_handle: Option<raw_window_handle::RawDisplayHandle>,
        config: &Config,
    ) -> Result<InstanceHandles> {
        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| init_error(format!("Failed to load Vulkan library: {:?}", e)))?;

            let app_name = CString::new(config.app_name.as_str())
                .map_err(|e| init_error(format!("Invalid application name: {}", e)))?;
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Aurora3D")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let mut extension_names = match display_handle {
                Some(display_handle) => ash_window::enumerate_required_extensions(display_handle)
                    .map_err(|e| init_error(format!("Failed to get required extensions: {:?}", e)))?
                    .to_vec(),
                None => Vec::new(),
            };

            let validation = validation_enabled(&entry, config);
            #[allow(unused_mut)]
            let mut layer_names: Vec<*const c_char> = Vec::new();
            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
                #[cfg(feature = "vulkan-validation")]
                layer_names.push(VALIDATION_LAYER.as_ptr());
            }

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry.create_instance(&create_info, None)
                .map_err(|e| init_error(format!("Failed to create Vulkan instance: {:?}", e)))?;

            let mut handles = InstanceHandles {
                entry,
                instance,
                debug_utils: None,
                debug_messenger: None,
            };

            if validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&handles.entry, &handles.instance);
                match create_debug_messenger(&debug_utils) {
                    Ok(messenger) => handles.debug_messenger = messenger,
                    Err(e) => {
                        handles.destroy();
                        return Err(e);
                    }
                }
                handles.debug_utils = Some(debug_utils);
            }

            Ok(handles)
        }
    }

    /// Logical device, plus its PRESENT queue when `present` is given
    unsafe fn create_device(
        handles: &InstanceHandles,
        present: Option<&PresentTarget>,
        config: &Config,
    ) -> Result<(Self, Option<vk::Queue>)> {
        let instance = &handles.instance;

        let physical_devices = instance.enumerate_physical_devices()
            .map_err(|e| init_error(format!("Failed to enumerate physical devices: {:?}", e)))?;

        let candidates = physical_devices
            .iter()
            .enumerate()
            .map(|(index, &pd)| query_candidate(instance, present, index, pd))
            .collect::<Result<Vec<PhysicalDeviceCandidate>>>()?;
        for candidate in &candidates {
            engine_debug!(LOG_SOURCE, "GPU {}: {} ({}, {:?}, {} queue families)",
                candidate.index, candidate.name, candidate.vendor_name(),
                candidate.kind, candidate.queue_families.len());
        }

        let (index, queues) = pick_physical_device(&candidates, config.gpu_index, present.is_some())
            .map_err(|e| {
                engine_error!(LOG_SOURCE, "{}", e);
                e
            })?;
        let physical_device = physical_devices[index];
        let candidate = candidates[index].clone();

        // One create info per family, as many queues as roles claimed from it
        let priorities: Vec<Vec<f32>> = queues
            .family_indices()
            .iter()
            .map(|&family| vec![1.0; queues.queue_count(family) as usize])
            .collect();
        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = queues
            .family_indices()
            .iter()
            .zip(priorities.iter())
            .map(|(&family, priorities)| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(priorities)
            })
            .collect();

        let device_extension_names: Vec<*const c_char> = if present.is_some() {
            vec![ash::khr::swapchain::NAME.as_ptr()]
        } else {
            Vec::new()
        };
        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&device_extension_names);

        let device = instance.create_device(physical_device, &device_create_info, None)
            .map_err(|e| init_error(format!("Failed to create logical device: {:?}", e)))?;

        let vk_queues: FxHashMap<QueueType, vk::Queue> = queues
            .iter()
            .into_iter()
            .map(|(queue_type, a)| (queue_type, device.get_device_queue(a.family_index, a.queue_index)))
            .collect();
        let present_queue = vk_queues.get(&QueueType::Present).copied();
        if present.is_some() && present_queue.is_none() {
            device.destroy_device(None);
            return Err(init_error("No PRESENT queue after queue selection".to_string()));
        }

        let allocator = match Allocator::new(&AllocatorCreateDesc {
            instance: instance.clone(),
            device: device.clone(),
            physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        }) {
            Ok(allocator) => allocator,
            Err(e) => {
                device.destroy_device(None);
                return Err(init_error(format!("Failed to create GPU allocator: {:?}", e)));
            }
        };

        let debug_utils_device = handles
            .debug_utils
            .as_ref()
            .map(|_| ash::ext::debug_utils::Device::new(instance, &device));

        let ctx = Arc::new(GpuContext {
            _entry: handles.entry.clone(),
            instance: instance.clone(),
            physical_device,
            device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            queue_lock: Mutex::new(()),
            debug_utils_device,
            debug_utils_instance: handles.debug_utils.clone(),
            debug_messenger: handles.debug_messenger,
        });

        engine_info!(LOG_SOURCE, "Using GPU {}: {} ({}, {:?}){}",
            index, candidate.name, candidate.vendor_name(), candidate.kind,
            if present.is_some() { "" } else { " headless" });
        engine_info!(LOG_SOURCE, "Queue assignments:\n{}", queues.describe());

        Ok((
            Self {
                physical_device: candidate,
                queues,
                vk_queues,
                ctx,
            },
            present_queue,
        ))
    }

    /// Device and surface for `window`, then an engine on top of them
    ///
    /// # Example
    ///
    /// ```no_run
    /// use aurora_3d_engine::aurora3d::config::Config;
    /// use aurora_3d_engine::aurora3d::render::RendererSet;
    /// use aurora_3d_engine_renderer_vulkan::VulkanGraphicsDevice;
    /// # fn run(window: &winit::window::Window) -> aurora_3d_engine::aurora3d::Result<()> {
    /// let engine = VulkanGraphicsDevice::create_engine(window, Config::default(), RendererSet::new())?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn create_engine<W: HasDisplayHandle + HasWindowHandle>(
        window: &W,
        config: Config,
        renderers: RendererSet,
    ) -> Result<Engine> {
        let (device, surface) = Self::new(window, &config)?;
        Engine::new(device, Box::new(surface), config, renderers)
    }

    /// Headless device, then an engine rendering offscreen images of
    /// `config.window_size`
    pub fn create_headless_engine(config: Config, renderers: RendererSet) -> Result<Engine> {
        let device = Self::new_headless(&config)?;
        Engine::new_headless(device, config, renderers)
    }

    fn queue(&self, queue: QueueType) -> Result<vk::Queue> {
        self.vk_queues
            .get(&queue)
            .copied()
            .ok_or_else(|| Error::InvalidResource(format!("no {} queue on this device", queue.name())))
    }
}

/// Describe one physical device for the queue selector
///
/// Without a `present` target no family reports present support.
unsafe fn query_candidate(
    instance: &ash::Instance,
    present: Option<&PresentTarget>,
    index: usize,
    physical_device: vk::PhysicalDevice,
) -> Result<PhysicalDeviceCandidate> {
    let properties = instance.get_physical_device_properties(physical_device);
    let name = properties
        .device_name_as_c_str()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| format!("GPU {}", index));

    let mut queue_families = instance
        .get_physical_device_queue_family_properties(physical_device)
        .iter()
        .enumerate()
        .map(|(family, props)| {
            let present_support = match present {
                Some(target) => target
                    .loader
                    .get_physical_device_surface_support(physical_device, family as u32, target.surface)
                    .map_err(|e| vk_error("Failed to query surface support", e))?,
                None => false,
            };
            Ok(QueueFamily::new(queue_flags_from_vk(props.queue_flags), props.queue_count, present_support))
        })
        .collect::<Result<Vec<QueueFamily>>>()?;

    let reason = unsupported_reason(instance, physical_device, properties.api_version, present.is_some())?;
    if let Some(reason) = reason {
        engine_warn!(LOG_SOURCE, "GPU {} ({}) skipped: {}", index, name, reason);
        queue_families.clear();
    }

    let mut color_formats = Vec::new();
    let mut depth_formats = Vec::new();
    for format in ALL_FORMATS {
        let features = instance
            .get_physical_device_format_properties(physical_device, format_to_vk(format))
            .optimal_tiling_features;
        if format.is_depth() {
            if features.contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT) {
                depth_formats.push(format);
            }
        } else if features.contains(vk::FormatFeatureFlags::COLOR_ATTACHMENT) {
            color_formats.push(format);
        }
    }

    Ok(PhysicalDeviceCandidate {
        index,
        name,
        vendor_id: properties.vendor_id,
        kind: device_kind_from_vk(properties.device_type),
        queue_families,
        color_formats,
        depth_formats,
    })
}

/// Why a device cannot be used at all, if it cannot
///
/// VK_KHR_swapchain is only required when presenting.
unsafe fn unsupported_reason(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    api_version: u32,
    needs_swapchain: bool,
) -> Result<Option<String>> {
    if api_version < MIN_API_VERSION {
        return Ok(Some(format!(
            "Vulkan {}.{} < 1.2",
            vk::api_version_major(api_version),
            vk::api_version_minor(api_version)
        )));
    }
    if !needs_swapchain {
        return Ok(None);
    }

    let extensions = instance
        .enumerate_device_extension_properties(physical_device)
        .map_err(|e| vk_error("Failed to enumerate device extensions", e))?;
    let has_swapchain = extensions.iter().any(|ext| {
        ext.extension_name_as_c_str()
            .is_ok_and(|name| name == ash::khr::swapchain::NAME)
    });
    if !has_swapchain {
        return Ok(Some("VK_KHR_swapchain not supported".to_string()));
    }
    Ok(None)
}

/// Validation is on when requested, compiled in and the layer is installed
fn validation_enabled(entry: &ash::Entry, config: &Config) -> bool {
    config.validation && validation_layer_available(entry)
}

#[cfg(feature = "vulkan-validation")]
fn validation_layer_available(entry: &ash::Entry) -> bool {
    let layers = unsafe { entry.enumerate_instance_layer_properties() }.unwrap_or_default();
    let available = layers.iter().any(|layer| {
        layer.layer_name_as_c_str().is_ok_and(|name| name == VALIDATION_LAYER)
    });
    if !available {
        engine_warn!(LOG_SOURCE, "Validation requested but {:?} is not installed", VALIDATION_LAYER);
    }
    available
}

#[cfg(not(feature = "vulkan-validation"))]
fn validation_layer_available(_entry: &ash::Entry) -> bool {
    engine_warn!(LOG_SOURCE, "Validation requested but the vulkan-validation feature is disabled");
    false
}

#[cfg(feature = "vulkan-validation")]
unsafe fn create_debug_messenger(
    debug_utils: &ash::ext::debug_utils::Instance,
) -> Result<Option<vk::DebugUtilsMessengerEXT>> {
    crate::debug::init_debug_config();

    let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(crate::debug::messenger_severities())
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

    let messenger = debug_utils
        .create_debug_utils_messenger(&debug_info, None)
        .map_err(|e| init_error(format!("Failed to create debug messenger: {:?}", e)))?;
    Ok(Some(messenger))
}

#[cfg(not(feature = "vulkan-validation"))]
unsafe fn create_debug_messenger(
    _debug_utils: &ash::ext::debug_utils::Instance,
) -> Result<Option<vk::DebugUtilsMessengerEXT>> {
    Ok(None)
}

fn init_error(message: String) -> Error {
    engine_error!(LOG_SOURCE, "{}", message);
    Error::InitializationFailed(message)
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn physical_device(&self) -> &PhysicalDeviceCandidate {
        &self.physical_device
    }

    fn queues(&self) -> &QueueAssignments {
        &self.queues
    }

    fn wait_idle(&self) -> Result<()> {
        self.ctx.wait_idle()
    }

    fn create_command_pool(&self, queue_family: u32) -> Result<Box<dyn CommandPool>> {
        Ok(Box::new(VulkanCommandPool::new(&self.ctx, queue_family)?))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>> {
        Ok(Arc::new(VulkanRenderPass::new(&self.ctx, desc)?))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>> {
        Ok(Arc::new(VulkanFramebuffer::new(&self.ctx, desc)?))
    }

    fn create_attachment_image(&self, desc: &AttachmentImageDesc) -> Result<Arc<dyn AttachmentImage>> {
        Ok(Arc::new(VulkanAttachmentImage::allocate(&self.ctx, desc)?))
    }

    fn create_fence(&self, signaled: bool) -> Result<Box<dyn Fence>> {
        Ok(Box::new(VulkanFence::new(&self.ctx, signaled)?))
    }

    fn create_semaphore(&self) -> Result<Box<dyn Semaphore>> {
        Ok(Box::new(VulkanSemaphore::new(&self.ctx)?))
    }

    fn submit(&self, queue: QueueType, info: &SubmitInfo) -> Result<()> {
        let vk_queue = self.queue(queue)?;

        let command_buffers = info
            .command_buffers
            .iter()
            .map(|cmd| vk_command_buffer(*cmd))
            .collect::<Result<Vec<_>>>()?;
        let wait_semaphores = info
            .wait_semaphores
            .iter()
            .map(|(semaphore, _)| vk_semaphore(*semaphore))
            .collect::<Result<Vec<_>>>()?;
        let wait_stages: Vec<vk::PipelineStageFlags> = info
            .wait_semaphores
            .iter()
            .map(|(_, stage)| pipeline_stage_to_vk(*stage))
            .collect();
        let signal_semaphores = info
            .signal_semaphores
            .iter()
            .map(|semaphore| vk_semaphore(*semaphore))
            .collect::<Result<Vec<_>>>()?;
        let fence = match info.fence {
            Some(fence) => vk_fence(fence)?,
            None => vk::Fence::null(),
        };

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        let _queues = self.ctx.lock_queues()?;
        unsafe {
            self.ctx.device
                .queue_submit(vk_queue, &[submit_info], fence)
                .map_err(|e| vk_error("Failed to submit commands to GPU queue", e))
        }
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        if let Err(e) = self.ctx.wait_idle() {
            engine_warn!(LOG_SOURCE, "wait_idle before device release failed: {}", e);
        }
        engine_debug!(LOG_SOURCE, "Graphics device released ({} other holders of the context)",
            Arc::strong_count(&self.ctx) - 1);
    }
}
