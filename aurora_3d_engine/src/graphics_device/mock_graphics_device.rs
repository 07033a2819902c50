/// Mock graphics device for unit tests (no GPU required)
///
/// Command buffers record string tags instead of GPU commands. The GPU is
/// modeled as finishing every submission instantly: a submitted fence is
/// signaled right away and counts as "in flight" until the CPU waits on it.

use std::any::Any;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::device::{
    select_queues, DeviceKind, PhysicalDeviceCandidate, QueueAssignments, QueueFamily,
    QueueFlags, QueueType,
};
use crate::error::{Error, Result};
use crate::graphics_device::{
    AcquireOutcome, AttachmentImage, AttachmentImageDesc, CommandBuffer, CommandBufferLevel,
    CommandPool, Extent2D, Fence, Framebuffer, FramebufferDesc, GraphicsDevice, ImageLayout,
    ImageUsage, InheritanceInfo, PresentMode, PresentOutcome, PresentationSurface, Rect2D,
    RenderPass, RenderPassDesc, SampleCount, Semaphore, SubmitInfo, SubpassContents,
    SurfaceCapabilities, SwapchainCreateInfo, TextureFormat, Viewport,
};

// ============================================================================
// Shared state
// ============================================================================

/// State shared by the mock device and every object it creates
#[derive(Default)]
pub struct MockState {
    next_id: AtomicU64,
    /// Device-level events in call order
    pub events: Mutex<Vec<String>>,
    /// Fences submitted and not yet waited on
    pending_fences: Mutex<Vec<u64>>,
    /// Highest number of fences in flight observed
    pub max_in_flight: AtomicUsize,
    pub submit_count: AtomicUsize,
    /// Semaphores waited on / signaled across every submit
    pub semaphores_waited: AtomicUsize,
    pub semaphores_signaled: AtomicUsize,
    pub pools_created: AtomicUsize,
    pub pools_alive: AtomicUsize,
    pub buffers_allocated: AtomicUsize,
    pub wait_idle_count: AtomicUsize,
    /// Number of upcoming submits that fail
    pub fail_submits: AtomicUsize,
}

impl MockState {
    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn event(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

// ============================================================================
// Mock Device
// ============================================================================

pub struct MockGraphicsDevice {
    physical: PhysicalDeviceCandidate,
    queues: QueueAssignments,
    pub state: Arc<MockState>,
}

impl MockGraphicsDevice {
    /// Device with one family doing everything
    pub fn new() -> Self {
        Self::with_families(vec![QueueFamily::new(
            QueueFlags::GRAPHICS | QueueFlags::COMPUTE | QueueFlags::TRANSFER,
            4,
            true,
        )])
    }

    /// Device resolved without a PRESENT queue, as for offscreen rendering
    pub fn headless() -> Self {
        Self::select(
            vec![QueueFamily::new(QueueFlags::GRAPHICS | QueueFlags::COMPUTE | QueueFlags::TRANSFER, 4, false)],
            false,
        )
    }

    pub fn with_families(families: Vec<QueueFamily>) -> Self {
        Self::select(families, true)
    }

    fn select(families: Vec<QueueFamily>, present: bool) -> Self {
        let queues = select_queues(&families, present).unwrap();
        Self {
            physical: PhysicalDeviceCandidate {
                index: 0,
                name: "Mock GPU".to_string(),
                vendor_id: 0x10DE,
                kind: DeviceKind::Discrete,
                queue_families: families,
                color_formats: vec![TextureFormat::B8G8R8A8_UNORM, TextureFormat::R8G8B8A8_UNORM],
                depth_formats: vec![TextureFormat::D32_FLOAT, TextureFormat::D24_UNORM_S8_UINT],
            },
            queues,
            state: Arc::new(MockState::default()),
        }
    }

    pub fn shared() -> (Arc<dyn GraphicsDevice>, Arc<MockState>) {
        let device = Self::new();
        let state = device.state.clone();
        (Arc::new(device), state)
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn physical_device(&self) -> &PhysicalDeviceCandidate {
        &self.physical
    }

    fn queues(&self) -> &QueueAssignments {
        &self.queues
    }

    fn wait_idle(&self) -> Result<()> {
        self.state.wait_idle_count.fetch_add(1, Ordering::SeqCst);
        self.state.event("wait_idle".to_string());
        Ok(())
    }

    fn create_command_pool(&self, queue_family: u32) -> Result<Box<dyn CommandPool>> {
        self.state.pools_created.fetch_add(1, Ordering::SeqCst);
        self.state.pools_alive.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockCommandPool {
            queue_family,
            state: self.state.clone(),
            resets: 0,
        }))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>> {
        Ok(Arc::new(MockRenderPass { desc: desc.clone() }))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>> {
        let pass = desc.render_pass.desc();
        if desc.attachments.len() != pass.attachments.len() {
            return Err(Error::InvalidResource(format!(
                "framebuffer has {} attachments, render pass expects {}",
                desc.attachments.len(),
                pass.attachments.len()
            )));
        }
        for (index, (image, attachment)) in desc.attachments.iter().zip(&pass.attachments).enumerate() {
            if image.format() != attachment.format || image.samples() != attachment.samples {
                return Err(Error::InvalidResource(format!(
                    "attachment {} is {:?}/{:?}, render pass expects {:?}/{:?}",
                    index,
                    image.format(),
                    image.samples(),
                    attachment.format,
                    attachment.samples
                )));
            }
        }
        Ok(Arc::new(MockFramebuffer {
            width: desc.width,
            height: desc.height,
            attachments: desc.attachments.clone(),
        }))
    }

    fn create_attachment_image(&self, desc: &AttachmentImageDesc) -> Result<Arc<dyn AttachmentImage>> {
        Ok(Arc::new(MockAttachmentImage::new(*desc)))
    }

    fn create_fence(&self, signaled: bool) -> Result<Box<dyn Fence>> {
        Ok(Box::new(MockFence {
            id: self.state.next_id(),
            signaled: Mutex::new(signaled),
            state: self.state.clone(),
        }))
    }

    fn create_semaphore(&self) -> Result<Box<dyn Semaphore>> {
        Ok(Box::new(MockSemaphore))
    }

    fn submit(&self, queue: QueueType, info: &SubmitInfo) -> Result<()> {
        if self
            .state
            .fail_submits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(Error::BackendError("vkQueueSubmit failed: ERROR_DEVICE_LOST".to_string()));
        }
        for buffer in info.command_buffers {
            let mock = buffer
                .as_any()
                .downcast_ref::<MockCommandBuffer>()
                .ok_or_else(|| Error::InvalidResource("not a mock command buffer".to_string()))?;
            if mock.recording || mock.level != CommandBufferLevel::Primary {
                return Err(Error::InvalidResource("submitted buffer not ready".to_string()));
            }
        }
        self.state.submit_count.fetch_add(1, Ordering::SeqCst);
        self.state.semaphores_waited.fetch_add(info.wait_semaphores.len(), Ordering::SeqCst);
        self.state.semaphores_signaled.fetch_add(info.signal_semaphores.len(), Ordering::SeqCst);
        self.state.event(format!("submit {}", queue.name()));
        if let Some(fence) = info.fence {
            let fence = fence
                .as_any()
                .downcast_ref::<MockFence>()
                .ok_or_else(|| Error::InvalidResource("not a mock fence".to_string()))?;
            *fence.signaled.lock().unwrap() = true;
            let mut pending = self.state.pending_fences.lock().unwrap();
            pending.push(fence.id);
            self.state.max_in_flight.fetch_max(pending.len(), Ordering::SeqCst);
        }
        Ok(())
    }
}

// ============================================================================
// Mock CommandPool / CommandBuffer
// ============================================================================

pub struct MockCommandPool {
    queue_family: u32,
    state: Arc<MockState>,
    pub resets: u32,
}

impl CommandPool for MockCommandPool {
    fn allocate(&mut self, level: CommandBufferLevel, count: u32) -> Result<Vec<Box<dyn CommandBuffer>>> {
        self.state.buffers_allocated.fetch_add(count as usize, Ordering::SeqCst);
        Ok((0..count)
            .map(|_| Box::new(MockCommandBuffer::new(level)) as Box<dyn CommandBuffer>)
            .collect())
    }

    fn reset(&mut self) -> Result<()> {
        self.resets += 1;
        Ok(())
    }

    fn queue_family(&self) -> u32 {
        self.queue_family
    }
}

impl Drop for MockCommandPool {
    fn drop(&mut self) {
        self.state.pools_alive.fetch_sub(1, Ordering::SeqCst);
        self.state.event("destroy_pool".to_string());
    }
}

pub struct MockCommandBuffer {
    pub level: CommandBufferLevel,
    /// Recorded command tags
    pub commands: Vec<String>,
    pub recording: bool,
    active_pass: Option<ActivePass>,
    /// Render pass a secondary buffer was begun to continue
    inherited: Option<RenderPassDesc>,
}

struct ActivePass {
    render_pass: Arc<dyn RenderPass>,
    framebuffer: Arc<dyn Framebuffer>,
    contents: SubpassContents,
}

impl MockCommandBuffer {
    pub fn new(level: CommandBufferLevel) -> Self {
        Self {
            level,
            commands: Vec::new(),
            recording: false,
            active_pass: None,
            inherited: None,
        }
    }

    /// Render pass a secondary buffer continues, if any
    pub fn inherited_render_pass(&self) -> Option<&RenderPassDesc> {
        self.inherited.as_ref()
    }

    fn require_recording(&self, command: &str) -> Result<()> {
        if !self.recording {
            return Err(Error::BackendError(format!("{} outside recording", command)));
        }
        Ok(())
    }

    /// Commands recorded directly into this buffer, which a pass begun for
    /// secondary buffers does not accept
    fn require_inline(&self, command: &str) -> Result<()> {
        self.require_recording(command)?;
        match &self.active_pass {
            Some(pass) if pass.contents == SubpassContents::SecondaryCommandBuffers => Err(
                Error::BackendError(format!("{} in a render pass expecting secondary buffers", command)),
            ),
            _ => Ok(()),
        }
    }
}

impl CommandBuffer for MockCommandBuffer {
    fn level(&self) -> CommandBufferLevel {
        self.level
    }

    fn begin(&mut self) -> Result<()> {
        if self.recording {
            return Err(Error::BackendError("already recording".to_string()));
        }
        self.commands.clear();
        self.recording = true;
        self.inherited = None;
        Ok(())
    }

    fn begin_secondary(&mut self, inheritance: &InheritanceInfo) -> Result<()> {
        if self.level != CommandBufferLevel::Secondary {
            return Err(Error::BackendError("begin_secondary on a primary buffer".to_string()));
        }
        let subpasses = inheritance.render_pass.desc().subpasses.len();
        if inheritance.subpass as usize >= subpasses.max(1) {
            return Err(Error::BackendError(format!(
                "inherited subpass {} of a {}-subpass render pass",
                inheritance.subpass, subpasses
            )));
        }
        self.begin()?;
        self.inherited = Some(inheritance.render_pass.desc().clone());
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.require_recording("end")?;
        if self.active_pass.is_some() {
            return Err(Error::BackendError("end with an active render pass".to_string()));
        }
        self.recording = false;
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.commands.clear();
        self.recording = false;
        self.active_pass = None;
        self.inherited = None;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn RenderPass>,
        framebuffer: &Arc<dyn Framebuffer>,
        area: Rect2D,
        contents: SubpassContents,
    ) -> Result<()> {
        self.require_recording("begin_render_pass")?;
        if self.level != CommandBufferLevel::Primary {
            return Err(Error::BackendError("begin_render_pass on a secondary buffer".to_string()));
        }
        if self.active_pass.is_some() {
            return Err(Error::BackendError("render pass already active".to_string()));
        }
        self.active_pass = Some(ActivePass {
            render_pass: render_pass.clone(),
            framebuffer: framebuffer.clone(),
            contents,
        });
        self.commands.push(format!("begin_render_pass {}x{}", area.width, area.height));
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.require_recording("end_render_pass")?;
        let pass = self
            .active_pass
            .take()
            .ok_or_else(|| Error::BackendError("no active render pass".to_string()))?;
        if let Some(framebuffer) = pass.framebuffer.as_any().downcast_ref::<MockFramebuffer>() {
            for (image, attachment) in framebuffer.attachments.iter().zip(&pass.render_pass.desc().attachments) {
                if let Some(image) = image.as_any().downcast_ref::<MockAttachmentImage>() {
                    image.set_layout(attachment.final_layout);
                }
            }
        }
        self.commands.push("end_render_pass".to_string());
        Ok(())
    }

    fn execute_commands(&mut self, secondaries: &[&dyn CommandBuffer]) -> Result<()> {
        self.require_recording("execute_commands")?;
        let pass = match &self.active_pass {
            Some(pass) if pass.contents == SubpassContents::SecondaryCommandBuffers => pass,
            _ => {
                return Err(Error::BackendError(
                    "execute_commands outside a render pass begun for secondary buffers".to_string(),
                ))
            }
        };
        let mut replayed = Vec::new();
        for secondary in secondaries {
            let secondary = secondary
                .as_any()
                .downcast_ref::<MockCommandBuffer>()
                .ok_or_else(|| Error::InvalidResource("not a mock command buffer".to_string()))?;
            if secondary.level != CommandBufferLevel::Secondary || secondary.recording {
                return Err(Error::BackendError("secondary buffer not ready".to_string()));
            }
            if secondary.inherited.as_ref() != Some(pass.render_pass.desc()) {
                return Err(Error::BackendError(
                    "secondary buffer does not continue the active render pass".to_string(),
                ));
            }
            replayed.extend(secondary.commands.iter().cloned());
        }
        self.commands.extend(replayed);
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.require_inline("set_viewport")?;
        self.commands.push(format!("set_viewport {}x{}", viewport.width, viewport.height));
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.require_inline("set_scissor")?;
        self.commands.push(format!("set_scissor {}x{}", scissor.width, scissor.height));
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.require_inline("draw")?;
        self.commands.push(format!("draw {} {}", vertex_count, first_vertex));
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.require_inline("draw_indexed")?;
        self.commands.push(format!("draw_indexed {} {} {}", index_count, first_index, vertex_offset));
        Ok(())
    }

    fn begin_label(&mut self, name: &str, _color: [f32; 4]) {
        self.commands.push(format!("label {}", name));
    }

    fn end_label(&mut self) {
        self.commands.push("end_label".to_string());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock RenderPass / Framebuffer / AttachmentImage
// ============================================================================

pub struct MockRenderPass {
    pub desc: RenderPassDesc,
}

impl RenderPass for MockRenderPass {
    fn desc(&self) -> &RenderPassDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockFramebuffer {
    pub width: u32,
    pub height: u32,
    pub attachments: Vec<Arc<dyn AttachmentImage>>,
}

impl Framebuffer for MockFramebuffer {
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

pub struct MockAttachmentImage {
    pub desc: AttachmentImageDesc,
    layout: Mutex<ImageLayout>,
}

impl MockAttachmentImage {
    pub fn new(desc: AttachmentImageDesc) -> Self {
        Self { desc, layout: Mutex::new(ImageLayout::Undefined) }
    }

    /// Layout after the last render pass that used the image
    pub fn layout(&self) -> ImageLayout {
        *self.layout.lock().unwrap()
    }

    fn set_layout(&self, layout: ImageLayout) {
        *self.layout.lock().unwrap() = layout;
    }
}

impl AttachmentImage for MockAttachmentImage {
    fn extent(&self) -> Extent2D {
        self.desc.extent
    }

    fn format(&self) -> TextureFormat {
        self.desc.format
    }

    fn samples(&self) -> SampleCount {
        self.desc.samples
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Layout of a mock image behind a trait object
pub fn image_layout(image: &Arc<dyn AttachmentImage>) -> ImageLayout {
    image
        .as_any()
        .downcast_ref::<MockAttachmentImage>()
        .map(|i| i.layout())
        .unwrap_or(ImageLayout::Undefined)
}

// ============================================================================
// Mock Fence / Semaphore
// ============================================================================

pub struct MockFence {
    id: u64,
    signaled: Mutex<bool>,
    state: Arc<MockState>,
}

impl Fence for MockFence {
    fn wait(&self, _timeout_ns: u64) -> Result<()> {
        if !*self.signaled.lock().unwrap() {
            // A real device would block forever here
            return Err(Error::BackendError("wait on an unsubmitted, unsignaled fence".to_string()));
        }
        self.state.pending_fences.lock().unwrap().retain(|id| *id != self.id);
        self.state.event("wait_fence".to_string());
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        *self.signaled.lock().unwrap() = false;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockSemaphore;

impl Semaphore for MockSemaphore {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Surface
// ============================================================================

/// Scriptable surface state, shared with the test
pub struct MockSurfaceState {
    pub capabilities: Mutex<SurfaceCapabilities>,
    pub formats: Vec<TextureFormat>,
    pub present_modes: Vec<PresentMode>,
    pub last_create_info: Mutex<Option<SwapchainCreateInfo>>,
    pub swapchains_created: AtomicUsize,
    /// Number of upcoming acquires that report out-of-date
    pub acquire_out_of_date: AtomicUsize,
    /// Number of upcoming presents that report out-of-date
    pub present_out_of_date: AtomicUsize,
    /// Number of upcoming presents that report suboptimal
    pub present_suboptimal: AtomicUsize,
    pub presented: Mutex<Vec<u32>>,
    image_count: AtomicU32,
    next_image: AtomicU32,
}

impl MockSurfaceState {
    pub fn presented(&self) -> Vec<u32> {
        self.presented.lock().unwrap().clone()
    }

    pub fn swapchains_created(&self) -> usize {
        self.swapchains_created.load(Ordering::SeqCst)
    }

    pub fn set_current_extent(&self, extent: Option<Extent2D>) {
        self.capabilities.lock().unwrap().current_extent = extent;
    }
}

pub struct MockSurface {
    pub state: Arc<MockSurfaceState>,
}

impl MockSurface {
    /// 2..=8 images, extent chosen by the application, FIFO and MAILBOX
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockSurfaceState {
                capabilities: Mutex::new(SurfaceCapabilities {
                    min_image_count: 2,
                    max_image_count: 8,
                    current_extent: None,
                    min_extent: Extent2D::new(1, 1),
                    max_extent: Extent2D::new(8192, 8192),
                }),
                formats: vec![TextureFormat::B8G8R8A8_UNORM, TextureFormat::B8G8R8A8_SRGB],
                present_modes: vec![PresentMode::Fifo, PresentMode::Mailbox],
                last_create_info: Mutex::new(None),
                swapchains_created: AtomicUsize::new(0),
                acquire_out_of_date: AtomicUsize::new(0),
                present_out_of_date: AtomicUsize::new(0),
                present_suboptimal: AtomicUsize::new(0),
                presented: Mutex::new(Vec::new()),
                image_count: AtomicU32::new(0),
                next_image: AtomicU32::new(0),
            }),
        }
    }

    fn take(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl PresentationSurface for MockSurface {
    fn capabilities(&self) -> Result<SurfaceCapabilities> {
        Ok(*self.state.capabilities.lock().unwrap())
    }

    fn supported_formats(&self) -> Result<Vec<TextureFormat>> {
        Ok(self.state.formats.clone())
    }

    fn supported_present_modes(&self) -> Result<Vec<PresentMode>> {
        Ok(self.state.present_modes.clone())
    }

    fn create_swapchain(&mut self, info: &SwapchainCreateInfo) -> Result<Vec<Arc<dyn AttachmentImage>>> {
        self.state.swapchains_created.fetch_add(1, Ordering::SeqCst);
        *self.state.last_create_info.lock().unwrap() = Some(info.clone());
        self.state.image_count.store(info.image_count, Ordering::SeqCst);
        self.state.next_image.store(0, Ordering::SeqCst);
        Ok((0..info.image_count)
            .map(|_| {
                Arc::new(MockAttachmentImage::new(AttachmentImageDesc {
                    extent: info.extent,
                    format: info.format,
                    samples: SampleCount::S1,
                    usage: ImageUsage::COLOR_ATTACHMENT,
                })) as Arc<dyn AttachmentImage>
            })
            .collect())
    }

    fn acquire_next_image(&mut self, _signal: &dyn Semaphore) -> Result<AcquireOutcome> {
        if Self::take(&self.state.acquire_out_of_date) {
            return Ok(AcquireOutcome::OutOfDate);
        }
        let count = self.state.image_count.load(Ordering::SeqCst);
        if count == 0 {
            return Err(Error::BackendError("acquire without a swapchain".to_string()));
        }
        let image_index = self.state.next_image.fetch_add(1, Ordering::SeqCst) % count;
        Ok(AcquireOutcome::Acquired { image_index, suboptimal: false })
    }

    fn present(&mut self, image_index: u32, _wait: &dyn Semaphore) -> Result<PresentOutcome> {
        if Self::take(&self.state.present_out_of_date) {
            return Ok(PresentOutcome::OutOfDate);
        }
        self.state.presented.lock().unwrap().push(image_index);
        if Self::take(&self.state.present_suboptimal) {
            return Ok(PresentOutcome::Suboptimal);
        }
        Ok(PresentOutcome::Presented)
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
