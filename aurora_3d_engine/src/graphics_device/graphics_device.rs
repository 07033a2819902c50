/// GraphicsDevice trait - factory for GPU objects and queue submission

use std::sync::Arc;
use crate::device::{PhysicalDeviceCandidate, QueueAssignments, QueueType};
use crate::error::{Error, Result};
use crate::graphics_device::{
    AttachmentImage, AttachmentImageDesc, CommandBuffer, CommandPool, Fence,
    Framebuffer, FramebufferDesc, PipelineStage, RenderPass, RenderPassDesc, Semaphore,
};

/// One queue submission
pub struct SubmitInfo<'a> {
    /// Primary command buffers, executed in order
    pub command_buffers: &'a [&'a dyn CommandBuffer],
    /// Semaphores to wait on, each at the given stage
    pub wait_semaphores: &'a [(&'a dyn Semaphore, PipelineStage)],
    /// Semaphores signaled on completion
    pub signal_semaphores: &'a [&'a dyn Semaphore],
    /// Fence signaled on completion
    pub fence: Option<&'a dyn Fence>,
}

/// Logical GPU device
///
/// Shared as `Arc<dyn GraphicsDevice>` by everything that creates GPU
/// objects. Objects created here keep what they need to destroy themselves,
/// so they may be dropped in any order relative to each other.
pub trait GraphicsDevice: Send + Sync {
    /// The physical device this device was created on
    fn physical_device(&self) -> &PhysicalDeviceCandidate;

    /// Queue assignments resolved at creation
    fn queues(&self) -> &QueueAssignments;

    /// Block until every queue is idle
    fn wait_idle(&self) -> Result<()>;

    /// Create a resettable command pool on `queue_family`
    fn create_command_pool(&self, queue_family: u32) -> Result<Box<dyn CommandPool>>;

    /// Create a render pass
    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>>;

    /// Create a framebuffer
    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>>;

    /// Create an image usable as framebuffer attachment
    fn create_attachment_image(&self, desc: &AttachmentImageDesc) -> Result<Arc<dyn AttachmentImage>>;

    /// Create a fence
    fn create_fence(&self, signaled: bool) -> Result<Box<dyn Fence>>;

    /// Create a binary semaphore
    fn create_semaphore(&self) -> Result<Box<dyn Semaphore>>;

    /// Submit work to the queue serving `queue`
    fn submit(&self, queue: QueueType, info: &SubmitInfo) -> Result<()>;

    /// Family index of the queue serving `queue`
    fn queue_family(&self, queue: QueueType) -> Result<u32> {
        self.queues()
            .get(queue)
            .map(|a| a.family_index)
            .ok_or_else(|| Error::InvalidResource(format!("no {} queue on this device", queue.name())))
    }
}
