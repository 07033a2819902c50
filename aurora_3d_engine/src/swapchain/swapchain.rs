/// Swapchain - presentable images, per-frame synchronization and frame pacing
///
/// Frame lifecycle:
///
/// ```text
/// Idle --begin_frame--> Acquiring --> Recording --end_frame--> Submitted --> Presenting --> Idle
/// ```
///
/// `begin_frame` waits on the fence of the frame slot about to be reused;
/// this is the only place the CPU waits for the GPU. A stale surface is
/// handled here by rebuilding and never reaches the caller as an error.
///
/// A headless surface (see `HeadlessSurface`) runs the same lifecycle; its
/// frames are submitted without semaphores and ordered by fences only.

use std::sync::Arc;
use crate::config::Config;
use crate::device::QueueType;
use crate::error::{Error, Result};
use crate::graphics_device::{
    AcquireOutcome, AttachmentImage, AttachmentImageDesc, CommandBuffer, CommandBufferLevel,
    CommandPool, Extent2D, Fence, Framebuffer, FramebufferDesc, GraphicsDevice, ImageUsage,
    PipelineStage, PresentMode, PresentOutcome, PresentationSurface, Rect2D, RenderPass,
    SampleCount, Semaphore, SubmitInfo, SwapchainCreateInfo, TextureFormat,
};
use crate::render::RenderContext;
use crate::{engine_debug, engine_info, engine_warn};

const LOG_SOURCE: &str = "aurora3d::Swapchain";

/// Where the frame manager is in the frame lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Acquiring,
    Recording,
    Submitted,
    Presenting,
}

/// Present mode for the vsync setting among the supported ones
///
/// vsync picks FIFO. Otherwise MAILBOX, then IMMEDIATE, then FIFO.
pub fn choose_present_mode(supported: &[PresentMode], vsync: bool) -> PresentMode {
    if vsync {
        return PresentMode::Fifo;
    }
    [PresentMode::Mailbox, PresentMode::Immediate]
        .into_iter()
        .find(|mode| supported.contains(mode))
        .unwrap_or(PresentMode::Fifo)
}

/// Per frame-in-flight resources
struct FrameSlot {
    fence: Box<dyn Fence>,
    image_acquired: Box<dyn Semaphore>,
    command_buffer: Box<dyn CommandBuffer>,
}

/// Images owned by one build of the swapchain
#[derive(Default)]
struct SwapchainImages {
    presentable: Vec<Arc<dyn AttachmentImage>>,
    depth: Option<Arc<dyn AttachmentImage>>,
    ms_color: Option<Arc<dyn AttachmentImage>>,
    ms_depth: Option<Arc<dyn AttachmentImage>>,
    framebuffers: Vec<Arc<dyn Framebuffer>>,
    /// Signaled when rendering into image i is done, waited by present
    render_finished: Vec<Box<dyn Semaphore>>,
    /// Frame slot that last rendered into image i
    images_in_flight: Vec<Option<usize>>,
}

/// Swapchain and frame manager
pub struct Swapchain {
    device: Arc<dyn GraphicsDevice>,
    surface: Box<dyn PresentationSurface>,
    render_pass: Arc<dyn RenderPass>,
    command_pool: Box<dyn CommandPool>,

    config: Config,
    headless: bool,
    requested_extent: Extent2D,
    color_format: TextureFormat,
    depth_format: Option<TextureFormat>,
    samples: SampleCount,

    extent: Extent2D,
    present_mode: PresentMode,
    images: SwapchainImages,
    slots: Vec<FrameSlot>,
    frame_index: usize,
    current_image: Option<u32>,
    last_presented: Option<u32>,
    state: FrameState,
    needs_rebuild: bool,
}

impl Swapchain {
    /// Create the swapchain for `render_pass` and build it at `extent`
    ///
    /// The presentable format is the render pass's single-sampled color
    /// attachment; the surface must support it.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        surface: Box<dyn PresentationSurface>,
        render_pass: Arc<dyn RenderPass>,
        config: &Config,
        extent: Extent2D,
    ) -> Result<Self> {
        let desc = render_pass.desc();
        let color_format = desc
            .attachments
            .iter()
            .find(|a| !a.is_depth() && !a.samples.is_multisampled())
            .map(|a| a.format)
            .ok_or_else(|| {
                Error::InvalidRenderPass("render pass has no single-sampled color attachment".to_string())
            })?;
        if !surface.supported_formats()?.contains(&color_format) {
            return Err(Error::InitializationFailed(format!(
                "surface cannot present {:?}",
                color_format
            )));
        }

        let graphics_family = device.queue_family(QueueType::Graphics)?;
        let command_pool = device.create_command_pool(graphics_family)?;
        let headless = surface.is_headless();

        let mut swapchain = Self {
            depth_format: desc.depth_format(),
            samples: desc.max_samples(),
            device,
            surface,
            render_pass,
            command_pool,
            config: config.clone(),
            headless,
            requested_extent: extent,
            color_format,
            extent: Extent2D::default(),
            present_mode: PresentMode::Fifo,
            images: SwapchainImages::default(),
            slots: Vec::new(),
            frame_index: 0,
            current_image: None,
            last_presented: None,
            state: FrameState::Idle,
            needs_rebuild: true,
        };
        swapchain.rebuild()?;
        Ok(swapchain)
    }

    // ===== ACCESSORS =====

    pub fn image_count(&self) -> u32 {
        self.images.presentable.len() as u32
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    pub fn color_format(&self) -> TextureFormat {
        self.color_format
    }

    pub fn depth_format(&self) -> Option<TextureFormat> {
        self.depth_format
    }

    pub fn samples(&self) -> SampleCount {
        self.samples
    }

    pub fn present_mode(&self) -> PresentMode {
        self.present_mode
    }

    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    pub fn frame_in_flight_index(&self) -> usize {
        self.frame_index
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// True when driving a `HeadlessSurface`
    pub fn is_headless(&self) -> bool {
        self.headless
    }

    /// Presentable images of the current build, in surface order
    pub fn presentable_images(&self) -> &[Arc<dyn AttachmentImage>] {
        &self.images.presentable
    }

    /// Image of the last submitted frame; reset by every rebuild
    ///
    /// For a headless swapchain this is where a finished frame can be read
    /// back once the device is idle.
    pub fn last_presented_image(&self) -> Option<&Arc<dyn AttachmentImage>> {
        self.last_presented
            .and_then(|index| self.images.presentable.get(index as usize))
    }

    pub fn render_pass(&self) -> &Arc<dyn RenderPass> {
        &self.render_pass
    }

    pub fn framebuffers(&self) -> &[Arc<dyn Framebuffer>] {
        &self.images.framebuffers
    }

    /// Single-sampled depth image of the current build
    pub fn depth_image(&self) -> Result<&Arc<dyn AttachmentImage>> {
        self.images.depth.as_ref().ok_or(Error::MissingDepthBuffer)
    }

    /// Primary command buffer of the frame being recorded
    pub fn command_buffer(&mut self) -> Result<&mut dyn CommandBuffer> {
        if self.state != FrameState::Recording {
            return Err(Error::InvalidFrameState(format!(
                "command_buffer() in state {:?}",
                self.state
            )));
        }
        Ok(self.slots[self.frame_index].command_buffer.as_mut())
    }

    // ===== FRAME LIFECYCLE =====

    /// Start a frame
    ///
    /// Returns `Ok(None)` when the frame must be skipped: the surface went
    /// out of date (on acquire or on the previous present) or is zero-sized.
    /// The swapchain is rebuilt when possible and the next call proceeds.
    pub fn begin_frame(&mut self) -> Result<Option<RenderContext>> {
        if self.state != FrameState::Idle {
            return Err(Error::InvalidFrameState(format!("begin_frame in state {:?}", self.state)));
        }
        // Stale or resized surface: rebuild now, record from the next call
        if self.needs_rebuild {
            self.rebuild()?;
            return Ok(None);
        }

        self.state = FrameState::Acquiring;
        let slot_index = self.frame_index;
        self.slots[slot_index].fence.wait(u64::MAX)?;

        let outcome = self
            .surface
            .acquire_next_image(self.slots[slot_index].image_acquired.as_ref());
        let image_index = match outcome {
            Ok(AcquireOutcome::Acquired { image_index, suboptimal }) => {
                if suboptimal {
                    self.needs_rebuild = true;
                }
                image_index
            }
            Ok(AcquireOutcome::OutOfDate) | Err(Error::SurfaceOutOfDate) => {
                engine_debug!(LOG_SOURCE, "Acquire reported out of date, rebuilding");
                self.state = FrameState::Idle;
                self.rebuild()?;
                return Ok(None);
            }
            Err(e) => {
                self.state = FrameState::Idle;
                return Err(e);
            }
        };

        // Another slot may still be rendering into this image
        let image = image_index as usize;
        if let Some(other) = self.images.images_in_flight[image] {
            if other != slot_index {
                self.slots[other].fence.wait(u64::MAX)?;
            }
        }
        self.images.images_in_flight[image] = Some(slot_index);

        let command_buffer = &mut self.slots[slot_index].command_buffer;
        command_buffer.reset()?;
        command_buffer.begin()?;

        self.current_image = Some(image_index);
        self.state = FrameState::Recording;

        Ok(Some(RenderContext::new(
            self.images.framebuffers[image].clone(),
            slot_index,
            Rect2D::from_extent(self.extent),
        )))
    }

    /// Submit the recorded frame and present it
    pub fn end_frame(&mut self) -> Result<()> {
        if self.state != FrameState::Recording {
            return Err(Error::InvalidFrameState(format!("end_frame in state {:?}", self.state)));
        }
        let image_index = self
            .current_image
            .take()
            .ok_or_else(|| Error::InvalidFrameState("no acquired image".to_string()))?;
        let slot = &mut self.slots[self.frame_index];
        slot.command_buffer.end()?;

        self.state = FrameState::Submitted;
        slot.fence.reset()?;
        let render_finished = self.images.render_finished[image_index as usize].as_ref();
        let acquired_wait = [(slot.image_acquired.as_ref(), PipelineStage::COLOR_ATTACHMENT_OUTPUT)];
        let finished_signal = [render_finished];
        // Nothing signals or waits on semaphores of a headless surface
        let wait_semaphores: &[(&dyn Semaphore, PipelineStage)] = if self.headless { &[] } else { &acquired_wait };
        let signal_semaphores: &[&dyn Semaphore] = if self.headless { &[] } else { &finished_signal };
        self.device.submit(
            QueueType::Graphics,
            &SubmitInfo {
                command_buffers: &[slot.command_buffer.as_ref()],
                wait_semaphores,
                signal_semaphores,
                fence: Some(slot.fence.as_ref()),
            },
        )?;
        self.last_presented = Some(image_index);

        self.state = FrameState::Presenting;
        let outcome = self.surface.present(image_index, render_finished);

        self.frame_index = (self.frame_index + 1) % self.slots.len();
        self.state = FrameState::Idle;

        match outcome {
            Ok(PresentOutcome::Presented) => {}
            Ok(PresentOutcome::Suboptimal) => self.needs_rebuild = true,
            Ok(PresentOutcome::OutOfDate) | Err(Error::SurfaceOutOfDate) => {
                engine_debug!(LOG_SOURCE, "Present reported out of date, rebuilding");
                self.needs_rebuild = true;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Resize; rebuilds unless the extent is unchanged or zero
    ///
    /// Returns true when a rebuild happened.
    pub fn update_extent(&mut self, width: u32, height: u32) -> Result<bool> {
        if self.state != FrameState::Idle {
            return Err(Error::InvalidFrameState(format!("update_extent in state {:?}", self.state)));
        }
        let extent = Extent2D::new(width, height);
        if extent.is_empty() || extent == self.requested_extent {
            return Ok(false);
        }
        self.requested_extent = extent;
        self.needs_rebuild = true;
        self.rebuild()
    }

    // ===== BUILD =====

    /// Recreate images, framebuffers and sync objects
    ///
    /// Returns false (and stays marked for rebuild) while the surface is
    /// zero-sized.
    fn rebuild(&mut self) -> Result<bool> {
        self.device.wait_idle()?;

        let capabilities = self.surface.capabilities()?;
        let extent = capabilities.choose_extent(self.requested_extent);
        if extent.is_empty() {
            self.needs_rebuild = true;
            return Ok(false);
        }
        let image_count = capabilities.clamp_image_count(self.config.swapchain_image_count);
        self.present_mode = choose_present_mode(&self.surface.supported_present_modes()?, self.config.vsync);

        // Release the previous build before the surface retires its swapchain
        self.images = SwapchainImages::default();
        self.last_presented = None;
        let presentable = self.surface.create_swapchain(&SwapchainCreateInfo {
            image_count,
            format: self.color_format,
            extent,
            present_mode: self.present_mode,
            queue_families: self.device.queues().presentation_families(),
        })?;

        let mut images = SwapchainImages {
            presentable,
            ..Default::default()
        };
        if let Some(depth_format) = self.depth_format {
            images.depth = Some(self.device.create_attachment_image(&AttachmentImageDesc {
                extent,
                format: depth_format,
                samples: SampleCount::S1,
                usage: ImageUsage::DEPTH_STENCIL_ATTACHMENT | ImageUsage::SAMPLED,
            })?);
        }
        if self.samples.is_multisampled() {
            images.ms_color = Some(self.device.create_attachment_image(
                &AttachmentImageDesc::transient(extent, self.color_format, self.samples),
            )?);
            if let Some(depth_format) = self.depth_format {
                images.ms_depth = Some(self.device.create_attachment_image(
                    &AttachmentImageDesc::transient(extent, depth_format, self.samples),
                )?);
            }
        }

        for index in 0..images.presentable.len() {
            let attachments = self.framebuffer_attachments(&images, index)?;
            images.framebuffers.push(self.device.create_framebuffer(&FramebufferDesc {
                render_pass: &self.render_pass,
                attachments,
                width: extent.width,
                height: extent.height,
            })?);
            images.render_finished.push(self.device.create_semaphore()?);
            images.images_in_flight.push(None);
        }

        let frames_in_flight = self.config.frames_in_flight(image_count) as usize;
        if self.slots.len() != frames_in_flight {
            let mut slots = Vec::with_capacity(frames_in_flight);
            for _ in 0..frames_in_flight {
                slots.push(self.create_slot()?);
            }
            self.slots = slots;
            self.frame_index = 0;
        }

        engine_info!(
            LOG_SOURCE,
            "{} built: {} images {}x{} {:?} {:?}, {} frames in flight",
            if self.headless { "Headless swapchain" } else { "Swapchain" },
            images.presentable.len(),
            extent.width,
            extent.height,
            self.color_format,
            self.present_mode,
            frames_in_flight
        );

        self.images = images;
        self.extent = extent;
        self.needs_rebuild = false;
        Ok(true)
    }

    /// Attachments of framebuffer `index`, in render pass declaration order
    fn framebuffer_attachments(
        &self,
        images: &SwapchainImages,
        index: usize,
    ) -> Result<Vec<Arc<dyn AttachmentImage>>> {
        self.render_pass
            .desc()
            .attachments
            .iter()
            .map(|attachment| {
                let image = match (attachment.is_depth(), attachment.samples.is_multisampled()) {
                    (false, false) => Some(images.presentable[index].clone()),
                    (true, false) => images.depth.clone(),
                    (false, true) => images.ms_color.clone(),
                    (true, true) => images.ms_depth.clone(),
                };
                image.ok_or_else(|| {
                    Error::InvalidRenderPass(format!(
                        "no swapchain image for attachment {:?}/{:?}",
                        attachment.format, attachment.samples
                    ))
                })
            })
            .collect()
    }

    fn create_slot(&mut self) -> Result<FrameSlot> {
        Ok(FrameSlot {
            fence: self.device.create_fence(true)?,
            image_acquired: self.device.create_semaphore()?,
            command_buffer: self
                .command_pool
                .allocate(CommandBufferLevel::Primary, 1)?
                .pop()
                .ok_or_else(|| Error::InvalidResource("command pool returned no buffer".to_string()))?,
        })
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            engine_warn!(LOG_SOURCE, "wait_idle before destruction failed: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "swapchain_tests.rs"]
mod tests;
