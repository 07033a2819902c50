/// CommandPool and CommandBuffer - Vulkan implementations of the recording traits

use ash::vk;
use std::any::Any;
use std::ffi::CString;
use std::sync::Arc;
use aurora_3d_engine::aurora3d::{Error, Result};
use aurora_3d_engine::aurora3d::graphics_device::{
    CommandBuffer, CommandBufferLevel, CommandPool, Framebuffer, InheritanceInfo, Rect2D,
    RenderPass, SubpassContents, Viewport,
};

use crate::vulkan_context::{vk_error, GpuContext};
use crate::vulkan_format::{clear_value_to_vk, rect_to_vk};
use crate::vulkan_frame_buffer::vk_framebuffer;
use crate::vulkan_render_pass::vk_render_pass;

/// Resettable command pool on one queue family
pub struct VulkanCommandPool {
    pool: vk::CommandPool,
    queue_family: u32,
    ctx: Arc<GpuContext>,
}

impl VulkanCommandPool {
    pub(crate) fn new(ctx: &Arc<GpuContext>, queue_family: u32) -> Result<Self> {
        let create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let pool = unsafe {
            ctx.device.create_command_pool(&create_info, None)
                .map_err(|e| vk_error("Failed to create command pool", e))?
        };
        Ok(Self { pool, queue_family, ctx: ctx.clone() })
    }
}

impl CommandPool for VulkanCommandPool {
    fn allocate(&mut self, level: CommandBufferLevel, count: u32) -> Result<Vec<Box<dyn CommandBuffer>>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let vk_level = match level {
            CommandBufferLevel::Primary => vk::CommandBufferLevel::PRIMARY,
            CommandBufferLevel::Secondary => vk::CommandBufferLevel::SECONDARY,
        };
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.pool)
            .level(vk_level)
            .command_buffer_count(count);

        let buffers = unsafe {
            self.ctx.device.allocate_command_buffers(&allocate_info)
                .map_err(|e| vk_error("Failed to allocate command buffers", e))?
        };

        Ok(buffers
            .into_iter()
            .map(|buffer| {
                Box::new(VulkanCommandBuffer {
                    command_buffer: buffer,
                    level,
                    is_recording: false,
                    render_pass_contents: None,
                    ctx: self.ctx.clone(),
                }) as Box<dyn CommandBuffer>
            })
            .collect())
    }

    fn reset(&mut self) -> Result<()> {
        unsafe {
            self.ctx.device.reset_command_pool(self.pool, vk::CommandPoolResetFlags::empty())
                .map_err(|e| vk_error("Failed to reset command pool", e))
        }
    }

    fn queue_family(&self) -> u32 {
        self.queue_family
    }
}

impl Drop for VulkanCommandPool {
    fn drop(&mut self) {
        // Frees every buffer allocated from the pool
        unsafe {
            self.ctx.device.destroy_command_pool(self.pool, None);
        }
    }
}

/// Vulkan command buffer
///
/// Tracks the recording state so misuse is reported as an error instead of
/// reaching the driver.
pub struct VulkanCommandBuffer {
    pub(crate) command_buffer: vk::CommandBuffer,
    level: CommandBufferLevel,
    is_recording: bool,
    /// Set while inside a render pass (always `Inline` for secondary buffers)
    render_pass_contents: Option<SubpassContents>,
    ctx: Arc<GpuContext>,
}

impl VulkanCommandBuffer {
    fn ensure_recording(&self) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("Command buffer not recording".to_string()));
        }
        Ok(())
    }

    /// Draw commands need a render pass whose commands are recorded inline
    fn ensure_inline_pass(&self) -> Result<()> {
        self.ensure_recording()?;
        match self.render_pass_contents {
            Some(SubpassContents::Inline) => Ok(()),
            Some(SubpassContents::SecondaryCommandBuffers) => Err(Error::BackendError(
                "Render pass expects secondary command buffers, not inline commands".to_string(),
            )),
            None => Err(Error::BackendError("Not inside a render pass".to_string())),
        }
    }
}

impl CommandBuffer for VulkanCommandBuffer {
    fn level(&self) -> CommandBufferLevel {
        self.level
    }

    fn begin(&mut self) -> Result<()> {
        if self.level != CommandBufferLevel::Primary {
            return Err(Error::BackendError("begin() on a secondary command buffer".to_string()));
        }
        if self.is_recording {
            return Err(Error::BackendError("Command buffer already recording".to_string()));
        }

        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        unsafe {
            self.ctx.device.begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| vk_error("Failed to begin command buffer", e))?;
        }
        self.is_recording = true;
        self.render_pass_contents = None;
        Ok(())
    }

    fn begin_secondary(&mut self, inheritance: &InheritanceInfo) -> Result<()> {
        if self.level != CommandBufferLevel::Secondary {
            return Err(Error::BackendError("begin_secondary() on a primary command buffer".to_string()));
        }
        if self.is_recording {
            return Err(Error::BackendError("Command buffer already recording".to_string()));
        }

        let inheritance_info = vk::CommandBufferInheritanceInfo::default()
            .render_pass(vk_render_pass(inheritance.render_pass.as_ref())?)
            .subpass(inheritance.subpass)
            .framebuffer(vk_framebuffer(inheritance.framebuffer.as_ref())?);
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(
                vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT
                    | vk::CommandBufferUsageFlags::RENDER_PASS_CONTINUE,
            )
            .inheritance_info(&inheritance_info);

        unsafe {
            self.ctx.device.begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| vk_error("Failed to begin secondary command buffer", e))?;
        }
        self.is_recording = true;
        self.render_pass_contents = Some(SubpassContents::Inline);
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.ensure_recording()?;
        if self.level == CommandBufferLevel::Primary && self.render_pass_contents.is_some() {
            return Err(Error::BackendError("Render pass not ended before ending command buffer".to_string()));
        }

        unsafe {
            self.ctx.device.end_command_buffer(self.command_buffer)
                .map_err(|e| vk_error("Failed to end command buffer", e))?;
        }
        self.is_recording = false;
        self.render_pass_contents = None;
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        unsafe {
            self.ctx.device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| vk_error("Failed to reset command buffer", e))?;
        }
        self.is_recording = false;
        self.render_pass_contents = None;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn RenderPass>,
        framebuffer: &Arc<dyn Framebuffer>,
        area: Rect2D,
        contents: SubpassContents,
    ) -> Result<()> {
        self.ensure_recording()?;
        if self.level != CommandBufferLevel::Primary {
            return Err(Error::BackendError("Render passes begin in primary command buffers".to_string()));
        }
        if self.render_pass_contents.is_some() {
            return Err(Error::BackendError("Already inside a render pass".to_string()));
        }

        let clear_values: Vec<vk::ClearValue> = render_pass
            .desc()
            .clear_values()
            .iter()
            .map(clear_value_to_vk)
            .collect();

        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(vk_render_pass(render_pass.as_ref())?)
            .framebuffer(vk_framebuffer(framebuffer.as_ref())?)
            .render_area(rect_to_vk(area))
            .clear_values(&clear_values);

        let vk_contents = match contents {
            SubpassContents::Inline => vk::SubpassContents::INLINE,
            SubpassContents::SecondaryCommandBuffers => vk::SubpassContents::SECONDARY_COMMAND_BUFFERS,
        };

        unsafe {
            self.ctx.device.cmd_begin_render_pass(self.command_buffer, &begin_info, vk_contents);
        }
        self.render_pass_contents = Some(contents);
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.ensure_recording()?;
        if self.level != CommandBufferLevel::Primary || self.render_pass_contents.is_none() {
            return Err(Error::BackendError("Not inside a render pass".to_string()));
        }

        unsafe {
            self.ctx.device.cmd_end_render_pass(self.command_buffer);
        }
        self.render_pass_contents = None;
        Ok(())
    }

    fn execute_commands(&mut self, secondaries: &[&dyn CommandBuffer]) -> Result<()> {
        self.ensure_recording()?;
        if self.render_pass_contents != Some(SubpassContents::SecondaryCommandBuffers) {
            return Err(Error::BackendError(
                "execute_commands outside a render pass begun for secondary command buffers".to_string(),
            ));
        }

        let buffers = secondaries
            .iter()
            .map(|cmd| {
                cmd.as_any()
                    .downcast_ref::<VulkanCommandBuffer>()
                    .filter(|cmd| cmd.level == CommandBufferLevel::Secondary)
                    .map(|cmd| cmd.command_buffer)
                    .ok_or_else(|| Error::InvalidResource("expected a Vulkan secondary command buffer".to_string()))
            })
            .collect::<Result<Vec<vk::CommandBuffer>>>()?;

        if !buffers.is_empty() {
            unsafe {
                self.ctx.device.cmd_execute_commands(self.command_buffer, &buffers);
            }
        }
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.ensure_recording()?;

        let vk_viewport = vk::Viewport::default()
            .x(viewport.x)
            .y(viewport.y)
            .width(viewport.width)
            .height(viewport.height)
            .min_depth(viewport.min_depth)
            .max_depth(viewport.max_depth);

        unsafe {
            self.ctx.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.ensure_recording()?;

        unsafe {
            self.ctx.device.cmd_set_scissor(self.command_buffer, 0, &[rect_to_vk(scissor)]);
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.ensure_inline_pass()?;

        unsafe {
            self.ctx.device.cmd_draw(
                self.command_buffer,
                vertex_count,
                1, // instance_count
                first_vertex,
                0, // first_instance
            );
        }
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.ensure_inline_pass()?;

        unsafe {
            self.ctx.device.cmd_draw_indexed(
                self.command_buffer,
                index_count,
                1, // instance_count
                first_index,
                vertex_offset,
                0, // first_instance
            );
        }
        Ok(())
    }

    fn begin_label(&mut self, name: &str, color: [f32; 4]) {
        let Some(debug_utils) = self.ctx.debug_utils_device.as_ref() else {
            return;
        };
        if !self.is_recording {
            return;
        }
        let Ok(name) = CString::new(name) else {
            return;
        };

        let label = vk::DebugUtilsLabelEXT::default()
            .label_name(&name)
            .color(color);
        unsafe {
            debug_utils.cmd_begin_debug_utils_label(self.command_buffer, &label);
        }
    }

    fn end_label(&mut self) {
        let Some(debug_utils) = self.ctx.debug_utils_device.as_ref() else {
            return;
        };
        if !self.is_recording {
            return;
        }
        unsafe {
            debug_utils.cmd_end_debug_utils_label(self.command_buffer);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Downcast an engine command buffer to its Vulkan handle
pub(crate) fn vk_command_buffer(cmd: &dyn CommandBuffer) -> Result<vk::CommandBuffer> {
    cmd.as_any()
        .downcast_ref::<VulkanCommandBuffer>()
        .map(|cmd| cmd.command_buffer)
        .ok_or_else(|| Error::InvalidResource("command buffer was not created by the Vulkan device".to_string()))
}
