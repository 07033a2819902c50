/// RenderPass trait and the description it is created from

use std::any::Any;
use bitflags::bitflags;
use crate::graphics_device::{
    ClearValue, ImageLayout, LoadOp, SampleCount, StoreOp, TextureFormat,
};

/// Render pass trait
///
/// Created via `GraphicsDevice::create_render_pass()` from a `RenderPassDesc`,
/// usually produced by `RenderPassBuilder`.
pub trait RenderPass: Send + Sync {
    /// Description the pass was created from
    fn desc(&self) -> &RenderPassDesc;

    /// Backend downcast
    fn as_any(&self) -> &dyn Any;
}

bitflags! {
    /// Pipeline stages used by subpass dependencies and submit waits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PipelineStage: u32 {
        const TOP_OF_PIPE = 1 << 0;
        const FRAGMENT_SHADER = 1 << 1;
        const EARLY_FRAGMENT_TESTS = 1 << 2;
        const LATE_FRAGMENT_TESTS = 1 << 3;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 4;
        const BOTTOM_OF_PIPE = 1 << 5;
    }
}

bitflags! {
    /// Memory access kinds used by subpass dependencies
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Access: u32 {
        const SHADER_READ = 1 << 0;
        const COLOR_ATTACHMENT_READ = 1 << 1;
        const COLOR_ATTACHMENT_WRITE = 1 << 2;
        const DEPTH_STENCIL_ATTACHMENT_READ = 1 << 3;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 1 << 4;
        const MEMORY_READ = 1 << 5;
    }
}

/// Subpass reference in a dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubpassRef {
    /// Outside the render pass instance
    External,
    /// Subpass at this index
    Index(u32),
}

/// Execution and memory dependency between two subpasses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubpassDependency {
    pub src_subpass: SubpassRef,
    pub dst_subpass: SubpassRef,
    pub src_stage: PipelineStage,
    pub dst_stage: PipelineStage,
    pub src_access: Access,
    pub dst_access: Access,
    /// Framebuffer-local dependency
    pub by_region: bool,
}

/// Descriptor for a single attachment in a render pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentDesc {
    /// Pixel format
    pub format: TextureFormat,
    /// Sample count (S1 = no MSAA)
    pub samples: SampleCount,
    /// Load operation (what to do with existing content)
    pub load_op: LoadOp,
    /// Store operation (what to do with rendered content)
    pub store_op: StoreOp,
    /// Stencil load operation
    pub stencil_load_op: LoadOp,
    /// Stencil store operation
    pub stencil_store_op: StoreOp,
    /// Initial layout (how the attachment starts)
    pub initial_layout: ImageLayout,
    /// Final layout (how the attachment ends)
    pub final_layout: ImageLayout,
    /// Value used when `load_op` is `Clear`
    pub clear_value: ClearValue,
    /// Target of a multisample resolve
    pub is_resolve: bool,
}

impl AttachmentDesc {
    pub fn is_depth(&self) -> bool {
        self.format.is_depth()
    }
}

/// Attachment references of one subpass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubpassDesc {
    /// Color attachment indices, in reference order
    pub color_attachments: Vec<u32>,
    /// Depth attachment index
    pub depth_attachment: Option<u32>,
    /// Resolve targets for the color attachments, paired by position
    pub color_resolve_attachments: Vec<u32>,
    /// Resolve target for the depth attachment
    pub depth_resolve_attachment: Option<u32>,
}

/// Descriptor for creating a render pass
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPassDesc {
    /// Attachments in declaration order
    pub attachments: Vec<AttachmentDesc>,
    /// Subpasses in declaration order
    pub subpasses: Vec<SubpassDesc>,
    /// Subpass dependencies in declaration order
    pub dependencies: Vec<SubpassDependency>,
}

impl RenderPassDesc {
    /// One clear value per attachment, positional
    pub fn clear_values(&self) -> Vec<ClearValue> {
        self.attachments.iter().map(|a| a.clear_value).collect()
    }

    /// Formats of every color attachment
    pub fn color_formats(&self) -> Vec<TextureFormat> {
        self.attachments
            .iter()
            .filter(|a| !a.is_depth())
            .map(|a| a.format)
            .collect()
    }

    /// Formats of the color attachments that are not resolve targets
    pub fn render_color_formats(&self) -> Vec<TextureFormat> {
        self.attachments
            .iter()
            .filter(|a| !a.is_depth() && !a.is_resolve)
            .map(|a| a.format)
            .collect()
    }

    /// Format of the first depth attachment
    pub fn depth_format(&self) -> Option<TextureFormat> {
        self.attachments.iter().find(|a| a.is_depth()).map(|a| a.format)
    }

    /// Highest sample count among the attachments
    pub fn max_samples(&self) -> SampleCount {
        self.attachments
            .iter()
            .map(|a| a.samples)
            .max()
            .unwrap_or(SampleCount::S1)
    }

    /// Number of attachments a compatible framebuffer must bind
    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }
}
