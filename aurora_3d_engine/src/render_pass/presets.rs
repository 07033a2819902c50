/// Render pass presets used by the swapchain and the master renderer

use crate::graphics_device::{
    Access, ImageLayout, LoadOp, PipelineStage, SampleCount, StoreOp, SubpassDependency,
    SubpassRef, TextureFormat,
};
use crate::render_pass::RenderPassBuilder;

/// Clear color of presentable and offscreen color targets
pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 1.0];

fn external_to_first(
    src_stage: PipelineStage,
    dst_stage: PipelineStage,
    src_access: Access,
    dst_access: Access,
    by_region: bool,
) -> SubpassDependency {
    SubpassDependency {
        src_subpass: SubpassRef::External,
        dst_subpass: SubpassRef::Index(0),
        src_stage,
        dst_stage,
        src_access,
        dst_access,
        by_region,
    }
}

fn first_to_external(
    src_stage: PipelineStage,
    dst_stage: PipelineStage,
    src_access: Access,
    dst_access: Access,
) -> SubpassDependency {
    SubpassDependency {
        src_subpass: SubpassRef::Index(0),
        dst_subpass: SubpassRef::External,
        src_stage,
        dst_stage,
        src_access,
        dst_access,
        by_region: true,
    }
}

/// Presentable color + depth, one subpass
pub fn single_sample(color_format: TextureFormat, depth_format: TextureFormat) -> RenderPassBuilder {
    single_sample_ending_in(color_format, depth_format, ImageLayout::PresentSrc)
}

fn single_sample_ending_in(
    color_format: TextureFormat,
    depth_format: TextureFormat,
    color_final_layout: ImageLayout,
) -> RenderPassBuilder {
    let color_rw = Access::COLOR_ATTACHMENT_READ | Access::COLOR_ATTACHMENT_WRITE;
    let depth_rw = Access::DEPTH_STENCIL_ATTACHMENT_READ | Access::DEPTH_STENCIL_ATTACHMENT_WRITE;

    RenderPassBuilder::new()
        .add_color_attachment(
            color_format,
            SampleCount::S1,
            DEFAULT_CLEAR_COLOR,
            color_final_layout,
            LoadOp::Clear,
            StoreOp::Store,
            false,
        )
        .add_depth_attachment(
            depth_format,
            SampleCount::S1,
            1.0,
            0,
            ImageLayout::DepthStencilAttachment,
            LoadOp::Clear,
            StoreOp::Store,
            false,
        )
        .add_subpass(&[0, 1], &[])
        .add_subpass_dependencies(&[
            external_to_first(
                PipelineStage::BOTTOM_OF_PIPE,
                PipelineStage::COLOR_ATTACHMENT_OUTPUT,
                Access::empty(),
                color_rw,
                false,
            ),
            external_to_first(
                PipelineStage::BOTTOM_OF_PIPE,
                PipelineStage::EARLY_FRAGMENT_TESTS,
                Access::empty(),
                depth_rw,
                false,
            ),
        ])
}

/// Multisampled color + depth resolved into presentable color + depth
///
/// Attachments: 0 MS color, 1 MS depth, 2 resolve color, 3 resolve depth.
pub fn multisample_with_resolve(
    color_format: TextureFormat,
    depth_format: TextureFormat,
    samples: SampleCount,
) -> RenderPassBuilder {
    multisample_ending_in(color_format, depth_format, samples, ImageLayout::PresentSrc)
}

fn multisample_ending_in(
    color_format: TextureFormat,
    depth_format: TextureFormat,
    samples: SampleCount,
    resolve_final_layout: ImageLayout,
) -> RenderPassBuilder {
    let color_rw = Access::COLOR_ATTACHMENT_READ | Access::COLOR_ATTACHMENT_WRITE;
    let depth_rw = Access::DEPTH_STENCIL_ATTACHMENT_READ | Access::DEPTH_STENCIL_ATTACHMENT_WRITE;

    RenderPassBuilder::new()
        .add_color_attachment(
            color_format,
            samples,
            DEFAULT_CLEAR_COLOR,
            ImageLayout::ColorAttachment,
            LoadOp::Clear,
            StoreOp::DontCare,
            false,
        )
        .add_depth_attachment(
            depth_format,
            samples,
            1.0,
            0,
            ImageLayout::DepthStencilAttachment,
            LoadOp::Clear,
            StoreOp::DontCare,
            false,
        )
        .add_color_attachment(
            color_format,
            SampleCount::S1,
            DEFAULT_CLEAR_COLOR,
            resolve_final_layout,
            LoadOp::Clear,
            StoreOp::Store,
            true,
        )
        .add_depth_attachment(
            depth_format,
            SampleCount::S1,
            1.0,
            0,
            ImageLayout::DepthStencilAttachment,
            LoadOp::Clear,
            StoreOp::DontCare,
            true,
        )
        .add_subpass(&[0, 1], &[2, 3])
        .add_subpass_dependencies(&[
            external_to_first(
                PipelineStage::COLOR_ATTACHMENT_OUTPUT,
                PipelineStage::COLOR_ATTACHMENT_OUTPUT,
                color_rw,
                color_rw,
                false,
            ),
            external_to_first(
                PipelineStage::EARLY_FRAGMENT_TESTS,
                PipelineStage::EARLY_FRAGMENT_TESTS,
                depth_rw,
                depth_rw,
                false,
            ),
        ])
}

/// Main pass matching `samples`
pub fn main_pass(
    color_format: TextureFormat,
    depth_format: TextureFormat,
    samples: SampleCount,
) -> RenderPassBuilder {
    if samples.is_multisampled() {
        multisample_with_resolve(color_format, depth_format, samples)
    } else {
        single_sample(color_format, depth_format)
    }
}

/// Main pass for a headless swapchain
///
/// Same attachments as `main_pass`, but the single-sampled color ends
/// shader-readable instead of presentable so the frame can be sampled or
/// copied out.
pub fn headless_main_pass(
    color_format: TextureFormat,
    depth_format: TextureFormat,
    samples: SampleCount,
) -> RenderPassBuilder {
    let builder = if samples.is_multisampled() {
        multisample_ending_in(color_format, depth_format, samples, ImageLayout::ShaderReadOnly)
    } else {
        single_sample_ending_in(color_format, depth_format, ImageLayout::ShaderReadOnly)
    };
    builder.add_subpass_dependencies(&[first_to_external(
        PipelineStage::COLOR_ATTACHMENT_OUTPUT,
        PipelineStage::FRAGMENT_SHADER,
        Access::COLOR_ATTACHMENT_WRITE,
        Access::SHADER_READ,
    )])
}

fn sampled_depth_dependencies() -> [SubpassDependency; 2] {
    [
        external_to_first(
            PipelineStage::FRAGMENT_SHADER,
            PipelineStage::EARLY_FRAGMENT_TESTS,
            Access::SHADER_READ,
            Access::DEPTH_STENCIL_ATTACHMENT_WRITE,
            true,
        ),
        first_to_external(
            PipelineStage::LATE_FRAGMENT_TESTS,
            PipelineStage::FRAGMENT_SHADER,
            Access::DEPTH_STENCIL_ATTACHMENT_WRITE,
            Access::SHADER_READ,
        ),
    ]
}

/// Depth-only pass whose result is sampled afterwards (shadow maps)
pub fn depth_only(depth_format: TextureFormat) -> RenderPassBuilder {
    RenderPassBuilder::new()
        .add_depth_attachment(
            depth_format,
            SampleCount::S1,
            1.0,
            0,
            ImageLayout::DepthStencilReadOnly,
            LoadOp::Clear,
            StoreOp::Store,
            false,
        )
        .add_subpass(&[0], &[])
        .add_subpass_dependencies(&sampled_depth_dependencies())
}

/// Offscreen pass with sampled color targets and an optional sampled depth
///
/// The depth attachment, when present, comes first.
pub fn offscreen(color_formats: &[TextureFormat], depth_format: Option<TextureFormat>) -> RenderPassBuilder {
    let mut builder = RenderPassBuilder::new();
    let mut dependencies = Vec::new();

    if let Some(depth_format) = depth_format {
        builder = builder.add_depth_attachment(
            depth_format,
            SampleCount::S1,
            1.0,
            0,
            ImageLayout::DepthStencilReadOnly,
            LoadOp::Clear,
            StoreOp::Store,
            false,
        );
        dependencies.extend_from_slice(&sampled_depth_dependencies());
    }

    for format in color_formats {
        builder = builder.add_color_attachment(
            *format,
            SampleCount::S1,
            DEFAULT_CLEAR_COLOR,
            ImageLayout::ShaderReadOnly,
            LoadOp::Clear,
            StoreOp::Store,
            false,
        );
        dependencies.push(external_to_first(
            PipelineStage::FRAGMENT_SHADER,
            PipelineStage::COLOR_ATTACHMENT_OUTPUT,
            Access::SHADER_READ,
            Access::COLOR_ATTACHMENT_WRITE,
            true,
        ));
        dependencies.push(first_to_external(
            PipelineStage::COLOR_ATTACHMENT_OUTPUT,
            PipelineStage::FRAGMENT_SHADER,
            Access::COLOR_ATTACHMENT_WRITE,
            Access::SHADER_READ,
        ));
    }

    let count = color_formats.len() as u32 + u32::from(depth_format.is_some());
    let indices: Vec<u32> = (0..count).collect();
    builder
        .add_subpass(&indices, &[])
        .add_subpass_dependencies(&dependencies)
}
