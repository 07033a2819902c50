/// RenderPass - Vulkan render pass created with `vkCreateRenderPass2`
///
/// The second-generation entry point is used so a multisampled depth
/// attachment can be resolved through `VkSubpassDescriptionDepthStencilResolve`.

use ash::vk;
use std::any::Any;
use std::sync::Arc;
use aurora_3d_engine::aurora3d::{Error, Result};
use aurora_3d_engine::aurora3d::graphics_device::{
    RenderPass, RenderPassDesc, SubpassDesc,
};

use crate::vulkan_context::{vk_error, GpuContext};
use crate::vulkan_format::{
    access_to_vk, attachment_aspect_mask, format_to_vk, image_layout_to_vk, load_op_to_vk,
    pipeline_stage_to_vk, sample_count_to_vk, store_op_to_vk, subpass_ref_to_vk,
};

pub struct VulkanRenderPass {
    pub(crate) render_pass: vk::RenderPass,
    desc: RenderPassDesc,
    ctx: Arc<GpuContext>,
}

/// Attachment references of one subpass, kept alive while the create info
/// structures point into them
struct SubpassReferences {
    colors: Vec<vk::AttachmentReference2<'static>>,
    resolves: Vec<vk::AttachmentReference2<'static>>,
    depth: Option<vk::AttachmentReference2<'static>>,
    depth_resolve: Option<vk::AttachmentReference2<'static>>,
}

impl VulkanRenderPass {
    pub(crate) fn new(ctx: &Arc<GpuContext>, desc: &RenderPassDesc) -> Result<Self> {
        let attachments: Vec<vk::AttachmentDescription2> = desc
            .attachments
            .iter()
            .map(|a| {
                vk::AttachmentDescription2::default()
                    .format(format_to_vk(a.format))
                    .samples(sample_count_to_vk(a.samples))
                    .load_op(load_op_to_vk(a.load_op))
                    .store_op(store_op_to_vk(a.store_op))
                    .stencil_load_op(load_op_to_vk(a.stencil_load_op))
                    .stencil_store_op(store_op_to_vk(a.stencil_store_op))
                    .initial_layout(image_layout_to_vk(a.initial_layout))
                    .final_layout(image_layout_to_vk(a.final_layout))
            })
            .collect();

        let references: Vec<SubpassReferences> = desc
            .subpasses
            .iter()
            .map(|subpass| subpass_references(desc, subpass))
            .collect::<Result<_>>()?;

        let mut depth_resolves: Vec<vk::SubpassDescriptionDepthStencilResolve> = references
            .iter()
            .map(|refs| {
                let resolve = vk::SubpassDescriptionDepthStencilResolve::default()
                    .depth_resolve_mode(vk::ResolveModeFlags::SAMPLE_ZERO)
                    .stencil_resolve_mode(vk::ResolveModeFlags::SAMPLE_ZERO);
                match refs.depth_resolve.as_ref() {
                    Some(reference) => resolve.depth_stencil_resolve_attachment(reference),
                    None => resolve,
                }
            })
            .collect();

        let subpasses: Vec<vk::SubpassDescription2> = references
            .iter()
            .zip(depth_resolves.iter_mut())
            .map(|(refs, depth_resolve)| {
                let mut subpass = vk::SubpassDescription2::default()
                    .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                    .color_attachments(&refs.colors);
                if !refs.resolves.is_empty() {
                    subpass = subpass.resolve_attachments(&refs.resolves);
                }
                if let Some(depth) = refs.depth.as_ref() {
                    subpass = subpass.depth_stencil_attachment(depth);
                }
                if refs.depth_resolve.is_some() {
                    subpass = subpass.push_next(depth_resolve);
                }
                subpass
            })
            .collect();

        let dependencies: Vec<vk::SubpassDependency2> = desc
            .dependencies
            .iter()
            .map(|d| {
                let flags = if d.by_region {
                    vk::DependencyFlags::BY_REGION
                } else {
                    vk::DependencyFlags::empty()
                };
                vk::SubpassDependency2::default()
                    .src_subpass(subpass_ref_to_vk(d.src_subpass))
                    .dst_subpass(subpass_ref_to_vk(d.dst_subpass))
                    .src_stage_mask(pipeline_stage_to_vk(d.src_stage))
                    .dst_stage_mask(pipeline_stage_to_vk(d.dst_stage))
                    .src_access_mask(access_to_vk(d.src_access))
                    .dst_access_mask(access_to_vk(d.dst_access))
                    .dependency_flags(flags)
            })
            .collect();

        let create_info = vk::RenderPassCreateInfo2::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = unsafe {
            ctx.device.create_render_pass2(&create_info, None)
                .map_err(|e| vk_error("Failed to create render pass", e))?
        };

        Ok(Self {
            render_pass,
            desc: desc.clone(),
            ctx: ctx.clone(),
        })
    }
}

fn attachment_reference(
    desc: &RenderPassDesc,
    index: u32,
    layout: vk::ImageLayout,
) -> Result<vk::AttachmentReference2<'static>> {
    let attachment = desc.attachments.get(index as usize).ok_or_else(|| {
        Error::InvalidRenderPass(format!(
            "attachment {} out of range ({} attachments)",
            index,
            desc.attachments.len()
        ))
    })?;
    Ok(vk::AttachmentReference2::default()
        .attachment(index)
        .layout(layout)
        .aspect_mask(attachment_aspect_mask(attachment.format)))
}

fn subpass_references(desc: &RenderPassDesc, subpass: &SubpassDesc) -> Result<SubpassReferences> {
    let color_layout = vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL;
    let depth_layout = vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL;

    let colors = subpass
        .color_attachments
        .iter()
        .map(|&index| attachment_reference(desc, index, color_layout))
        .collect::<Result<Vec<_>>>()?;

    // Resolve references pair with color references by position
    let mut resolves = subpass
        .color_resolve_attachments
        .iter()
        .map(|&index| attachment_reference(desc, index, color_layout))
        .collect::<Result<Vec<_>>>()?;
    if !resolves.is_empty() {
        resolves.resize(
            colors.len(),
            vk::AttachmentReference2::default().attachment(vk::ATTACHMENT_UNUSED),
        );
    }

    let depth = subpass
        .depth_attachment
        .map(|index| attachment_reference(desc, index, depth_layout))
        .transpose()?;
    let depth_resolve = subpass
        .depth_resolve_attachment
        .map(|index| attachment_reference(desc, index, depth_layout))
        .transpose()?;

    Ok(SubpassReferences { colors, resolves, depth, depth_resolve })
}

impl RenderPass for VulkanRenderPass {
    fn desc(&self) -> &RenderPassDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanRenderPass {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_render_pass(self.render_pass, None);
        }
    }
}

/// Downcast an engine render pass to its Vulkan handle
pub(crate) fn vk_render_pass(render_pass: &dyn RenderPass) -> Result<vk::RenderPass> {
    render_pass
        .as_any()
        .downcast_ref::<VulkanRenderPass>()
        .map(|rp| rp.render_pass)
        .ok_or_else(|| Error::InvalidResource("render pass was not created by the Vulkan device".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurora_3d_engine::aurora3d::graphics_device::{SampleCount, TextureFormat};
    use aurora_3d_engine::aurora3d::render_pass::main_pass;

    #[test]
    fn test_multisampled_references() {
        let desc = main_pass(TextureFormat::B8G8R8A8_UNORM, TextureFormat::D24_UNORM_S8_UINT, SampleCount::S4)
            .build()
            .unwrap();
        let refs = subpass_references(&desc, &desc.subpasses[0]).unwrap();

        assert_eq!(refs.colors.len(), 1);
        assert_eq!(refs.resolves.len(), 1);
        assert_eq!(refs.resolves[0].attachment, 2);
        let depth = refs.depth.unwrap();
        assert_eq!(depth.attachment, 1);
        assert_eq!(depth.aspect_mask, vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL);
        assert_eq!(refs.depth_resolve.unwrap().attachment, 3);
    }

    #[test]
    fn test_single_sample_references() {
        let desc = main_pass(TextureFormat::B8G8R8A8_UNORM, TextureFormat::D32_FLOAT, SampleCount::S1)
            .build()
            .unwrap();
        let refs = subpass_references(&desc, &desc.subpasses[0]).unwrap();

        assert!(refs.resolves.is_empty());
        assert!(refs.depth_resolve.is_none());
        assert_eq!(refs.depth.unwrap().layout, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
    }

    #[test]
    fn test_out_of_range_reference() {
        let mut desc = main_pass(TextureFormat::B8G8R8A8_UNORM, TextureFormat::D32_FLOAT, SampleCount::S1)
            .build()
            .unwrap();
        desc.subpasses[0].color_attachments.push(9);
        assert!(matches!(
            subpass_references(&desc, &desc.subpasses[0]),
            Err(Error::InvalidRenderPass(_))
        ));
    }
}
