/// RenderPassBuilder - declarative construction of render pass descriptions
///
/// Attachments, subpasses and dependencies keep declaration order. Within a
/// subpass, depth-format attachments become the depth reference and every
/// other attachment a color reference; resolve indices pair positionally
/// with the color references (plus at most one depth resolve).

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::{
    AttachmentDesc, ClearValue, GraphicsDevice, ImageLayout, LoadOp, RenderPass,
    RenderPassDesc, SampleCount, StoreOp, SubpassDependency, SubpassDesc, SubpassRef,
    TextureFormat,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclaredKind {
    Color,
    Depth,
}

/// Builder for `RenderPassDesc`
#[derive(Debug, Clone, Default)]
pub struct RenderPassBuilder {
    attachments: Vec<AttachmentDesc>,
    kinds: Vec<DeclaredKind>,
    subpasses: Vec<(Vec<u32>, Vec<u32>)>,
    dependencies: Vec<SubpassDependency>,
}

impl RenderPassBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a color attachment
    #[allow(clippy::too_many_arguments)]
    pub fn add_color_attachment(
        mut self,
        format: TextureFormat,
        samples: SampleCount,
        clear_color: [f32; 4],
        final_layout: ImageLayout,
        load_op: LoadOp,
        store_op: StoreOp,
        is_resolve: bool,
    ) -> Self {
        self.push(
            DeclaredKind::Color,
            format,
            samples,
            ClearValue::Color(clear_color),
            final_layout,
            load_op,
            store_op,
            is_resolve,
        );
        self
    }

    /// Declare a depth attachment (stencil ops mirror the depth ops)
    #[allow(clippy::too_many_arguments)]
    pub fn add_depth_attachment(
        mut self,
        format: TextureFormat,
        samples: SampleCount,
        clear_depth: f32,
        clear_stencil: u32,
        final_layout: ImageLayout,
        load_op: LoadOp,
        store_op: StoreOp,
        is_resolve: bool,
    ) -> Self {
        self.push(
            DeclaredKind::Depth,
            format,
            samples,
            ClearValue::DepthStencil { depth: clear_depth, stencil: clear_stencil },
            final_layout,
            load_op,
            store_op,
            is_resolve,
        );
        self
    }

    /// Declare a subpass using `attachments`, resolving into `resolve_attachments`
    pub fn add_subpass(mut self, attachments: &[u32], resolve_attachments: &[u32]) -> Self {
        self.subpasses.push((attachments.to_vec(), resolve_attachments.to_vec()));
        self
    }

    /// Append subpass dependencies
    pub fn add_subpass_dependencies(mut self, dependencies: &[SubpassDependency]) -> Self {
        self.dependencies.extend_from_slice(dependencies);
        self
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        kind: DeclaredKind,
        format: TextureFormat,
        samples: SampleCount,
        clear_value: ClearValue,
        final_layout: ImageLayout,
        load_op: LoadOp,
        store_op: StoreOp,
        is_resolve: bool,
    ) {
        self.kinds.push(kind);
        self.attachments.push(AttachmentDesc {
            format,
            samples,
            load_op,
            store_op,
            stencil_load_op: load_op,
            stencil_store_op: store_op,
            initial_layout: ImageLayout::Undefined,
            final_layout,
            clear_value,
            is_resolve,
        });
    }

    /// Validate and produce the description
    pub fn build(self) -> Result<RenderPassDesc> {
        if self.subpasses.is_empty() {
            return Err(Error::InvalidRenderPass("render pass has no subpass".to_string()));
        }

        for (index, (attachment, kind)) in self.attachments.iter().zip(&self.kinds).enumerate() {
            let declared_depth = *kind == DeclaredKind::Depth;
            if attachment.format.is_depth() != declared_depth {
                return Err(Error::InvalidRenderPass(format!(
                    "attachment {} declared as {:?} with format {:?}",
                    index, kind, attachment.format
                )));
            }
            if attachment.is_resolve && attachment.samples.is_multisampled() {
                return Err(Error::InvalidRenderPass(format!(
                    "resolve attachment {} must have one sample",
                    index
                )));
            }
        }

        let subpasses = self
            .subpasses
            .iter()
            .enumerate()
            .map(|(index, (used, resolves))| self.build_subpass(index, used, resolves))
            .collect::<Result<Vec<_>>>()?;

        let subpass_count = subpasses.len() as u32;
        for dependency in &self.dependencies {
            for subpass in [dependency.src_subpass, dependency.dst_subpass] {
                if let SubpassRef::Index(index) = subpass {
                    if index >= subpass_count {
                        return Err(Error::InvalidRenderPass(format!(
                            "dependency references subpass {} ({} subpasses)",
                            index, subpass_count
                        )));
                    }
                }
            }
        }

        Ok(RenderPassDesc {
            attachments: self.attachments,
            subpasses,
            dependencies: self.dependencies,
        })
    }

    /// Validate, then create the GPU object
    pub fn create(self, device: &dyn GraphicsDevice) -> Result<Arc<dyn RenderPass>> {
        let desc = self.build()?;
        device.create_render_pass(&desc)
    }

    fn attachment(&self, subpass: usize, index: u32) -> Result<&AttachmentDesc> {
        self.attachments.get(index as usize).ok_or_else(|| {
            Error::InvalidRenderPass(format!(
                "subpass {} references attachment {} ({} attachments)",
                subpass,
                index,
                self.attachments.len()
            ))
        })
    }

    fn build_subpass(&self, subpass: usize, used: &[u32], resolves: &[u32]) -> Result<SubpassDesc> {
        let mut desc = SubpassDesc::default();

        for &index in used {
            let attachment = self.attachment(subpass, index)?;
            if attachment.is_resolve {
                return Err(Error::InvalidRenderPass(format!(
                    "subpass {} uses resolve attachment {} as render target",
                    subpass, index
                )));
            }
            if attachment.is_depth() {
                if desc.depth_attachment.replace(index).is_some() {
                    return Err(Error::InvalidRenderPass(format!(
                        "subpass {} has more than one depth attachment",
                        subpass
                    )));
                }
            } else {
                desc.color_attachments.push(index);
            }
        }

        for &index in resolves {
            let attachment = self.attachment(subpass, index)?;
            if !attachment.is_resolve {
                return Err(Error::InvalidRenderPass(format!(
                    "subpass {} resolves into attachment {} not declared as resolve",
                    subpass, index
                )));
            }
            if attachment.is_depth() {
                if desc.depth_resolve_attachment.replace(index).is_some() {
                    return Err(Error::InvalidRenderPass(format!(
                        "subpass {} has more than one depth resolve",
                        subpass
                    )));
                }
            } else {
                desc.color_resolve_attachments.push(index);
            }
        }

        // Pairing: each resolve target has a multisampled source of the same format
        if !desc.color_resolve_attachments.is_empty()
            && desc.color_resolve_attachments.len() != desc.color_attachments.len()
        {
            return Err(Error::InvalidRenderPass(format!(
                "subpass {} has {} color attachments but {} color resolves",
                subpass,
                desc.color_attachments.len(),
                desc.color_resolve_attachments.len()
            )));
        }
        let color_pairs = desc.color_attachments.iter().zip(&desc.color_resolve_attachments);
        let depth_pair = match (desc.depth_attachment, desc.depth_resolve_attachment) {
            (Some(source), Some(target)) => Some((source, target)),
            (None, Some(target)) => {
                return Err(Error::InvalidRenderPass(format!(
                    "subpass {} resolves depth into {} without a depth attachment",
                    subpass, target
                )));
            }
            _ => None,
        };
        for (source, target) in color_pairs.map(|(s, t)| (*s, *t)).chain(depth_pair) {
            let source_desc = &self.attachments[source as usize];
            let target_desc = &self.attachments[target as usize];
            if !source_desc.samples.is_multisampled() {
                return Err(Error::InvalidRenderPass(format!(
                    "subpass {} resolves single-sampled attachment {}",
                    subpass, source
                )));
            }
            if source_desc.format != target_desc.format {
                return Err(Error::InvalidRenderPass(format!(
                    "subpass {} resolves {:?} into {:?}",
                    subpass, source_desc.format, target_desc.format
                )));
            }
        }

        Ok(desc)
    }
}

#[cfg(test)]
#[path = "render_pass_builder_tests.rs"]
mod tests;
