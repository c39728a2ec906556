//! Render pass descriptions

use std::sync::Arc;
use crate::command::{AccessFlags, PipelineStageFlags};
use crate::error::{Error, Result};
use crate::resource::{Format, ImageLayout, ObjectId, SampleCount};

/// Attachment index meaning "no attachment"
pub const ATTACHMENT_UNUSED: u32 = u32::MAX;

/// Subpass index meaning "outside the render pass"
pub const SUBPASS_EXTERNAL: u32 = u32::MAX;

/// What happens to an attachment's content when a render pass begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentLoadOp {
    Load,
    Clear,
    DontCare,
}

/// What happens to an attachment's content when a render pass ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentStoreOp {
    Store,
    DontCare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentDescription {
    pub format: Format,
    pub samples: SampleCount,
    pub load_op: AttachmentLoadOp,
    pub store_op: AttachmentStoreOp,
    pub stencil_load_op: AttachmentLoadOp,
    pub stencil_store_op: AttachmentStoreOp,
    pub initial_layout: ImageLayout,
    pub final_layout: ImageLayout,
}

impl AttachmentDescription {
    /// Color attachment with the given ops and no stencil
    pub fn color(format: Format, load_op: AttachmentLoadOp, store_op: AttachmentStoreOp) -> Self {
        Self {
            format,
            samples: SampleCount::S1,
            load_op,
            store_op,
            stencil_load_op: AttachmentLoadOp::DontCare,
            stencil_store_op: AttachmentStoreOp::DontCare,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::ColorAttachmentOptimal,
        }
    }

    /// Depth/stencil attachment using the same ops for both aspects
    pub fn depth_stencil(format: Format, load_op: AttachmentLoadOp, store_op: AttachmentStoreOp) -> Self {
        Self {
            format,
            samples: SampleCount::S1,
            load_op,
            store_op,
            stencil_load_op: load_op,
            stencil_store_op: store_op,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::DepthStencilAttachmentOptimal,
        }
    }

    /// Whether beginning the render pass clears any aspect of this attachment
    pub fn requires_clear(&self) -> bool {
        let clears_main = (self.format.is_color() || self.format.has_depth())
            && self.load_op == AttachmentLoadOp::Clear;
        let clears_stencil = self.format.has_stencil() && self.stencil_load_op == AttachmentLoadOp::Clear;
        clears_main || clears_stencil
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentReference {
    pub attachment: u32,
    pub layout: ImageLayout,
}

impl AttachmentReference {
    pub fn new(attachment: u32, layout: ImageLayout) -> Self {
        Self { attachment, layout }
    }

    pub fn is_unused(&self) -> bool {
        self.attachment == ATTACHMENT_UNUSED
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubpassDescription {
    pub input_attachments: Vec<AttachmentReference>,
    pub color_attachments: Vec<AttachmentReference>,
    /// Empty, or one entry per color attachment
    pub resolve_attachments: Vec<AttachmentReference>,
    pub depth_stencil_attachment: Option<AttachmentReference>,
    pub preserve_attachments: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubpassDependency {
    pub src_subpass: u32,
    pub dst_subpass: u32,
    pub src_stage_mask: PipelineStageFlags,
    pub dst_stage_mask: PipelineStageFlags,
    pub src_access_mask: AccessFlags,
    pub dst_access_mask: AccessFlags,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderPassCreateInfo {
    pub attachments: Vec<AttachmentDescription>,
    pub subpasses: Vec<SubpassDescription>,
    pub dependencies: Vec<SubpassDependency>,
}

/// Immutable render pass
#[derive(Debug)]
pub struct RenderPass {
    id: ObjectId,
    info: RenderPassCreateInfo,
    /// Per subpass: color references in order, then the depth/stencil reference
    fbo_attachable: Vec<Vec<AttachmentReference>>,
    max_clear_attachment: Option<u32>,
}

impl RenderPass {
    /// Validate and register a render pass
    ///
    /// # Errors
    ///
    /// [`Error::InvalidResource`] for out-of-range references, color references to
    /// depth formats (and the reverse), mismatched resolve counts or invalid
    /// dependency indices.
    pub fn new(info: RenderPassCreateInfo) -> Result<Arc<Self>> {
        if info.subpasses.is_empty() {
            return Err(Error::InvalidResource("render pass has no subpass".to_string()));
        }

        let attachment_count = info.attachments.len() as u32;
        let check_reference = |subpass: usize, reference: &AttachmentReference| -> Result<()> {
            if !reference.is_unused() && reference.attachment >= attachment_count {
                return Err(Error::InvalidResource(format!(
                    "subpass {} references attachment {} of {}",
                    subpass, reference.attachment, attachment_count
                )));
            }
            Ok(())
        };

        for (index, subpass) in info.subpasses.iter().enumerate() {
            for reference in subpass.input_attachments.iter()
                .chain(subpass.color_attachments.iter())
                .chain(subpass.resolve_attachments.iter())
                .chain(subpass.depth_stencil_attachment.iter())
            {
                check_reference(index, reference)?;
            }
            for reference in subpass.color_attachments.iter().filter(|r| !r.is_unused()) {
                let format = info.attachments[reference.attachment as usize].format;
                if !format.is_color() {
                    return Err(Error::InvalidResource(format!(
                        "subpass {} uses {:?} attachment {} as a color attachment",
                        index, format, reference.attachment
                    )));
                }
            }
            if let Some(reference) = subpass.depth_stencil_attachment.filter(|r| !r.is_unused()) {
                let format = info.attachments[reference.attachment as usize].format;
                if !format.is_depth_or_stencil() {
                    return Err(Error::InvalidResource(format!(
                        "subpass {} uses {:?} attachment {} as depth/stencil attachment",
                        index, format, reference.attachment
                    )));
                }
            }
            if !subpass.resolve_attachments.is_empty()
                && subpass.resolve_attachments.len() != subpass.color_attachments.len()
            {
                return Err(Error::InvalidResource(format!(
                    "subpass {} has {} resolve attachments for {} color attachments",
                    index,
                    subpass.resolve_attachments.len(),
                    subpass.color_attachments.len()
                )));
            }
        }

        let subpass_count = info.subpasses.len() as u32;
        for dependency in &info.dependencies {
            let valid = |subpass: u32| subpass == SUBPASS_EXTERNAL || subpass < subpass_count;
            if !valid(dependency.src_subpass) || !valid(dependency.dst_subpass) {
                return Err(Error::InvalidResource(format!(
                    "dependency {} -> {} references a missing subpass",
                    dependency.src_subpass, dependency.dst_subpass
                )));
            }
        }

        let fbo_attachable = info.subpasses.iter()
            .map(|subpass| {
                subpass.color_attachments.iter()
                    .chain(subpass.depth_stencil_attachment.iter())
                    .filter(|reference| !reference.is_unused())
                    .copied()
                    .collect()
            })
            .collect();

        let max_clear_attachment = info.attachments.iter()
            .enumerate()
            .filter(|(_, attachment)| attachment.requires_clear())
            .map(|(index, _)| index as u32)
            .max();

        Ok(Arc::new(Self {
            id: ObjectId::next(),
            info,
            fbo_attachable,
            max_clear_attachment,
        }))
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn attachments(&self) -> &[AttachmentDescription] {
        &self.info.attachments
    }

    pub fn attachment(&self, index: u32) -> &AttachmentDescription {
        &self.info.attachments[index as usize]
    }

    pub fn subpasses(&self) -> &[SubpassDescription] {
        &self.info.subpasses
    }

    pub fn subpass(&self, index: u32) -> &SubpassDescription {
        &self.info.subpasses[index as usize]
    }

    pub fn subpass_count(&self) -> u32 {
        self.info.subpasses.len() as u32
    }

    pub fn dependencies(&self) -> &[SubpassDependency] {
        &self.info.dependencies
    }

    /// References bound as framebuffer-object attachments during a subpass
    pub fn fbo_attachable(&self, subpass: u32) -> &[AttachmentReference] {
        &self.fbo_attachable[subpass as usize]
    }

    /// Highest attachment index cleared at begin, if any
    ///
    /// The clear value array passed to begin must have more entries than this.
    pub fn max_clear_attachment(&self) -> Option<u32> {
        self.max_clear_attachment
    }
}

#[cfg(test)]
#[path = "render_pass_tests.rs"]
mod tests;
