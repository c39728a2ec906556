//! Framebuffers

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::resource::{ImageView, ObjectId, RenderPass};

pub struct FramebufferCreateInfo {
    pub render_pass: Arc<RenderPass>,
    pub attachments: Vec<Arc<ImageView>>,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

/// Image views bound to the attachment slots of a render pass
#[derive(Debug)]
pub struct Framebuffer {
    id: ObjectId,
    render_pass: Arc<RenderPass>,
    attachments: Vec<Arc<ImageView>>,
    width: u32,
    height: u32,
    layers: u32,
    srgb: bool,
}

impl Framebuffer {
    /// Validate the views against the render pass and register the framebuffer
    ///
    /// # Errors
    ///
    /// - [`Error::IncompatibleAttachment`] when the attachment count differs from
    ///   the render pass, a view format is not compatible with the declared format,
    ///   or sample counts differ
    /// - [`Error::InvalidResource`] for zero dimensions or views smaller than the
    ///   framebuffer
    pub fn new(info: FramebufferCreateInfo) -> Result<Arc<Self>> {
        let declared = info.render_pass.attachments();
        if declared.len() != info.attachments.len() {
            return Err(Error::IncompatibleAttachment(format!(
                "render pass declares {} attachments, framebuffer provides {}",
                declared.len(),
                info.attachments.len()
            )));
        }
        if info.width == 0 || info.height == 0 || info.layers == 0 {
            return Err(Error::InvalidResource(format!(
                "framebuffer dimensions {}x{}x{} contain a zero",
                info.width, info.height, info.layers
            )));
        }

        for (index, (description, view)) in declared.iter().zip(&info.attachments).enumerate() {
            if !view.format().is_attachment_compatible(description.format) {
                return Err(Error::IncompatibleAttachment(format!(
                    "attachment {}: view format {:?} does not match declared {:?}",
                    index,
                    view.format(),
                    description.format
                )));
            }
            if view.image().samples() != description.samples {
                return Err(Error::IncompatibleAttachment(format!(
                    "attachment {}: {} samples, render pass declares {}",
                    index,
                    view.image().samples().count(),
                    description.samples.count()
                )));
            }
            let extent = view.extent();
            if extent.x < info.width || extent.y < info.height {
                return Err(Error::InvalidResource(format!(
                    "attachment {}: view extent {}x{} is smaller than framebuffer {}x{}",
                    index, extent.x, extent.y, info.width, info.height
                )));
            }
        }

        let srgb = info.attachments.iter().any(|view| view.format().is_srgb());

        Ok(Arc::new(Self {
            id: ObjectId::next(),
            render_pass: info.render_pass,
            attachments: info.attachments,
            width: info.width,
            height: info.height,
            layers: info.layers,
            srgb,
        }))
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn render_pass(&self) -> &Arc<RenderPass> {
        &self.render_pass
    }

    pub fn attachments(&self) -> &[Arc<ImageView>] {
        &self.attachments
    }

    pub fn attachment(&self, index: u32) -> &Arc<ImageView> {
        &self.attachments[index as usize]
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layers(&self) -> u32 {
        self.layers
    }

    /// Whether any attachment is sRGB (drives framebuffer sRGB conversion)
    pub fn is_srgb(&self) -> bool {
        self.srgb
    }
}
