/// Render pass emulation
///
/// Native backends have no render pass objects. A render pass instance becomes
/// one framebuffer object per [`Framebuffer`], re-attached at each subpass, with
/// load-op clears at begin, resolves at subpass boundaries and stores at end.

use std::sync::Arc;
use glam::IVec3;
use crate::backend::{
    AttachmentPoint, BackendCaps, FboAttachment, FramebufferObject, FramebufferTarget, NativeBackend,
    NativeOp, TextureRef,
};
use crate::command::{ClearDepthStencilValue, ClearValue, Filter, RenderPassBeginInfo};
use crate::execute::executor::{ActiveRenderPass, Executor};
use crate::execute::transfer::fbo_attachment;
use crate::resource::{
    AttachmentLoadOp, AttachmentStoreOp, Framebuffer, ImageAspectFlags, ImageView, RenderPass,
};

/// Framebuffer-object attachment of an image view at `point`
pub(crate) fn view_attachment(view: &ImageView, point: AttachmentPoint) -> FboAttachment {
    let range = view.subresource_range();
    fbo_attachment(view.image(), point, range.base_mip_level, range.base_array_layer)
}

/// Attachments and draw buffers of one subpass
///
/// Color reference `k` attaches at `Color(k)`; unused references leave a gap.
fn subpass_attachments(
    render_pass: &RenderPass,
    framebuffer: &Framebuffer,
    subpass: u32,
) -> (Vec<FboAttachment>, Vec<AttachmentPoint>) {
    let description = render_pass.subpass(subpass);
    let mut attachments = Vec::new();
    let mut draw_buffers = Vec::new();
    for (index, reference) in description.color_attachments.iter().enumerate() {
        if reference.is_unused() {
            continue;
        }
        let point = AttachmentPoint::Color(index as u32);
        attachments.push(view_attachment(framebuffer.attachment(reference.attachment), point));
        draw_buffers.push(point);
    }
    if let Some(reference) = description.depth_stencil_attachment.filter(|r| !r.is_unused()) {
        let view = framebuffer.attachment(reference.attachment);
        attachments.push(view_attachment(view, AttachmentPoint::for_format(view.format(), 0)));
    }
    (attachments, draw_buffers)
}

/// Native clears performed when a render pass begins
///
/// Walks the color references of subpass 0 whose attachment clears, compacts
/// `clear_values[reference.attachment]` in that order, then hands the list out
/// positionally along the same walk. Each slot therefore receives the value of
/// its own attachment, whatever the reference order. Attachments cleared but
/// first used by a later subpass take no value here. Depth and stencil clears
/// merge into one op.
pub(crate) fn begin_clears(render_pass: &RenderPass, clear_values: &[ClearValue]) -> Vec<NativeOp> {
    let subpass = render_pass.subpass(0);
    let clearing: Vec<(u32, u32)> = subpass
        .color_attachments
        .iter()
        .enumerate()
        .filter(|(_, reference)| {
            !reference.is_unused() && render_pass.attachment(reference.attachment).load_op == AttachmentLoadOp::Clear
        })
        .map(|(slot, reference)| (slot as u32, reference.attachment))
        .collect();
    let colors: Vec<_> = clearing
        .iter()
        .map(|(_, attachment)| clear_values.get(*attachment as usize).map(ClearValue::color).unwrap_or_default())
        .collect();

    let mut ops: Vec<NativeOp> = clearing
        .iter()
        .zip(colors)
        .map(|((slot, _), value)| NativeOp::ClearColorAttachment { slot: *slot, value })
        .collect();

    if let Some(reference) = subpass.depth_stencil_attachment.filter(|r| !r.is_unused()) {
        let description = render_pass.attachment(reference.attachment);
        let value = clear_values
            .get(reference.attachment as usize)
            .map(ClearValue::depth_stencil)
            .unwrap_or(ClearDepthStencilValue { depth: 1.0, stencil: 0 });
        let depth = (description.format.has_depth() && description.load_op == AttachmentLoadOp::Clear)
            .then_some(value.depth);
        let stencil = (description.format.has_stencil() && description.stencil_load_op == AttachmentLoadOp::Clear)
            .then_some(value.stencil);
        if depth.is_some() || stencil.is_some() {
            ops.push(NativeOp::ClearDepthStencilAttachment { depth, stencil });
        }
    }
    ops
}

impl<B: NativeBackend> Executor<'_, B> {
    pub(crate) fn begin_render_pass(&mut self, info: &RenderPassBeginInfo) {
        let framebuffer = &info.framebuffer;
        let fbo = FramebufferObject::Framebuffer(framebuffer.id());

        self.stack.apply_disable_blend(&mut self.ops);
        self.stack.set_render_area(info.render_area, &mut self.ops);
        self.stack.apply_srgb(framebuffer.is_srgb(), &mut self.ops);
        self.stack.bind_framebuffer(FramebufferTarget::Both, fbo, &mut self.ops);
        self.attach_subpass(&info.render_pass, framebuffer, 0);

        let clears = begin_clears(&info.render_pass, &info.clear_values);
        if !clears.is_empty() {
            let mut color_slots = Vec::new();
            let (mut depth, mut stencil) = (false, false);
            for op in &clears {
                match op {
                    NativeOp::ClearColorAttachment { slot, .. } => color_slots.push(*slot),
                    NativeOp::ClearDepthStencilAttachment { depth: d, stencil: s } => {
                        depth = d.is_some();
                        stencil = s.is_some();
                    }
                    _ => {}
                }
            }
            self.stack.apply_clear_masks(&color_slots, depth, stencil, &mut self.ops);
            self.ops.extend(clears);
        }

        self.replay.render_pass = Some(ActiveRenderPass { info: info.clone(), subpass: 0 });
        self.reapply_graphics_pipeline();
        self.validate_bound_pipeline();
    }

    pub(crate) fn next_subpass(&mut self) {
        let Some(active) = &self.replay.render_pass else { return };
        let render_pass = Arc::clone(&active.info.render_pass);
        let framebuffer = Arc::clone(&active.info.framebuffer);
        let subpass = active.subpass;

        self.resolve_subpass(&render_pass, &framebuffer, subpass);
        if let Some(active) = &mut self.replay.render_pass {
            active.subpass = subpass + 1;
        }
        self.stack.bind_framebuffer(
            FramebufferTarget::Both,
            FramebufferObject::Framebuffer(framebuffer.id()),
            &mut self.ops,
        );
        self.attach_subpass(&render_pass, &framebuffer, subpass + 1);
        self.validate_bound_pipeline();
    }

    pub(crate) fn end_render_pass(&mut self) {
        let Some(active) = self.replay.render_pass.take() else { return };
        let render_pass = &active.info.render_pass;
        let framebuffer = &active.info.framebuffer;
        let fbo = FramebufferObject::Framebuffer(framebuffer.id());

        self.resolve_subpass(render_pass, framebuffer, active.subpass);
        self.stack.bind_framebuffer(FramebufferTarget::Both, fbo, &mut self.ops);

        for (index, description) in render_pass.attachments().iter().enumerate() {
            let stored = description.store_op == AttachmentStoreOp::Store
                || (description.format.has_stencil() && description.stencil_store_op == AttachmentStoreOp::Store);
            let view = framebuffer.attachment(index as u32);
            if stored && view.image().is_host_visible() {
                let level = view.subresource_range().base_mip_level;
                self.ops.push(NativeOp::DownloadImage {
                    texture: TextureRef::of_image(view.image()),
                    level,
                    offset: IVec3::ZERO,
                    extent: view.image().mip_extent(level),
                    buffer: None,
                    buffer_offset: 0,
                });
            }
        }

        if self.has_cap(BackendCaps::INVALIDATE_FRAMEBUFFER) {
            let points = discarded_points(render_pass, framebuffer, active.subpass);
            if !points.is_empty() {
                self.ops.push(NativeOp::InvalidateAttachments { framebuffer: fbo, points });
            }
        }
    }

    fn attach_subpass(&mut self, render_pass: &RenderPass, framebuffer: &Framebuffer, subpass: u32) {
        let fbo = FramebufferObject::Framebuffer(framebuffer.id());
        let (attachments, draw_buffers) = subpass_attachments(render_pass, framebuffer, subpass);
        self.stack.attach(fbo, &attachments, &mut self.ops);
        self.stack.set_draw_buffers(fbo, &draw_buffers, &mut self.ops);
    }

    /// Blit multisampled color attachments into their resolve targets
    fn resolve_subpass(&mut self, render_pass: &RenderPass, framebuffer: &Framebuffer, subpass: u32) {
        let description = render_pass.subpass(subpass);
        let corner = IVec3::new(framebuffer.width() as i32, framebuffer.height() as i32, 1);
        for (color, resolve) in description.color_attachments.iter().zip(&description.resolve_attachments) {
            if color.is_unused() || resolve.is_unused() {
                continue;
            }
            let src = framebuffer.attachment(color.attachment);
            let dst = framebuffer.attachment(resolve.attachment);
            self.blit_layer(
                view_attachment(src, AttachmentPoint::Color(0)),
                view_attachment(dst, AttachmentPoint::Color(0)),
                [IVec3::ZERO, corner],
                [IVec3::ZERO, corner],
                ImageAspectFlags::COLOR,
                Filter::Nearest,
            );
        }
    }
}

/// Attachment points of `subpass` whose content is not kept after the pass
fn discarded_points(render_pass: &RenderPass, framebuffer: &Framebuffer, subpass: u32) -> Vec<AttachmentPoint> {
    let description = render_pass.subpass(subpass);
    let mut points = Vec::new();
    for (index, reference) in description.color_attachments.iter().enumerate() {
        if !reference.is_unused() && render_pass.attachment(reference.attachment).store_op == AttachmentStoreOp::DontCare {
            points.push(AttachmentPoint::Color(index as u32));
        }
    }
    if let Some(reference) = description.depth_stencil_attachment.filter(|r| !r.is_unused()) {
        let attachment = render_pass.attachment(reference.attachment);
        let format = framebuffer.attachment(reference.attachment).format();
        let depth_discarded = !format.has_depth() || attachment.store_op == AttachmentStoreOp::DontCare;
        let stencil_discarded = !format.has_stencil() || attachment.stencil_store_op == AttachmentStoreOp::DontCare;
        if depth_discarded && stencil_discarded {
            points.push(AttachmentPoint::for_format(format, 0));
        }
    }
    points
}
