/// Transfer, clear and barrier replay

use glam::{IVec3, UVec3};
use crate::backend::{
    AttachmentPoint, BackendCaps, BarrierBits, FboAttachment, FboTarget, FramebufferObject,
    FramebufferTarget, NativeBackend, NativeOp, TextureRef,
};
use crate::command::{
    AccessFlags, BufferCopy, BufferImageCopy, BufferMemoryBarrier, ClearAttachment, ClearRect, ClearValue,
    Filter, ImageBlit, ImageCopy, ImageMemoryBarrier, MemoryBarrier,
};
use crate::resource::{Buffer, Image, ImageAspectFlags, ImageSubresourceLayers, ImageSubresourceRange, ImageType, SampleCount};
use crate::execute::executor::Executor;

/// Framebuffer-object attachment of one level and layer of `image`
pub(crate) fn fbo_attachment(image: &Image, point: AttachmentPoint, mip_level: u32, layer: u32) -> FboAttachment {
    let layers = image.array_layers();
    let target = match image.image_type() {
        ImageType::Type1D if layers > 1 => FboTarget::ArrayLayer(layer),
        ImageType::Type1D => FboTarget::Texture1D,
        ImageType::Type3D => FboTarget::Texture3DSlice(layer),
        ImageType::Type2D if image.samples() != SampleCount::S1 => {
            if layers > 1 {
                FboTarget::MultisampleArrayLayer(layer)
            } else {
                FboTarget::Texture2DMultisample
            }
        }
        ImageType::Type2D if image.is_cube_compatible() => {
            if layers > 6 {
                FboTarget::ArrayLayer(layer)
            } else {
                FboTarget::CubeFace(layer)
            }
        }
        ImageType::Type2D if layers > 1 => FboTarget::ArrayLayer(layer),
        ImageType::Type2D => FboTarget::Texture2D,
    };
    FboAttachment {
        point,
        texture: TextureRef::of_image(image),
        target,
        mip_level,
    }
}

/// Native barrier bits covering the given destination accesses
pub(crate) fn barrier_bits(access: AccessFlags) -> BarrierBits {
    let mut bits = BarrierBits::empty();
    if access.intersects(AccessFlags::MEMORY_READ | AccessFlags::MEMORY_WRITE) {
        return BarrierBits::all();
    }
    if access.contains(AccessFlags::VERTEX_ATTRIBUTE_READ) {
        bits |= BarrierBits::VERTEX_ATTRIB_ARRAY;
    }
    if access.contains(AccessFlags::INDEX_READ) {
        bits |= BarrierBits::ELEMENT_ARRAY;
    }
    if access.contains(AccessFlags::UNIFORM_READ) {
        bits |= BarrierBits::UNIFORM;
    }
    if access.contains(AccessFlags::INDIRECT_COMMAND_READ) {
        bits |= BarrierBits::COMMAND;
    }
    if access.intersects(AccessFlags::SHADER_READ | AccessFlags::INPUT_ATTACHMENT_READ) {
        bits |= BarrierBits::TEXTURE_FETCH | BarrierBits::SHADER_IMAGE_ACCESS | BarrierBits::SHADER_STORAGE;
    }
    if access.contains(AccessFlags::SHADER_WRITE) {
        bits |= BarrierBits::SHADER_IMAGE_ACCESS | BarrierBits::SHADER_STORAGE;
    }
    if access.intersects(AccessFlags::TRANSFER_READ | AccessFlags::TRANSFER_WRITE) {
        bits |= BarrierBits::TEXTURE_UPDATE | BarrierBits::BUFFER_UPDATE | BarrierBits::PIXEL_BUFFER;
    }
    if access.intersects(
        AccessFlags::COLOR_ATTACHMENT_READ
            | AccessFlags::COLOR_ATTACHMENT_WRITE
            | AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
            | AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
    ) {
        bits |= BarrierBits::FRAMEBUFFER;
    }
    if access.contains(AccessFlags::HOST_READ) {
        bits |= BarrierBits::PIXEL_BUFFER | BarrierBits::BUFFER_UPDATE;
    }
    bits
}

/// Offset and extent of a region; array layers map to z for non-3D images
fn layered_box(image: &Image, offset: IVec3, extent: UVec3, layers: &ImageSubresourceLayers) -> (IVec3, UVec3) {
    if image.image_type() == ImageType::Type3D {
        (offset, extent)
    } else {
        (
            IVec3::new(offset.x, offset.y, layers.base_array_layer as i32),
            UVec3::new(extent.x, extent.y, layers.layer_count),
        )
    }
}

impl<B: NativeBackend> Executor<'_, B> {
    /// Blit one layer between two attachments through the scratch framebuffers
    pub(crate) fn blit_layer(
        &mut self,
        src: FboAttachment,
        dst: FboAttachment,
        src_offsets: [IVec3; 2],
        dst_offsets: [IVec3; 2],
        mask: ImageAspectFlags,
        filter: Filter,
    ) {
        self.stack.bind_framebuffer(FramebufferTarget::Read, FramebufferObject::BlitSource, &mut self.ops);
        self.stack.attach(FramebufferObject::BlitSource, &[src], &mut self.ops);
        self.stack.bind_framebuffer(FramebufferTarget::Draw, FramebufferObject::BlitDestination, &mut self.ops);
        self.stack.attach(FramebufferObject::BlitDestination, &[dst], &mut self.ops);
        if mask.contains(ImageAspectFlags::COLOR) {
            self.stack.set_read_buffer(FramebufferObject::BlitSource, src.point, &mut self.ops);
            self.stack.set_draw_buffers(FramebufferObject::BlitDestination, &[dst.point], &mut self.ops);
        }
        self.ops.push(NativeOp::BlitFramebuffer { src_offsets, dst_offsets, mask, filter });
    }

    fn download_level(&mut self, image: &Image, level: u32) {
        self.ops.push(NativeOp::DownloadImage {
            texture: TextureRef::of_image(image),
            level,
            offset: IVec3::ZERO,
            extent: image.mip_extent(level),
            buffer: None,
            buffer_offset: 0,
        });
    }

    pub(crate) fn blit_image(&mut self, src: &Image, dst: &Image, regions: &[ImageBlit], filter: Filter) {
        for region in regions {
            let mask = region.src_subresource.aspect_mask;
            let point = AttachmentPoint::for_format(src.format(), 0);
            for layer in 0..region.src_subresource.layer_count {
                self.blit_layer(
                    fbo_attachment(src, point, region.src_subresource.mip_level, region.src_subresource.base_array_layer + layer),
                    fbo_attachment(dst, point, region.dst_subresource.mip_level, region.dst_subresource.base_array_layer + layer),
                    region.src_offsets,
                    region.dst_offsets,
                    mask,
                    filter,
                );
            }
        }
        self.stack.bind_framebuffer(FramebufferTarget::Both, FramebufferObject::Default, &mut self.ops);
        if dst.is_host_visible() {
            for region in regions {
                self.download_level(dst, region.dst_subresource.mip_level);
            }
        }
    }

    pub(crate) fn copy_image(&mut self, src: &Image, dst: &Image, regions: &[ImageCopy]) {
        if self.has_cap(BackendCaps::COPY_IMAGE) {
            for region in regions {
                let (src_offset, extent) = layered_box(src, region.src_offset, region.extent, &region.src_subresource);
                let (dst_offset, _) = layered_box(dst, region.dst_offset, region.extent, &region.dst_subresource);
                self.ops.push(NativeOp::CopyImageSubData {
                    src: TextureRef::of_image(src),
                    src_level: region.src_subresource.mip_level,
                    src_offset,
                    dst: TextureRef::of_image(dst),
                    dst_level: region.dst_subresource.mip_level,
                    dst_offset,
                    extent,
                });
            }
        } else {
            let point = AttachmentPoint::for_format(src.format(), 0);
            for region in regions {
                let size = region.extent.as_ivec3();
                let src_offsets = [region.src_offset, region.src_offset + size];
                let dst_offsets = [region.dst_offset, region.dst_offset + size];
                for layer in 0..region.src_subresource.layer_count {
                    self.blit_layer(
                        fbo_attachment(src, point, region.src_subresource.mip_level, region.src_subresource.base_array_layer + layer),
                        fbo_attachment(dst, point, region.dst_subresource.mip_level, region.dst_subresource.base_array_layer + layer),
                        src_offsets,
                        dst_offsets,
                        region.src_subresource.aspect_mask,
                        Filter::Nearest,
                    );
                }
            }
            self.stack.bind_framebuffer(FramebufferTarget::Both, FramebufferObject::Default, &mut self.ops);
        }
        if dst.is_host_visible() {
            for region in regions {
                self.download_level(dst, region.dst_subresource.mip_level);
            }
        }
    }

    pub(crate) fn copy_buffer(&mut self, src: &Buffer, dst: &Buffer, regions: &[BufferCopy]) {
        for region in regions {
            self.ops.push(NativeOp::CopyBuffer {
                src: src.native(),
                dst: dst.native(),
                src_offset: region.src_offset,
                dst_offset: region.dst_offset,
                size: region.size,
            });
        }
    }

    pub(crate) fn copy_buffer_to_image(&mut self, src: &Buffer, dst: &Image, regions: &[BufferImageCopy]) {
        for region in regions {
            let (offset, extent) = layered_box(dst, region.image_offset, region.image_extent, &region.image_subresource);
            self.ops.push(NativeOp::UploadImage {
                buffer: src.native(),
                buffer_offset: region.buffer_offset,
                row_length: region.buffer_row_length,
                image_height: region.buffer_image_height,
                texture: TextureRef::of_image(dst),
                level: region.image_subresource.mip_level,
                offset,
                extent,
            });
        }
        if dst.is_host_visible() {
            for region in regions {
                self.download_level(dst, region.image_subresource.mip_level);
            }
        }
    }

    pub(crate) fn copy_image_to_buffer(&mut self, src: &Image, dst: &Buffer, regions: &[BufferImageCopy]) {
        for region in regions {
            let (offset, extent) = layered_box(src, region.image_offset, region.image_extent, &region.image_subresource);
            self.ops.push(NativeOp::DownloadImage {
                texture: TextureRef::of_image(src),
                level: region.image_subresource.mip_level,
                offset,
                extent,
                buffer: Some(dst.native()),
                buffer_offset: region.buffer_offset,
            });
        }
    }

    pub(crate) fn clear_image(&mut self, image: &Image, value: ClearValue, ranges: &[ImageSubresourceRange], command: &str) {
        if !self.has_cap(BackendCaps::CLEAR_TEX_IMAGE) {
            self.report_unsupported(command, "texture clears not available");
            return;
        }
        self.stack.apply_disable_blend(&mut self.ops);
        let mut cleared_levels = Vec::new();
        for range in ranges {
            let range = image.resolve_range(range);
            for level in range.base_mip_level..range.base_mip_level + range.level_count {
                self.ops.push(NativeOp::ClearTexImage {
                    texture: TextureRef::of_image(image),
                    level,
                    base_layer: range.base_array_layer,
                    layer_count: range.layer_count,
                    value,
                });
                if !cleared_levels.contains(&level) {
                    cleared_levels.push(level);
                }
            }
        }
        if image.is_host_visible() {
            for level in cleared_levels {
                self.download_level(image, level);
            }
        }
        self.reapply_graphics_pipeline();
    }

    /// Clear regions of the current subpass attachments
    ///
    /// Each rect becomes scissor 0 for the duration of its clears; the previous
    /// scissors and the bound pipeline's state are restored afterwards.
    pub(crate) fn clear_attachments(&mut self, attachments: &[ClearAttachment], rects: &[ClearRect]) {
        let saved_scissors = self.stack.current().viewport.value().scissors.clone();

        let mut color_slots = Vec::new();
        let (mut depth, mut stencil) = (false, false);
        for attachment in attachments {
            if attachment.aspect_mask.contains(ImageAspectFlags::COLOR) {
                color_slots.push(attachment.color_attachment);
            }
            depth |= attachment.aspect_mask.contains(ImageAspectFlags::DEPTH);
            stencil |= attachment.aspect_mask.contains(ImageAspectFlags::STENCIL);
        }

        for rect in rects {
            self.stack.set_scissors(0, &[rect.rect], &mut self.ops);
            self.stack.apply_clear_masks(&color_slots, depth, stencil, &mut self.ops);
            for attachment in attachments {
                if attachment.aspect_mask.contains(ImageAspectFlags::COLOR) {
                    self.ops.push(NativeOp::ClearColorAttachment {
                        slot: attachment.color_attachment,
                        value: attachment.clear_value.color(),
                    });
                    continue;
                }
                let value = attachment.clear_value.depth_stencil();
                let depth = attachment.aspect_mask.contains(ImageAspectFlags::DEPTH).then_some(value.depth);
                let stencil = attachment.aspect_mask.contains(ImageAspectFlags::STENCIL).then_some(value.stencil);
                if depth.is_some() || stencil.is_some() {
                    self.ops.push(NativeOp::ClearDepthStencilAttachment { depth, stencil });
                }
            }
        }

        if !saved_scissors.is_empty() {
            self.stack.set_scissors(0, &saved_scissors, &mut self.ops);
        }
        self.reapply_graphics_pipeline();
    }

    pub(crate) fn pipeline_barrier(
        &mut self,
        memory_barriers: &[MemoryBarrier],
        buffer_barriers: &[BufferMemoryBarrier],
        image_barriers: &[ImageMemoryBarrier],
    ) {
        let access = memory_barriers
            .iter()
            .map(|barrier| barrier.dst_access_mask)
            .chain(buffer_barriers.iter().map(|barrier| barrier.dst_access_mask))
            .chain(image_barriers.iter().map(|barrier| barrier.dst_access_mask))
            .fold(AccessFlags::empty(), |all, mask| all | mask);
        let bits = barrier_bits(access);
        if !bits.is_empty() && self.has_cap(BackendCaps::MEMORY_BARRIER) {
            self.ops.push(NativeOp::MemoryBarrier(bits));
        }
    }
}
