//! Images and image views

use std::sync::Arc;
use bitflags::bitflags;
use glam::{IVec3, UVec3};
use crate::command::{
    AccessFlags, CommandBuffer, Filter, ImageBlit, ImageMemoryBarrier, PipelineStageFlags,
};
use crate::error::{Error, Result};
use crate::resource::{Format, ImageAspectFlags, NativeHandle, ObjectId};

/// Image dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    Type1D,
    Type2D,
    Type3D,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageUsageFlags: u32 {
        const TRANSFER_SRC = 0x01;
        const TRANSFER_DST = 0x02;
        const SAMPLED = 0x04;
        const STORAGE = 0x08;
        const COLOR_ATTACHMENT = 0x10;
        const DEPTH_STENCIL_ATTACHMENT = 0x20;
        const TRANSIENT_ATTACHMENT = 0x40;
        const INPUT_ATTACHMENT = 0x80;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageCreateFlags: u32 {
        const MUTABLE_FORMAT = 0x08;
        const CUBE_COMPATIBLE = 0x10;
        const ARRAY_2D_COMPATIBLE = 0x20;
    }
}

/// Samples per texel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SampleCount {
    S1 = 1,
    S2 = 2,
    S4 = 4,
    S8 = 8,
    S16 = 16,
}

impl SampleCount {
    pub fn count(self) -> u32 {
        self as u32
    }
}

/// Image layouts
///
/// The native backends have no layouts; they only drive access/stage masks of
/// barriers and the mipmap transition sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageLayout {
    Undefined,
    General,
    ColorAttachmentOptimal,
    DepthStencilAttachmentOptimal,
    DepthStencilReadOnlyOptimal,
    ShaderReadOnlyOptimal,
    TransferSrcOptimal,
    TransferDstOptimal,
    Preinitialized,
    PresentSrc,
}

impl ImageLayout {
    /// Accesses an image in this layout is used for
    pub fn access_mask(self) -> AccessFlags {
        match self {
            ImageLayout::Undefined | ImageLayout::General => AccessFlags::empty(),
            ImageLayout::Preinitialized => AccessFlags::HOST_WRITE,
            ImageLayout::ColorAttachmentOptimal => AccessFlags::COLOR_ATTACHMENT_WRITE,
            ImageLayout::DepthStencilAttachmentOptimal => AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            ImageLayout::DepthStencilReadOnlyOptimal => AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ,
            ImageLayout::ShaderReadOnlyOptimal => AccessFlags::SHADER_READ | AccessFlags::INPUT_ATTACHMENT_READ,
            ImageLayout::TransferSrcOptimal => AccessFlags::TRANSFER_READ,
            ImageLayout::TransferDstOptimal => AccessFlags::TRANSFER_WRITE,
            ImageLayout::PresentSrc => AccessFlags::MEMORY_READ,
        }
    }

    /// Pipeline stage that produces or consumes the image in this layout
    pub fn stage_mask(self) -> PipelineStageFlags {
        match self {
            ImageLayout::Undefined | ImageLayout::General => PipelineStageFlags::TOP_OF_PIPE,
            ImageLayout::Preinitialized => PipelineStageFlags::HOST,
            ImageLayout::ColorAttachmentOptimal => PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            ImageLayout::DepthStencilAttachmentOptimal | ImageLayout::DepthStencilReadOnlyOptimal => {
                PipelineStageFlags::EARLY_FRAGMENT_TESTS
            }
            ImageLayout::ShaderReadOnlyOptimal => PipelineStageFlags::FRAGMENT_SHADER,
            ImageLayout::TransferSrcOptimal | ImageLayout::TransferDstOptimal => PipelineStageFlags::TRANSFER,
            ImageLayout::PresentSrc => PipelineStageFlags::BOTTOM_OF_PIPE,
        }
    }
}

/// Sentinel for "all remaining levels/layers"
pub const REMAINING_MIP_LEVELS: u32 = u32::MAX;
pub const REMAINING_ARRAY_LAYERS: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSubresourceRange {
    pub aspect_mask: ImageAspectFlags,
    pub base_mip_level: u32,
    pub level_count: u32,
    pub base_array_layer: u32,
    pub layer_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSubresourceLayers {
    pub aspect_mask: ImageAspectFlags,
    pub mip_level: u32,
    pub base_array_layer: u32,
    pub layer_count: u32,
}

/// Image description
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCreateInfo {
    pub image_type: ImageType,
    pub format: Format,
    pub extent: UVec3,
    pub mip_levels: u32,
    pub array_layers: u32,
    pub samples: SampleCount,
    pub usage: ImageUsageFlags,
    pub flags: ImageCreateFlags,
    /// Memory is host-visible: attachments stored by a render pass are downloaded
    pub host_visible: bool,
}

impl Default for ImageCreateInfo {
    fn default() -> Self {
        Self {
            image_type: ImageType::Type2D,
            format: Format::R8G8B8A8_UNORM,
            extent: UVec3::ONE,
            mip_levels: 1,
            array_layers: 1,
            samples: SampleCount::S1,
            usage: ImageUsageFlags::SAMPLED | ImageUsageFlags::TRANSFER_DST,
            flags: ImageCreateFlags::empty(),
            host_visible: false,
        }
    }
}

/// Image wrapping an already-created native texture
#[derive(Debug)]
pub struct Image {
    id: ObjectId,
    info: ImageCreateInfo,
    native: NativeHandle,
}

impl Image {
    /// Register an image
    ///
    /// # Errors
    ///
    /// [`Error::InvalidResource`] when the extent is zero, the mip count exceeds
    /// the extent's mip chain, or a cube-compatible image is not a square 2D image
    /// with at least 6 layers.
    pub fn new(info: ImageCreateInfo, native: NativeHandle) -> Result<Arc<Self>> {
        if info.extent.x == 0 || info.extent.y == 0 || info.extent.z == 0 {
            return Err(Error::InvalidResource(format!("image extent {:?} has a zero dimension", info.extent)));
        }
        if info.format == Format::Undefined {
            return Err(Error::InvalidResource("image format is undefined".to_string()));
        }
        if info.array_layers == 0 {
            return Err(Error::InvalidResource("image has zero array layers".to_string()));
        }
        let max_levels = Self::max_mip_levels(info.extent);
        if info.mip_levels == 0 || info.mip_levels > max_levels {
            return Err(Error::InvalidResource(format!(
                "{} mip levels requested, extent {:?} allows 1..={}",
                info.mip_levels, info.extent, max_levels
            )));
        }
        if info.samples != SampleCount::S1 && info.mip_levels != 1 {
            return Err(Error::InvalidResource("multisampled images must have one mip level".to_string()));
        }
        if info.flags.contains(ImageCreateFlags::CUBE_COMPATIBLE)
            && (info.image_type != ImageType::Type2D || info.extent.x != info.extent.y || info.array_layers < 6)
        {
            return Err(Error::InvalidResource(
                "cube-compatible images must be square 2D images with at least 6 layers".to_string(),
            ));
        }

        Ok(Arc::new(Self {
            id: ObjectId::next(),
            info,
            native,
        }))
    }

    /// Length of the full mip chain for an extent
    pub fn max_mip_levels(extent: UVec3) -> u32 {
        let largest = extent.max_element().max(1);
        32 - largest.leading_zeros()
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn info(&self) -> &ImageCreateInfo {
        &self.info
    }

    pub fn native(&self) -> NativeHandle {
        self.native
    }

    pub fn format(&self) -> Format {
        self.info.format
    }

    pub fn image_type(&self) -> ImageType {
        self.info.image_type
    }

    pub fn extent(&self) -> UVec3 {
        self.info.extent
    }

    pub fn mip_levels(&self) -> u32 {
        self.info.mip_levels
    }

    pub fn array_layers(&self) -> u32 {
        self.info.array_layers
    }

    pub fn samples(&self) -> SampleCount {
        self.info.samples
    }

    pub fn is_host_visible(&self) -> bool {
        self.info.host_visible
    }

    pub fn is_cube_compatible(&self) -> bool {
        self.info.flags.contains(ImageCreateFlags::CUBE_COMPATIBLE)
    }

    /// Extent of a mip level, each dimension clamped to 1
    pub fn mip_extent(&self, level: u32) -> UVec3 {
        let shrink = |size: u32| size.checked_shr(level).unwrap_or(0).max(1);
        UVec3::new(shrink(self.info.extent.x), shrink(self.info.extent.y), shrink(self.info.extent.z))
    }

    /// Range covering every level and layer of the given aspects
    pub fn full_range(&self) -> ImageSubresourceRange {
        ImageSubresourceRange {
            aspect_mask: self.info.format.aspects(),
            base_mip_level: 0,
            level_count: self.info.mip_levels,
            base_array_layer: 0,
            layer_count: self.info.array_layers,
        }
    }

    /// Replace `REMAINING_*` sentinels with concrete counts
    pub fn resolve_range(&self, range: &ImageSubresourceRange) -> ImageSubresourceRange {
        let level_count = if range.level_count == REMAINING_MIP_LEVELS {
            self.info.mip_levels.saturating_sub(range.base_mip_level)
        } else {
            range.level_count
        };
        let layer_count = if range.layer_count == REMAINING_ARRAY_LAYERS {
            self.info.array_layers.saturating_sub(range.base_array_layer)
        } else {
            range.layer_count
        };
        ImageSubresourceRange {
            level_count,
            layer_count,
            ..*range
        }
    }

    /// Record the mip chain generation for every layer
    ///
    /// Per layer: level 0 goes to transfer-source, then each level `n` is moved to
    /// transfer-destination, blitted from `n - 1` with a linear filter and moved to
    /// transfer-source, and `n - 1` is moved to `dst_layout`. The last level is moved
    /// to `dst_layout` at the end. One blit per level after the first.
    ///
    /// Must be recorded outside a render pass.
    pub fn generate_mipmaps(self: &Arc<Self>, command_buffer: &mut CommandBuffer, dst_layout: ImageLayout) {
        let aspect_mask = self.info.format.aspects();
        let levels = self.info.mip_levels;

        for layer in 0..self.info.array_layers {
            self.transition_level(command_buffer, layer, 0, ImageLayout::Undefined, ImageLayout::TransferSrcOptimal);

            for level in 1..levels {
                self.transition_level(
                    command_buffer,
                    layer,
                    level,
                    ImageLayout::Undefined,
                    ImageLayout::TransferDstOptimal,
                );

                let src_extent = self.mip_extent(level - 1).as_ivec3();
                let dst_extent = self.mip_extent(level).as_ivec3();
                let region = ImageBlit {
                    src_subresource: ImageSubresourceLayers {
                        aspect_mask,
                        mip_level: level - 1,
                        base_array_layer: layer,
                        layer_count: 1,
                    },
                    src_offsets: [IVec3::ZERO, src_extent],
                    dst_subresource: ImageSubresourceLayers {
                        aspect_mask,
                        mip_level: level,
                        base_array_layer: layer,
                        layer_count: 1,
                    },
                    dst_offsets: [IVec3::ZERO, dst_extent],
                };
                command_buffer.blit_image(
                    self,
                    ImageLayout::TransferSrcOptimal,
                    self,
                    ImageLayout::TransferDstOptimal,
                    &[region],
                    Filter::Linear,
                );

                self.transition_level(
                    command_buffer,
                    layer,
                    level,
                    ImageLayout::TransferDstOptimal,
                    ImageLayout::TransferSrcOptimal,
                );
                self.transition_level(command_buffer, layer, level - 1, ImageLayout::TransferSrcOptimal, dst_layout);
            }

            self.transition_level(command_buffer, layer, levels - 1, ImageLayout::TransferSrcOptimal, dst_layout);
        }
    }

    fn transition_level(
        self: &Arc<Self>,
        command_buffer: &mut CommandBuffer,
        layer: u32,
        level: u32,
        old_layout: ImageLayout,
        new_layout: ImageLayout,
    ) {
        let barrier = ImageMemoryBarrier {
            src_access_mask: old_layout.access_mask(),
            dst_access_mask: new_layout.access_mask(),
            old_layout,
            new_layout,
            image: Arc::clone(self),
            subresource_range: ImageSubresourceRange {
                aspect_mask: self.info.format.aspects(),
                base_mip_level: level,
                level_count: 1,
                base_array_layer: layer,
                layer_count: 1,
            },
        };
        command_buffer.pipeline_barrier(
            old_layout.stage_mask(),
            new_layout.stage_mask(),
            &[],
            &[],
            &[barrier],
        );
    }
}

/// View dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageViewType {
    Type1D,
    Type2D,
    Type3D,
    Cube,
    Type1DArray,
    Type2DArray,
    CubeArray,
}

/// View on a subresource range of an image
#[derive(Debug)]
pub struct ImageView {
    id: ObjectId,
    image: Arc<Image>,
    view_type: ImageViewType,
    format: Format,
    subresource_range: ImageSubresourceRange,
}

impl ImageView {
    /// Create a view
    ///
    /// # Errors
    ///
    /// [`Error::InvalidResource`] when the range is outside the image or the view
    /// format cannot reinterpret the image format.
    pub fn new(
        image: &Arc<Image>,
        view_type: ImageViewType,
        format: Format,
        subresource_range: ImageSubresourceRange,
    ) -> Result<Arc<Self>> {
        let range = image.resolve_range(&subresource_range);
        if range.level_count == 0
            || range.base_mip_level + range.level_count > image.mip_levels()
            || range.layer_count == 0
            || range.base_array_layer + range.layer_count > image.array_layers()
        {
            return Err(Error::InvalidResource(format!(
                "view range {:?} is outside image with {} levels and {} layers",
                subresource_range,
                image.mip_levels(),
                image.array_layers()
            )));
        }
        let reinterpretable = image.info().flags.contains(ImageCreateFlags::MUTABLE_FORMAT)
            && format.is_view_compatible(image.format());
        if format != image.format() && !reinterpretable {
            return Err(Error::InvalidResource(format!(
                "view format {:?} is incompatible with image format {:?}",
                format,
                image.format()
            )));
        }
        if matches!(view_type, ImageViewType::Cube | ImageViewType::CubeArray)
            && (!image.is_cube_compatible() || range.layer_count % 6 != 0)
        {
            return Err(Error::InvalidResource("cube views need a cube-compatible image and 6n layers".to_string()));
        }

        Ok(Arc::new(Self {
            id: ObjectId::next(),
            image: Arc::clone(image),
            view_type,
            format,
            subresource_range: range,
        }))
    }

    /// View over mip 0 / layer 0 of a 2D image, in the image's own format
    pub fn simple_2d(image: &Arc<Image>) -> Result<Arc<Self>> {
        Self::new(
            image,
            ImageViewType::Type2D,
            image.format(),
            ImageSubresourceRange {
                aspect_mask: image.format().aspects(),
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            },
        )
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn image(&self) -> &Arc<Image> {
        &self.image
    }

    pub fn view_type(&self) -> ImageViewType {
        self.view_type
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn subresource_range(&self) -> &ImageSubresourceRange {
        &self.subresource_range
    }

    /// Extent of the view's base mip level
    pub fn extent(&self) -> UVec3 {
        self.image.mip_extent(self.subresource_range.base_mip_level)
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
