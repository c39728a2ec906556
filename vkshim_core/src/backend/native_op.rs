//! Backend-neutral native calls
//!
//! The executor and the context state stack translate recorded commands into a
//! flat sequence of [`NativeOp`]s. Backends execute them one by one; the null
//! backend records them, which is how replay is observed in tests.

use bitflags::bitflags;
use glam::{IVec3, UVec3};
use crate::command::{ClearColorValue, ClearValue, Filter};
use crate::resource::{
    BlendFactor, BlendOp, ColorComponentFlags, CompareOp, CullModeFlags, Format, FrontFace,
    Image, ImageAspectFlags, ImageType, IndexType, LogicOp, NativeHandle, ObjectId, PolygonMode,
    PrimitiveTopology, QueryType, Rect2D, SampleCount, ShaderStageFlags, StencilOp,
    VertexInputRate, VertexInputState, Viewport,
};

/// Native texture target of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    Texture1D,
    Texture1DArray,
    Texture2D,
    Texture2DArray,
    Texture2DMultisample,
    Texture2DMultisampleArray,
    Texture3D,
    CubeMap,
    CubeMapArray,
}

impl TextureTarget {
    /// Target the image's texture object was created with
    pub fn of_image(image: &Image) -> Self {
        let layers = image.array_layers();
        match image.image_type() {
            ImageType::Type1D if layers > 1 => TextureTarget::Texture1DArray,
            ImageType::Type1D => TextureTarget::Texture1D,
            ImageType::Type3D => TextureTarget::Texture3D,
            ImageType::Type2D => {
                if image.samples() != SampleCount::S1 {
                    if layers > 1 {
                        TextureTarget::Texture2DMultisampleArray
                    } else {
                        TextureTarget::Texture2DMultisample
                    }
                } else if image.is_cube_compatible() {
                    if layers > 6 {
                        TextureTarget::CubeMapArray
                    } else {
                        TextureTarget::CubeMap
                    }
                } else if layers > 1 {
                    TextureTarget::Texture2DArray
                } else {
                    TextureTarget::Texture2D
                }
            }
        }
    }
}

/// Everything a backend needs to address an image's native texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureRef {
    pub id: ObjectId,
    pub handle: NativeHandle,
    pub target: TextureTarget,
    pub format: Format,
    pub extent: UVec3,
}

impl TextureRef {
    pub fn of_image(image: &Image) -> Self {
        Self {
            id: image.id(),
            handle: image.native(),
            target: TextureTarget::of_image(image),
            format: image.format(),
            extent: image.extent(),
        }
    }
}

/// Framebuffer-object attachment point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttachmentPoint {
    Color(u32),
    Depth,
    Stencil,
    DepthStencil,
}

impl AttachmentPoint {
    /// Point an image of this format attaches to, using `color_index` for color formats
    pub fn for_format(format: Format, color_index: u32) -> Self {
        match (format.has_depth(), format.has_stencil()) {
            (true, true) => AttachmentPoint::DepthStencil,
            (true, false) => AttachmentPoint::Depth,
            (false, true) => AttachmentPoint::Stencil,
            (false, false) => AttachmentPoint::Color(color_index),
        }
    }

    pub fn is_color(self) -> bool {
        matches!(self, AttachmentPoint::Color(_))
    }
}

/// Which part of the texture is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FboTarget {
    Texture1D,
    Texture2D,
    Texture2DMultisample,
    ArrayLayer(u32),
    MultisampleArrayLayer(u32),
    CubeFace(u32),
    Texture3DSlice(u32),
}

/// One framebuffer-object attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FboAttachment {
    pub point: AttachmentPoint,
    pub texture: TextureRef,
    pub target: FboTarget,
    pub mip_level: u32,
}

/// Framebuffer objects known to the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FramebufferObject {
    /// The context's default framebuffer
    Default,
    /// Emulation object of a [`Framebuffer`](crate::resource::Framebuffer)
    Framebuffer(ObjectId),
    /// Scratch object used as the source of blits and resolves
    BlitSource,
    /// Scratch object used as the destination of blits and resolves
    BlitDestination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferTarget {
    Draw,
    Read,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilFace {
    Front,
    Back,
    FrontAndBack,
}

/// A query inside a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuerySlot {
    pub pool: ObjectId,
    pub index: u32,
}

bitflags! {
    /// Memory barrier bits (GL `glMemoryBarrier` granularity)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BarrierBits: u32 {
        const VERTEX_ATTRIB_ARRAY = 0x0001;
        const ELEMENT_ARRAY = 0x0002;
        const UNIFORM = 0x0004;
        const TEXTURE_FETCH = 0x0008;
        const SHADER_IMAGE_ACCESS = 0x0020;
        const COMMAND = 0x0040;
        const PIXEL_BUFFER = 0x0080;
        const TEXTURE_UPDATE = 0x0100;
        const BUFFER_UPDATE = 0x0200;
        const FRAMEBUFFER = 0x0400;
        const SHADER_STORAGE = 0x2000;
    }
}

/// One backend-neutral native call
#[derive(Debug, Clone, PartialEq)]
pub enum NativeOp {
    // ---- color blend
    SetBlendEnabled { attachment: u32, enabled: bool },
    SetBlendFunc {
        attachment: u32,
        src_color: BlendFactor,
        dst_color: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    },
    SetBlendEquation { attachment: u32, color_op: BlendOp, alpha_op: BlendOp },
    SetColorWriteMask { attachment: u32, mask: ColorComponentFlags },
    SetBlendConstants([f32; 4]),
    SetLogicOp(Option<LogicOp>),

    // ---- depth / stencil
    SetDepthTestEnabled(bool),
    SetDepthWriteEnabled(bool),
    SetDepthCompareOp(CompareOp),
    SetDepthBoundsTestEnabled(bool),
    SetDepthBounds { min: f32, max: f32 },
    SetStencilTestEnabled(bool),
    SetStencilOps { face: StencilFace, fail: StencilOp, depth_fail: StencilOp, pass: StencilOp },
    SetStencilFunc { face: StencilFace, compare_op: CompareOp, reference: u32, compare_mask: u32 },
    SetStencilWriteMask { face: StencilFace, mask: u32 },

    // ---- multisample
    SetMultisampleEnabled(bool),
    SetSampleShading { enabled: bool, min_fraction: f32 },
    SetSampleMask(u32),
    SetAlphaToCoverageEnabled(bool),
    SetAlphaToOneEnabled(bool),

    // ---- tessellation / input assembly
    SetPatchControlPoints(u32),
    SetPrimitiveRestartEnabled(bool),

    // ---- viewport / scissor
    SetViewportCount(u32),
    SetViewport { index: u32, viewport: Viewport },
    SetScissorCount(u32),
    SetScissor { index: u32, rect: Rect2D },

    // ---- rasterization
    SetDepthClampEnabled(bool),
    SetRasterizerDiscardEnabled(bool),
    SetPolygonMode(PolygonMode),
    SetCullMode(CullModeFlags),
    SetFrontFace(FrontFace),
    SetDepthBiasEnabled(bool),
    SetDepthBias { constant_factor: f32, clamp: f32, slope_factor: f32 },
    SetLineWidth(f32),

    // ---- program / geometry
    UseProgram(NativeHandle),
    SetVertexLayout(VertexInputState),
    BindVertexBuffer { binding: u32, buffer: NativeHandle, offset: u64, stride: u32, input_rate: VertexInputRate },
    BindIndexBuffer { buffer: NativeHandle, offset: u64, index_type: IndexType },

    // ---- framebuffer
    SetFramebufferSrgb(bool),
    BindFramebuffer { target: FramebufferTarget, framebuffer: FramebufferObject },
    AttachImage { framebuffer: FramebufferObject, attachment: FboAttachment },
    DetachImage { framebuffer: FramebufferObject, point: AttachmentPoint },
    SetDrawBuffers { framebuffer: FramebufferObject, points: Vec<AttachmentPoint> },
    SetReadBuffer { framebuffer: FramebufferObject, point: AttachmentPoint },
    ClearColorAttachment { slot: u32, value: ClearColorValue },
    ClearDepthStencilAttachment { depth: Option<f32>, stencil: Option<u32> },
    InvalidateAttachments { framebuffer: FramebufferObject, points: Vec<AttachmentPoint> },
    BlitFramebuffer {
        src_offsets: [IVec3; 2],
        dst_offsets: [IVec3; 2],
        mask: ImageAspectFlags,
        filter: Filter,
    },

    // ---- descriptors / constants
    BindUniformBuffer { binding: u32, buffer: NativeHandle, offset: u64, size: u64 },
    BindStorageBuffer { binding: u32, buffer: NativeHandle, offset: u64, size: u64 },
    BindTexture {
        unit: u32,
        texture: TextureRef,
        format: Format,
        base_level: u32,
        level_count: u32,
        sampler: Option<NativeHandle>,
    },
    BindStorageImage { unit: u32, texture: TextureRef, format: Format, level: u32, layer: Option<u32> },
    PushConstants { stages: ShaderStageFlags, offset: u32, data: Vec<u8> },

    // ---- draw / dispatch
    Draw {
        topology: PrimitiveTopology,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    DrawIndexed {
        topology: PrimitiveTopology,
        index_type: IndexType,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    },
    DrawIndirect { topology: PrimitiveTopology, buffer: NativeHandle, offset: u64, draw_count: u32, stride: u32 },
    DrawIndexedIndirect {
        topology: PrimitiveTopology,
        index_type: IndexType,
        buffer: NativeHandle,
        offset: u64,
        draw_count: u32,
        stride: u32,
    },
    Dispatch { x: u32, y: u32, z: u32 },
    DispatchIndirect { buffer: NativeHandle, offset: u64 },

    // ---- transfer
    CopyBuffer { src: NativeHandle, dst: NativeHandle, src_offset: u64, dst_offset: u64, size: u64 },
    CopyImageSubData {
        src: TextureRef,
        src_level: u32,
        src_offset: IVec3,
        dst: TextureRef,
        dst_level: u32,
        dst_offset: IVec3,
        extent: UVec3,
    },
    UploadImage {
        buffer: NativeHandle,
        buffer_offset: u64,
        row_length: u32,
        image_height: u32,
        texture: TextureRef,
        level: u32,
        offset: IVec3,
        extent: UVec3,
    },
    /// Read a texture level back; `buffer: None` targets the image's own
    /// host-visible storage
    DownloadImage {
        texture: TextureRef,
        level: u32,
        offset: IVec3,
        extent: UVec3,
        buffer: Option<NativeHandle>,
        buffer_offset: u64,
    },
    ClearTexImage { texture: TextureRef, level: u32, base_layer: u32, layer_count: u32, value: ClearValue },
    MemoryBarrier(BarrierBits),

    // ---- queries
    BeginQuery { query_type: QueryType, query: QuerySlot },
    EndQuery { query_type: QueryType, query: QuerySlot },
    WriteTimestamp { query: QuerySlot },
    ResetQueries { pool: ObjectId, first: u32, count: u32 },
}

/// Ordered native ops produced for one replay step
pub type NativeOpList = Vec<NativeOp>;
