/// Mappings from vkshim enums to GL enums

use vkshim_core::backend::{AttachmentPoint, StencilFace, TextureTarget};
use vkshim_core::command::{ClearColorValue, ClearValue, Filter};
use vkshim_core::resource::{
    BlendFactor, BlendOp, CompareOp, CullModeFlags, Format, FrontFace, ImageAspectFlags, IndexType,
    LogicOp, PolygonMode, PrimitiveTopology, QueryType, StencilOp,
};
use crate::gl_types::*;

// ===== PIPELINE STATE =====

pub fn blend_factor(factor: BlendFactor) -> GLenum {
    match factor {
        BlendFactor::Zero => GL_ZERO,
        BlendFactor::One => GL_ONE,
        BlendFactor::SrcColor => GL_SRC_COLOR,
        BlendFactor::OneMinusSrcColor => GL_ONE_MINUS_SRC_COLOR,
        BlendFactor::DstColor => GL_DST_COLOR,
        BlendFactor::OneMinusDstColor => GL_ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlpha => GL_SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => GL_ONE_MINUS_SRC_ALPHA,
        BlendFactor::DstAlpha => GL_DST_ALPHA,
        BlendFactor::OneMinusDstAlpha => GL_ONE_MINUS_DST_ALPHA,
        BlendFactor::ConstantColor => GL_CONSTANT_COLOR,
        BlendFactor::OneMinusConstantColor => GL_ONE_MINUS_CONSTANT_COLOR,
        BlendFactor::ConstantAlpha => GL_CONSTANT_ALPHA,
        BlendFactor::OneMinusConstantAlpha => GL_ONE_MINUS_CONSTANT_ALPHA,
        BlendFactor::SrcAlphaSaturate => GL_SRC_ALPHA_SATURATE,
        BlendFactor::Src1Color => GL_SRC1_COLOR,
        BlendFactor::OneMinusSrc1Color => GL_ONE_MINUS_SRC1_COLOR,
        BlendFactor::Src1Alpha => GL_SRC1_ALPHA,
        BlendFactor::OneMinusSrc1Alpha => GL_ONE_MINUS_SRC1_ALPHA,
    }
}

pub fn blend_op(op: BlendOp) -> GLenum {
    match op {
        BlendOp::Add => GL_FUNC_ADD,
        BlendOp::Subtract => GL_FUNC_SUBTRACT,
        BlendOp::ReverseSubtract => GL_FUNC_REVERSE_SUBTRACT,
        BlendOp::Min => GL_MIN,
        BlendOp::Max => GL_MAX,
    }
}

pub fn logic_op(op: LogicOp) -> GLenum {
    match op {
        LogicOp::Clear => GL_CLEAR,
        LogicOp::And => GL_AND,
        LogicOp::AndReverse => GL_AND_REVERSE,
        LogicOp::Copy => GL_COPY,
        LogicOp::AndInverted => GL_AND_INVERTED,
        LogicOp::NoOp => GL_NOOP,
        LogicOp::Xor => GL_XOR,
        LogicOp::Or => GL_OR,
        LogicOp::Nor => GL_NOR,
        LogicOp::Equivalent => GL_EQUIV,
        LogicOp::Invert => GL_INVERT,
        LogicOp::OrReverse => GL_OR_REVERSE,
        LogicOp::CopyInverted => GL_COPY_INVERTED,
        LogicOp::OrInverted => GL_OR_INVERTED,
        LogicOp::Nand => GL_NAND,
        LogicOp::Set => GL_SET,
    }
}

pub fn compare_op(op: CompareOp) -> GLenum {
    match op {
        CompareOp::Never => GL_NEVER,
        CompareOp::Less => GL_LESS,
        CompareOp::Equal => GL_EQUAL,
        CompareOp::LessOrEqual => GL_LEQUAL,
        CompareOp::Greater => GL_GREATER,
        CompareOp::NotEqual => GL_NOTEQUAL,
        CompareOp::GreaterOrEqual => GL_GEQUAL,
        CompareOp::Always => GL_ALWAYS,
    }
}

pub fn stencil_op(op: StencilOp) -> GLenum {
    match op {
        StencilOp::Keep => GL_KEEP,
        StencilOp::Zero => GL_ZERO,
        StencilOp::Replace => GL_REPLACE,
        StencilOp::IncrementAndClamp => GL_INCR,
        StencilOp::DecrementAndClamp => GL_DECR,
        StencilOp::Invert => GL_INVERT,
        StencilOp::IncrementAndWrap => GL_INCR_WRAP,
        StencilOp::DecrementAndWrap => GL_DECR_WRAP,
    }
}

pub fn stencil_face(face: StencilFace) -> GLenum {
    match face {
        StencilFace::Front => GL_FRONT,
        StencilFace::Back => GL_BACK,
        StencilFace::FrontAndBack => GL_FRONT_AND_BACK,
    }
}

pub fn primitive_topology(topology: PrimitiveTopology) -> GLenum {
    match topology {
        PrimitiveTopology::PointList => GL_POINTS,
        PrimitiveTopology::LineList => GL_LINES,
        PrimitiveTopology::LineStrip => GL_LINE_STRIP,
        PrimitiveTopology::TriangleList => GL_TRIANGLES,
        PrimitiveTopology::TriangleStrip => GL_TRIANGLE_STRIP,
        PrimitiveTopology::TriangleFan => GL_TRIANGLE_FAN,
        PrimitiveTopology::LineListWithAdjacency => GL_LINES_ADJACENCY,
        PrimitiveTopology::LineStripWithAdjacency => GL_LINE_STRIP_ADJACENCY,
        PrimitiveTopology::TriangleListWithAdjacency => GL_TRIANGLES_ADJACENCY,
        PrimitiveTopology::TriangleStripWithAdjacency => GL_TRIANGLE_STRIP_ADJACENCY,
        PrimitiveTopology::PatchList => GL_PATCHES,
    }
}

pub fn polygon_mode(mode: PolygonMode) -> GLenum {
    match mode {
        PolygonMode::Fill => GL_FILL,
        PolygonMode::Line => GL_LINE,
        PolygonMode::Point => GL_POINT,
    }
}

/// Face to cull, `None` when culling is off
pub fn cull_face(mode: CullModeFlags) -> Option<GLenum> {
    if mode == CullModeFlags::FRONT_AND_BACK {
        Some(GL_FRONT_AND_BACK)
    } else if mode == CullModeFlags::FRONT {
        Some(GL_FRONT)
    } else if mode == CullModeFlags::BACK {
        Some(GL_BACK)
    } else {
        None
    }
}

pub fn front_face(face: FrontFace) -> GLenum {
    match face {
        FrontFace::CounterClockwise => GL_CCW,
        FrontFace::Clockwise => GL_CW,
    }
}

pub fn index_type(index_type: IndexType) -> GLenum {
    match index_type {
        IndexType::U16 => GL_UNSIGNED_SHORT,
        IndexType::U32 => GL_UNSIGNED_INT,
    }
}

pub fn query_target(query_type: QueryType) -> GLenum {
    match query_type {
        QueryType::Occlusion => GL_SAMPLES_PASSED,
        QueryType::PipelineStatistics => GL_PRIMITIVES_GENERATED,
        QueryType::Timestamp => GL_TIMESTAMP,
    }
}

pub fn filter(filter: Filter) -> GLenum {
    match filter {
        Filter::Nearest => GL_NEAREST,
        Filter::Linear => GL_LINEAR,
    }
}

// ===== FRAMEBUFFERS / TEXTURES =====

pub fn texture_target(target: TextureTarget) -> GLenum {
    match target {
        TextureTarget::Texture1D => GL_TEXTURE_1D,
        TextureTarget::Texture1DArray => GL_TEXTURE_1D_ARRAY,
        TextureTarget::Texture2D => GL_TEXTURE_2D,
        TextureTarget::Texture2DArray => GL_TEXTURE_2D_ARRAY,
        TextureTarget::Texture2DMultisample => GL_TEXTURE_2D_MULTISAMPLE,
        TextureTarget::Texture2DMultisampleArray => GL_TEXTURE_2D_MULTISAMPLE_ARRAY,
        TextureTarget::Texture3D => GL_TEXTURE_3D,
        TextureTarget::CubeMap => GL_TEXTURE_CUBE_MAP,
        TextureTarget::CubeMapArray => GL_TEXTURE_CUBE_MAP_ARRAY,
    }
}

/// Attachment point of a framebuffer object
pub fn attachment_point(point: AttachmentPoint) -> GLenum {
    match point {
        AttachmentPoint::Color(index) => GL_COLOR_ATTACHMENT0 + index,
        AttachmentPoint::Depth => GL_DEPTH_ATTACHMENT,
        AttachmentPoint::Stencil => GL_STENCIL_ATTACHMENT,
        AttachmentPoint::DepthStencil => GL_DEPTH_STENCIL_ATTACHMENT,
    }
}

/// Buffer name of the default framebuffer for `glDrawBuffers`/`glReadBuffer`
pub fn default_draw_buffer(point: AttachmentPoint) -> GLenum {
    match point {
        AttachmentPoint::Color(0) => GL_BACK,
        _ => GL_NONE,
    }
}

/// Buffer name of the default framebuffer for `glInvalidateFramebuffer`
pub fn default_invalidate_buffer(point: AttachmentPoint) -> GLenum {
    match point {
        AttachmentPoint::Color(_) => GL_COLOR,
        AttachmentPoint::Depth => GL_DEPTH,
        AttachmentPoint::Stencil => GL_STENCIL,
        AttachmentPoint::DepthStencil => GL_DEPTH_STENCIL_ATTACHMENT,
    }
}

pub fn blit_mask(aspects: ImageAspectFlags) -> GLbitfield {
    let mut mask = 0;
    if aspects.contains(ImageAspectFlags::COLOR) {
        mask |= GL_COLOR_BUFFER_BIT;
    }
    if aspects.contains(ImageAspectFlags::DEPTH) {
        mask |= GL_DEPTH_BUFFER_BIT;
    }
    if aspects.contains(ImageAspectFlags::STENCIL) {
        mask |= GL_STENCIL_BUFFER_BIT;
    }
    mask
}

// ===== FORMATS =====

/// Sized internal format of textures created with `format`
pub fn internal_format(format: Format) -> GLenum {
    use Format::*;
    match format {
        Undefined => GL_NONE,
        R8_UNORM => GL_R8,
        R8_SNORM => GL_R8_SNORM,
        R8_UINT => GL_R8UI,
        R8_SINT => GL_R8I,
        R8G8_UNORM => GL_RG8,
        R8G8_SNORM => GL_RG8_SNORM,
        R8G8_UINT => GL_RG8UI,
        R8G8_SINT => GL_RG8I,
        R8G8B8_UNORM => GL_RGB8,
        R8G8B8A8_UNORM | B8G8R8A8_UNORM => GL_RGBA8,
        R8G8B8A8_SNORM => GL_RGBA8_SNORM,
        R8G8B8A8_UINT => GL_RGBA8UI,
        R8G8B8A8_SINT => GL_RGBA8I,
        R8G8B8A8_SRGB | B8G8R8A8_SRGB => GL_SRGB8_ALPHA8,
        A2B10G10R10_UNORM_PACK32 => GL_RGB10_A2,
        B10G11R11_UFLOAT_PACK32 => GL_R11F_G11F_B10F,
        R16_UNORM => GL_R16,
        R16_UINT => GL_R16UI,
        R16_SINT => GL_R16I,
        R16_SFLOAT => GL_R16F,
        R16G16_UNORM => GL_RG16,
        R16G16_SFLOAT => GL_RG16F,
        R16G16B16A16_UNORM => GL_RGBA16,
        R16G16B16A16_UINT => GL_RGBA16UI,
        R16G16B16A16_SFLOAT => GL_RGBA16F,
        R32_UINT => GL_R32UI,
        R32_SINT => GL_R32I,
        R32_SFLOAT => GL_R32F,
        R32G32_UINT => GL_RG32UI,
        R32G32_SINT => GL_RG32I,
        R32G32_SFLOAT => GL_RG32F,
        R32G32B32_UINT => GL_RGB32UI,
        R32G32B32_SINT => GL_RGB32I,
        R32G32B32_SFLOAT => GL_RGB32F,
        R32G32B32A32_UINT => GL_RGBA32UI,
        R32G32B32A32_SINT => GL_RGBA32I,
        R32G32B32A32_SFLOAT => GL_RGBA32F,
        D16_UNORM => GL_DEPTH_COMPONENT16,
        X8_D24_UNORM_PACK32 => GL_DEPTH_COMPONENT24,
        D32_SFLOAT => GL_DEPTH_COMPONENT32F,
        S8_UINT => GL_STENCIL_INDEX8,
        // No 16-bit depth with stencil in GL
        D16_UNORM_S8_UINT | D24_UNORM_S8_UINT => GL_DEPTH24_STENCIL8,
        D32_SFLOAT_S8_UINT => GL_DEPTH32F_STENCIL8,
        BC1_RGBA_UNORM_BLOCK => GL_COMPRESSED_RGBA_S3TC_DXT1_EXT,
        BC1_RGBA_SRGB_BLOCK => GL_COMPRESSED_SRGB_ALPHA_S3TC_DXT1_EXT,
        BC3_UNORM_BLOCK => GL_COMPRESSED_RGBA_S3TC_DXT5_EXT,
        BC3_SRGB_BLOCK => GL_COMPRESSED_SRGB_ALPHA_S3TC_DXT5_EXT,
    }
}

/// Client-side `(format, type)` pair for pixel transfers of `format`
pub fn transfer_format(format: Format) -> (GLenum, GLenum) {
    use Format::*;
    match format {
        Undefined | BC1_RGBA_UNORM_BLOCK | BC1_RGBA_SRGB_BLOCK | BC3_UNORM_BLOCK | BC3_SRGB_BLOCK => {
            (GL_NONE, GL_NONE)
        }
        R8_UNORM => (GL_RED, GL_UNSIGNED_BYTE),
        R8_SNORM => (GL_RED, GL_BYTE),
        R8_UINT => (GL_RED_INTEGER, GL_UNSIGNED_BYTE),
        R8_SINT => (GL_RED_INTEGER, GL_BYTE),
        R8G8_UNORM => (GL_RG, GL_UNSIGNED_BYTE),
        R8G8_SNORM => (GL_RG, GL_BYTE),
        R8G8_UINT => (GL_RG_INTEGER, GL_UNSIGNED_BYTE),
        R8G8_SINT => (GL_RG_INTEGER, GL_BYTE),
        R8G8B8_UNORM => (GL_RGB, GL_UNSIGNED_BYTE),
        R8G8B8A8_UNORM | R8G8B8A8_SRGB => (GL_RGBA, GL_UNSIGNED_BYTE),
        R8G8B8A8_SNORM => (GL_RGBA, GL_BYTE),
        R8G8B8A8_UINT => (GL_RGBA_INTEGER, GL_UNSIGNED_BYTE),
        R8G8B8A8_SINT => (GL_RGBA_INTEGER, GL_BYTE),
        B8G8R8A8_UNORM | B8G8R8A8_SRGB => (GL_BGRA, GL_UNSIGNED_BYTE),
        A2B10G10R10_UNORM_PACK32 => (GL_RGBA, GL_UNSIGNED_INT_2_10_10_10_REV),
        B10G11R11_UFLOAT_PACK32 => (GL_RGB, GL_UNSIGNED_INT_10F_11F_11F_REV),
        R16_UNORM => (GL_RED, GL_UNSIGNED_SHORT),
        R16_UINT => (GL_RED_INTEGER, GL_UNSIGNED_SHORT),
        R16_SINT => (GL_RED_INTEGER, GL_SHORT),
        R16_SFLOAT => (GL_RED, GL_HALF_FLOAT),
        R16G16_UNORM => (GL_RG, GL_UNSIGNED_SHORT),
        R16G16_SFLOAT => (GL_RG, GL_HALF_FLOAT),
        R16G16B16A16_UNORM => (GL_RGBA, GL_UNSIGNED_SHORT),
        R16G16B16A16_UINT => (GL_RGBA_INTEGER, GL_UNSIGNED_SHORT),
        R16G16B16A16_SFLOAT => (GL_RGBA, GL_HALF_FLOAT),
        R32_UINT => (GL_RED_INTEGER, GL_UNSIGNED_INT),
        R32_SINT => (GL_RED_INTEGER, GL_INT),
        R32_SFLOAT => (GL_RED, GL_FLOAT),
        R32G32_UINT => (GL_RG_INTEGER, GL_UNSIGNED_INT),
        R32G32_SINT => (GL_RG_INTEGER, GL_INT),
        R32G32_SFLOAT => (GL_RG, GL_FLOAT),
        R32G32B32_UINT => (GL_RGB_INTEGER, GL_UNSIGNED_INT),
        R32G32B32_SINT => (GL_RGB_INTEGER, GL_INT),
        R32G32B32_SFLOAT => (GL_RGB, GL_FLOAT),
        R32G32B32A32_UINT => (GL_RGBA_INTEGER, GL_UNSIGNED_INT),
        R32G32B32A32_SINT => (GL_RGBA_INTEGER, GL_INT),
        R32G32B32A32_SFLOAT => (GL_RGBA, GL_FLOAT),
        D16_UNORM => (GL_DEPTH_COMPONENT, GL_UNSIGNED_SHORT),
        X8_D24_UNORM_PACK32 => (GL_DEPTH_COMPONENT, GL_UNSIGNED_INT),
        D32_SFLOAT => (GL_DEPTH_COMPONENT, GL_FLOAT),
        S8_UINT => (GL_STENCIL_INDEX, GL_UNSIGNED_BYTE),
        D16_UNORM_S8_UINT | D24_UNORM_S8_UINT => (GL_DEPTH_STENCIL, GL_UNSIGNED_INT_24_8),
        D32_SFLOAT_S8_UINT => (GL_DEPTH_STENCIL, GL_FLOAT_32_UNSIGNED_INT_24_8_REV),
    }
}

/// How a vertex attribute of `format` is specified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribFormat {
    /// Component count, or `GL_BGRA` for swizzled 4-component data
    pub size: GLint,
    pub data_type: GLenum,
    pub normalized: bool,
    /// Fetched with `glVertexAttribIFormat`
    pub integer: bool,
}

/// Vertex fetch description, `None` for formats GL cannot fetch
pub fn vertex_attrib_format(format: Format) -> Option<VertexAttribFormat> {
    use Format::*;
    let (data_type, normalized, integer) = match format {
        R8_UNORM | R8G8_UNORM | R8G8B8_UNORM | R8G8B8A8_UNORM | B8G8R8A8_UNORM => (GL_UNSIGNED_BYTE, true, false),
        R8_SNORM | R8G8_SNORM | R8G8B8A8_SNORM => (GL_BYTE, true, false),
        R8_UINT | R8G8_UINT | R8G8B8A8_UINT => (GL_UNSIGNED_BYTE, false, true),
        R8_SINT | R8G8_SINT | R8G8B8A8_SINT => (GL_BYTE, false, true),
        A2B10G10R10_UNORM_PACK32 => (GL_UNSIGNED_INT_2_10_10_10_REV, true, false),
        R16_UNORM | R16G16_UNORM | R16G16B16A16_UNORM => (GL_UNSIGNED_SHORT, true, false),
        R16_UINT | R16G16B16A16_UINT => (GL_UNSIGNED_SHORT, false, true),
        R16_SINT => (GL_SHORT, false, true),
        R16_SFLOAT | R16G16_SFLOAT | R16G16B16A16_SFLOAT => (GL_HALF_FLOAT, false, false),
        R32_UINT | R32G32_UINT | R32G32B32_UINT | R32G32B32A32_UINT => (GL_UNSIGNED_INT, false, true),
        R32_SINT | R32G32_SINT | R32G32B32_SINT | R32G32B32A32_SINT => (GL_INT, false, true),
        R32_SFLOAT | R32G32_SFLOAT | R32G32B32_SFLOAT | R32G32B32A32_SFLOAT => (GL_FLOAT, false, false),
        _ => return None,
    };
    let size = if format == B8G8R8A8_UNORM {
        GL_BGRA as GLint
    } else {
        format.component_count() as GLint
    };
    Some(VertexAttribFormat { size, data_type, normalized, integer })
}

/// `(format, type, data)` for `glClearTexSubImage` of a `format` texture
pub fn clear_tex_data(format: Format, value: &ClearValue) -> (GLenum, GLenum, Vec<u8>) {
    match value {
        ClearValue::Color(ClearColorValue::Float32(color)) => {
            (GL_RGBA, GL_FLOAT, bytemuck::cast_slice(color).to_vec())
        }
        ClearValue::Color(ClearColorValue::Int32(color)) => {
            (GL_RGBA_INTEGER, GL_INT, bytemuck::cast_slice(color).to_vec())
        }
        ClearValue::Color(ClearColorValue::Uint32(color)) => {
            (GL_RGBA_INTEGER, GL_UNSIGNED_INT, bytemuck::cast_slice(color).to_vec())
        }
        ClearValue::DepthStencil(depth_stencil) => match (format.has_depth(), format.has_stencil()) {
            (true, true) => {
                // FLOAT_32_UNSIGNED_INT_24_8_REV: depth float, then stencil in the low byte
                let mut data = depth_stencil.depth.to_ne_bytes().to_vec();
                data.extend_from_slice(&(depth_stencil.stencil & 0xFF).to_ne_bytes());
                (GL_DEPTH_STENCIL, GL_FLOAT_32_UNSIGNED_INT_24_8_REV, data)
            }
            (false, true) => (GL_STENCIL_INDEX, GL_UNSIGNED_INT, depth_stencil.stencil.to_ne_bytes().to_vec()),
            _ => (GL_DEPTH_COMPONENT, GL_FLOAT, depth_stencil.depth.to_ne_bytes().to_vec()),
        },
    }
}

#[cfg(test)]
#[path = "gl_conversions_tests.rs"]
mod tests;
