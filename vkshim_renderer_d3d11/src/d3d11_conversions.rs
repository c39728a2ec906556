/// Mappings from vkshim enums and states to D3D11 descriptors

use vkshim_core::backend::{FboAttachment, FboTarget, TextureRef, TextureTarget};
use vkshim_core::command::ClearColorValue;
use vkshim_core::resource::{self as api, ColorComponentFlags, CullModeFlags, Format, IndexType, QueryType};
use crate::d3d11_types::*;

// ===== PIPELINE STATE =====

/// D3D11 has one blend factor register, so the constant color and constant
/// alpha factors share it.
pub fn blend(factor: api::BlendFactor) -> Blend {
    use api::BlendFactor::*;
    match factor {
        Zero => Blend::Zero,
        One => Blend::One,
        SrcColor => Blend::SrcColor,
        OneMinusSrcColor => Blend::InvSrcColor,
        DstColor => Blend::DestColor,
        OneMinusDstColor => Blend::InvDestColor,
        SrcAlpha => Blend::SrcAlpha,
        OneMinusSrcAlpha => Blend::InvSrcAlpha,
        DstAlpha => Blend::DestAlpha,
        OneMinusDstAlpha => Blend::InvDestAlpha,
        ConstantColor | ConstantAlpha => Blend::BlendFactor,
        OneMinusConstantColor | OneMinusConstantAlpha => Blend::InvBlendFactor,
        SrcAlphaSaturate => Blend::SrcAlphaSat,
        Src1Color => Blend::Src1Color,
        OneMinusSrc1Color => Blend::InvSrc1Color,
        Src1Alpha => Blend::Src1Alpha,
        OneMinusSrc1Alpha => Blend::InvSrc1Alpha,
    }
}

/// Factor allowed in the alpha slots, where D3D11 rejects color factors
pub fn blend_alpha(factor: api::BlendFactor) -> Blend {
    match blend(factor) {
        Blend::SrcColor => Blend::SrcAlpha,
        Blend::InvSrcColor => Blend::InvSrcAlpha,
        Blend::DestColor => Blend::DestAlpha,
        Blend::InvDestColor => Blend::InvDestAlpha,
        Blend::Src1Color => Blend::Src1Alpha,
        Blend::InvSrc1Color => Blend::InvSrc1Alpha,
        other => other,
    }
}

pub fn blend_op(op: api::BlendOp) -> BlendOp {
    match op {
        api::BlendOp::Add => BlendOp::Add,
        api::BlendOp::Subtract => BlendOp::Subtract,
        api::BlendOp::ReverseSubtract => BlendOp::RevSubtract,
        api::BlendOp::Min => BlendOp::Min,
        api::BlendOp::Max => BlendOp::Max,
    }
}

pub fn logic_op(op: api::LogicOp) -> LogicOp {
    use api::LogicOp::*;
    match op {
        Clear => LogicOp::Clear,
        And => LogicOp::And,
        AndReverse => LogicOp::AndReverse,
        Copy => LogicOp::Copy,
        AndInverted => LogicOp::AndInverted,
        NoOp => LogicOp::Noop,
        Xor => LogicOp::Xor,
        Or => LogicOp::Or,
        Nor => LogicOp::Nor,
        Equivalent => LogicOp::Equiv,
        Invert => LogicOp::Invert,
        OrReverse => LogicOp::OrReverse,
        CopyInverted => LogicOp::CopyInverted,
        OrInverted => LogicOp::OrInverted,
        Nand => LogicOp::Nand,
        Set => LogicOp::Set,
    }
}

pub fn color_write_mask(mask: ColorComponentFlags) -> ColorWriteEnable {
    let mut enable = ColorWriteEnable::empty();
    if mask.contains(ColorComponentFlags::R) {
        enable |= ColorWriteEnable::RED;
    }
    if mask.contains(ColorComponentFlags::G) {
        enable |= ColorWriteEnable::GREEN;
    }
    if mask.contains(ColorComponentFlags::B) {
        enable |= ColorWriteEnable::BLUE;
    }
    if mask.contains(ColorComponentFlags::A) {
        enable |= ColorWriteEnable::ALPHA;
    }
    enable
}

pub fn comparison_func(op: api::CompareOp) -> ComparisonFunc {
    use api::CompareOp::*;
    match op {
        Never => ComparisonFunc::Never,
        Less => ComparisonFunc::Less,
        Equal => ComparisonFunc::Equal,
        LessOrEqual => ComparisonFunc::LessEqual,
        Greater => ComparisonFunc::Greater,
        NotEqual => ComparisonFunc::NotEqual,
        GreaterOrEqual => ComparisonFunc::GreaterEqual,
        Always => ComparisonFunc::Always,
    }
}

pub fn stencil_op(op: api::StencilOp) -> StencilOp {
    use api::StencilOp::*;
    match op {
        Keep => StencilOp::Keep,
        Zero => StencilOp::Zero,
        Replace => StencilOp::Replace,
        IncrementAndClamp => StencilOp::IncrSat,
        DecrementAndClamp => StencilOp::DecrSat,
        Invert => StencilOp::Invert,
        IncrementAndWrap => StencilOp::Incr,
        DecrementAndWrap => StencilOp::Decr,
    }
}

/// Points have no fill mode of their own; they rasterize as wireframe.
pub fn fill_mode(mode: api::PolygonMode) -> FillMode {
    match mode {
        api::PolygonMode::Fill => FillMode::Solid,
        api::PolygonMode::Line | api::PolygonMode::Point => FillMode::Wireframe,
    }
}

/// Cull mode, `None` for front-and-back which D3D11 cannot express
pub fn cull_mode(mode: CullModeFlags) -> Option<CullMode> {
    if mode == CullModeFlags::FRONT_AND_BACK {
        None
    } else if mode == CullModeFlags::FRONT {
        Some(CullMode::Front)
    } else if mode == CullModeFlags::BACK {
        Some(CullMode::Back)
    } else {
        Some(CullMode::None)
    }
}

/// Native topology, `None` for triangle fans
///
/// Patch lists take the control point count set by the pipeline.
pub fn primitive_topology(topology: api::PrimitiveTopology, patch_control_points: u32) -> Option<PrimitiveTopology> {
    use api::PrimitiveTopology::*;
    let topology = match topology {
        PointList => PrimitiveTopology::POINTLIST,
        LineList => PrimitiveTopology::LINELIST,
        LineStrip => PrimitiveTopology::LINESTRIP,
        TriangleList => PrimitiveTopology::TRIANGLELIST,
        TriangleStrip => PrimitiveTopology::TRIANGLESTRIP,
        TriangleFan => return None,
        LineListWithAdjacency => PrimitiveTopology::LINELIST_ADJ,
        LineStripWithAdjacency => PrimitiveTopology::LINESTRIP_ADJ,
        TriangleListWithAdjacency => PrimitiveTopology::TRIANGLELIST_ADJ,
        TriangleStripWithAdjacency => PrimitiveTopology::TRIANGLESTRIP_ADJ,
        PatchList => PrimitiveTopology::patch_list(patch_control_points),
    };
    Some(topology)
}

pub fn viewport(viewport: &api::Viewport) -> Viewport {
    Viewport {
        top_left_x: viewport.x,
        top_left_y: viewport.y,
        width: viewport.width,
        height: viewport.height,
        min_depth: viewport.min_depth,
        max_depth: viewport.max_depth,
    }
}

pub fn rect(rect: &api::Rect2D) -> Rect {
    Rect {
        left: rect.x,
        top: rect.y,
        right: rect.x.saturating_add(rect.width as i32),
        bottom: rect.y.saturating_add(rect.height as i32),
    }
}

pub fn index_format(index_type: IndexType) -> DxgiFormat {
    match index_type {
        IndexType::U16 => DxgiFormat::R16_UINT,
        IndexType::U32 => DxgiFormat::R32_UINT,
    }
}

pub fn query_kind(query_type: QueryType) -> QueryKind {
    match query_type {
        QueryType::Occlusion => QueryKind::Occlusion,
        QueryType::PipelineStatistics => QueryKind::PipelineStatistics,
        QueryType::Timestamp => QueryKind::Timestamp,
    }
}

/// Clear color as `ClearRenderTargetView` takes it; integer targets convert
/// the floats back on write.
pub fn clear_color(value: &ClearColorValue) -> [f32; 4] {
    match value {
        ClearColorValue::Float32(color) => *color,
        ClearColorValue::Int32(color) => color.map(|channel| channel as f32),
        ClearColorValue::Uint32(color) => color.map(|channel| channel as f32),
    }
}

// ===== FORMATS =====

/// Texture and view format; `UNKNOWN` for formats without a DXGI equivalent
pub fn dxgi_format(format: Format) -> DxgiFormat {
    use Format::*;
    match format {
        Undefined | R8G8B8_UNORM => DxgiFormat::UNKNOWN,
        R8_UNORM => DxgiFormat::R8_UNORM,
        R8_SNORM => DxgiFormat::R8_SNORM,
        R8_UINT => DxgiFormat::R8_UINT,
        R8_SINT => DxgiFormat::R8_SINT,
        R8G8_UNORM => DxgiFormat::R8G8_UNORM,
        R8G8_SNORM => DxgiFormat::R8G8_SNORM,
        R8G8_UINT => DxgiFormat::R8G8_UINT,
        R8G8_SINT => DxgiFormat::R8G8_SINT,
        R8G8B8A8_UNORM => DxgiFormat::R8G8B8A8_UNORM,
        R8G8B8A8_SNORM => DxgiFormat::R8G8B8A8_SNORM,
        R8G8B8A8_UINT => DxgiFormat::R8G8B8A8_UINT,
        R8G8B8A8_SINT => DxgiFormat::R8G8B8A8_SINT,
        R8G8B8A8_SRGB => DxgiFormat::R8G8B8A8_UNORM_SRGB,
        B8G8R8A8_UNORM => DxgiFormat::B8G8R8A8_UNORM,
        B8G8R8A8_SRGB => DxgiFormat::B8G8R8A8_UNORM_SRGB,
        A2B10G10R10_UNORM_PACK32 => DxgiFormat::R10G10B10A2_UNORM,
        B10G11R11_UFLOAT_PACK32 => DxgiFormat::R11G11B10_FLOAT,
        R16_UNORM => DxgiFormat::R16_UNORM,
        R16_UINT => DxgiFormat::R16_UINT,
        R16_SINT => DxgiFormat::R16_SINT,
        R16_SFLOAT => DxgiFormat::R16_FLOAT,
        R16G16_UNORM => DxgiFormat::R16G16_UNORM,
        R16G16_SFLOAT => DxgiFormat::R16G16_FLOAT,
        R16G16B16A16_UNORM => DxgiFormat::R16G16B16A16_UNORM,
        R16G16B16A16_UINT => DxgiFormat::R16G16B16A16_UINT,
        R16G16B16A16_SFLOAT => DxgiFormat::R16G16B16A16_FLOAT,
        R32_UINT => DxgiFormat::R32_UINT,
        R32_SINT => DxgiFormat::R32_SINT,
        R32_SFLOAT => DxgiFormat::R32_FLOAT,
        R32G32_UINT => DxgiFormat::R32G32_UINT,
        R32G32_SINT => DxgiFormat::R32G32_SINT,
        R32G32_SFLOAT => DxgiFormat::R32G32_FLOAT,
        R32G32B32_UINT => DxgiFormat::R32G32B32_UINT,
        R32G32B32_SINT => DxgiFormat::R32G32B32_SINT,
        R32G32B32_SFLOAT => DxgiFormat::R32G32B32_FLOAT,
        R32G32B32A32_UINT => DxgiFormat::R32G32B32A32_UINT,
        R32G32B32A32_SINT => DxgiFormat::R32G32B32A32_SINT,
        R32G32B32A32_SFLOAT => DxgiFormat::R32G32B32A32_FLOAT,
        D16_UNORM => DxgiFormat::D16_UNORM,
        D32_SFLOAT => DxgiFormat::D32_FLOAT,
        // No stencil-only or 16-bit depth with stencil formats in DXGI
        X8_D24_UNORM_PACK32 | S8_UINT | D16_UNORM_S8_UINT | D24_UNORM_S8_UINT => DxgiFormat::D24_UNORM_S8_UINT,
        D32_SFLOAT_S8_UINT => DxgiFormat::D32_FLOAT_S8X24_UINT,
        BC1_RGBA_UNORM_BLOCK => DxgiFormat::BC1_UNORM,
        BC1_RGBA_SRGB_BLOCK => DxgiFormat::BC1_UNORM_SRGB,
        BC3_UNORM_BLOCK => DxgiFormat::BC3_UNORM,
        BC3_SRGB_BLOCK => DxgiFormat::BC3_UNORM_SRGB,
    }
}

/// Format of a shader resource view; depth formats read their depth channel
pub fn shader_resource_format(format: Format) -> DxgiFormat {
    match dxgi_format(format) {
        DxgiFormat::D16_UNORM => DxgiFormat::R16_UNORM,
        DxgiFormat::D32_FLOAT => DxgiFormat::R32_FLOAT,
        DxgiFormat::D24_UNORM_S8_UINT if format == Format::S8_UINT => DxgiFormat::X24_TYPELESS_G8_UINT,
        DxgiFormat::D24_UNORM_S8_UINT => DxgiFormat::R24_UNORM_X8_TYPELESS,
        DxgiFormat::D32_FLOAT_S8X24_UINT => DxgiFormat::R32_FLOAT_X8X24_TYPELESS,
        other => other,
    }
}

/// Input element format, `None` for formats the input assembler cannot fetch
pub fn vertex_format(format: Format) -> Option<DxgiFormat> {
    if format.is_depth_or_stencil() || format.is_compressed() || format.is_srgb() {
        return None;
    }
    match dxgi_format(format) {
        DxgiFormat::UNKNOWN => None,
        dxgi => Some(dxgi),
    }
}

// ===== VIEWS =====

/// Render target or depth-stencil view of one framebuffer attachment
pub fn attachment_view(attachment: &FboAttachment) -> AttachmentViewDesc {
    let layered = |dimension, layer| (dimension, layer, 1);
    let (dimension, first_array_slice, array_size) = match attachment.target {
        FboTarget::Texture1D => (ViewDimension::Texture1D, 0, 1),
        FboTarget::Texture2D => (ViewDimension::Texture2D, 0, 1),
        FboTarget::Texture2DMultisample => (ViewDimension::Texture2DMs, 0, 1),
        FboTarget::ArrayLayer(layer) if attachment.texture.target == TextureTarget::Texture1DArray => {
            layered(ViewDimension::Texture1DArray, layer)
        }
        // Cube faces attach as slices of a 2D array
        FboTarget::ArrayLayer(layer) | FboTarget::CubeFace(layer) => layered(ViewDimension::Texture2DArray, layer),
        FboTarget::MultisampleArrayLayer(layer) => layered(ViewDimension::Texture2DMsArray, layer),
        FboTarget::Texture3DSlice(slice) => layered(ViewDimension::Texture3D, slice),
    };
    let multisampled = matches!(dimension, ViewDimension::Texture2DMs | ViewDimension::Texture2DMsArray);
    AttachmentViewDesc {
        format: dxgi_format(attachment.texture.format),
        dimension,
        mip_slice: if multisampled { 0 } else { attachment.mip_level },
        first_array_slice,
        array_size,
    }
}

/// View covering `layers` of one level of `texture`, as used for texture
/// clears and storage images
pub fn level_view(texture: &TextureRef, level: u32, base_layer: u32, layers: u32) -> AttachmentViewDesc {
    let dimension = match texture.target {
        TextureTarget::Texture1D => ViewDimension::Texture1D,
        TextureTarget::Texture1DArray => ViewDimension::Texture1DArray,
        TextureTarget::Texture2D => ViewDimension::Texture2D,
        TextureTarget::Texture2DMultisample => ViewDimension::Texture2DMs,
        TextureTarget::Texture2DMultisampleArray => ViewDimension::Texture2DMsArray,
        TextureTarget::Texture3D => ViewDimension::Texture3D,
        TextureTarget::Texture2DArray | TextureTarget::CubeMap | TextureTarget::CubeMapArray => {
            ViewDimension::Texture2DArray
        }
    };
    let (first_array_slice, array_size) = match dimension {
        ViewDimension::Texture1D | ViewDimension::Texture2D | ViewDimension::Texture2DMs => (0, 1),
        ViewDimension::Texture3D => (0, (texture.extent.z >> level).max(1)),
        _ => (base_layer, layers.max(1)),
    };
    AttachmentViewDesc {
        format: dxgi_format(texture.format),
        dimension,
        mip_slice: level,
        first_array_slice,
        array_size,
    }
}

/// Shader resource view of a sampled texture
///
/// `array_layers` is the texture's total layer count (six per cube).
pub fn shader_resource_view(
    texture: &TextureRef,
    format: Format,
    base_level: u32,
    level_count: u32,
    array_layers: u32,
) -> ShaderResourceViewDesc {
    let (dimension, array_size) = match texture.target {
        TextureTarget::Texture1D => (ViewDimension::Texture1D, 1),
        TextureTarget::Texture1DArray => (ViewDimension::Texture1DArray, array_layers),
        TextureTarget::Texture2D => (ViewDimension::Texture2D, 1),
        TextureTarget::Texture2DArray => (ViewDimension::Texture2DArray, array_layers),
        TextureTarget::Texture2DMultisample => (ViewDimension::Texture2DMs, 1),
        TextureTarget::Texture2DMultisampleArray => (ViewDimension::Texture2DMsArray, array_layers),
        TextureTarget::Texture3D => (ViewDimension::Texture3D, 1),
        TextureTarget::CubeMap => (ViewDimension::TextureCube, 1),
        TextureTarget::CubeMapArray => (ViewDimension::TextureCubeArray, (array_layers / 6).max(1)),
    };
    let multisampled = matches!(dimension, ViewDimension::Texture2DMs | ViewDimension::Texture2DMsArray);
    ShaderResourceViewDesc {
        format: shader_resource_format(format),
        dimension,
        most_detailed_mip: if multisampled { 0 } else { base_level },
        mip_levels: if multisampled { 1 } else { level_count.max(1) },
        first_array_slice: 0,
        array_size: array_size.max(1),
    }
}

/// `D3D11CalcSubresource`
pub fn subresource(mip_level: u32, array_slice: u32, mip_levels: u32) -> u32 {
    mip_level + array_slice * mip_levels
}

/// Array slice addressed by an attachment; 3D slices address depth instead
pub fn attachment_slice(target: FboTarget) -> u32 {
    match target {
        FboTarget::ArrayLayer(layer) | FboTarget::MultisampleArrayLayer(layer) | FboTarget::CubeFace(layer) => layer,
        FboTarget::Texture1D | FboTarget::Texture2D | FboTarget::Texture2DMultisample | FboTarget::Texture3DSlice(_) => 0,
    }
}

#[cfg(test)]
#[path = "d3d11_conversions_tests.rs"]
mod tests;
