//! Unit tests for D3D11 conversions
//!
//! Pure mappings, no device required.

use super::*;
use vkshim_core::glam::UVec3;
use vkshim_core::backend::AttachmentPoint;
use vkshim_core::resource::{NativeHandle, ObjectId};

fn texture(target: TextureTarget, format: Format, extent: UVec3) -> TextureRef {
    TextureRef { id: ObjectId::next(), handle: NativeHandle(7), target, format, extent }
}

// ============================================================================
// PIPELINE STATE
// ============================================================================

#[test]
fn test_blend_factors_use_native_values() {
    assert_eq!(blend(api::BlendFactor::Zero) as u32, 1);
    assert_eq!(blend(api::BlendFactor::OneMinusSrcAlpha) as u32, 6);
    assert_eq!(blend(api::BlendFactor::Src1Alpha) as u32, 18);
    // Constant alpha shares the single blend factor register
    assert_eq!(blend(api::BlendFactor::ConstantAlpha), Blend::BlendFactor);
    assert_eq!(blend(api::BlendFactor::OneMinusConstantColor), Blend::InvBlendFactor);
}

#[test]
fn test_alpha_slots_never_take_color_factors() {
    assert_eq!(blend_alpha(api::BlendFactor::SrcColor), Blend::SrcAlpha);
    assert_eq!(blend_alpha(api::BlendFactor::OneMinusDstColor), Blend::InvDestAlpha);
    assert_eq!(blend_alpha(api::BlendFactor::Src1Color), Blend::Src1Alpha);
    assert_eq!(blend_alpha(api::BlendFactor::One), Blend::One);
}

#[test]
fn test_compare_ops_follow_native_order() {
    let ops = [
        api::CompareOp::Never,
        api::CompareOp::Less,
        api::CompareOp::Equal,
        api::CompareOp::LessOrEqual,
        api::CompareOp::Greater,
        api::CompareOp::NotEqual,
        api::CompareOp::GreaterOrEqual,
        api::CompareOp::Always,
    ];
    for (index, op) in ops.into_iter().enumerate() {
        assert_eq!(comparison_func(op) as u32, index as u32 + 1);
    }
}

#[test]
fn test_stencil_wrap_and_clamp() {
    assert_eq!(stencil_op(api::StencilOp::IncrementAndClamp), StencilOp::IncrSat);
    assert_eq!(stencil_op(api::StencilOp::IncrementAndWrap), StencilOp::Incr);
    assert_eq!(stencil_op(api::StencilOp::DecrementAndWrap) as u32, 8);
}

#[test]
fn test_logic_ops() {
    assert_eq!(logic_op(api::LogicOp::Clear) as u32, 0);
    assert_eq!(logic_op(api::LogicOp::Set) as u32, 1);
    assert_eq!(logic_op(api::LogicOp::Xor), LogicOp::Xor);
    assert_eq!(logic_op(api::LogicOp::Equivalent), LogicOp::Equiv);
}

#[test]
fn test_rasterizer_modes() {
    assert_eq!(fill_mode(api::PolygonMode::Fill), FillMode::Solid);
    assert_eq!(fill_mode(api::PolygonMode::Point), FillMode::Wireframe);
    assert_eq!(cull_mode(CullModeFlags::empty()), Some(CullMode::None));
    assert_eq!(cull_mode(CullModeFlags::BACK), Some(CullMode::Back));
    assert_eq!(cull_mode(CullModeFlags::FRONT_AND_BACK), None);
}

#[test]
fn test_color_write_mask() {
    assert_eq!(color_write_mask(ColorComponentFlags::all()), ColorWriteEnable::all());
    assert_eq!(
        color_write_mask(ColorComponentFlags::R | ColorComponentFlags::A),
        ColorWriteEnable::RED | ColorWriteEnable::ALPHA
    );
}

// ============================================================================
// INPUT ASSEMBLY
// ============================================================================

#[test]
fn test_topologies() {
    assert_eq!(primitive_topology(api::PrimitiveTopology::TriangleList, 0), Some(PrimitiveTopology::TRIANGLELIST));
    assert_eq!(
        primitive_topology(api::PrimitiveTopology::TriangleStripWithAdjacency, 0),
        Some(PrimitiveTopology(13))
    );
    assert_eq!(primitive_topology(api::PrimitiveTopology::TriangleFan, 0), None);
}

#[test]
fn test_patch_lists_carry_control_points() {
    assert_eq!(primitive_topology(api::PrimitiveTopology::PatchList, 3), Some(PrimitiveTopology(35)));
    assert_eq!(PrimitiveTopology::patch_list(1), PrimitiveTopology(33));
    assert_eq!(PrimitiveTopology::patch_list(32), PrimitiveTopology(64));
    // Out-of-range counts clamp
    assert_eq!(PrimitiveTopology::patch_list(0), PrimitiveTopology(33));
    assert_eq!(PrimitiveTopology::patch_list(40), PrimitiveTopology(64));
}

#[test]
fn test_index_formats() {
    assert_eq!(index_format(IndexType::U16), DxgiFormat::R16_UINT);
    assert_eq!(index_format(IndexType::U32), DxgiFormat::R32_UINT);
}

#[test]
fn test_scissor_rect_uses_edges() {
    let converted = rect(&api::Rect2D::new(10, 20, 100, 50));
    assert_eq!(converted, Rect { left: 10, top: 20, right: 110, bottom: 70 });
}

#[test]
fn test_viewport_keeps_top_left_origin() {
    let converted = viewport(&api::Viewport { x: 4.0, y: 8.0, width: 64.0, height: 32.0, min_depth: 0.25, max_depth: 0.75 });
    assert_eq!(converted.top_left_y, 8.0);
    assert_eq!(converted.height, 32.0);
    assert_eq!(converted.min_depth, 0.25);
}

// ============================================================================
// FORMATS
// ============================================================================

#[test]
fn test_formats() {
    assert_eq!(dxgi_format(Format::R8G8B8A8_SRGB), DxgiFormat::R8G8B8A8_UNORM_SRGB);
    assert_eq!(dxgi_format(Format::A2B10G10R10_UNORM_PACK32), DxgiFormat::R10G10B10A2_UNORM);
    assert_eq!(dxgi_format(Format::D16_UNORM_S8_UINT), DxgiFormat::D24_UNORM_S8_UINT);
    assert_eq!(dxgi_format(Format::R8G8B8_UNORM), DxgiFormat::UNKNOWN);
}

#[test]
fn test_depth_formats_sample_through_typeless_views() {
    assert_eq!(shader_resource_format(Format::D32_SFLOAT), DxgiFormat::R32_FLOAT);
    assert_eq!(shader_resource_format(Format::D24_UNORM_S8_UINT), DxgiFormat::R24_UNORM_X8_TYPELESS);
    assert_eq!(shader_resource_format(Format::S8_UINT), DxgiFormat::X24_TYPELESS_G8_UINT);
    assert_eq!(shader_resource_format(Format::R8G8B8A8_UNORM), DxgiFormat::R8G8B8A8_UNORM);
}

#[test]
fn test_vertex_formats() {
    assert_eq!(vertex_format(Format::R32G32B32_SFLOAT), Some(DxgiFormat::R32G32B32_FLOAT));
    assert_eq!(vertex_format(Format::B8G8R8A8_UNORM), Some(DxgiFormat::B8G8R8A8_UNORM));
    assert_eq!(vertex_format(Format::R8G8B8_UNORM), None);
    assert_eq!(vertex_format(Format::D32_SFLOAT), None);
    assert_eq!(vertex_format(Format::BC1_RGBA_UNORM_BLOCK), None);
}

#[test]
fn test_integer_clear_colors_convert_to_float() {
    assert_eq!(clear_color(&ClearColorValue::Uint32([1, 2, 3, 4])), [1.0, 2.0, 3.0, 4.0]);
    assert_eq!(clear_color(&ClearColorValue::Int32([-1, 0, 0, 1])), [-1.0, 0.0, 0.0, 1.0]);
}

// ============================================================================
// VIEWS
// ============================================================================

#[test]
fn test_cube_face_attaches_as_array_slice() {
    let cube = texture(TextureTarget::CubeMap, Format::R8G8B8A8_UNORM, UVec3::new(32, 32, 1));
    let view = attachment_view(&FboAttachment {
        point: AttachmentPoint::Color(0),
        texture: cube,
        target: FboTarget::CubeFace(4),
        mip_level: 2,
    });
    assert_eq!(view.dimension, ViewDimension::Texture2DArray);
    assert_eq!((view.mip_slice, view.first_array_slice, view.array_size), (2, 4, 1));
    assert_eq!(attachment_slice(FboTarget::CubeFace(4)), 4);
}

#[test]
fn test_one_dimensional_array_layer_view() {
    let lines = texture(TextureTarget::Texture1DArray, Format::R32_SFLOAT, UVec3::new(256, 1, 1));
    let view = attachment_view(&FboAttachment {
        point: AttachmentPoint::Color(1),
        texture: lines,
        target: FboTarget::ArrayLayer(3),
        mip_level: 0,
    });
    assert_eq!(view.dimension, ViewDimension::Texture1DArray);
    assert_eq!(view.first_array_slice, 3);
}

#[test]
fn test_multisample_views_ignore_mip_level() {
    let target = texture(TextureTarget::Texture2DMultisample, Format::D32_SFLOAT, UVec3::new(64, 64, 1));
    let view = attachment_view(&FboAttachment {
        point: AttachmentPoint::Depth,
        texture: target,
        target: FboTarget::Texture2DMultisample,
        mip_level: 3,
    });
    assert_eq!(view.dimension, ViewDimension::Texture2DMs);
    assert_eq!(view.mip_slice, 0);
    assert_eq!(view.format, DxgiFormat::D32_FLOAT);
}

#[test]
fn test_level_view_of_volume_covers_its_depth() {
    let volume = texture(TextureTarget::Texture3D, Format::R8_UNORM, UVec3::new(16, 16, 8));
    let view = level_view(&volume, 1, 0, 1);
    assert_eq!(view.dimension, ViewDimension::Texture3D);
    assert_eq!(view.array_size, 4);
}

#[test]
fn test_cube_array_view_counts_cubes() {
    let cubes = texture(TextureTarget::CubeMapArray, Format::R16G16B16A16_SFLOAT, UVec3::new(16, 16, 1));
    let view = shader_resource_view(&cubes, Format::R16G16B16A16_SFLOAT, 1, 3, 12);
    assert_eq!(view.dimension, ViewDimension::TextureCubeArray);
    assert_eq!(view.array_size, 2);
    assert_eq!((view.most_detailed_mip, view.mip_levels), (1, 3));
}

#[test]
fn test_subresource_index() {
    assert_eq!(subresource(0, 0, 4), 0);
    assert_eq!(subresource(2, 3, 4), 14);
}
