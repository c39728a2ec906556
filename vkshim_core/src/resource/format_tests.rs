use super::*;

#[test]
fn test_depth_stencil_aspects() {
    assert_eq!(Format::D32_SFLOAT.aspects(), ImageAspectFlags::DEPTH);
    assert_eq!(Format::S8_UINT.aspects(), ImageAspectFlags::STENCIL);
    assert_eq!(
        Format::D24_UNORM_S8_UINT.aspects(),
        ImageAspectFlags::DEPTH | ImageAspectFlags::STENCIL
    );
    assert!(Format::D24_UNORM_S8_UINT.is_depth_or_stencil());
    assert!(!Format::R8G8B8A8_UNORM.is_depth_or_stencil());
    assert!(Format::R8G8B8A8_UNORM.is_color());
}

#[test]
fn test_srgb_pairs_are_attachment_compatible() {
    assert!(Format::R8G8B8A8_SRGB.is_attachment_compatible(Format::R8G8B8A8_UNORM));
    assert!(Format::B8G8R8A8_UNORM.is_attachment_compatible(Format::B8G8R8A8_SRGB));
    assert!(!Format::R8G8B8A8_UNORM.is_attachment_compatible(Format::B8G8R8A8_UNORM));
    assert!(!Format::R8G8B8A8_UNORM.is_attachment_compatible(Format::D32_SFLOAT));
}

#[test]
fn test_view_compatibility_uses_texel_size() {
    assert!(Format::R8G8B8A8_UNORM.is_view_compatible(Format::R32_UINT));
    assert!(!Format::R8G8B8A8_UNORM.is_view_compatible(Format::R16G16B16A16_SFLOAT));
    assert!(!Format::D32_SFLOAT.is_view_compatible(Format::R32_SFLOAT));
    assert!(Format::D32_SFLOAT.is_view_compatible(Format::D32_SFLOAT));
}

#[test]
fn test_component_counts() {
    assert_eq!(Format::R8_UNORM.component_count(), 1);
    assert_eq!(Format::R32G32_SFLOAT.component_count(), 2);
    assert_eq!(Format::R32G32B32_SFLOAT.component_count(), 3);
    assert_eq!(Format::B8G8R8A8_SRGB.component_count(), 4);
    assert_eq!(Format::Undefined.component_count(), 0);
}

#[test]
fn test_integer_and_srgb_queries() {
    assert!(Format::R32G32B32A32_UINT.is_integer());
    assert!(Format::R8_SINT.is_integer());
    assert!(!Format::R16_SFLOAT.is_integer());
    assert!(Format::B8G8R8A8_SRGB.is_srgb());
    assert!(!Format::B8G8R8A8_UNORM.is_srgb());
    assert!(Format::BC3_UNORM_BLOCK.is_compressed());
}
