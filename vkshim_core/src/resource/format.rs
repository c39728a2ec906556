//! Pixel and vertex formats

use bitflags::bitflags;

bitflags! {
    /// Aspects of an image (color, depth, stencil)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageAspectFlags: u32 {
        const COLOR = 0x1;
        const DEPTH = 0x2;
        const STENCIL = 0x4;
    }
}

/// Numeric interpretation of a format's components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericClass {
    Unorm,
    Snorm,
    Uint,
    Sint,
    Sfloat,
    Ufloat,
    Srgb,
    DepthStencil,
    Compressed,
}

/// Image and vertex attribute formats
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Undefined,
    R8_UNORM,
    R8_SNORM,
    R8_UINT,
    R8_SINT,
    R8G8_UNORM,
    R8G8_SNORM,
    R8G8_UINT,
    R8G8_SINT,
    R8G8B8_UNORM,
    R8G8B8A8_UNORM,
    R8G8B8A8_SNORM,
    R8G8B8A8_UINT,
    R8G8B8A8_SINT,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    A2B10G10R10_UNORM_PACK32,
    B10G11R11_UFLOAT_PACK32,
    R16_UNORM,
    R16_UINT,
    R16_SINT,
    R16_SFLOAT,
    R16G16_UNORM,
    R16G16_SFLOAT,
    R16G16B16A16_UNORM,
    R16G16B16A16_UINT,
    R16G16B16A16_SFLOAT,
    R32_UINT,
    R32_SINT,
    R32_SFLOAT,
    R32G32_UINT,
    R32G32_SINT,
    R32G32_SFLOAT,
    R32G32B32_UINT,
    R32G32B32_SINT,
    R32G32B32_SFLOAT,
    R32G32B32A32_UINT,
    R32G32B32A32_SINT,
    R32G32B32A32_SFLOAT,
    D16_UNORM,
    X8_D24_UNORM_PACK32,
    D32_SFLOAT,
    S8_UINT,
    D16_UNORM_S8_UINT,
    D24_UNORM_S8_UINT,
    D32_SFLOAT_S8_UINT,
    BC1_RGBA_UNORM_BLOCK,
    BC1_RGBA_SRGB_BLOCK,
    BC3_UNORM_BLOCK,
    BC3_SRGB_BLOCK,
}

impl Format {
    /// Number of components (1-4); 0 for undefined
    pub fn component_count(self) -> u32 {
        use Format::*;
        match self {
            Undefined => 0,
            R8_UNORM | R8_SNORM | R8_UINT | R8_SINT | R16_UNORM | R16_UINT | R16_SINT | R16_SFLOAT
            | R32_UINT | R32_SINT | R32_SFLOAT | D16_UNORM | X8_D24_UNORM_PACK32 | D32_SFLOAT
            | S8_UINT => 1,
            R8G8_UNORM | R8G8_SNORM | R8G8_UINT | R8G8_SINT | R16G16_UNORM | R16G16_SFLOAT
            | R32G32_UINT | R32G32_SINT | R32G32_SFLOAT | D16_UNORM_S8_UINT | D24_UNORM_S8_UINT
            | D32_SFLOAT_S8_UINT => 2,
            R8G8B8_UNORM | B10G11R11_UFLOAT_PACK32 | R32G32B32_UINT | R32G32B32_SINT
            | R32G32B32_SFLOAT => 3,
            R8G8B8A8_UNORM | R8G8B8A8_SNORM | R8G8B8A8_UINT | R8G8B8A8_SINT | R8G8B8A8_SRGB
            | B8G8R8A8_UNORM | B8G8R8A8_SRGB | A2B10G10R10_UNORM_PACK32 | R16G16B16A16_UNORM
            | R16G16B16A16_UINT | R16G16B16A16_SFLOAT | R32G32B32A32_UINT | R32G32B32A32_SINT
            | R32G32B32A32_SFLOAT | BC1_RGBA_UNORM_BLOCK | BC1_RGBA_SRGB_BLOCK | BC3_UNORM_BLOCK
            | BC3_SRGB_BLOCK => 4,
        }
    }

    /// Size in bytes of one texel (or one 4x4 block for compressed formats)
    pub fn block_size(self) -> u32 {
        use Format::*;
        match self {
            Undefined => 0,
            R8_UNORM | R8_SNORM | R8_UINT | R8_SINT | S8_UINT => 1,
            R8G8_UNORM | R8G8_SNORM | R8G8_UINT | R8G8_SINT | R16_UNORM | R16_UINT | R16_SINT
            | R16_SFLOAT | D16_UNORM => 2,
            R8G8B8_UNORM | D16_UNORM_S8_UINT => 3,
            R8G8B8A8_UNORM | R8G8B8A8_SNORM | R8G8B8A8_UINT | R8G8B8A8_SINT | R8G8B8A8_SRGB
            | B8G8R8A8_UNORM | B8G8R8A8_SRGB | A2B10G10R10_UNORM_PACK32 | B10G11R11_UFLOAT_PACK32
            | R16G16_UNORM | R16G16_SFLOAT | R32_UINT | R32_SINT | R32_SFLOAT
            | X8_D24_UNORM_PACK32 | D32_SFLOAT | D24_UNORM_S8_UINT => 4,
            D32_SFLOAT_S8_UINT => 5,
            R16G16B16A16_UNORM | R16G16B16A16_UINT | R16G16B16A16_SFLOAT | R32G32_UINT
            | R32G32_SINT | R32G32_SFLOAT | BC1_RGBA_UNORM_BLOCK | BC1_RGBA_SRGB_BLOCK => 8,
            R32G32B32_UINT | R32G32B32_SINT | R32G32B32_SFLOAT => 12,
            R32G32B32A32_UINT | R32G32B32A32_SINT | R32G32B32A32_SFLOAT | BC3_UNORM_BLOCK
            | BC3_SRGB_BLOCK => 16,
        }
    }

    pub fn numeric_class(self) -> NumericClass {
        use Format::*;
        match self {
            Undefined => NumericClass::Unorm,
            R8_SNORM | R8G8_SNORM | R8G8B8A8_SNORM => NumericClass::Snorm,
            R8_UINT | R8G8_UINT | R8G8B8A8_UINT | R16_UINT | R16G16B16A16_UINT | R32_UINT
            | R32G32_UINT | R32G32B32_UINT | R32G32B32A32_UINT => NumericClass::Uint,
            R8_SINT | R8G8_SINT | R8G8B8A8_SINT | R16_SINT | R32_SINT | R32G32_SINT
            | R32G32B32_SINT | R32G32B32A32_SINT => NumericClass::Sint,
            R16_SFLOAT | R16G16_SFLOAT | R16G16B16A16_SFLOAT | R32_SFLOAT | R32G32_SFLOAT
            | R32G32B32_SFLOAT | R32G32B32A32_SFLOAT => NumericClass::Sfloat,
            B10G11R11_UFLOAT_PACK32 => NumericClass::Ufloat,
            R8G8B8A8_SRGB | B8G8R8A8_SRGB => NumericClass::Srgb,
            D16_UNORM | X8_D24_UNORM_PACK32 | D32_SFLOAT | S8_UINT | D16_UNORM_S8_UINT
            | D24_UNORM_S8_UINT | D32_SFLOAT_S8_UINT => NumericClass::DepthStencil,
            BC1_RGBA_UNORM_BLOCK | BC1_RGBA_SRGB_BLOCK | BC3_UNORM_BLOCK | BC3_SRGB_BLOCK => {
                NumericClass::Compressed
            }
            R8_UNORM | R8G8_UNORM | R8G8B8_UNORM | R8G8B8A8_UNORM | B8G8R8A8_UNORM
            | A2B10G10R10_UNORM_PACK32 | R16_UNORM | R16G16_UNORM | R16G16B16A16_UNORM => {
                NumericClass::Unorm
            }
        }
    }

    /// Aspects present in images of this format
    pub fn aspects(self) -> ImageAspectFlags {
        use Format::*;
        match self {
            D16_UNORM | X8_D24_UNORM_PACK32 | D32_SFLOAT => ImageAspectFlags::DEPTH,
            S8_UINT => ImageAspectFlags::STENCIL,
            D16_UNORM_S8_UINT | D24_UNORM_S8_UINT | D32_SFLOAT_S8_UINT => {
                ImageAspectFlags::DEPTH | ImageAspectFlags::STENCIL
            }
            Undefined => ImageAspectFlags::empty(),
            _ => ImageAspectFlags::COLOR,
        }
    }

    pub fn has_depth(self) -> bool {
        self.aspects().contains(ImageAspectFlags::DEPTH)
    }

    pub fn has_stencil(self) -> bool {
        self.aspects().contains(ImageAspectFlags::STENCIL)
    }

    pub fn is_depth_or_stencil(self) -> bool {
        self.aspects().intersects(ImageAspectFlags::DEPTH | ImageAspectFlags::STENCIL)
    }

    pub fn is_color(self) -> bool {
        self.aspects() == ImageAspectFlags::COLOR
    }

    pub fn is_srgb(self) -> bool {
        matches!(
            self,
            Format::R8G8B8A8_SRGB | Format::B8G8R8A8_SRGB | Format::BC1_RGBA_SRGB_BLOCK | Format::BC3_SRGB_BLOCK
        )
    }

    /// Unsigned or signed integer color format
    pub fn is_integer(self) -> bool {
        matches!(self.numeric_class(), NumericClass::Uint | NumericClass::Sint)
    }

    pub fn is_compressed(self) -> bool {
        self.numeric_class() == NumericClass::Compressed
    }

    /// The UNORM format sharing this format's memory layout (sRGB formats only)
    pub fn linear_equivalent(self) -> Format {
        match self {
            Format::R8G8B8A8_SRGB => Format::R8G8B8A8_UNORM,
            Format::B8G8R8A8_SRGB => Format::B8G8R8A8_UNORM,
            Format::BC1_RGBA_SRGB_BLOCK => Format::BC1_RGBA_UNORM_BLOCK,
            Format::BC3_SRGB_BLOCK => Format::BC3_UNORM_BLOCK,
            other => other,
        }
    }

    /// Formats usable for the same attachment slot (equal, or sRGB/UNORM pair)
    pub fn is_attachment_compatible(self, other: Format) -> bool {
        self == other || self.linear_equivalent() == other.linear_equivalent()
    }

    /// Formats a view may reinterpret an image as (same texel size, both color)
    pub fn is_view_compatible(self, other: Format) -> bool {
        self == other
            || (self.is_color()
                && other.is_color()
                && self.is_compressed() == other.is_compressed()
                && self.block_size() == other.block_size())
    }
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
