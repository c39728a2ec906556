//! D3D11-shaped descriptors and enum values
//!
//! Mirrors the Direct3D 11 structures the backend fills in. Enum discriminants
//! carry the native values, so an implementation of
//! [`DeviceContext`](crate::DeviceContext) can cast them straight into the
//! Windows API structures.

use std::hash::{Hash, Hasher};
use bitflags::bitflags;
use vkshim_core::resource::NativeHandle;

/// `D3D_FEATURE_LEVEL` of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum FeatureLevel {
    Level10_0 = 0xa000,
    Level10_1 = 0xa100,
    Level11_0 = 0xb000,
    Level11_1 = 0xb100,
}

/// `DXGI_FORMAT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DxgiFormat(pub u32);

impl DxgiFormat {
    pub const UNKNOWN: Self = Self(0);
    pub const R32G32B32A32_FLOAT: Self = Self(2);
    pub const R32G32B32A32_UINT: Self = Self(3);
    pub const R32G32B32A32_SINT: Self = Self(4);
    pub const R32G32B32_FLOAT: Self = Self(6);
    pub const R32G32B32_UINT: Self = Self(7);
    pub const R32G32B32_SINT: Self = Self(8);
    pub const R16G16B16A16_FLOAT: Self = Self(10);
    pub const R16G16B16A16_UNORM: Self = Self(11);
    pub const R16G16B16A16_UINT: Self = Self(12);
    pub const R32G32_FLOAT: Self = Self(16);
    pub const R32G32_UINT: Self = Self(17);
    pub const R32G32_SINT: Self = Self(18);
    pub const D32_FLOAT_S8X24_UINT: Self = Self(20);
    pub const R32_FLOAT_X8X24_TYPELESS: Self = Self(21);
    pub const R10G10B10A2_UNORM: Self = Self(24);
    pub const R11G11B10_FLOAT: Self = Self(26);
    pub const R8G8B8A8_UNORM: Self = Self(28);
    pub const R8G8B8A8_UNORM_SRGB: Self = Self(29);
    pub const R8G8B8A8_UINT: Self = Self(30);
    pub const R8G8B8A8_SNORM: Self = Self(31);
    pub const R8G8B8A8_SINT: Self = Self(32);
    pub const R16G16_FLOAT: Self = Self(34);
    pub const R16G16_UNORM: Self = Self(35);
    pub const D32_FLOAT: Self = Self(40);
    pub const R32_FLOAT: Self = Self(41);
    pub const R32_UINT: Self = Self(42);
    pub const R32_SINT: Self = Self(43);
    pub const D24_UNORM_S8_UINT: Self = Self(45);
    pub const R24_UNORM_X8_TYPELESS: Self = Self(46);
    pub const X24_TYPELESS_G8_UINT: Self = Self(47);
    pub const R8G8_UNORM: Self = Self(49);
    pub const R8G8_UINT: Self = Self(50);
    pub const R8G8_SNORM: Self = Self(51);
    pub const R8G8_SINT: Self = Self(52);
    pub const R16_FLOAT: Self = Self(54);
    pub const D16_UNORM: Self = Self(55);
    pub const R16_UNORM: Self = Self(56);
    pub const R16_UINT: Self = Self(57);
    pub const R16_SINT: Self = Self(59);
    pub const R8_UNORM: Self = Self(61);
    pub const R8_UINT: Self = Self(62);
    pub const R8_SNORM: Self = Self(63);
    pub const R8_SINT: Self = Self(64);
    pub const BC1_UNORM: Self = Self(71);
    pub const BC1_UNORM_SRGB: Self = Self(72);
    pub const BC3_UNORM: Self = Self(77);
    pub const BC3_UNORM_SRGB: Self = Self(78);
    pub const B8G8R8A8_UNORM: Self = Self(87);
    pub const B8G8R8A8_UNORM_SRGB: Self = Self(91);
}

// ===== BLEND =====

/// `D3D11_BLEND`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Blend {
    Zero = 1,
    One = 2,
    SrcColor = 3,
    InvSrcColor = 4,
    SrcAlpha = 5,
    InvSrcAlpha = 6,
    DestAlpha = 7,
    InvDestAlpha = 8,
    DestColor = 9,
    InvDestColor = 10,
    SrcAlphaSat = 11,
    BlendFactor = 14,
    InvBlendFactor = 15,
    Src1Color = 16,
    InvSrc1Color = 17,
    Src1Alpha = 18,
    InvSrc1Alpha = 19,
}

/// `D3D11_BLEND_OP`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BlendOp {
    Add = 1,
    Subtract = 2,
    RevSubtract = 3,
    Min = 4,
    Max = 5,
}

/// `D3D11_LOGIC_OP` (Direct3D 11.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum LogicOp {
    Clear = 0,
    Set = 1,
    Copy = 2,
    CopyInverted = 3,
    Noop = 4,
    Invert = 5,
    And = 6,
    Nand = 7,
    Or = 8,
    Nor = 9,
    Xor = 10,
    Equiv = 11,
    AndReverse = 12,
    AndInverted = 13,
    OrReverse = 14,
    OrInverted = 15,
}

bitflags! {
    /// `D3D11_COLOR_WRITE_ENABLE`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWriteEnable: u8 {
        const RED = 1;
        const GREEN = 2;
        const BLUE = 4;
        const ALPHA = 8;
    }
}

/// `D3D11_RENDER_TARGET_BLEND_DESC1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetBlendDesc {
    pub blend_enable: bool,
    pub logic_op_enable: bool,
    pub src_blend: Blend,
    pub dest_blend: Blend,
    pub blend_op: BlendOp,
    pub src_blend_alpha: Blend,
    pub dest_blend_alpha: Blend,
    pub blend_op_alpha: BlendOp,
    pub logic_op: LogicOp,
    pub render_target_write_mask: ColorWriteEnable,
}

impl Default for RenderTargetBlendDesc {
    fn default() -> Self {
        Self {
            blend_enable: false,
            logic_op_enable: false,
            src_blend: Blend::One,
            dest_blend: Blend::Zero,
            blend_op: BlendOp::Add,
            src_blend_alpha: Blend::One,
            dest_blend_alpha: Blend::Zero,
            blend_op_alpha: BlendOp::Add,
            logic_op: LogicOp::Noop,
            render_target_write_mask: ColorWriteEnable::all(),
        }
    }
}

/// `D3D11_BLEND_DESC1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlendDesc {
    pub alpha_to_coverage_enable: bool,
    pub independent_blend_enable: bool,
    pub render_target: [RenderTargetBlendDesc; 8],
}

// ===== DEPTH / STENCIL =====

/// `D3D11_COMPARISON_FUNC`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ComparisonFunc {
    Never = 1,
    Less = 2,
    Equal = 3,
    LessEqual = 4,
    Greater = 5,
    NotEqual = 6,
    GreaterEqual = 7,
    Always = 8,
}

/// `D3D11_STENCIL_OP`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum StencilOp {
    Keep = 1,
    Zero = 2,
    Replace = 3,
    IncrSat = 4,
    DecrSat = 5,
    Invert = 6,
    Incr = 7,
    Decr = 8,
}

/// `D3D11_DEPTH_STENCILOP_DESC`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilOpDesc {
    pub stencil_fail_op: StencilOp,
    pub stencil_depth_fail_op: StencilOp,
    pub stencil_pass_op: StencilOp,
    pub stencil_func: ComparisonFunc,
}

impl Default for DepthStencilOpDesc {
    fn default() -> Self {
        Self {
            stencil_fail_op: StencilOp::Keep,
            stencil_depth_fail_op: StencilOp::Keep,
            stencil_pass_op: StencilOp::Keep,
            stencil_func: ComparisonFunc::Always,
        }
    }
}

/// `D3D11_DEPTH_STENCIL_DESC`
///
/// `depth_write` stands for `D3D11_DEPTH_WRITE_MASK_ALL` (true) or `_ZERO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilDesc {
    pub depth_enable: bool,
    pub depth_write: bool,
    pub depth_func: ComparisonFunc,
    pub stencil_enable: bool,
    pub stencil_read_mask: u8,
    pub stencil_write_mask: u8,
    pub front_face: DepthStencilOpDesc,
    pub back_face: DepthStencilOpDesc,
}

impl Default for DepthStencilDesc {
    fn default() -> Self {
        Self {
            depth_enable: false,
            depth_write: true,
            depth_func: ComparisonFunc::Less,
            stencil_enable: false,
            stencil_read_mask: 0xFF,
            stencil_write_mask: 0xFF,
            front_face: DepthStencilOpDesc::default(),
            back_face: DepthStencilOpDesc::default(),
        }
    }
}

// ===== RASTERIZER =====

/// `D3D11_FILL_MODE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum FillMode {
    Wireframe = 2,
    Solid = 3,
}

/// `D3D11_CULL_MODE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CullMode {
    None = 1,
    Front = 2,
    Back = 3,
}

/// `D3D11_RASTERIZER_DESC`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizerDesc {
    pub fill_mode: FillMode,
    pub cull_mode: CullMode,
    pub front_counter_clockwise: bool,
    pub depth_bias: i32,
    pub depth_bias_clamp: f32,
    pub slope_scaled_depth_bias: f32,
    pub depth_clip_enable: bool,
    pub scissor_enable: bool,
    pub multisample_enable: bool,
    pub antialiased_line_enable: bool,
}

impl Default for RasterizerDesc {
    fn default() -> Self {
        Self {
            fill_mode: FillMode::Solid,
            cull_mode: CullMode::None,
            front_counter_clockwise: true,
            depth_bias: 0,
            depth_bias_clamp: 0.0,
            slope_scaled_depth_bias: 0.0,
            depth_clip_enable: true,
            scissor_enable: false,
            multisample_enable: false,
            antialiased_line_enable: false,
        }
    }
}

// Floats compare by bits so descriptors can key the state object cache.
impl Eq for RasterizerDesc {}

impl Hash for RasterizerDesc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fill_mode.hash(state);
        self.cull_mode.hash(state);
        self.front_counter_clockwise.hash(state);
        self.depth_bias.hash(state);
        self.depth_bias_clamp.to_bits().hash(state);
        self.slope_scaled_depth_bias.to_bits().hash(state);
        self.depth_clip_enable.hash(state);
        self.scissor_enable.hash(state);
        self.multisample_enable.hash(state);
        self.antialiased_line_enable.hash(state);
    }
}

/// `D3D11_VIEWPORT`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub top_left_x: f32,
    pub top_left_y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// `D3D11_RECT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

// ===== INPUT ASSEMBLY =====

/// `D3D11_PRIMITIVE_TOPOLOGY`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveTopology(pub u32);

impl PrimitiveTopology {
    pub const UNDEFINED: Self = Self(0);
    pub const POINTLIST: Self = Self(1);
    pub const LINELIST: Self = Self(2);
    pub const LINESTRIP: Self = Self(3);
    pub const TRIANGLELIST: Self = Self(4);
    pub const TRIANGLESTRIP: Self = Self(5);
    pub const LINELIST_ADJ: Self = Self(10);
    pub const LINESTRIP_ADJ: Self = Self(11);
    pub const TRIANGLELIST_ADJ: Self = Self(12);
    pub const TRIANGLESTRIP_ADJ: Self = Self(13);

    /// `D3D11_PRIMITIVE_TOPOLOGY_<n>_CONTROL_POINT_PATCHLIST`, `n` clamped to 1..=32
    pub fn patch_list(control_points: u32) -> Self {
        Self(33 + control_points.clamp(1, 32) - 1)
    }
}

/// `D3D11_INPUT_CLASSIFICATION`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum InputClassification {
    PerVertexData = 0,
    PerInstanceData = 1,
}

/// `D3D11_INPUT_ELEMENT_DESC`
///
/// Attributes use the `TEXCOORD` semantic with the attribute location as index,
/// the convention of HLSL generated from SPIR-V.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputElementDesc {
    pub semantic_name: &'static str,
    pub semantic_index: u32,
    pub format: DxgiFormat,
    pub input_slot: u32,
    pub aligned_byte_offset: u32,
    pub input_slot_class: InputClassification,
    pub instance_data_step_rate: u32,
}

// ===== VIEWS =====

/// Resource dimension of a view (`D3D11_RTV_DIMENSION` and friends)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewDimension {
    Texture1D,
    Texture1DArray,
    Texture2D,
    Texture2DArray,
    Texture2DMs,
    Texture2DMsArray,
    Texture3D,
    TextureCube,
    TextureCubeArray,
}

/// `D3D11_RENDER_TARGET_VIEW_DESC`, `D3D11_DEPTH_STENCIL_VIEW_DESC` and the
/// texture forms of `D3D11_UNORDERED_ACCESS_VIEW_DESC`
///
/// For 3D textures the array range selects depth slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentViewDesc {
    pub format: DxgiFormat,
    pub dimension: ViewDimension,
    pub mip_slice: u32,
    pub first_array_slice: u32,
    pub array_size: u32,
}

/// `D3D11_SHADER_RESOURCE_VIEW_DESC`
///
/// Cube arrays count cubes in `array_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderResourceViewDesc {
    pub format: DxgiFormat,
    pub dimension: ViewDimension,
    pub most_detailed_mip: u32,
    pub mip_levels: u32,
    pub first_array_slice: u32,
    pub array_size: u32,
}

/// `D3D11_UNORDERED_ACCESS_VIEW_DESC`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnorderedAccessViewDesc {
    Texture(AttachmentViewDesc),
    /// `DXGI_FORMAT_R32_TYPELESS` view with `D3D11_BUFFER_UAV_FLAG_RAW`, in 32-bit elements
    RawBuffer { first_element: u32, num_elements: u32 },
}

// ===== RESOURCES =====

/// The parts of `D3D11_TEXTURE*_DESC` the backend needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    pub mip_levels: u32,
    /// Array layers; six per cube
    pub array_size: u32,
}

bitflags! {
    /// `D3D11_BIND_FLAG`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BindFlags: u32 {
        const VERTEX_BUFFER = 0x1;
        const INDEX_BUFFER = 0x2;
        const CONSTANT_BUFFER = 0x4;
        const SHADER_RESOURCE = 0x8;
        const RENDER_TARGET = 0x20;
        const DEPTH_STENCIL = 0x40;
        const UNORDERED_ACCESS = 0x80;
    }
}

/// `D3D11_USAGE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Usage {
    Default = 0,
    Immutable = 1,
    Dynamic = 2,
    Staging = 3,
}

/// `D3D11_BUFFER_DESC` without the CPU access and misc flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferDesc {
    pub byte_width: u32,
    pub usage: Usage,
    pub bind_flags: BindFlags,
}

/// `D3D11_BOX`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Box3 {
    pub left: u32,
    pub top: u32,
    pub front: u32,
    pub right: u32,
    pub bottom: u32,
    pub back: u32,
}

/// `D3D11_MAP`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MapType {
    Read = 1,
    Write = 2,
    ReadWrite = 3,
}

/// `D3D11_MAPPED_SUBRESOURCE`
///
/// `len` is the number of bytes addressable from `data`, which stays valid
/// until the matching unmap.
#[derive(Debug, Clone, Copy)]
pub struct MappedSubresource {
    pub data: *mut u8,
    pub len: usize,
    pub row_pitch: u32,
    pub depth_pitch: u32,
}

bitflags! {
    /// `D3D11_CLEAR_FLAG`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        const DEPTH = 0x1;
        const STENCIL = 0x2;
    }
}

// ===== QUERIES =====

/// `D3D11_QUERY`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum QueryKind {
    Event = 0,
    Occlusion = 1,
    Timestamp = 2,
    PipelineStatistics = 4,
}

/// Outcome of `ID3D11DeviceContext::GetData`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryData {
    /// `S_OK`, the output holds the result
    Ready,
    /// `S_FALSE`
    NotReady,
    Failed,
}

/// Swap chain views standing in for the default framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DefaultViews {
    pub render_target: Option<NativeHandle>,
    pub depth_stencil: Option<NativeHandle>,
}
