//! Pipeline state descriptions, pipeline layouts and pipelines

use std::sync::Arc;
use bitflags::bitflags;
use crate::error::{Error, Result};
use crate::resource::{DescriptorSetLayout, Format, NativeHandle, ObjectId, RenderPass, SampleCount};
use crate::state::ContextState;

// ===== VIEWPORT / SCISSOR =====

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-depth viewport covering a rectangle
    pub fn from_rect(rect: Rect2D) -> Self {
        Self {
            x: rect.x as f32,
            y: rect.y as f32,
            width: rect.width as f32,
            height: rect.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

// ===== COLOR BLEND =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    ConstantAlpha,
    OneMinusConstantAlpha,
    SrcAlphaSaturate,
    Src1Color,
    OneMinusSrc1Color,
    Src1Alpha,
    OneMinusSrc1Alpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicOp {
    Clear,
    And,
    AndReverse,
    Copy,
    AndInverted,
    NoOp,
    Xor,
    Or,
    Nor,
    Equivalent,
    Invert,
    OrReverse,
    CopyInverted,
    OrInverted,
    Nand,
    Set,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorComponentFlags: u32 {
        const R = 0x1;
        const G = 0x2;
        const B = 0x4;
        const A = 0x8;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorBlendAttachmentState {
    pub blend_enable: bool,
    pub src_color_blend_factor: BlendFactor,
    pub dst_color_blend_factor: BlendFactor,
    pub color_blend_op: BlendOp,
    pub src_alpha_blend_factor: BlendFactor,
    pub dst_alpha_blend_factor: BlendFactor,
    pub alpha_blend_op: BlendOp,
    pub color_write_mask: ColorComponentFlags,
}

impl ColorBlendAttachmentState {
    /// Blending off, all channels written
    pub fn disabled() -> Self {
        Self {
            blend_enable: false,
            src_color_blend_factor: BlendFactor::One,
            dst_color_blend_factor: BlendFactor::Zero,
            color_blend_op: BlendOp::Add,
            src_alpha_blend_factor: BlendFactor::One,
            dst_alpha_blend_factor: BlendFactor::Zero,
            alpha_blend_op: BlendOp::Add,
            color_write_mask: ColorComponentFlags::all(),
        }
    }

    /// Classic `src * a + dst * (1 - a)`
    pub fn alpha_blending() -> Self {
        Self {
            blend_enable: true,
            src_color_blend_factor: BlendFactor::SrcAlpha,
            dst_color_blend_factor: BlendFactor::OneMinusSrcAlpha,
            color_blend_op: BlendOp::Add,
            src_alpha_blend_factor: BlendFactor::One,
            dst_alpha_blend_factor: BlendFactor::OneMinusSrcAlpha,
            alpha_blend_op: BlendOp::Add,
            color_write_mask: ColorComponentFlags::all(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorBlendState {
    pub logic_op_enable: bool,
    pub logic_op: LogicOp,
    pub attachments: Vec<ColorBlendAttachmentState>,
    pub blend_constants: [f32; 4],
}

// ===== DEPTH / STENCIL =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrementAndClamp,
    DecrementAndClamp,
    Invert,
    IncrementAndWrap,
    DecrementAndWrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilOpState {
    pub fail_op: StencilOp,
    pub pass_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub compare_op: CompareOp,
    pub compare_mask: u32,
    pub write_mask: u32,
    pub reference: u32,
}

impl StencilOpState {
    /// Always pass, keep everything
    pub fn keep() -> Self {
        Self {
            fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            compare_op: CompareOp::Always,
            compare_mask: 0xFFFF_FFFF,
            write_mask: 0xFFFF_FFFF,
            reference: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthStencilState {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: CompareOp,
    pub depth_bounds_test_enable: bool,
    pub stencil_test_enable: bool,
    pub front: StencilOpState,
    pub back: StencilOpState,
    pub min_depth_bounds: f32,
    pub max_depth_bounds: f32,
}

// ===== MULTISAMPLE / TESSELLATION / INPUT ASSEMBLY =====

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultisampleState {
    pub rasterization_samples: SampleCount,
    pub sample_shading_enable: bool,
    pub min_sample_shading: f32,
    pub sample_mask: u32,
    pub alpha_to_coverage_enable: bool,
    pub alpha_to_one_enable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TessellationState {
    pub patch_control_points: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
    TriangleFan,
    LineListWithAdjacency,
    LineStripWithAdjacency,
    TriangleListWithAdjacency,
    TriangleStripWithAdjacency,
    PatchList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputAssemblyState {
    pub topology: PrimitiveTopology,
    pub primitive_restart_enable: bool,
}

// ===== VIEWPORT STATE =====

/// Viewport and scissor arrays of a pipeline
///
/// The counts are separate from the arrays: with dynamic viewports/scissors the
/// arrays may be empty while the counts still matter.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportState {
    pub viewport_count: u32,
    pub viewports: Vec<Viewport>,
    pub scissor_count: u32,
    pub scissors: Vec<Rect2D>,
}

impl ViewportState {
    /// One viewport and one scissor
    pub fn single(viewport: Viewport, scissor: Rect2D) -> Self {
        Self {
            viewport_count: 1,
            viewports: vec![viewport],
            scissor_count: 1,
            scissors: vec![scissor],
        }
    }
}

// ===== RASTERIZATION =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    Fill,
    Line,
    Point,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CullModeFlags: u32 {
        const FRONT = 0x1;
        const BACK = 0x2;
        const FRONT_AND_BACK = 0x3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizationState {
    pub depth_clamp_enable: bool,
    pub rasterizer_discard_enable: bool,
    pub polygon_mode: PolygonMode,
    pub cull_mode: CullModeFlags,
    pub front_face: FrontFace,
    pub depth_bias_enable: bool,
    pub depth_bias_constant_factor: f32,
    pub depth_bias_clamp: f32,
    pub depth_bias_slope_factor: f32,
    pub line_width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DynamicState {
    Viewport,
    Scissor,
    LineWidth,
    DepthBias,
    BlendConstants,
    DepthBounds,
    StencilCompareMask,
    StencilWriteMask,
    StencilReference,
}

// ===== VERTEX INPUT =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexInputRate {
    Vertex,
    Instance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexInputBindingDescription {
    pub binding: u32,
    pub stride: u32,
    pub input_rate: VertexInputRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexInputAttributeDescription {
    pub location: u32,
    pub binding: u32,
    pub format: Format,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexInputState {
    pub bindings: Vec<VertexInputBindingDescription>,
    pub attributes: Vec<VertexInputAttributeDescription>,
}

impl VertexInputState {
    pub fn binding(&self, binding: u32) -> Option<&VertexInputBindingDescription> {
        self.bindings.iter().find(|description| description.binding == binding)
    }
}

// ===== SHADER INTERFACE =====

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 0x01;
        const TESSELLATION_CONTROL = 0x02;
        const TESSELLATION_EVALUATION = 0x04;
        const GEOMETRY = 0x08;
        const FRAGMENT = 0x10;
        const COMPUTE = 0x20;
        const ALL_GRAPHICS = 0x1F;
    }
}

/// Type of an active shader input or output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderDataType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    UInt,
    UVec2,
    UVec3,
    UVec4,
    Mat2,
    Mat3,
    Mat4,
    Mat2x3,
    Mat2x4,
    Mat3x2,
    Mat3x4,
    Mat4x2,
    Mat4x3,
}

impl ShaderDataType {
    /// Type of one location (a column for matrices) and the number of locations used
    pub fn locations(self) -> (ShaderDataType, u32) {
        use ShaderDataType::*;
        match self {
            Mat2 => (Vec2, 2),
            Mat3 => (Vec3, 3),
            Mat4 => (Vec4, 4),
            Mat2x3 => (Vec3, 2),
            Mat2x4 => (Vec4, 2),
            Mat3x2 => (Vec2, 3),
            Mat3x4 => (Vec4, 3),
            Mat4x2 => (Vec2, 4),
            Mat4x3 => (Vec3, 4),
            other => (other, 1),
        }
    }

    /// Format a single-location value of this type is naturally stored in
    pub fn natural_format(self) -> Format {
        use ShaderDataType::*;
        match self.locations().0 {
            Float => Format::R32_SFLOAT,
            Vec2 => Format::R32G32_SFLOAT,
            Vec3 => Format::R32G32B32_SFLOAT,
            Int => Format::R32_SINT,
            IVec2 => Format::R32G32_SINT,
            IVec3 => Format::R32G32B32_SINT,
            IVec4 => Format::R32G32B32A32_SINT,
            UInt => Format::R32_UINT,
            UVec2 => Format::R32G32_UINT,
            UVec3 => Format::R32G32B32_UINT,
            UVec4 => Format::R32G32B32A32_UINT,
            _ => Format::R32G32B32A32_SFLOAT,
        }
    }
}

/// An active input or output variable of a linked program
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderVariable {
    pub name: String,
    pub data_type: ShaderDataType,
    /// Explicit location, if the shader declares one
    pub location: Option<u32>,
}

impl ShaderVariable {
    pub fn new(name: &str, data_type: ShaderDataType, location: Option<u32>) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            location,
        }
    }
}

/// Active vertex inputs and fragment outputs reported for a linked program
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderInterface {
    pub inputs: Vec<ShaderVariable>,
    pub outputs: Vec<ShaderVariable>,
}

// ===== PIPELINE LAYOUT =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PushConstantRange {
    pub stages: ShaderStageFlags,
    pub offset: u32,
    pub size: u32,
}

/// Descriptor set layouts plus push constant ranges
///
/// Native backends have one flat binding space; set `n` binding `b` maps to
/// `binding_base(n) + b`, where the base is the sum of the binding counts of the
/// preceding sets.
#[derive(Debug)]
pub struct PipelineLayout {
    id: ObjectId,
    set_layouts: Vec<Arc<DescriptorSetLayout>>,
    push_constant_ranges: Vec<PushConstantRange>,
    binding_bases: Vec<u32>,
}

impl PipelineLayout {
    pub fn new(
        set_layouts: Vec<Arc<DescriptorSetLayout>>,
        push_constant_ranges: Vec<PushConstantRange>,
    ) -> Arc<Self> {
        let binding_bases = set_layouts.iter()
            .scan(0u32, |base, layout| {
                let current = *base;
                *base += layout.binding_count();
                Some(current)
            })
            .collect();
        Arc::new(Self {
            id: ObjectId::next(),
            set_layouts,
            push_constant_ranges,
            binding_bases,
        })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn set_layouts(&self) -> &[Arc<DescriptorSetLayout>] {
        &self.set_layouts
    }

    pub fn push_constant_ranges(&self) -> &[PushConstantRange] {
        &self.push_constant_ranges
    }

    /// First native binding of a set; sets past the layout start after the last one
    pub fn binding_base(&self, set: u32) -> u32 {
        match self.binding_bases.get(set as usize) {
            Some(base) => *base,
            None => self.set_layouts.iter().map(|layout| layout.binding_count()).sum(),
        }
    }
}

// ===== PIPELINES =====

pub struct GraphicsPipelineCreateInfo {
    /// Linked native program
    pub program: NativeHandle,
    /// Active interface of the program
    pub interface: ShaderInterface,
    pub vertex_input: VertexInputState,
    pub input_assembly: InputAssemblyState,
    pub tessellation: Option<TessellationState>,
    pub viewport: Option<ViewportState>,
    pub rasterization: RasterizationState,
    pub multisample: Option<MultisampleState>,
    pub depth_stencil: Option<DepthStencilState>,
    pub color_blend: Option<ColorBlendState>,
    pub dynamic_states: Vec<DynamicState>,
    pub layout: Arc<PipelineLayout>,
    pub render_pass: Arc<RenderPass>,
    pub subpass: u32,
}

/// Graphics pipeline with its precomputed context state
#[derive(Debug)]
pub struct GraphicsPipeline {
    id: ObjectId,
    program: NativeHandle,
    interface: ShaderInterface,
    vertex_input: VertexInputState,
    layout: Arc<PipelineLayout>,
    render_pass: Arc<RenderPass>,
    subpass: u32,
    state: ContextState,
}

impl GraphicsPipeline {
    /// # Errors
    ///
    /// [`Error::InvalidResource`] when the subpass does not exist, the blend
    /// attachment count differs from the subpass color attachment count, or an
    /// attribute reads from an undeclared binding.
    pub fn new(info: GraphicsPipelineCreateInfo) -> Result<Arc<Self>> {
        if info.subpass >= info.render_pass.subpass_count() {
            return Err(Error::InvalidResource(format!(
                "pipeline subpass {} does not exist (render pass has {})",
                info.subpass,
                info.render_pass.subpass_count()
            )));
        }
        let color_count = info.render_pass.subpass(info.subpass).color_attachments.len();
        if let Some(color_blend) = &info.color_blend {
            if !info.rasterization.rasterizer_discard_enable && color_blend.attachments.len() != color_count {
                return Err(Error::InvalidResource(format!(
                    "{} blend attachments for {} color attachments",
                    color_blend.attachments.len(),
                    color_count
                )));
            }
        }
        for attribute in &info.vertex_input.attributes {
            if info.vertex_input.binding(attribute.binding).is_none() {
                return Err(Error::InvalidResource(format!(
                    "attribute at location {} reads undeclared binding {}",
                    attribute.location, attribute.binding
                )));
            }
        }

        let state = ContextState::new(
            info.color_blend.as_ref(),
            info.depth_stencil.as_ref(),
            info.multisample.as_ref(),
            info.tessellation.as_ref(),
            &info.input_assembly,
            info.viewport.as_ref(),
            &info.rasterization,
            &info.dynamic_states,
        );

        Ok(Arc::new(Self {
            id: ObjectId::next(),
            program: info.program,
            interface: info.interface,
            vertex_input: info.vertex_input,
            layout: info.layout,
            render_pass: info.render_pass,
            subpass: info.subpass,
            state,
        }))
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn program(&self) -> NativeHandle {
        self.program
    }

    pub fn interface(&self) -> &ShaderInterface {
        &self.interface
    }

    pub fn vertex_input(&self) -> &VertexInputState {
        &self.vertex_input
    }

    pub fn layout(&self) -> &Arc<PipelineLayout> {
        &self.layout
    }

    pub fn render_pass(&self) -> &Arc<RenderPass> {
        &self.render_pass
    }

    pub fn subpass(&self) -> u32 {
        self.subpass
    }

    /// Context state this pipeline requests when bound
    pub fn state(&self) -> &ContextState {
        &self.state
    }

    pub fn topology(&self) -> PrimitiveTopology {
        self.state.input_assembly.value().topology
    }

    pub fn has_dynamic_state(&self, state: DynamicState) -> bool {
        self.state.dynamic_states.value().contains(&state)
    }
}

/// Compute pipeline
#[derive(Debug)]
pub struct ComputePipeline {
    id: ObjectId,
    program: NativeHandle,
    layout: Arc<PipelineLayout>,
}

impl ComputePipeline {
    pub fn new(program: NativeHandle, layout: Arc<PipelineLayout>) -> Arc<Self> {
        Arc::new(Self {
            id: ObjectId::next(),
            program,
            layout,
        })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn program(&self) -> NativeHandle {
        self.program
    }

    pub fn layout(&self) -> &Arc<PipelineLayout> {
        &self.layout
    }
}
