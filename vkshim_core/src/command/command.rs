//! Recorded operations and their argument types
//!
//! Every [`Command`] owns what replay needs: plain values, plus shared handles to
//! immutable resources. Nothing points back into the command buffer.

use std::sync::Arc;
use bitflags::bitflags;
use glam::{IVec3, UVec3};
use crate::command::CommandList;
use crate::resource::{
    Buffer, ComputePipeline, DescriptorSet, Framebuffer, GraphicsPipeline, Image,
    ImageAspectFlags, ImageLayout, ImageSubresourceLayers, ImageSubresourceRange, IndexType,
    PipelineLayout, QueryControlFlags, QueryPool, Rect2D, RenderPass, ShaderStageFlags, Viewport,
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PipelineStageFlags: u32 {
        const TOP_OF_PIPE = 0x0000_0001;
        const DRAW_INDIRECT = 0x0000_0002;
        const VERTEX_INPUT = 0x0000_0004;
        const VERTEX_SHADER = 0x0000_0008;
        const TESSELLATION_CONTROL_SHADER = 0x0000_0010;
        const TESSELLATION_EVALUATION_SHADER = 0x0000_0020;
        const GEOMETRY_SHADER = 0x0000_0040;
        const FRAGMENT_SHADER = 0x0000_0080;
        const EARLY_FRAGMENT_TESTS = 0x0000_0100;
        const LATE_FRAGMENT_TESTS = 0x0000_0200;
        const COLOR_ATTACHMENT_OUTPUT = 0x0000_0400;
        const COMPUTE_SHADER = 0x0000_0800;
        const TRANSFER = 0x0000_1000;
        const BOTTOM_OF_PIPE = 0x0000_2000;
        const HOST = 0x0000_4000;
        const ALL_GRAPHICS = 0x0000_8000;
        const ALL_COMMANDS = 0x0001_0000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const INDIRECT_COMMAND_READ = 0x0000_0001;
        const INDEX_READ = 0x0000_0002;
        const VERTEX_ATTRIBUTE_READ = 0x0000_0004;
        const UNIFORM_READ = 0x0000_0008;
        const INPUT_ATTACHMENT_READ = 0x0000_0010;
        const SHADER_READ = 0x0000_0020;
        const SHADER_WRITE = 0x0000_0040;
        const COLOR_ATTACHMENT_READ = 0x0000_0080;
        const COLOR_ATTACHMENT_WRITE = 0x0000_0100;
        const DEPTH_STENCIL_ATTACHMENT_READ = 0x0000_0200;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 0x0000_0400;
        const TRANSFER_READ = 0x0000_0800;
        const TRANSFER_WRITE = 0x0000_1000;
        const HOST_READ = 0x0000_2000;
        const HOST_WRITE = 0x0000_4000;
        const MEMORY_READ = 0x0000_8000;
        const MEMORY_WRITE = 0x0001_0000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StencilFaceFlags: u32 {
        const FRONT = 0x1;
        const BACK = 0x2;
        const FRONT_AND_BACK = 0x3;
    }
}

// ===== BARRIERS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBarrier {
    pub src_access_mask: AccessFlags,
    pub dst_access_mask: AccessFlags,
}

#[derive(Debug, Clone)]
pub struct BufferMemoryBarrier {
    pub src_access_mask: AccessFlags,
    pub dst_access_mask: AccessFlags,
    pub buffer: Arc<Buffer>,
    pub offset: u64,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct ImageMemoryBarrier {
    pub src_access_mask: AccessFlags,
    pub dst_access_mask: AccessFlags,
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
    pub image: Arc<Image>,
    pub subresource_range: ImageSubresourceRange,
}

// ===== TRANSFER REGIONS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferCopy {
    pub src_offset: u64,
    pub dst_offset: u64,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageCopy {
    pub src_subresource: ImageSubresourceLayers,
    pub src_offset: IVec3,
    pub dst_subresource: ImageSubresourceLayers,
    pub dst_offset: IVec3,
    pub extent: UVec3,
}

/// Buffer/image copy region
///
/// A zero row length or image height means tightly packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferImageCopy {
    pub buffer_offset: u64,
    pub buffer_row_length: u32,
    pub buffer_image_height: u32,
    pub image_subresource: ImageSubresourceLayers,
    pub image_offset: IVec3,
    pub image_extent: UVec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBlit {
    pub src_subresource: ImageSubresourceLayers,
    pub src_offsets: [IVec3; 2],
    pub dst_subresource: ImageSubresourceLayers,
    pub dst_offsets: [IVec3; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
}

// ===== CLEARS =====

/// Clear color, interpreted according to the attachment's numeric class
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearColorValue {
    Float32([f32; 4]),
    Int32([i32; 4]),
    Uint32([u32; 4]),
}

impl ClearColorValue {
    /// Raw 16 bytes, as passed to native clear entry points
    pub fn to_bytes(self) -> [u8; 16] {
        match self {
            ClearColorValue::Float32(v) => bytemuck::cast(v),
            ClearColorValue::Int32(v) => bytemuck::cast(v),
            ClearColorValue::Uint32(v) => bytemuck::cast(v),
        }
    }
}

impl Default for ClearColorValue {
    fn default() -> Self {
        ClearColorValue::Float32([0.0; 4])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearDepthStencilValue {
    pub depth: f32,
    pub stencil: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    Color(ClearColorValue),
    DepthStencil(ClearDepthStencilValue),
}

impl ClearValue {
    pub fn color(&self) -> ClearColorValue {
        match self {
            ClearValue::Color(color) => *color,
            ClearValue::DepthStencil(_) => ClearColorValue::default(),
        }
    }

    pub fn depth_stencil(&self) -> ClearDepthStencilValue {
        match self {
            ClearValue::DepthStencil(value) => *value,
            ClearValue::Color(_) => ClearDepthStencilValue { depth: 1.0, stencil: 0 },
        }
    }
}

/// Attachment cleared by [`Command::ClearAttachments`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearAttachment {
    pub aspect_mask: ImageAspectFlags,
    /// Index into the subpass color attachments, for color aspects
    pub color_attachment: u32,
    pub clear_value: ClearValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearRect {
    pub rect: Rect2D,
    pub base_array_layer: u32,
    pub layer_count: u32,
}

// ===== RENDER PASS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubpassContents {
    Inline,
    SecondaryCommandBuffers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineBindPoint {
    Graphics,
    Compute,
}

#[derive(Debug, Clone)]
pub struct RenderPassBeginInfo {
    pub render_pass: Arc<RenderPass>,
    pub framebuffer: Arc<Framebuffer>,
    pub render_area: Rect2D,
    /// Indexed by attachment; entries of attachments that are not cleared are ignored
    pub clear_values: Vec<ClearValue>,
}

/// One recorded operation
#[derive(Debug, Clone)]
pub enum Command {
    // ---- bindings
    BindGraphicsPipeline(Arc<GraphicsPipeline>),
    BindComputePipeline(Arc<ComputePipeline>),
    BindDescriptorSets {
        bind_point: PipelineBindPoint,
        layout: Arc<PipelineLayout>,
        first_set: u32,
        sets: Vec<Arc<DescriptorSet>>,
        dynamic_offsets: Vec<u32>,
    },
    BindVertexBuffers {
        first_binding: u32,
        buffers: Vec<Arc<Buffer>>,
        offsets: Vec<u64>,
    },
    BindIndexBuffer {
        buffer: Arc<Buffer>,
        offset: u64,
        index_type: IndexType,
    },

    // ---- dynamic state
    SetViewport { first: u32, viewports: Vec<Viewport> },
    SetScissor { first: u32, scissors: Vec<Rect2D> },
    SetLineWidth(f32),
    SetDepthBias { constant_factor: f32, clamp: f32, slope_factor: f32 },
    SetBlendConstants([f32; 4]),
    SetDepthBounds { min: f32, max: f32 },
    SetStencilCompareMask { faces: StencilFaceFlags, mask: u32 },
    SetStencilWriteMask { faces: StencilFaceFlags, mask: u32 },
    SetStencilReference { faces: StencilFaceFlags, reference: u32 },
    PushConstants {
        layout: Arc<PipelineLayout>,
        stages: ShaderStageFlags,
        offset: u32,
        data: Vec<u8>,
    },

    // ---- draw / dispatch
    Draw {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    DrawIndexed {
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    },
    DrawIndirect { buffer: Arc<Buffer>, offset: u64, draw_count: u32, stride: u32 },
    DrawIndexedIndirect { buffer: Arc<Buffer>, offset: u64, draw_count: u32, stride: u32 },
    Dispatch { x: u32, y: u32, z: u32 },
    DispatchIndirect { buffer: Arc<Buffer>, offset: u64 },

    // ---- transfer
    CopyBuffer { src: Arc<Buffer>, dst: Arc<Buffer>, regions: Vec<BufferCopy> },
    CopyImage {
        src: Arc<Image>,
        src_layout: ImageLayout,
        dst: Arc<Image>,
        dst_layout: ImageLayout,
        regions: Vec<ImageCopy>,
    },
    CopyBufferToImage {
        src: Arc<Buffer>,
        dst: Arc<Image>,
        dst_layout: ImageLayout,
        regions: Vec<BufferImageCopy>,
    },
    CopyImageToBuffer {
        src: Arc<Image>,
        src_layout: ImageLayout,
        dst: Arc<Buffer>,
        regions: Vec<BufferImageCopy>,
    },
    BlitImage {
        src: Arc<Image>,
        src_layout: ImageLayout,
        dst: Arc<Image>,
        dst_layout: ImageLayout,
        regions: Vec<ImageBlit>,
        filter: Filter,
    },
    ClearColorImage {
        image: Arc<Image>,
        layout: ImageLayout,
        color: ClearColorValue,
        ranges: Vec<ImageSubresourceRange>,
    },
    ClearDepthStencilImage {
        image: Arc<Image>,
        layout: ImageLayout,
        value: ClearDepthStencilValue,
        ranges: Vec<ImageSubresourceRange>,
    },
    ClearAttachments { attachments: Vec<ClearAttachment>, rects: Vec<ClearRect> },

    // ---- synchronization
    PipelineBarrier {
        src_stage_mask: PipelineStageFlags,
        dst_stage_mask: PipelineStageFlags,
        memory_barriers: Vec<MemoryBarrier>,
        buffer_barriers: Vec<BufferMemoryBarrier>,
        image_barriers: Vec<ImageMemoryBarrier>,
    },

    // ---- render pass
    BeginRenderPass { info: RenderPassBeginInfo, contents: SubpassContents },
    NextSubpass(SubpassContents),
    EndRenderPass,

    // ---- queries
    BeginQuery { pool: Arc<QueryPool>, query: u32, flags: QueryControlFlags },
    EndQuery { pool: Arc<QueryPool>, query: u32 },
    ResetQueryPool { pool: Arc<QueryPool>, first: u32, count: u32 },
    WriteTimestamp { stage: PipelineStageFlags, pool: Arc<QueryPool>, query: u32 },

    // ---- secondaries
    ExecuteCommands(Vec<CommandList>),
}

impl Command {
    /// Short name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Command::BindGraphicsPipeline(_) => "BindGraphicsPipeline",
            Command::BindComputePipeline(_) => "BindComputePipeline",
            Command::BindDescriptorSets { .. } => "BindDescriptorSets",
            Command::BindVertexBuffers { .. } => "BindVertexBuffers",
            Command::BindIndexBuffer { .. } => "BindIndexBuffer",
            Command::SetViewport { .. } => "SetViewport",
            Command::SetScissor { .. } => "SetScissor",
            Command::SetLineWidth(_) => "SetLineWidth",
            Command::SetDepthBias { .. } => "SetDepthBias",
            Command::SetBlendConstants(_) => "SetBlendConstants",
            Command::SetDepthBounds { .. } => "SetDepthBounds",
            Command::SetStencilCompareMask { .. } => "SetStencilCompareMask",
            Command::SetStencilWriteMask { .. } => "SetStencilWriteMask",
            Command::SetStencilReference { .. } => "SetStencilReference",
            Command::PushConstants { .. } => "PushConstants",
            Command::Draw { .. } => "Draw",
            Command::DrawIndexed { .. } => "DrawIndexed",
            Command::DrawIndirect { .. } => "DrawIndirect",
            Command::DrawIndexedIndirect { .. } => "DrawIndexedIndirect",
            Command::Dispatch { .. } => "Dispatch",
            Command::DispatchIndirect { .. } => "DispatchIndirect",
            Command::CopyBuffer { .. } => "CopyBuffer",
            Command::CopyImage { .. } => "CopyImage",
            Command::CopyBufferToImage { .. } => "CopyBufferToImage",
            Command::CopyImageToBuffer { .. } => "CopyImageToBuffer",
            Command::BlitImage { .. } => "BlitImage",
            Command::ClearColorImage { .. } => "ClearColorImage",
            Command::ClearDepthStencilImage { .. } => "ClearDepthStencilImage",
            Command::ClearAttachments { .. } => "ClearAttachments",
            Command::PipelineBarrier { .. } => "PipelineBarrier",
            Command::BeginRenderPass { .. } => "BeginRenderPass",
            Command::NextSubpass(_) => "NextSubpass",
            Command::EndRenderPass => "EndRenderPass",
            Command::BeginQuery { .. } => "BeginQuery",
            Command::EndQuery { .. } => "EndQuery",
            Command::ResetQueryPool { .. } => "ResetQueryPool",
            Command::WriteTimestamp { .. } => "WriteTimestamp",
            Command::ExecuteCommands(_) => "ExecuteCommands",
        }
    }
}
