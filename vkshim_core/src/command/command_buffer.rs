/// Command pools and the command buffer recording state machine

use std::sync::Arc;
use bitflags::bitflags;
use crate::command::{
    BufferCopy, BufferImageCopy, BufferMemoryBarrier, ClearAttachment, ClearColorValue,
    ClearDepthStencilValue, ClearRect, Command, CommandList, Filter, ImageBlit, ImageCopy,
    ImageMemoryBarrier, MemoryBarrier, PipelineBindPoint, PipelineStageFlags, RenderPassBeginInfo,
    StencilFaceFlags, SubpassContents,
};
use crate::error::{Error, Result};
use crate::resource::{
    Buffer, ComputePipeline, DescriptorSet, Framebuffer, GraphicsPipeline, Image, ImageLayout,
    ImageSubresourceRange, IndexType, ObjectId, PipelineLayout, QueryControlFlags, QueryPool,
    Rect2D, RenderPass, ShaderStageFlags, Viewport,
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CommandPoolCreateFlags: u32 {
        /// Buffers are short-lived (informational)
        const TRANSIENT = 0x1;
        /// Buffers may be reset individually, and `begin` implicitly resets them
        const RESET_COMMAND_BUFFER = 0x2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CommandBufferUsageFlags: u32 {
        /// Invalid after its first submission
        const ONE_TIME_SUBMIT = 0x1;
        /// Secondary buffer recorded entirely inside a render pass
        const RENDER_PASS_CONTINUE = 0x2;
        const SIMULTANEOUS_USE = 0x4;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CommandBufferResetFlags: u32 {
        const RELEASE_RESOURCES = 0x1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandBufferLevel {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandBufferState {
    Initial,
    Recording,
    Executable,
    Pending,
    Invalid,
}

/// Render pass a secondary buffer continues
#[derive(Debug, Clone)]
pub struct InheritanceInfo {
    pub render_pass: Arc<RenderPass>,
    pub subpass: u32,
    pub framebuffer: Option<Arc<Framebuffer>>,
}

/// Allocates command buffers and decides how they may be reset
#[derive(Debug)]
pub struct CommandPool {
    id: ObjectId,
    flags: CommandPoolCreateFlags,
}

impl CommandPool {
    pub fn new(flags: CommandPoolCreateFlags) -> Arc<Self> {
        Arc::new(Self {
            id: ObjectId::next(),
            flags,
        })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn flags(&self) -> CommandPoolCreateFlags {
        self.flags
    }

    pub fn allocate(self: &Arc<Self>, level: CommandBufferLevel) -> CommandBuffer {
        CommandBuffer::new(Arc::clone(self), level)
    }

    pub fn allocate_many(self: &Arc<Self>, level: CommandBufferLevel, count: u32) -> Vec<CommandBuffer> {
        (0..count).map(|_| self.allocate(level)).collect()
    }
}

/// Open render pass while recording
#[derive(Debug, Clone)]
struct RenderPassScope {
    render_pass: Arc<RenderPass>,
    subpass: u32,
    contents: SubpassContents,
    /// Seeded by `begin_secondary`; never closed by this buffer
    inherited: bool,
}

/// Records commands for later replay
///
/// Recording methods may only be called between [`begin`](Self::begin) and
/// [`end`](Self::end); calling them in any other state, or breaking a structural
/// rule (draw without a pipeline, transfer inside a render pass, ...), panics.
/// State-machine transitions report misuse as [`Error::InvalidState`].
#[derive(Debug)]
pub struct CommandBuffer {
    id: ObjectId,
    pool: Arc<CommandPool>,
    level: CommandBufferLevel,
    state: CommandBufferState,
    usage: CommandBufferUsageFlags,
    commands: Vec<Command>,
    list: Option<CommandList>,
    graphics_pipeline: Option<Arc<GraphicsPipeline>>,
    compute_pipeline: Option<Arc<ComputePipeline>>,
    index_type: Option<IndexType>,
    render_pass: Option<RenderPassScope>,
    inheritance: Option<InheritanceInfo>,
}

impl CommandBuffer {
    fn new(pool: Arc<CommandPool>, level: CommandBufferLevel) -> Self {
        Self {
            id: ObjectId::next(),
            pool,
            level,
            state: CommandBufferState::Initial,
            usage: CommandBufferUsageFlags::empty(),
            commands: Vec::new(),
            list: None,
            graphics_pipeline: None,
            compute_pipeline: None,
            index_type: None,
            render_pass: None,
            inheritance: None,
        }
    }

    // ===== STATE MACHINE =====

    /// Start recording
    ///
    /// Allowed from `Initial` or `Executable`. When the pool was created with
    /// [`CommandPoolCreateFlags::RESET_COMMAND_BUFFER`] a buffer that is
    /// `Invalid` or still `Recording` is implicitly reset first, dropping any
    /// open render pass scope. Prior commands are discarded.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] from any other state, or when `RENDER_PASS_CONTINUE`
    /// is requested (use [`begin_secondary`](Self::begin_secondary)).
    pub fn begin(&mut self, usage: CommandBufferUsageFlags) -> Result<()> {
        if usage.contains(CommandBufferUsageFlags::RENDER_PASS_CONTINUE) {
            return Err(Error::InvalidState(
                "render-pass-continue recording requires begin_secondary".to_string(),
            ));
        }
        self.start_recording(usage)
    }

    /// Start recording a secondary buffer with inherited render pass state
    ///
    /// With `RENDER_PASS_CONTINUE` the buffer records as if inside subpass
    /// `inheritance.subpass` of `inheritance.render_pass`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] on a primary buffer, for an inherited subpass that
    /// does not exist, or from a state `begin` rejects.
    pub fn begin_secondary(&mut self, usage: CommandBufferUsageFlags, inheritance: InheritanceInfo) -> Result<()> {
        if self.level != CommandBufferLevel::Secondary {
            return Err(Error::InvalidState(
                "begin_secondary called on a primary command buffer".to_string(),
            ));
        }
        if inheritance.subpass >= inheritance.render_pass.subpass_count() {
            return Err(Error::InvalidState(format!(
                "inherited subpass {} does not exist",
                inheritance.subpass
            )));
        }
        self.start_recording(usage)?;
        if usage.contains(CommandBufferUsageFlags::RENDER_PASS_CONTINUE) {
            self.render_pass = Some(RenderPassScope {
                render_pass: Arc::clone(&inheritance.render_pass),
                subpass: inheritance.subpass,
                contents: SubpassContents::Inline,
                inherited: true,
            });
        }
        self.inheritance = Some(inheritance);
        Ok(())
    }

    fn start_recording(&mut self, usage: CommandBufferUsageFlags) -> Result<()> {
        match self.state {
            CommandBufferState::Initial | CommandBufferState::Executable => {}
            CommandBufferState::Invalid | CommandBufferState::Recording
                if self.pool.flags.contains(CommandPoolCreateFlags::RESET_COMMAND_BUFFER) => {}
            state => {
                return Err(Error::InvalidState(format!(
                    "cannot begin command buffer {:?} in state {:?}",
                    self.id, state
                )));
            }
        }
        self.clear();
        self.usage = usage;
        self.state = CommandBufferState::Recording;
        Ok(())
    }

    /// Stop recording and freeze the command list
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] when not recording or when a render pass begun in
    /// this buffer is still open.
    pub fn end(&mut self) -> Result<()> {
        if self.state != CommandBufferState::Recording {
            return Err(Error::InvalidState(format!(
                "cannot end command buffer {:?} in state {:?}",
                self.id, self.state
            )));
        }
        if self.render_pass.as_ref().is_some_and(|scope| !scope.inherited) {
            return Err(Error::InvalidState(
                "command buffer ended inside a render pass".to_string(),
            ));
        }
        let commands = std::mem::take(&mut self.commands);
        crate::vks_trace!("vkshim::command_buffer", "{:?}: {} commands recorded", self.id, commands.len());
        self.list = Some(CommandList::new(commands));
        self.state = CommandBufferState::Executable;
        Ok(())
    }

    /// Discard commands and recording metadata
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] while the buffer is pending execution.
    pub fn reset(&mut self, _flags: CommandBufferResetFlags) -> Result<()> {
        if self.state == CommandBufferState::Pending {
            return Err(Error::InvalidState(format!(
                "cannot reset command buffer {:?} while pending",
                self.id
            )));
        }
        self.clear();
        self.state = CommandBufferState::Initial;
        Ok(())
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.list = None;
        self.graphics_pipeline = None;
        self.compute_pipeline = None;
        self.index_type = None;
        self.render_pass = None;
        self.inheritance = None;
        self.usage = CommandBufferUsageFlags::empty();
    }

    pub(crate) fn mark_pending(&mut self) {
        self.state = CommandBufferState::Pending;
    }

    /// Leave `Pending` once replay is done
    pub(crate) fn complete_submission(&mut self) {
        self.state = if self.usage.contains(CommandBufferUsageFlags::ONE_TIME_SUBMIT) {
            CommandBufferState::Invalid
        } else {
            CommandBufferState::Executable
        };
    }

    // ===== ACCESSORS =====

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn level(&self) -> CommandBufferLevel {
        self.level
    }

    pub fn state(&self) -> CommandBufferState {
        self.state
    }

    pub fn usage(&self) -> CommandBufferUsageFlags {
        self.usage
    }

    pub fn pool(&self) -> &Arc<CommandPool> {
        &self.pool
    }

    pub fn inheritance(&self) -> Option<&InheritanceInfo> {
        self.inheritance.as_ref()
    }

    /// Frozen list of an executable buffer
    pub fn command_list(&self) -> Option<&CommandList> {
        self.list.as_ref()
    }

    /// Commands recorded so far in the current session
    pub fn recorded(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_inside_render_pass(&self) -> bool {
        self.render_pass.is_some()
    }

    pub fn current_subpass(&self) -> Option<u32> {
        self.render_pass.as_ref().map(|scope| scope.subpass)
    }

    // ===== RECORDING CHECKS =====

    fn record(&mut self, command: Command) {
        assert!(
            self.state == CommandBufferState::Recording,
            "{} recorded into command buffer {:?} in state {:?}",
            command.name(),
            self.id,
            self.state
        );
        self.commands.push(command);
    }

    fn assert_recording(&self, what: &str) {
        assert!(
            self.state == CommandBufferState::Recording,
            "{} recorded into command buffer {:?} in state {:?}",
            what,
            self.id,
            self.state
        );
    }

    fn assert_primary(&self, what: &str) {
        assert!(
            self.level == CommandBufferLevel::Primary,
            "{} is only valid in a primary command buffer",
            what
        );
    }

    fn assert_inside_render_pass(&self, what: &str) {
        let scope = self.render_pass.as_ref();
        assert!(scope.is_some(), "{} is only valid inside a render pass", what);
        assert!(
            scope.is_some_and(|scope| scope.contents == SubpassContents::Inline),
            "{} recorded inline in a subpass whose contents are secondary command buffers",
            what
        );
    }

    fn assert_outside_render_pass(&self, what: &str) {
        assert!(self.render_pass.is_none(), "{} is not valid inside a render pass", what);
    }

    fn assert_graphics_pipeline(&self, what: &str) {
        if self.level == CommandBufferLevel::Primary {
            assert!(self.graphics_pipeline.is_some(), "{} without a bound graphics pipeline", what);
        }
    }

    // ===== BINDINGS =====

    pub fn bind_graphics_pipeline(&mut self, pipeline: &Arc<GraphicsPipeline>) {
        self.assert_recording("BindGraphicsPipeline");
        self.graphics_pipeline = Some(Arc::clone(pipeline));
        self.record(Command::BindGraphicsPipeline(Arc::clone(pipeline)));
    }

    pub fn bind_compute_pipeline(&mut self, pipeline: &Arc<ComputePipeline>) {
        self.assert_recording("BindComputePipeline");
        self.compute_pipeline = Some(Arc::clone(pipeline));
        self.record(Command::BindComputePipeline(Arc::clone(pipeline)));
    }

    /// Bind descriptor sets starting at `first_set`
    ///
    /// `dynamic_offsets` supplies one offset per dynamic descriptor of the sets,
    /// in set order then binding order.
    pub fn bind_descriptor_sets(
        &mut self,
        bind_point: PipelineBindPoint,
        layout: &Arc<PipelineLayout>,
        first_set: u32,
        sets: &[Arc<DescriptorSet>],
        dynamic_offsets: &[u32],
    ) {
        self.assert_recording("BindDescriptorSets");
        assert!(
            first_set as usize + sets.len() <= layout.set_layouts().len(),
            "descriptor sets {}..{} exceed the pipeline layout's {} sets",
            first_set,
            first_set as usize + sets.len(),
            layout.set_layouts().len()
        );
        let dynamic_count: usize = sets.iter().map(|set| set.dynamic_count()).sum();
        assert_eq!(
            dynamic_count,
            dynamic_offsets.len(),
            "dynamic offset count does not match the dynamic descriptors of the bound sets"
        );
        self.record(Command::BindDescriptorSets {
            bind_point,
            layout: Arc::clone(layout),
            first_set,
            sets: sets.to_vec(),
            dynamic_offsets: dynamic_offsets.to_vec(),
        });
    }

    pub fn bind_vertex_buffers(&mut self, first_binding: u32, buffers: &[Arc<Buffer>], offsets: &[u64]) {
        self.assert_recording("BindVertexBuffers");
        assert_eq!(buffers.len(), offsets.len(), "one offset per vertex buffer is required");
        self.record(Command::BindVertexBuffers {
            first_binding,
            buffers: buffers.to_vec(),
            offsets: offsets.to_vec(),
        });
    }

    pub fn bind_index_buffer(&mut self, buffer: &Arc<Buffer>, offset: u64, index_type: IndexType) {
        self.assert_recording("BindIndexBuffer");
        self.index_type = Some(index_type);
        self.record(Command::BindIndexBuffer {
            buffer: Arc::clone(buffer),
            offset,
            index_type,
        });
    }

    // ===== DYNAMIC STATE =====

    pub fn set_viewport(&mut self, first: u32, viewports: &[Viewport]) {
        self.record(Command::SetViewport {
            first,
            viewports: viewports.to_vec(),
        });
    }

    pub fn set_scissor(&mut self, first: u32, scissors: &[Rect2D]) {
        self.record(Command::SetScissor {
            first,
            scissors: scissors.to_vec(),
        });
    }

    pub fn set_line_width(&mut self, width: f32) {
        self.record(Command::SetLineWidth(width));
    }

    pub fn set_depth_bias(&mut self, constant_factor: f32, clamp: f32, slope_factor: f32) {
        self.record(Command::SetDepthBias {
            constant_factor,
            clamp,
            slope_factor,
        });
    }

    pub fn set_blend_constants(&mut self, constants: [f32; 4]) {
        self.record(Command::SetBlendConstants(constants));
    }

    pub fn set_depth_bounds(&mut self, min: f32, max: f32) {
        self.record(Command::SetDepthBounds { min, max });
    }

    pub fn set_stencil_compare_mask(&mut self, faces: StencilFaceFlags, mask: u32) {
        self.record(Command::SetStencilCompareMask { faces, mask });
    }

    pub fn set_stencil_write_mask(&mut self, faces: StencilFaceFlags, mask: u32) {
        self.record(Command::SetStencilWriteMask { faces, mask });
    }

    pub fn set_stencil_reference(&mut self, faces: StencilFaceFlags, reference: u32) {
        self.record(Command::SetStencilReference { faces, reference });
    }

    /// Update push constants
    ///
    /// `offset` and `data.len()` must be multiples of 4.
    pub fn push_constants(&mut self, layout: &Arc<PipelineLayout>, stages: ShaderStageFlags, offset: u32, data: &[u8]) {
        self.assert_recording("PushConstants");
        assert!(
            offset % 4 == 0 && data.len() % 4 == 0,
            "push constant offset and size must be multiples of 4"
        );
        self.record(Command::PushConstants {
            layout: Arc::clone(layout),
            stages,
            offset,
            data: data.to_vec(),
        });
    }

    // ===== DRAW / DISPATCH =====

    pub fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        self.assert_recording("Draw");
        self.assert_inside_render_pass("Draw");
        self.assert_graphics_pipeline("Draw");
        self.record(Command::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        });
    }

    pub fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        self.assert_recording("DrawIndexed");
        self.assert_inside_render_pass("DrawIndexed");
        self.assert_graphics_pipeline("DrawIndexed");
        if self.level == CommandBufferLevel::Primary {
            assert!(self.index_type.is_some(), "DrawIndexed without a bound index buffer");
        }
        self.record(Command::DrawIndexed {
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        });
    }

    pub fn draw_indirect(&mut self, buffer: &Arc<Buffer>, offset: u64, draw_count: u32, stride: u32) {
        self.assert_recording("DrawIndirect");
        self.assert_inside_render_pass("DrawIndirect");
        self.assert_graphics_pipeline("DrawIndirect");
        self.record(Command::DrawIndirect {
            buffer: Arc::clone(buffer),
            offset,
            draw_count,
            stride,
        });
    }

    pub fn draw_indexed_indirect(&mut self, buffer: &Arc<Buffer>, offset: u64, draw_count: u32, stride: u32) {
        self.assert_recording("DrawIndexedIndirect");
        self.assert_inside_render_pass("DrawIndexedIndirect");
        self.assert_graphics_pipeline("DrawIndexedIndirect");
        if self.level == CommandBufferLevel::Primary {
            assert!(self.index_type.is_some(), "DrawIndexedIndirect without a bound index buffer");
        }
        self.record(Command::DrawIndexedIndirect {
            buffer: Arc::clone(buffer),
            offset,
            draw_count,
            stride,
        });
    }

    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.assert_recording("Dispatch");
        self.assert_outside_render_pass("Dispatch");
        if self.level == CommandBufferLevel::Primary {
            assert!(self.compute_pipeline.is_some(), "Dispatch without a bound compute pipeline");
        }
        self.record(Command::Dispatch { x, y, z });
    }

    pub fn dispatch_indirect(&mut self, buffer: &Arc<Buffer>, offset: u64) {
        self.assert_recording("DispatchIndirect");
        self.assert_outside_render_pass("DispatchIndirect");
        if self.level == CommandBufferLevel::Primary {
            assert!(self.compute_pipeline.is_some(), "DispatchIndirect without a bound compute pipeline");
        }
        self.record(Command::DispatchIndirect {
            buffer: Arc::clone(buffer),
            offset,
        });
    }

    // ===== TRANSFER =====

    pub fn copy_buffer(&mut self, src: &Arc<Buffer>, dst: &Arc<Buffer>, regions: &[BufferCopy]) {
        self.assert_recording("CopyBuffer");
        self.assert_outside_render_pass("CopyBuffer");
        self.record(Command::CopyBuffer {
            src: Arc::clone(src),
            dst: Arc::clone(dst),
            regions: regions.to_vec(),
        });
    }

    pub fn copy_image(
        &mut self,
        src: &Arc<Image>,
        src_layout: ImageLayout,
        dst: &Arc<Image>,
        dst_layout: ImageLayout,
        regions: &[ImageCopy],
    ) {
        self.assert_recording("CopyImage");
        self.assert_outside_render_pass("CopyImage");
        self.record(Command::CopyImage {
            src: Arc::clone(src),
            src_layout,
            dst: Arc::clone(dst),
            dst_layout,
            regions: regions.to_vec(),
        });
    }

    pub fn copy_buffer_to_image(
        &mut self,
        src: &Arc<Buffer>,
        dst: &Arc<Image>,
        dst_layout: ImageLayout,
        regions: &[BufferImageCopy],
    ) {
        self.assert_recording("CopyBufferToImage");
        self.assert_outside_render_pass("CopyBufferToImage");
        self.record(Command::CopyBufferToImage {
            src: Arc::clone(src),
            dst: Arc::clone(dst),
            dst_layout,
            regions: regions.to_vec(),
        });
    }

    pub fn copy_image_to_buffer(
        &mut self,
        src: &Arc<Image>,
        src_layout: ImageLayout,
        dst: &Arc<Buffer>,
        regions: &[BufferImageCopy],
    ) {
        self.assert_recording("CopyImageToBuffer");
        self.assert_outside_render_pass("CopyImageToBuffer");
        self.record(Command::CopyImageToBuffer {
            src: Arc::clone(src),
            src_layout,
            dst: Arc::clone(dst),
            regions: regions.to_vec(),
        });
    }

    pub fn blit_image(
        &mut self,
        src: &Arc<Image>,
        src_layout: ImageLayout,
        dst: &Arc<Image>,
        dst_layout: ImageLayout,
        regions: &[ImageBlit],
        filter: Filter,
    ) {
        self.assert_recording("BlitImage");
        self.assert_outside_render_pass("BlitImage");
        self.record(Command::BlitImage {
            src: Arc::clone(src),
            src_layout,
            dst: Arc::clone(dst),
            dst_layout,
            regions: regions.to_vec(),
            filter,
        });
    }

    pub fn clear_color_image(
        &mut self,
        image: &Arc<Image>,
        layout: ImageLayout,
        color: ClearColorValue,
        ranges: &[ImageSubresourceRange],
    ) {
        self.assert_recording("ClearColorImage");
        self.assert_outside_render_pass("ClearColorImage");
        assert!(image.format().is_color(), "ClearColorImage on a depth/stencil image");
        self.record(Command::ClearColorImage {
            image: Arc::clone(image),
            layout,
            color,
            ranges: ranges.to_vec(),
        });
    }

    pub fn clear_depth_stencil_image(
        &mut self,
        image: &Arc<Image>,
        layout: ImageLayout,
        value: ClearDepthStencilValue,
        ranges: &[ImageSubresourceRange],
    ) {
        self.assert_recording("ClearDepthStencilImage");
        self.assert_outside_render_pass("ClearDepthStencilImage");
        assert!(image.format().is_depth_or_stencil(), "ClearDepthStencilImage on a color image");
        self.record(Command::ClearDepthStencilImage {
            image: Arc::clone(image),
            layout,
            value,
            ranges: ranges.to_vec(),
        });
    }

    /// Clear regions of the current subpass attachments
    pub fn clear_attachments(&mut self, attachments: &[ClearAttachment], rects: &[ClearRect]) {
        self.assert_recording("ClearAttachments");
        self.assert_inside_render_pass("ClearAttachments");
        self.record(Command::ClearAttachments {
            attachments: attachments.to_vec(),
            rects: rects.to_vec(),
        });
    }

    pub fn pipeline_barrier(
        &mut self,
        src_stage_mask: PipelineStageFlags,
        dst_stage_mask: PipelineStageFlags,
        memory_barriers: &[MemoryBarrier],
        buffer_barriers: &[BufferMemoryBarrier],
        image_barriers: &[ImageMemoryBarrier],
    ) {
        self.record(Command::PipelineBarrier {
            src_stage_mask,
            dst_stage_mask,
            memory_barriers: memory_barriers.to_vec(),
            buffer_barriers: buffer_barriers.to_vec(),
            image_barriers: image_barriers.to_vec(),
        });
    }

    // ===== RENDER PASS =====

    /// Open a render pass instance on subpass 0
    ///
    /// `clear_values` is indexed by attachment and must reach the highest
    /// attachment index that is cleared on load.
    pub fn begin_render_pass(&mut self, info: &RenderPassBeginInfo, contents: SubpassContents) {
        self.assert_recording("BeginRenderPass");
        self.assert_primary("BeginRenderPass");
        assert!(self.render_pass.is_none(), "BeginRenderPass inside an open render pass");
        assert_eq!(
            info.framebuffer.attachments().len(),
            info.render_pass.attachments().len(),
            "framebuffer {:?} is not compatible with render pass {:?}",
            info.framebuffer.id(),
            info.render_pass.id()
        );
        if let Some(max_clear) = info.render_pass.max_clear_attachment() {
            assert!(
                info.clear_values.len() > max_clear as usize,
                "{} clear values supplied but attachment {} is cleared",
                info.clear_values.len(),
                max_clear
            );
        }
        self.render_pass = Some(RenderPassScope {
            render_pass: Arc::clone(&info.render_pass),
            subpass: 0,
            contents,
            inherited: false,
        });
        self.record(Command::BeginRenderPass {
            info: info.clone(),
            contents,
        });
    }

    pub fn next_subpass(&mut self, contents: SubpassContents) {
        self.assert_recording("NextSubpass");
        self.assert_primary("NextSubpass");
        let Some(scope) = self.render_pass.as_mut() else {
            panic!("NextSubpass outside a render pass");
        };
        assert!(
            scope.subpass + 1 < scope.render_pass.subpass_count(),
            "NextSubpass past the last subpass ({} subpasses)",
            scope.render_pass.subpass_count()
        );
        scope.subpass += 1;
        scope.contents = contents;
        self.record(Command::NextSubpass(contents));
    }

    pub fn end_render_pass(&mut self) {
        self.assert_recording("EndRenderPass");
        self.assert_primary("EndRenderPass");
        let Some(scope) = self.render_pass.take() else {
            panic!("EndRenderPass outside a render pass");
        };
        assert_eq!(
            scope.subpass + 1,
            scope.render_pass.subpass_count(),
            "EndRenderPass before the last subpass"
        );
        self.record(Command::EndRenderPass);
    }

    // ===== QUERIES =====

    pub fn begin_query(&mut self, pool: &Arc<QueryPool>, query: u32, flags: QueryControlFlags) {
        self.assert_recording("BeginQuery");
        assert!(query < pool.count(), "query {} out of range", query);
        self.record(Command::BeginQuery {
            pool: Arc::clone(pool),
            query,
            flags,
        });
    }

    pub fn end_query(&mut self, pool: &Arc<QueryPool>, query: u32) {
        self.assert_recording("EndQuery");
        assert!(query < pool.count(), "query {} out of range", query);
        self.record(Command::EndQuery {
            pool: Arc::clone(pool),
            query,
        });
    }

    pub fn reset_query_pool(&mut self, pool: &Arc<QueryPool>, first: u32, count: u32) {
        self.assert_recording("ResetQueryPool");
        self.assert_outside_render_pass("ResetQueryPool");
        assert!(
            first.checked_add(count).is_some_and(|end| end <= pool.count()),
            "query range {}+{} out of range",
            first,
            count
        );
        self.record(Command::ResetQueryPool {
            pool: Arc::clone(pool),
            first,
            count,
        });
    }

    pub fn write_timestamp(&mut self, stage: PipelineStageFlags, pool: &Arc<QueryPool>, query: u32) {
        self.assert_recording("WriteTimestamp");
        assert!(query < pool.count(), "query {} out of range", query);
        self.record(Command::WriteTimestamp {
            stage,
            pool: Arc::clone(pool),
            query,
        });
    }

    // ===== SECONDARIES =====

    /// Replay executable secondary buffers inline
    ///
    /// Inside a render pass the current subpass must have been started with
    /// [`SubpassContents::SecondaryCommandBuffers`].
    pub fn execute_commands(&mut self, secondaries: &[&CommandBuffer]) {
        self.assert_recording("ExecuteCommands");
        self.assert_primary("ExecuteCommands");
        if let Some(scope) = &self.render_pass {
            assert!(
                scope.contents == SubpassContents::SecondaryCommandBuffers,
                "ExecuteCommands in a subpass recorded inline"
            );
        }
        let lists = secondaries
            .iter()
            .map(|secondary| {
                assert!(
                    secondary.level == CommandBufferLevel::Secondary,
                    "ExecuteCommands with primary command buffer {:?}",
                    secondary.id
                );
                match (&secondary.state, &secondary.list) {
                    (CommandBufferState::Executable, Some(list)) => list.clone(),
                    (state, _) => panic!(
                        "ExecuteCommands with command buffer {:?} in state {:?}",
                        secondary.id, state
                    ),
                }
            })
            .collect();
        self.record(Command::ExecuteCommands(lists));
    }
}

#[cfg(test)]
#[path = "command_buffer_tests.rs"]
mod tests;
