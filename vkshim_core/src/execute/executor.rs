/// Replay engine
///
/// Walks a frozen [`CommandList`] in order and turns each command into native
/// ops, routing every piece of ambient state through the context state stack.
/// Replay never fails: problems are reported on the debug channel and the
/// offending command is skipped.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::backend::{BackendCaps, NativeBackend, NativeOp, NativeOpList, QuerySlot, TextureRef};
use crate::command::{
    Command, CommandList, PipelineBindPoint, RenderPassBeginInfo,
};
use crate::debug_report::{message_code, DebugReportFlags, DebugReporter};
use crate::resource::{
    Buffer, ComputePipeline, DescriptorResource, DescriptorSet, DescriptorType, GraphicsPipeline,
    IndexType, ObjectType, PipelineLayout, ShaderStageFlags,
};
use crate::state::ContextStateStack;
use crate::validation::ValidationCache;

/// Render pass instance being replayed
pub(crate) struct ActiveRenderPass {
    pub(crate) info: RenderPassBeginInfo,
    pub(crate) subpass: u32,
}

/// Bindings recorded during replay, applied lazily at draw time
#[derive(Default)]
pub(crate) struct ReplayState {
    pub(crate) graphics_pipeline: Option<Arc<GraphicsPipeline>>,
    pub(crate) compute_pipeline: Option<Arc<ComputePipeline>>,
    pub(crate) vertex_buffers: FxHashMap<u32, (Arc<Buffer>, u64)>,
    pub(crate) index_buffer: Option<(Arc<Buffer>, u64, IndexType)>,
    pub(crate) render_pass: Option<ActiveRenderPass>,
}

pub(crate) struct Executor<'a, B: NativeBackend> {
    pub(crate) stack: &'a mut ContextStateStack,
    pub(crate) backend: &'a mut B,
    pub(crate) reporter: &'a DebugReporter,
    pub(crate) validation: &'a mut ValidationCache,
    pub(crate) ops: NativeOpList,
    pub(crate) replay: ReplayState,
}

/// Replay `list` on `backend`
///
/// Ops reach the backend in command order. Secondary lists referenced by
/// `ExecuteCommands` replay inline and share the bindings of the caller.
pub fn execute<B: NativeBackend>(
    list: &CommandList,
    stack: &mut ContextStateStack,
    backend: &mut B,
    reporter: &DebugReporter,
    validation: &mut ValidationCache,
) {
    let mut executor = Executor {
        stack,
        backend,
        reporter,
        validation,
        ops: NativeOpList::new(),
        replay: ReplayState::default(),
    };
    crate::vks_trace!("vkshim::executor", "replaying {:?} ({} commands)", list.id(), list.len());
    executor.replay_list(list);
}

impl<B: NativeBackend> Executor<'_, B> {
    fn replay_list(&mut self, list: &CommandList) {
        for command in list {
            self.replay_command(command);
            self.flush_ops();
        }
    }

    pub(crate) fn flush_ops(&mut self) {
        for op in self.ops.drain(..) {
            self.backend.execute(&op);
        }
    }

    pub(crate) fn report(&self, flags: DebugReportFlags, object_type: ObjectType, object: u64, code: i32, message: String) {
        self.reporter.report_message(flags, object_type, object, code, "vkshim::executor", message);
    }

    pub(crate) fn report_unsupported(&self, command: &str, reason: &str) {
        self.report(
            DebugReportFlags::WARNING,
            ObjectType::CommandBuffer,
            0,
            message_code::UNSUPPORTED_COMMAND,
            format!("Unsupported command {}: {}", command, reason),
        );
    }

    fn report_missing(&self, command: &str, what: &str) {
        self.report(
            DebugReportFlags::ERROR,
            ObjectType::CommandBuffer,
            0,
            message_code::MISSING_BINDING,
            format!("{} replayed without {}; skipped", command, what),
        );
    }

    pub(crate) fn has_cap(&self, cap: BackendCaps) -> bool {
        self.stack.capabilities().contains(cap)
    }

    fn replay_command(&mut self, command: &Command) {
        match command {
            Command::BindGraphicsPipeline(pipeline) => self.bind_graphics_pipeline(pipeline),
            Command::BindComputePipeline(pipeline) => {
                self.replay.compute_pipeline = Some(Arc::clone(pipeline));
            }
            Command::BindDescriptorSets { bind_point, layout, first_set, sets, dynamic_offsets } => {
                self.bind_descriptor_sets(*bind_point, layout, *first_set, sets, dynamic_offsets)
            }
            Command::BindVertexBuffers { first_binding, buffers, offsets } => {
                for (index, (buffer, offset)) in buffers.iter().zip(offsets).enumerate() {
                    self.replay
                        .vertex_buffers
                        .insert(first_binding + index as u32, (Arc::clone(buffer), *offset));
                }
            }
            Command::BindIndexBuffer { buffer, offset, index_type } => {
                self.replay.index_buffer = Some((Arc::clone(buffer), *offset, *index_type));
            }

            Command::SetViewport { first, viewports } => self.stack.set_viewports(*first, viewports, &mut self.ops),
            Command::SetScissor { first, scissors } => self.stack.set_scissors(*first, scissors, &mut self.ops),
            Command::SetLineWidth(width) => self.stack.set_line_width(*width, &mut self.ops),
            Command::SetDepthBias { constant_factor, clamp, slope_factor } => {
                self.stack.set_depth_bias(*constant_factor, *clamp, *slope_factor, &mut self.ops)
            }
            Command::SetBlendConstants(constants) => self.stack.set_blend_constants(*constants, &mut self.ops),
            Command::SetDepthBounds { min, max } => {
                if self.has_cap(BackendCaps::DEPTH_BOUNDS) {
                    self.stack.set_depth_bounds(*min, *max, &mut self.ops);
                } else {
                    self.report_unsupported("SetDepthBounds", "depth bounds test not available");
                }
            }
            Command::SetStencilCompareMask { faces, mask } => {
                self.stack.set_stencil_compare_mask(*faces, *mask, &mut self.ops)
            }
            Command::SetStencilWriteMask { faces, mask } => self.stack.set_stencil_write_mask(*faces, *mask, &mut self.ops),
            Command::SetStencilReference { faces, reference } => {
                self.stack.set_stencil_reference(*faces, *reference, &mut self.ops)
            }
            Command::PushConstants { stages, offset, data, .. } => self.push_constants(*stages, *offset, data),

            Command::Draw { vertex_count, instance_count, first_vertex, first_instance } => {
                let Some(pipeline) = self.prepare_draw("Draw", false) else { return };
                self.ops.push(NativeOp::Draw {
                    topology: pipeline.topology(),
                    vertex_count: *vertex_count,
                    instance_count: *instance_count,
                    first_vertex: *first_vertex,
                    first_instance: *first_instance,
                });
            }
            Command::DrawIndexed { index_count, instance_count, first_index, vertex_offset, first_instance } => {
                let Some(pipeline) = self.prepare_draw("DrawIndexed", true) else { return };
                let Some((_, _, index_type)) = self.replay.index_buffer else { return };
                self.ops.push(NativeOp::DrawIndexed {
                    topology: pipeline.topology(),
                    index_type,
                    index_count: *index_count,
                    instance_count: *instance_count,
                    first_index: *first_index,
                    vertex_offset: *vertex_offset,
                    first_instance: *first_instance,
                });
            }
            Command::DrawIndirect { buffer, offset, draw_count, stride } => {
                if !self.has_cap(BackendCaps::DRAW_INDIRECT) {
                    self.report_unsupported("DrawIndirect", "indirect draws not available");
                    return;
                }
                let Some(pipeline) = self.prepare_draw("DrawIndirect", false) else { return };
                self.ops.push(NativeOp::DrawIndirect {
                    topology: pipeline.topology(),
                    buffer: buffer.native(),
                    offset: *offset,
                    draw_count: *draw_count,
                    stride: *stride,
                });
            }
            Command::DrawIndexedIndirect { buffer, offset, draw_count, stride } => {
                if !self.has_cap(BackendCaps::DRAW_INDIRECT) {
                    self.report_unsupported("DrawIndexedIndirect", "indirect draws not available");
                    return;
                }
                let Some(pipeline) = self.prepare_draw("DrawIndexedIndirect", true) else { return };
                let Some((_, _, index_type)) = self.replay.index_buffer else { return };
                self.ops.push(NativeOp::DrawIndexedIndirect {
                    topology: pipeline.topology(),
                    index_type,
                    buffer: buffer.native(),
                    offset: *offset,
                    draw_count: *draw_count,
                    stride: *stride,
                });
            }
            Command::Dispatch { x, y, z } => {
                if self.prepare_dispatch("Dispatch") {
                    self.ops.push(NativeOp::Dispatch { x: *x, y: *y, z: *z });
                }
            }
            Command::DispatchIndirect { buffer, offset } => {
                if self.prepare_dispatch("DispatchIndirect") {
                    self.ops.push(NativeOp::DispatchIndirect { buffer: buffer.native(), offset: *offset });
                }
            }

            Command::CopyBuffer { src, dst, regions } => self.copy_buffer(src, dst, regions),
            Command::CopyImage { src, dst, regions, .. } => self.copy_image(src, dst, regions),
            Command::CopyBufferToImage { src, dst, regions, .. } => self.copy_buffer_to_image(src, dst, regions),
            Command::CopyImageToBuffer { src, dst, regions, .. } => self.copy_image_to_buffer(src, dst, regions),
            Command::BlitImage { src, dst, regions, filter, .. } => self.blit_image(src, dst, regions, *filter),
            Command::ClearColorImage { image, color, ranges, .. } => {
                self.clear_image(image, crate::command::ClearValue::Color(*color), ranges, "ClearColorImage")
            }
            Command::ClearDepthStencilImage { image, value, ranges, .. } => self.clear_image(
                image,
                crate::command::ClearValue::DepthStencil(*value),
                ranges,
                "ClearDepthStencilImage",
            ),
            Command::ClearAttachments { attachments, rects } => self.clear_attachments(attachments, rects),
            Command::PipelineBarrier { memory_barriers, buffer_barriers, image_barriers, .. } => {
                self.pipeline_barrier(memory_barriers, buffer_barriers, image_barriers)
            }

            Command::BeginRenderPass { info, .. } => self.begin_render_pass(info),
            Command::NextSubpass(_) => self.next_subpass(),
            Command::EndRenderPass => self.end_render_pass(),

            Command::BeginQuery { pool, query, .. } => self.ops.push(NativeOp::BeginQuery {
                query_type: pool.query_type(),
                query: QuerySlot { pool: pool.id(), index: *query },
            }),
            Command::EndQuery { pool, query } => self.ops.push(NativeOp::EndQuery {
                query_type: pool.query_type(),
                query: QuerySlot { pool: pool.id(), index: *query },
            }),
            Command::ResetQueryPool { pool, first, count } => self.ops.push(NativeOp::ResetQueries {
                pool: pool.id(),
                first: *first,
                count: *count,
            }),
            Command::WriteTimestamp { pool, query, .. } => {
                if self.has_cap(BackendCaps::TIMESTAMP_QUERY) {
                    self.ops.push(NativeOp::WriteTimestamp { query: QuerySlot { pool: pool.id(), index: *query } });
                } else {
                    self.report_unsupported("WriteTimestamp", "timestamp queries not available");
                }
            }

            Command::ExecuteCommands(lists) => {
                for list in lists {
                    self.flush_ops();
                    self.replay_list(list);
                }
            }
        }
    }

    // ===== PIPELINES =====

    fn bind_graphics_pipeline(&mut self, pipeline: &Arc<GraphicsPipeline>) {
        self.replay.graphics_pipeline = Some(Arc::clone(pipeline));
        self.stack.use_program(pipeline.program(), &mut self.ops);
        self.stack.set_vertex_layout(pipeline.vertex_input(), &mut self.ops);
        self.stack.apply_pipeline_state(pipeline.state(), &mut self.ops);
        self.validate_bound_pipeline();
    }

    /// Re-apply the bound graphics pipeline after render pass steps changed state
    pub(crate) fn reapply_graphics_pipeline(&mut self) {
        if let Some(pipeline) = self.replay.graphics_pipeline.clone() {
            self.stack.apply_pipeline_state(pipeline.state(), &mut self.ops);
        }
    }

    /// Validate the bound pipeline against the active subpass
    pub(crate) fn validate_bound_pipeline(&mut self) {
        let (Some(pipeline), Some(active)) = (&self.replay.graphics_pipeline, &self.replay.render_pass) else {
            return;
        };
        self.validation
            .validate(pipeline, &active.info.render_pass, active.subpass, self.reporter);
    }

    /// Program, vertex layout and buffers for a draw
    fn prepare_draw(&mut self, command: &str, indexed: bool) -> Option<Arc<GraphicsPipeline>> {
        let Some(pipeline) = self.replay.graphics_pipeline.clone() else {
            self.report_missing(command, "a bound graphics pipeline");
            return None;
        };
        if indexed && self.replay.index_buffer.is_none() {
            self.report_missing(command, "a bound index buffer");
            return None;
        }
        if self.replay.render_pass.is_none() {
            self.report_missing(command, "an active render pass");
            return None;
        }

        self.stack.use_program(pipeline.program(), &mut self.ops);
        self.stack.set_vertex_layout(pipeline.vertex_input(), &mut self.ops);
        for binding in &pipeline.vertex_input().bindings {
            match self.replay.vertex_buffers.get(&binding.binding) {
                Some((buffer, offset)) => self.stack.bind_vertex_buffer(
                    binding.binding,
                    buffer.native(),
                    *offset,
                    binding.stride,
                    binding.input_rate,
                    &mut self.ops,
                ),
                None => self.report(
                    DebugReportFlags::WARNING,
                    ObjectType::Pipeline,
                    pipeline.id().raw(),
                    message_code::MISSING_BINDING,
                    format!("{}: no vertex buffer bound at binding {}", command, binding.binding),
                ),
            }
        }
        if indexed {
            if let Some((buffer, offset, index_type)) = &self.replay.index_buffer {
                self.stack.bind_index_buffer(buffer.native(), *offset, *index_type, &mut self.ops);
            }
        }
        Some(pipeline)
    }

    fn prepare_dispatch(&mut self, command: &str) -> bool {
        if !self.has_cap(BackendCaps::COMPUTE) {
            self.report_unsupported(command, "compute not available");
            return false;
        }
        let Some(pipeline) = self.replay.compute_pipeline.clone() else {
            self.report_missing(command, "a bound compute pipeline");
            return false;
        };
        self.stack.use_program(pipeline.program(), &mut self.ops);
        true
    }

    // ===== DESCRIPTORS =====

    fn bind_descriptor_sets(
        &mut self,
        bind_point: PipelineBindPoint,
        layout: &PipelineLayout,
        first_set: u32,
        sets: &[Arc<DescriptorSet>],
        dynamic_offsets: &[u32],
    ) {
        let mut dynamic_offsets = dynamic_offsets.iter().copied();
        for (index, set) in sets.iter().enumerate() {
            let base = layout.binding_base(first_set + index as u32);
            for entry in set.entries() {
                let slot = base + entry.binding + entry.array_element;
                let dynamic_offset = if entry.descriptor_type.is_dynamic() {
                    dynamic_offsets.next().unwrap_or(0) as u64
                } else {
                    0
                };
                match &entry.resource {
                    DescriptorResource::Buffer { buffer, offset, range } => {
                        let offset = offset + dynamic_offset;
                        let size = buffer.range_size(offset, *range);
                        let op = match entry.descriptor_type {
                            DescriptorType::UniformBuffer | DescriptorType::UniformBufferDynamic => {
                                NativeOp::BindUniformBuffer { binding: slot, buffer: buffer.native(), offset, size }
                            }
                            _ => NativeOp::BindStorageBuffer { binding: slot, buffer: buffer.native(), offset, size },
                        };
                        self.ops.push(op);
                    }
                    DescriptorResource::Image { view, sampler, .. } => {
                        let range = view.subresource_range();
                        let texture = TextureRef::of_image(view.image());
                        let op = match entry.descriptor_type {
                            DescriptorType::StorageImage => NativeOp::BindStorageImage {
                                unit: slot,
                                texture,
                                format: view.format(),
                                level: range.base_mip_level,
                                layer: (range.layer_count == 1 && view.image().array_layers() > 1)
                                    .then_some(range.base_array_layer),
                            },
                            _ => NativeOp::BindTexture {
                                unit: slot,
                                texture,
                                format: view.format(),
                                base_level: range.base_mip_level,
                                level_count: range.level_count,
                                sampler: *sampler,
                            },
                        };
                        self.ops.push(op);
                    }
                }
            }
        }
        if bind_point == PipelineBindPoint::Compute && !self.has_cap(BackendCaps::COMPUTE) {
            self.report_unsupported("BindDescriptorSets", "compute bind point not available");
        }
    }

    fn push_constants(&mut self, stages: ShaderStageFlags, offset: u32, data: &[u8]) {
        let max = self.stack.limits().max_push_constant_size;
        let end = offset as u64 + data.len() as u64;
        let data = if end > max as u64 {
            self.report(
                DebugReportFlags::WARNING,
                ObjectType::PipelineLayout,
                0,
                message_code::LIMIT_EXCEEDED,
                format!("push constants {}..{} exceed the backend's {} bytes", offset, end, max),
            );
            &data[..max.saturating_sub(offset) as usize]
        } else {
            data
        };
        if !data.is_empty() {
            self.ops.push(NativeOp::PushConstants { stages, offset, data: data.to_vec() });
        }
    }
}
