use super::*;
use super::render_pass_emulation::begin_clears;
use super::transfer::barrier_bits;
use std::sync::{Arc, Mutex};
use glam::{IVec3, UVec3};
use crate::backend::{
    AttachmentPoint, BackendCaps, BackendLimits, BarrierBits, FramebufferObject, FramebufferTarget,
    NativeBackend, NativeOp, NullBackend,
};
use crate::command::{
    AccessFlags, ClearAttachment, ClearColorValue, ClearDepthStencilValue, ClearRect, ClearValue, Command,
    CommandBuffer, CommandBufferLevel, CommandBufferUsageFlags, CommandList, CommandPool,
    CommandPoolCreateFlags, ImageCopy, MemoryBarrier, PipelineBindPoint, PipelineStageFlags,
    RenderPassBeginInfo, SubpassContents,
};
use crate::debug_report::{message_code, DebugMessage, DebugReportFlags, DebugReporter};
use crate::resource::{
    AttachmentDescription, AttachmentLoadOp, AttachmentReference, AttachmentStoreOp, Buffer,
    BufferCreateInfo, BufferUsageFlags, DescriptorResource, DescriptorSet, DescriptorSetLayout,
    DescriptorSetLayoutBinding, DescriptorType, DescriptorWrite, Format, Framebuffer, FramebufferCreateInfo,
    GraphicsPipeline, GraphicsPipelineCreateInfo, Image, ImageAspectFlags, ImageCreateInfo, ImageLayout,
    ImageSubresourceLayers, ImageSubresourceRange, ImageUsageFlags, ImageView, InputAssemblyState,
    NativeHandle, PipelineLayout, PrimitiveTopology, Rect2D, RenderPass, RenderPassCreateInfo,
    ShaderDataType, ShaderInterface, ShaderStageFlags, ShaderVariable, SubpassDescription,
    VertexInputAttributeDescription, VertexInputBindingDescription, VertexInputRate, VertexInputState,
    REMAINING_ARRAY_LAYERS, REMAINING_MIP_LEVELS, WHOLE_SIZE,
};
use crate::state::{deactivated_rasterization_state, ContextStateStack};
use crate::validation::ValidationCache;

// ===== FIXTURES =====

struct Harness {
    stack: ContextStateStack,
    backend: NullBackend,
    reporter: DebugReporter,
    validation: ValidationCache,
    messages: Arc<Mutex<Vec<DebugMessage>>>,
}

impl Harness {
    fn new(caps: BackendCaps) -> Self {
        let backend = NullBackend::with_capabilities(caps);
        let reporter = DebugReporter::new();
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&messages);
        reporter.register(DebugReportFlags::all(), move |message: &DebugMessage| {
            sink.lock().unwrap().push(message.clone());
        });
        Self {
            stack: ContextStateStack::new(backend.capabilities(), backend.limits(), reporter.clone()),
            backend,
            reporter,
            validation: ValidationCache::new(true),
            messages,
        }
    }

    fn run(&mut self, list: &CommandList) -> Vec<NativeOp> {
        execute(list, &mut self.stack, &mut self.backend, &self.reporter, &mut self.validation);
        self.backend.take_calls()
    }

    fn codes(&self) -> Vec<i32> {
        self.messages.lock().unwrap().iter().map(|m| m.message_code).collect()
    }

    fn messages(&self) -> Vec<DebugMessage> {
        self.messages.lock().unwrap().clone()
    }
}

fn record(body: impl FnOnce(&mut CommandBuffer)) -> CommandList {
    let pool = CommandPool::new(CommandPoolCreateFlags::empty());
    let mut command_buffer = pool.allocate(CommandBufferLevel::Primary);
    command_buffer.begin(CommandBufferUsageFlags::empty()).unwrap();
    body(&mut command_buffer);
    command_buffer.end().unwrap();
    command_buffer.command_list().unwrap().clone()
}

fn image(format: Format, extent: UVec3, mip_levels: u32, array_layers: u32, host_visible: bool) -> Arc<Image> {
    Image::new(
        ImageCreateInfo {
            format,
            extent,
            mip_levels,
            array_layers,
            usage: ImageUsageFlags::COLOR_ATTACHMENT
                | ImageUsageFlags::TRANSFER_SRC
                | ImageUsageFlags::TRANSFER_DST,
            host_visible,
            ..Default::default()
        },
        NativeHandle(100),
    )
    .unwrap()
}

fn target(format: Format, host_visible: bool) -> Arc<ImageView> {
    ImageView::simple_2d(&image(format, UVec3::new(64, 64, 1), 1, 1, host_visible)).unwrap()
}

fn buffer(size: u64, native: u64) -> Arc<Buffer> {
    Buffer::new(
        BufferCreateInfo {
            size,
            usage: BufferUsageFlags::all(),
            host_visible: false,
        },
        NativeHandle(native),
    )
    .unwrap()
}

fn color_pass(descriptions: Vec<AttachmentDescription>) -> Arc<RenderPass> {
    let color_attachments = (0..descriptions.len() as u32)
        .map(|index| AttachmentReference::new(index, ImageLayout::ColorAttachmentOptimal))
        .collect();
    RenderPass::new(RenderPassCreateInfo {
        attachments: descriptions,
        subpasses: vec![SubpassDescription { color_attachments, ..Default::default() }],
        dependencies: Vec::new(),
    })
    .unwrap()
}

fn framebuffer(render_pass: &Arc<RenderPass>, views: Vec<Arc<ImageView>>) -> Arc<Framebuffer> {
    Framebuffer::new(FramebufferCreateInfo {
        render_pass: Arc::clone(render_pass),
        attachments: views,
        width: 64,
        height: 64,
        layers: 1,
    })
    .unwrap()
}

fn begin_info(render_pass: &Arc<RenderPass>, framebuffer: &Arc<Framebuffer>, clear_values: Vec<ClearValue>) -> RenderPassBeginInfo {
    RenderPassBeginInfo {
        render_pass: Arc::clone(render_pass),
        framebuffer: Arc::clone(framebuffer),
        render_area: Rect2D::new(0, 0, 64, 64),
        clear_values,
    }
}

fn pipeline(render_pass: &Arc<RenderPass>, input: ShaderDataType) -> Arc<GraphicsPipeline> {
    GraphicsPipeline::new(GraphicsPipelineCreateInfo {
        program: NativeHandle(7),
        interface: ShaderInterface {
            inputs: vec![ShaderVariable::new("position", input, Some(0))],
            outputs: vec![ShaderVariable::new("color", ShaderDataType::Vec4, Some(0))],
        },
        vertex_input: VertexInputState {
            bindings: vec![VertexInputBindingDescription { binding: 0, stride: 16, input_rate: VertexInputRate::Vertex }],
            attributes: vec![VertexInputAttributeDescription {
                location: 0,
                binding: 0,
                format: Format::R32G32B32A32_SFLOAT,
                offset: 0,
            }],
        },
        input_assembly: InputAssemblyState { topology: PrimitiveTopology::TriangleList, primitive_restart_enable: false },
        tessellation: None,
        viewport: None,
        rasterization: deactivated_rasterization_state(),
        multisample: None,
        depth_stencil: None,
        color_blend: None,
        dynamic_states: Vec::new(),
        layout: PipelineLayout::new(Vec::new(), Vec::new()),
        render_pass: Arc::clone(render_pass),
        subpass: 0,
    })
    .unwrap()
}

fn position(ops: &[NativeOp], predicate: impl Fn(&NativeOp) -> bool) -> usize {
    ops.iter().position(predicate).unwrap_or_else(|| panic!("op not found in {:#?}", ops))
}

fn color(value: f32) -> ClearValue {
    ClearValue::Color(ClearColorValue::Float32([value; 4]))
}

// ===== RENDER PASS =====

#[test]
fn test_begin_clears_match_clear_values_positionally() {
    let render_pass = color_pass(vec![
        AttachmentDescription::color(Format::R8G8B8A8_UNORM, AttachmentLoadOp::Clear, AttachmentStoreOp::Store),
        AttachmentDescription::color(Format::R8G8B8A8_UNORM, AttachmentLoadOp::Load, AttachmentStoreOp::Store),
        AttachmentDescription::color(Format::R8G8B8A8_UNORM, AttachmentLoadOp::Clear, AttachmentStoreOp::Store),
    ]);
    let ops = begin_clears(&render_pass, &[color(0.0), color(1.0), color(2.0)]);
    assert_eq!(
        ops,
        vec![
            NativeOp::ClearColorAttachment { slot: 0, value: ClearColorValue::Float32([0.0; 4]) },
            NativeOp::ClearColorAttachment { slot: 2, value: ClearColorValue::Float32([2.0; 4]) },
        ]
    );
}

fn subpass_over(attachments: &[u32]) -> SubpassDescription {
    SubpassDescription {
        color_attachments: attachments
            .iter()
            .map(|&index| AttachmentReference::new(index, ImageLayout::ColorAttachmentOptimal))
            .collect(),
        ..Default::default()
    }
}

fn clearing_color() -> AttachmentDescription {
    AttachmentDescription::color(Format::R8G8B8A8_UNORM, AttachmentLoadOp::Clear, AttachmentStoreOp::Store)
}

#[test]
fn test_begin_clears_follow_reordered_references() {
    let render_pass = RenderPass::new(RenderPassCreateInfo {
        attachments: vec![clearing_color(), clearing_color()],
        subpasses: vec![subpass_over(&[1, 0])],
        dependencies: Vec::new(),
    })
    .unwrap();
    let ops = begin_clears(&render_pass, &[color(0.0), color(1.0)]);
    assert_eq!(
        ops,
        vec![
            NativeOp::ClearColorAttachment { slot: 0, value: ClearColorValue::Float32([1.0; 4]) },
            NativeOp::ClearColorAttachment { slot: 1, value: ClearColorValue::Float32([0.0; 4]) },
        ]
    );
}

#[test]
fn test_begin_clears_skip_attachments_of_later_subpasses() {
    let render_pass = RenderPass::new(RenderPassCreateInfo {
        attachments: vec![clearing_color(), clearing_color()],
        subpasses: vec![subpass_over(&[1]), subpass_over(&[0])],
        dependencies: Vec::new(),
    })
    .unwrap();
    let ops = begin_clears(&render_pass, &[color(0.0), color(1.0)]);
    assert_eq!(ops, vec![NativeOp::ClearColorAttachment { slot: 0, value: ClearColorValue::Float32([1.0; 4]) }]);
}

#[test]
fn test_begin_clears_merge_depth_and_stencil() {
    let mut depth = AttachmentDescription::depth_stencil(
        Format::D24_UNORM_S8_UINT,
        AttachmentLoadOp::Clear,
        AttachmentStoreOp::DontCare,
    );
    depth.stencil_load_op = AttachmentLoadOp::Load;
    let render_pass = RenderPass::new(RenderPassCreateInfo {
        attachments: vec![depth],
        subpasses: vec![SubpassDescription {
            depth_stencil_attachment: Some(AttachmentReference::new(0, ImageLayout::DepthStencilAttachmentOptimal)),
            ..Default::default()
        }],
        dependencies: Vec::new(),
    })
    .unwrap();
    let ops = begin_clears(
        &render_pass,
        &[ClearValue::DepthStencil(ClearDepthStencilValue { depth: 0.5, stencil: 3 })],
    );
    assert_eq!(ops, vec![NativeOp::ClearDepthStencilAttachment { depth: Some(0.5), stencil: None }]);
}

#[test]
fn test_render_pass_binds_clears_and_downloads() {
    let render_pass = color_pass(vec![AttachmentDescription::color(
        Format::R8G8B8A8_UNORM,
        AttachmentLoadOp::Clear,
        AttachmentStoreOp::Store,
    )]);
    let framebuffer = framebuffer(&render_pass, vec![target(Format::R8G8B8A8_UNORM, true)]);
    let info = begin_info(&render_pass, &framebuffer, vec![color(0.25)]);
    let list = record(|cb| {
        cb.begin_render_pass(&info, SubpassContents::Inline);
        cb.end_render_pass();
    });

    let mut harness = Harness::new(BackendCaps::all());
    let ops = harness.run(&list);
    let fbo = FramebufferObject::Framebuffer(framebuffer.id());

    let bind = position(&ops, |op| {
        *op == NativeOp::BindFramebuffer { target: FramebufferTarget::Both, framebuffer: fbo }
    });
    let attach = position(&ops, |op| matches!(op, NativeOp::AttachImage { framebuffer, .. } if *framebuffer == fbo));
    let draw_buffers = position(&ops, |op| {
        *op == NativeOp::SetDrawBuffers { framebuffer: fbo, points: vec![AttachmentPoint::Color(0)] }
    });
    let clear = position(&ops, |op| matches!(op, NativeOp::ClearColorAttachment { slot: 0, .. }));
    let download = position(&ops, |op| matches!(op, NativeOp::DownloadImage { buffer: None, .. }));
    assert!(bind < attach && attach < draw_buffers && draw_buffers < clear && clear < download);
    assert!(!ops.iter().any(|op| matches!(op, NativeOp::InvalidateAttachments { .. })));
    assert_eq!(harness.backend.framebuffer_object_count(), 1);
}

#[test]
fn test_render_pass_invalidates_discarded_attachments() {
    let render_pass = color_pass(vec![AttachmentDescription::color(
        Format::R8G8B8A8_UNORM,
        AttachmentLoadOp::DontCare,
        AttachmentStoreOp::DontCare,
    )]);
    let framebuffer = framebuffer(&render_pass, vec![target(Format::R8G8B8A8_UNORM, true)]);
    let info = begin_info(&render_pass, &framebuffer, Vec::new());
    let list = record(|cb| {
        cb.begin_render_pass(&info, SubpassContents::Inline);
        cb.end_render_pass();
    });

    let ops = Harness::new(BackendCaps::all()).run(&list);
    assert!(ops.contains(&NativeOp::InvalidateAttachments {
        framebuffer: FramebufferObject::Framebuffer(framebuffer.id()),
        points: vec![AttachmentPoint::Color(0)],
    }));
    assert!(!ops.iter().any(|op| matches!(op, NativeOp::DownloadImage { .. })));

    let ops = Harness::new(BackendCaps::all() - BackendCaps::INVALIDATE_FRAMEBUFFER).run(&list);
    assert!(!ops.iter().any(|op| matches!(op, NativeOp::InvalidateAttachments { .. })));
}

#[test]
fn test_second_pass_on_same_framebuffer_reuses_attachments() {
    let render_pass = color_pass(vec![AttachmentDescription::color(
        Format::R8G8B8A8_UNORM,
        AttachmentLoadOp::Load,
        AttachmentStoreOp::Store,
    )]);
    let framebuffer = framebuffer(&render_pass, vec![target(Format::R8G8B8A8_UNORM, false)]);
    let info = begin_info(&render_pass, &framebuffer, Vec::new());
    let list = record(|cb| {
        cb.begin_render_pass(&info, SubpassContents::Inline);
        cb.end_render_pass();
    });

    let mut harness = Harness::new(BackendCaps::all());
    let first = harness.run(&list);
    let second = harness.run(&list);
    assert!(first.iter().any(|op| matches!(op, NativeOp::AttachImage { .. })));
    assert!(!second.iter().any(|op| matches!(op, NativeOp::AttachImage { .. } | NativeOp::BindFramebuffer { .. })));
}

// ===== DRAWS =====

#[test]
fn test_draw_applies_program_and_vertex_buffers() {
    let render_pass = color_pass(vec![AttachmentDescription::color(
        Format::R8G8B8A8_UNORM,
        AttachmentLoadOp::Load,
        AttachmentStoreOp::Store,
    )]);
    let framebuffer = framebuffer(&render_pass, vec![target(Format::R8G8B8A8_UNORM, false)]);
    let info = begin_info(&render_pass, &framebuffer, Vec::new());
    let pipeline = pipeline(&render_pass, ShaderDataType::Vec4);
    let vertices = buffer(256, 42);
    let list = record(|cb| {
        cb.begin_render_pass(&info, SubpassContents::Inline);
        cb.bind_graphics_pipeline(&pipeline);
        cb.bind_vertex_buffers(0, &[Arc::clone(&vertices)], &[32]);
        cb.draw(3, 1, 0, 0);
        cb.end_render_pass();
    });

    let mut harness = Harness::new(BackendCaps::all());
    let ops = harness.run(&list);
    let program = position(&ops, |op| *op == NativeOp::UseProgram(NativeHandle(7)));
    let vertex_buffer = position(&ops, |op| {
        *op == NativeOp::BindVertexBuffer {
            binding: 0,
            buffer: NativeHandle(42),
            offset: 32,
            stride: 16,
            input_rate: VertexInputRate::Vertex,
        }
    });
    let draw = position(&ops, |op| {
        *op == NativeOp::Draw {
            topology: PrimitiveTopology::TriangleList,
            vertex_count: 3,
            instance_count: 1,
            first_vertex: 0,
            first_instance: 0,
        }
    });
    assert!(program < vertex_buffer && vertex_buffer < draw);
    assert_eq!(ops.iter().filter(|op| matches!(op, NativeOp::UseProgram(_))).count(), 1);
    assert!(harness.codes().is_empty());
}

#[test]
fn test_draw_without_pipeline_is_skipped_and_reported() {
    let list = CommandList::new(vec![Command::Draw {
        vertex_count: 3,
        instance_count: 1,
        first_vertex: 0,
        first_instance: 0,
    }]);
    let mut harness = Harness::new(BackendCaps::all());
    let ops = harness.run(&list);
    assert!(!ops.iter().any(|op| matches!(op, NativeOp::Draw { .. })));
    assert_eq!(harness.codes(), vec![message_code::MISSING_BINDING]);
}

#[test]
fn test_indirect_draw_needs_capability() {
    let list = CommandList::new(vec![Command::DrawIndirect {
        buffer: buffer(64, 5),
        offset: 0,
        draw_count: 1,
        stride: 16,
    }]);
    let mut harness = Harness::new(BackendCaps::all() - BackendCaps::DRAW_INDIRECT);
    let ops = harness.run(&list);
    assert!(ops.is_empty());
    assert_eq!(harness.codes(), vec![message_code::UNSUPPORTED_COMMAND]);
}

#[test]
fn test_interface_mismatch_reported_once_per_pairing() {
    let render_pass = color_pass(vec![AttachmentDescription::color(
        Format::R8G8B8A8_UNORM,
        AttachmentLoadOp::Load,
        AttachmentStoreOp::Store,
    )]);
    let framebuffer = framebuffer(&render_pass, vec![target(Format::R8G8B8A8_UNORM, false)]);
    let info = begin_info(&render_pass, &framebuffer, Vec::new());
    let pipeline = pipeline(&render_pass, ShaderDataType::Vec2);
    let list = record(|cb| {
        cb.begin_render_pass(&info, SubpassContents::Inline);
        cb.bind_graphics_pipeline(&pipeline);
        cb.bind_graphics_pipeline(&pipeline);
        cb.end_render_pass();
    });

    let mut harness = Harness::new(BackendCaps::all());
    harness.run(&list);
    harness.run(&list);
    let mismatches: Vec<DebugMessage> = harness
        .messages()
        .into_iter()
        .filter(|m| m.message_code == message_code::INTERFACE_MISMATCH)
        .collect();
    assert_eq!(mismatches.len(), 1);
    assert!(mismatches[0].flags.contains(DebugReportFlags::ERROR));
}

#[test]
fn test_validated_pairings_of_dropped_pipelines_are_evicted() {
    let render_pass = color_pass(vec![AttachmentDescription::color(
        Format::R8G8B8A8_UNORM,
        AttachmentLoadOp::Load,
        AttachmentStoreOp::Store,
    )]);
    let framebuffer = framebuffer(&render_pass, vec![target(Format::R8G8B8A8_UNORM, false)]);
    let info = begin_info(&render_pass, &framebuffer, Vec::new());
    let bind = |pipeline: &Arc<GraphicsPipeline>| {
        record(|cb| {
            cb.begin_render_pass(&info, SubpassContents::Inline);
            cb.bind_graphics_pipeline(pipeline);
            cb.end_render_pass();
        })
    };

    let mut harness = Harness::new(BackendCaps::all());
    let first = pipeline(&render_pass, ShaderDataType::Vec4);
    let list = bind(&first);
    harness.run(&list);
    assert_eq!(harness.validation.len(), 1);

    drop(list);
    drop(first);
    let second = pipeline(&render_pass, ShaderDataType::Vec4);
    harness.run(&bind(&second));
    assert_eq!(harness.validation.len(), 1);

    drop(second);
    harness.validation.evict_dropped();
    assert!(harness.validation.is_empty());
}

// ===== DESCRIPTORS / CONSTANTS =====

#[test]
fn test_descriptor_sets_map_to_flat_slots() {
    let binding = |binding: u32, descriptor_type: DescriptorType| DescriptorSetLayoutBinding {
        binding,
        descriptor_type,
        descriptor_count: 1,
        stages: ShaderStageFlags::VERTEX,
    };
    let set0 = DescriptorSetLayout::new(vec![binding(0, DescriptorType::UniformBuffer)]).unwrap();
    let set1 = DescriptorSetLayout::new(vec![
        binding(0, DescriptorType::UniformBufferDynamic),
        binding(1, DescriptorType::StorageBuffer),
    ])
    .unwrap();
    let layout = PipelineLayout::new(vec![set0, Arc::clone(&set1)], Vec::new());
    let data = buffer(1024, 9);
    let write = |binding: u32, offset: u64, range: u64| DescriptorWrite {
        binding,
        array_element: 0,
        resources: vec![DescriptorResource::Buffer { buffer: Arc::clone(&data), offset, range }],
    };
    let set = DescriptorSet::new(&set1, vec![write(0, 0, 64), write(1, 16, WHOLE_SIZE)]).unwrap();

    let list = CommandList::new(vec![Command::BindDescriptorSets {
        bind_point: PipelineBindPoint::Graphics,
        layout,
        first_set: 1,
        sets: vec![set],
        dynamic_offsets: vec![256],
    }]);
    let ops = Harness::new(BackendCaps::all()).run(&list);
    assert_eq!(
        ops,
        vec![
            NativeOp::BindUniformBuffer { binding: 1, buffer: NativeHandle(9), offset: 256, size: 64 },
            NativeOp::BindStorageBuffer { binding: 2, buffer: NativeHandle(9), offset: 16, size: 1008 },
        ]
    );
}

#[test]
fn test_push_constants_clamped_to_limit() {
    let list = CommandList::new(vec![Command::PushConstants {
        layout: PipelineLayout::new(Vec::new(), Vec::new()),
        stages: ShaderStageFlags::VERTEX,
        offset: 120,
        data: vec![1; 16],
    }]);
    let mut harness = Harness::new(BackendCaps::all());
    assert_eq!(harness.backend.limits(), BackendLimits::default());
    let ops = harness.run(&list);
    assert_eq!(
        ops,
        vec![NativeOp::PushConstants { stages: ShaderStageFlags::VERTEX, offset: 120, data: vec![1; 8] }]
    );
    assert_eq!(harness.codes(), vec![message_code::LIMIT_EXCEEDED]);
}

// ===== TRANSFER =====

fn copy_region(layers: u32) -> ImageCopy {
    let subresource = ImageSubresourceLayers {
        aspect_mask: ImageAspectFlags::COLOR,
        mip_level: 0,
        base_array_layer: 1,
        layer_count: layers,
    };
    ImageCopy {
        src_subresource: subresource,
        src_offset: IVec3::ZERO,
        dst_subresource: subresource,
        dst_offset: IVec3::new(4, 4, 0),
        extent: UVec3::new(8, 8, 1),
    }
}

#[test]
fn test_copy_image_uses_native_copy() {
    let src = image(Format::R8G8B8A8_UNORM, UVec3::new(32, 32, 1), 1, 4, false);
    let dst = image(Format::R8G8B8A8_UNORM, UVec3::new(32, 32, 1), 1, 4, false);
    let list = CommandList::new(vec![Command::CopyImage {
        src: Arc::clone(&src),
        src_layout: ImageLayout::TransferSrcOptimal,
        dst: Arc::clone(&dst),
        dst_layout: ImageLayout::TransferDstOptimal,
        regions: vec![copy_region(2)],
    }]);
    let ops = Harness::new(BackendCaps::all()).run(&list);
    assert_eq!(ops.len(), 1);
    match &ops[0] {
        NativeOp::CopyImageSubData { src_offset, dst_offset, extent, .. } => {
            assert_eq!(*src_offset, IVec3::new(0, 0, 1));
            assert_eq!(*dst_offset, IVec3::new(4, 4, 1));
            assert_eq!(*extent, UVec3::new(8, 8, 2));
        }
        other => panic!("unexpected op {:?}", other),
    }
}

#[test]
fn test_copy_image_falls_back_to_blits() {
    let src = image(Format::R8G8B8A8_UNORM, UVec3::new(32, 32, 1), 1, 4, false);
    let dst = image(Format::R8G8B8A8_UNORM, UVec3::new(32, 32, 1), 1, 4, false);
    let list = CommandList::new(vec![Command::CopyImage {
        src,
        src_layout: ImageLayout::TransferSrcOptimal,
        dst,
        dst_layout: ImageLayout::TransferDstOptimal,
        regions: vec![copy_region(2)],
    }]);
    let ops = Harness::new(BackendCaps::all() - BackendCaps::COPY_IMAGE).run(&list);

    let blits: Vec<&NativeOp> = ops.iter().filter(|op| matches!(op, NativeOp::BlitFramebuffer { .. })).collect();
    assert_eq!(blits.len(), 2);
    assert_eq!(
        *blits[0],
        NativeOp::BlitFramebuffer {
            src_offsets: [IVec3::ZERO, IVec3::new(8, 8, 1)],
            dst_offsets: [IVec3::new(4, 4, 0), IVec3::new(12, 12, 1)],
            mask: ImageAspectFlags::COLOR,
            filter: crate::command::Filter::Nearest,
        }
    );
    assert_eq!(
        ops.first(),
        Some(&NativeOp::BindFramebuffer { target: FramebufferTarget::Read, framebuffer: FramebufferObject::BlitSource })
    );
    assert_eq!(
        ops.last(),
        Some(&NativeOp::BindFramebuffer { target: FramebufferTarget::Both, framebuffer: FramebufferObject::Default })
    );
}

#[test]
fn test_clear_color_image_per_level() {
    let texture = image(Format::R8G8B8A8_UNORM, UVec3::new(16, 16, 1), 3, 1, false);
    let list = CommandList::new(vec![Command::ClearColorImage {
        image: texture,
        layout: ImageLayout::TransferDstOptimal,
        color: ClearColorValue::Float32([1.0; 4]),
        ranges: vec![ImageSubresourceRange {
            aspect_mask: ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: REMAINING_MIP_LEVELS,
            base_array_layer: 0,
            layer_count: REMAINING_ARRAY_LAYERS,
        }],
    }]);

    let ops = Harness::new(BackendCaps::all()).run(&list);
    let levels: Vec<u32> = ops
        .iter()
        .filter_map(|op| match op {
            NativeOp::ClearTexImage { level, layer_count: 1, .. } => Some(*level),
            _ => None,
        })
        .collect();
    assert_eq!(levels, vec![0, 1, 2]);

    let mut harness = Harness::new(BackendCaps::all() - BackendCaps::CLEAR_TEX_IMAGE);
    assert!(harness.run(&list).is_empty());
    let messages = harness.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message_code, message_code::UNSUPPORTED_COMMAND);
    assert!(messages[0].message.contains("Unsupported command"));
}

#[test]
fn test_clear_attachments_restores_scissor() {
    let saved = Rect2D::new(0, 0, 64, 64);
    let cleared = Rect2D::new(8, 8, 16, 16);
    let list = CommandList::new(vec![
        Command::SetScissor { first: 0, scissors: vec![saved] },
        Command::ClearAttachments {
            attachments: vec![ClearAttachment {
                aspect_mask: ImageAspectFlags::COLOR,
                color_attachment: 1,
                clear_value: color(0.5),
            }],
            rects: vec![ClearRect { rect: cleared, base_array_layer: 0, layer_count: 1 }],
        },
    ]);
    let ops = Harness::new(BackendCaps::all()).run(&list);

    let narrowed = position(&ops, |op| *op == NativeOp::SetScissor { index: 0, rect: cleared });
    let clear = position(&ops, |op| matches!(op, NativeOp::ClearColorAttachment { slot: 1, .. }));
    let restored = ops.iter().rposition(|op| *op == NativeOp::SetScissor { index: 0, rect: saved });
    assert!(narrowed < clear);
    assert!(restored.is_some_and(|restored| restored > clear));
}

// ===== SYNCHRONIZATION / QUERIES / SECONDARIES =====

#[test]
fn test_barrier_bits_follow_destination_access() {
    assert_eq!(barrier_bits(AccessFlags::UNIFORM_READ), BarrierBits::UNIFORM);
    assert_eq!(
        barrier_bits(AccessFlags::SHADER_READ),
        BarrierBits::TEXTURE_FETCH | BarrierBits::SHADER_IMAGE_ACCESS | BarrierBits::SHADER_STORAGE
    );
    assert_eq!(barrier_bits(AccessFlags::COLOR_ATTACHMENT_WRITE), BarrierBits::FRAMEBUFFER);
    assert_eq!(barrier_bits(AccessFlags::MEMORY_READ), BarrierBits::all());
    assert!(barrier_bits(AccessFlags::empty()).is_empty());
}

#[test]
fn test_pipeline_barrier_needs_capability() {
    let list = CommandList::new(vec![Command::PipelineBarrier {
        src_stage_mask: PipelineStageFlags::TRANSFER,
        dst_stage_mask: PipelineStageFlags::VERTEX_INPUT,
        memory_barriers: vec![MemoryBarrier {
            src_access_mask: AccessFlags::TRANSFER_WRITE,
            dst_access_mask: AccessFlags::INDEX_READ,
        }],
        buffer_barriers: Vec::new(),
        image_barriers: Vec::new(),
    }]);
    let ops = Harness::new(BackendCaps::all()).run(&list);
    assert_eq!(ops, vec![NativeOp::MemoryBarrier(BarrierBits::ELEMENT_ARRAY)]);

    let ops = Harness::new(BackendCaps::all() - BackendCaps::MEMORY_BARRIER).run(&list);
    assert!(ops.is_empty());
}

#[test]
fn test_timestamp_needs_capability() {
    let pool = crate::resource::QueryPool::new(crate::resource::QueryType::Timestamp, 2).unwrap();
    let list = CommandList::new(vec![Command::WriteTimestamp {
        stage: PipelineStageFlags::BOTTOM_OF_PIPE,
        pool: Arc::clone(&pool),
        query: 1,
    }]);
    let ops = Harness::new(BackendCaps::all()).run(&list);
    assert_eq!(
        ops,
        vec![NativeOp::WriteTimestamp { query: crate::backend::QuerySlot { pool: pool.id(), index: 1 } }]
    );

    let mut harness = Harness::new(BackendCaps::all() - BackendCaps::TIMESTAMP_QUERY);
    assert!(harness.run(&list).is_empty());
    assert_eq!(harness.codes(), vec![message_code::UNSUPPORTED_COMMAND]);
}

#[test]
fn test_secondary_lists_replay_inline() {
    let secondary = CommandList::new(vec![Command::SetLineWidth(2.0)]);
    let list = CommandList::new(vec![
        Command::SetLineWidth(3.0),
        Command::ExecuteCommands(vec![secondary.clone(), secondary]),
    ]);
    let ops = Harness::new(BackendCaps::all()).run(&list);
    assert_eq!(ops, vec![NativeOp::SetLineWidth(3.0), NativeOp::SetLineWidth(2.0)]);
}
