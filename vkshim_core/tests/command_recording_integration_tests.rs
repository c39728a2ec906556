//! Integration tests for command recording and render pass setup
//!
//! No native API required: everything replays on the null backend.
//!
//! Run with: cargo test --test command_recording_integration_tests

use std::sync::Arc;
use vkshim_core::backend::{AttachmentPoint, NativeOp};
use vkshim_core::command::{
    ClearColorValue, ClearValue, CommandBufferLevel, CommandBufferState, CommandBufferUsageFlags,
    CommandPool, CommandPoolCreateFlags, RenderPassBeginInfo, SubpassContents,
};
use vkshim_core::glam::UVec3;
use vkshim_core::resource::{
    AttachmentDescription, AttachmentLoadOp, AttachmentReference, AttachmentStoreOp, Format, Framebuffer,
    FramebufferCreateInfo, Image, ImageCreateInfo, ImageLayout, ImageUsageFlags, ImageView, NativeHandle,
    Rect2D, RenderPass, RenderPassCreateInfo, SubpassDescription,
};
use vkshim_core::vkshim::{Context, ContextConfig, DebugReporter, Error, Queue};
use vkshim_core::backend::NullBackend;

// ============================================================================
// HELPERS
// ============================================================================

fn color_view(format: Format, native: u64) -> Arc<ImageView> {
    let image = Image::new(
        ImageCreateInfo {
            format,
            extent: UVec3::new(32, 32, 1),
            usage: ImageUsageFlags::COLOR_ATTACHMENT,
            ..Default::default()
        },
        NativeHandle(native),
    )
    .unwrap();
    ImageView::simple_2d(&image).unwrap()
}

/// Attachment 0 is loaded, attachments 1 and 2 are cleared
fn three_target_pass() -> Arc<RenderPass> {
    let description = |load_op| AttachmentDescription::color(Format::R8G8B8A8_UNORM, load_op, AttachmentStoreOp::Store);
    RenderPass::new(RenderPassCreateInfo {
        attachments: vec![
            description(AttachmentLoadOp::Load),
            description(AttachmentLoadOp::Clear),
            description(AttachmentLoadOp::Clear),
        ],
        subpasses: vec![SubpassDescription {
            color_attachments: (0..3)
                .map(|index| AttachmentReference::new(index, ImageLayout::ColorAttachmentOptimal))
                .collect(),
            ..Default::default()
        }],
        dependencies: Vec::new(),
    })
    .unwrap()
}

fn framebuffer(render_pass: &Arc<RenderPass>, views: Vec<Arc<ImageView>>) -> Result<Arc<Framebuffer>, Error> {
    Framebuffer::new(FramebufferCreateInfo {
        render_pass: Arc::clone(render_pass),
        attachments: views,
        width: 32,
        height: 32,
        layers: 1,
    })
}

// ============================================================================
// RENDER PASS TESTS
// ============================================================================

#[test]
fn test_integration_clear_values_reach_cleared_slots() {
    let render_pass = three_target_pass();
    let views = (0..3).map(|index| color_view(Format::R8G8B8A8_UNORM, 10 + index)).collect();
    let framebuffer = framebuffer(&render_pass, views).unwrap();
    let red = ClearColorValue::Float32([1.0, 0.0, 0.0, 1.0]);
    let blue = ClearColorValue::Float32([0.0, 0.0, 1.0, 1.0]);

    let pool = CommandPool::new(CommandPoolCreateFlags::empty());
    let mut command_buffer = pool.allocate(CommandBufferLevel::Primary);
    command_buffer.begin(CommandBufferUsageFlags::empty()).unwrap();
    command_buffer.begin_render_pass(
        &RenderPassBeginInfo {
            render_pass: Arc::clone(&render_pass),
            framebuffer,
            render_area: Rect2D::new(0, 0, 32, 32),
            // Entry 0 is ignored: attachment 0 is loaded.
            clear_values: vec![
                ClearValue::Color(ClearColorValue::Float32([0.5; 4])),
                ClearValue::Color(red),
                ClearValue::Color(blue),
            ],
        },
        SubpassContents::Inline,
    );
    command_buffer.end_render_pass();
    command_buffer.end().unwrap();

    let context = Arc::new(Context::headless(NullBackend::new(), ContextConfig::default(), &DebugReporter::new()));
    let queue = Queue::new(Arc::clone(&context));
    queue.submit(&mut [&mut command_buffer], None).unwrap();

    let lock = context.lock().unwrap();
    let clears: Vec<&NativeOp> = lock
        .backend()
        .calls()
        .iter()
        .filter(|op| matches!(op, NativeOp::ClearColorAttachment { .. }))
        .collect();
    assert_eq!(clears.len(), 2, "only the cleared attachments are cleared");
    assert!(clears.iter().any(|op| matches!(op, NativeOp::ClearColorAttachment { value, .. } if *value == red)));
    assert!(clears.iter().any(|op| matches!(op, NativeOp::ClearColorAttachment { value, .. } if *value == blue)));

    let draw_buffers = lock.backend().calls().iter().find_map(|op| match op {
        NativeOp::SetDrawBuffers { points, .. } => Some(points.clone()),
        _ => None,
    });
    assert_eq!(
        draw_buffers,
        Some(vec![AttachmentPoint::Color(0), AttachmentPoint::Color(1), AttachmentPoint::Color(2)])
    );
}

#[test]
fn test_integration_framebuffer_mismatch_rejected_at_creation() {
    let render_pass = three_target_pass();

    let too_few = framebuffer(&render_pass, vec![color_view(Format::R8G8B8A8_UNORM, 1)]);
    assert!(matches!(too_few, Err(Error::IncompatibleAttachment(_))));

    let wrong_format = framebuffer(
        &render_pass,
        vec![
            color_view(Format::R8G8B8A8_UNORM, 1),
            color_view(Format::R32_SFLOAT, 2),
            color_view(Format::R8G8B8A8_UNORM, 3),
        ],
    );
    assert!(matches!(wrong_format, Err(Error::IncompatibleAttachment(_))));
}

#[test]
fn test_integration_end_with_open_render_pass_fails() {
    let render_pass = three_target_pass();
    let views = (0..3).map(|index| color_view(Format::R8G8B8A8_UNORM, 20 + index)).collect();
    let framebuffer = framebuffer(&render_pass, views).unwrap();
    let clear = ClearValue::Color(ClearColorValue::Float32([0.0; 4]));

    let pool = CommandPool::new(CommandPoolCreateFlags::empty());
    let mut command_buffer = pool.allocate(CommandBufferLevel::Primary);
    command_buffer.begin(CommandBufferUsageFlags::empty()).unwrap();
    command_buffer.begin_render_pass(
        &RenderPassBeginInfo {
            render_pass,
            framebuffer,
            render_area: Rect2D::new(0, 0, 32, 32),
            clear_values: vec![clear; 3],
        },
        SubpassContents::Inline,
    );

    assert!(matches!(command_buffer.end(), Err(Error::InvalidState(_))));
    command_buffer.end_render_pass();
    assert!(command_buffer.end().is_ok());
    assert_eq!(command_buffer.state(), CommandBufferState::Executable);
}

#[test]
fn test_integration_pool_reset_flag_reuses_one_time_buffers() {
    let context = Arc::new(Context::headless(NullBackend::new(), ContextConfig::default(), &DebugReporter::new()));
    let queue = Queue::new(context);
    let pool = CommandPool::new(CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
    let mut command_buffer = pool.allocate(CommandBufferLevel::Primary);

    for frame in 0..3 {
        command_buffer.begin(CommandBufferUsageFlags::ONE_TIME_SUBMIT).unwrap();
        command_buffer.set_line_width(1.0 + frame as f32);
        command_buffer.end().unwrap();
        queue.submit(&mut [&mut command_buffer], None).unwrap();
        assert_eq!(command_buffer.state(), CommandBufferState::Invalid, "frame {}", frame);
    }
}
