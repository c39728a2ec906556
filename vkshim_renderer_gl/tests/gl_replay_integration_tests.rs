//! Integration tests for replaying command buffers on the GL backend
//!
//! The backend runs on a recording fake driver, so no GL context is needed.
//!
//! Run with: cargo test --test gl_replay_integration_tests

#[path = "../src/fake_gl.rs"]
mod fake_gl;

use std::sync::Arc;
use vkshim_core::command::{
    ClearColorValue, ClearValue, CommandBuffer, CommandBufferLevel, CommandBufferUsageFlags, CommandPool,
    CommandPoolCreateFlags, RenderPassBeginInfo, SubpassContents,
};
use vkshim_core::glam::UVec3;
use vkshim_core::resource::{
    AttachmentDescription, AttachmentLoadOp, AttachmentReference, AttachmentStoreOp, Format, Framebuffer,
    FramebufferCreateInfo, Image, ImageCreateInfo, ImageLayout, ImageUsageFlags, ImageView, NativeHandle, Rect2D,
    RenderPass, RenderPassCreateInfo, SubpassDescription, Viewport,
};
use vkshim_core::vkshim::{Context, ContextConfig, DebugReporter, Fence, Queue, WaitResult};
use vkshim_renderer_gl::GlBackend;

// ============================================================================
// HELPERS
// ============================================================================

fn gl_queue() -> Queue<GlBackend> {
    fake_gl::reset();
    let backend = GlBackend::load(fake_gl::resolve).unwrap();
    let context = Context::headless(backend, ContextConfig::default(), &DebugReporter::new());
    fake_gl::take_calls();
    Queue::new(Arc::new(context))
}

fn recorded(record: impl FnOnce(&mut CommandBuffer)) -> CommandBuffer {
    let pool = CommandPool::new(CommandPoolCreateFlags::empty());
    let mut command_buffer = pool.allocate(CommandBufferLevel::Primary);
    command_buffer.begin(CommandBufferUsageFlags::SIMULTANEOUS_USE).unwrap();
    record(&mut command_buffer);
    command_buffer.end().unwrap();
    command_buffer
}

fn cleared_target(native: u64) -> (Arc<RenderPass>, Arc<Framebuffer>) {
    let render_pass = RenderPass::new(RenderPassCreateInfo {
        attachments: vec![AttachmentDescription::color(
            Format::R8G8B8A8_UNORM,
            AttachmentLoadOp::Clear,
            AttachmentStoreOp::Store,
        )],
        subpasses: vec![SubpassDescription {
            color_attachments: vec![AttachmentReference::new(0, ImageLayout::ColorAttachmentOptimal)],
            ..Default::default()
        }],
        dependencies: Vec::new(),
    })
    .unwrap();

    let image = Image::new(
        ImageCreateInfo {
            format: Format::R8G8B8A8_UNORM,
            extent: UVec3::new(64, 64, 1),
            usage: ImageUsageFlags::COLOR_ATTACHMENT,
            ..Default::default()
        },
        NativeHandle(native),
    )
    .unwrap();
    let framebuffer = Framebuffer::new(FramebufferCreateInfo {
        render_pass: Arc::clone(&render_pass),
        attachments: vec![ImageView::simple_2d(&image).unwrap()],
        width: 64,
        height: 64,
        layers: 1,
    })
    .unwrap();
    (render_pass, framebuffer)
}

// ============================================================================
// REPLAY TESTS
// ============================================================================

#[test]
fn test_integration_render_pass_clear_uses_framebuffer_object() {
    let queue = gl_queue();
    let (render_pass, framebuffer) = cleared_target(42);
    let red = [1.0f32, 0.0, 0.0, 1.0];

    let mut command_buffer = recorded(|command_buffer| {
        command_buffer.begin_render_pass(
            &RenderPassBeginInfo {
                render_pass,
                framebuffer,
                render_area: Rect2D::new(0, 0, 64, 64),
                clear_values: vec![ClearValue::Color(ClearColorValue::Float32(red))],
            },
            SubpassContents::Inline,
        );
        command_buffer.end_render_pass();
    });
    queue.submit(&mut [&mut command_buffer], None).unwrap();

    assert!(!fake_gl::calls_to("glGenFramebuffers").is_empty());
    let attachments = fake_gl::calls_to("glFramebufferTexture2D");
    assert!(attachments.iter().any(|call| call.arg(3) == "42"), "image 42 attached");

    let clears = fake_gl::calls_to("glClearBufferfv");
    assert_eq!(clears.len(), 1);
    assert_eq!(clears[0].arg(2), format!("{:?}", red));
}

#[test]
fn test_integration_redundant_state_reaches_gl_once() {
    let queue = gl_queue();
    let mut command_buffer = recorded(|command_buffer| {
        command_buffer.set_viewport(0, &[Viewport::from_rect(Rect2D::new(0, 0, 640, 480))]);
        command_buffer.set_line_width(3.0);
    });

    queue.submit(&mut [&mut command_buffer], None).unwrap();
    let first = fake_gl::take_calls();
    assert_eq!(first.iter().filter(|call| call.name == "glLineWidth").count(), 1);
    assert!(first.iter().any(|call| call.name == "glViewportIndexedf"));

    queue.submit(&mut [&mut command_buffer], None).unwrap();
    let second = fake_gl::take_calls();
    assert!(second.iter().all(|call| call.name == "glFlush"), "second replay: {:?}", second);
}

#[test]
fn test_integration_fence_waits_on_gl_sync() {
    let queue = gl_queue();
    let mut command_buffer = recorded(|command_buffer| command_buffer.set_line_width(2.0));
    let fence = Fence::new(false);

    queue.submit(&mut [&mut command_buffer], Some(&fence)).unwrap();
    assert_eq!(fake_gl::calls_to("glFenceSync").len(), 1);
    assert_eq!(fence.wait(0), WaitResult::Success);
    assert!(!fake_gl::calls_to("glClientWaitSync").is_empty());
}

#[test]
fn test_integration_fence_without_sync_objects_is_signaled() {
    fake_gl::reset();
    let backend = GlBackend::load(fake_gl::resolver_without(&["glFenceSync"])).unwrap();
    let context = Context::headless(backend, ContextConfig::default(), &DebugReporter::new());
    let queue = Queue::new(Arc::new(context));
    let mut command_buffer = recorded(|command_buffer| command_buffer.set_line_width(2.0));
    let fence = Fence::new(false);

    queue.submit(&mut [&mut command_buffer], Some(&fence)).unwrap();
    assert!(fence.is_signaled());
    assert_eq!(fake_gl::calls_to("glFinish").len(), 1);
}
