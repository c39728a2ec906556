//! Integration tests for replaying command buffers on the D3D11 backend
//!
//! The backend runs on a recording device, so no D3D11 device is needed.
//!
//! Run with: cargo test --test d3d11_replay_integration_tests

#[path = "../src/recording_device.rs"]
mod recording_device;

use std::sync::Arc;
use recording_device::{Call, RecordingDevice};
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
use vkshim_core::vkshim::{Context, ContextConfig, DebugReporter, Fence, Queue, WaitResult, WAIT_FOREVER};
use vkshim_renderer_d3d11::d3d11_types::FeatureLevel;
use vkshim_renderer_d3d11::D3d11Backend;

type D3d11Queue = Queue<D3d11Backend<RecordingDevice>>;

// ============================================================================
// HELPERS
// ============================================================================

fn d3d11_queue() -> D3d11Queue {
    let backend = D3d11Backend::new(RecordingDevice::new(FeatureLevel::Level11_1)).unwrap();
    let context = Context::headless(backend, ContextConfig::default(), &DebugReporter::new());
    let queue = Queue::new(Arc::new(context));
    device_calls(&queue);
    queue
}

/// Drain the calls the device recorded so far
fn device_calls(queue: &D3d11Queue) -> Vec<Call> {
    queue.context().lock().unwrap().backend().context().take_calls()
}

fn with_device<T>(queue: &D3d11Queue, access: impl FnOnce(&mut RecordingDevice) -> T) -> T {
    let lock = queue.context().lock().unwrap();
    let mut device = lock.backend().context();
    access(&mut device)
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
            extent: UVec3::new(128, 128, 1),
            usage: ImageUsageFlags::COLOR_ATTACHMENT,
            ..Default::default()
        },
        NativeHandle(native),
    )
    .unwrap();
    let framebuffer = Framebuffer::new(FramebufferCreateInfo {
        render_pass: Arc::clone(&render_pass),
        attachments: vec![ImageView::simple_2d(&image).unwrap()],
        width: 128,
        height: 128,
        layers: 1,
    })
    .unwrap();
    (render_pass, framebuffer)
}

// ============================================================================
// REPLAY TESTS
// ============================================================================

#[test]
fn test_integration_render_pass_clear_uses_render_target_view() {
    let queue = d3d11_queue();
    let (render_pass, framebuffer) = cleared_target(42);
    let red = [1.0f32, 0.0, 0.0, 1.0];

    let mut command_buffer = recorded(|command_buffer| {
        command_buffer.begin_render_pass(
            &RenderPassBeginInfo {
                render_pass,
                framebuffer,
                render_area: Rect2D::new(0, 0, 128, 128),
                clear_values: vec![ClearValue::Color(ClearColorValue::Float32(red))],
            },
            SubpassContents::Inline,
        );
        command_buffer.end_render_pass();
    });
    queue.submit(&mut [&mut command_buffer], None).unwrap();

    let calls = device_calls(&queue);
    let views: Vec<_> = calls.iter().filter(|call| call.name == "create_render_target_view").collect();
    assert!(views.iter().any(|call| call.arg(0) == "NativeHandle(42)"), "view of image 42 created");

    let clears: Vec<_> = calls
        .iter()
        .filter(|call| call.name == "clear_view" || call.name == "clear_render_target_view")
        .collect();
    assert_eq!(clears.len(), 1);
    assert_eq!(clears[0].arg(1), format!("{:?}", red));
    assert_eq!(calls.last().map(|call| call.name), Some("flush"));
}

#[test]
fn test_integration_state_waits_for_a_draw_or_clear() {
    let queue = d3d11_queue();
    let mut command_buffer = recorded(|command_buffer| {
        command_buffer.set_viewport(0, &[Viewport::from_rect(Rect2D::new(0, 0, 640, 480))]);
        command_buffer.set_blend_constants([0.5; 4]);
        command_buffer.set_depth_bias(1.0, 0.0, 2.0);
    });

    queue.submit(&mut [&mut command_buffer], None).unwrap();
    let calls = device_calls(&queue);
    assert!(calls.iter().all(|call| call.name == "flush"), "state-only replay: {:?}", calls);
}

#[test]
fn test_integration_fence_waits_on_event_query() {
    let queue = d3d11_queue();
    let mut command_buffer = recorded(|command_buffer| command_buffer.set_line_width(1.0));
    let fence = Fence::new(false);

    queue.submit(&mut [&mut command_buffer], Some(&fence)).unwrap();
    let names: Vec<_> = device_calls(&queue).into_iter().map(|call| call.name).collect();
    assert!(names.contains(&"create_query"));
    assert!(names.contains(&"end"));

    with_device(&queue, |device| device.set_pending_polls(1));
    assert_eq!(fence.wait(0), WaitResult::TimedOut);
    assert_eq!(fence.wait(WAIT_FOREVER), WaitResult::Success);
    assert!(fence.is_signaled());
}

#[test]
fn test_integration_fence_without_event_query_is_signaled() {
    let queue = d3d11_queue();
    with_device(&queue, |device| device.fail_creation(true));
    let mut command_buffer = recorded(|command_buffer| command_buffer.set_line_width(1.0));
    let fence = Fence::new(false);

    queue.submit(&mut [&mut command_buffer], Some(&fence)).unwrap();
    assert!(fence.is_signaled());
}

#[test]
fn test_integration_wait_idle_polls_until_complete() {
    let queue = d3d11_queue();
    with_device(&queue, |device| device.set_pending_polls(3));
    queue.wait_idle().unwrap();

    let polls = device_calls(&queue).into_iter().filter(|call| call.name == "get_data").count();
    assert_eq!(polls, 4);
}
