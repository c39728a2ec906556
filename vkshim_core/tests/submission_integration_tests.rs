//! Integration tests for contexts, queues and fences
//!
//! No native API required: everything replays on the null backend.
//!
//! Run with: cargo test --test submission_integration_tests

use std::sync::Arc;
use std::thread;
use vkshim_core::backend::{BackendCaps, NativeOp, NullBackend};
use vkshim_core::command::{
    CommandBuffer, CommandBufferLevel, CommandBufferUsageFlags, CommandPool, CommandPoolCreateFlags,
    StencilFaceFlags,
};
use vkshim_core::resource::{Rect2D, Viewport};
use vkshim_core::vkshim::{
    wait_for_fences, Context, ContextConfig, DebugReportFlags, DebugReporter, Fence, Queue, WaitResult,
};

// ============================================================================
// HELPERS
// ============================================================================

fn queue() -> Queue<NullBackend> {
    let context = Context::headless(NullBackend::new(), ContextConfig::default(), &DebugReporter::new());
    Queue::new(Arc::new(context))
}

fn dynamic_state_buffer() -> CommandBuffer {
    let pool = CommandPool::new(CommandPoolCreateFlags::empty());
    let mut command_buffer = pool.allocate(CommandBufferLevel::Primary);
    command_buffer.begin(CommandBufferUsageFlags::SIMULTANEOUS_USE).unwrap();
    command_buffer.set_viewport(0, &[Viewport::from_rect(Rect2D::new(0, 0, 640, 480))]);
    command_buffer.set_scissor(0, &[Rect2D::new(8, 8, 320, 240)]);
    command_buffer.set_line_width(2.0);
    command_buffer.set_blend_constants([0.25, 0.5, 0.75, 1.0]);
    command_buffer.set_stencil_reference(StencilFaceFlags::FRONT_AND_BACK, 3);
    command_buffer.end().unwrap();
    command_buffer
}

fn calls(queue: &Queue<NullBackend>) -> Vec<NativeOp> {
    queue.context().lock().unwrap().backend().calls().to_vec()
}

// ============================================================================
// SUBMISSION TESTS
// ============================================================================

#[test]
fn test_integration_replay_is_deterministic() {
    let first = queue();
    let second = queue();
    let mut command_buffer = dynamic_state_buffer();

    first.submit(&mut [&mut command_buffer], None).unwrap();
    second.submit(&mut [&mut command_buffer], None).unwrap();

    let first_calls = calls(&first);
    assert!(!first_calls.is_empty());
    assert_eq!(first_calls, calls(&second));
}

#[test]
fn test_integration_resubmission_emits_nothing_new() {
    let queue = queue();
    let mut command_buffer = dynamic_state_buffer();

    queue.submit(&mut [&mut command_buffer], None).unwrap();
    let after_first = calls(&queue).len();
    queue.submit(&mut [&mut command_buffer], None).unwrap();

    // The mirrored state already matches, so the second replay is free.
    assert_eq!(calls(&queue).len(), after_first);
}

#[test]
fn test_integration_fences_signal_per_submission() {
    let queue = queue();
    let mut command_buffer = dynamic_state_buffer();
    let fences = [Fence::new(false), Fence::new(false)];

    assert_eq!(fences[0].wait(0), WaitResult::TimedOut);
    for fence in &fences {
        queue.submit(&mut [&mut command_buffer], Some(fence)).unwrap();
    }

    let refs: Vec<&Fence> = fences.iter().map(|fence| fence.as_ref()).collect();
    assert_eq!(wait_for_fences(&refs, true, 0), WaitResult::Success);

    fences[0].reset();
    assert!(!fences[0].is_signaled());
    assert_eq!(wait_for_fences(&refs, false, 0), WaitResult::Success);
    assert_eq!(wait_for_fences(&refs[..1], true, 0), WaitResult::TimedOut);
}

#[test]
fn test_integration_queue_shared_across_threads() {
    let queue = Arc::new(queue());
    let handles: Vec<_> = (0..4)
        .map(|index| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let pool = CommandPool::new(CommandPoolCreateFlags::empty());
                let mut command_buffer = pool.allocate(CommandBufferLevel::Primary);
                command_buffer.begin(CommandBufferUsageFlags::empty()).unwrap();
                command_buffer.set_line_width(2.0 + index as f32);
                command_buffer.end().unwrap();
                let fence = Fence::new(false);
                queue.submit(&mut [&mut command_buffer], Some(&fence)).unwrap();
                fence.wait(0)
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), WaitResult::Success);
    }
    let line_widths = calls(&queue)
        .iter()
        .filter(|op| matches!(op, NativeOp::SetLineWidth(_)))
        .count();
    assert_eq!(line_widths, 4);
}

#[test]
fn test_integration_unsupported_command_reported_on_channel() {
    let reporter = DebugReporter::new();
    let context = Context::headless(
        NullBackend::with_capabilities(BackendCaps::empty()),
        ContextConfig::default(),
        &reporter,
    );
    let queue = Queue::new(Arc::new(context));

    let pool = CommandPool::new(CommandPoolCreateFlags::empty());
    let mut command_buffer = pool.allocate(CommandBufferLevel::Primary);
    command_buffer.begin(CommandBufferUsageFlags::empty()).unwrap();
    command_buffer.set_depth_bounds(0.0, 0.5);
    command_buffer.end().unwrap();
    queue.submit(&mut [&mut command_buffer], None).unwrap();

    assert_eq!(reporter.stats().warnings, 1);
    assert!(calls(&queue).iter().all(|op| !matches!(op, NativeOp::SetDepthBounds { .. })));

    // Warnings disabled by the context configuration never reach the channel.
    let quiet = DebugReporter::new();
    let context = Context::headless(
        NullBackend::with_capabilities(BackendCaps::empty()),
        ContextConfig { report_flags: DebugReportFlags::ERROR, ..ContextConfig::default() },
        &quiet,
    );
    Queue::new(Arc::new(context)).submit(&mut [&mut command_buffer], None).unwrap();
    assert_eq!(quiet.stats().warnings, 0);
}
