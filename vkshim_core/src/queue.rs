/// Submission queue
///
/// Submitting replays command lists synchronously on the context's backend, in
/// submission order, then flushes and hands the fence a sync point.

use std::sync::Arc;
use crate::backend::{FenceSignal, NativeBackend};
use crate::command::{CommandBuffer, CommandBufferLevel, CommandBufferState};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::fence::{Fence, WaitResult, WAIT_FOREVER};
use crate::resource::ObjectId;

pub struct Queue<B: NativeBackend> {
    id: ObjectId,
    context: Arc<Context<B>>,
}

impl<B: NativeBackend> Queue<B> {
    pub fn new(context: Arc<Context<B>>) -> Self {
        Self {
            id: ObjectId::next(),
            context,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn context(&self) -> &Arc<Context<B>> {
        &self.context
    }

    /// Replay primary command buffers in order
    ///
    /// Each buffer is `Pending` while it replays and afterwards returns to
    /// `Executable`, or to `Invalid` when it was recorded for one-time submission.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] when a buffer is not an executable primary or the
    /// fence is already signaled. Nothing is replayed in that case.
    pub fn submit(&self, command_buffers: &mut [&mut CommandBuffer], fence: Option<&Fence>) -> Result<()> {
        for command_buffer in command_buffers.iter() {
            if command_buffer.level() != CommandBufferLevel::Primary {
                return Err(Error::InvalidState(format!(
                    "command buffer {:?} is secondary and cannot be submitted",
                    command_buffer.id()
                )));
            }
            if command_buffer.state() != CommandBufferState::Executable {
                return Err(Error::InvalidState(format!(
                    "command buffer {:?} is {:?}, submission needs Executable",
                    command_buffer.id(),
                    command_buffer.state()
                )));
            }
        }
        if let Some(fence) = fence {
            if fence.is_signaled() {
                return Err(Error::InvalidState(format!("fence {:?} is already signaled", fence.id())));
            }
        }

        let mut lock = self.context.lock()?;
        for command_buffer in command_buffers.iter_mut() {
            let Some(list) = command_buffer.command_list().cloned() else { continue };
            command_buffer.mark_pending();
            lock.execute(&list);
            command_buffer.complete_submission();
        }
        lock.flush();
        if let Some(fence) = fence {
            fence.attach(lock.insert_fence(), self.context.binding());
        }
        crate::vks_trace!(
            "vkshim::Queue",
            "Submitted {} command buffers on queue {:?}",
            command_buffers.len(),
            self.id
        );
        Ok(())
    }

    /// Block until everything submitted so far has completed
    ///
    /// # Errors
    ///
    /// [`Error::BackendError`] when the native wait fails.
    pub fn wait_idle(&self) -> Result<()> {
        // The sync object is waited on and deleted while the lock keeps the
        // context current.
        let mut lock = self.context.lock()?;
        lock.flush();
        let result = match lock.insert_fence() {
            FenceSignal::Signaled => WaitResult::Success,
            FenceSignal::Pending(sync) => sync.client_wait(WAIT_FOREVER),
        };
        drop(lock);
        match result {
            WaitResult::Success => Ok(()),
            other => Err(Error::BackendError(format!("Native wait for idle returned {:?}", other))),
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
