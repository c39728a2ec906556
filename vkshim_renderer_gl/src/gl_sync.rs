/// GL fence sync objects backing vkshim fences

use vkshim_core::backend::NativeSync;
use vkshim_core::vkshim::WaitResult;
use crate::gl_types::*;

type ClientWaitSyncFn = unsafe extern "system" fn(GLsync, GLbitfield, GLuint64) -> GLenum;
type DeleteSyncFn = unsafe extern "system" fn(GLsync);

/// A `glFenceSync` object, deleted on drop
///
/// Waiting and deleting must happen with a context sharing the sync object's
/// namespace current on the calling thread. `Fence` enters the inserting
/// context around both.
pub struct GlSync {
    // Sync objects are opaque pointers that GL never dereferences on our side
    sync: usize,
    client_wait_sync: ClientWaitSyncFn,
    delete_sync: DeleteSyncFn,
}

impl GlSync {
    pub(crate) fn new(sync: GLsync, client_wait_sync: ClientWaitSyncFn, delete_sync: DeleteSyncFn) -> Self {
        Self { sync: sync as usize, client_wait_sync, delete_sync }
    }

    fn handle(&self) -> GLsync {
        self.sync as GLsync
    }
}

impl NativeSync for GlSync {
    fn client_wait(&self, timeout_ns: u64) -> WaitResult {
        // SAFETY: the sync object stays alive until drop.
        let status = unsafe { (self.client_wait_sync)(self.handle(), GL_SYNC_FLUSH_COMMANDS_BIT, timeout_ns) };
        match status {
            GL_ALREADY_SIGNALED | GL_CONDITION_SATISFIED => WaitResult::Success,
            GL_TIMEOUT_EXPIRED => WaitResult::TimedOut,
            _ => {
                vkshim_core::vks_error!("vkshim::gl", "glClientWaitSync failed (0x{:X})", status);
                WaitResult::Error
            }
        }
    }
}

impl Drop for GlSync {
    fn drop(&mut self) {
        // SAFETY: deleted exactly once.
        unsafe { (self.delete_sync)(self.handle()) };
    }
}
