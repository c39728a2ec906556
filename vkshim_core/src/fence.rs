/// Host-visible completion fences

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use crate::backend::{FenceSignal, NativeSync};
use crate::context::ContextBinding;
use crate::resource::ObjectId;

/// Timeout meaning "wait indefinitely"
pub const WAIT_FOREVER: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitResult {
    Success,
    TimedOut,
    Error,
}

/// Native sync object tied to the context it was inserted on
///
/// Waits and the final delete run with that context entered.
struct BoundSync {
    sync: Option<Box<dyn NativeSync>>,
    binding: ContextBinding,
}

impl BoundSync {
    fn client_wait(&self, timeout_ns: u64) -> WaitResult {
        let Some(sync) = &self.sync else {
            return WaitResult::Error;
        };
        // A poll does not queue behind another thread's wait on the context.
        let scope = if timeout_ns == 0 {
            self.binding.try_enter()
        } else {
            self.binding.enter().map(Some)
        };
        match scope {
            Ok(Some(_scope)) => sync.client_wait(timeout_ns),
            Ok(None) => WaitResult::TimedOut,
            Err(error) => {
                crate::vks_error!("vkshim::Fence", "Cannot wait on native sync: {}", error);
                WaitResult::Error
            }
        }
    }
}

impl Drop for BoundSync {
    fn drop(&mut self) {
        let Some(sync) = self.sync.take() else { return };
        match self.binding.enter() {
            Ok(_scope) => drop(sync),
            Err(error) => {
                // Deleting without the context current is undefined; leak instead.
                crate::vks_warn!("vkshim::Fence", "Leaking native sync, context unavailable: {}", error);
                std::mem::forget(sync);
            }
        }
    }
}

enum FenceState {
    Unsignaled,
    /// Submitted work completes when the native object is reached
    Pending(Arc<BoundSync>),
    Signaled,
}

/// Fence signaled when submitted work completes
///
/// A fence stays signaled until [`reset`](Fence::reset) is called explicitly.
/// The state mutex is never held across a native wait or a native delete.
pub struct Fence {
    id: ObjectId,
    state: Mutex<FenceState>,
    signaled: Condvar,
}

impl Fence {
    pub fn new(signaled: bool) -> Arc<Self> {
        Arc::new(Self {
            id: ObjectId::next(),
            state: Mutex::new(if signaled { FenceState::Signaled } else { FenceState::Unsignaled }),
            signaled: Condvar::new(),
        })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Poll without blocking
    pub fn is_signaled(&self) -> bool {
        self.wait(0) == WaitResult::Success
    }

    pub fn signal(&self) {
        drop(self.replace_state(FenceState::Signaled));
    }

    /// Hand the fence the outcome of a submission on the context behind `binding`
    pub(crate) fn attach(&self, signal: FenceSignal, binding: &ContextBinding) {
        let state = match signal {
            FenceSignal::Signaled => FenceState::Signaled,
            FenceSignal::Pending(sync) => FenceState::Pending(Arc::new(BoundSync {
                sync: Some(sync),
                binding: binding.clone(),
            })),
        };
        drop(self.replace_state(state));
    }

    /// Return to the unsignaled state; no-op on an unsignaled fence
    pub fn reset(&self) {
        drop(self.replace_state(FenceState::Unsignaled));
    }

    /// Swap the state and wake waiters; the previous state is dropped by the
    /// caller, after the mutex is released
    fn replace_state(&self, state: FenceState) -> Option<FenceState> {
        let mut current = self.state.lock().ok()?;
        let previous = std::mem::replace(&mut *current, state);
        self.signaled.notify_all();
        Some(previous)
    }

    /// Wait up to `timeout_ns` nanoseconds
    ///
    /// A timeout of 0 polls; [`WAIT_FOREVER`] blocks until signaled. A pending
    /// native sync object is waited on from the caller's thread with its
    /// context entered.
    pub fn wait(&self, timeout_ns: u64) -> WaitResult {
        let deadline = deadline_after(timeout_ns);

        let Ok(mut state) = self.state.lock() else {
            return WaitResult::Error;
        };
        loop {
            let remaining = remaining_until(deadline);
            if let FenceState::Pending(sync) = &*state {
                let sync = Arc::clone(sync);
                drop(state);
                let result = sync.client_wait(remaining);
                if result == WaitResult::Success {
                    self.publish_signaled(&sync);
                }
                return result;
            }
            if matches!(*state, FenceState::Signaled) {
                return WaitResult::Success;
            }
            if remaining == 0 {
                return WaitResult::TimedOut;
            }
            state = if remaining == WAIT_FOREVER {
                match self.signaled.wait(state) {
                    Ok(state) => state,
                    Err(_) => return WaitResult::Error,
                }
            } else {
                match self.signaled.wait_timeout(state, Duration::from_nanos(remaining)) {
                    Ok((state, _)) => state,
                    Err(_) => return WaitResult::Error,
                }
            };
        }
    }

    /// Mark signaled if `sync` is still the pending object
    fn publish_signaled(&self, sync: &Arc<BoundSync>) {
        let previous = {
            let Ok(mut state) = self.state.lock() else { return };
            let still_pending = matches!(&*state, FenceState::Pending(current) if Arc::ptr_eq(current, sync));
            if !still_pending {
                return;
            }
            self.signaled.notify_all();
            std::mem::replace(&mut *state, FenceState::Signaled)
        };
        drop(previous);
    }
}

/// `None` waits forever
fn deadline_after(timeout_ns: u64) -> Option<Instant> {
    if timeout_ns == WAIT_FOREVER {
        None
    } else {
        Instant::now().checked_add(Duration::from_nanos(timeout_ns))
    }
}

fn remaining_until(deadline: Option<Instant>) -> u64 {
    match deadline {
        None => WAIT_FOREVER,
        Some(deadline) => {
            let nanos = deadline.saturating_duration_since(Instant::now()).as_nanos();
            u64::try_from(nanos).unwrap_or(WAIT_FOREVER - 1)
        }
    }
}

impl std::fmt::Debug for Fence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state.lock().as_deref() {
            Ok(FenceState::Unsignaled) => "unsignaled",
            Ok(FenceState::Pending(_)) => "pending",
            Ok(FenceState::Signaled) => "signaled",
            Err(_) => "poisoned",
        };
        f.debug_struct("Fence").field("id", &self.id).field("state", &state).finish()
    }
}

/// Wait for all (or any) of `fences`
pub fn wait_for_fences(fences: &[&Fence], wait_all: bool, timeout_ns: u64) -> WaitResult {
    let deadline = deadline_after(timeout_ns);
    let remaining = || remaining_until(deadline);

    if wait_all {
        for fence in fences {
            match fence.wait(remaining()) {
                WaitResult::Success => {}
                other => return other,
            }
        }
        return WaitResult::Success;
    }

    loop {
        for fence in fences {
            match fence.wait(0) {
                WaitResult::TimedOut => {}
                other => return other,
            }
        }
        if fences.is_empty() || remaining() == 0 {
            return WaitResult::TimedOut;
        }
        std::thread::sleep(Duration::from_micros(100).min(Duration::from_nanos(remaining())));
    }
}

#[cfg(test)]
#[path = "fence_tests.rs"]
mod tests;
