/// D3D11 event queries backing vkshim fences

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use vkshim_core::backend::NativeSync;
use vkshim_core::resource::NativeHandle;
use vkshim_core::vkshim::{WaitResult, WAIT_FOREVER};
use crate::d3d11_device::DeviceContext;
use crate::d3d11_types::QueryData;

/// Longest sleep between two polls of a pending query
const POLL_INTERVAL: Duration = Duration::from_micros(100);

/// Lock the shared immediate context, surviving a panicked holder
pub(crate) fn lock<C>(context: &Mutex<C>) -> MutexGuard<'_, C> {
    context.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An ended `D3D11_QUERY_EVENT`, released on drop
///
/// Polling goes through the immediate context, which the sync shares with its
/// backend; a wait from another thread blocks replay only for one `GetData`.
pub struct D3d11Sync<C: DeviceContext> {
    context: Arc<Mutex<C>>,
    query: NativeHandle,
}

impl<C: DeviceContext> D3d11Sync<C> {
    pub(crate) fn new(context: Arc<Mutex<C>>, query: NativeHandle) -> Self {
        Self { context, query }
    }

    fn poll(&self) -> QueryData {
        let mut signaled = [0u8; 4];
        let status = lock(&self.context).get_data(self.query, &mut signaled);
        match status {
            // The event result is a BOOL
            QueryData::Ready if bytemuck::pod_read_unaligned::<i32>(&signaled) == 0 => QueryData::NotReady,
            other => other,
        }
    }
}

impl<C: DeviceContext> NativeSync for D3d11Sync<C> {
    fn client_wait(&self, timeout_ns: u64) -> WaitResult {
        let deadline = if timeout_ns == WAIT_FOREVER {
            None
        } else {
            Instant::now().checked_add(Duration::from_nanos(timeout_ns))
        };
        loop {
            match self.poll() {
                QueryData::Ready => return WaitResult::Success,
                QueryData::Failed => {
                    vkshim_core::vks_error!("vkshim::d3d11", "GetData failed on event query {:?}", self.query);
                    return WaitResult::Error;
                }
                QueryData::NotReady => {}
            }
            let pause = match deadline {
                None => POLL_INTERVAL,
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return WaitResult::TimedOut;
                    }
                    remaining.min(POLL_INTERVAL)
                }
            };
            std::thread::sleep(pause);
        }
    }
}

impl<C: DeviceContext> Drop for D3d11Sync<C> {
    fn drop(&mut self) {
        lock(&self.context).release(self.query);
    }
}
