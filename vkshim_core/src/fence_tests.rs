use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;
use crate::context::{CurrentContextGuard, HeadlessContext, NativeContext};

fn binding() -> ContextBinding {
    ContextBinding::new(HeadlessContext::new())
}

/// Native sync that completes after a number of polls
struct CountdownSync {
    polls_left: AtomicU32,
}

impl NativeSync for CountdownSync {
    fn client_wait(&self, _timeout_ns: u64) -> WaitResult {
        let left = self.polls_left.load(Ordering::SeqCst);
        if left == 0 {
            WaitResult::Success
        } else {
            self.polls_left.store(left - 1, Ordering::SeqCst);
            WaitResult::TimedOut
        }
    }
}

struct BrokenSync;

impl NativeSync for BrokenSync {
    fn client_wait(&self, _timeout_ns: u64) -> WaitResult {
        WaitResult::Error
    }
}

#[test]
fn test_poll_unsignaled_times_out() {
    let fence = Fence::new(false);
    assert_eq!(fence.wait(0), WaitResult::TimedOut);
    assert!(!fence.is_signaled());
}

#[test]
fn test_poll_signaled_succeeds() {
    let fence = Fence::new(true);
    assert_eq!(fence.wait(0), WaitResult::Success);
    assert!(fence.is_signaled());
}

#[test]
fn test_reset_unsignaled_is_noop() {
    let fence = Fence::new(false);
    fence.reset();
    assert_eq!(fence.wait(0), WaitResult::TimedOut);
}

#[test]
fn test_reset_signaled_fence() {
    let fence = Fence::new(true);
    fence.reset();
    assert_eq!(fence.wait(0), WaitResult::TimedOut);
    fence.signal();
    assert_eq!(fence.wait(0), WaitResult::Success);
}

#[test]
fn test_short_timeout_expires() {
    let fence = Fence::new(false);
    let start = Instant::now();
    assert_eq!(fence.wait(2_000_000), WaitResult::TimedOut);
    assert!(start.elapsed() >= Duration::from_millis(2));
}

#[test]
fn test_wait_forever_wakes_on_signal() {
    let fence = Fence::new(false);
    let signaler = Arc::clone(&fence);
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        signaler.signal();
    });
    assert_eq!(fence.wait(WAIT_FOREVER), WaitResult::Success);
    handle.join().unwrap();
}

#[test]
fn test_pending_native_sync_is_polled() {
    let fence = Fence::new(false);
    fence.attach(
        FenceSignal::Pending(Box::new(CountdownSync {
            polls_left: AtomicU32::new(1),
        })),
        &binding(),
    );
    assert_eq!(fence.wait(0), WaitResult::TimedOut);
    assert_eq!(fence.wait(0), WaitResult::Success);
    // Stays signaled without polling the native object again
    assert!(fence.is_signaled());
}

#[test]
fn test_native_error_is_reported() {
    let fence = Fence::new(false);
    fence.attach(FenceSignal::Pending(Box::new(BrokenSync)), &binding());
    assert_eq!(fence.wait(0), WaitResult::Error);
}

#[test]
fn test_attach_signaled() {
    let fence = Fence::new(false);
    fence.attach(FenceSignal::Signaled, &binding());
    assert!(fence.is_signaled());
}

#[test]
fn test_wait_for_fences_all_and_any() {
    let a = Fence::new(true);
    let b = Fence::new(false);

    assert_eq!(wait_for_fences(&[&a, &b], true, 0), WaitResult::TimedOut);
    assert_eq!(wait_for_fences(&[&a, &b], false, 0), WaitResult::Success);

    b.signal();
    assert_eq!(wait_for_fences(&[&a, &b], true, 0), WaitResult::Success);
}

#[test]
fn test_wait_for_no_fences_any_times_out() {
    assert_eq!(wait_for_fences(&[], false, 0), WaitResult::TimedOut);
    assert_eq!(wait_for_fences(&[], true, 0), WaitResult::Success);
}

// ===== CONTEXT OF NATIVE SYNC OBJECTS =====

type SyncLog = Arc<Mutex<Vec<(&'static str, bool)>>>;

/// Records whether its context was current when waited on and deleted
struct ContextCheckedSync {
    native: Arc<dyn NativeContext>,
    result: WaitResult,
    log: SyncLog,
}

impl NativeSync for ContextCheckedSync {
    fn client_wait(&self, _timeout_ns: u64) -> WaitResult {
        self.log.lock().unwrap().push(("wait", CurrentContextGuard::is_current(&self.native)));
        self.result
    }
}

impl Drop for ContextCheckedSync {
    fn drop(&mut self) {
        self.log.lock().unwrap().push(("delete", CurrentContextGuard::is_current(&self.native)));
    }
}

fn checked_fence(result: WaitResult) -> (Arc<Fence>, Arc<HeadlessContext>, SyncLog) {
    let native = HeadlessContext::new();
    let log = SyncLog::default();
    let fence = Fence::new(false);
    fence.attach(
        FenceSignal::Pending(Box::new(ContextCheckedSync {
            native: native.clone(),
            result,
            log: Arc::clone(&log),
        })),
        &ContextBinding::new(native.clone()),
    );
    (fence, native, log)
}

#[test]
fn test_native_sync_waited_and_deleted_with_context_current() {
    let (fence, native, log) = checked_fence(WaitResult::Success);
    assert_eq!(fence.wait(0), WaitResult::Success);

    assert_eq!(*log.lock().unwrap(), vec![("wait", true), ("delete", true)]);
    assert_eq!(CurrentContextGuard::depth(), 0);
    assert_eq!(native.release_calls(), native.make_current_calls());
}

#[test]
fn test_reset_deletes_pending_sync_with_context_current() {
    let (fence, _native, log) = checked_fence(WaitResult::TimedOut);
    fence.reset();

    assert_eq!(*log.lock().unwrap(), vec![("delete", true)]);
    assert_eq!(fence.wait(0), WaitResult::TimedOut);
}

#[test]
fn test_signal_deletes_pending_sync_with_context_current() {
    let (fence, _native, log) = checked_fence(WaitResult::TimedOut);
    fence.signal();

    assert_eq!(*log.lock().unwrap(), vec![("delete", true)]);
    assert!(fence.is_signaled());
}

/// Completes after a delay on blocking waits
struct SlowSync;

impl NativeSync for SlowSync {
    fn client_wait(&self, timeout_ns: u64) -> WaitResult {
        if timeout_ns == 0 {
            return WaitResult::TimedOut;
        }
        thread::sleep(Duration::from_millis(400));
        WaitResult::Success
    }
}

#[test]
fn test_poll_does_not_block_behind_native_wait() {
    let fence = Fence::new(false);
    fence.attach(FenceSignal::Pending(Box::new(SlowSync)), &binding());

    let waiter = Arc::clone(&fence);
    let handle = thread::spawn(move || waiter.wait(WAIT_FOREVER));
    thread::sleep(Duration::from_millis(50));

    let start = Instant::now();
    assert_eq!(fence.wait(0), WaitResult::TimedOut);
    fence.reset();
    assert!(start.elapsed() < Duration::from_millis(200), "poll took {:?}", start.elapsed());

    assert_eq!(handle.join().unwrap(), WaitResult::Success);
}
