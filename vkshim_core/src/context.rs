//! Native contexts and exclusive access to them
//!
//! A [`Context`] owns one native backend together with the state stack that
//! mirrors it. Work reaches the backend only through a [`ContextLock`], which
//! makes the native context current on the calling thread for as long as it
//! lives.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use crate::backend::{FenceSignal, NativeBackend};
use crate::command::CommandList;
use crate::config::ContextConfig;
use crate::debug_report::DebugReporter;
use crate::error::{Error, Result};
use crate::resource::ObjectId;
use crate::state::ContextStateStack;
use crate::validation::ValidationCache;

/// Platform "make current" mechanism of a native context
pub trait NativeContext: Send + Sync {
    /// Bind the context to the calling thread
    fn make_current(&self) -> Result<()>;

    /// Unbind whatever context is current on the calling thread
    fn release(&self);
}

/// Context with nothing to bind, for the null backend and tests
///
/// Counts the calls it receives.
#[derive(Debug, Default)]
pub struct HeadlessContext {
    make_current_calls: AtomicU32,
    release_calls: AtomicU32,
}

impl HeadlessContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn make_current_calls(&self) -> u32 {
        self.make_current_calls.load(Ordering::Relaxed)
    }

    pub fn release_calls(&self) -> u32 {
        self.release_calls.load(Ordering::Relaxed)
    }
}

impl NativeContext for HeadlessContext {
    fn make_current(&self) -> Result<()> {
        self.make_current_calls.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn release(&self) {
        self.release_calls.fetch_add(1, Ordering::Relaxed);
    }
}

// ===== CURRENT CONTEXT =====

thread_local! {
    static CURRENT: RefCell<Vec<Arc<dyn NativeContext>>> = const { RefCell::new(Vec::new()) };
    static LOCKED: RefCell<Vec<ObjectId>> = const { RefCell::new(Vec::new()) };
}

fn same_context(a: &Arc<dyn NativeContext>, b: &Arc<dyn NativeContext>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Scoped "make current"
///
/// Makes a context current on creation, unless it already is the innermost
/// current context of the thread. On drop, the context that was current before
/// it is made current again, or the context is released if there was none.
pub struct CurrentContextGuard {
    context: Arc<dyn NativeContext>,
    _not_send: PhantomData<*const ()>,
}

impl CurrentContextGuard {
    pub fn new(context: &Arc<dyn NativeContext>) -> Result<Self> {
        if !Self::is_current(context) {
            context.make_current()?;
        }
        CURRENT.with(|stack| stack.borrow_mut().push(Arc::clone(context)));
        Ok(Self {
            context: Arc::clone(context),
            _not_send: PhantomData,
        })
    }

    /// Whether `context` is the innermost current context of this thread
    pub fn is_current(context: &Arc<dyn NativeContext>) -> bool {
        CURRENT.with(|stack| stack.borrow().last().is_some_and(|top| same_context(top, context)))
    }

    /// Number of guards alive on this thread
    pub fn depth() -> usize {
        CURRENT.with(|stack| stack.borrow().len())
    }
}

impl Drop for CurrentContextGuard {
    fn drop(&mut self) {
        let previous = CURRENT.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.pop();
            stack.last().cloned()
        });
        match previous {
            Some(previous) if same_context(&previous, &self.context) => {}
            Some(previous) => {
                if let Err(error) = previous.make_current() {
                    crate::vks_error!("vkshim::Context", "Failed to restore previous context: {}", error);
                }
            }
            None => self.context.release(),
        }
    }
}

// ===== CONTEXT BINDING =====

/// Way back into a context for objects that outlive a [`ContextLock`]
///
/// Native sync objects must be waited on and deleted with their context
/// current. [`enter`](ContextBinding::enter) gives the same guarantee as a
/// lock: exclusive use of the context across threads, and the context current
/// on this thread. When the thread already holds a lock on the context, only
/// the current-context guard is taken.
#[derive(Clone)]
pub struct ContextBinding {
    id: ObjectId,
    native: Arc<dyn NativeContext>,
    exclusive: Arc<Mutex<()>>,
}

/// The context entered through a [`ContextBinding`]
pub struct ContextScope<'a> {
    _current: CurrentContextGuard,
    _exclusive: Option<MutexGuard<'a, ()>>,
}

impl ContextBinding {
    /// Binding of a native context not owned by any [`Context`]
    pub fn new(native: Arc<dyn NativeContext>) -> Self {
        Self::with_id(ObjectId::next(), native)
    }

    fn with_id(id: ObjectId, native: Arc<dyn NativeContext>) -> Self {
        Self {
            id,
            native,
            exclusive: Arc::new(Mutex::new(())),
        }
    }

    pub fn native(&self) -> &Arc<dyn NativeContext> {
        &self.native
    }

    /// Whether this thread holds a [`ContextLock`] on the bound context
    pub fn is_locked_here(&self) -> bool {
        LOCKED.with(|locked| locked.borrow().contains(&self.id))
    }

    /// Make the context current with exclusive use, for the scope's lifetime
    ///
    /// # Errors
    ///
    /// The native context could not be made current.
    pub fn enter(&self) -> Result<ContextScope<'_>> {
        let exclusive = if self.is_locked_here() {
            None
        } else {
            Some(self.exclusive.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
        };
        let current = CurrentContextGuard::new(&self.native)?;
        Ok(ContextScope {
            _current: current,
            _exclusive: exclusive,
        })
    }

    /// Like [`enter`](ContextBinding::enter), but `None` instead of blocking
    /// while another thread uses the context
    ///
    /// # Errors
    ///
    /// The native context could not be made current.
    pub fn try_enter(&self) -> Result<Option<ContextScope<'_>>> {
        let exclusive = if self.is_locked_here() {
            None
        } else {
            match self.exclusive.try_lock() {
                Ok(guard) => Some(guard),
                Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
                Err(TryLockError::WouldBlock) => return Ok(None),
            }
        };
        let current = CurrentContextGuard::new(&self.native)?;
        Ok(Some(ContextScope {
            _current: current,
            _exclusive: exclusive,
        }))
    }
}

// ===== CONTEXT =====

struct ContextInner<B: NativeBackend> {
    backend: B,
    stack: ContextStateStack,
    validation: ValidationCache,
}

/// A native backend, its mirrored state and its validation cache
pub struct Context<B: NativeBackend> {
    id: ObjectId,
    config: ContextConfig,
    binding: ContextBinding,
    inner: Mutex<ContextInner<B>>,
    reporter: DebugReporter,
}

impl<B: NativeBackend> Context<B> {
    /// Wrap `backend`, which must start in the deactivated state
    ///
    /// Diagnostics go to `reporter`, limited to `config.report_flags`.
    pub fn new(
        native: Arc<dyn NativeContext>,
        backend: B,
        config: ContextConfig,
        reporter: &DebugReporter,
    ) -> Self {
        let reporter = reporter.filtered(config.report_flags);
        let limits = config.limits.unwrap_or_else(|| backend.limits());
        let stack = ContextStateStack::new(backend.capabilities(), limits, reporter.clone());
        crate::vks_info!(
            "vkshim::Context",
            "[{}] Context created on {} backend (caps {:?}, validation {})",
            config.app_name,
            backend.name(),
            backend.capabilities(),
            if config.enable_validation { "on" } else { "off" }
        );
        let id = ObjectId::next();
        Self {
            id,
            inner: Mutex::new(ContextInner {
                backend,
                stack,
                validation: ValidationCache::new(config.enable_validation),
            }),
            config,
            binding: ContextBinding::with_id(id, native),
            reporter,
        }
    }

    /// Context reporting to the instance reporter of the [`Runtime`](crate::runtime::Runtime)
    ///
    /// # Errors
    ///
    /// [`Error::InitializationFailed`] when the runtime is not initialized.
    pub fn from_runtime(native: Arc<dyn NativeContext>, backend: B, config: ContextConfig) -> Result<Self> {
        let reporter = crate::runtime::Runtime::debug_reporter()?;
        Ok(Self::new(native, backend, config, &reporter))
    }

    /// Context without a platform binding
    pub fn headless(backend: B, config: ContextConfig, reporter: &DebugReporter) -> Self {
        Self::new(HeadlessContext::new(), backend, config, reporter)
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Filtered reporter used for this context's diagnostics
    pub fn reporter(&self) -> &DebugReporter {
        &self.reporter
    }

    pub fn native(&self) -> &Arc<dyn NativeContext> {
        &self.binding.native
    }

    /// Handle entering this context without a [`ContextLock`]
    pub fn binding(&self) -> &ContextBinding {
        &self.binding
    }

    /// Exclusive access, with the native context current on this thread
    ///
    /// # Panics
    ///
    /// If this thread already holds a lock on the context.
    ///
    /// # Errors
    ///
    /// The native context could not be made current, or a previous holder panicked.
    pub fn lock(&self) -> Result<ContextLock<'_, B>> {
        let relocked = LOCKED.with(|locked| locked.borrow().contains(&self.id));
        assert!(!relocked, "context {:?} is already locked on this thread", self.id);

        let exclusive = self
            .binding
            .exclusive
            .lock()
            .map_err(|_| Error::BackendError("Context lock poisoned".to_string()))?;
        let guard = CurrentContextGuard::new(&self.binding.native)?;
        let inner = self
            .inner
            .lock()
            .map_err(|_| Error::BackendError("Context lock poisoned".to_string()))?;
        LOCKED.with(|locked| locked.borrow_mut().push(self.id));
        Ok(ContextLock {
            context: self,
            inner,
            _current: guard,
            _exclusive: exclusive,
        })
    }
}

/// Exclusive, current access to a [`Context`]
pub struct ContextLock<'a, B: NativeBackend> {
    context: &'a Context<B>,
    inner: MutexGuard<'a, ContextInner<B>>,
    _current: CurrentContextGuard,
    _exclusive: MutexGuard<'a, ()>,
}

impl<B: NativeBackend> ContextLock<'_, B> {
    /// Replay `list` on the backend
    pub fn execute(&mut self, list: &CommandList) {
        let inner = &mut *self.inner;
        crate::execute::execute(
            list,
            &mut inner.stack,
            &mut inner.backend,
            &self.context.reporter,
            &mut inner.validation,
        );
    }

    pub fn flush(&mut self) {
        self.inner.backend.flush();
    }

    pub fn insert_fence(&mut self) -> FenceSignal {
        self.inner.backend.insert_fence()
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.inner.backend
    }

    pub fn state_stack(&self) -> &ContextStateStack {
        &self.inner.stack
    }

    pub fn validation_cache(&self) -> &ValidationCache {
        &self.inner.validation
    }
}

impl<B: NativeBackend> Drop for ContextLock<'_, B> {
    fn drop(&mut self) {
        let id = self.context.id;
        LOCKED.with(|locked| locked.borrow_mut().retain(|held| *held != id));
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
