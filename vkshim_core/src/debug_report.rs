/// Debug report channel
///
/// Diagnostics found while recording, validating or replaying are sent to
/// [`DebugReporter::report_message`]. Each message is logged, counted, and handed
/// to every registered callback whose flag filter matches.

use bitflags::bitflags;
use slotmap::{new_key_type, SlotMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};
use crate::resource::ObjectType;

bitflags! {
    /// Severity/category of a debug message
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DebugReportFlags: u32 {
        const INFORMATION = 0x01;
        const WARNING = 0x02;
        const PERFORMANCE_WARNING = 0x04;
        const ERROR = 0x08;
        const DEBUG = 0x10;
    }
}

/// Message codes used by the core
pub mod message_code {
    /// Command or feature the backend cannot express; the operation was skipped
    pub const UNSUPPORTED_COMMAND: i32 = 1;
    /// Shader interface does not match vertex layout or render pass attachments
    pub const INTERFACE_MISMATCH: i32 = 2;
    /// Request exceeded a backend limit and was clamped
    pub const LIMIT_EXCEEDED: i32 = 3;
    /// Draw/dispatch replayed without the state it needs
    pub const MISSING_BINDING: i32 = 4;
}

/// One diagnostic
#[derive(Debug, Clone, PartialEq)]
pub struct DebugMessage {
    pub flags: DebugReportFlags,
    pub object_type: ObjectType,
    pub object: u64,
    pub message_code: i32,
    pub layer_prefix: String,
    pub message: String,
}

new_key_type! {
    /// Registration returned by [`DebugReporter::register`]
    pub struct DebugCallbackKey;
}

type DebugCallback = Arc<dyn Fn(&DebugMessage) + Send + Sync>;

struct Registration {
    flags: DebugReportFlags,
    callback: DebugCallback,
}

/// Counters per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugReportStats {
    pub errors: u32,
    pub warnings: u32,
    pub performance_warnings: u32,
    pub information: u32,
    pub debug: u32,
}

struct StatsTracker {
    errors: AtomicU32,
    warnings: AtomicU32,
    performance_warnings: AtomicU32,
    information: AtomicU32,
    debug: AtomicU32,
}

impl StatsTracker {
    const fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            performance_warnings: AtomicU32::new(0),
            information: AtomicU32::new(0),
            debug: AtomicU32::new(0),
        }
    }

    fn record(&self, flags: DebugReportFlags) {
        let counter = if flags.contains(DebugReportFlags::ERROR) {
            &self.errors
        } else if flags.contains(DebugReportFlags::WARNING) {
            &self.warnings
        } else if flags.contains(DebugReportFlags::PERFORMANCE_WARNING) {
            &self.performance_warnings
        } else if flags.contains(DebugReportFlags::INFORMATION) {
            &self.information
        } else {
            &self.debug
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn get(&self) -> DebugReportStats {
        DebugReportStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            performance_warnings: self.performance_warnings.load(Ordering::Relaxed),
            information: self.information.load(Ordering::Relaxed),
            debug: self.debug.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.errors.store(0, Ordering::Relaxed);
        self.warnings.store(0, Ordering::Relaxed);
        self.performance_warnings.store(0, Ordering::Relaxed);
        self.information.store(0, Ordering::Relaxed);
        self.debug.store(0, Ordering::Relaxed);
    }
}

struct ReporterInner {
    callbacks: RwLock<SlotMap<DebugCallbackKey, Registration>>,
    stats: StatsTracker,
}

/// Shared diagnostic channel
///
/// Cloning is cheap; clones feed the same callbacks and counters.
#[derive(Clone)]
pub struct DebugReporter {
    inner: Arc<ReporterInner>,
    filter: DebugReportFlags,
}

impl DebugReporter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ReporterInner {
                callbacks: RwLock::new(SlotMap::with_key()),
                stats: StatsTracker::new(),
            }),
            filter: DebugReportFlags::all(),
        }
    }

    /// Handle on the same channel that drops messages outside `flags`
    pub fn filtered(&self, flags: DebugReportFlags) -> DebugReporter {
        Self {
            inner: Arc::clone(&self.inner),
            filter: flags,
        }
    }

    /// Severities this handle forwards
    pub fn filter(&self) -> DebugReportFlags {
        self.filter
    }

    /// Register a callback receiving messages that intersect `flags`
    pub fn register<F>(&self, flags: DebugReportFlags, callback: F) -> DebugCallbackKey
    where
        F: Fn(&DebugMessage) + Send + Sync + 'static,
    {
        match self.inner.callbacks.write() {
            Ok(mut callbacks) => callbacks.insert(Registration {
                flags,
                callback: Arc::new(callback),
            }),
            Err(poisoned) => poisoned.into_inner().insert(Registration {
                flags,
                callback: Arc::new(callback),
            }),
        }
    }

    /// Remove a callback; returns false if it was already gone
    pub fn unregister(&self, key: DebugCallbackKey) -> bool {
        match self.inner.callbacks.write() {
            Ok(mut callbacks) => callbacks.remove(key).is_some(),
            Err(poisoned) => poisoned.into_inner().remove(key).is_some(),
        }
    }

    /// Emit one diagnostic
    ///
    /// # Arguments
    ///
    /// * `flags` - Severity
    /// * `object_type` / `object` - Object the message is about (`object` is an [`ObjectId`](crate::resource::ObjectId) raw value, 0 if none)
    /// * `message_code` - One of [`message_code`]
    /// * `layer_prefix` - Emitting component, e.g. "Executor"
    /// * `message` - Text
    pub fn report_message(
        &self,
        flags: DebugReportFlags,
        object_type: ObjectType,
        object: u64,
        message_code: i32,
        layer_prefix: &str,
        message: impl Into<String>,
    ) {
        if !flags.intersects(self.filter) {
            return;
        }
        let message = DebugMessage {
            flags,
            object_type,
            object,
            message_code,
            layer_prefix: layer_prefix.to_string(),
            message: message.into(),
        };

        self.inner.stats.record(flags);

        if flags.contains(DebugReportFlags::ERROR) {
            crate::vks_error!("vkshim::DebugReport", "[{}] {}", message.layer_prefix, message.message);
        } else if flags.intersects(DebugReportFlags::WARNING | DebugReportFlags::PERFORMANCE_WARNING) {
            crate::vks_warn!("vkshim::DebugReport", "[{}] {}", message.layer_prefix, message.message);
        } else if flags.contains(DebugReportFlags::INFORMATION) {
            crate::vks_info!("vkshim::DebugReport", "[{}] {}", message.layer_prefix, message.message);
        } else {
            crate::vks_debug!("vkshim::DebugReport", "[{}] {}", message.layer_prefix, message.message);
        }

        // Callbacks run without the registry lock so they may register/unregister.
        let targets: Vec<DebugCallback> = match self.inner.callbacks.read() {
            Ok(callbacks) => callbacks
                .values()
                .filter(|registration| registration.flags.intersects(flags))
                .map(|registration| Arc::clone(&registration.callback))
                .collect(),
            Err(_) => Vec::new(),
        };
        for callback in targets {
            callback(&message);
        }
    }

    pub fn stats(&self) -> DebugReportStats {
        self.inner.stats.get()
    }

    pub fn reset_stats(&self) {
        self.inner.stats.reset();
    }

    /// Whether both reporters feed the same callbacks
    pub fn same_channel(&self, other: &DebugReporter) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for DebugReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DebugReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugReporter")
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
#[path = "debug_report_tests.rs"]
mod tests;
