/*!
# vkshim

Vulkan-shaped rendering API replayed on top of immediate-mode native APIs.

Applications record work into command buffers the way they would with Vulkan.
At submission the recorded command lists are replayed on a native backend
(GL, Direct3D 11, or the null backend used for testing) through a mirrored
state stack that only emits the native calls whose state actually changed.

## Architecture

- **Command buffers**: recording state machine producing immutable command lists
- **Context state stack**: mirror of native state, diffed into native ops
- **Executor**: replays command lists, emulating render passes with framebuffer objects
- **Native backends**: consume the op stream (`vkshim_renderer_gl`, `vkshim_renderer_d3d11`)
- **Context / Queue**: exclusive current-context access and ordered submission
*/

// Internal modules
mod error;
mod runtime;
mod config;
mod context;
mod queue;
mod fence;
pub mod log;
pub mod debug_report;
pub mod resource;
pub mod command;
pub mod backend;
pub mod state;
pub mod execute;
pub mod validation;
pub mod utils;

// Main vkshim namespace module
pub mod vkshim {
    // Error types
    pub use crate::error::{Error, Result};

    // Process-wide runtime singleton
    pub use crate::runtime::Runtime;

    // Context, submission and synchronization
    pub use crate::config::ContextConfig;
    pub use crate::context::{
        Context, ContextBinding, ContextLock, ContextScope, CurrentContextGuard, HeadlessContext, NativeContext,
    };
    pub use crate::queue::Queue;
    pub use crate::fence::{wait_for_fences, Fence, WaitResult, WAIT_FOREVER};

    // Debug reporting
    pub use crate::debug_report::{DebugMessage, DebugReportFlags, DebugReporter};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Command recording sub-module
    pub mod command {
        pub use crate::command::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Native backend seam sub-module
    pub mod backend {
        pub use crate::backend::*;
    }

    // Context state sub-module
    pub mod state {
        pub use crate::state::*;
    }
}

// Re-export math library at crate root
pub use glam;
