/// Native backend seam
///
/// The executor is generic over [`NativeBackend`], so every op reaches the
/// backend through a statically dispatched call. A backend is chosen once, when
/// its [`Context`](crate::context::Context) is created.

use bitflags::bitflags;
use crate::backend::NativeOp;
use crate::fence::WaitResult;

bitflags! {
    /// Optional native features
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BackendCaps: u32 {
        /// Clear a texture level without a framebuffer (`glClearTexImage`)
        const CLEAR_TEX_IMAGE = 0x0001;
        /// Direct texture-to-texture copy (`glCopyImageSubData`, `CopySubresourceRegion`)
        const COPY_IMAGE = 0x0002;
        /// Per-attachment blend state (`glBlendFunci`, independent blend)
        const INDEXED_BLEND = 0x0004;
        /// Indexed viewports/scissors
        const VIEWPORT_ARRAY = 0x0008;
        /// Discard attachment content (`glInvalidateFramebuffer`)
        const INVALIDATE_FRAMEBUFFER = 0x0010;
        /// Explicit memory barriers
        const MEMORY_BARRIER = 0x0020;
        /// Compute dispatch
        const COMPUTE = 0x0040;
        /// Tessellation patches
        const TESSELLATION = 0x0080;
        /// Depth bounds test
        const DEPTH_BOUNDS = 0x0100;
        /// Native fence objects
        const FENCE_SYNC = 0x0200;
        /// Timestamp queries
        const TIMESTAMP_QUERY = 0x0400;
        /// Indirect draws
        const DRAW_INDIRECT = 0x0800;
        /// Logic ops on color attachments
        const LOGIC_OP = 0x1000;
        /// sRGB framebuffer conversion toggle
        const FRAMEBUFFER_SRGB = 0x2000;
    }
}

/// Native limits that the state stack clamps against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendLimits {
    pub max_viewports: u32,
    pub max_color_attachments: u32,
    pub max_vertex_bindings: u32,
    pub max_push_constant_size: u32,
}

impl Default for BackendLimits {
    fn default() -> Self {
        Self {
            max_viewports: 16,
            max_color_attachments: 8,
            max_vertex_bindings: 16,
            max_push_constant_size: 128,
        }
    }
}

/// Native object a submit can be waited on with
pub trait NativeSync: Send + Sync {
    /// Wait up to `timeout_ns` nanoseconds for the GPU to pass the sync point
    fn client_wait(&self, timeout_ns: u64) -> WaitResult;
}

/// Outcome of [`NativeBackend::insert_fence`]
pub enum FenceSignal {
    /// Work is already complete
    Signaled,
    /// Work completes when the native object is reached
    Pending(Box<dyn NativeSync>),
}

/// A native graphics API able to execute [`NativeOp`]s
///
/// Implementations start in the deactivated context state (see
/// [`ContextState::deactivated`](crate::state::ContextState::deactivated)) and
/// apply each op as given; redundancy elimination happens before ops reach them.
pub trait NativeBackend: Send {
    /// Short name for logs ("null", "gl", "d3d11")
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> BackendCaps;

    fn limits(&self) -> BackendLimits;

    /// Issue one native call
    fn execute(&mut self, op: &NativeOp);

    /// Push queued native work to the device
    fn flush(&mut self);

    /// Insert a sync point after everything executed so far
    fn insert_fence(&mut self) -> FenceSignal;
}
