//! Object identities and opaque native handles

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an API object
///
/// Used wherever the state stack or a backend compares objects "by identity"
/// (framebuffer reuse, pipeline/render pass validation pairs, cached views).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Allocate a fresh identity
    pub fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Opaque handle of an object owned by the native API
///
/// GL names, D3D11 interface pointers or test-chosen integers. Supplied by the
/// object-registration layer; the core never creates or destroys them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct NativeHandle(pub u64);

impl NativeHandle {
    pub const NULL: NativeHandle = NativeHandle(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Object kinds reported through the debug channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Unknown,
    Context,
    Queue,
    CommandBuffer,
    Buffer,
    Image,
    ImageView,
    RenderPass,
    Framebuffer,
    Pipeline,
    PipelineLayout,
    DescriptorSet,
    QueryPool,
    Fence,
}
