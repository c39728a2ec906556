/// Call-recording backend
///
/// Executes nothing; stores every op it receives in order. It also hands out
/// names for the framebuffer objects and queries it "creates", like a real
/// backend would, so tests can check object reuse.

use rustc_hash::FxHashMap;
use crate::backend::{
    BackendCaps, BackendLimits, FenceSignal, FramebufferObject, NativeBackend, NativeOp, QuerySlot,
};
use crate::utils::NameAllocator;

pub struct NullBackend {
    calls: Vec<NativeOp>,
    caps: BackendCaps,
    limits: BackendLimits,
    names: NameAllocator,
    framebuffers: FxHashMap<FramebufferObject, u32>,
    queries: FxHashMap<QuerySlot, u32>,
    flush_count: u32,
}

impl NullBackend {
    /// Backend reporting every capability and the default limits
    pub fn new() -> Self {
        Self::with_capabilities(BackendCaps::all())
    }

    pub fn with_capabilities(caps: BackendCaps) -> Self {
        Self {
            calls: Vec::new(),
            caps,
            limits: BackendLimits::default(),
            names: NameAllocator::new(),
            framebuffers: FxHashMap::default(),
            queries: FxHashMap::default(),
            flush_count: 0,
        }
    }

    pub fn with_limits(mut self, limits: BackendLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Ops received so far
    pub fn calls(&self) -> &[NativeOp] {
        &self.calls
    }

    /// Drain the recorded ops
    pub fn take_calls(&mut self) -> Vec<NativeOp> {
        std::mem::take(&mut self.calls)
    }

    /// Name given to a framebuffer object on its first bind
    pub fn framebuffer_name(&self, framebuffer: FramebufferObject) -> Option<u32> {
        self.framebuffers.get(&framebuffer).copied()
    }

    pub fn framebuffer_object_count(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn query_name(&self, query: QuerySlot) -> Option<u32> {
        self.queries.get(&query).copied()
    }

    pub fn flush_count(&self) -> u32 {
        self.flush_count
    }

    fn name_framebuffer(&mut self, framebuffer: FramebufferObject) {
        if framebuffer != FramebufferObject::Default && !self.framebuffers.contains_key(&framebuffer) {
            let name = self.names.generate();
            self.framebuffers.insert(framebuffer, name);
        }
    }

    fn name_query(&mut self, query: QuerySlot) {
        if !self.queries.contains_key(&query) {
            let name = self.names.generate();
            self.queries.insert(query, name);
        }
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeBackend for NullBackend {
    fn name(&self) -> &'static str {
        "null"
    }

    fn capabilities(&self) -> BackendCaps {
        self.caps
    }

    fn limits(&self) -> BackendLimits {
        self.limits
    }

    fn execute(&mut self, op: &NativeOp) {
        match op {
            NativeOp::BindFramebuffer { framebuffer, .. } => self.name_framebuffer(*framebuffer),
            NativeOp::BeginQuery { query, .. } | NativeOp::WriteTimestamp { query } => self.name_query(*query),
            NativeOp::ResetQueries { pool, first, count } => {
                for index in *first..first.saturating_add(*count) {
                    if let Some(name) = self.queries.remove(&QuerySlot { pool: *pool, index }) {
                        self.names.release(name);
                    }
                }
            }
            _ => {}
        }
        crate::vks_trace!("vkshim::null", "{:?}", op);
        self.calls.push(op.clone());
    }

    fn flush(&mut self) {
        self.flush_count += 1;
    }

    fn insert_fence(&mut self) -> FenceSignal {
        FenceSignal::Signaled
    }
}
