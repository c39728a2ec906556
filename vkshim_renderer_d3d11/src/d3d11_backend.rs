/// Direct3D 11 implementation of [`NativeBackend`]
///
/// D3D11 groups fixed-function state into immutable objects, so most state ops
/// only edit a pending descriptor. Dirty descriptors are turned into state
/// objects (cached by value) right before the next draw or clear that needs
/// them. Framebuffer objects do not exist either: the backend keeps the
/// attachments of each emulated object and binds their views to the output
/// merger when the object is the draw target.
///
/// The immediate context is shared with the fences the backend hands out, so
/// it lives behind a mutex; replay locks it once per op.

use std::collections::BTreeMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use bitflags::bitflags;
use rustc_hash::FxHashMap;
use vkshim_core::backend::{
    AttachmentPoint, BackendCaps, BackendLimits, FboAttachment, FboTarget, FenceSignal, FramebufferObject,
    FramebufferTarget, NativeBackend, NativeOp, QuerySlot, StencilFace, TextureRef, TextureTarget,
};
use vkshim_core::command::{ClearColorValue, ClearValue, Filter};
use vkshim_core::glam::{IVec3, UVec3};
use vkshim_core::resource::{
    FrontFace, ImageAspectFlags, NativeHandle, ObjectId, PrimitiveTopology as Topology, QueryType,
    VertexInputRate, VertexInputState,
};
use vkshim_core::vkshim::{Error, Result};
use vkshim_core::{vks_debug, vks_info, vks_warn};
use crate::d3d11_conversions as conv;
use crate::d3d11_device::DeviceContext;
use crate::d3d11_sync::{lock, D3d11Sync};
use crate::d3d11_types::*;

const SOURCE: &str = "vkshim::d3d11";

/// Constant buffer slot reserved for push constants
pub const PUSH_CONSTANT_SLOT: u32 = 13;

/// Size of the constant buffer emulating push constants
pub const PUSH_CONSTANT_SIZE: u32 = 128;

/// `D3D11_VIEWPORT_AND_SCISSORRECT_OBJECT_COUNT_PER_PIPELINE`
const MAX_VIEWPORTS: usize = 16;

const MAX_RENDER_TARGETS: usize = 8;

/// Size of `D3D11_QUERY_DATA_PIPELINE_STATISTICS`
const PIPELINE_STATISTICS_SIZE: usize = 88;

bitflags! {
    /// Pending state not yet applied to the context
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Dirty: u32 {
        const BLEND = 0x01;
        const DEPTH_STENCIL = 0x02;
        const RASTERIZER = 0x04;
        const VIEWPORTS = 0x08;
        const SCISSORS = 0x10;
        const INPUT_LAYOUT = 0x20;
        const RENDER_TARGETS = 0x40;
    }
}

/// Attachments and buffer selection of one emulated framebuffer object
#[derive(Debug, Clone)]
struct RenderTargetSet {
    attachments: BTreeMap<AttachmentPoint, FboAttachment>,
    draw_buffers: Vec<AttachmentPoint>,
    read_buffer: AttachmentPoint,
}

impl Default for RenderTargetSet {
    fn default() -> Self {
        Self {
            attachments: BTreeMap::new(),
            draw_buffers: vec![AttachmentPoint::Color(0)],
            read_buffer: AttachmentPoint::Color(0),
        }
    }
}

impl RenderTargetSet {
    fn depth_stencil(&self) -> Option<FboAttachment> {
        self.attachments.values().find(|attachment| !attachment.point.is_color()).copied()
    }

    /// First color attachment selected for drawing
    fn first_draw_color(&self) -> Option<FboAttachment> {
        self.draw_buffers
            .iter()
            .filter(|point| point.is_color())
            .find_map(|point| self.attachments.get(point))
            .copied()
    }
}

/// View cache key: the viewed resource and the view description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ViewKey {
    RenderTarget(NativeHandle, AttachmentViewDesc),
    DepthStencil(NativeHandle, AttachmentViewDesc),
    ShaderResource(NativeHandle, ShaderResourceViewDesc),
    UnorderedAccess(NativeHandle, UnorderedAccessViewDesc),
}

impl ViewKey {
    fn resource(&self) -> NativeHandle {
        match self {
            ViewKey::RenderTarget(resource, _)
            | ViewKey::DepthStencil(resource, _)
            | ViewKey::ShaderResource(resource, _)
            | ViewKey::UnorderedAccess(resource, _) => *resource,
        }
    }
}

/// Features available at a feature level
fn capabilities(feature_level: FeatureLevel) -> BackendCaps {
    let mut caps = BackendCaps::CLEAR_TEX_IMAGE
        | BackendCaps::COPY_IMAGE
        | BackendCaps::INDEXED_BLEND
        | BackendCaps::VIEWPORT_ARRAY
        | BackendCaps::FENCE_SYNC
        | BackendCaps::TIMESTAMP_QUERY;
    if feature_level >= FeatureLevel::Level11_0 {
        caps |= BackendCaps::COMPUTE | BackendCaps::TESSELLATION | BackendCaps::DRAW_INDIRECT;
    }
    if feature_level >= FeatureLevel::Level11_1 {
        caps |= BackendCaps::LOGIC_OP | BackendCaps::INVALIDATE_FRAMEBUFFER;
    }
    caps
}

pub struct D3d11Backend<C: DeviceContext> {
    context: Arc<Mutex<C>>,
    feature_level: FeatureLevel,
    caps: BackendCaps,
    dirty: Dirty,

    blend: BlendDesc,
    blend_factor: [f32; 4],
    sample_mask: u32,
    depth_stencil: DepthStencilDesc,
    stencil_ref: u32,
    rasterizer: RasterizerDesc,
    depth_bias_enabled: bool,
    depth_bias: (f32, f32, f32),
    viewports: [Viewport; MAX_VIEWPORTS],
    viewport_count: u32,
    scissors: [Rect; MAX_VIEWPORTS],
    scissor_count: u32,
    patch_control_points: u32,
    topology: Option<PrimitiveTopology>,
    program: NativeHandle,
    vertex_layout: VertexInputState,

    blend_states: FxHashMap<BlendDesc, NativeHandle>,
    depth_stencil_states: FxHashMap<DepthStencilDesc, NativeHandle>,
    rasterizer_states: FxHashMap<RasterizerDesc, NativeHandle>,
    input_layouts: FxHashMap<(NativeHandle, VertexInputState), NativeHandle>,
    views: FxHashMap<ViewKey, NativeHandle>,

    framebuffers: FxHashMap<FramebufferObject, RenderTargetSet>,
    bound_draw: FramebufferObject,
    bound_read: FramebufferObject,
    queries: FxHashMap<QuerySlot, (NativeHandle, QueryKind)>,
    host_storage: FxHashMap<ObjectId, NativeHandle>,
    push_constants: [u8; PUSH_CONSTANT_SIZE as usize],
    push_constant_buffer: NativeHandle,
}

impl<C: DeviceContext> D3d11Backend<C> {
    /// Create the backend on a device and its immediate context
    ///
    /// The push constant buffer is created and bound here. Pending state starts
    /// as the deactivated context state and is all marked dirty, which replaces
    /// the D3D11 defaults (depth test on, back-face culling) on the first draw.
    pub fn new(mut context: C) -> Result<Self> {
        let feature_level = context.feature_level();
        let caps = capabilities(feature_level);

        let push_constant_buffer = context
            .create_buffer(&BufferDesc {
                byte_width: PUSH_CONSTANT_SIZE,
                usage: Usage::Default,
                bind_flags: BindFlags::CONSTANT_BUFFER,
            })
            .map_err(|error| Error::InitializationFailed(format!("push constant buffer: {}", error)))?;
        context.set_constant_buffer(PUSH_CONSTANT_SLOT, push_constant_buffer, 0, PUSH_CONSTANT_SIZE / 16);

        vks_info!(
            SOURCE,
            "D3D11 backend at feature level {:?}, {} of {} optional features",
            feature_level,
            caps.iter().count(),
            BackendCaps::all().iter().count()
        );

        Ok(Self {
            context: Arc::new(Mutex::new(context)),
            feature_level,
            caps,
            dirty: Dirty::all(),
            blend: BlendDesc::default(),
            blend_factor: [0.0; 4],
            sample_mask: u32::MAX,
            depth_stencil: DepthStencilDesc::default(),
            stencil_ref: 0,
            rasterizer: RasterizerDesc::default(),
            depth_bias_enabled: false,
            depth_bias: (0.0, 0.0, 0.0),
            viewports: [Viewport::default(); MAX_VIEWPORTS],
            viewport_count: 0,
            scissors: [Rect::default(); MAX_VIEWPORTS],
            scissor_count: 0,
            patch_control_points: 3,
            topology: None,
            program: NativeHandle::NULL,
            vertex_layout: VertexInputState::default(),
            blend_states: FxHashMap::default(),
            depth_stencil_states: FxHashMap::default(),
            rasterizer_states: FxHashMap::default(),
            input_layouts: FxHashMap::default(),
            views: FxHashMap::default(),
            framebuffers: FxHashMap::default(),
            bound_draw: FramebufferObject::Default,
            bound_read: FramebufferObject::Default,
            queries: FxHashMap::default(),
            host_storage: FxHashMap::default(),
            push_constants: [0; PUSH_CONSTANT_SIZE as usize],
            push_constant_buffer,
        })
    }

    /// The immediate context, for work between replays such as presenting
    pub fn context(&self) -> MutexGuard<'_, C> {
        lock(&self.context)
    }

    pub fn feature_level(&self) -> FeatureLevel {
        self.feature_level
    }

    /// Staging texture holding the last download of a host-visible image
    pub fn host_storage(&self, image: ObjectId) -> Option<NativeHandle> {
        self.host_storage.get(&image).copied()
    }

    /// Result of a query if the GPU has produced it
    ///
    /// Occlusion queries count samples, timestamps are raw ticks and pipeline
    /// statistics report the primitives read by the input assembler.
    pub fn query_result(&self, query: QuerySlot) -> Option<u64> {
        let (handle, kind) = *self.queries.get(&query)?;
        let mut data = [0u8; PIPELINE_STATISTICS_SIZE];
        let (size, field) = match kind {
            QueryKind::PipelineStatistics => (PIPELINE_STATISTICS_SIZE, 1),
            _ => (8, 0),
        };
        match lock(&self.context).get_data(handle, &mut data[..size]) {
            QueryData::Ready => Some(bytemuck::pod_read_unaligned::<u64>(&data[field * 8..field * 8 + 8])),
            QueryData::NotReady | QueryData::Failed => None,
        }
    }

    /// Forget the attachments emulating `framebuffer`
    pub fn release_framebuffer(&mut self, framebuffer: ObjectId) {
        let key = FramebufferObject::Framebuffer(framebuffer);
        if self.framebuffers.remove(&key).is_some() {
            if self.bound_draw == key {
                self.bound_draw = FramebufferObject::Default;
                self.dirty |= Dirty::RENDER_TARGETS;
            }
            if self.bound_read == key {
                self.bound_read = FramebufferObject::Default;
            }
        }
    }

    /// Release every cached view of a destroyed texture or buffer
    pub fn release_resource(&mut self, resource: NativeHandle) {
        let mut dc = lock(&self.context);
        self.views.retain(|key, view| {
            let keep = key.resource() != resource;
            if !keep {
                dc.release(*view);
            }
            keep
        });
    }

    /// Release the host storage of a destroyed image
    pub fn release_host_storage(&mut self, image: ObjectId) {
        if let Some(staging) = self.host_storage.remove(&image) {
            lock(&self.context).release(staging);
        }
    }

    // ===== OBJECT CACHES =====

    fn view(&mut self, dc: &mut C, key: ViewKey) -> Option<NativeHandle> {
        if let Some(view) = self.views.get(&key) {
            return Some(*view);
        }
        let created = match &key {
            ViewKey::RenderTarget(resource, desc) => dc.create_render_target_view(*resource, desc),
            ViewKey::DepthStencil(resource, desc) => dc.create_depth_stencil_view(*resource, desc),
            ViewKey::ShaderResource(resource, desc) => dc.create_shader_resource_view(*resource, desc),
            ViewKey::UnorderedAccess(resource, desc) => dc.create_unordered_access_view(*resource, desc),
        };
        match created {
            Ok(view) => {
                self.views.insert(key, view);
                Some(view)
            }
            Err(error) => {
                vks_warn!(SOURCE, "Creating {:?} failed: {}", key, error);
                None
            }
        }
    }

    fn render_target_view(&mut self, dc: &mut C, attachment: &FboAttachment) -> Option<NativeHandle> {
        self.view(dc, ViewKey::RenderTarget(attachment.texture.handle, conv::attachment_view(attachment)))
    }

    fn depth_stencil_view(&mut self, dc: &mut C, attachment: &FboAttachment) -> Option<NativeHandle> {
        self.view(dc, ViewKey::DepthStencil(attachment.texture.handle, conv::attachment_view(attachment)))
    }

    fn query_object(&mut self, dc: &mut C, query: QuerySlot, kind: QueryKind) -> Option<NativeHandle> {
        match self.queries.get(&query) {
            Some((handle, existing)) if *existing == kind => return Some(*handle),
            Some((handle, _)) => dc.release(*handle),
            None => {}
        }
        match dc.create_query(kind) {
            Ok(handle) => {
                self.queries.insert(query, (handle, kind));
                Some(handle)
            }
            Err(error) => {
                vks_warn!(SOURCE, "Creating {:?} query failed: {}", kind, error);
                self.queries.remove(&query);
                None
            }
        }
    }

    fn staging_texture(&mut self, dc: &mut C, texture: &TextureRef) -> Option<NativeHandle> {
        if let Some(staging) = self.host_storage.get(&texture.id) {
            return Some(*staging);
        }
        match dc.create_staging_texture(texture.handle) {
            Ok(staging) => {
                vks_debug!(SOURCE, "Created host storage {:?} for image {:?}", staging, texture.id);
                self.host_storage.insert(texture.id, staging);
                Some(staging)
            }
            Err(error) => {
                vks_warn!(SOURCE, "Host storage for image {:?} failed: {}", texture.id, error);
                None
            }
        }
    }

    // ===== PENDING STATE =====

    fn render_target_blend(&mut self, attachment: u32) -> Option<&mut RenderTargetBlendDesc> {
        self.dirty |= Dirty::BLEND;
        self.blend.render_target.get_mut(attachment as usize)
    }

    fn stencil_faces(&mut self, face: StencilFace) -> Vec<&mut DepthStencilOpDesc> {
        self.dirty |= Dirty::DEPTH_STENCIL;
        let desc = &mut self.depth_stencil;
        match face {
            StencilFace::Front => vec![&mut desc.front_face],
            StencilFace::Back => vec![&mut desc.back_face],
            StencilFace::FrontAndBack => vec![&mut desc.front_face, &mut desc.back_face],
        }
    }

    fn update_depth_bias(&mut self) {
        let (constant, clamp, slope) = if self.depth_bias_enabled { self.depth_bias } else { (0.0, 0.0, 0.0) };
        self.rasterizer.depth_bias = constant as i32;
        self.rasterizer.depth_bias_clamp = clamp;
        self.rasterizer.slope_scaled_depth_bias = slope;
        self.dirty |= Dirty::RASTERIZER;
    }

    fn set_logic_op(&mut self, op: Option<vkshim_core::resource::LogicOp>) {
        if op.is_some() && !self.caps.contains(BackendCaps::LOGIC_OP) {
            vks_warn!(SOURCE, "Logic ops need feature level 11_1, ignored");
            return;
        }
        for target in &mut self.blend.render_target {
            target.logic_op_enable = op.is_some();
            target.logic_op = op.map_or(LogicOp::Noop, conv::logic_op);
        }
        self.dirty |= Dirty::BLEND;
    }

    // ===== STATE APPLICATION =====

    /// Apply dirty fixed-function state and render targets before a draw or clear
    fn apply_state(&mut self, dc: &mut C) {
        if self.dirty.contains(Dirty::RENDER_TARGETS) {
            let (colors, depth_stencil) = self.target_views(dc);
            dc.om_set_render_targets(&colors, depth_stencil);
        }
        if self.dirty.contains(Dirty::BLEND) {
            let mut desc = self.blend;
            let first = desc.render_target[0];
            desc.independent_blend_enable = desc.render_target[1..].iter().any(|target| *target != first);
            if let Some(state) = cached(&mut self.blend_states, desc, |desc| dc.create_blend_state(desc), "blend state") {
                dc.om_set_blend_state(state, self.blend_factor, self.sample_mask);
            }
        }
        if self.dirty.contains(Dirty::DEPTH_STENCIL) {
            let create = |desc: &DepthStencilDesc| dc.create_depth_stencil_state(desc);
            if let Some(state) = cached(&mut self.depth_stencil_states, self.depth_stencil, create, "depth-stencil state") {
                dc.om_set_depth_stencil_state(state, self.stencil_ref);
            }
        }
        if self.dirty.contains(Dirty::RASTERIZER) {
            let create = |desc: &RasterizerDesc| dc.create_rasterizer_state(desc);
            if let Some(state) = cached(&mut self.rasterizer_states, self.rasterizer, create, "rasterizer state") {
                dc.rs_set_state(state);
            }
        }
        if self.dirty.contains(Dirty::VIEWPORTS) {
            dc.rs_set_viewports(&self.viewports[..self.viewport_count as usize]);
        }
        if self.dirty.contains(Dirty::SCISSORS) {
            dc.rs_set_scissor_rects(&self.scissors[..self.scissor_count as usize]);
        }
        self.dirty &= Dirty::INPUT_LAYOUT;
    }

    fn apply_input_layout(&mut self, dc: &mut C) {
        if !self.dirty.contains(Dirty::INPUT_LAYOUT) {
            return;
        }
        self.dirty.remove(Dirty::INPUT_LAYOUT);
        if self.vertex_layout.attributes.is_empty() || self.program.is_null() {
            dc.ia_set_input_layout(NativeHandle::NULL);
            return;
        }
        let program = self.program;
        let elements = input_elements(&self.vertex_layout);
        let key = (program, self.vertex_layout.clone());
        let create = |_: &(NativeHandle, VertexInputState)| dc.create_input_layout(program, &elements);
        let layout = cached(&mut self.input_layouts, key, create, "input layout").unwrap_or(NativeHandle::NULL);
        dc.ia_set_input_layout(layout);
    }

    /// Apply state for a draw; `false` when the topology cannot be drawn
    fn prepare_draw(&mut self, dc: &mut C, topology: Topology) -> bool {
        let Some(native) = conv::primitive_topology(topology, self.patch_control_points) else {
            vks_warn!(SOURCE, "{:?} has no D3D11 equivalent, draw skipped", topology);
            return false;
        };
        self.apply_state(dc);
        self.apply_input_layout(dc);
        if self.topology != Some(native) {
            dc.ia_set_primitive_topology(native);
            self.topology = Some(native);
        }
        true
    }

    // ===== FRAMEBUFFERS =====

    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: FramebufferObject) {
        self.framebuffers.entry(framebuffer).or_default();
        if target != FramebufferTarget::Read && self.bound_draw != framebuffer {
            self.bound_draw = framebuffer;
            self.dirty |= Dirty::RENDER_TARGETS;
        }
        if target != FramebufferTarget::Draw {
            self.bound_read = framebuffer;
        }
    }

    /// Edit the attachments of `framebuffer`, rebinding it if it is the draw target
    fn edit_framebuffer(&mut self, framebuffer: FramebufferObject, edit: impl FnOnce(&mut RenderTargetSet)) {
        edit(self.framebuffers.entry(framebuffer).or_default());
        if framebuffer == self.bound_draw {
            self.dirty |= Dirty::RENDER_TARGETS;
        }
    }

    /// Output merger views of the bound draw framebuffer
    ///
    /// Render target slot k receives `Color(k)` when it is a draw buffer.
    fn target_views(&mut self, dc: &mut C) -> (Vec<Option<NativeHandle>>, Option<NativeHandle>) {
        let set = self.framebuffers.get(&self.bound_draw).cloned().unwrap_or_default();
        if self.bound_draw == FramebufferObject::Default {
            let defaults = dc.default_views();
            let colors = if set.draw_buffers.contains(&AttachmentPoint::Color(0)) {
                vec![defaults.render_target]
            } else {
                Vec::new()
            };
            return (colors, defaults.depth_stencil);
        }

        let slots = set
            .draw_buffers
            .iter()
            .filter_map(|point| match point {
                AttachmentPoint::Color(index) => Some(*index as usize + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            .min(MAX_RENDER_TARGETS);
        let mut colors = vec![None; slots];
        for (slot, view) in colors.iter_mut().enumerate() {
            let point = AttachmentPoint::Color(slot as u32);
            if !set.draw_buffers.contains(&point) {
                continue;
            }
            if let Some(attachment) = set.attachments.get(&point) {
                *view = self.render_target_view(dc, attachment);
            }
        }
        let depth_stencil = set.depth_stencil().and_then(|attachment| self.depth_stencil_view(dc, &attachment));
        (colors, depth_stencil)
    }

    fn color_target(&mut self, dc: &mut C, slot: u32) -> Option<NativeHandle> {
        let point = AttachmentPoint::Color(slot);
        let set = self.framebuffers.get(&self.bound_draw).cloned().unwrap_or_default();
        if !set.draw_buffers.contains(&point) {
            return None;
        }
        if self.bound_draw == FramebufferObject::Default {
            return if slot == 0 { dc.default_views().render_target } else { None };
        }
        let attachment = *set.attachments.get(&point)?;
        self.render_target_view(dc, &attachment)
    }

    fn depth_target(&mut self, dc: &mut C) -> Option<NativeHandle> {
        if self.bound_draw == FramebufferObject::Default {
            return dc.default_views().depth_stencil;
        }
        let attachment = self.framebuffers.get(&self.bound_draw)?.depth_stencil()?;
        self.depth_stencil_view(dc, &attachment)
    }

    /// Clears obey the first scissor while scissoring is on
    fn clear_color_attachment(&mut self, dc: &mut C, slot: u32, value: &ClearColorValue) {
        let Some(view) = self.color_target(dc, slot) else {
            return;
        };
        let color = conv::clear_color(value);
        if self.scissor_count == 0 {
            dc.clear_render_target_view(view, color);
        } else if self.feature_level >= FeatureLevel::Level11_1 {
            dc.clear_view(view, color, &self.scissors[..1]);
        } else {
            vks_debug!(SOURCE, "Scissored clear needs feature level 11_1, clearing the whole view");
            dc.clear_render_target_view(view, color);
        }
    }

    fn clear_depth_stencil_attachment(&mut self, dc: &mut C, depth: Option<f32>, stencil: Option<u32>) {
        let mut flags = ClearFlags::empty();
        flags.set(ClearFlags::DEPTH, depth.is_some());
        flags.set(ClearFlags::STENCIL, stencil.is_some());
        if flags.is_empty() {
            return;
        }
        if let Some(view) = self.depth_target(dc) {
            dc.clear_depth_stencil_view(view, flags, depth.unwrap_or(1.0), stencil.unwrap_or(0) as u8);
        }
    }

    fn invalidate_attachments(&mut self, dc: &mut C, framebuffer: FramebufferObject, points: &[AttachmentPoint]) {
        if !self.caps.contains(BackendCaps::INVALIDATE_FRAMEBUFFER) {
            return;
        }
        let set = self.framebuffers.get(&framebuffer).cloned().unwrap_or_default();
        for point in points {
            let view = if framebuffer == FramebufferObject::Default {
                let defaults = dc.default_views();
                if point.is_color() { defaults.render_target } else { defaults.depth_stencil }
            } else {
                match set.attachments.get(point) {
                    Some(attachment) if point.is_color() => self.render_target_view(dc, attachment),
                    Some(attachment) => self.depth_stencil_view(dc, attachment),
                    None => None,
                }
            };
            if let Some(view) = view {
                dc.discard_view(view);
            }
        }
    }

    fn blit_framebuffer(&mut self, dc: &mut C, src: [IVec3; 2], dst: [IVec3; 2], mask: ImageAspectFlags, filter: Filter) {
        if self.bound_read == FramebufferObject::Default || self.bound_draw == FramebufferObject::Default {
            vks_warn!(SOURCE, "Blits from or to the default framebuffer are not supported, skipped");
            return;
        }
        let read = self.framebuffers.get(&self.bound_read).cloned().unwrap_or_default();
        let draw = self.framebuffers.get(&self.bound_draw).cloned().unwrap_or_default();
        if mask.contains(ImageAspectFlags::COLOR) {
            if let (Some(from), Some(to)) = (read.attachments.get(&read.read_buffer), draw.first_draw_color()) {
                self.blit_attachment(dc, from, &to, src, dst, filter);
            }
        }
        if mask.intersects(ImageAspectFlags::DEPTH | ImageAspectFlags::STENCIL) {
            if let (Some(from), Some(to)) = (read.depth_stencil(), draw.depth_stencil()) {
                self.blit_attachment(dc, &from, &to, src, dst, Filter::Nearest);
            }
        }
    }

    /// One attachment of a blit
    ///
    /// Same-size regions copy, multisampled sources resolve and a halving
    /// between adjacent levels of one texture regenerates the smaller level.
    /// Other scaled blits have no D3D11 counterpart.
    fn blit_attachment(
        &mut self,
        dc: &mut C,
        from: &FboAttachment,
        to: &FboAttachment,
        src: [IVec3; 2],
        dst: [IVec3; 2],
        filter: Filter,
    ) {
        let (src_size, dst_size) = (src[1] - src[0], dst[1] - dst[0]);
        if src_size.min_element() < 0 || dst_size.min_element() < 0 {
            vks_warn!(SOURCE, "Mirrored blits are not supported, skipped");
            return;
        }
        let src_mips = dc.texture_desc(from.texture.handle).mip_levels;
        let dst_mips = dc.texture_desc(to.texture.handle).mip_levels;
        let src_sub = conv::subresource(from.mip_level, conv::attachment_slice(from.target), src_mips);
        let dst_sub = conv::subresource(to.mip_level, conv::attachment_slice(to.target), dst_mips);
        let multisampled = |texture: &TextureRef| {
            matches!(texture.target, TextureTarget::Texture2DMultisample | TextureTarget::Texture2DMultisampleArray)
        };

        if multisampled(&from.texture) && !multisampled(&to.texture) {
            let format = conv::dxgi_format(from.texture.format);
            dc.resolve_subresource(to.texture.handle, dst_sub, from.texture.handle, src_sub, format);
            return;
        }

        if src_size == dst_size {
            // Depth-stencil and multisampled copies must cover whole subresources.
            if from.point.is_color() && !multisampled(&from.texture) {
                let front = slice_z(from.target);
                let region = Box3 {
                    left: src[0].x as u32,
                    top: src[0].y as u32,
                    front,
                    right: src[1].x as u32,
                    bottom: src[1].y as u32,
                    back: front + 1,
                };
                let (x, y, z) = (dst[0].x as u32, dst[0].y as u32, slice_z(to.target));
                dc.copy_subresource_region(to.texture.handle, dst_sub, x, y, z, from.texture.handle, src_sub, Some(&region));
            } else {
                dc.copy_subresource_region(to.texture.handle, dst_sub, 0, 0, 0, from.texture.handle, src_sub, None);
            }
            return;
        }

        let level_size = |texture: &TextureRef, level: u32| {
            IVec3::new((texture.extent.x >> level).max(1) as i32, (texture.extent.y >> level).max(1) as i32, 1)
        };
        let whole = |offsets: [IVec3; 2], texture: &TextureRef, level: u32| {
            offsets[0] == IVec3::ZERO && offsets[1].truncate() == level_size(texture, level).truncate()
        };
        let next_level = from.texture.handle == to.texture.handle
            && from.point.is_color()
            && filter == Filter::Linear
            && to.mip_level == from.mip_level + 1
            && conv::attachment_slice(from.target) == conv::attachment_slice(to.target)
            && whole(src, &from.texture, from.mip_level)
            && whole(dst, &to.texture, to.mip_level);
        if next_level {
            let mut desc = conv::shader_resource_view(&from.texture, from.texture.format, from.mip_level, 2, 1);
            if let FboTarget::ArrayLayer(layer) | FboTarget::CubeFace(layer) = from.target {
                desc.dimension = if from.texture.target == TextureTarget::Texture1DArray {
                    ViewDimension::Texture1DArray
                } else {
                    ViewDimension::Texture2DArray
                };
                desc.first_array_slice = layer;
                desc.array_size = 1;
            }
            if let Some(view) = self.view(dc, ViewKey::ShaderResource(from.texture.handle, desc)) {
                dc.generate_mips(view);
            }
            return;
        }

        vks_warn!(SOURCE, "Scaled blit {:?} -> {:?} is not supported, skipped", src_size, dst_size);
    }

    // ===== DESCRIPTORS =====

    fn bind_uniform_buffer(&mut self, dc: &mut C, binding: u32, buffer: NativeHandle, offset: u64, size: u64) {
        if binding == PUSH_CONSTANT_SLOT {
            vks_warn!(SOURCE, "Constant buffer slot {} is reserved for push constants, binding skipped", binding);
            return;
        }
        if offset != 0 && self.feature_level < FeatureLevel::Level11_1 {
            vks_warn!(SOURCE, "Constant buffer offset {} needs feature level 11_1, binding from 0", offset);
        }
        // Ranges are given in 16-byte constants, in multiples of 16 constants.
        let first_constant = to_u32(offset / 16);
        let num_constants = to_u32(size.div_ceil(16)).next_multiple_of(16);
        dc.set_constant_buffer(binding, buffer, first_constant, num_constants);
    }

    fn bind_storage_buffer(&mut self, dc: &mut C, binding: u32, buffer: NativeHandle, offset: u64, size: u64) {
        let desc = UnorderedAccessViewDesc::RawBuffer { first_element: to_u32(offset / 4), num_elements: to_u32(size / 4) };
        if let Some(view) = self.view(dc, ViewKey::UnorderedAccess(buffer, desc)) {
            dc.set_unordered_access_view(binding, view);
        }
    }

    fn push_constants(&mut self, dc: &mut C, offset: u32, data: &[u8]) {
        let start = offset as usize;
        let end = start + data.len();
        if end > self.push_constants.len() {
            vks_warn!(SOURCE, "Push constant range {}..{} exceeds {} bytes, skipped", start, end, PUSH_CONSTANT_SIZE);
            return;
        }
        self.push_constants[start..end].copy_from_slice(data);
        dc.update_subresource(self.push_constant_buffer, 0, None, &self.push_constants, 0, 0);
    }

    // ===== TRANSFER =====

    #[allow(clippy::too_many_arguments)]
    fn copy_image(
        &mut self,
        dc: &mut C,
        src: &TextureRef,
        src_level: u32,
        src_offset: IVec3,
        dst: &TextureRef,
        dst_level: u32,
        dst_offset: IVec3,
        extent: UVec3,
    ) {
        let src_mips = dc.texture_desc(src.handle).mip_levels;
        let dst_mips = dc.texture_desc(dst.handle).mip_levels;
        let volumes = src.target == TextureTarget::Texture3D && dst.target == TextureTarget::Texture3D;
        let slices = if volumes { 1 } else { extent.z.max(1) };
        for slice in 0..slices {
            let depth = if volumes { extent.z.max(1) } else { 1 };
            let (src_sub, src_z) = layer_address(src, src_level, src_offset.z as u32 + slice, src_mips);
            let (dst_sub, dst_z) = layer_address(dst, dst_level, dst_offset.z as u32 + slice, dst_mips);
            let region = Box3 {
                left: src_offset.x as u32,
                top: src_offset.y as u32,
                front: src_z,
                right: src_offset.x as u32 + extent.x,
                bottom: src_offset.y as u32 + extent.y.max(1),
                back: src_z + depth,
            };
            let (x, y) = (dst_offset.x as u32, dst_offset.y as u32);
            dc.copy_subresource_region(dst.handle, dst_sub, x, y, dst_z, src.handle, src_sub, Some(&region));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn upload_image(
        &mut self,
        dc: &mut C,
        buffer: NativeHandle,
        buffer_offset: u64,
        row_length: u32,
        image_height: u32,
        texture: &TextureRef,
        level: u32,
        offset: IVec3,
        extent: UVec3,
    ) {
        if matches!(texture.target, TextureTarget::Texture2DMultisample | TextureTarget::Texture2DMultisampleArray) {
            vks_warn!(SOURCE, "Uploads to multisampled image {:?} are not possible, skipped", texture.id);
            return;
        }
        let format = texture.format;
        let block = if format.is_compressed() { 4 } else { 1 };
        let row_texels = if row_length > 0 { row_length } else { extent.x };
        let image_rows = if image_height > 0 { image_height } else { extent.y };
        let row_pitch = row_texels.div_ceil(block) * format.block_size();
        let depth_pitch = row_pitch * image_rows.div_ceil(block);

        let mapped = match dc.map(buffer, 0, MapType::Read) {
            Ok(mapped) => mapped,
            Err(error) => {
                vks_warn!(SOURCE, "Mapping upload buffer {:?} failed: {}, upload skipped", buffer, error);
                return;
            }
        };
        // SAFETY: the mapping stays valid until the unmap below.
        let source = unsafe { mapped_bytes(&mapped) };

        let mips = dc.texture_desc(texture.handle).mip_levels;
        let volume = texture.target == TextureTarget::Texture3D;
        let (slices, depth) = if volume { (1, extent.z.max(1)) } else { (extent.z.max(1), 1) };
        let slice_bytes = depth_pitch as usize * depth as usize;
        for slice in 0..slices {
            let start = buffer_offset as usize + slice as usize * slice_bytes;
            let Some(data) = source.get(start..start + slice_bytes) else {
                vks_warn!(SOURCE, "Upload to image {:?} reads past its buffer, skipped", texture.id);
                break;
            };
            let (subresource, front) = layer_address(texture, level, offset.z as u32 + slice, mips);
            let region = Box3 {
                left: offset.x as u32,
                top: offset.y as u32,
                front: if volume { offset.z as u32 } else { front },
                right: offset.x as u32 + extent.x,
                bottom: offset.y as u32 + extent.y.max(1),
                back: if volume { offset.z as u32 + depth } else { front + 1 },
            };
            dc.update_subresource(texture.handle, subresource, Some(&region), data, row_pitch, depth_pitch);
        }
        dc.unmap(buffer, 0);
    }

    /// Copy a region into the image's staging texture, then pack it tightly
    /// into `buffer` when one is given
    #[allow(clippy::too_many_arguments)]
    fn download_image(
        &mut self,
        dc: &mut C,
        texture: &TextureRef,
        level: u32,
        offset: IVec3,
        extent: UVec3,
        buffer: Option<NativeHandle>,
        buffer_offset: u64,
    ) {
        if texture.format.is_compressed() {
            vks_warn!(SOURCE, "Downloads of compressed image {:?} are not supported, skipped", texture.id);
            return;
        }
        if matches!(texture.target, TextureTarget::Texture2DMultisample | TextureTarget::Texture2DMultisampleArray) {
            vks_warn!(SOURCE, "Downloads of multisampled image {:?} need a resolve first, skipped", texture.id);
            return;
        }
        let Some(staging) = self.staging_texture(dc, texture) else {
            return;
        };

        let mips = dc.texture_desc(texture.handle).mip_levels;
        let volume = texture.target == TextureTarget::Texture3D;
        let mip = |size: u32| (size >> level).max(1);
        let whole = offset == IVec3::ZERO && extent.x == mip(texture.extent.x) && extent.y == mip(texture.extent.y);
        let (first, slices, depth) = if volume {
            (offset.z as u32, 1, extent.z.max(1))
        } else if whole && texture.target == TextureTarget::CubeMap {
            (0, 6, 1)
        } else {
            (offset.z as u32, extent.z.max(1), 1)
        };

        let mut regions = Vec::with_capacity(slices as usize);
        for slice in 0..slices {
            let (subresource, front) = layer_address(texture, level, first + slice, mips);
            let region = Box3 {
                left: offset.x as u32,
                top: offset.y as u32,
                front,
                right: offset.x as u32 + extent.x,
                bottom: offset.y as u32 + extent.y.max(1),
                back: front + depth,
            };
            dc.copy_subresource_region(staging, subresource, region.left, region.top, front, texture.handle, subresource, Some(&region));
            regions.push((subresource, region));
        }

        let Some(buffer) = buffer else {
            return;
        };
        let row_bytes = extent.x as usize * texture.format.block_size() as usize;
        let rows = extent.y.max(1) as usize;
        let total = row_bytes * rows * depth as usize * slices as usize;
        let target = match dc.map(buffer, 0, MapType::Write) {
            Ok(mapped) => mapped,
            Err(error) => {
                vks_warn!(SOURCE, "Mapping download buffer {:?} failed: {}", buffer, error);
                return;
            }
        };
        // SAFETY: the buffer mapping stays valid until its unmap below.
        let packed = unsafe { mapped_bytes(&target) };
        let Some(packed) = packed.get_mut(buffer_offset as usize..buffer_offset as usize + total) else {
            vks_warn!(SOURCE, "Download of image {:?} writes past its buffer, skipped", texture.id);
            dc.unmap(buffer, 0);
            return;
        };

        let mut rows_out = packed.chunks_exact_mut(row_bytes.max(1));
        for (subresource, region) in regions {
            let mapped = match dc.map(staging, subresource, MapType::Read) {
                Ok(mapped) => mapped,
                Err(error) => {
                    vks_warn!(SOURCE, "Mapping host storage of image {:?} failed: {}", texture.id, error);
                    break;
                }
            };
            // SAFETY: the staging mapping stays valid until its unmap below.
            let source = unsafe { mapped_bytes(&mapped) };
            let x_bytes = region.left as usize * texture.format.block_size() as usize;
            for z in region.front..region.back {
                for y in region.top..region.bottom {
                    let start = z as usize * mapped.depth_pitch as usize + y as usize * mapped.row_pitch as usize + x_bytes;
                    if let (Some(row), Some(out)) = (source.get(start..start + row_bytes), rows_out.next()) {
                        out.copy_from_slice(row);
                    }
                }
            }
            dc.unmap(staging, subresource);
        }
        dc.unmap(buffer, 0);
    }

    fn clear_tex_image(&mut self, dc: &mut C, texture: &TextureRef, level: u32, base_layer: u32, layer_count: u32, value: &ClearValue) {
        let desc = conv::level_view(texture, level, base_layer, layer_count);
        let format = texture.format;
        if format.is_depth_or_stencil() {
            let mut flags = ClearFlags::empty();
            flags.set(ClearFlags::DEPTH, format.has_depth());
            flags.set(ClearFlags::STENCIL, format.has_stencil());
            let clear = value.depth_stencil();
            if let Some(view) = self.view(dc, ViewKey::DepthStencil(texture.handle, desc)) {
                dc.clear_depth_stencil_view(view, flags, clear.depth, clear.stencil as u8);
            }
        } else if let Some(view) = self.view(dc, ViewKey::RenderTarget(texture.handle, desc)) {
            dc.clear_render_target_view(view, conv::clear_color(&value.color()));
        }
    }

    // ===== QUERIES =====

    fn reset_queries(&mut self, dc: &mut C, pool: ObjectId, first: u32, count: u32) {
        for index in first..first.saturating_add(count) {
            if let Some((handle, _)) = self.queries.remove(&QuerySlot { pool, index }) {
                dc.release(handle);
            }
        }
    }

    fn execute_op(&mut self, dc: &mut C, op: &NativeOp) {
        match op {
            // ---- color blend
            NativeOp::SetBlendEnabled { attachment, enabled } => {
                if let Some(target) = self.render_target_blend(*attachment) {
                    target.blend_enable = *enabled;
                }
            }
            NativeOp::SetBlendFunc { attachment, src_color, dst_color, src_alpha, dst_alpha } => {
                if let Some(target) = self.render_target_blend(*attachment) {
                    target.src_blend = conv::blend(*src_color);
                    target.dest_blend = conv::blend(*dst_color);
                    target.src_blend_alpha = conv::blend_alpha(*src_alpha);
                    target.dest_blend_alpha = conv::blend_alpha(*dst_alpha);
                }
            }
            NativeOp::SetBlendEquation { attachment, color_op, alpha_op } => {
                if let Some(target) = self.render_target_blend(*attachment) {
                    target.blend_op = conv::blend_op(*color_op);
                    target.blend_op_alpha = conv::blend_op(*alpha_op);
                }
            }
            NativeOp::SetColorWriteMask { attachment, mask } => {
                if let Some(target) = self.render_target_blend(*attachment) {
                    target.render_target_write_mask = conv::color_write_mask(*mask);
                }
            }
            NativeOp::SetBlendConstants(constants) => {
                self.blend_factor = *constants;
                self.dirty |= Dirty::BLEND;
            }
            NativeOp::SetLogicOp(op) => self.set_logic_op(*op),

            // ---- depth / stencil
            NativeOp::SetDepthTestEnabled(enabled) => {
                self.depth_stencil.depth_enable = *enabled;
                self.dirty |= Dirty::DEPTH_STENCIL;
            }
            NativeOp::SetDepthWriteEnabled(enabled) => {
                self.depth_stencil.depth_write = *enabled;
                self.dirty |= Dirty::DEPTH_STENCIL;
            }
            NativeOp::SetDepthCompareOp(op) => {
                self.depth_stencil.depth_func = conv::comparison_func(*op);
                self.dirty |= Dirty::DEPTH_STENCIL;
            }
            NativeOp::SetDepthBoundsTestEnabled(enabled) => {
                if *enabled {
                    vks_warn!(SOURCE, "Depth bounds test is not available, ignored");
                }
            }
            NativeOp::SetDepthBounds { .. } => {}
            NativeOp::SetStencilTestEnabled(enabled) => {
                self.depth_stencil.stencil_enable = *enabled;
                self.dirty |= Dirty::DEPTH_STENCIL;
            }
            NativeOp::SetStencilOps { face, fail, depth_fail, pass } => {
                for desc in self.stencil_faces(*face) {
                    desc.stencil_fail_op = conv::stencil_op(*fail);
                    desc.stencil_depth_fail_op = conv::stencil_op(*depth_fail);
                    desc.stencil_pass_op = conv::stencil_op(*pass);
                }
            }
            // Reference and masks are shared by both faces.
            NativeOp::SetStencilFunc { face, compare_op, reference, compare_mask } => {
                for desc in self.stencil_faces(*face) {
                    desc.stencil_func = conv::comparison_func(*compare_op);
                }
                self.depth_stencil.stencil_read_mask = *compare_mask as u8;
                self.stencil_ref = *reference;
            }
            NativeOp::SetStencilWriteMask { mask, .. } => {
                self.depth_stencil.stencil_write_mask = *mask as u8;
                self.dirty |= Dirty::DEPTH_STENCIL;
            }

            // ---- multisample
            NativeOp::SetMultisampleEnabled(enabled) => {
                self.rasterizer.multisample_enable = *enabled;
                self.dirty |= Dirty::RASTERIZER;
            }
            // Per-sample shading follows from the pixel shader inputs.
            NativeOp::SetSampleShading { .. } => {}
            NativeOp::SetSampleMask(mask) => {
                self.sample_mask = *mask;
                self.dirty |= Dirty::BLEND;
            }
            NativeOp::SetAlphaToCoverageEnabled(enabled) => {
                self.blend.alpha_to_coverage_enable = *enabled;
                self.dirty |= Dirty::BLEND;
            }
            NativeOp::SetAlphaToOneEnabled(enabled) => {
                if *enabled {
                    vks_warn!(SOURCE, "Alpha to one is not available, ignored");
                }
            }

            // ---- tessellation / input assembly
            NativeOp::SetPatchControlPoints(points) => self.patch_control_points = *points,
            // Strip cuts are always on for the maximum index value.
            NativeOp::SetPrimitiveRestartEnabled(_) => {}

            // ---- viewport / scissor
            NativeOp::SetViewportCount(count) => {
                self.viewport_count = (*count).min(MAX_VIEWPORTS as u32);
                self.dirty |= Dirty::VIEWPORTS;
            }
            NativeOp::SetViewport { index, viewport } => {
                if let Some(slot) = self.viewports.get_mut(*index as usize) {
                    *slot = conv::viewport(viewport);
                    self.dirty |= Dirty::VIEWPORTS;
                }
            }
            NativeOp::SetScissorCount(count) => {
                self.scissor_count = (*count).min(MAX_VIEWPORTS as u32);
                self.rasterizer.scissor_enable = *count > 0;
                self.dirty |= Dirty::SCISSORS | Dirty::RASTERIZER;
            }
            NativeOp::SetScissor { index, rect } => {
                if let Some(slot) = self.scissors.get_mut(*index as usize) {
                    *slot = conv::rect(rect);
                    self.dirty |= Dirty::SCISSORS;
                }
            }

            // ---- rasterization
            NativeOp::SetDepthClampEnabled(enabled) => {
                self.rasterizer.depth_clip_enable = !*enabled;
                self.dirty |= Dirty::RASTERIZER;
            }
            NativeOp::SetRasterizerDiscardEnabled(enabled) => {
                if *enabled {
                    vks_warn!(SOURCE, "Rasterizer discard is not available, ignored");
                }
            }
            NativeOp::SetPolygonMode(mode) => {
                self.rasterizer.fill_mode = conv::fill_mode(*mode);
                self.dirty |= Dirty::RASTERIZER;
            }
            NativeOp::SetCullMode(mode) => {
                self.rasterizer.cull_mode = conv::cull_mode(*mode).unwrap_or_else(|| {
                    vks_warn!(SOURCE, "Culling both faces is not available, culling disabled");
                    CullMode::None
                });
                self.dirty |= Dirty::RASTERIZER;
            }
            NativeOp::SetFrontFace(face) => {
                self.rasterizer.front_counter_clockwise = *face == FrontFace::CounterClockwise;
                self.dirty |= Dirty::RASTERIZER;
            }
            NativeOp::SetDepthBiasEnabled(enabled) => {
                self.depth_bias_enabled = *enabled;
                self.update_depth_bias();
            }
            NativeOp::SetDepthBias { constant_factor, clamp, slope_factor } => {
                self.depth_bias = (*constant_factor, *clamp, *slope_factor);
                self.update_depth_bias();
            }
            NativeOp::SetLineWidth(width) => {
                if *width != 1.0 {
                    vks_warn!(SOURCE, "Line width {} is not available, lines stay one pixel wide", width);
                }
            }

            // ---- program / geometry
            NativeOp::UseProgram(program) => {
                dc.set_program(*program);
                self.program = *program;
                self.dirty |= Dirty::INPUT_LAYOUT;
            }
            NativeOp::SetVertexLayout(layout) => {
                self.vertex_layout = layout.clone();
                self.dirty |= Dirty::INPUT_LAYOUT;
            }
            NativeOp::BindVertexBuffer { binding, buffer, offset, stride, .. } => {
                dc.ia_set_vertex_buffer(*binding, *buffer, *stride, to_u32(*offset));
            }
            NativeOp::BindIndexBuffer { buffer, offset, index_type } => {
                dc.ia_set_index_buffer(*buffer, conv::index_format(*index_type), to_u32(*offset));
            }

            // ---- framebuffer
            // sRGB conversion follows the view format.
            NativeOp::SetFramebufferSrgb(_) => {}
            NativeOp::BindFramebuffer { target, framebuffer } => self.bind_framebuffer(*target, *framebuffer),
            NativeOp::AttachImage { framebuffer, attachment } => {
                let attachment = *attachment;
                self.edit_framebuffer(*framebuffer, |set| {
                    // One depth-stencil view per output merger
                    if !attachment.point.is_color() {
                        set.attachments.retain(|point, _| point.is_color());
                    }
                    set.attachments.insert(attachment.point, attachment);
                });
            }
            NativeOp::DetachImage { framebuffer, point } => {
                self.edit_framebuffer(*framebuffer, |set| {
                    set.attachments.remove(point);
                });
            }
            NativeOp::SetDrawBuffers { framebuffer, points } => {
                self.edit_framebuffer(*framebuffer, |set| set.draw_buffers = points.clone());
            }
            NativeOp::SetReadBuffer { framebuffer, point } => {
                self.framebuffers.entry(*framebuffer).or_default().read_buffer = *point;
            }
            NativeOp::ClearColorAttachment { slot, value } => {
                self.apply_state(dc);
                self.clear_color_attachment(dc, *slot, value);
            }
            NativeOp::ClearDepthStencilAttachment { depth, stencil } => {
                self.apply_state(dc);
                self.clear_depth_stencil_attachment(dc, *depth, *stencil);
            }
            NativeOp::InvalidateAttachments { framebuffer, points } => {
                self.invalidate_attachments(dc, *framebuffer, points);
            }
            NativeOp::BlitFramebuffer { src_offsets, dst_offsets, mask, filter } => {
                self.blit_framebuffer(dc, *src_offsets, *dst_offsets, *mask, *filter);
            }

            // ---- descriptors / constants
            NativeOp::BindUniformBuffer { binding, buffer, offset, size } => {
                self.bind_uniform_buffer(dc, *binding, *buffer, *offset, *size);
            }
            NativeOp::BindStorageBuffer { binding, buffer, offset, size } => {
                self.bind_storage_buffer(dc, *binding, *buffer, *offset, *size);
            }
            NativeOp::BindTexture { unit, texture, format, base_level, level_count, sampler } => {
                let layers = dc.texture_desc(texture.handle).array_size;
                let desc = conv::shader_resource_view(texture, *format, *base_level, *level_count, layers);
                if let Some(view) = self.view(dc, ViewKey::ShaderResource(texture.handle, desc)) {
                    dc.set_shader_resource(*unit, view);
                }
                dc.set_sampler(*unit, sampler.unwrap_or(NativeHandle::NULL));
            }
            NativeOp::BindStorageImage { unit, texture, format, level, layer } => {
                let layers = match layer {
                    Some(_) => 1,
                    None => dc.texture_desc(texture.handle).array_size,
                };
                let mut desc = conv::level_view(texture, *level, layer.unwrap_or(0), layers);
                desc.format = conv::dxgi_format(*format);
                let key = ViewKey::UnorderedAccess(texture.handle, UnorderedAccessViewDesc::Texture(desc));
                if let Some(view) = self.view(dc, key) {
                    dc.set_unordered_access_view(*unit, view);
                }
            }
            NativeOp::PushConstants { offset, data, .. } => self.push_constants(dc, *offset, data),

            // ---- draw / dispatch
            NativeOp::Draw { topology, vertex_count, instance_count, first_vertex, first_instance } => {
                if self.prepare_draw(dc, *topology) {
                    dc.draw_instanced(*vertex_count, *instance_count, *first_vertex, *first_instance);
                }
            }
            NativeOp::DrawIndexed {
                topology,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
                ..
            } => {
                if self.prepare_draw(dc, *topology) {
                    dc.draw_indexed_instanced(*index_count, *instance_count, *first_index, *vertex_offset, *first_instance);
                }
            }
            NativeOp::DrawIndirect { topology, buffer, offset, draw_count, stride } => {
                if self.prepare_draw(dc, *topology) {
                    for draw in 0..*draw_count {
                        dc.draw_instanced_indirect(*buffer, to_u32(offset + draw as u64 * *stride as u64));
                    }
                }
            }
            NativeOp::DrawIndexedIndirect { topology, buffer, offset, draw_count, stride, .. } => {
                if self.prepare_draw(dc, *topology) {
                    for draw in 0..*draw_count {
                        dc.draw_indexed_instanced_indirect(*buffer, to_u32(offset + draw as u64 * *stride as u64));
                    }
                }
            }
            NativeOp::Dispatch { x, y, z } => dc.dispatch(*x, *y, *z),
            NativeOp::DispatchIndirect { buffer, offset } => dc.dispatch_indirect(*buffer, to_u32(*offset)),

            // ---- transfer
            NativeOp::CopyBuffer { src, dst, src_offset, dst_offset, size } => {
                let region = Box3 {
                    left: to_u32(*src_offset),
                    right: to_u32(src_offset + size),
                    bottom: 1,
                    back: 1,
                    ..Default::default()
                };
                dc.copy_subresource_region(*dst, 0, to_u32(*dst_offset), 0, 0, *src, 0, Some(&region));
            }
            NativeOp::CopyImageSubData { src, src_level, src_offset, dst, dst_level, dst_offset, extent } => {
                self.copy_image(dc, src, *src_level, *src_offset, dst, *dst_level, *dst_offset, *extent);
            }
            NativeOp::UploadImage { buffer, buffer_offset, row_length, image_height, texture, level, offset, extent } => {
                self.upload_image(dc, *buffer, *buffer_offset, *row_length, *image_height, texture, *level, *offset, *extent);
            }
            NativeOp::DownloadImage { texture, level, offset, extent, buffer, buffer_offset } => {
                self.download_image(dc, texture, *level, *offset, *extent, *buffer, *buffer_offset);
            }
            NativeOp::ClearTexImage { texture, level, base_layer, layer_count, value } => {
                self.clear_tex_image(dc, texture, *level, *base_layer, *layer_count, value);
            }
            // Hazards between commands are tracked by the driver.
            NativeOp::MemoryBarrier(_) => {}

            // ---- queries
            NativeOp::BeginQuery { query_type, query } => {
                if let Some(handle) = self.query_object(dc, *query, conv::query_kind(*query_type)) {
                    dc.begin(handle);
                }
            }
            NativeOp::EndQuery { query, .. } => {
                if let Some((handle, _)) = self.queries.get(query) {
                    dc.end(*handle);
                }
            }
            NativeOp::WriteTimestamp { query } => {
                if let Some(handle) = self.query_object(dc, *query, conv::query_kind(QueryType::Timestamp)) {
                    dc.end(handle);
                }
            }
            NativeOp::ResetQueries { pool, first, count } => self.reset_queries(dc, *pool, *first, *count),
        }
    }
}

/// Look up a state object, creating and caching it on a miss
fn cached<K: Eq + Hash>(
    cache: &mut FxHashMap<K, NativeHandle>,
    key: K,
    create: impl FnOnce(&K) -> Result<NativeHandle>,
    what: &str,
) -> Option<NativeHandle> {
    if let Some(object) = cache.get(&key) {
        return Some(*object);
    }
    match create(&key) {
        Ok(object) => {
            cache.insert(key, object);
            Some(object)
        }
        Err(error) => {
            vks_warn!(SOURCE, "Creating {} failed: {}", what, error);
            None
        }
    }
}

/// Input elements of a vertex layout; unfetchable attributes are left out
fn input_elements(layout: &VertexInputState) -> Vec<InputElementDesc> {
    layout
        .attributes
        .iter()
        .filter_map(|attribute| {
            let Some(format) = conv::vertex_format(attribute.format) else {
                vks_warn!(SOURCE, "Vertex format {:?} at location {} cannot be fetched", attribute.format, attribute.location);
                return None;
            };
            let per_instance = layout
                .binding(attribute.binding)
                .is_some_and(|binding| binding.input_rate == VertexInputRate::Instance);
            Some(InputElementDesc {
                semantic_name: "TEXCOORD",
                semantic_index: attribute.location,
                format,
                input_slot: attribute.binding,
                aligned_byte_offset: attribute.offset,
                input_slot_class: if per_instance {
                    InputClassification::PerInstanceData
                } else {
                    InputClassification::PerVertexData
                },
                instance_data_step_rate: u32::from(per_instance),
            })
        })
        .collect()
}

/// Subresource and z coordinate of one layer; volumes address depth slices by z
fn layer_address(texture: &TextureRef, level: u32, layer: u32, mip_levels: u32) -> (u32, u32) {
    if texture.target == TextureTarget::Texture3D {
        (conv::subresource(level, 0, mip_levels), layer)
    } else {
        (conv::subresource(level, layer, mip_levels), 0)
    }
}

fn slice_z(target: FboTarget) -> u32 {
    match target {
        FboTarget::Texture3DSlice(slice) => slice,
        _ => 0,
    }
}

/// D3D11 byte offsets are 32-bit
fn to_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Bytes addressable through a mapping
///
/// # Safety
///
/// The mapping must stay live, and unaliased by any other slice, while the
/// returned slice is used.
unsafe fn mapped_bytes<'a>(mapped: &MappedSubresource) -> &'a mut [u8] {
    if mapped.data.is_null() || mapped.len == 0 {
        return &mut [];
    }
    // SAFETY: guaranteed by the caller.
    unsafe { std::slice::from_raw_parts_mut(mapped.data, mapped.len) }
}

impl<C: DeviceContext> NativeBackend for D3d11Backend<C> {
    fn name(&self) -> &'static str {
        "d3d11"
    }

    fn capabilities(&self) -> BackendCaps {
        self.caps
    }

    fn limits(&self) -> BackendLimits {
        BackendLimits {
            max_viewports: MAX_VIEWPORTS as u32,
            max_color_attachments: MAX_RENDER_TARGETS as u32,
            max_vertex_bindings: 16,
            max_push_constant_size: PUSH_CONSTANT_SIZE,
        }
    }

    fn execute(&mut self, op: &NativeOp) {
        let context = Arc::clone(&self.context);
        let mut dc = lock(&context);
        self.execute_op(&mut dc, op);
    }

    fn flush(&mut self) {
        lock(&self.context).flush();
    }

    fn insert_fence(&mut self) -> FenceSignal {
        let mut dc = lock(&self.context);
        match dc.create_query(QueryKind::Event) {
            Ok(query) => {
                dc.end(query);
                dc.flush();
                drop(dc);
                FenceSignal::Pending(Box::new(D3d11Sync::new(Arc::clone(&self.context), query)))
            }
            Err(error) => {
                vks_warn!(SOURCE, "Event query creation failed: {}, treating the submit as complete", error);
                dc.flush();
                FenceSignal::Signaled
            }
        }
    }
}

impl<C: DeviceContext> Drop for D3d11Backend<C> {
    fn drop(&mut self) {
        let mut dc = lock(&self.context);
        let objects = self
            .blend_states
            .values()
            .chain(self.depth_stencil_states.values())
            .chain(self.rasterizer_states.values())
            .chain(self.input_layouts.values())
            .chain(self.views.values())
            .chain(self.host_storage.values())
            .copied()
            .chain(self.queries.values().map(|(handle, _)| *handle))
            .chain(std::iter::once(self.push_constant_buffer));
        for object in objects {
            dc.release(object);
        }
    }
}

#[cfg(test)]
#[path = "d3d11_backend_tests.rs"]
mod tests;
