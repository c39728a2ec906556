//! Recording stand-in for a D3D11 device and immediate context
//!
//! Every context method appends its name and Debug-formatted arguments to the
//! call log. Created objects get increasing handles starting at 1000, textures
//! answer `GetDesc` from a table, and mappable memory lives in plain vectors.
//! Shared by the unit tests and, through `#[path]`, by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use vkshim_core::resource::NativeHandle;
use vkshim_core::vkshim::{Error, Result};
use vkshim_renderer_d3d11::d3d11_types::*;
use vkshim_renderer_d3d11::DeviceContext;

macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        vec![$(format!("{:?}", $arg)),*]
    };
}

/// Render target view standing in for the swap chain back buffer
pub const BACK_BUFFER_VIEW: NativeHandle = NativeHandle(900);

/// Depth-stencil view of the swap chain
pub const BACK_BUFFER_DEPTH_VIEW: NativeHandle = NativeHandle(901);

/// One recorded context call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: &'static str,
    pub args: Vec<String>,
}

impl Call {
    pub fn arg(&self, index: usize) -> &str {
        &self.args[index]
    }
}

struct Memory {
    bytes: Vec<u8>,
    row_pitch: u32,
    depth_pitch: u32,
}

pub struct RecordingDevice {
    calls: Vec<Call>,
    next_handle: u64,
    feature_level: FeatureLevel,
    textures: HashMap<NativeHandle, TextureDesc>,
    memory: HashMap<(NativeHandle, u32), Memory>,
    query_data: HashMap<NativeHandle, Vec<u8>>,
    pending_polls: u32,
    failing: bool,
    released: Vec<NativeHandle>,
}

impl RecordingDevice {
    pub fn new(feature_level: FeatureLevel) -> Self {
        Self {
            calls: Vec::new(),
            next_handle: 1000,
            feature_level,
            textures: HashMap::new(),
            memory: HashMap::new(),
            query_data: HashMap::new(),
            pending_polls: 0,
            failing: false,
            released: Vec::new(),
        }
    }

    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    pub fn call_names(&mut self) -> Vec<&'static str> {
        self.take_calls().into_iter().map(|call| call.name).collect()
    }

    pub fn calls_to(&mut self, name: &str) -> Vec<Call> {
        self.take_calls().into_iter().filter(|call| call.name == name).collect()
    }

    pub fn set_texture_desc(&mut self, texture: NativeHandle, desc: TextureDesc) {
        self.textures.insert(texture, desc);
    }

    /// Back `subresource` of `resource` with mappable bytes
    pub fn set_memory(&mut self, resource: NativeHandle, subresource: u32, bytes: Vec<u8>, row_pitch: u32, depth_pitch: u32) {
        self.memory.insert((resource, subresource), Memory { bytes, row_pitch, depth_pitch });
    }

    pub fn memory(&self, resource: NativeHandle, subresource: u32) -> &[u8] {
        self.memory.get(&(resource, subresource)).map(|memory| memory.bytes.as_slice()).unwrap_or(&[])
    }

    /// Result bytes a ready query reports
    pub fn set_query_data(&mut self, query: NativeHandle, data: Vec<u8>) {
        self.query_data.insert(query, data);
    }

    /// Number of `GetData` polls answered `S_FALSE` before queries complete
    pub fn set_pending_polls(&mut self, polls: u32) {
        self.pending_polls = polls;
    }

    /// Make every object creation fail
    pub fn fail_creation(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn released(&self) -> &[NativeHandle] {
        &self.released
    }

    fn record(&mut self, name: &'static str, args: Vec<String>) {
        self.calls.push(Call { name, args });
    }

    fn create(&mut self, name: &'static str, args: Vec<String>) -> Result<NativeHandle> {
        self.record(name, args);
        if self.failing {
            return Err(Error::BackendError(format!("{} failed", name)));
        }
        let handle = NativeHandle(self.next_handle);
        self.next_handle += 1;
        Ok(handle)
    }
}

impl DeviceContext for RecordingDevice {
    fn feature_level(&self) -> FeatureLevel {
        self.feature_level
    }

    fn default_views(&self) -> DefaultViews {
        DefaultViews { render_target: Some(BACK_BUFFER_VIEW), depth_stencil: Some(BACK_BUFFER_DEPTH_VIEW) }
    }

    fn texture_desc(&self, texture: NativeHandle) -> TextureDesc {
        self.textures.get(&texture).copied().unwrap_or(TextureDesc { mip_levels: 1, array_size: 1 })
    }

    fn create_blend_state(&mut self, desc: &BlendDesc) -> Result<NativeHandle> {
        self.create("create_blend_state", args![desc])
    }

    fn create_depth_stencil_state(&mut self, desc: &DepthStencilDesc) -> Result<NativeHandle> {
        self.create("create_depth_stencil_state", args![desc])
    }

    fn create_rasterizer_state(&mut self, desc: &RasterizerDesc) -> Result<NativeHandle> {
        self.create("create_rasterizer_state", args![desc])
    }

    fn create_input_layout(&mut self, program: NativeHandle, elements: &[InputElementDesc]) -> Result<NativeHandle> {
        self.create("create_input_layout", args![program, elements])
    }

    fn create_render_target_view(&mut self, resource: NativeHandle, desc: &AttachmentViewDesc) -> Result<NativeHandle> {
        self.create("create_render_target_view", args![resource, desc])
    }

    fn create_depth_stencil_view(&mut self, resource: NativeHandle, desc: &AttachmentViewDesc) -> Result<NativeHandle> {
        self.create("create_depth_stencil_view", args![resource, desc])
    }

    fn create_shader_resource_view(&mut self, resource: NativeHandle, desc: &ShaderResourceViewDesc) -> Result<NativeHandle> {
        self.create("create_shader_resource_view", args![resource, desc])
    }

    fn create_unordered_access_view(&mut self, resource: NativeHandle, desc: &UnorderedAccessViewDesc) -> Result<NativeHandle> {
        self.create("create_unordered_access_view", args![resource, desc])
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<NativeHandle> {
        self.create("create_buffer", args![desc])
    }

    fn create_staging_texture(&mut self, texture: NativeHandle) -> Result<NativeHandle> {
        let staging = self.create("create_staging_texture", args![texture])?;
        let desc = self.texture_desc(texture);
        self.textures.insert(staging, desc);
        Ok(staging)
    }

    fn create_query(&mut self, kind: QueryKind) -> Result<NativeHandle> {
        self.create("create_query", args![kind])
    }

    fn release(&mut self, object: NativeHandle) {
        self.record("release", args![object]);
        self.released.push(object);
    }

    fn set_program(&mut self, program: NativeHandle) {
        self.record("set_program", args![program]);
    }

    fn ia_set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        self.record("ia_set_primitive_topology", args![topology]);
    }

    fn ia_set_input_layout(&mut self, layout: NativeHandle) {
        self.record("ia_set_input_layout", args![layout]);
    }

    fn ia_set_vertex_buffer(&mut self, slot: u32, buffer: NativeHandle, stride: u32, offset: u32) {
        self.record("ia_set_vertex_buffer", args![slot, buffer, stride, offset]);
    }

    fn ia_set_index_buffer(&mut self, buffer: NativeHandle, format: DxgiFormat, offset: u32) {
        self.record("ia_set_index_buffer", args![buffer, format, offset]);
    }

    fn rs_set_state(&mut self, state: NativeHandle) {
        self.record("rs_set_state", args![state]);
    }

    fn rs_set_viewports(&mut self, viewports: &[Viewport]) {
        self.record("rs_set_viewports", args![viewports]);
    }

    fn rs_set_scissor_rects(&mut self, rects: &[Rect]) {
        self.record("rs_set_scissor_rects", args![rects]);
    }

    fn om_set_blend_state(&mut self, state: NativeHandle, blend_factor: [f32; 4], sample_mask: u32) {
        self.record("om_set_blend_state", args![state, blend_factor, sample_mask]);
    }

    fn om_set_depth_stencil_state(&mut self, state: NativeHandle, stencil_ref: u32) {
        self.record("om_set_depth_stencil_state", args![state, stencil_ref]);
    }

    fn om_set_render_targets(&mut self, render_targets: &[Option<NativeHandle>], depth_stencil: Option<NativeHandle>) {
        self.record("om_set_render_targets", args![render_targets, depth_stencil]);
    }

    fn set_constant_buffer(&mut self, slot: u32, buffer: NativeHandle, first_constant: u32, num_constants: u32) {
        self.record("set_constant_buffer", args![slot, buffer, first_constant, num_constants]);
    }

    fn set_shader_resource(&mut self, slot: u32, view: NativeHandle) {
        self.record("set_shader_resource", args![slot, view]);
    }

    fn set_sampler(&mut self, slot: u32, sampler: NativeHandle) {
        self.record("set_sampler", args![slot, sampler]);
    }

    fn set_unordered_access_view(&mut self, slot: u32, view: NativeHandle) {
        self.record("set_unordered_access_view", args![slot, view]);
    }

    fn clear_render_target_view(&mut self, view: NativeHandle, color: [f32; 4]) {
        self.record("clear_render_target_view", args![view, color]);
    }

    fn clear_depth_stencil_view(&mut self, view: NativeHandle, flags: ClearFlags, depth: f32, stencil: u8) {
        self.record("clear_depth_stencil_view", args![view, flags, depth, stencil]);
    }

    fn clear_view(&mut self, view: NativeHandle, color: [f32; 4], rects: &[Rect]) {
        self.record("clear_view", args![view, color, rects]);
    }

    fn discard_view(&mut self, view: NativeHandle) {
        self.record("discard_view", args![view]);
    }

    fn draw_instanced(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        self.record("draw_instanced", args![vertex_count, instance_count, first_vertex, first_instance]);
    }

    fn draw_indexed_instanced(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    ) {
        self.record(
            "draw_indexed_instanced",
            args![index_count, instance_count, first_index, base_vertex, first_instance],
        );
    }

    fn draw_instanced_indirect(&mut self, buffer: NativeHandle, offset: u32) {
        self.record("draw_instanced_indirect", args![buffer, offset]);
    }

    fn draw_indexed_instanced_indirect(&mut self, buffer: NativeHandle, offset: u32) {
        self.record("draw_indexed_instanced_indirect", args![buffer, offset]);
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.record("dispatch", args![x, y, z]);
    }

    fn dispatch_indirect(&mut self, buffer: NativeHandle, offset: u32) {
        self.record("dispatch_indirect", args![buffer, offset]);
    }

    fn copy_subresource_region(
        &mut self,
        dst: NativeHandle,
        dst_subresource: u32,
        dst_x: u32,
        dst_y: u32,
        dst_z: u32,
        src: NativeHandle,
        src_subresource: u32,
        src_box: Option<&Box3>,
    ) {
        self.record(
            "copy_subresource_region",
            args![dst, dst_subresource, dst_x, dst_y, dst_z, src, src_subresource, src_box],
        );
    }

    fn resolve_subresource(
        &mut self,
        dst: NativeHandle,
        dst_subresource: u32,
        src: NativeHandle,
        src_subresource: u32,
        format: DxgiFormat,
    ) {
        self.record("resolve_subresource", args![dst, dst_subresource, src, src_subresource, format]);
    }

    /// Whole-subresource updates also land in the subresource's memory
    fn update_subresource(
        &mut self,
        dst: NativeHandle,
        dst_subresource: u32,
        dst_box: Option<&Box3>,
        data: &[u8],
        row_pitch: u32,
        depth_pitch: u32,
    ) {
        self.record(
            "update_subresource",
            args![dst, dst_subresource, dst_box, data.len(), row_pitch, depth_pitch],
        );
        if dst_box.is_none() {
            self.set_memory(dst, dst_subresource, data.to_vec(), row_pitch, depth_pitch);
        }
    }

    fn generate_mips(&mut self, view: NativeHandle) {
        self.record("generate_mips", args![view]);
    }

    fn map(&mut self, resource: NativeHandle, subresource: u32, map_type: MapType) -> Result<MappedSubresource> {
        self.record("map", args![resource, subresource, map_type]);
        let memory = self
            .memory
            .get_mut(&(resource, subresource))
            .ok_or_else(|| Error::InvalidState(format!("{:?} has no mappable memory", resource)))?;
        Ok(MappedSubresource {
            data: memory.bytes.as_mut_ptr(),
            len: memory.bytes.len(),
            row_pitch: memory.row_pitch,
            depth_pitch: memory.depth_pitch,
        })
    }

    fn unmap(&mut self, resource: NativeHandle, subresource: u32) {
        self.record("unmap", args![resource, subresource]);
    }

    fn begin(&mut self, query: NativeHandle) {
        self.record("begin", args![query]);
    }

    fn end(&mut self, query: NativeHandle) {
        self.record("end", args![query]);
    }

    /// Queries without configured data report a signaled event
    fn get_data(&mut self, query: NativeHandle, data: &mut [u8]) -> QueryData {
        self.record("get_data", args![query, data.len()]);
        if self.pending_polls > 0 {
            self.pending_polls -= 1;
            return QueryData::NotReady;
        }
        let result = self.query_data.get(&query).cloned().unwrap_or_else(|| 1i32.to_ne_bytes().to_vec());
        let count = result.len().min(data.len());
        data[..count].copy_from_slice(&result[..count]);
        QueryData::Ready
    }

    fn flush(&mut self) {
        self.record("flush", args![]);
    }
}
