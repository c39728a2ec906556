/// Seam to the Direct3D 11 device and immediate context
///
/// The backend never touches COM directly. An implementation forwards each
/// method to the matching `ID3D11Device` or `ID3D11DeviceContext1` call;
/// handles are interface pointers (or any other identity the implementation
/// chooses). Objects created here are owned by the backend and handed back
/// through [`DeviceContext::release`].

use vkshim_core::resource::NativeHandle;
use vkshim_core::vkshim::Result;
use crate::d3d11_types::*;

pub trait DeviceContext: Send + 'static {
    fn feature_level(&self) -> FeatureLevel;

    /// Swap chain views used while the default framebuffer is bound
    fn default_views(&self) -> DefaultViews;

    /// Mip and array counts of a texture (`GetDesc`)
    fn texture_desc(&self, texture: NativeHandle) -> TextureDesc;

    // ===== OBJECT CREATION =====

    fn create_blend_state(&mut self, desc: &BlendDesc) -> Result<NativeHandle>;
    fn create_depth_stencil_state(&mut self, desc: &DepthStencilDesc) -> Result<NativeHandle>;
    fn create_rasterizer_state(&mut self, desc: &RasterizerDesc) -> Result<NativeHandle>;

    /// Input layout validated against the vertex shader of `program`
    fn create_input_layout(&mut self, program: NativeHandle, elements: &[InputElementDesc]) -> Result<NativeHandle>;

    fn create_render_target_view(&mut self, resource: NativeHandle, desc: &AttachmentViewDesc) -> Result<NativeHandle>;
    fn create_depth_stencil_view(&mut self, resource: NativeHandle, desc: &AttachmentViewDesc) -> Result<NativeHandle>;
    fn create_shader_resource_view(
        &mut self,
        resource: NativeHandle,
        desc: &ShaderResourceViewDesc,
    ) -> Result<NativeHandle>;
    fn create_unordered_access_view(
        &mut self,
        resource: NativeHandle,
        desc: &UnorderedAccessViewDesc,
    ) -> Result<NativeHandle>;

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<NativeHandle>;

    /// CPU-readable staging texture with the description of `texture`
    fn create_staging_texture(&mut self, texture: NativeHandle) -> Result<NativeHandle>;

    fn create_query(&mut self, kind: QueryKind) -> Result<NativeHandle>;

    fn release(&mut self, object: NativeHandle);

    // ===== PIPELINE =====

    /// Bind the shader stages of a linked program (`VSSetShader`, `PSSetShader`, ...)
    fn set_program(&mut self, program: NativeHandle);

    fn ia_set_primitive_topology(&mut self, topology: PrimitiveTopology);
    /// `NULL` when `layout` is [`NativeHandle::NULL`]
    fn ia_set_input_layout(&mut self, layout: NativeHandle);
    fn ia_set_vertex_buffer(&mut self, slot: u32, buffer: NativeHandle, stride: u32, offset: u32);
    fn ia_set_index_buffer(&mut self, buffer: NativeHandle, format: DxgiFormat, offset: u32);

    fn rs_set_state(&mut self, state: NativeHandle);
    fn rs_set_viewports(&mut self, viewports: &[Viewport]);
    fn rs_set_scissor_rects(&mut self, rects: &[Rect]);

    fn om_set_blend_state(&mut self, state: NativeHandle, blend_factor: [f32; 4], sample_mask: u32);
    fn om_set_depth_stencil_state(&mut self, state: NativeHandle, stencil_ref: u32);
    fn om_set_render_targets(&mut self, render_targets: &[Option<NativeHandle>], depth_stencil: Option<NativeHandle>);

    // ===== RESOURCE BINDING =====
    //
    // Slots are shared by every shader stage.

    /// Constant buffer range in 16-byte constants (`*SetConstantBuffers1`)
    fn set_constant_buffer(&mut self, slot: u32, buffer: NativeHandle, first_constant: u32, num_constants: u32);
    fn set_shader_resource(&mut self, slot: u32, view: NativeHandle);
    fn set_sampler(&mut self, slot: u32, sampler: NativeHandle);
    fn set_unordered_access_view(&mut self, slot: u32, view: NativeHandle);

    // ===== CLEARS =====

    fn clear_render_target_view(&mut self, view: NativeHandle, color: [f32; 4]);
    fn clear_depth_stencil_view(&mut self, view: NativeHandle, flags: ClearFlags, depth: f32, stencil: u8);
    /// `ClearView` restricted to `rects` (Direct3D 11.1)
    fn clear_view(&mut self, view: NativeHandle, color: [f32; 4], rects: &[Rect]);
    /// `DiscardView` (Direct3D 11.1)
    fn discard_view(&mut self, view: NativeHandle);

    // ===== DRAW / DISPATCH =====

    fn draw_instanced(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32);
    fn draw_indexed_instanced(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    );
    fn draw_instanced_indirect(&mut self, buffer: NativeHandle, offset: u32);
    fn draw_indexed_instanced_indirect(&mut self, buffer: NativeHandle, offset: u32);
    fn dispatch(&mut self, x: u32, y: u32, z: u32);
    fn dispatch_indirect(&mut self, buffer: NativeHandle, offset: u32);

    // ===== TRANSFER =====

    #[allow(clippy::too_many_arguments)]
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
    );
    fn resolve_subresource(
        &mut self,
        dst: NativeHandle,
        dst_subresource: u32,
        src: NativeHandle,
        src_subresource: u32,
        format: DxgiFormat,
    );
    fn update_subresource(
        &mut self,
        dst: NativeHandle,
        dst_subresource: u32,
        dst_box: Option<&Box3>,
        data: &[u8],
        row_pitch: u32,
        depth_pitch: u32,
    );
    fn generate_mips(&mut self, view: NativeHandle);

    fn map(&mut self, resource: NativeHandle, subresource: u32, map_type: MapType) -> Result<MappedSubresource>;
    fn unmap(&mut self, resource: NativeHandle, subresource: u32);

    // ===== QUERIES =====

    fn begin(&mut self, query: NativeHandle);
    fn end(&mut self, query: NativeHandle);
    /// Poll a query without flushing; `data` receives the result when ready
    fn get_data(&mut self, query: NativeHandle, data: &mut [u8]) -> QueryData;

    fn flush(&mut self);
}
