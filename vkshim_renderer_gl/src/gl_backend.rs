/// OpenGL implementation of [`NativeBackend`]
///
/// Executes each [`NativeOp`] as one or a few GL calls. Redundant state has
/// already been filtered by the context state stack; the backend only keeps
/// what GL needs and the op stream does not carry:
///
/// - names of the emulation objects it creates lazily (framebuffer objects,
///   queries, host storage pixel buffers, the push constant buffer)
/// - the current framebuffer bindings, so attachments can be edited without
///   disturbing them
/// - the bound index buffer offset and type, consumed by indexed draws
///
/// All calls require the owning context to be current, which
/// [`ContextLock`](vkshim_core::vkshim::ContextLock) guarantees during replay.

use std::ffi::c_void;
use rustc_hash::FxHashMap;
use vkshim_core::backend::{
    AttachmentPoint, BackendCaps, BackendLimits, FboAttachment, FboTarget, FenceSignal, FramebufferObject,
    FramebufferTarget, NativeBackend, NativeOp, QuerySlot, TextureRef, TextureTarget,
};
use vkshim_core::command::ClearColorValue;
use vkshim_core::glam::{IVec3, UVec3};
use vkshim_core::resource::{
    ColorComponentFlags, Format, ImageAspectFlags, IndexType, NativeHandle, ObjectId, VertexInputRate,
    VertexInputState, Viewport,
};
use vkshim_core::vkshim::{Error, Result};
use vkshim_core::{vks_debug, vks_info, vks_warn};
use crate::gl_conversions as conv;
use crate::gl_debug::{check_errors, gl, gl_opt, CapabilityReport};
use crate::gl_functions::GlFunctions;
use crate::gl_sync::GlSync;
use crate::gl_types::*;

const SOURCE: &str = "vkshim::gl";

/// Texture unit used for uploads and downloads; never handed to shaders
pub const SCRATCH_TEXTURE_UNIT: GLuint = 47;

/// Size of the uniform buffer emulating push constants
pub const PUSH_CONSTANT_SIZE: u32 = 128;

/// How an op needs its framebuffer bound
#[derive(Clone, Copy, PartialEq, Eq)]
enum Binding {
    Any,
    Draw,
    Read,
}

/// Pixel buffer holding the host-visible copy of an image
#[derive(Debug, Clone, Copy)]
struct HostStorage {
    buffer: GLuint,
    size: u64,
}

pub struct GlBackend {
    gl: GlFunctions,
    caps: BackendCaps,
    limits: BackendLimits,
    vertex_array: GLuint,
    framebuffers: FxHashMap<FramebufferObject, GLuint>,
    queries: FxHashMap<QuerySlot, GLuint>,
    host_storage: FxHashMap<ObjectId, HostStorage>,
    push_constant_buffer: GLuint,
    push_constant_binding: GLuint,
    bound_draw: FramebufferObject,
    bound_read: FramebufferObject,
    index_buffer_offset: u64,
    index_type: IndexType,
    primitive_restart: bool,
    enabled_attributes: Vec<GLuint>,
}

impl GlBackend {
    /// Resolve the entry points through `resolver` and create the backend
    pub fn load<F>(resolver: F) -> Result<Self>
    where
        F: FnMut(&str) -> *const c_void,
    {
        Self::new(GlFunctions::load(resolver)?)
    }

    /// Create the backend on the current context
    ///
    /// Binds the backend's vertex array object, queries the limits and brings
    /// the GL state in line with the deactivated context state.
    pub fn new(gl: GlFunctions) -> Result<Self> {
        let caps = gl.capabilities();
        let defaults = BackendLimits::default();
        let positive_or = |value: GLint, fallback: u32| if value > 0 { value as u32 } else { fallback };

        let limits = BackendLimits {
            max_viewports: if caps.contains(BackendCaps::VIEWPORT_ARRAY) {
                positive_or(gl.integer(GL_MAX_VIEWPORTS), 1).min(defaults.max_viewports)
            } else {
                1
            },
            max_color_attachments: positive_or(gl.integer(GL_MAX_COLOR_ATTACHMENTS), defaults.max_color_attachments)
                .min(defaults.max_color_attachments),
            max_vertex_bindings: positive_or(gl.integer(GL_MAX_VERTEX_ATTRIB_BINDINGS), defaults.max_vertex_bindings)
                .min(defaults.max_vertex_bindings),
            max_push_constant_size: PUSH_CONSTANT_SIZE,
        };

        let uniform_bindings = gl.integer(GL_MAX_UNIFORM_BUFFER_BINDINGS);
        if uniform_bindings <= 0 {
            return Err(Error::InitializationFailed(
                "GL reports no uniform buffer binding points".to_string(),
            ));
        }
        let push_constant_binding = (uniform_bindings - 1) as GLuint;

        let mut vertex_array: GLuint = 0;
        gl!(gl => gen_vertex_arrays(1, &mut vertex_array));
        gl!(gl => bind_vertex_array(vertex_array));

        let mut push_constant_buffer: GLuint = 0;
        gl!(gl => gen_buffers(1, &mut push_constant_buffer));
        gl!(gl => bind_buffer(GL_UNIFORM_BUFFER, push_constant_buffer));
        gl!(gl => buffer_data(GL_UNIFORM_BUFFER, PUSH_CONSTANT_SIZE as GLsizeiptr, std::ptr::null(), GL_DYNAMIC_DRAW));
        gl!(gl => bind_buffer(GL_UNIFORM_BUFFER, 0));

        // GL starts with multisampling on; the deactivated state has it off.
        gl!(gl => disable(GL_MULTISAMPLE));

        if check_errors(&gl, "backend initialization") > 0 {
            return Err(Error::InitializationFailed("GL errors during backend initialization".to_string()));
        }

        vks_info!(
            SOURCE,
            "GL backend on {} ({}), {} of {} optional features",
            gl.string(GL_RENDERER),
            gl.string(GL_VERSION),
            caps.iter().count(),
            BackendCaps::all().iter().count()
        );

        Ok(Self {
            gl,
            caps,
            limits,
            vertex_array,
            framebuffers: FxHashMap::default(),
            queries: FxHashMap::default(),
            host_storage: FxHashMap::default(),
            push_constant_buffer,
            push_constant_binding,
            bound_draw: FramebufferObject::Default,
            bound_read: FramebufferObject::Default,
            index_buffer_offset: 0,
            index_type: IndexType::U16,
            primitive_restart: false,
            enabled_attributes: Vec::new(),
        })
    }

    pub fn functions(&self) -> &GlFunctions {
        &self.gl
    }

    /// Driver strings, features and limits
    pub fn report(&self) -> CapabilityReport {
        CapabilityReport::collect(&self.gl, self.limits)
    }

    /// Uniform buffer binding reserved for push constants
    ///
    /// Shaders declare their push constant block at this binding.
    pub fn push_constant_binding(&self) -> GLuint {
        self.push_constant_binding
    }

    /// GL name of a framebuffer object, if it was created
    pub fn framebuffer_name(&self, framebuffer: FramebufferObject) -> Option<GLuint> {
        match framebuffer {
            FramebufferObject::Default => Some(0),
            _ => self.framebuffers.get(&framebuffer).copied(),
        }
    }

    /// GL query object of a pool slot, if it was used since its last reset
    pub fn query_name(&self, query: QuerySlot) -> Option<GLuint> {
        self.queries.get(&query).copied()
    }

    /// Pixel buffer holding the last download of a host-visible image
    pub fn host_storage(&self, image: ObjectId) -> Option<GLuint> {
        self.host_storage.get(&image).map(|storage| storage.buffer)
    }

    /// Delete the framebuffer object emulating `framebuffer`
    ///
    /// Called when the vkshim framebuffer is destroyed.
    pub fn release_framebuffer(&mut self, framebuffer: ObjectId) {
        let key = FramebufferObject::Framebuffer(framebuffer);
        if let Some(name) = self.framebuffers.remove(&key) {
            gl!(self.gl => delete_framebuffers(1, &name));
            if self.bound_draw == key {
                self.bound_draw = FramebufferObject::Default;
            }
            if self.bound_read == key {
                self.bound_read = FramebufferObject::Default;
            }
        }
    }

    /// Delete the host storage of a destroyed image
    pub fn release_host_storage(&mut self, image: ObjectId) {
        if let Some(storage) = self.host_storage.remove(&image) {
            gl!(self.gl => delete_buffers(1, &storage.buffer));
        }
    }

    // ===== OBJECT NAMES =====

    fn framebuffer_object(&mut self, framebuffer: FramebufferObject) -> GLuint {
        if framebuffer == FramebufferObject::Default {
            return 0;
        }
        if let Some(name) = self.framebuffers.get(&framebuffer) {
            return *name;
        }
        let mut name: GLuint = 0;
        gl!(self.gl => gen_framebuffers(1, &mut name));
        vks_debug!(SOURCE, "Created framebuffer object {} for {:?}", name, framebuffer);
        self.framebuffers.insert(framebuffer, name);
        name
    }

    fn query_object(&mut self, query: QuerySlot) -> GLuint {
        if let Some(name) = self.queries.get(&query) {
            return *name;
        }
        let mut name: GLuint = 0;
        gl!(self.gl => gen_queries(1, &mut name));
        self.queries.insert(query, name);
        name
    }

    fn host_storage_buffer(&mut self, image: ObjectId, size: u64) -> GLuint {
        let storage = match self.host_storage.get(&image) {
            Some(storage) if storage.size >= size => return storage.buffer,
            Some(storage) => HostStorage { buffer: storage.buffer, size },
            None => {
                let mut buffer: GLuint = 0;
                gl!(self.gl => gen_buffers(1, &mut buffer));
                HostStorage { buffer, size }
            }
        };
        gl!(self.gl => bind_buffer(GL_PIXEL_PACK_BUFFER, storage.buffer));
        gl!(self.gl => buffer_data(GL_PIXEL_PACK_BUFFER, size as GLsizeiptr, std::ptr::null(), GL_STREAM_READ));
        self.host_storage.insert(image, storage);
        storage.buffer
    }

    // ===== FRAMEBUFFERS =====

    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: FramebufferObject) {
        let name = self.framebuffer_object(framebuffer);
        let gl_target = match target {
            FramebufferTarget::Draw => GL_DRAW_FRAMEBUFFER,
            FramebufferTarget::Read => GL_READ_FRAMEBUFFER,
            FramebufferTarget::Both => GL_FRAMEBUFFER,
        };
        gl!(self.gl => bind_framebuffer(gl_target, name));
        if target != FramebufferTarget::Read {
            self.bound_draw = framebuffer;
        }
        if target != FramebufferTarget::Draw {
            self.bound_read = framebuffer;
        }
    }

    /// Run `apply` with `framebuffer` bound as required, restoring the previous
    /// binding afterwards if it had to be changed
    fn with_framebuffer(&mut self, framebuffer: FramebufferObject, binding: Binding, apply: impl FnOnce(&GlFunctions, GLenum)) {
        let draw_bound = self.bound_draw == framebuffer && binding != Binding::Read;
        let read_bound = self.bound_read == framebuffer && binding != Binding::Draw;
        if draw_bound {
            apply(&self.gl, GL_DRAW_FRAMEBUFFER);
            return;
        }
        if read_bound {
            apply(&self.gl, GL_READ_FRAMEBUFFER);
            return;
        }

        let (target, previous) = match binding {
            Binding::Read => (GL_READ_FRAMEBUFFER, self.bound_read),
            Binding::Any | Binding::Draw => (GL_DRAW_FRAMEBUFFER, self.bound_draw),
        };
        let name = self.framebuffer_object(framebuffer);
        let previous_name = self.framebuffer_object(previous);
        gl!(self.gl => bind_framebuffer(target, name));
        apply(&self.gl, target);
        gl!(self.gl => bind_framebuffer(target, previous_name));
    }

    fn attach_image(&mut self, framebuffer: FramebufferObject, attachment: FboAttachment) {
        let texture = attachment.texture.handle.0 as GLuint;
        let level = attachment.mip_level as GLint;
        let point = conv::attachment_point(attachment.point);
        self.with_framebuffer(framebuffer, Binding::Any, |gl_functions, target| match attachment.target {
            FboTarget::Texture1D => {
                gl!(gl_functions => framebuffer_texture_1d(target, point, GL_TEXTURE_1D, texture, level));
            }
            FboTarget::Texture2D => {
                gl!(gl_functions => framebuffer_texture_2d(target, point, GL_TEXTURE_2D, texture, level));
            }
            FboTarget::Texture2DMultisample => {
                gl!(gl_functions => framebuffer_texture_2d(target, point, GL_TEXTURE_2D_MULTISAMPLE, texture, 0));
            }
            FboTarget::CubeFace(face) => {
                let face_target = GL_TEXTURE_CUBE_MAP_POSITIVE_X + face;
                gl!(gl_functions => framebuffer_texture_2d(target, point, face_target, texture, level));
            }
            FboTarget::ArrayLayer(layer) | FboTarget::Texture3DSlice(layer) => {
                gl!(gl_functions => framebuffer_texture_layer(target, point, texture, level, layer as GLint));
            }
            FboTarget::MultisampleArrayLayer(layer) => {
                gl!(gl_functions => framebuffer_texture_layer(target, point, texture, 0, layer as GLint));
            }
        });
    }

    fn detach_image(&mut self, framebuffer: FramebufferObject, point: AttachmentPoint) {
        let point = conv::attachment_point(point);
        self.with_framebuffer(framebuffer, Binding::Any, |gl_functions, target| {
            gl!(gl_functions => framebuffer_texture_2d(target, point, GL_TEXTURE_2D, 0, 0));
        });
    }

    fn set_draw_buffers(&mut self, framebuffer: FramebufferObject, points: &[AttachmentPoint]) {
        let buffers: Vec<GLenum> = if framebuffer == FramebufferObject::Default {
            points.iter().map(|point| conv::default_draw_buffer(*point)).collect()
        } else {
            // Draw buffer k feeds fragment output k; unused outputs stay GL_NONE.
            let slots = points
                .iter()
                .filter_map(|point| match point {
                    AttachmentPoint::Color(index) => Some(*index + 1),
                    _ => None,
                })
                .max()
                .unwrap_or(0);
            let mut buffers = vec![GL_NONE; slots as usize];
            for point in points {
                if let AttachmentPoint::Color(index) = point {
                    buffers[*index as usize] = conv::attachment_point(*point);
                }
            }
            buffers
        };
        let buffers = if buffers.is_empty() { vec![GL_NONE] } else { buffers };
        self.with_framebuffer(framebuffer, Binding::Draw, |gl_functions, _| {
            gl!(gl_functions => draw_buffers(buffers.len() as GLsizei, buffers.as_ptr()));
        });
    }

    fn set_read_buffer(&mut self, framebuffer: FramebufferObject, point: AttachmentPoint) {
        let buffer = match framebuffer {
            FramebufferObject::Default => conv::default_draw_buffer(point),
            _ if point.is_color() => conv::attachment_point(point),
            _ => GL_NONE,
        };
        self.with_framebuffer(framebuffer, Binding::Read, |gl_functions, _| {
            gl!(gl_functions => read_buffer(buffer));
        });
    }

    fn invalidate_attachments(&mut self, framebuffer: FramebufferObject, points: &[AttachmentPoint]) {
        if !self.caps.contains(BackendCaps::INVALIDATE_FRAMEBUFFER) {
            return;
        }
        let attachments: Vec<GLenum> = if framebuffer == FramebufferObject::Default {
            points.iter().map(|point| conv::default_invalidate_buffer(*point)).collect()
        } else {
            points.iter().map(|point| conv::attachment_point(*point)).collect()
        };
        self.with_framebuffer(framebuffer, Binding::Draw, |gl_functions, target| {
            gl_opt!(gl_functions => invalidate_framebuffer(target, attachments.len() as GLsizei, attachments.as_ptr()));
        });
    }

    fn clear_color_attachment(&self, slot: u32, value: &ClearColorValue) {
        let slot = slot as GLint;
        match value {
            ClearColorValue::Float32(color) => gl!(self.gl => clear_bufferfv(GL_COLOR, slot, color.as_ptr())),
            ClearColorValue::Int32(color) => gl!(self.gl => clear_bufferiv(GL_COLOR, slot, color.as_ptr())),
            ClearColorValue::Uint32(color) => gl!(self.gl => clear_bufferuiv(GL_COLOR, slot, color.as_ptr())),
        }
    }

    fn clear_depth_stencil_attachment(&self, depth: Option<f32>, stencil: Option<u32>) {
        match (depth, stencil) {
            (Some(depth), Some(stencil)) => {
                gl!(self.gl => clear_bufferfi(GL_DEPTH_STENCIL, 0, depth, stencil as GLint));
            }
            (Some(depth), None) => gl!(self.gl => clear_bufferfv(GL_DEPTH, 0, &depth)),
            (None, Some(stencil)) => {
                let stencil = stencil as GLint;
                gl!(self.gl => clear_bufferiv(GL_STENCIL, 0, &stencil));
            }
            (None, None) => {}
        }
    }

    fn blit_framebuffer(&self, src: [IVec3; 2], dst: [IVec3; 2], mask: ImageAspectFlags, filter: vkshim_core::command::Filter) {
        // Depth and stencil blits only allow nearest filtering.
        let filter = if mask.intersects(ImageAspectFlags::DEPTH | ImageAspectFlags::STENCIL) {
            GL_NEAREST
        } else {
            conv::filter(filter)
        };
        gl!(self.gl => blit_framebuffer(
            src[0].x, src[0].y, src[1].x, src[1].y,
            dst[0].x, dst[0].y, dst[1].x, dst[1].y,
            conv::blit_mask(mask),
            filter,
        ));
    }

    // ===== BLEND =====

    /// Per-attachment calls go through the indexed entry points when present;
    /// otherwise only attachment 0 is applied, to every draw buffer.
    fn indexed(&self, attachment: u32) -> Option<bool> {
        if self.caps.contains(BackendCaps::INDEXED_BLEND) {
            Some(true)
        } else if attachment == 0 {
            Some(false)
        } else {
            None
        }
    }

    fn set_blend_enabled(&self, attachment: u32, enabled: bool) {
        match (self.indexed(attachment), enabled) {
            (Some(true), true) => {
                gl_opt!(self.gl => enablei(GL_BLEND, attachment));
            }
            (Some(true), false) => {
                gl_opt!(self.gl => disablei(GL_BLEND, attachment));
            }
            (Some(false), true) => gl!(self.gl => enable(GL_BLEND)),
            (Some(false), false) => gl!(self.gl => disable(GL_BLEND)),
            (None, _) => {}
        }
    }

    fn set_color_write_mask(&self, attachment: u32, mask: ColorComponentFlags) {
        let channel = |flag| if mask.contains(flag) { GL_TRUE } else { GL_FALSE };
        let (r, g, b, a) = (
            channel(ColorComponentFlags::R),
            channel(ColorComponentFlags::G),
            channel(ColorComponentFlags::B),
            channel(ColorComponentFlags::A),
        );
        match self.indexed(attachment) {
            Some(true) => {
                gl_opt!(self.gl => color_maski(attachment, r, g, b, a));
            }
            Some(false) => gl!(self.gl => color_mask(r, g, b, a)),
            None => {}
        }
    }

    // ===== VIEWPORT / SCISSOR =====

    fn set_viewport(&self, index: u32, viewport: &Viewport) {
        if self.caps.contains(BackendCaps::VIEWPORT_ARRAY) {
            gl_opt!(self.gl => viewport_indexedf(index, viewport.x, viewport.y, viewport.width, viewport.height));
            gl_opt!(self.gl => depth_range_indexed(index, viewport.min_depth as GLdouble, viewport.max_depth as GLdouble));
        } else if index == 0 {
            gl!(self.gl => viewport(
                viewport.x as GLint,
                viewport.y as GLint,
                viewport.width as GLsizei,
                viewport.height as GLsizei,
            ));
            gl!(self.gl => depth_range(viewport.min_depth as GLdouble, viewport.max_depth as GLdouble));
        }
    }

    fn set_scissor(&self, index: u32, rect: &vkshim_core::resource::Rect2D) {
        let (width, height) = (rect.width as GLsizei, rect.height as GLsizei);
        if self.caps.contains(BackendCaps::VIEWPORT_ARRAY) {
            gl_opt!(self.gl => scissor_indexed(index, rect.x, rect.y, width, height));
        } else if index == 0 {
            gl!(self.gl => scissor(rect.x, rect.y, width, height));
        }
    }

    // ===== GEOMETRY =====

    fn set_vertex_layout(&mut self, layout: &VertexInputState) {
        let locations: Vec<GLuint> = layout.attributes.iter().map(|attribute| attribute.location).collect();
        for location in &self.enabled_attributes {
            if !locations.contains(location) {
                gl!(self.gl => disable_vertex_attrib_array(*location));
            }
        }

        let mut enabled = Vec::with_capacity(layout.attributes.len());
        for attribute in &layout.attributes {
            let Some(format) = conv::vertex_attrib_format(attribute.format) else {
                vks_warn!(SOURCE, "Vertex format {:?} at location {} cannot be fetched", attribute.format, attribute.location);
                continue;
            };
            if format.integer {
                gl!(self.gl => vertex_attrib_i_format(attribute.location, format.size, format.data_type, attribute.offset));
            } else {
                let normalized = if format.normalized { GL_TRUE } else { GL_FALSE };
                gl!(self.gl => vertex_attrib_format(attribute.location, format.size, format.data_type, normalized, attribute.offset));
            }
            gl!(self.gl => vertex_attrib_binding(attribute.location, attribute.binding));
            if !self.enabled_attributes.contains(&attribute.location) {
                gl!(self.gl => enable_vertex_attrib_array(attribute.location));
            }
            enabled.push(attribute.location);
        }
        for binding in &layout.bindings {
            let divisor = match binding.input_rate {
                VertexInputRate::Vertex => 0,
                VertexInputRate::Instance => 1,
            };
            gl!(self.gl => vertex_binding_divisor(binding.binding, divisor));
        }
        self.enabled_attributes = enabled;
    }

    fn restart_index(&self) -> GLuint {
        match self.index_type {
            IndexType::U16 => 0xFFFF,
            IndexType::U32 => 0xFFFF_FFFF,
        }
    }

    fn bind_index_buffer(&mut self, buffer: NativeHandle, offset: u64, index_type: IndexType) {
        gl!(self.gl => bind_buffer(GL_ELEMENT_ARRAY_BUFFER, buffer.0 as GLuint));
        self.index_buffer_offset = offset;
        if self.index_type != index_type {
            self.index_type = index_type;
            if self.primitive_restart {
                gl!(self.gl => primitive_restart_index(self.restart_index()));
            }
        }
    }

    fn set_primitive_restart(&mut self, enabled: bool) {
        self.primitive_restart = enabled;
        if enabled {
            gl!(self.gl => enable(GL_PRIMITIVE_RESTART));
            gl!(self.gl => primitive_restart_index(self.restart_index()));
        } else {
            gl!(self.gl => disable(GL_PRIMITIVE_RESTART));
        }
    }

    fn push_constants(&self, offset: u32, data: &[u8]) {
        let end = offset as u64 + data.len() as u64;
        if end > PUSH_CONSTANT_SIZE as u64 {
            vks_warn!(SOURCE, "Push constant range {}..{} exceeds {} bytes, skipped", offset, end, PUSH_CONSTANT_SIZE);
            return;
        }
        gl!(self.gl => bind_buffer(GL_UNIFORM_BUFFER, self.push_constant_buffer));
        gl!(self.gl => buffer_sub_data(GL_UNIFORM_BUFFER, offset as GLintptr, data.len() as GLsizeiptr, data.as_ptr().cast()));
        gl!(self.gl => bind_buffer_range(
            GL_UNIFORM_BUFFER,
            self.push_constant_binding,
            self.push_constant_buffer,
            0,
            PUSH_CONSTANT_SIZE as GLsizeiptr,
        ));
    }

    // ===== DRAW =====

    fn draw(&self, mode: GLenum, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        let (first, count, instances) = (first_vertex as GLint, vertex_count as GLsizei, instance_count as GLsizei);
        if first_instance == 0
            || gl_opt!(self.gl => draw_arrays_instanced_base_instance(mode, first, count, instances, first_instance)).is_none()
        {
            if first_instance != 0 {
                vks_warn!(SOURCE, "Base instance {} ignored: not supported by the driver", first_instance);
            }
            gl!(self.gl => draw_arrays_instanced(mode, first, count, instances));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_indexed(
        &self,
        mode: GLenum,
        index_type: IndexType,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        let indices = (self.index_buffer_offset + first_index as u64 * index_type.size_bytes()) as usize as *const c_void;
        let gl_type = conv::index_type(index_type);
        let (count, instances) = (index_count as GLsizei, instance_count as GLsizei);
        if first_instance == 0
            || gl_opt!(self.gl => draw_elements_instanced_base_vertex_base_instance(
                mode, count, gl_type, indices, instances, vertex_offset, first_instance,
            ))
            .is_none()
        {
            if first_instance != 0 {
                vks_warn!(SOURCE, "Base instance {} ignored: not supported by the driver", first_instance);
            }
            gl!(self.gl => draw_elements_instanced_base_vertex(mode, count, gl_type, indices, instances, vertex_offset));
        }
    }

    // ===== TRANSFER =====

    fn bind_scratch_texture(&self, texture: &TextureRef) {
        gl!(self.gl => active_texture(GL_TEXTURE0 + SCRATCH_TEXTURE_UNIT));
        gl!(self.gl => bind_texture(conv::texture_target(texture.target), texture.handle.0 as GLuint));
    }

    #[allow(clippy::too_many_arguments)]
    fn upload_image(
        &self,
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
        let (pixel_format, pixel_type) = conv::transfer_format(format);
        let internal = conv::internal_format(format);
        let target = conv::texture_target(texture.target);
        let level = level as GLint;
        let (width, height, depth) = (extent.x as GLsizei, extent.y as GLsizei, extent.z as GLsizei);
        let data = buffer_offset as usize as *const c_void;

        gl!(self.gl => bind_buffer(GL_PIXEL_UNPACK_BUFFER, buffer.0 as GLuint));
        gl!(self.gl => pixel_storei(GL_UNPACK_ALIGNMENT, 1));
        gl!(self.gl => pixel_storei(GL_UNPACK_ROW_LENGTH, row_length as GLint));
        gl!(self.gl => pixel_storei(GL_UNPACK_IMAGE_HEIGHT, image_height as GLint));
        self.bind_scratch_texture(texture);

        let compressed = format.is_compressed();
        let slice_size = if compressed {
            compressed_size(format, extent.x, extent.y, 1)
        } else {
            let rows = (if image_height > 0 { image_height } else { extent.y }) as u64;
            let row = (if row_length > 0 { row_length } else { extent.x }) as u64;
            rows * row * format.block_size() as u64
        };

        match texture.target {
            TextureTarget::Texture1D => {
                gl!(self.gl => tex_sub_image_1d(target, level, offset.x, width, pixel_format, pixel_type, data));
            }
            TextureTarget::Texture1DArray | TextureTarget::Texture2D if compressed => {
                let size = compressed_size(format, extent.x, extent.y, 1) as GLsizei;
                gl!(self.gl => compressed_tex_sub_image_2d(target, level, offset.x, offset.y, width, height, internal, size, data));
            }
            TextureTarget::Texture1DArray | TextureTarget::Texture2D => {
                gl!(self.gl => tex_sub_image_2d(target, level, offset.x, offset.y, width, height, pixel_format, pixel_type, data));
            }
            TextureTarget::CubeMap => {
                for face in 0..extent.z.max(1) {
                    let face_target = GL_TEXTURE_CUBE_MAP_POSITIVE_X + offset.z as GLenum + face;
                    let face_data = (buffer_offset + face as u64 * slice_size) as usize as *const c_void;
                    if compressed {
                        gl!(self.gl => compressed_tex_sub_image_2d(
                            face_target, level, offset.x, offset.y, width, height, internal, slice_size as GLsizei, face_data,
                        ));
                    } else {
                        gl!(self.gl => tex_sub_image_2d(
                            face_target, level, offset.x, offset.y, width, height, pixel_format, pixel_type, face_data,
                        ));
                    }
                }
            }
            TextureTarget::Texture2DArray | TextureTarget::Texture3D | TextureTarget::CubeMapArray if compressed => {
                let size = (slice_size * extent.z.max(1) as u64) as GLsizei;
                gl!(self.gl => compressed_tex_sub_image_3d(
                    target, level, offset.x, offset.y, offset.z, width, height, depth, internal, size, data,
                ));
            }
            TextureTarget::Texture2DArray | TextureTarget::Texture3D | TextureTarget::CubeMapArray => {
                gl!(self.gl => tex_sub_image_3d(
                    target, level, offset.x, offset.y, offset.z, width, height, depth, pixel_format, pixel_type, data,
                ));
            }
            TextureTarget::Texture2DMultisample | TextureTarget::Texture2DMultisampleArray => {}
        }

        gl!(self.gl => pixel_storei(GL_UNPACK_ROW_LENGTH, 0));
        gl!(self.gl => pixel_storei(GL_UNPACK_IMAGE_HEIGHT, 0));
        gl!(self.gl => bind_buffer(GL_PIXEL_UNPACK_BUFFER, 0));
    }

    #[allow(clippy::too_many_arguments)]
    fn download_image(
        &mut self,
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
        let mip = |size: u32| (size >> level).max(1);
        let whole = offset == IVec3::ZERO
            && extent.x == mip(texture.extent.x)
            && extent.y == mip(texture.extent.y)
            && (texture.target != TextureTarget::Texture3D || extent.z == mip(texture.extent.z));
        let faces: u64 = if whole && texture.target == TextureTarget::CubeMap { 6 } else { 1 };
        let slice_size = extent.x as u64 * extent.y as u64 * texture.format.block_size() as u64;
        let size = slice_size * extent.z.max(1) as u64 * faces;

        let (pack_buffer, pack_offset) = match buffer {
            Some(buffer) => (buffer.0 as GLuint, buffer_offset),
            None => (self.host_storage_buffer(texture.id, size), 0),
        };
        let (pixel_format, pixel_type) = conv::transfer_format(texture.format);
        gl!(self.gl => bind_buffer(GL_PIXEL_PACK_BUFFER, pack_buffer));
        gl!(self.gl => pixel_storei(GL_PACK_ALIGNMENT, 1));

        if whole {
            self.bind_scratch_texture(texture);
            if texture.target == TextureTarget::CubeMap {
                for face in 0..6u32 {
                    let data = (pack_offset + face as u64 * slice_size) as usize as *mut c_void;
                    let face_target = GL_TEXTURE_CUBE_MAP_POSITIVE_X + face;
                    gl!(self.gl => get_tex_image(face_target, level as GLint, pixel_format, pixel_type, data));
                }
            } else {
                let target = conv::texture_target(texture.target);
                let data = pack_offset as usize as *mut c_void;
                gl!(self.gl => get_tex_image(target, level as GLint, pixel_format, pixel_type, data));
            }
        } else {
            let data = pack_offset as usize as *mut c_void;
            let downloaded = gl_opt!(self.gl => get_texture_sub_image(
                texture.handle.0 as GLuint,
                level as GLint,
                offset.x,
                offset.y,
                offset.z,
                extent.x as GLsizei,
                extent.y as GLsizei,
                extent.z.max(1) as GLsizei,
                pixel_format,
                pixel_type,
                size as GLsizei,
                data,
            ));
            if downloaded.is_none() {
                vks_warn!(SOURCE, "Partial download of image {:?} needs glGetTextureSubImage, skipped", texture.id);
            }
        }
        gl!(self.gl => bind_buffer(GL_PIXEL_PACK_BUFFER, 0));
    }

    fn clear_tex_image(
        &self,
        texture: &TextureRef,
        level: u32,
        base_layer: u32,
        layer_count: u32,
        value: &vkshim_core::command::ClearValue,
    ) {
        let (format, data_type, data) = conv::clear_tex_data(texture.format, value);
        let width = (texture.extent.x >> level).max(1) as GLsizei;
        let height = (texture.extent.y >> level).max(1) as GLsizei;
        let (y, height, z, depth) = match texture.target {
            TextureTarget::Texture1D => (0, 1, 0, 1),
            TextureTarget::Texture1DArray => (base_layer as GLint, layer_count as GLsizei, 0, 1),
            TextureTarget::Texture3D => (0, height, 0, (texture.extent.z >> level).max(1) as GLsizei),
            TextureTarget::Texture2D | TextureTarget::Texture2DMultisample => (0, height, 0, 1),
            TextureTarget::Texture2DArray
            | TextureTarget::Texture2DMultisampleArray
            | TextureTarget::CubeMap
            | TextureTarget::CubeMapArray => (0, height, base_layer as GLint, layer_count as GLsizei),
        };
        gl_opt!(self.gl => clear_tex_sub_image(
            texture.handle.0 as GLuint,
            level as GLint,
            0,
            y,
            z,
            width,
            height,
            depth,
            format,
            data_type,
            data.as_ptr().cast(),
        ));
    }

    // ===== QUERIES =====

    fn reset_queries(&mut self, pool: ObjectId, first: u32, count: u32) {
        for index in first..first.saturating_add(count) {
            if let Some(name) = self.queries.remove(&QuerySlot { pool, index }) {
                gl!(self.gl => delete_queries(1, &name));
            }
        }
    }

    fn toggle(&self, capability: GLenum, enabled: bool) {
        if enabled {
            gl!(self.gl => enable(capability));
        } else {
            gl!(self.gl => disable(capability));
        }
    }
}

/// Bytes of a block-compressed region
fn compressed_size(format: Format, width: u32, height: u32, depth: u32) -> u64 {
    let blocks_x = width.div_ceil(4) as u64;
    let blocks_y = height.div_ceil(4) as u64;
    blocks_x * blocks_y * depth.max(1) as u64 * format.block_size() as u64
}

impl NativeBackend for GlBackend {
    fn name(&self) -> &'static str {
        "gl"
    }

    fn capabilities(&self) -> BackendCaps {
        self.caps
    }

    fn limits(&self) -> BackendLimits {
        self.limits
    }

    fn execute(&mut self, op: &NativeOp) {
        match op {
            // ---- color blend
            NativeOp::SetBlendEnabled { attachment, enabled } => self.set_blend_enabled(*attachment, *enabled),
            NativeOp::SetBlendFunc { attachment, src_color, dst_color, src_alpha, dst_alpha } => {
                let factors = (
                    conv::blend_factor(*src_color),
                    conv::blend_factor(*dst_color),
                    conv::blend_factor(*src_alpha),
                    conv::blend_factor(*dst_alpha),
                );
                match self.indexed(*attachment) {
                    Some(true) => {
                        gl_opt!(self.gl => blend_func_separatei(*attachment, factors.0, factors.1, factors.2, factors.3));
                    }
                    Some(false) => gl!(self.gl => blend_func_separate(factors.0, factors.1, factors.2, factors.3)),
                    None => {}
                }
            }
            NativeOp::SetBlendEquation { attachment, color_op, alpha_op } => {
                let (color, alpha) = (conv::blend_op(*color_op), conv::blend_op(*alpha_op));
                match self.indexed(*attachment) {
                    Some(true) => {
                        gl_opt!(self.gl => blend_equation_separatei(*attachment, color, alpha));
                    }
                    Some(false) => gl!(self.gl => blend_equation_separate(color, alpha)),
                    None => {}
                }
            }
            NativeOp::SetColorWriteMask { attachment, mask } => self.set_color_write_mask(*attachment, *mask),
            NativeOp::SetBlendConstants(constants) => {
                gl!(self.gl => blend_color(constants[0], constants[1], constants[2], constants[3]));
            }
            NativeOp::SetLogicOp(op) => match op {
                Some(op) => {
                    gl!(self.gl => enable(GL_COLOR_LOGIC_OP));
                    gl_opt!(self.gl => logic_op(conv::logic_op(*op)));
                }
                None => gl!(self.gl => disable(GL_COLOR_LOGIC_OP)),
            },

            // ---- depth / stencil
            NativeOp::SetDepthTestEnabled(enabled) => self.toggle(GL_DEPTH_TEST, *enabled),
            NativeOp::SetDepthWriteEnabled(enabled) => {
                gl!(self.gl => depth_mask(if *enabled { GL_TRUE } else { GL_FALSE }));
            }
            NativeOp::SetDepthCompareOp(op) => gl!(self.gl => depth_func(conv::compare_op(*op))),
            NativeOp::SetDepthBoundsTestEnabled(enabled) => {
                if self.caps.contains(BackendCaps::DEPTH_BOUNDS) {
                    self.toggle(GL_DEPTH_BOUNDS_TEST_EXT, *enabled);
                }
            }
            NativeOp::SetDepthBounds { min, max } => {
                gl_opt!(self.gl => depth_bounds_ext(*min as GLdouble, *max as GLdouble));
            }
            NativeOp::SetStencilTestEnabled(enabled) => self.toggle(GL_STENCIL_TEST, *enabled),
            NativeOp::SetStencilOps { face, fail, depth_fail, pass } => {
                gl!(self.gl => stencil_op_separate(
                    conv::stencil_face(*face),
                    conv::stencil_op(*fail),
                    conv::stencil_op(*depth_fail),
                    conv::stencil_op(*pass),
                ));
            }
            NativeOp::SetStencilFunc { face, compare_op, reference, compare_mask } => {
                gl!(self.gl => stencil_func_separate(
                    conv::stencil_face(*face),
                    conv::compare_op(*compare_op),
                    *reference as GLint,
                    *compare_mask,
                ));
            }
            NativeOp::SetStencilWriteMask { face, mask } => {
                gl!(self.gl => stencil_mask_separate(conv::stencil_face(*face), *mask));
            }

            // ---- multisample
            NativeOp::SetMultisampleEnabled(enabled) => self.toggle(GL_MULTISAMPLE, *enabled),
            NativeOp::SetSampleShading { enabled, min_fraction } => {
                self.toggle(GL_SAMPLE_SHADING, *enabled);
                if *enabled {
                    gl_opt!(self.gl => min_sample_shading(*min_fraction));
                }
            }
            NativeOp::SetSampleMask(mask) => {
                self.toggle(GL_SAMPLE_MASK, *mask != u32::MAX);
                gl!(self.gl => sample_maski(0, *mask));
            }
            NativeOp::SetAlphaToCoverageEnabled(enabled) => self.toggle(GL_SAMPLE_ALPHA_TO_COVERAGE, *enabled),
            NativeOp::SetAlphaToOneEnabled(enabled) => self.toggle(GL_SAMPLE_ALPHA_TO_ONE, *enabled),

            // ---- tessellation / input assembly
            NativeOp::SetPatchControlPoints(points) => {
                gl_opt!(self.gl => patch_parameteri(GL_PATCH_VERTICES, *points as GLint));
            }
            NativeOp::SetPrimitiveRestartEnabled(enabled) => self.set_primitive_restart(*enabled),

            // ---- viewport / scissor
            // GL has no viewport count; unused viewports keep their values.
            NativeOp::SetViewportCount(_) => {}
            NativeOp::SetViewport { index, viewport } => self.set_viewport(*index, viewport),
            NativeOp::SetScissorCount(count) => self.toggle(GL_SCISSOR_TEST, *count > 0),
            NativeOp::SetScissor { index, rect } => self.set_scissor(*index, rect),

            // ---- rasterization
            NativeOp::SetDepthClampEnabled(enabled) => self.toggle(GL_DEPTH_CLAMP, *enabled),
            NativeOp::SetRasterizerDiscardEnabled(enabled) => self.toggle(GL_RASTERIZER_DISCARD, *enabled),
            NativeOp::SetPolygonMode(mode) => gl!(self.gl => polygon_mode(GL_FRONT_AND_BACK, conv::polygon_mode(*mode))),
            NativeOp::SetCullMode(mode) => match conv::cull_face(*mode) {
                Some(face) => {
                    gl!(self.gl => enable(GL_CULL_FACE));
                    gl!(self.gl => cull_face(face));
                }
                None => gl!(self.gl => disable(GL_CULL_FACE)),
            },
            NativeOp::SetFrontFace(face) => gl!(self.gl => front_face(conv::front_face(*face))),
            NativeOp::SetDepthBiasEnabled(enabled) => {
                self.toggle(GL_POLYGON_OFFSET_FILL, *enabled);
                self.toggle(GL_POLYGON_OFFSET_LINE, *enabled);
                self.toggle(GL_POLYGON_OFFSET_POINT, *enabled);
            }
            // No clamp without GL_ARB_polygon_offset_clamp.
            NativeOp::SetDepthBias { constant_factor, slope_factor, .. } => {
                gl!(self.gl => polygon_offset(*slope_factor, *constant_factor));
            }
            NativeOp::SetLineWidth(width) => gl!(self.gl => line_width(*width)),

            // ---- program / geometry
            NativeOp::UseProgram(program) => gl!(self.gl => use_program(program.0 as GLuint)),
            NativeOp::SetVertexLayout(layout) => self.set_vertex_layout(layout),
            NativeOp::BindVertexBuffer { binding, buffer, offset, stride, .. } => {
                gl!(self.gl => bind_vertex_buffer(*binding, buffer.0 as GLuint, *offset as GLintptr, *stride as GLsizei));
            }
            NativeOp::BindIndexBuffer { buffer, offset, index_type } => {
                self.bind_index_buffer(*buffer, *offset, *index_type);
            }

            // ---- framebuffer
            NativeOp::SetFramebufferSrgb(enabled) => self.toggle(GL_FRAMEBUFFER_SRGB, *enabled),
            NativeOp::BindFramebuffer { target, framebuffer } => self.bind_framebuffer(*target, *framebuffer),
            NativeOp::AttachImage { framebuffer, attachment } => self.attach_image(*framebuffer, *attachment),
            NativeOp::DetachImage { framebuffer, point } => self.detach_image(*framebuffer, *point),
            NativeOp::SetDrawBuffers { framebuffer, points } => self.set_draw_buffers(*framebuffer, points),
            NativeOp::SetReadBuffer { framebuffer, point } => self.set_read_buffer(*framebuffer, *point),
            NativeOp::ClearColorAttachment { slot, value } => self.clear_color_attachment(*slot, value),
            NativeOp::ClearDepthStencilAttachment { depth, stencil } => {
                self.clear_depth_stencil_attachment(*depth, *stencil);
            }
            NativeOp::InvalidateAttachments { framebuffer, points } => self.invalidate_attachments(*framebuffer, points),
            NativeOp::BlitFramebuffer { src_offsets, dst_offsets, mask, filter } => {
                self.blit_framebuffer(*src_offsets, *dst_offsets, *mask, *filter);
            }

            // ---- descriptors / constants
            NativeOp::BindUniformBuffer { binding, buffer, offset, size } => {
                gl!(self.gl => bind_buffer_range(
                    GL_UNIFORM_BUFFER, *binding, buffer.0 as GLuint, *offset as GLintptr, *size as GLsizeiptr,
                ));
            }
            NativeOp::BindStorageBuffer { binding, buffer, offset, size } => {
                gl!(self.gl => bind_buffer_range(
                    GL_SHADER_STORAGE_BUFFER, *binding, buffer.0 as GLuint, *offset as GLintptr, *size as GLsizeiptr,
                ));
            }
            NativeOp::BindTexture { unit, texture, base_level, level_count, sampler, .. } => {
                let target = conv::texture_target(texture.target);
                gl!(self.gl => active_texture(GL_TEXTURE0 + *unit));
                gl!(self.gl => bind_texture(target, texture.handle.0 as GLuint));
                if !matches!(texture.target, TextureTarget::Texture2DMultisample | TextureTarget::Texture2DMultisampleArray) {
                    let max_level = base_level + level_count.saturating_sub(1);
                    gl!(self.gl => tex_parameteri(target, GL_TEXTURE_BASE_LEVEL, *base_level as GLint));
                    gl!(self.gl => tex_parameteri(target, GL_TEXTURE_MAX_LEVEL, max_level as GLint));
                }
                gl!(self.gl => bind_sampler(*unit, sampler.map_or(0, |sampler| sampler.0 as GLuint)));
            }
            NativeOp::BindStorageImage { unit, texture, format, level, layer } => {
                let layered = if layer.is_none() { GL_TRUE } else { GL_FALSE };
                let bound = gl_opt!(self.gl => bind_image_texture(
                    *unit,
                    texture.handle.0 as GLuint,
                    *level as GLint,
                    layered,
                    layer.unwrap_or(0) as GLint,
                    GL_READ_WRITE,
                    conv::internal_format(*format),
                ));
                if bound.is_none() {
                    vks_warn!(SOURCE, "Storage image binding needs glBindImageTexture, skipped");
                }
            }
            NativeOp::PushConstants { offset, data, .. } => self.push_constants(*offset, data),

            // ---- draw / dispatch
            NativeOp::Draw { topology, vertex_count, instance_count, first_vertex, first_instance } => {
                self.draw(conv::primitive_topology(*topology), *vertex_count, *instance_count, *first_vertex, *first_instance);
            }
            NativeOp::DrawIndexed {
                topology,
                index_type,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            } => self.draw_indexed(
                conv::primitive_topology(*topology),
                *index_type,
                *index_count,
                *instance_count,
                *first_index,
                *vertex_offset,
                *first_instance,
            ),
            NativeOp::DrawIndirect { topology, buffer, offset, draw_count, stride } => {
                gl!(self.gl => bind_buffer(GL_DRAW_INDIRECT_BUFFER, buffer.0 as GLuint));
                gl_opt!(self.gl => multi_draw_arrays_indirect(
                    conv::primitive_topology(*topology),
                    *offset as usize as *const c_void,
                    *draw_count as GLsizei,
                    *stride as GLsizei,
                ));
            }
            NativeOp::DrawIndexedIndirect { topology, index_type, buffer, offset, draw_count, stride } => {
                gl!(self.gl => bind_buffer(GL_DRAW_INDIRECT_BUFFER, buffer.0 as GLuint));
                gl_opt!(self.gl => multi_draw_elements_indirect(
                    conv::primitive_topology(*topology),
                    conv::index_type(*index_type),
                    *offset as usize as *const c_void,
                    *draw_count as GLsizei,
                    *stride as GLsizei,
                ));
            }
            NativeOp::Dispatch { x, y, z } => {
                gl_opt!(self.gl => dispatch_compute(*x, *y, *z));
            }
            NativeOp::DispatchIndirect { buffer, offset } => {
                gl!(self.gl => bind_buffer(GL_DISPATCH_INDIRECT_BUFFER, buffer.0 as GLuint));
                gl_opt!(self.gl => dispatch_compute_indirect(*offset as GLintptr));
            }

            // ---- transfer
            NativeOp::CopyBuffer { src, dst, src_offset, dst_offset, size } => {
                gl!(self.gl => bind_buffer(GL_COPY_READ_BUFFER, src.0 as GLuint));
                gl!(self.gl => bind_buffer(GL_COPY_WRITE_BUFFER, dst.0 as GLuint));
                gl!(self.gl => copy_buffer_sub_data(
                    GL_COPY_READ_BUFFER,
                    GL_COPY_WRITE_BUFFER,
                    *src_offset as GLintptr,
                    *dst_offset as GLintptr,
                    *size as GLsizeiptr,
                ));
            }
            NativeOp::CopyImageSubData { src, src_level, src_offset, dst, dst_level, dst_offset, extent } => {
                gl_opt!(self.gl => copy_image_sub_data(
                    src.handle.0 as GLuint,
                    conv::texture_target(src.target),
                    *src_level as GLint,
                    src_offset.x,
                    src_offset.y,
                    src_offset.z,
                    dst.handle.0 as GLuint,
                    conv::texture_target(dst.target),
                    *dst_level as GLint,
                    dst_offset.x,
                    dst_offset.y,
                    dst_offset.z,
                    extent.x as GLsizei,
                    extent.y as GLsizei,
                    extent.z as GLsizei,
                ));
            }
            NativeOp::UploadImage { buffer, buffer_offset, row_length, image_height, texture, level, offset, extent } => {
                self.upload_image(*buffer, *buffer_offset, *row_length, *image_height, texture, *level, *offset, *extent);
            }
            NativeOp::DownloadImage { texture, level, offset, extent, buffer, buffer_offset } => {
                self.download_image(texture, *level, *offset, *extent, *buffer, *buffer_offset);
            }
            NativeOp::ClearTexImage { texture, level, base_layer, layer_count, value } => {
                self.clear_tex_image(texture, *level, *base_layer, *layer_count, value);
            }
            NativeOp::MemoryBarrier(bits) => {
                gl_opt!(self.gl => memory_barrier(bits.bits()));
            }

            // ---- queries
            NativeOp::BeginQuery { query_type, query } => {
                let name = self.query_object(*query);
                gl!(self.gl => begin_query(conv::query_target(*query_type), name));
            }
            NativeOp::EndQuery { query_type, .. } => gl!(self.gl => end_query(conv::query_target(*query_type))),
            NativeOp::WriteTimestamp { query } => {
                let name = self.query_object(*query);
                gl_opt!(self.gl => query_counter(name, GL_TIMESTAMP));
            }
            NativeOp::ResetQueries { pool, first, count } => self.reset_queries(*pool, *first, *count),
        }
    }

    fn flush(&mut self) {
        gl!(self.gl => flush());
    }

    fn insert_fence(&mut self) -> FenceSignal {
        if let (Some(client_wait_sync), Some(delete_sync)) = (self.gl.client_wait_sync, self.gl.delete_sync) {
            if let Some(sync) = gl_opt!(self.gl => fence_sync(GL_SYNC_GPU_COMMANDS_COMPLETE, 0)) {
                if !sync.is_null() {
                    return FenceSignal::Pending(Box::new(GlSync::new(sync, client_wait_sync, delete_sync)));
                }
                vks_warn!(SOURCE, "glFenceSync returned no object, finishing instead");
            }
        }
        gl!(self.gl => finish());
        FenceSignal::Signaled
    }
}

impl Drop for GlBackend {
    fn drop(&mut self) {
        let framebuffers: Vec<GLuint> = self.framebuffers.values().copied().collect();
        if !framebuffers.is_empty() {
            gl!(self.gl => delete_framebuffers(framebuffers.len() as GLsizei, framebuffers.as_ptr()));
        }
        let queries: Vec<GLuint> = self.queries.values().copied().collect();
        if !queries.is_empty() {
            gl!(self.gl => delete_queries(queries.len() as GLsizei, queries.as_ptr()));
        }
        let mut buffers: Vec<GLuint> = self.host_storage.values().map(|storage| storage.buffer).collect();
        buffers.push(self.push_constant_buffer);
        gl!(self.gl => delete_buffers(buffers.len() as GLsizei, buffers.as_ptr()));
        gl!(self.gl => delete_vertex_arrays(1, &self.vertex_array));
    }
}

#[cfg(test)]
#[path = "gl_backend_tests.rs"]
mod tests;
