//! Recording stand-in for a GL driver
//!
//! Every entry point appends its name and Debug-formatted arguments to a
//! thread-local call log. Object-creating calls hand out increasing names and
//! `glGetIntegerv` answers from a small table, which is enough to drive the
//! backend without a context. Shared by the unit tests and, through `#[path]`,
//! by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::ffi::c_void;

type GLenum = u32;
type GLbitfield = u32;
type GLboolean = u8;
type GLint = i32;
type GLuint = u32;
type GLsizei = i32;
type GLfloat = f32;
type GLdouble = f64;
type GLintptr = isize;
type GLsizeiptr = isize;
type GLuint64 = u64;
type GLsync = *const c_void;

const GL_COLOR: GLenum = 0x1800;
const GL_ALREADY_SIGNALED: GLenum = 0x911A;

/// One recorded GL call
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

thread_local! {
    static CALLS: RefCell<Vec<Call>> = const { RefCell::new(Vec::new()) };
    static NEXT_NAME: Cell<GLuint> = const { Cell::new(1) };
    static INTEGERS: RefCell<Vec<(GLenum, GLint)>> = const { RefCell::new(Vec::new()) };
    static ERRORS: RefCell<Vec<GLenum>> = const { RefCell::new(Vec::new()) };
    static WAIT_STATUS: Cell<GLenum> = const { Cell::new(GL_ALREADY_SIGNALED) };
}

/// Forget everything recorded on this thread
pub fn reset() {
    CALLS.with(|calls| calls.borrow_mut().clear());
    NEXT_NAME.with(|name| name.set(1));
    INTEGERS.with(|integers| integers.borrow_mut().clear());
    ERRORS.with(|errors| errors.borrow_mut().clear());
    WAIT_STATUS.with(|status| status.set(GL_ALREADY_SIGNALED));
}

pub fn take_calls() -> Vec<Call> {
    CALLS.with(|calls| std::mem::take(&mut *calls.borrow_mut()))
}

/// Names of the calls recorded so far, without clearing them
pub fn call_names() -> Vec<&'static str> {
    CALLS.with(|calls| calls.borrow().iter().map(|call| call.name).collect())
}

/// Recorded calls to one entry point
pub fn calls_to(name: &str) -> Vec<Call> {
    CALLS.with(|calls| calls.borrow().iter().filter(|call| call.name == name).cloned().collect())
}

/// Override a `glGetIntegerv` answer
pub fn set_integer(pname: GLenum, value: GLint) {
    INTEGERS.with(|integers| integers.borrow_mut().push((pname, value)));
}

/// Queue an error for `glGetError`
pub fn push_error(code: GLenum) {
    ERRORS.with(|errors| errors.borrow_mut().push(code));
}

/// Status returned by `glClientWaitSync`
pub fn set_wait_status(status: GLenum) {
    WAIT_STATUS.with(|current| current.set(status));
}

fn record(name: &'static str, args: Vec<String>) {
    CALLS.with(|calls| calls.borrow_mut().push(Call { name, args }));
}

fn next_names(count: GLsizei) -> Vec<GLuint> {
    NEXT_NAME.with(|next| {
        (0..count)
            .map(|_| {
                let name = next.get();
                next.set(name + 1);
                name
            })
            .collect()
    })
}

unsafe fn read<T: Copy>(data: *const T, count: usize) -> Vec<T> {
    if data.is_null() {
        return Vec::new();
    }
    std::slice::from_raw_parts(data, count).to_vec()
}

// ============================================================================
// PLAIN RECORDERS
// ============================================================================

macro_rules! recorders {
    ($( $func:ident : $gl_name:literal ( $($arg:ident : $ty:ty),* ) $(-> $ret:ty = $value:expr)? ;)*) => {
        $(
            unsafe extern "system" fn $func($($arg: $ty),*) $(-> $ret)? {
                record($gl_name, vec![$(format!("{:?}", $arg)),*]);
                $($value)?
            }
        )*

        fn recorded(name: &str) -> Option<*const c_void> {
            match name {
                $( $gl_name => Some($func as *const c_void), )*
                _ => None,
            }
        }
    };
}

recorders! {
    enable: "glEnable"(cap: GLenum);
    disable: "glDisable"(cap: GLenum);
    blend_func_separate: "glBlendFuncSeparate"(a: GLenum, b: GLenum, c: GLenum, d: GLenum);
    blend_equation_separate: "glBlendEquationSeparate"(a: GLenum, b: GLenum);
    color_mask: "glColorMask"(r: GLboolean, g: GLboolean, b: GLboolean, a: GLboolean);
    blend_color: "glBlendColor"(r: GLfloat, g: GLfloat, b: GLfloat, a: GLfloat);
    depth_func: "glDepthFunc"(func: GLenum);
    depth_mask: "glDepthMask"(flag: GLboolean);
    stencil_op_separate: "glStencilOpSeparate"(face: GLenum, sfail: GLenum, dpfail: GLenum, dppass: GLenum);
    stencil_func_separate: "glStencilFuncSeparate"(face: GLenum, func: GLenum, reference: GLint, mask: GLuint);
    stencil_mask_separate: "glStencilMaskSeparate"(face: GLenum, mask: GLuint);
    sample_maski: "glSampleMaski"(index: GLuint, mask: GLbitfield);
    viewport: "glViewport"(x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    depth_range: "glDepthRange"(near: GLdouble, far: GLdouble);
    scissor: "glScissor"(x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    polygon_mode: "glPolygonMode"(face: GLenum, mode: GLenum);
    cull_face: "glCullFace"(mode: GLenum);
    front_face: "glFrontFace"(mode: GLenum);
    polygon_offset: "glPolygonOffset"(factor: GLfloat, units: GLfloat);
    line_width: "glLineWidth"(width: GLfloat);
    primitive_restart_index: "glPrimitiveRestartIndex"(index: GLuint);
    use_program: "glUseProgram"(program: GLuint);
    bind_vertex_array: "glBindVertexArray"(array: GLuint);
    enable_vertex_attrib_array: "glEnableVertexAttribArray"(index: GLuint);
    disable_vertex_attrib_array: "glDisableVertexAttribArray"(index: GLuint);
    vertex_attrib_format: "glVertexAttribFormat"(index: GLuint, size: GLint, ty: GLenum, normalized: GLboolean, offset: GLuint);
    vertex_attrib_i_format: "glVertexAttribIFormat"(index: GLuint, size: GLint, ty: GLenum, offset: GLuint);
    vertex_attrib_binding: "glVertexAttribBinding"(index: GLuint, binding: GLuint);
    bind_vertex_buffer: "glBindVertexBuffer"(binding: GLuint, buffer: GLuint, offset: GLintptr, stride: GLsizei);
    vertex_binding_divisor: "glVertexBindingDivisor"(binding: GLuint, divisor: GLuint);
    bind_buffer: "glBindBuffer"(target: GLenum, buffer: GLuint);
    buffer_data: "glBufferData"(target: GLenum, size: GLsizeiptr, data: *const c_void, usage: GLenum);
    bind_buffer_range: "glBindBufferRange"(target: GLenum, index: GLuint, buffer: GLuint, offset: GLintptr, size: GLsizeiptr);
    copy_buffer_sub_data: "glCopyBufferSubData"(read_target: GLenum, write_target: GLenum, read_offset: GLintptr, write_offset: GLintptr, size: GLsizeiptr);
    bind_framebuffer: "glBindFramebuffer"(target: GLenum, framebuffer: GLuint);
    framebuffer_texture_1d: "glFramebufferTexture1D"(target: GLenum, attachment: GLenum, textarget: GLenum, texture: GLuint, level: GLint);
    framebuffer_texture_2d: "glFramebufferTexture2D"(target: GLenum, attachment: GLenum, textarget: GLenum, texture: GLuint, level: GLint);
    framebuffer_texture_layer: "glFramebufferTextureLayer"(target: GLenum, attachment: GLenum, texture: GLuint, level: GLint, layer: GLint);
    read_buffer: "glReadBuffer"(mode: GLenum);
    clear_bufferfi: "glClearBufferfi"(buffer: GLenum, drawbuffer: GLint, depth: GLfloat, stencil: GLint);
    blit_framebuffer: "glBlitFramebuffer"(
        src_x0: GLint, src_y0: GLint, src_x1: GLint, src_y1: GLint,
        dst_x0: GLint, dst_y0: GLint, dst_x1: GLint, dst_y1: GLint,
        mask: GLbitfield, filter: GLenum
    );
    active_texture: "glActiveTexture"(texture: GLenum);
    bind_texture: "glBindTexture"(target: GLenum, texture: GLuint);
    tex_parameteri: "glTexParameteri"(target: GLenum, pname: GLenum, param: GLint);
    bind_sampler: "glBindSampler"(unit: GLuint, sampler: GLuint);
    pixel_storei: "glPixelStorei"(pname: GLenum, param: GLint);
    tex_sub_image_1d: "glTexSubImage1D"(
        target: GLenum, level: GLint, x: GLint, width: GLsizei, format: GLenum, ty: GLenum, data: *const c_void
    );
    tex_sub_image_2d: "glTexSubImage2D"(
        target: GLenum, level: GLint, x: GLint, y: GLint, width: GLsizei, height: GLsizei,
        format: GLenum, ty: GLenum, data: *const c_void
    );
    tex_sub_image_3d: "glTexSubImage3D"(
        target: GLenum, level: GLint, x: GLint, y: GLint, z: GLint, width: GLsizei, height: GLsizei, depth: GLsizei,
        format: GLenum, ty: GLenum, data: *const c_void
    );
    compressed_tex_sub_image_2d: "glCompressedTexSubImage2D"(
        target: GLenum, level: GLint, x: GLint, y: GLint, width: GLsizei, height: GLsizei,
        format: GLenum, size: GLsizei, data: *const c_void
    );
    compressed_tex_sub_image_3d: "glCompressedTexSubImage3D"(
        target: GLenum, level: GLint, x: GLint, y: GLint, z: GLint, width: GLsizei, height: GLsizei, depth: GLsizei,
        format: GLenum, size: GLsizei, data: *const c_void
    );
    get_tex_image: "glGetTexImage"(target: GLenum, level: GLint, format: GLenum, ty: GLenum, data: *mut c_void);
    draw_arrays_instanced: "glDrawArraysInstanced"(mode: GLenum, first: GLint, count: GLsizei, instances: GLsizei);
    draw_elements_instanced_base_vertex: "glDrawElementsInstancedBaseVertex"(
        mode: GLenum, count: GLsizei, ty: GLenum, indices: *const c_void, instances: GLsizei, base_vertex: GLint
    );
    begin_query: "glBeginQuery"(target: GLenum, id: GLuint);
    end_query: "glEndQuery"(target: GLenum);
    flush: "glFlush"();
    finish: "glFinish"();

    clear_tex_sub_image: "glClearTexSubImage"(
        texture: GLuint, level: GLint, x: GLint, y: GLint, z: GLint, width: GLsizei, height: GLsizei, depth: GLsizei,
        format: GLenum, ty: GLenum, data: *const c_void
    );
    copy_image_sub_data: "glCopyImageSubData"(
        src: GLuint, src_target: GLenum, src_level: GLint, src_x: GLint, src_y: GLint, src_z: GLint,
        dst: GLuint, dst_target: GLenum, dst_level: GLint, dst_x: GLint, dst_y: GLint, dst_z: GLint,
        width: GLsizei, height: GLsizei, depth: GLsizei
    );
    blend_func_separatei: "glBlendFuncSeparatei"(buf: GLuint, a: GLenum, b: GLenum, c: GLenum, d: GLenum);
    blend_equation_separatei: "glBlendEquationSeparatei"(buf: GLuint, a: GLenum, b: GLenum);
    color_maski: "glColorMaski"(buf: GLuint, r: GLboolean, g: GLboolean, b: GLboolean, a: GLboolean);
    enablei: "glEnablei"(cap: GLenum, index: GLuint);
    disablei: "glDisablei"(cap: GLenum, index: GLuint);
    viewport_indexedf: "glViewportIndexedf"(index: GLuint, x: GLfloat, y: GLfloat, width: GLfloat, height: GLfloat);
    scissor_indexed: "glScissorIndexed"(index: GLuint, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    depth_range_indexed: "glDepthRangeIndexed"(index: GLuint, near: GLdouble, far: GLdouble);
    memory_barrier: "glMemoryBarrier"(barriers: GLbitfield);
    dispatch_compute: "glDispatchCompute"(x: GLuint, y: GLuint, z: GLuint);
    dispatch_compute_indirect: "glDispatchComputeIndirect"(offset: GLintptr);
    patch_parameteri: "glPatchParameteri"(pname: GLenum, value: GLint);
    depth_bounds_ext: "glDepthBoundsEXT"(min: GLdouble, max: GLdouble);
    delete_sync: "glDeleteSync"(sync: GLsync);
    query_counter: "glQueryCounter"(id: GLuint, target: GLenum);
    multi_draw_arrays_indirect: "glMultiDrawArraysIndirect"(mode: GLenum, indirect: *const c_void, count: GLsizei, stride: GLsizei);
    multi_draw_elements_indirect: "glMultiDrawElementsIndirect"(
        mode: GLenum, ty: GLenum, indirect: *const c_void, count: GLsizei, stride: GLsizei
    );
    logic_op: "glLogicOp"(op: GLenum);
    bind_image_texture: "glBindImageTexture"(
        unit: GLuint, texture: GLuint, level: GLint, layered: GLboolean, layer: GLint, access: GLenum, format: GLenum
    );
    min_sample_shading: "glMinSampleShading"(value: GLfloat);
    draw_arrays_instanced_base_instance: "glDrawArraysInstancedBaseInstance"(
        mode: GLenum, first: GLint, count: GLsizei, instances: GLsizei, base_instance: GLuint
    );
    draw_elements_instanced_base_vertex_base_instance: "glDrawElementsInstancedBaseVertexBaseInstance"(
        mode: GLenum, count: GLsizei, ty: GLenum, indices: *const c_void, instances: GLsizei, base_vertex: GLint,
        base_instance: GLuint
    );
    get_texture_sub_image: "glGetTextureSubImage"(
        texture: GLuint, level: GLint, x: GLint, y: GLint, z: GLint, width: GLsizei, height: GLsizei, depth: GLsizei,
        format: GLenum, ty: GLenum, size: GLsizei, data: *mut c_void
    );
}

// ============================================================================
// CALLS WITH OUTPUTS OR ARRAYS
// ============================================================================

unsafe extern "system" fn get_error() -> GLenum {
    ERRORS.with(|errors| {
        let mut errors = errors.borrow_mut();
        if errors.is_empty() { 0 } else { errors.remove(0) }
    })
}

unsafe extern "system" fn get_integerv(pname: GLenum, data: *mut GLint) {
    let overridden = INTEGERS.with(|integers| {
        integers.borrow().iter().rev().find(|(name, _)| *name == pname).map(|(_, value)| *value)
    });
    let value = overridden.unwrap_or(match pname {
        0x825B => 16, // GL_MAX_VIEWPORTS
        0x8CDF => 8,  // GL_MAX_COLOR_ATTACHMENTS
        0x82DA => 16, // GL_MAX_VERTEX_ATTRIB_BINDINGS
        0x8A2F => 36, // GL_MAX_UNIFORM_BUFFER_BINDINGS
        _ => 0,
    });
    *data = value;
}

unsafe extern "system" fn get_string(name: GLenum) -> *const u8 {
    let text: &'static [u8] = match name {
        0x1F00 => b"Fake Vendor\0",
        0x1F01 => b"Fake Renderer\0",
        0x1F02 => b"4.6.0 Fake\0",
        _ => return std::ptr::null(),
    };
    text.as_ptr()
}

macro_rules! generators {
    ($( $func:ident : $gl_name:literal; )*) => {
        $(
            unsafe extern "system" fn $func(count: GLsizei, names: *mut GLuint) {
                let generated = next_names(count);
                std::ptr::copy_nonoverlapping(generated.as_ptr(), names, generated.len());
                record($gl_name, vec![format!("{:?}", generated)]);
            }
        )*
    };
}

generators! {
    gen_vertex_arrays: "glGenVertexArrays";
    gen_buffers: "glGenBuffers";
    gen_framebuffers: "glGenFramebuffers";
    gen_queries: "glGenQueries";
}

macro_rules! deleters {
    ($( $func:ident : $gl_name:literal; )*) => {
        $(
            unsafe extern "system" fn $func(count: GLsizei, names: *const GLuint) {
                record($gl_name, vec![format!("{:?}", read(names, count as usize))]);
            }
        )*
    };
}

deleters! {
    delete_vertex_arrays: "glDeleteVertexArrays";
    delete_buffers: "glDeleteBuffers";
    delete_framebuffers: "glDeleteFramebuffers";
    delete_queries: "glDeleteQueries";
}

unsafe extern "system" fn draw_buffers(count: GLsizei, buffers: *const GLenum) {
    record("glDrawBuffers", vec![format!("{:?}", read(buffers, count as usize))]);
}

unsafe extern "system" fn invalidate_framebuffer(target: GLenum, count: GLsizei, attachments: *const GLenum) {
    record(
        "glInvalidateFramebuffer",
        vec![format!("{:?}", target), format!("{:?}", read(attachments, count as usize))],
    );
}

unsafe extern "system" fn buffer_sub_data(target: GLenum, offset: GLintptr, size: GLsizeiptr, data: *const c_void) {
    let bytes = read(data as *const u8, size as usize);
    record(
        "glBufferSubData",
        vec![format!("{:?}", target), format!("{:?}", offset), format!("{:?}", bytes)],
    );
}

fn clear_components(buffer: GLenum) -> usize {
    if buffer == GL_COLOR { 4 } else { 1 }
}

unsafe extern "system" fn clear_bufferfv(buffer: GLenum, drawbuffer: GLint, value: *const GLfloat) {
    let values = read(value, clear_components(buffer));
    record("glClearBufferfv", vec![format!("{:?}", buffer), format!("{:?}", drawbuffer), format!("{:?}", values)]);
}

unsafe extern "system" fn clear_bufferiv(buffer: GLenum, drawbuffer: GLint, value: *const GLint) {
    let values = read(value, clear_components(buffer));
    record("glClearBufferiv", vec![format!("{:?}", buffer), format!("{:?}", drawbuffer), format!("{:?}", values)]);
}

unsafe extern "system" fn clear_bufferuiv(buffer: GLenum, drawbuffer: GLint, value: *const GLuint) {
    let values = read(value, clear_components(buffer));
    record("glClearBufferuiv", vec![format!("{:?}", buffer), format!("{:?}", drawbuffer), format!("{:?}", values)]);
}

unsafe extern "system" fn fence_sync(condition: GLenum, flags: GLbitfield) -> GLsync {
    record("glFenceSync", vec![format!("{:?}", condition), format!("{:?}", flags)]);
    0x5000 as GLsync
}

unsafe extern "system" fn client_wait_sync(sync: GLsync, flags: GLbitfield, timeout: GLuint64) -> GLenum {
    record("glClientWaitSync", vec![format!("{:?}", sync), format!("{:?}", flags), format!("{:?}", timeout)]);
    WAIT_STATUS.with(|status| status.get())
}

fn custom(name: &str) -> Option<*const c_void> {
    let function = match name {
        "glGetError" => get_error as *const c_void,
        "glGetIntegerv" => get_integerv as *const c_void,
        "glGetString" => get_string as *const c_void,
        "glGenVertexArrays" => gen_vertex_arrays as *const c_void,
        "glGenBuffers" => gen_buffers as *const c_void,
        "glGenFramebuffers" => gen_framebuffers as *const c_void,
        "glGenQueries" => gen_queries as *const c_void,
        "glDeleteVertexArrays" => delete_vertex_arrays as *const c_void,
        "glDeleteBuffers" => delete_buffers as *const c_void,
        "glDeleteFramebuffers" => delete_framebuffers as *const c_void,
        "glDeleteQueries" => delete_queries as *const c_void,
        "glDrawBuffers" => draw_buffers as *const c_void,
        "glInvalidateFramebuffer" => invalidate_framebuffer as *const c_void,
        "glBufferSubData" => buffer_sub_data as *const c_void,
        "glClearBufferfv" => clear_bufferfv as *const c_void,
        "glClearBufferiv" => clear_bufferiv as *const c_void,
        "glClearBufferuiv" => clear_bufferuiv as *const c_void,
        "glFenceSync" => fence_sync as *const c_void,
        "glClientWaitSync" => client_wait_sync as *const c_void,
        _ => return None,
    };
    Some(function)
}

// ============================================================================
// RESOLVERS
// ============================================================================

/// Resolve every entry point the fake implements
pub fn resolve(name: &str) -> *const c_void {
    custom(name).or_else(|| recorded(name)).unwrap_or(std::ptr::null())
}

/// Resolver of a driver lacking the given entry points
pub fn resolver_without(missing: &'static [&'static str]) -> impl FnMut(&str) -> *const c_void {
    move |name| if missing.contains(&name) { std::ptr::null() } else { resolve(name) }
}

/// Entry points behind the optional features
pub const OPTIONAL_ENTRY_POINTS: &[&str] = &[
    "glClearTexSubImage",
    "glCopyImageSubData",
    "glBlendFuncSeparatei",
    "glBlendEquationSeparatei",
    "glColorMaski",
    "glEnablei",
    "glDisablei",
    "glViewportIndexedf",
    "glScissorIndexed",
    "glDepthRangeIndexed",
    "glInvalidateFramebuffer",
    "glMemoryBarrier",
    "glDispatchCompute",
    "glDispatchComputeIndirect",
    "glPatchParameteri",
    "glDepthBoundsEXT",
    "glFenceSync",
    "glClientWaitSync",
    "glDeleteSync",
    "glQueryCounter",
    "glMultiDrawArraysIndirect",
    "glMultiDrawElementsIndirect",
    "glLogicOp",
    "glBindImageTexture",
    "glMinSampleShading",
    "glDrawArraysInstancedBaseInstance",
    "glDrawElementsInstancedBaseVertexBaseInstance",
    "glGetTextureSubImage",
];
