/// GL entry point table
///
/// Entry points are resolved once through a caller-supplied loader
/// (`wglGetProcAddress`, `glXGetProcAddress`, `eglGetProcAddress`...). Required
/// entry points make loading fail when missing; optional ones stay `None` and
/// decide which [`BackendCaps`] the backend reports.

use std::ffi::c_void;
use vkshim_core::backend::BackendCaps;
use vkshim_core::vkshim::{Error, Result};
use crate::gl_types::*;

/// Some platform loaders return small sentinels instead of null for unknown names
fn is_missing(pointer: *const c_void) -> bool {
    matches!(pointer as usize, 0 | 1 | 2 | 3 | usize::MAX)
}

macro_rules! gl_functions {
    (
        required {
            $( $req:ident : $req_name:literal => fn($($req_arg:ty),* $(,)?) $(-> $req_ret:ty)?; )*
        }
        optional {
            $( $opt:ident : $opt_name:literal => fn($($opt_arg:ty),* $(,)?) $(-> $opt_ret:ty)?; )*
        }
    ) => {
        /// Resolved GL entry points
        pub struct GlFunctions {
            $( pub $req: unsafe extern "system" fn($($req_arg),*) $(-> $req_ret)?, )*
            $( pub $opt: Option<unsafe extern "system" fn($($opt_arg),*) $(-> $opt_ret)?>, )*
        }

        impl GlFunctions {
            /// Resolve every entry point through `resolver`
            ///
            /// Fails with [`Error::InitializationFailed`] listing every missing
            /// required entry point.
            pub fn load<F>(mut resolver: F) -> Result<Self>
            where
                F: FnMut(&str) -> *const c_void,
            {
                let mut missing: Vec<&'static str> = Vec::new();
                $(
                    let $req = resolver($req_name);
                    if is_missing($req) {
                        missing.push($req_name);
                    }
                )*
                if !missing.is_empty() {
                    return Err(Error::InitializationFailed(format!(
                        "Missing required GL entry points: {}",
                        missing.join(", ")
                    )));
                }

                Ok(Self {
                    $(
                        // SAFETY: the loader returned the address of this entry point,
                        // whose signature is the one declared in the table.
                        $req: unsafe {
                            std::mem::transmute::<*const c_void, unsafe extern "system" fn($($req_arg),*) $(-> $req_ret)?>($req)
                        },
                    )*
                    $(
                        $opt: {
                            let pointer = resolver($opt_name);
                            if is_missing(pointer) {
                                None
                            } else {
                                // SAFETY: as above.
                                Some(unsafe {
                                    std::mem::transmute::<*const c_void, unsafe extern "system" fn($($opt_arg),*) $(-> $opt_ret)?>(pointer)
                                })
                            }
                        },
                    )*
                })
            }

            /// Names of the optional entry points the driver lacks
            pub fn missing_optional(&self) -> Vec<&'static str> {
                let mut missing = Vec::new();
                $(
                    if self.$opt.is_none() {
                        missing.push($opt_name);
                    }
                )*
                missing
            }
        }
    };
}

gl_functions! {
    required {
        get_error: "glGetError" => fn() -> GLenum;
        get_integerv: "glGetIntegerv" => fn(GLenum, *mut GLint);
        get_string: "glGetString" => fn(GLenum) -> *const GLubyte;
        enable: "glEnable" => fn(GLenum);
        disable: "glDisable" => fn(GLenum);

        blend_func_separate: "glBlendFuncSeparate" => fn(GLenum, GLenum, GLenum, GLenum);
        blend_equation_separate: "glBlendEquationSeparate" => fn(GLenum, GLenum);
        color_mask: "glColorMask" => fn(GLboolean, GLboolean, GLboolean, GLboolean);
        blend_color: "glBlendColor" => fn(GLfloat, GLfloat, GLfloat, GLfloat);

        depth_func: "glDepthFunc" => fn(GLenum);
        depth_mask: "glDepthMask" => fn(GLboolean);
        stencil_op_separate: "glStencilOpSeparate" => fn(GLenum, GLenum, GLenum, GLenum);
        stencil_func_separate: "glStencilFuncSeparate" => fn(GLenum, GLenum, GLint, GLuint);
        stencil_mask_separate: "glStencilMaskSeparate" => fn(GLenum, GLuint);
        sample_maski: "glSampleMaski" => fn(GLuint, GLbitfield);

        viewport: "glViewport" => fn(GLint, GLint, GLsizei, GLsizei);
        depth_range: "glDepthRange" => fn(GLdouble, GLdouble);
        scissor: "glScissor" => fn(GLint, GLint, GLsizei, GLsizei);
        polygon_mode: "glPolygonMode" => fn(GLenum, GLenum);
        cull_face: "glCullFace" => fn(GLenum);
        front_face: "glFrontFace" => fn(GLenum);
        polygon_offset: "glPolygonOffset" => fn(GLfloat, GLfloat);
        line_width: "glLineWidth" => fn(GLfloat);
        primitive_restart_index: "glPrimitiveRestartIndex" => fn(GLuint);

        use_program: "glUseProgram" => fn(GLuint);
        gen_vertex_arrays: "glGenVertexArrays" => fn(GLsizei, *mut GLuint);
        delete_vertex_arrays: "glDeleteVertexArrays" => fn(GLsizei, *const GLuint);
        bind_vertex_array: "glBindVertexArray" => fn(GLuint);
        enable_vertex_attrib_array: "glEnableVertexAttribArray" => fn(GLuint);
        disable_vertex_attrib_array: "glDisableVertexAttribArray" => fn(GLuint);
        vertex_attrib_format: "glVertexAttribFormat" => fn(GLuint, GLint, GLenum, GLboolean, GLuint);
        vertex_attrib_i_format: "glVertexAttribIFormat" => fn(GLuint, GLint, GLenum, GLuint);
        vertex_attrib_binding: "glVertexAttribBinding" => fn(GLuint, GLuint);
        bind_vertex_buffer: "glBindVertexBuffer" => fn(GLuint, GLuint, GLintptr, GLsizei);
        vertex_binding_divisor: "glVertexBindingDivisor" => fn(GLuint, GLuint);

        gen_buffers: "glGenBuffers" => fn(GLsizei, *mut GLuint);
        delete_buffers: "glDeleteBuffers" => fn(GLsizei, *const GLuint);
        bind_buffer: "glBindBuffer" => fn(GLenum, GLuint);
        buffer_data: "glBufferData" => fn(GLenum, GLsizeiptr, *const c_void, GLenum);
        buffer_sub_data: "glBufferSubData" => fn(GLenum, GLintptr, GLsizeiptr, *const c_void);
        bind_buffer_range: "glBindBufferRange" => fn(GLenum, GLuint, GLuint, GLintptr, GLsizeiptr);
        copy_buffer_sub_data: "glCopyBufferSubData" => fn(GLenum, GLenum, GLintptr, GLintptr, GLsizeiptr);

        gen_framebuffers: "glGenFramebuffers" => fn(GLsizei, *mut GLuint);
        delete_framebuffers: "glDeleteFramebuffers" => fn(GLsizei, *const GLuint);
        bind_framebuffer: "glBindFramebuffer" => fn(GLenum, GLuint);
        framebuffer_texture_1d: "glFramebufferTexture1D" => fn(GLenum, GLenum, GLenum, GLuint, GLint);
        framebuffer_texture_2d: "glFramebufferTexture2D" => fn(GLenum, GLenum, GLenum, GLuint, GLint);
        framebuffer_texture_layer: "glFramebufferTextureLayer" => fn(GLenum, GLenum, GLuint, GLint, GLint);
        draw_buffers: "glDrawBuffers" => fn(GLsizei, *const GLenum);
        read_buffer: "glReadBuffer" => fn(GLenum);
        clear_bufferfv: "glClearBufferfv" => fn(GLenum, GLint, *const GLfloat);
        clear_bufferiv: "glClearBufferiv" => fn(GLenum, GLint, *const GLint);
        clear_bufferuiv: "glClearBufferuiv" => fn(GLenum, GLint, *const GLuint);
        clear_bufferfi: "glClearBufferfi" => fn(GLenum, GLint, GLfloat, GLint);
        blit_framebuffer: "glBlitFramebuffer" => fn(GLint, GLint, GLint, GLint, GLint, GLint, GLint, GLint, GLbitfield, GLenum);

        active_texture: "glActiveTexture" => fn(GLenum);
        bind_texture: "glBindTexture" => fn(GLenum, GLuint);
        tex_parameteri: "glTexParameteri" => fn(GLenum, GLenum, GLint);
        bind_sampler: "glBindSampler" => fn(GLuint, GLuint);
        pixel_storei: "glPixelStorei" => fn(GLenum, GLint);
        tex_sub_image_1d: "glTexSubImage1D" => fn(GLenum, GLint, GLint, GLsizei, GLenum, GLenum, *const c_void);
        tex_sub_image_2d: "glTexSubImage2D" => fn(GLenum, GLint, GLint, GLint, GLsizei, GLsizei, GLenum, GLenum, *const c_void);
        tex_sub_image_3d: "glTexSubImage3D" => fn(GLenum, GLint, GLint, GLint, GLint, GLsizei, GLsizei, GLsizei, GLenum, GLenum, *const c_void);
        compressed_tex_sub_image_2d: "glCompressedTexSubImage2D" => fn(GLenum, GLint, GLint, GLint, GLsizei, GLsizei, GLenum, GLsizei, *const c_void);
        compressed_tex_sub_image_3d: "glCompressedTexSubImage3D" => fn(GLenum, GLint, GLint, GLint, GLint, GLsizei, GLsizei, GLsizei, GLenum, GLsizei, *const c_void);
        get_tex_image: "glGetTexImage" => fn(GLenum, GLint, GLenum, GLenum, *mut c_void);

        draw_arrays_instanced: "glDrawArraysInstanced" => fn(GLenum, GLint, GLsizei, GLsizei);
        draw_elements_instanced_base_vertex: "glDrawElementsInstancedBaseVertex" => fn(GLenum, GLsizei, GLenum, *const c_void, GLsizei, GLint);

        gen_queries: "glGenQueries" => fn(GLsizei, *mut GLuint);
        delete_queries: "glDeleteQueries" => fn(GLsizei, *const GLuint);
        begin_query: "glBeginQuery" => fn(GLenum, GLuint);
        end_query: "glEndQuery" => fn(GLenum);

        flush: "glFlush" => fn();
        finish: "glFinish" => fn();
    }
    optional {
        clear_tex_sub_image: "glClearTexSubImage" => fn(GLuint, GLint, GLint, GLint, GLint, GLsizei, GLsizei, GLsizei, GLenum, GLenum, *const c_void);
        copy_image_sub_data: "glCopyImageSubData" => fn(GLuint, GLenum, GLint, GLint, GLint, GLint, GLuint, GLenum, GLint, GLint, GLint, GLint, GLsizei, GLsizei, GLsizei);

        blend_func_separatei: "glBlendFuncSeparatei" => fn(GLuint, GLenum, GLenum, GLenum, GLenum);
        blend_equation_separatei: "glBlendEquationSeparatei" => fn(GLuint, GLenum, GLenum);
        color_maski: "glColorMaski" => fn(GLuint, GLboolean, GLboolean, GLboolean, GLboolean);
        enablei: "glEnablei" => fn(GLenum, GLuint);
        disablei: "glDisablei" => fn(GLenum, GLuint);

        viewport_indexedf: "glViewportIndexedf" => fn(GLuint, GLfloat, GLfloat, GLfloat, GLfloat);
        scissor_indexed: "glScissorIndexed" => fn(GLuint, GLint, GLint, GLsizei, GLsizei);
        depth_range_indexed: "glDepthRangeIndexed" => fn(GLuint, GLdouble, GLdouble);

        invalidate_framebuffer: "glInvalidateFramebuffer" => fn(GLenum, GLsizei, *const GLenum);
        memory_barrier: "glMemoryBarrier" => fn(GLbitfield);
        dispatch_compute: "glDispatchCompute" => fn(GLuint, GLuint, GLuint);
        dispatch_compute_indirect: "glDispatchComputeIndirect" => fn(GLintptr);
        patch_parameteri: "glPatchParameteri" => fn(GLenum, GLint);
        depth_bounds_ext: "glDepthBoundsEXT" => fn(GLdouble, GLdouble);

        fence_sync: "glFenceSync" => fn(GLenum, GLbitfield) -> GLsync;
        client_wait_sync: "glClientWaitSync" => fn(GLsync, GLbitfield, GLuint64) -> GLenum;
        delete_sync: "glDeleteSync" => fn(GLsync);
        query_counter: "glQueryCounter" => fn(GLuint, GLenum);

        multi_draw_arrays_indirect: "glMultiDrawArraysIndirect" => fn(GLenum, *const c_void, GLsizei, GLsizei);
        multi_draw_elements_indirect: "glMultiDrawElementsIndirect" => fn(GLenum, GLenum, *const c_void, GLsizei, GLsizei);
        logic_op: "glLogicOp" => fn(GLenum);

        bind_image_texture: "glBindImageTexture" => fn(GLuint, GLuint, GLint, GLboolean, GLint, GLenum, GLenum);
        min_sample_shading: "glMinSampleShading" => fn(GLfloat);
        draw_arrays_instanced_base_instance: "glDrawArraysInstancedBaseInstance" => fn(GLenum, GLint, GLsizei, GLsizei, GLuint);
        draw_elements_instanced_base_vertex_base_instance: "glDrawElementsInstancedBaseVertexBaseInstance" => fn(GLenum, GLsizei, GLenum, *const c_void, GLsizei, GLint, GLuint);
        get_texture_sub_image: "glGetTextureSubImage" => fn(GLuint, GLint, GLint, GLint, GLint, GLsizei, GLsizei, GLsizei, GLenum, GLenum, GLsizei, *mut c_void);
    }
}

impl GlFunctions {
    /// Optional features available with the resolved entry points
    pub fn capabilities(&self) -> BackendCaps {
        let mut caps = BackendCaps::FRAMEBUFFER_SRGB;
        caps.set(BackendCaps::CLEAR_TEX_IMAGE, self.clear_tex_sub_image.is_some());
        caps.set(BackendCaps::COPY_IMAGE, self.copy_image_sub_data.is_some());
        caps.set(
            BackendCaps::INDEXED_BLEND,
            self.blend_func_separatei.is_some()
                && self.blend_equation_separatei.is_some()
                && self.color_maski.is_some()
                && self.enablei.is_some()
                && self.disablei.is_some(),
        );
        caps.set(
            BackendCaps::VIEWPORT_ARRAY,
            self.viewport_indexedf.is_some() && self.scissor_indexed.is_some() && self.depth_range_indexed.is_some(),
        );
        caps.set(BackendCaps::INVALIDATE_FRAMEBUFFER, self.invalidate_framebuffer.is_some());
        caps.set(BackendCaps::MEMORY_BARRIER, self.memory_barrier.is_some());
        caps.set(
            BackendCaps::COMPUTE,
            self.dispatch_compute.is_some() && self.dispatch_compute_indirect.is_some(),
        );
        caps.set(BackendCaps::TESSELLATION, self.patch_parameteri.is_some());
        caps.set(BackendCaps::DEPTH_BOUNDS, self.depth_bounds_ext.is_some());
        caps.set(
            BackendCaps::FENCE_SYNC,
            self.fence_sync.is_some() && self.client_wait_sync.is_some() && self.delete_sync.is_some(),
        );
        caps.set(BackendCaps::TIMESTAMP_QUERY, self.query_counter.is_some());
        caps.set(
            BackendCaps::DRAW_INDIRECT,
            self.multi_draw_arrays_indirect.is_some() && self.multi_draw_elements_indirect.is_some(),
        );
        caps.set(BackendCaps::LOGIC_OP, self.logic_op.is_some());
        caps
    }

    /// `glGetString` as an owned string; empty when the driver returns null
    pub fn string(&self, name: GLenum) -> String {
        // SAFETY: glGetString returns null or a static NUL-terminated string.
        unsafe {
            let pointer = (self.get_string)(name);
            if pointer.is_null() {
                String::new()
            } else {
                std::ffi::CStr::from_ptr(pointer.cast()).to_string_lossy().into_owned()
            }
        }
    }

    /// `glGetIntegerv` for a single value
    pub fn integer(&self, name: GLenum) -> GLint {
        let mut value: GLint = 0;
        // SAFETY: single-valued query into a local.
        unsafe { (self.get_integerv)(name, &mut value) };
        value
    }
}

#[cfg(test)]
#[path = "gl_functions_tests.rs"]
mod tests;
