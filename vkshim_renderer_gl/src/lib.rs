/*!
# vkshim - OpenGL Backend

OpenGL 4.3+ implementation of the vkshim native backend.

The backend executes the op stream produced by `vkshim_core` with GL calls on
the context that is current on the calling thread. Entry points are resolved
through a caller-supplied loader, so the crate links against no GL library and
works with any windowing layer (WGL, GLX, EGL).

Render pass emulation uses framebuffer objects created on demand. Push
constants live in a uniform buffer at the last uniform binding point, see
[`GlBackend::push_constant_binding`].

```no_run
use vkshim_core::vkshim::{Context, ContextConfig, DebugReporter};
use vkshim_renderer_gl::GlBackend;

# fn get_proc_address(_: &str) -> *const std::ffi::c_void { std::ptr::null() }
// With the GL context current on this thread
let backend = GlBackend::load(get_proc_address)?;
backend.report().print();
let context = Context::headless(backend, ContextConfig::default(), &DebugReporter::new());
# Ok::<(), vkshim_core::vkshim::Error>(())
```
*/

pub mod gl_types;
mod gl_functions;
mod gl_conversions;
mod gl_debug;
mod gl_sync;
mod gl_backend;

#[cfg(test)]
mod fake_gl;

pub use gl_backend::{GlBackend, PUSH_CONSTANT_SIZE, SCRATCH_TEXTURE_UNIT};
pub use gl_debug::CapabilityReport;
pub use gl_functions::GlFunctions;
pub use gl_sync::GlSync;
