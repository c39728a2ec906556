/*!
# vkshim - Direct3D 11 Backend

Direct3D 11 implementation of the vkshim native backend.

The backend turns the op stream produced by `vkshim_core` into calls on an
immediate context. It does not link against D3D11 itself: the device and
context are reached through the [`DeviceContext`] trait, which a windowing
layer implements over `ID3D11Device1` and `ID3D11DeviceContext1`.

Fixed-function state is accumulated into descriptors and bound as cached
state objects before each draw. Framebuffer objects are emulated with render
target and depth-stencil views. Push constants live in a constant buffer at
slot [`PUSH_CONSTANT_SLOT`].

```ignore
use vkshim_core::vkshim::{Context, ContextConfig, DebugReporter};
use vkshim_renderer_d3d11::D3d11Backend;

// `device` implements DeviceContext over the application's D3D11 device
let backend = D3d11Backend::new(device)?;
let context = Context::headless(backend, ContextConfig::default(), &DebugReporter::new());
```
*/

extern crate self as vkshim_renderer_d3d11;

pub mod d3d11_types;
mod d3d11_conversions;
mod d3d11_device;
mod d3d11_sync;
mod d3d11_backend;

#[cfg(test)]
mod recording_device;

pub use d3d11_backend::{D3d11Backend, PUSH_CONSTANT_SIZE, PUSH_CONSTANT_SLOT};
pub use d3d11_device::DeviceContext;
pub use d3d11_sync::D3d11Sync;
