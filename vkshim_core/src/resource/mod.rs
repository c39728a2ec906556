/// API objects: images, buffers, render passes, framebuffers, pipelines,
/// descriptor sets and query pools
///
/// Every object is immutable after creation and shared through `Arc`. Native
/// handles are supplied by the caller; nothing here allocates device memory.

pub mod handle;
pub mod format;
pub mod image;
pub mod buffer;
pub mod render_pass;
pub mod framebuffer;
pub mod pipeline;
pub mod descriptor_set;
pub mod query_pool;

pub use handle::*;
pub use format::*;
pub use image::*;
pub use buffer::*;
pub use render_pass::*;
pub use framebuffer::*;
pub use pipeline::*;
pub use descriptor_set::*;
pub use query_pool::*;
