/// Native backend seam: the op vocabulary, the backend trait and the
/// call-recording null backend

pub mod native_op;
pub mod native_backend;
pub mod null_backend;

pub use native_op::*;
pub use native_backend::*;
pub use null_backend::NullBackend;
