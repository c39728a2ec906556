//! Error types for vkshim
//!
//! Creation paths (images, render passes, framebuffers, pipelines, backends) and
//! command-buffer state transitions report failures through [`Error`]. Replay never
//! fails: problems found while executing are sent to the debug report channel.

use std::fmt;

/// Result type for vkshim operations
pub type Result<T> = std::result::Result<T, Error>;

/// vkshim errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Native backend error (GL, D3D11, loader)
    BackendError(String),

    /// Out of device memory
    OutOfMemory,

    /// Invalid resource description (image, buffer, render pass, pipeline)
    InvalidResource(String),

    /// Initialization failed (backend, function table, context)
    InitializationFailed(String),

    /// Operation not allowed in the object's current state
    InvalidState(String),

    /// Framebuffer attachment does not match its render pass declaration
    IncompatibleAttachment(String),

    /// Feature not expressible on the selected backend
    Unsupported(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of device memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::IncompatibleAttachment(msg) => write!(f, "Incompatible attachment: {}", msg),
            Error::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
