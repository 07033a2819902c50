//! Error types for the Aurora3D engine
//!
//! Errors fall into four groups: device selection, construction of render
//! passes / swapchains from inconsistent input, transient presentation
//! staleness (handled inside the frame manager), and fatal GPU failures.
//! Precondition violations in accessors get their own named variants so they
//! can be told apart from GPU-level failures.

use std::fmt;

/// Result type for Aurora3D engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Aurora3D engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (Vulkan call failed, device lost, ...)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (image, framebuffer, command buffer, ...)
    InvalidResource(String),

    /// Initialization failed (instance, device, allocator, ...)
    InitializationFailed(String),

    /// No physical device satisfies the required queue capability set
    NoSuitableDevice(String),

    /// Render pass description is inconsistent (bad index, resolve pairing, no subpass)
    InvalidRenderPass(String),

    /// Configuration value out of its accepted range
    InvalidConfig(String),

    /// Presentation surface is stale and the swapchain must be rebuilt
    SurfaceOutOfDate,

    /// Command buffers group accessed with an out-of-range outer index
    InvalidGroupIndex {
        index: usize,
        count: usize,
    },

    /// Depth buffer requested before the swapchain created one
    MissingDepthBuffer,

    /// Frame operation called in the wrong state (e.g. end_frame without begin_frame)
    InvalidFrameState(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::NoSuitableDevice(msg) => write!(f, "No suitable device: {}", msg),
            Error::InvalidRenderPass(msg) => write!(f, "Invalid render pass: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid config: {}", msg),
            Error::SurfaceOutOfDate => write!(f, "Presentation surface out of date"),
            Error::InvalidGroupIndex { index, count } => {
                write!(f, "Invalid command buffers group index {} (count: {})", index, count)
            }
            Error::MissingDepthBuffer => write!(f, "Depth buffer not created"),
            Error::InvalidFrameState(msg) => write!(f, "Invalid frame state: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// True for errors the frame manager recovers from by rebuilding the swapchain
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::SurfaceOutOfDate)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
