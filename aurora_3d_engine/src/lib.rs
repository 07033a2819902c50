/*!
# Aurora 3D Engine

Core of the Aurora3D rendering engine: device selection, render pass
construction, the swapchain/frame manager and the multi-pass master renderer.

This crate is backend-agnostic. GPU work goes through the `GraphicsDevice` and
`PresentationSurface` traits; the Vulkan backend lives in
`aurora_3d_engine_renderer_vulkan`.

## Architecture

- **GraphicsDevice**: factory for command pools, render passes, framebuffers,
  attachment images and sync objects, plus queue submission
- **Swapchain**: presentable images, per-frame sync and the frame lifecycle
- **MasterRenderer**: shadows, reflection, refraction, main and debug passes,
  each recorded serially or in parallel through secondary command buffers
- **Renderer**: application plugin drawing scene nodes inside one pass
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod camera;
pub mod config;
pub mod device;
pub mod graphics_device;
pub mod render;
pub mod render_pass;
pub mod scene;
pub mod swapchain;

// Main aurora3d namespace module
pub mod aurora3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine (device + swapchain + master renderer owner, logging API)
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod config {
        pub use crate::config::*;
    }

    pub mod device {
        pub use crate::device::*;
    }

    pub mod graphics_device {
        pub use crate::graphics_device::*;
    }

    pub mod render {
        pub use crate::render::*;
    }

    pub mod render_pass {
        pub use crate::render_pass::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }

    pub mod swapchain {
        pub use crate::swapchain::*;
    }
}

// Re-export math library at crate root
pub use glam;
