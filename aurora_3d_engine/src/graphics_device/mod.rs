/// Graphics device module - GPU abstraction traits and value types

pub mod graphics_device;
pub mod types;
pub mod command_buffer;
pub mod render_pass;
pub mod frame_buffer;
pub mod image;
pub mod sync;
pub mod surface;

pub use graphics_device::*;
pub use types::*;
pub use command_buffer::*;
pub use render_pass::*;
pub use frame_buffer::*;
pub use image::*;
pub use sync::*;
pub use surface::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
