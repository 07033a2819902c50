//! Swapchain / frame manager

mod headless;
mod swapchain;

pub use headless::{HeadlessSurface, HEADLESS_MAX_EXTENT};
pub use swapchain::{choose_present_mode, FrameState, Swapchain};
