#![allow(dead_code)]
//! GPU test utilities - shared hidden window for the Vulkan integration tests
//!
//! winit allows a single `EventLoop` per process, so the window is created
//! once and the event loop is leaked to keep it valid. Each test builds its
//! own device and surface on that window; tests are `#[serial]` so only one
//! surface exists at a time.

use aurora_3d_engine::aurora3d::config::Config;
use aurora_3d_engine_renderer_vulkan::aurora3d::{VulkanGraphicsDevice, VulkanSurface};
use std::sync::{Arc, OnceLock};
use winit::event_loop::EventLoop;
use winit::window::Window;

#[cfg(target_os = "windows")]
use winit::platform::windows::EventLoopBuilderExtWindows;

static GPU_WINDOW: OnceLock<Window> = OnceLock::new();

/// Hidden 800x600 window shared by every GPU test
pub fn test_window() -> &'static Window {
    GPU_WINDOW.get_or_init(|| {
        let (window, event_loop) = create_test_window();
        std::mem::forget(event_loop);
        window
    })
}

/// Configuration used by the GPU tests
pub fn test_config() -> Config {
    Config {
        app_name: "Aurora3D GPU Tests".to_string(),
        window_size: (800, 600),
        shadow_map_size: 256,
        ..Config::default()
    }
}

/// Fresh device and surface on the shared window
pub fn create_test_device() -> (Arc<VulkanGraphicsDevice>, VulkanSurface) {
    VulkanGraphicsDevice::new(test_window(), &test_config())
        .expect("Failed to create VulkanGraphicsDevice for tests")
}

#[allow(deprecated)]
fn create_test_window() -> (Window, EventLoop<()>) {
    // any_thread is needed on Windows, cargo test does not run on the main thread
    let event_loop = {
        #[cfg(target_os = "windows")]
        {
            EventLoop::builder()
                .with_any_thread(true)
                .build()
                .unwrap()
        }
        #[cfg(not(target_os = "windows"))]
        {
            EventLoop::builder().build().unwrap()
        }
    };

    let window_attrs = Window::default_attributes()
        .with_title("Aurora3D GPU Test Window")
        .with_inner_size(winit::dpi::LogicalSize::new(800, 600))
        .with_visible(false);

    let window = event_loop.create_window(window_attrs).unwrap();
    (window, event_loop)
}
