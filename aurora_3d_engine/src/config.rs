//! Engine configuration
//!
//! Plain data handed in by the embedding application. Loading it from files or
//! command lines is the application's business.

use crate::error::{Error, Result};
use crate::graphics_device::SampleCount;
use crate::render::DEFAULT_WATER_LEVEL;

/// How a pass records its renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassExecution {
    /// Every renderer records into the primary command buffer, one after another
    Serial,
    /// Every renderer records into its own secondary command buffer on the worker pool
    Parallel,
}

/// Execution mode per pass of the master renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassExecutionConfig {
    pub shadows: PassExecution,
    pub reflection: PassExecution,
    pub refraction: PassExecution,
    pub main: PassExecution,
    pub debug: PassExecution,
}

impl PassExecutionConfig {
    /// Same mode for every pass
    pub fn all(mode: PassExecution) -> Self {
        Self {
            shadows: mode,
            reflection: mode,
            refraction: mode,
            main: mode,
            debug: mode,
        }
    }

    /// True when at least one pass needs secondary command buffers
    pub fn any_parallel(&self) -> bool {
        [self.shadows, self.reflection, self.refraction, self.main, self.debug]
            .contains(&PassExecution::Parallel)
    }
}

impl Default for PassExecutionConfig {
    fn default() -> Self {
        Self::all(PassExecution::Serial)
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Application name (reported to the driver)
    pub app_name: String,

    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),

    /// Start fullscreen
    pub fullscreen: bool,

    /// Window size in pixels
    pub window_size: (u32, u32),

    /// Window position in pixels
    pub window_position: (i32, i32),

    /// Vertical sync (FIFO present mode)
    pub vsync: bool,

    /// MSAA sample count of the main pass
    pub samples: SampleCount,

    /// Requested number of swapchain images
    pub swapchain_image_count: u32,

    /// Upper bound on frames recorded ahead of the GPU
    pub max_frames_in_flight: u32,

    /// Enable validation layers
    pub validation: bool,

    /// Physical device index, -1 picks automatically
    pub gpu_index: i32,

    /// Number of views rendered by the main pass (2 for stereo)
    pub view_count: u32,

    /// Number of shadow cascades
    pub shadow_cascade_count: u32,

    /// Shadow map edge length in texels
    pub shadow_map_size: u32,

    /// Reflection target = viewport / divisor
    pub reflection_divisor: u32,

    /// Refraction target = viewport / divisor
    pub refraction_divisor: u32,

    /// World-space height of the water plane
    pub water_level: f32,

    /// Serial or parallel recording per pass
    pub pass_execution: PassExecutionConfig,

    /// Worker threads for parallel recording, 0 = hardware concurrency
    pub worker_threads: usize,

    /// Run the debug overlay pass
    pub debug_pass: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Aurora3D Application".to_string(),
            app_version: (1, 0, 0),
            fullscreen: false,
            window_size: (1280, 720),
            window_position: (40, 40),
            vsync: true,
            samples: SampleCount::S1,
            swapchain_image_count: 3,
            max_frames_in_flight: 2,
            validation: cfg!(debug_assertions),
            gpu_index: -1,
            view_count: 1,
            shadow_cascade_count: 3,
            shadow_map_size: 2048,
            reflection_divisor: 4,
            refraction_divisor: 3,
            water_level: DEFAULT_WATER_LEVEL,
            pass_execution: PassExecutionConfig::default(),
            worker_threads: 0,
            debug_pass: false,
        }
    }
}

impl Config {
    /// Reject values the engine cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.swapchain_image_count == 0 {
            return Err(Error::InvalidConfig("swapchain_image_count must be > 0".to_string()));
        }
        if self.max_frames_in_flight == 0 {
            return Err(Error::InvalidConfig("max_frames_in_flight must be > 0".to_string()));
        }
        if self.view_count == 0 {
            return Err(Error::InvalidConfig("view_count must be > 0".to_string()));
        }
        if self.shadow_cascade_count == 0 {
            return Err(Error::InvalidConfig("shadow_cascade_count must be > 0".to_string()));
        }
        if self.shadow_map_size == 0 {
            return Err(Error::InvalidConfig("shadow_map_size must be > 0".to_string()));
        }
        if self.reflection_divisor == 0 || self.refraction_divisor == 0 {
            return Err(Error::InvalidConfig("reflection/refraction divisors must be > 0".to_string()));
        }
        if !self.water_level.is_finite() {
            return Err(Error::InvalidConfig(format!("water_level {} is not finite", self.water_level)));
        }
        if self.gpu_index < -1 {
            return Err(Error::InvalidConfig(format!("gpu_index {} (use -1 for auto)", self.gpu_index)));
        }
        Ok(())
    }

    /// Frames in flight actually used for a swapchain of `image_count` images
    pub fn frames_in_flight(&self, image_count: u32) -> u32 {
        self.max_frames_in_flight.min(image_count).max(1)
    }

    /// Worker pool size for parallel recording
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads > 0 {
            self.worker_threads
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
