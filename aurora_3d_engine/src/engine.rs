/// Aurora3D Engine - owner of the device, the swapchain and the master renderer
///
/// Everything that needs the GPU receives the device explicitly at
/// construction; there is no global device or allocator. The only process
/// wide state is the logger behind `Engine::log`.

use std::sync::{Arc, OnceLock, RwLock};
use std::time::SystemTime;
use glam::Vec3;
use crate::camera::Camera;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::device::{find_surface_format, DEFAULT_DEPTH_FORMATS, DEFAULT_SURFACE_FORMATS};
use crate::graphics_device::{Extent2D, GraphicsDevice, PresentationSurface};
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use crate::render::{MasterRenderer, RendererSet};
use crate::render_pass::{headless_main_pass, main_pass};
use crate::scene::Scene;
use crate::swapchain::{HeadlessSurface, Swapchain};

const LOG_SOURCE: &str = "aurora3d::Engine";

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Engine instance driving one window, or offscreen images when headless
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use aurora_3d_engine::aurora3d::{Engine, config::Config, render::RendererSet, scene::SceneGraph};
/// use aurora_3d_engine::aurora3d::camera::Camera;
/// use aurora_3d_engine::glam::Vec3;
/// # fn backend() -> (Arc<dyn aurora_3d_engine::aurora3d::graphics_device::GraphicsDevice>,
/// #     Box<dyn aurora_3d_engine::aurora3d::graphics_device::PresentationSurface>) { unimplemented!() }
///
/// let (device, surface) = backend();
/// let mut engine = Engine::new(device, surface, Config::default(), RendererSet::new())?;
/// let scene = SceneGraph::empty();
/// engine.render_frame(&scene, &[Camera::default()], Vec3::new(-1.0, -1.0, 0.0))?;
/// # Ok::<(), aurora_3d_engine::aurora3d::Error>(())
/// ```
pub struct Engine {
    // Declaration order is drop order: renderer, then swapchain, then device
    master_renderer: MasterRenderer,
    swapchain: Swapchain,
    device: Arc<dyn GraphicsDevice>,
    config: Config,
}

impl Engine {
    /// Log an error on its way out (internal use)
    fn log_and_return_error(error: Error) -> Error {
        match &error {
            Error::InitializationFailed(msg) => {
                crate::engine_error!(LOG_SOURCE, "Initialization failed: {}", msg);
            }
            Error::BackendError(msg) => {
                crate::engine_error!(LOG_SOURCE, "Backend error: {}", msg);
            }
            _ => {
                crate::engine_error!(LOG_SOURCE, "Engine error: {}", error);
            }
        }
        error
    }

    /// Build the main render pass, the swapchain and the master renderer
    ///
    /// The presentable format is the first of `DEFAULT_SURFACE_FORMATS` the
    /// surface supports (else its first format); depth likewise from
    /// `DEFAULT_DEPTH_FORMATS`.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        surface: Box<dyn PresentationSurface>,
        config: Config,
        renderers: RendererSet,
    ) -> Result<Self> {
        Self::build(device, surface, config, renderers).map_err(Self::log_and_return_error)
    }

    /// Same as `new` with a `HeadlessSurface`: frames render into offscreen
    /// images of `config.window_size`, nothing is presented
    ///
    /// `device` may have been created without a PRESENT queue.
    pub fn new_headless(device: Arc<dyn GraphicsDevice>, config: Config, renderers: RendererSet) -> Result<Self> {
        let surface = Box::new(HeadlessSurface::new(device.clone()));
        Self::new(device, surface, config, renderers)
    }

    fn build(
        device: Arc<dyn GraphicsDevice>,
        surface: Box<dyn PresentationSurface>,
        config: Config,
        renderers: RendererSet,
    ) -> Result<Self> {
        config.validate()?;

        let color_format = find_surface_format(&surface.supported_formats()?, &DEFAULT_SURFACE_FORMATS)
            .ok_or_else(|| Error::InitializationFailed("surface reports no format".to_string()))?;
        let depth_format = device.physical_device().find_depth_format(&DEFAULT_DEPTH_FORMATS);

        let headless = surface.is_headless();
        let pass = if headless {
            headless_main_pass(color_format, depth_format, config.samples)
        } else {
            main_pass(color_format, depth_format, config.samples)
        };
        let render_pass = pass.create(device.as_ref())?;
        let (width, height) = config.window_size;
        let swapchain = Swapchain::new(
            device.clone(),
            surface,
            render_pass.clone(),
            &config,
            Extent2D::new(width, height),
        )?;
        let master_renderer = MasterRenderer::new(
            device.clone(),
            render_pass,
            &config,
            renderers,
            swapchain.image_count(),
            swapchain.extent(),
        )?;

        crate::engine_info!(
            LOG_SOURCE,
            "'{}' running {}on {} ({:?} / {:?}, {:?})",
            config.app_name,
            if headless { "headless " } else { "" },
            device.physical_device().name,
            color_format,
            depth_format,
            config.samples
        );

        Ok(Self { master_renderer, swapchain, device, config })
    }

    // ===== ACCESSORS =====

    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    pub fn master_renderer(&self) -> &MasterRenderer {
        &self.master_renderer
    }

    // ===== FRAME LOOP =====

    /// Record, submit and present one frame
    ///
    /// Returns false when the frame was skipped (swapchain rebuilt or window
    /// minimized). Any error is fatal for the run.
    pub fn render_frame(&mut self, scene: &dyn Scene, views: &[Camera], light_direction: Vec3) -> Result<bool> {
        self.record_and_present(scene, views, light_direction)
            .map_err(Self::log_and_return_error)
    }

    fn record_and_present(&mut self, scene: &dyn Scene, views: &[Camera], light_direction: Vec3) -> Result<bool> {
        let Some(ctx) = self.swapchain.begin_frame()? else {
            return Ok(false);
        };
        // The swapchain may have been rebuilt at a new size since last frame
        self.master_renderer.resize(self.swapchain.extent())?;

        let cmd = self.swapchain.command_buffer()?;
        self.master_renderer.render(cmd, &ctx, scene, views, light_direction)?;
        self.swapchain.end_frame()?;
        Ok(true)
    }

    /// Follow a window resize
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if self.swapchain.update_extent(width, height)? {
            self.master_renderer.resize(self.swapchain.extent())?;
        }
        Ok(())
    }

    /// Re-create every renderer (shader hot reload)
    pub fn reinit_renderers(&mut self) -> Result<()> {
        crate::engine_info!(LOG_SOURCE, "Reinitializing renderers");
        self.master_renderer.reinit()
    }

    // ===== LOGGING API =====

    /// Set a custom logger
    ///
    /// Replace the default logger with a custom implementation (file logger, network logger, etc.)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use aurora_3d_engine::aurora3d::{Engine, log::{Logger, LogEntry}};
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Log without location (engine_trace! .. engine_warn!)
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: None,
            line: None,
        });
    }

    /// Log with file:line (engine_error!)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: Some(file),
            line: Some(line),
        });
    }

    fn dispatch(entry: LogEntry) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&entry);
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
