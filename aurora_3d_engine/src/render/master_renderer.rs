/// MasterRenderer - records every pass of a frame into the frame's primary
/// command buffer.
///
/// Frame order:
///
/// ```text
/// shadows (one pass per cascade) -> reflection -> refraction -> main -> debug
/// ```
///
/// Shadows, reflection and refraction render into offscreen targets owned
/// here. Main renders into the framebuffer of the frame context. Debug, when
/// enabled, reuses the main render pass on the top-left quarter of the same
/// framebuffer.
///
/// Renderers are initialised pass by pass in the order main, debug, shadows,
/// reflection, refraction and shut down in reverse.

use std::sync::Arc;
use glam::{Vec2, Vec3, Vec4};
use rayon::{ThreadPool, ThreadPoolBuilder};
use crate::camera::Camera;
use crate::config::{Config, PassExecution};
use crate::device::QueueType;
use crate::error::{Error, Result};
use crate::graphics_device::{
    CommandBuffer, CommandBufferLevel, Extent2D, GraphicsDevice, Rect2D, RenderPass, TextureFormat,
};
use crate::scene::Scene;
use crate::{engine_debug, engine_info, engine_warn};
use super::command_buffers_group::CommandBuffersGroup;
use super::offscreen::OffscreenTarget;
use super::render_context::{NormalRenderContext, RenderContext, ShadowsRenderContext};
use super::renderer::{init_all, shut_down_all, RendererSet};
use super::scene_pass::{record_scene_pass, Recording};
use super::shadows::ShadowMaps;
use super::water::{reflection_camera, reflection_clip_plane, refraction_clip_plane, DEFAULT_CLIP_PLANE};

const LOG_SOURCE: &str = "aurora3d::MasterRenderer";

/// Label colors, one per pass kind
const LABEL_SHADOWS: [f32; 4] = [0.2, 0.2, 0.2, 1.0];
const LABEL_WATER: [f32; 4] = [0.2, 0.4, 0.8, 1.0];
const LABEL_MAIN: [f32; 4] = [0.2, 0.8, 0.2, 1.0];
const LABEL_DEBUG: [f32; 4] = [0.8, 0.2, 0.8, 1.0];

/// Passes of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    Shadows,
    Reflection,
    Refraction,
    Main,
    Debug,
}

impl PassKind {
    /// Recording order within a frame
    pub const FRAME_ORDER: [PassKind; 5] = [
        PassKind::Shadows,
        PassKind::Reflection,
        PassKind::Refraction,
        PassKind::Main,
        PassKind::Debug,
    ];

    /// Renderer initialisation order; shutdown runs it backwards
    pub const INIT_ORDER: [PassKind; 5] = [
        PassKind::Main,
        PassKind::Debug,
        PassKind::Shadows,
        PassKind::Reflection,
        PassKind::Refraction,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PassKind::Shadows => "Shadows",
            PassKind::Reflection => "Reflection",
            PassKind::Refraction => "Refraction",
            PassKind::Main => "Main",
            PassKind::Debug => "Debug",
        }
    }

    /// Configured execution mode of this pass
    pub fn execution(&self, config: &Config) -> PassExecution {
        let modes = &config.pass_execution;
        match self {
            PassKind::Shadows => modes.shadows,
            PassKind::Reflection => modes.reflection,
            PassKind::Refraction => modes.refraction,
            PassKind::Main => modes.main,
            PassKind::Debug => modes.debug,
        }
    }
}

/// Secondary command buffers of the parallel passes
#[derive(Default)]
struct PassGroups {
    /// One group per cascade
    shadows: Vec<CommandBuffersGroup>,
    reflection: Option<CommandBuffersGroup>,
    refraction: Option<CommandBuffersGroup>,
    main: Option<CommandBuffersGroup>,
    debug: Option<CommandBuffersGroup>,
}

/// Offscreen targets of the frame
struct PassTargets {
    shadows: ShadowMaps,
    reflection: OffscreenTarget,
    refraction: OffscreenTarget,
}

pub struct MasterRenderer {
    device: Arc<dyn GraphicsDevice>,
    config: Config,
    main_render_pass: Arc<dyn RenderPass>,
    /// Rows of every command-buffers group, one per frame slot
    frames_in_flight: usize,
    extent: Extent2D,
    renderers: RendererSet,
    targets: Option<PassTargets>,
    groups: PassGroups,
    pool: Option<ThreadPool>,
}

impl MasterRenderer {
    /// Create the offscreen targets and initialise every renderer
    ///
    /// `main_render_pass` is the render pass of the frame framebuffers
    /// (usually the swapchain's); `image_count` is the swapchain image count,
    /// from which the number of frame slots (and so of per-frame command
    /// buffer rows) follows. `extent` is the viewport.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        main_render_pass: Arc<dyn RenderPass>,
        config: &Config,
        renderers: RendererSet,
        image_count: u32,
        extent: Extent2D,
    ) -> Result<Self> {
        config.validate()?;

        let pool = if config.pass_execution.any_parallel() {
            let threads = config.resolved_worker_threads();
            let pool = ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|index| format!("aurora3d-record-{}", index))
                .build()
                .map_err(|e| Error::InitializationFailed(format!("recording thread pool: {}", e)))?;
            engine_debug!(LOG_SOURCE, "Recording pool started with {} threads", threads);
            Some(pool)
        } else {
            None
        };

        let mut renderer = Self {
            device,
            config: config.clone(),
            main_render_pass,
            frames_in_flight: config.frames_in_flight(image_count) as usize,
            extent,
            renderers,
            targets: None,
            groups: PassGroups::default(),
            pool,
        };
        renderer.init()?;
        Ok(renderer)
    }

    // ===== ACCESSORS =====

    pub fn is_initialized(&self) -> bool {
        self.targets.is_some()
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    /// Frame slots the parallel-pass buffers are sized for
    pub fn frames_in_flight(&self) -> usize {
        self.frames_in_flight
    }

    pub fn renderers(&self) -> &RendererSet {
        &self.renderers
    }

    pub fn shadow_maps(&self) -> Result<&ShadowMaps> {
        Ok(&self.targets()?.shadows)
    }

    pub fn reflection_target(&self) -> Result<&OffscreenTarget> {
        Ok(&self.targets()?.reflection)
    }

    pub fn refraction_target(&self) -> Result<&OffscreenTarget> {
        Ok(&self.targets()?.refraction)
    }

    fn targets(&self) -> Result<&PassTargets> {
        self.targets
            .as_ref()
            .ok_or_else(|| Error::InvalidFrameState("master renderer is shut down".to_string()))
    }

    // ===== LIFECYCLE =====

    /// Create targets, initialise renderers, allocate parallel-pass buffers
    pub fn init(&mut self) -> Result<()> {
        if self.targets.is_some() {
            return Ok(());
        }

        let desc = self.main_render_pass.desc();
        let depth_format = desc.depth_format().unwrap_or(TextureFormat::D32_FLOAT);
        let color_format = desc
            .render_color_formats()
            .first()
            .copied()
            .unwrap_or(TextureFormat::R8G8B8A8_UNORM);

        let targets = PassTargets {
            shadows: ShadowMaps::new(
                self.device.clone(),
                depth_format,
                self.config.shadow_cascade_count,
                self.config.shadow_map_size,
            )?,
            reflection: OffscreenTarget::new(
                self.device.clone(),
                &[color_format],
                Some(depth_format),
                self.extent.divided(self.config.reflection_divisor),
            )?,
            refraction: OffscreenTarget::new(
                self.device.clone(),
                &[color_format],
                Some(depth_format),
                self.extent.divided(self.config.refraction_divisor),
            )?,
        };

        for (done, kind) in PassKind::INIT_ORDER.iter().enumerate() {
            if let Err(e) = self.init_pass(*kind, &targets) {
                for kind in PassKind::INIT_ORDER[..done].iter().rev() {
                    self.shut_down_pass(*kind);
                }
                return Err(e);
            }
        }

        if let Err(e) = self.create_groups() {
            self.groups = PassGroups::default();
            for kind in PassKind::INIT_ORDER.iter().rev() {
                self.shut_down_pass(*kind);
            }
            return Err(e);
        }

        self.targets = Some(targets);
        engine_info!(
            LOG_SOURCE,
            "Initialized {} renderers, {} shadow cascades, viewport {}x{}",
            self.renderers.len(),
            self.config.shadow_cascade_count,
            self.extent.width,
            self.extent.height
        );
        Ok(())
    }

    fn init_pass(&mut self, kind: PassKind, targets: &PassTargets) -> Result<()> {
        let device = &self.device;
        match kind {
            PassKind::Main => init_all(&mut self.renderers.main, device, &self.main_render_pass),
            PassKind::Debug => init_all(&mut self.renderers.debug, device, &self.main_render_pass),
            PassKind::Shadows => {
                init_all(&mut self.renderers.shadows, device, targets.shadows.render_pass())
            }
            PassKind::Reflection => {
                init_all(&mut self.renderers.reflection, device, targets.reflection.render_pass())
            }
            PassKind::Refraction => {
                init_all(&mut self.renderers.refraction, device, targets.refraction.render_pass())
            }
        }
    }

    fn shut_down_pass(&mut self, kind: PassKind) {
        match kind {
            PassKind::Main => shut_down_all(&mut self.renderers.main),
            PassKind::Debug => shut_down_all(&mut self.renderers.debug),
            PassKind::Shadows => shut_down_all(&mut self.renderers.shadows),
            PassKind::Reflection => shut_down_all(&mut self.renderers.reflection),
            PassKind::Refraction => shut_down_all(&mut self.renderers.refraction),
        }
    }

    fn create_groups(&mut self) -> Result<()> {
        let family = self.device.queue_family(QueueType::Graphics)?;
        let parallel = |kind: PassKind| kind.execution(&self.config) == PassExecution::Parallel;
        let group = |count: usize| {
            CommandBuffersGroup::new(
                self.device.clone(),
                family,
                self.frames_in_flight,
                count,
                CommandBufferLevel::Secondary,
            )
        };

        let mut groups = PassGroups::default();
        if parallel(PassKind::Shadows) {
            for _ in 0..self.config.shadow_cascade_count {
                groups.shadows.push(group(self.renderers.shadows.len())?);
            }
        }
        if parallel(PassKind::Reflection) {
            groups.reflection = Some(group(self.renderers.reflection.len())?);
        }
        if parallel(PassKind::Refraction) {
            groups.refraction = Some(group(self.renderers.refraction.len())?);
        }
        if parallel(PassKind::Main) {
            groups.main = Some(group(self.renderers.main.len())?);
        }
        if parallel(PassKind::Debug) && self.config.debug_pass {
            groups.debug = Some(group(self.renderers.debug.len())?);
        }
        self.groups = groups;
        Ok(())
    }

    /// Release parallel-pass buffers, shut renderers down, drop targets
    pub fn shut_down(&mut self) {
        if self.targets.is_none() {
            return;
        }
        if let Err(e) = self.device.wait_idle() {
            engine_warn!(LOG_SOURCE, "wait_idle before shutdown failed: {}", e);
        }
        self.groups = PassGroups::default();
        for kind in PassKind::INIT_ORDER.iter().rev() {
            self.shut_down_pass(*kind);
        }
        self.targets = None;
        engine_debug!(LOG_SOURCE, "Shut down");
    }

    /// Shut everything down and initialise again (shader hot reload)
    pub fn reinit(&mut self) -> Result<()> {
        self.device.wait_idle()?;
        self.shut_down();
        self.init()
    }

    /// Follow a viewport resize; offscreen targets are resized by their divisor
    ///
    /// Returns false when the extent is unchanged or empty.
    pub fn resize(&mut self, extent: Extent2D) -> Result<bool> {
        if extent.is_empty() || extent == self.extent {
            return Ok(false);
        }
        self.extent = extent;
        if let Some(targets) = self.targets.as_mut() {
            targets.reflection.resize(extent.divided(self.config.reflection_divisor))?;
            targets.refraction.resize(extent.divided(self.config.refraction_divisor))?;
        }
        Ok(true)
    }

    // ===== FRAME =====

    /// Record all passes of one frame into `cmd`
    ///
    /// `ctx` is the frame context from the swapchain; `views` holds one
    /// camera per view (`view_count` of them). Shadow cascades follow the
    /// first view. `light_direction` points from the light into the scene.
    pub fn render(
        &mut self,
        cmd: &mut dyn CommandBuffer,
        ctx: &RenderContext,
        scene: &dyn Scene,
        views: &[Camera],
        light_direction: Vec3,
    ) -> Result<()> {
        if views.len() != self.config.view_count as usize {
            return Err(Error::InvalidConfig(format!(
                "{} cameras for {} views",
                views.len(),
                self.config.view_count
            )));
        }
        let targets = self
            .targets
            .as_ref()
            .ok_or_else(|| Error::InvalidFrameState("render after shut_down".to_string()))?;
        let pool = self.pool.as_ref();
        let extent = ctx.rect.extent();

        // Shadows
        let cascades = targets.shadows.cascades_for(&views[0], extent.width, extent.height, light_direction);
        for (index, cascade) in cascades.iter().enumerate() {
            let target = targets.shadows.target(index)?;
            let shadow_ctx = ShadowsRenderContext {
                base: ctx.retarget(target.framebuffer().clone(), target.rect()),
                view_matrix: cascade.view_matrix,
                projection_matrix: cascade.projection_matrix,
                cascade_index: index as u32,
                frustum: cascade.frustum(),
            };
            cmd.begin_label(&format!("Shadows cascade {}", index), LABEL_SHADOWS);
            record_scene_pass(
                cmd,
                targets.shadows.render_pass(),
                &shadow_ctx,
                scene,
                &mut self.renderers.shadows,
                recording(self.groups.shadows.get_mut(index), pool),
            )?;
            cmd.end_label();
        }

        // Reflection
        let reflected: Vec<Camera> = views
            .iter()
            .map(|view| reflection_camera(view, self.config.water_level))
            .collect();
        let target = &targets.reflection;
        let reflection_ctx = normal_context(
            ctx.retarget(target.framebuffer().clone(), target.rect()),
            &reflected,
            target.extent(),
            reflection_clip_plane(self.config.water_level),
        );
        cmd.begin_label(PassKind::Reflection.name(), LABEL_WATER);
        record_scene_pass(
            cmd,
            target.render_pass(),
            &reflection_ctx,
            scene,
            &mut self.renderers.reflection,
            recording(self.groups.reflection.as_mut(), pool),
        )?;
        cmd.end_label();

        // Refraction
        let target = &targets.refraction;
        let refraction_ctx = normal_context(
            ctx.retarget(target.framebuffer().clone(), target.rect()),
            views,
            target.extent(),
            refraction_clip_plane(self.config.water_level),
        );
        cmd.begin_label(PassKind::Refraction.name(), LABEL_WATER);
        record_scene_pass(
            cmd,
            target.render_pass(),
            &refraction_ctx,
            scene,
            &mut self.renderers.refraction,
            recording(self.groups.refraction.as_mut(), pool),
        )?;
        cmd.end_label();

        // Main
        let main_ctx = normal_context(ctx.clone(), views, extent, DEFAULT_CLIP_PLANE);
        cmd.begin_label(PassKind::Main.name(), LABEL_MAIN);
        record_scene_pass(
            cmd,
            &self.main_render_pass,
            &main_ctx,
            scene,
            &mut self.renderers.main,
            recording(self.groups.main.as_mut(), pool),
        )?;
        cmd.end_label();

        // Debug overlay
        if self.config.debug_pass {
            let rect = Rect2D {
                x: 0,
                y: 0,
                width: (extent.width / 2).max(1),
                height: (extent.height / 2).max(1),
            };
            let debug_ctx = ctx.retarget(ctx.framebuffer.clone(), rect);
            cmd.begin_label(PassKind::Debug.name(), LABEL_DEBUG);
            record_scene_pass(
                cmd,
                &self.main_render_pass,
                &debug_ctx,
                scene,
                &mut self.renderers.debug,
                recording(self.groups.debug.as_mut(), pool),
            )?;
            cmd.end_label();
        }

        Ok(())
    }
}

impl Drop for MasterRenderer {
    fn drop(&mut self) {
        self.shut_down();
    }
}

/// Parallel when the pass has a group (and a pool), serial otherwise
fn recording<'a>(group: Option<&'a mut CommandBuffersGroup>, pool: Option<&'a ThreadPool>) -> Recording<'a> {
    match (group, pool) {
        (Some(group), Some(pool)) => Recording::Parallel { group, pool },
        _ => Recording::Serial,
    }
}

/// Context of a lit pass seen through `cameras` on an `extent` target
fn normal_context(
    base: RenderContext,
    cameras: &[Camera],
    extent: Extent2D,
    clip_plane: Vec4,
) -> NormalRenderContext {
    let (vertical_fov, near_far) = cameras
        .first()
        .map(|camera| (camera.vertical_fov(), Vec2::new(camera.near(), camera.far())))
        .unwrap_or_default();

    NormalRenderContext {
        base,
        view_matrices: cameras.iter().map(Camera::view_matrix).collect(),
        projection_matrices: cameras
            .iter()
            .map(|camera| camera.projection_matrix(extent.width, extent.height))
            .collect(),
        camera_positions: cameras.iter().map(Camera::position).collect(),
        clip_plane,
        vertical_fov,
        near_far,
        frusta: cameras
            .iter()
            .map(|camera| camera.frustum(extent.width, extent.height))
            .collect(),
    }
}

#[cfg(test)]
#[path = "master_renderer_tests.rs"]
mod tests;
