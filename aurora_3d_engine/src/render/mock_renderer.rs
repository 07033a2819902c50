/// Recording renderer for unit tests
///
/// Draws every node whose name starts with "mesh" and logs each callback
/// into a shared event list.

use std::sync::{Arc, Mutex};
use crate::error::{Error, Result};
use crate::graphics_device::{CommandBuffer, GraphicsDevice, RenderPass};
use crate::scene::SceneNode;
use super::render_context::PassContext;
use super::renderer::Renderer;

pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub struct MockRenderer {
    name: String,
    events: EventLog,
    vertex_count: u32,
    drawn: u32,
    /// Node name that makes `render` fail
    pub fail_on: Option<String>,
    /// Makes `init` fail
    pub fail_init: bool,
}

impl MockRenderer {
    pub fn new(name: &str, vertex_count: u32, events: &EventLog) -> Self {
        Self {
            name: name.to_string(),
            events: events.clone(),
            vertex_count,
            drawn: 0,
            fail_on: None,
            fail_init: false,
        }
    }

    fn log(&self, event: &str) {
        self.events.lock().unwrap().push(format!("{} {}", event, self.name));
    }
}

impl<C: PassContext> Renderer<C> for MockRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, _device: &Arc<dyn GraphicsDevice>, _render_pass: &Arc<dyn RenderPass>) -> Result<()> {
        self.log("init");
        if self.fail_init {
            return Err(Error::InitializationFailed(format!("{} init", self.name)));
        }
        Ok(())
    }

    fn before_render(&mut self, _cmd: &mut dyn CommandBuffer, _ctx: &C) -> Result<()> {
        self.log("before");
        Ok(())
    }

    fn pre_render(&mut self, cmd: &mut dyn CommandBuffer, ctx: &C) -> Result<()> {
        self.log("pre");
        self.drawn = 0;
        cmd.set_viewport(ctx.base().rect.into())?;
        cmd.set_scissor(ctx.base().rect)
    }

    fn render(&mut self, cmd: &mut dyn CommandBuffer, _ctx: &C, node: &dyn SceneNode) -> Result<()> {
        if self.fail_on.as_deref() == Some(node.name()) {
            return Err(Error::BackendError(format!("{} failed on {}", self.name, node.name())));
        }
        if !node.name().starts_with("mesh") {
            return Ok(());
        }
        self.events
            .lock()
            .unwrap()
            .push(format!("render {} {}", self.name, node.name()));
        cmd.draw(self.vertex_count, self.drawn)?;
        self.drawn += 1;
        Ok(())
    }

    fn post_render(&mut self, _cmd: &mut dyn CommandBuffer, _ctx: &C) -> Result<()> {
        self.log("post");
        Ok(())
    }

    fn after_render(&mut self, _cmd: &mut dyn CommandBuffer, _ctx: &C) -> Result<()> {
        self.log("after");
        Ok(())
    }

    fn shut_down(&mut self) {
        self.log("shut_down");
    }
}
