/// Records one render pass of the frame: renderers walk the scene tree
/// inside `begin_render_pass` / `end_render_pass`.
///
/// Serial recording writes every renderer into the primary buffer. Parallel
/// recording gives each renderer a secondary buffer from the pass's
/// `CommandBuffersGroup`, records them on the worker pool, waits for all of
/// them, then replays them into the primary buffer in declaration order.
/// Both produce the same command sequence.

use std::sync::Arc;
use rayon::ThreadPool;
use crate::error::{Error, Result};
use crate::graphics_device::{CommandBuffer, InheritanceInfo, RenderPass, SubpassContents};
use crate::scene::{traverse_depth_first, Scene};
use super::command_buffers_group::CommandBuffersGroup;
use super::render_context::PassContext;
use super::renderer::Renderer;

/// How the middle of a pass is recorded
pub enum Recording<'a> {
    Serial,
    Parallel {
        group: &'a mut CommandBuffersGroup,
        pool: &'a ThreadPool,
    },
}

/// Record a full pass into `cmd`
pub fn record_scene_pass<C: PassContext>(
    cmd: &mut dyn CommandBuffer,
    render_pass: &Arc<dyn RenderPass>,
    ctx: &C,
    scene: &dyn Scene,
    renderers: &mut [Box<dyn Renderer<C>>],
    recording: Recording<'_>,
) -> Result<()> {
    let base = ctx.base();

    for renderer in renderers.iter_mut() {
        renderer.before_render(cmd, ctx)?;
    }

    match recording {
        Recording::Serial => {
            cmd.begin_render_pass(render_pass, &base.framebuffer, base.rect, SubpassContents::Inline)?;
            for renderer in renderers.iter_mut() {
                record_renderer(renderer.as_mut(), cmd, ctx, scene)?;
            }
        }
        Recording::Parallel { group, pool } => {
            cmd.begin_render_pass(
                render_pass,
                &base.framebuffer,
                base.rect,
                SubpassContents::SecondaryCommandBuffers,
            )?;
            let row = base.frame_in_flight_index;
            record_parallel(group, pool, row, render_pass, ctx, scene, renderers)?;
            let secondaries = group.buffers(row)?;
            cmd.execute_commands(&secondaries[..renderers.len()])?;
        }
    }

    cmd.end_render_pass()?;

    for renderer in renderers.iter_mut() {
        renderer.after_render(cmd, ctx)?;
    }
    Ok(())
}

/// pre_render, depth-first render(node), post_render
fn record_renderer<C: PassContext>(
    renderer: &mut dyn Renderer<C>,
    cmd: &mut dyn CommandBuffer,
    ctx: &C,
    scene: &dyn Scene,
) -> Result<()> {
    renderer.pre_render(cmd, ctx)?;
    traverse_depth_first(scene.root(), &mut |node| renderer.render(cmd, ctx, node))?;
    renderer.post_render(cmd, ctx)
}

fn record_parallel<C: PassContext>(
    group: &mut CommandBuffersGroup,
    pool: &ThreadPool,
    row: usize,
    render_pass: &Arc<dyn RenderPass>,
    ctx: &C,
    scene: &dyn Scene,
    renderers: &mut [Box<dyn Renderer<C>>],
) -> Result<()> {
    if group.inner_count() < renderers.len() {
        return Err(Error::InvalidGroupIndex {
            index: renderers.len() - 1,
            count: group.inner_count(),
        });
    }

    let buffers = group.buffers_mut(row)?;
    let inheritance = InheritanceInfo {
        render_pass,
        subpass: 0,
        framebuffer: &ctx.base().framebuffer,
    };
    let mut results: Vec<Result<()>> = vec![Ok(()); renderers.len()];

    pool.scope(|scope| {
        for ((renderer, buffer), result) in renderers.iter_mut().zip(buffers).zip(results.iter_mut()) {
            let inheritance = &inheritance;
            scope.spawn(move |_| {
                *result = record_secondary(renderer.as_mut(), buffer.as_mut(), inheritance, ctx, scene);
            });
        }
    });

    results.into_iter().collect()
}

fn record_secondary<C: PassContext>(
    renderer: &mut dyn Renderer<C>,
    buffer: &mut dyn CommandBuffer,
    inheritance: &InheritanceInfo,
    ctx: &C,
    scene: &dyn Scene,
) -> Result<()> {
    buffer.reset()?;
    buffer.begin_secondary(inheritance)?;
    record_renderer(renderer, buffer, ctx, scene)?;
    buffer.end()
}

#[cfg(test)]
#[path = "scene_pass_tests.rs"]
mod tests;
