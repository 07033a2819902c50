/// CommandBuffersGroup - pre-allocated command buffers for parallel recording
///
/// `outer_count` rows (one per frame slot) of `inner_count` buffers (one per
/// renderer). Each buffer lives in its own pool so worker threads never
/// share a pool while recording. Buffers are reset and re-recorded every
/// frame, never reallocated.

use std::sync::Arc;
use crate::engine_warn;
use crate::error::{Error, Result};
use crate::graphics_device::{CommandBuffer, CommandBufferLevel, CommandPool, GraphicsDevice};

struct GroupCell {
    // Dropped before the pool it was allocated from
    buffer: Box<dyn CommandBuffer>,
    _pool: Box<dyn CommandPool>,
}

pub struct CommandBuffersGroup {
    device: Arc<dyn GraphicsDevice>,
    rows: Vec<Vec<GroupCell>>,
    inner_count: usize,
    level: CommandBufferLevel,
}

impl CommandBuffersGroup {
    /// Allocate `outer_count` x `inner_count` buffers on `queue_family`
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        queue_family: u32,
        outer_count: usize,
        inner_count: usize,
        level: CommandBufferLevel,
    ) -> Result<Self> {
        let mut rows = Vec::with_capacity(outer_count);
        for _ in 0..outer_count {
            let mut row = Vec::with_capacity(inner_count);
            for _ in 0..inner_count {
                let mut pool = device.create_command_pool(queue_family)?;
                let buffer = pool.allocate(level, 1)?.pop().ok_or_else(|| {
                    Error::InvalidResource("command pool returned no buffer".to_string())
                })?;
                row.push(GroupCell { buffer, _pool: pool });
            }
            rows.push(row);
        }

        Ok(Self { device, rows, inner_count, level })
    }

    pub fn outer_count(&self) -> usize {
        self.rows.len()
    }

    pub fn inner_count(&self) -> usize {
        self.inner_count
    }

    pub fn level(&self) -> CommandBufferLevel {
        self.level
    }

    fn check(&self, outer: usize) -> Result<()> {
        if outer >= self.rows.len() {
            return Err(Error::InvalidGroupIndex { index: outer, count: self.rows.len() });
        }
        Ok(())
    }

    /// Buffers of row `outer`, in renderer order
    pub fn buffers(&self, outer: usize) -> Result<Vec<&dyn CommandBuffer>> {
        self.check(outer)?;
        Ok(self.rows[outer].iter().map(|cell| cell.buffer.as_ref()).collect())
    }

    /// Exclusive access to the buffers of row `outer`, for recording
    pub fn buffers_mut(&mut self, outer: usize) -> Result<Vec<&mut Box<dyn CommandBuffer>>> {
        self.check(outer)?;
        Ok(self.rows[outer].iter_mut().map(|cell| &mut cell.buffer).collect())
    }
}

impl Drop for CommandBuffersGroup {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            engine_warn!("aurora3d::CommandBuffersGroup", "wait_idle before release failed: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "command_buffers_group_tests.rs"]
mod tests;
