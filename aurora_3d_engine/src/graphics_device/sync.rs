/// Fence and Semaphore traits - GPU synchronization primitives

use std::any::Any;
use crate::error::Result;

/// CPU-visible signal set by the GPU when a submission completes
pub trait Fence: Send + Sync {
    /// Block until signaled or `timeout_ns` elapses
    fn wait(&self, timeout_ns: u64) -> Result<()>;

    /// Return to the unsignaled state
    fn reset(&self) -> Result<()>;

    /// Backend downcast
    fn as_any(&self) -> &dyn Any;
}

/// GPU-side signal between queue operations
pub trait Semaphore: Send + Sync {
    /// Backend downcast
    fn as_any(&self) -> &dyn Any;
}
