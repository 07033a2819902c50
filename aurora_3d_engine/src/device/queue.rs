/// Queue capability flags, queue roles, and queue family descriptions

use bitflags::bitflags;

bitflags! {
    /// Capabilities of a queue family
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct QueueFlags: u32 {
        const GRAPHICS = 1 << 0;
        const COMPUTE = 1 << 1;
        const TRANSFER = 1 << 2;
        const SPARSE_BINDING = 1 << 3;
        const PROTECTED = 1 << 4;
        const VIDEO_DECODE = 1 << 5;
        const VIDEO_ENCODE = 1 << 6;
    }
}

impl QueueFlags {
    /// Families carrying any of these are never chosen
    pub const VIDEO: QueueFlags = QueueFlags::VIDEO_DECODE.union(QueueFlags::VIDEO_ENCODE);
}

/// Role a device queue is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueueType {
    Present,
    Graphics,
    Compute,
    Transfer,
    Sparse,
    Protected,
}

impl QueueType {
    pub fn name(&self) -> &'static str {
        match self {
            QueueType::Present => "PRESENT",
            QueueType::Graphics => "GRAPHICS",
            QueueType::Compute => "COMPUTE",
            QueueType::Transfer => "TRANSFER",
            QueueType::Sparse => "SPARSE",
            QueueType::Protected => "PROTECTED",
        }
    }
}

/// One queue family of a physical device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamily {
    pub flags: QueueFlags,
    /// Number of queues the family exposes
    pub queue_count: u32,
    /// Can present to the surface the device was queried against
    pub present_support: bool,
}

impl QueueFamily {
    pub fn new(flags: QueueFlags, queue_count: u32, present_support: bool) -> Self {
        Self { flags, queue_count, present_support }
    }
}
