//! Physical device description and queue selection

mod physical_device;
mod queue;
mod queue_selector;

pub use physical_device::{
    find_surface_format, vendor_name, DeviceKind, PhysicalDeviceCandidate,
    DEFAULT_DEPTH_FORMATS, DEFAULT_SURFACE_FORMATS,
};
pub use queue::{QueueFamily, QueueFlags, QueueType};
pub use queue_selector::{pick_physical_device, select_queues, QueueAssignment, QueueAssignments};
