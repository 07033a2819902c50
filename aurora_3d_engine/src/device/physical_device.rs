/// Physical device description as queried from the backend

use crate::device::queue::QueueFamily;
use crate::graphics_device::TextureFormat;

/// Kind of physical device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Discrete,
    Integrated,
    Virtual,
    Cpu,
    Other,
}

impl DeviceKind {
    /// Auto-pick preference, lower is better
    pub fn rank(&self) -> u32 {
        match self {
            DeviceKind::Discrete => 0,
            DeviceKind::Integrated => 1,
            DeviceKind::Virtual => 2,
            DeviceKind::Cpu => 3,
            DeviceKind::Other => 4,
        }
    }
}

/// Vendor name for a PCI vendor id
pub fn vendor_name(vendor_id: u32) -> &'static str {
    match vendor_id {
        0x1002 => "AMD",
        0x10DE => "NVIDIA",
        0x8086 => "INTEL",
        0x13B5 => "ARM",
        0x5143 => "Qualcomm",
        0x1010 => "ImgTec",
        _ => "Unknown",
    }
}

/// Capabilities of one physical GPU. Immutable once queried.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalDeviceCandidate {
    /// Enumeration index
    pub index: usize,
    pub name: String,
    pub vendor_id: u32,
    pub kind: DeviceKind,
    pub queue_families: Vec<QueueFamily>,
    /// Formats usable as color attachment
    pub color_formats: Vec<TextureFormat>,
    /// Formats usable as depth/stencil attachment
    pub depth_formats: Vec<TextureFormat>,
}

impl PhysicalDeviceCandidate {
    pub fn vendor_name(&self) -> &'static str {
        vendor_name(self.vendor_id)
    }

    /// True when at least one family can present
    pub fn can_present(&self) -> bool {
        self.queue_families.iter().any(|f| f.present_support)
    }

    /// First preferred depth format the device supports, `D32_FLOAT` otherwise
    pub fn find_depth_format(&self, preferred: &[TextureFormat]) -> TextureFormat {
        preferred
            .iter()
            .copied()
            .find(|format| self.depth_formats.contains(format))
            .unwrap_or(TextureFormat::D32_FLOAT)
    }
}

/// Depth formats tried when nothing else is requested
pub const DEFAULT_DEPTH_FORMATS: [TextureFormat; 4] = [
    TextureFormat::D32_FLOAT,
    TextureFormat::D32_FLOAT_S8_UINT,
    TextureFormat::D24_UNORM_S8_UINT,
    TextureFormat::D16_UNORM,
];

/// Surface formats tried when nothing else is requested
pub const DEFAULT_SURFACE_FORMATS: [TextureFormat; 4] = [
    TextureFormat::B8G8R8A8_UNORM,
    TextureFormat::R8G8B8A8_UNORM,
    TextureFormat::B8G8R8A8_SRGB,
    TextureFormat::R8G8B8A8_SRGB,
];

/// First preferred format the surface supports, else the surface's first format
pub fn find_surface_format(supported: &[TextureFormat], preferred: &[TextureFormat]) -> Option<TextureFormat> {
    preferred
        .iter()
        .copied()
        .find(|format| supported.contains(format))
        .or_else(|| supported.first().copied())
}
