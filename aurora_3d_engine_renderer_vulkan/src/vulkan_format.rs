/// Conversions between engine value types and Vulkan enums/flags

use ash::vk;
use aurora_3d_engine::aurora3d::device::{DeviceKind, QueueFlags};
use aurora_3d_engine::aurora3d::graphics_device::{
    Access, ClearValue, ImageLayout, ImageUsage, LoadOp, PipelineStage, PresentMode,
    Rect2D, SampleCount, StoreOp, SubpassRef, TextureFormat,
};

/// Every format the engine can name, used to query device support
pub(crate) const ALL_FORMATS: [TextureFormat; 10] = [
    TextureFormat::R8G8B8A8_SRGB,
    TextureFormat::R8G8B8A8_UNORM,
    TextureFormat::B8G8R8A8_SRGB,
    TextureFormat::B8G8R8A8_UNORM,
    TextureFormat::A2B10G10R10_UNORM,
    TextureFormat::R16G16B16A16_SFLOAT,
    TextureFormat::D16_UNORM,
    TextureFormat::D32_FLOAT,
    TextureFormat::D24_UNORM_S8_UINT,
    TextureFormat::D32_FLOAT_S8_UINT,
];

pub(crate) fn format_to_vk(format: TextureFormat) -> vk::Format {
    match format {
        TextureFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        TextureFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        TextureFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        TextureFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        TextureFormat::A2B10G10R10_UNORM => vk::Format::A2B10G10R10_UNORM_PACK32,
        TextureFormat::R16G16B16A16_SFLOAT => vk::Format::R16G16B16A16_SFLOAT,
        TextureFormat::D16_UNORM => vk::Format::D16_UNORM,
        TextureFormat::D32_FLOAT => vk::Format::D32_SFLOAT,
        TextureFormat::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
        TextureFormat::D32_FLOAT_S8_UINT => vk::Format::D32_SFLOAT_S8_UINT,
    }
}

/// Engine format for a Vulkan format, `None` for formats the engine does not model
pub(crate) fn vk_to_format(format: vk::Format) -> Option<TextureFormat> {
    ALL_FORMATS.iter().copied().find(|f| format_to_vk(*f) == format)
}

pub(crate) fn sample_count_to_vk(samples: SampleCount) -> vk::SampleCountFlags {
    match samples {
        SampleCount::S1 => vk::SampleCountFlags::TYPE_1,
        SampleCount::S2 => vk::SampleCountFlags::TYPE_2,
        SampleCount::S4 => vk::SampleCountFlags::TYPE_4,
        SampleCount::S8 => vk::SampleCountFlags::TYPE_8,
    }
}

pub(crate) fn load_op_to_vk(load_op: LoadOp) -> vk::AttachmentLoadOp {
    match load_op {
        LoadOp::Load => vk::AttachmentLoadOp::LOAD,
        LoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
        LoadOp::DontCare => vk::AttachmentLoadOp::DONT_CARE,
    }
}

pub(crate) fn store_op_to_vk(store_op: StoreOp) -> vk::AttachmentStoreOp {
    match store_op {
        StoreOp::Store => vk::AttachmentStoreOp::STORE,
        StoreOp::DontCare => vk::AttachmentStoreOp::DONT_CARE,
    }
}

pub(crate) fn image_layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
        ImageLayout::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        ImageLayout::DepthStencilAttachment => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        ImageLayout::DepthStencilReadOnly => vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
        ImageLayout::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        ImageLayout::TransferSrc => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        ImageLayout::TransferDst => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        ImageLayout::PresentSrc => vk::ImageLayout::PRESENT_SRC_KHR,
    }
}

pub(crate) fn pipeline_stage_to_vk(stage: PipelineStage) -> vk::PipelineStageFlags {
    let mut flags = vk::PipelineStageFlags::empty();
    if stage.contains(PipelineStage::TOP_OF_PIPE) { flags |= vk::PipelineStageFlags::TOP_OF_PIPE; }
    if stage.contains(PipelineStage::FRAGMENT_SHADER) { flags |= vk::PipelineStageFlags::FRAGMENT_SHADER; }
    if stage.contains(PipelineStage::EARLY_FRAGMENT_TESTS) { flags |= vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS; }
    if stage.contains(PipelineStage::LATE_FRAGMENT_TESTS) { flags |= vk::PipelineStageFlags::LATE_FRAGMENT_TESTS; }
    if stage.contains(PipelineStage::COLOR_ATTACHMENT_OUTPUT) { flags |= vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT; }
    if stage.contains(PipelineStage::BOTTOM_OF_PIPE) { flags |= vk::PipelineStageFlags::BOTTOM_OF_PIPE; }
    flags
}

pub(crate) fn access_to_vk(access: Access) -> vk::AccessFlags {
    let mut flags = vk::AccessFlags::empty();
    if access.contains(Access::SHADER_READ) { flags |= vk::AccessFlags::SHADER_READ; }
    if access.contains(Access::COLOR_ATTACHMENT_READ) { flags |= vk::AccessFlags::COLOR_ATTACHMENT_READ; }
    if access.contains(Access::COLOR_ATTACHMENT_WRITE) { flags |= vk::AccessFlags::COLOR_ATTACHMENT_WRITE; }
    if access.contains(Access::DEPTH_STENCIL_ATTACHMENT_READ) { flags |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ; }
    if access.contains(Access::DEPTH_STENCIL_ATTACHMENT_WRITE) { flags |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE; }
    if access.contains(Access::MEMORY_READ) { flags |= vk::AccessFlags::MEMORY_READ; }
    flags
}

pub(crate) fn subpass_ref_to_vk(subpass: SubpassRef) -> u32 {
    match subpass {
        SubpassRef::External => vk::SUBPASS_EXTERNAL,
        SubpassRef::Index(index) => index,
    }
}

pub(crate) fn image_usage_to_vk(usage: ImageUsage) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::empty();
    if usage.contains(ImageUsage::COLOR_ATTACHMENT) { flags |= vk::ImageUsageFlags::COLOR_ATTACHMENT; }
    if usage.contains(ImageUsage::DEPTH_STENCIL_ATTACHMENT) { flags |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT; }
    if usage.contains(ImageUsage::SAMPLED) { flags |= vk::ImageUsageFlags::SAMPLED; }
    if usage.contains(ImageUsage::TRANSIENT) { flags |= vk::ImageUsageFlags::TRANSIENT_ATTACHMENT; }
    if usage.contains(ImageUsage::TRANSFER_SRC) { flags |= vk::ImageUsageFlags::TRANSFER_SRC; }
    flags
}

/// Aspects of an image view over `format`
pub(crate) fn aspect_mask(format: TextureFormat) -> vk::ImageAspectFlags {
    if format.is_depth() {
        vk::ImageAspectFlags::DEPTH
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

/// Aspects referenced by a render pass attachment
pub(crate) fn attachment_aspect_mask(format: TextureFormat) -> vk::ImageAspectFlags {
    if format.has_stencil() {
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    } else {
        aspect_mask(format)
    }
}

pub(crate) fn clear_value_to_vk(value: &ClearValue) -> vk::ClearValue {
    match value {
        ClearValue::Color(color) => vk::ClearValue {
            color: vk::ClearColorValue { float32: *color },
        },
        ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue { depth: *depth, stencil: *stencil },
        },
    }
}

pub(crate) fn rect_to_vk(rect: Rect2D) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D { x: rect.x, y: rect.y },
        extent: vk::Extent2D { width: rect.width, height: rect.height },
    }
}

pub(crate) fn present_mode_to_vk(mode: PresentMode) -> vk::PresentModeKHR {
    match mode {
        PresentMode::Fifo => vk::PresentModeKHR::FIFO,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
    }
}

/// Engine present mode, `None` for modes the engine never selects
pub(crate) fn vk_to_present_mode(mode: vk::PresentModeKHR) -> Option<PresentMode> {
    match mode {
        vk::PresentModeKHR::FIFO => Some(PresentMode::Fifo),
        vk::PresentModeKHR::MAILBOX => Some(PresentMode::Mailbox),
        vk::PresentModeKHR::IMMEDIATE => Some(PresentMode::Immediate),
        _ => None,
    }
}

pub(crate) fn queue_flags_from_vk(flags: vk::QueueFlags) -> QueueFlags {
    let mut queue_flags = QueueFlags::empty();
    if flags.contains(vk::QueueFlags::GRAPHICS) { queue_flags |= QueueFlags::GRAPHICS; }
    if flags.contains(vk::QueueFlags::COMPUTE) { queue_flags |= QueueFlags::COMPUTE; }
    if flags.contains(vk::QueueFlags::TRANSFER) { queue_flags |= QueueFlags::TRANSFER; }
    if flags.contains(vk::QueueFlags::SPARSE_BINDING) { queue_flags |= QueueFlags::SPARSE_BINDING; }
    if flags.contains(vk::QueueFlags::PROTECTED) { queue_flags |= QueueFlags::PROTECTED; }
    if flags.contains(vk::QueueFlags::VIDEO_DECODE_KHR) { queue_flags |= QueueFlags::VIDEO_DECODE; }
    if flags.contains(vk::QueueFlags::VIDEO_ENCODE_KHR) { queue_flags |= QueueFlags::VIDEO_ENCODE; }
    queue_flags
}

pub(crate) fn device_kind_from_vk(kind: vk::PhysicalDeviceType) -> DeviceKind {
    match kind {
        vk::PhysicalDeviceType::DISCRETE_GPU => DeviceKind::Discrete,
        vk::PhysicalDeviceType::INTEGRATED_GPU => DeviceKind::Integrated,
        vk::PhysicalDeviceType::VIRTUAL_GPU => DeviceKind::Virtual,
        vk::PhysicalDeviceType::CPU => DeviceKind::Cpu,
        _ => DeviceKind::Other,
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
