//! Unit tests for Vulkan conversion functions
//!
//! Pure mappings between engine value types and Vulkan enums, no GPU required.

use super::*;

// ============================================================================
// TEXTURE FORMAT CONVERSION TESTS
// ============================================================================

#[test]
fn test_format_to_vk_color_formats() {
    assert_eq!(format_to_vk(TextureFormat::R8G8B8A8_SRGB), vk::Format::R8G8B8A8_SRGB);
    assert_eq!(format_to_vk(TextureFormat::B8G8R8A8_UNORM), vk::Format::B8G8R8A8_UNORM);
    assert_eq!(
        format_to_vk(TextureFormat::A2B10G10R10_UNORM),
        vk::Format::A2B10G10R10_UNORM_PACK32
    );
    assert_eq!(format_to_vk(TextureFormat::R16G16B16A16_SFLOAT), vk::Format::R16G16B16A16_SFLOAT);
}

#[test]
fn test_format_to_vk_depth_formats() {
    assert_eq!(format_to_vk(TextureFormat::D16_UNORM), vk::Format::D16_UNORM);
    // D32_FLOAT -> D32_SFLOAT
    assert_eq!(format_to_vk(TextureFormat::D32_FLOAT), vk::Format::D32_SFLOAT);
    assert_eq!(format_to_vk(TextureFormat::D24_UNORM_S8_UINT), vk::Format::D24_UNORM_S8_UINT);
    assert_eq!(format_to_vk(TextureFormat::D32_FLOAT_S8_UINT), vk::Format::D32_SFLOAT_S8_UINT);
}

#[test]
fn test_vk_to_format_inverts_every_format() {
    for format in ALL_FORMATS {
        assert_eq!(vk_to_format(format_to_vk(format)), Some(format));
    }
}

#[test]
fn test_vk_to_format_unknown() {
    assert_eq!(vk_to_format(vk::Format::R5G6B5_UNORM_PACK16), None);
    assert_eq!(vk_to_format(vk::Format::UNDEFINED), None);
}

// ============================================================================
// ATTACHMENT CONVERSION TESTS
// ============================================================================

#[test]
fn test_sample_count_to_vk() {
    assert_eq!(sample_count_to_vk(SampleCount::S1), vk::SampleCountFlags::TYPE_1);
    assert_eq!(sample_count_to_vk(SampleCount::S4), vk::SampleCountFlags::TYPE_4);
    assert_eq!(sample_count_to_vk(SampleCount::S8), vk::SampleCountFlags::TYPE_8);
}

#[test]
fn test_image_layout_to_vk() {
    assert_eq!(image_layout_to_vk(ImageLayout::PresentSrc), vk::ImageLayout::PRESENT_SRC_KHR);
    assert_eq!(
        image_layout_to_vk(ImageLayout::DepthStencilReadOnly),
        vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL
    );
    assert_eq!(image_layout_to_vk(ImageLayout::Undefined), vk::ImageLayout::UNDEFINED);
}

#[test]
fn test_aspect_masks() {
    assert_eq!(aspect_mask(TextureFormat::B8G8R8A8_UNORM), vk::ImageAspectFlags::COLOR);
    assert_eq!(aspect_mask(TextureFormat::D24_UNORM_S8_UINT), vk::ImageAspectFlags::DEPTH);
    assert_eq!(
        attachment_aspect_mask(TextureFormat::D24_UNORM_S8_UINT),
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    );
    assert_eq!(attachment_aspect_mask(TextureFormat::D32_FLOAT), vk::ImageAspectFlags::DEPTH);
}

#[test]
fn test_clear_value_to_vk() {
    let color = clear_value_to_vk(&ClearValue::Color([0.1, 0.2, 0.3, 1.0]));
    let depth = clear_value_to_vk(&ClearValue::DepthStencil { depth: 1.0, stencil: 7 });
    unsafe {
        assert_eq!(color.color.float32, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(depth.depth_stencil.depth, 1.0);
        assert_eq!(depth.depth_stencil.stencil, 7);
    }
}

#[test]
fn test_image_usage_to_vk() {
    let usage = image_usage_to_vk(ImageUsage::DEPTH_STENCIL_ATTACHMENT | ImageUsage::TRANSIENT);
    assert_eq!(
        usage,
        vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT | vk::ImageUsageFlags::TRANSIENT_ATTACHMENT
    );
}

// ============================================================================
// DEPENDENCY CONVERSION TESTS
// ============================================================================

#[test]
fn test_pipeline_stage_to_vk() {
    let stages = pipeline_stage_to_vk(
        PipelineStage::COLOR_ATTACHMENT_OUTPUT | PipelineStage::EARLY_FRAGMENT_TESTS,
    );
    assert_eq!(
        stages,
        vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
    );
    assert_eq!(pipeline_stage_to_vk(PipelineStage::empty()), vk::PipelineStageFlags::empty());
}

#[test]
fn test_access_to_vk() {
    let access = access_to_vk(Access::SHADER_READ | Access::DEPTH_STENCIL_ATTACHMENT_WRITE);
    assert_eq!(
        access,
        vk::AccessFlags::SHADER_READ | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE
    );
}

#[test]
fn test_subpass_ref_to_vk() {
    assert_eq!(subpass_ref_to_vk(SubpassRef::External), vk::SUBPASS_EXTERNAL);
    assert_eq!(subpass_ref_to_vk(SubpassRef::Index(2)), 2);
}

// ============================================================================
// DEVICE / SURFACE CONVERSION TESTS
// ============================================================================

#[test]
fn test_queue_flags_from_vk() {
    let flags = queue_flags_from_vk(
        vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
    );
    assert_eq!(flags, QueueFlags::GRAPHICS | QueueFlags::COMPUTE | QueueFlags::TRANSFER);

    let video = queue_flags_from_vk(vk::QueueFlags::VIDEO_DECODE_KHR | vk::QueueFlags::TRANSFER);
    assert!(video.intersects(QueueFlags::VIDEO));
}

#[test]
fn test_device_kind_from_vk() {
    assert_eq!(device_kind_from_vk(vk::PhysicalDeviceType::DISCRETE_GPU), DeviceKind::Discrete);
    assert_eq!(device_kind_from_vk(vk::PhysicalDeviceType::CPU), DeviceKind::Cpu);
    assert_eq!(device_kind_from_vk(vk::PhysicalDeviceType::OTHER), DeviceKind::Other);
}

#[test]
fn test_present_modes() {
    for mode in [PresentMode::Fifo, PresentMode::Mailbox, PresentMode::Immediate] {
        assert_eq!(vk_to_present_mode(present_mode_to_vk(mode)), Some(mode));
    }
    assert_eq!(vk_to_present_mode(vk::PresentModeKHR::FIFO_RELAXED), None);
}

#[test]
fn test_rect_to_vk() {
    let rect = rect_to_vk(Rect2D { x: 10, y: -4, width: 640, height: 360 });
    assert_eq!(rect.offset.x, 10);
    assert_eq!(rect.offset.y, -4);
    assert_eq!(rect.extent.width, 640);
    assert_eq!(rect.extent.height, 360);
}
