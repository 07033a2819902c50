use super::*;
use crate::device::physical_device::DeviceKind;
use crate::graphics_device::TextureFormat;

const G: QueueFlags = QueueFlags::GRAPHICS;
const C: QueueFlags = QueueFlags::COMPUTE;
const T: QueueFlags = QueueFlags::TRANSFER;

fn family(flags: QueueFlags, count: u32, present: bool) -> QueueFamily {
    QueueFamily::new(flags, count, present)
}

fn candidate(index: usize, kind: DeviceKind, families: Vec<QueueFamily>) -> PhysicalDeviceCandidate {
    PhysicalDeviceCandidate {
        index,
        name: format!("GPU {}", index),
        vendor_id: 0x10DE,
        kind,
        queue_families: families,
        color_formats: vec![TextureFormat::B8G8R8A8_UNORM],
        depth_formats: vec![TextureFormat::D32_FLOAT],
    }
}

fn assert_family_counts(families: &[QueueFamily], queues: &QueueAssignments) {
    for (index, family) in families.iter().enumerate() {
        assert!(
            queues.queue_count(index as u32) <= family.queue_count,
            "family {} over-claimed",
            index
        );
    }
}

// ============================================================================
// select_queues
// ============================================================================

#[test]
fn test_dedicated_compute_then_combined_graphics_present() {
    let families = vec![
        family(G | C | T, 16, true),
        family(C | T, 8, false),
        family(T, 2, false),
    ];
    let queues = select_queues(&families, true).unwrap();

    assert_eq!(queues.get(QueueType::Compute).unwrap().family_index, 1);
    let graphics = queues.get(QueueType::Graphics).unwrap();
    let present = queues.get(QueueType::Present).unwrap();
    assert_eq!(graphics.family_index, 0);
    assert_eq!(graphics, present);
    assert!(present.surface_bound);
    assert_eq!(queues.get(QueueType::Transfer).unwrap().family_index, 2);
    assert_eq!(queues.presentation_families(), vec![0]);
    assert_family_counts(&families, &queues);
}

#[test]
fn test_single_family_serves_everything() {
    let families = vec![family(G | C | T, 1, true)];
    let queues = select_queues(&families, true).unwrap();

    let graphics = queues.get(QueueType::Graphics).unwrap();
    assert_eq!(queues.get(QueueType::Compute), Some(graphics));
    assert_eq!(queues.get(QueueType::Present), Some(graphics));
    assert!(!queues.has(QueueType::Transfer));
    assert_eq!(queues.queue_count(0), 1);
}

#[test]
fn test_present_on_separate_family() {
    let families = vec![
        family(G | C, 4, false),
        family(T, 1, true),
    ];
    let queues = select_queues(&families, true).unwrap();

    assert_eq!(queues.get(QueueType::Graphics).unwrap().family_index, 0);
    assert_eq!(queues.get(QueueType::Present).unwrap().family_index, 1);
    assert_eq!(queues.presentation_families(), vec![0, 1]);
    assert_family_counts(&families, &queues);
}

#[test]
fn test_exhausted_family_is_rejected() {
    // Family 0 can present but its only queue goes to dedicated compute
    let families = vec![
        family(C | T, 1, true),
        family(G | C, 1, false),
    ];
    let result = select_queues(&families, true);
    assert!(matches!(result, Err(Error::NoSuitableDevice(msg)) if msg.contains("PRESENT")));

    // A second queue in that family makes it usable for presenting
    let families = vec![
        family(C | T, 2, true),
        family(G | C, 1, false),
    ];
    let queues = select_queues(&families, true).unwrap();
    let present = queues.get(QueueType::Present).unwrap();
    assert_eq!((present.family_index, present.queue_index), (0, 1));
    assert_family_counts(&families, &queues);
}

#[test]
fn test_video_families_are_never_chosen() {
    let families = vec![
        family(C | QueueFlags::VIDEO_DECODE, 4, false),
        family(G | C, 2, true),
        family(T | QueueFlags::VIDEO_ENCODE, 1, false),
    ];
    let queues = select_queues(&families, true).unwrap();

    for (_, assignment) in queues.iter() {
        assert!(!assignment.flags.intersects(QueueFlags::VIDEO));
    }
    assert!(!queues.has(QueueType::Transfer));
}

#[test]
fn test_no_present_family_fails() {
    let families = vec![family(G | C | T, 4, false)];
    let result = select_queues(&families, true);
    assert!(matches!(result, Err(Error::NoSuitableDevice(msg)) if msg.contains("PRESENT")));
}

#[test]
fn test_headless_needs_no_present() {
    let families = vec![family(G | C | T, 4, false)];
    let queues = select_queues(&families, false).unwrap();
    assert!(!queues.has(QueueType::Present));
    assert!(queues.has(QueueType::Graphics));
}

#[test]
fn test_no_graphics_family_fails() {
    let families = vec![family(C | T, 4, true)];
    assert!(matches!(select_queues(&families, true), Err(Error::NoSuitableDevice(_))));
}

#[test]
fn test_family_count_invariant_over_many_layouts() {
    let layouts = vec![
        vec![family(G | C | T, 1, true)],
        vec![family(G | C | T, 2, true), family(C, 1, false)],
        vec![family(G, 1, false), family(C, 1, false), family(T, 1, true)],
        vec![family(G | C, 1, false), family(G | C, 1, true), family(T, 4, false)],
    ];
    for families in layouts {
        let queues = select_queues(&families, true).unwrap();
        assert_family_counts(&families, &queues);
    }
}

// ============================================================================
// pick_physical_device
// ============================================================================

#[test]
fn test_auto_pick_prefers_discrete() {
    let good = vec![family(G | C | T, 4, true)];
    let candidates = vec![
        candidate(0, DeviceKind::Integrated, good.clone()),
        candidate(1, DeviceKind::Discrete, good.clone()),
        candidate(2, DeviceKind::Discrete, good),
    ];
    let (index, _) = pick_physical_device(&candidates, -1, true).unwrap();
    assert_eq!(index, 1);
}

#[test]
fn test_auto_pick_skips_unsuitable() {
    let candidates = vec![
        candidate(0, DeviceKind::Discrete, vec![family(C, 1, false)]),
        candidate(1, DeviceKind::Cpu, vec![family(G | C, 1, true)]),
    ];
    let (index, _) = pick_physical_device(&candidates, -1, true).unwrap();
    assert_eq!(index, 1);
}

#[test]
fn test_forced_index() {
    let good = vec![family(G | C | T, 4, true)];
    let candidates = vec![
        candidate(0, DeviceKind::Discrete, good.clone()),
        candidate(1, DeviceKind::Integrated, good),
    ];
    let (index, _) = pick_physical_device(&candidates, 1, true).unwrap();
    assert_eq!(index, 1);

    assert!(matches!(
        pick_physical_device(&candidates, 5, true),
        Err(Error::NoSuitableDevice(_))
    ));
}

#[test]
fn test_no_candidates() {
    assert!(matches!(pick_physical_device(&[], -1, true), Err(Error::NoSuitableDevice(_))));
}

// ============================================================================
// Formats and vendors
// ============================================================================

#[test]
fn test_vendor_names() {
    assert_eq!(crate::device::vendor_name(0x10DE), "NVIDIA");
    assert_eq!(crate::device::vendor_name(0x1002), "AMD");
    assert_eq!(crate::device::vendor_name(0x8086), "INTEL");
    assert_eq!(crate::device::vendor_name(0xBEEF), "Unknown");
}

#[test]
fn test_find_depth_format_fallback() {
    let mut gpu = candidate(0, DeviceKind::Discrete, vec![]);
    gpu.depth_formats = vec![TextureFormat::D24_UNORM_S8_UINT];
    assert_eq!(
        gpu.find_depth_format(&[TextureFormat::D32_FLOAT_S8_UINT, TextureFormat::D24_UNORM_S8_UINT]),
        TextureFormat::D24_UNORM_S8_UINT
    );
    assert_eq!(gpu.find_depth_format(&[TextureFormat::D16_UNORM]), TextureFormat::D32_FLOAT);
}

#[test]
fn test_find_surface_format() {
    let supported = [TextureFormat::R8G8B8A8_SRGB, TextureFormat::B8G8R8A8_UNORM];
    assert_eq!(
        crate::device::find_surface_format(&supported, &[TextureFormat::B8G8R8A8_UNORM]),
        Some(TextureFormat::B8G8R8A8_UNORM)
    );
    assert_eq!(
        crate::device::find_surface_format(&supported, &[TextureFormat::A2B10G10R10_UNORM]),
        Some(TextureFormat::R8G8B8A8_SRGB)
    );
    assert_eq!(crate::device::find_surface_format(&[], &[TextureFormat::B8G8R8A8_UNORM]), None);
}
