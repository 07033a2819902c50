use super::*;

fn approx(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-4
}

fn plane_distance(plane: Vec4, point: Vec3) -> f32 {
    plane.truncate().dot(point) + plane.w
}

// ============================================================================
// Clip planes
// ============================================================================

#[test]
fn test_reflection_plane_keeps_geometry_above_water() {
    let plane = reflection_clip_plane(DEFAULT_WATER_LEVEL);
    assert_eq!(plane, Vec4::new(0.0, 1.0, 0.0, -(DEFAULT_WATER_LEVEL + WATER_CLIP_PLANE_OFFSET)));
    assert!(plane_distance(plane, Vec3::new(0.0, DEFAULT_WATER_LEVEL + 1.0, 0.0)) > 0.0);
    assert!(plane_distance(plane, Vec3::new(0.0, DEFAULT_WATER_LEVEL - 1.0, 0.0)) < 0.0);
}

#[test]
fn test_refraction_plane_keeps_geometry_below_water() {
    let plane = refraction_clip_plane(DEFAULT_WATER_LEVEL);
    assert_eq!(plane, Vec4::new(0.0, -1.0, 0.0, DEFAULT_WATER_LEVEL + WATER_CLIP_PLANE_OFFSET));
    assert!(plane_distance(plane, Vec3::new(0.0, DEFAULT_WATER_LEVEL - 1.0, 0.0)) > 0.0);
    assert!(plane_distance(plane, Vec3::new(0.0, DEFAULT_WATER_LEVEL + 1.0, 0.0)) < 0.0);
}

#[test]
fn test_clip_planes_follow_water_level() {
    let reflection = reflection_clip_plane(10.0);
    assert!(plane_distance(reflection, Vec3::new(0.0, 11.0, 0.0)) > 0.0);
    assert!(plane_distance(reflection, Vec3::new(0.0, 9.0, 0.0)) < 0.0);

    let refraction = refraction_clip_plane(10.0);
    assert!(plane_distance(refraction, Vec3::new(0.0, 9.0, 0.0)) > 0.0);
    assert!(plane_distance(refraction, Vec3::new(0.0, 11.0, 0.0)) < 0.0);
}

#[test]
fn test_default_plane_clips_nothing_reachable() {
    assert!(plane_distance(DEFAULT_CLIP_PLANE, Vec3::new(0.0, 5000.0, 0.0)) > 0.0);
    assert!(plane_distance(DEFAULT_CLIP_PLANE, Vec3::new(0.0, -5000.0, 0.0)) > 0.0);
}

// ============================================================================
// Reflection camera
// ============================================================================

#[test]
fn test_reflection_camera_mirrors_position() {
    let camera = Camera::new(Vec3::new(1.0, 6.0, 2.0), Vec3::NEG_Z, Vec3::Y);
    let reflected = reflection_camera(&camera, DEFAULT_WATER_LEVEL);

    // 10 above the water becomes 10 below
    assert!(approx(reflected.position(), Vec3::new(1.0, -14.0, 2.0)));
    assert!(approx(reflected.forward(), Vec3::NEG_Z));
    assert!(approx(reflected.up(), Vec3::Y));
}

#[test]
fn test_reflection_camera_mirrors_about_given_level() {
    let camera = Camera::new(Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Z, Vec3::Y);
    let reflected = reflection_camera(&camera, 1.0);
    assert!(approx(reflected.position(), Vec3::new(0.0, -1.0, 0.0)));

    // A camera on the surface stays where it is
    let reflected = reflection_camera(&camera, 3.0);
    assert!(approx(reflected.position(), Vec3::new(0.0, 3.0, 0.0)));
}

#[test]
fn test_reflection_camera_looks_up_when_camera_looks_down() {
    let forward = Vec3::new(0.0, -1.0, -1.0).normalize();
    let up = Vec3::new(0.0, 1.0, -1.0).normalize();
    let camera = Camera::new(Vec3::new(0.0, 0.0, 0.0), forward, up);
    let reflected = reflection_camera(&camera, DEFAULT_WATER_LEVEL);

    assert!(approx(reflected.forward(), Vec3::new(0.0, 1.0, -1.0).normalize()));
    assert!(approx(reflected.up(), Vec3::new(0.0, 1.0, 1.0).normalize()));
    assert!(reflected.forward().dot(reflected.up()).abs() < 1e-5);
}

#[test]
fn test_reflection_keeps_projection_parameters() {
    let mut camera = Camera::default();
    camera.set_perspective(1.2, 0.5, 120.0);
    let reflected = reflection_camera(&camera, DEFAULT_WATER_LEVEL);
    assert_eq!(reflected.vertical_fov(), 1.2);
    assert_eq!(reflected.near(), 0.5);
    assert_eq!(reflected.far(), 120.0);
}
