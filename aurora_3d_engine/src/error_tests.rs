//! Unit tests for error.rs
//!
//! Covers Display output of every variant and the transient classification
//! used by the frame manager.

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("vkQueueSubmit returned ERROR_DEVICE_LOST".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("ERROR_DEVICE_LOST"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_no_suitable_device_display() {
    let err = Error::NoSuitableDevice("no family supports PRESENT".to_string());
    let display = format!("{}", err);
    assert!(display.starts_with("No suitable device"));
    assert!(display.contains("PRESENT"));
}

#[test]
fn test_invalid_render_pass_display() {
    let err = Error::InvalidRenderPass("subpass 0 references attachment 4".to_string());
    assert!(format!("{}", err).contains("attachment 4"));
}

#[test]
fn test_invalid_group_index_display() {
    let err = Error::InvalidGroupIndex { index: 5, count: 3 };
    let display = format!("{}", err);
    assert!(display.contains("5"));
    assert!(display.contains("count: 3"));
}

#[test]
fn test_missing_depth_buffer_display() {
    assert_eq!(format!("{}", Error::MissingDepthBuffer), "Depth buffer not created");
}

#[test]
fn test_invalid_frame_state_display() {
    let err = Error::InvalidFrameState("end_frame called while Idle".to_string());
    assert!(format!("{}", err).contains("while Idle"));
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

#[test]
fn test_only_surface_out_of_date_is_transient() {
    assert!(Error::SurfaceOutOfDate.is_transient());
    assert!(!Error::OutOfMemory.is_transient());
    assert!(!Error::BackendError("x".to_string()).is_transient());
    assert!(!Error::InvalidGroupIndex { index: 0, count: 0 }.is_transient());
    assert!(!Error::MissingDepthBuffer.is_transient());
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_clone_and_eq() {
    let err1 = Error::InvalidConfig("max_frames_in_flight must be > 0".to_string());
    let err2 = err1.clone();
    assert_eq!(err1, err2);
}

#[test]
fn test_result_propagation() {
    fn inner() -> Result<u32> {
        Err(Error::MissingDepthBuffer)
    }
    fn outer() -> Result<u32> {
        let value = inner()?;
        Ok(value + 1)
    }
    assert_eq!(outer(), Err(Error::MissingDepthBuffer));
}
