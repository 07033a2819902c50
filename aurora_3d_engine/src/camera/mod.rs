//! Camera module: perspective camera and culling frustum.
//!
//! Value types carried by the render contexts. The engine does not own
//! cameras; the application drives them and hands them to the master renderer.

mod camera;
mod frustum;

pub use camera::{Camera, DEFAULT_FAR, DEFAULT_NEAR, DEFAULT_VERTICAL_FOV};
pub use frustum::{
    frustum_corners, Frustum,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
