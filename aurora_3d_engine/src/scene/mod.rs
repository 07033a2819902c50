//! Scene module
//!
//! Node tree interface the master renderer walks each frame.

mod scene;

pub use scene::{
    traverse_depth_first, update_depth_first, Node, Scene, SceneGraph, SceneNode,
};
