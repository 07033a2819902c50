/// Scene collaborator interface
///
/// The engine only walks the node tree: renderers receive every node in
/// depth-first order (parent before children) and pick what they draw via
/// `as_any`. Node storage and components are the application's business;
/// `SceneGraph` and `Node` are a plain implementation for small apps and tests.

use std::any::Any;
use crate::error::Result;

/// Node of the scene tree
pub trait SceneNode: Send + Sync {
    /// Display name, used in logs
    fn name(&self) -> &str;

    /// Direct children, in draw order
    fn children(&self) -> &[Box<dyn SceneNode>];

    /// Mutable access for the update walk
    fn children_mut(&mut self) -> &mut [Box<dyn SceneNode>];

    /// Per-frame update of this node only
    fn update(&mut self, _delta_time: f32) {}

    /// Downcast for renderer-side type checks
    fn as_any(&self) -> &dyn Any;
}

/// Scene driven by the application loop
pub trait Scene: Send + Sync {
    fn root(&self) -> &dyn SceneNode;

    /// Advance the whole tree by `delta_time` seconds
    fn update(&mut self, delta_time: f32);
}

/// Visit `node` and its descendants, parents before children
///
/// Stops at the first error.
pub fn traverse_depth_first<'a, F>(node: &'a dyn SceneNode, visit: &mut F) -> Result<()>
where
    F: FnMut(&'a dyn SceneNode) -> Result<()>,
{
    visit(node)?;
    for child in node.children() {
        traverse_depth_first(child.as_ref(), visit)?;
    }
    Ok(())
}

/// Update `node` then its descendants
pub fn update_depth_first(node: &mut dyn SceneNode, delta_time: f32) {
    node.update(delta_time);
    for child in node.children_mut() {
        update_depth_first(child.as_mut(), delta_time);
    }
}

/// Plain grouping node
#[derive(Default)]
pub struct Node {
    name: String,
    children: Vec<Box<dyn SceneNode>>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), children: Vec::new() }
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: impl SceneNode + 'static) -> Self {
        self.children.push(Box::new(child));
        self
    }

    pub fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }
}

impl SceneNode for Node {
    fn name(&self) -> &str {
        &self.name
    }

    fn children(&self) -> &[Box<dyn SceneNode>] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut [Box<dyn SceneNode>] {
        &mut self.children
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Scene owning a single root node
pub struct SceneGraph {
    root: Box<dyn SceneNode>,
}

impl SceneGraph {
    pub fn new(root: impl SceneNode + 'static) -> Self {
        Self { root: Box::new(root) }
    }

    /// Scene with an empty root
    pub fn empty() -> Self {
        Self::new(Node::new("root"))
    }

    /// Number of nodes including the root
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        // The closure never fails
        let _ = traverse_depth_first(self.root.as_ref(), &mut |_| {
            count += 1;
            Ok(())
        });
        count
    }
}

impl Scene for SceneGraph {
    fn root(&self) -> &dyn SceneNode {
        self.root.as_ref()
    }

    fn update(&mut self, delta_time: f32) {
        update_depth_first(self.root.as_mut(), delta_time);
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
