//! Scene graph.
//!
//! Nodes live in a slot map and reference each other by [`NodeId`]. The
//! graph always has a root group; removing a node removes its whole
//! subtree and invalidates every id in it.
//!
//! # Example
//!
//! ```
//! use stage_scene::{Geometry, Material, Mesh, Node, Scene};
//!
//! let mut scene = Scene::new();
//! let group = scene.add(Node::group().named("building")).unwrap();
//! let wall = scene
//!     .add_child(group, Node::mesh(Mesh::new(Geometry::cuboid(1.0, 1.0, 1.0), Material::default())))
//!     .unwrap();
//!
//! assert_eq!(scene.find_by_name("building"), Some(group));
//! assert_eq!(scene.descendants(group), vec![wall]);
//! ```

use glam::{Mat4, Vec3};
use slotmap::{SlotMap, new_key_type};

use stage_core::{Error, Result};

use crate::geometry::Mesh;
use crate::light::{AmbientLight, DirectionalLight};
use crate::transform::Transform;

new_key_type! {
    /// Handle to a node in a [`Scene`].
    pub struct NodeId;
}

/// A text element pinned to a world position and drawn on the 2D overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub text: String,
    /// Extra CSS-style class names the overlay host applies
    pub class: Option<String>,
}

/// A flat element placed in 3D space and drawn on the 3D overlay.
#[derive(Clone, Debug, PartialEq)]
pub struct Panel {
    /// Overlay host content identifier
    pub content: String,
    /// Width and height in world units at scale 1
    pub size: (f32, f32),
}

/// What a node is.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Pure grouping node
    Group,
    Mesh(Mesh),
    AmbientLight(AmbientLight),
    DirectionalLight(DirectionalLight),
    Label(Label),
    Panel(Panel),
}

impl NodeKind {
    /// Short name for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Group => "Group",
            NodeKind::Mesh(_) => "Mesh",
            NodeKind::AmbientLight(_) => "AmbientLight",
            NodeKind::DirectionalLight(_) => "DirectionalLight",
            NodeKind::Label(_) => "Label",
            NodeKind::Panel(_) => "Panel",
        }
    }
}

/// A node in the scene graph.
#[derive(Clone, Debug)]
pub struct Node {
    pub name: Option<String>,
    pub transform: Transform,
    /// Hidden nodes hide their whole subtree
    pub visible: bool,
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    /// Detached node of the given kind at the origin.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            name: None,
            transform: Transform::default(),
            visible: true,
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group() -> Self {
        Self::new(NodeKind::Group)
    }

    pub fn mesh(mesh: Mesh) -> Self {
        Self::new(NodeKind::Mesh(mesh))
    }

    pub fn label(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Label(Label {
            text: text.into(),
            class: None,
        }))
    }

    pub fn panel(content: impl Into<String>, width: f32, height: f32) -> Self {
        Self::new(NodeKind::Panel(Panel {
            content: content.into(),
            size: (width, height),
        }))
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh(_))
    }
}

/// Background appearance of the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Background {
    pub color: Vec3,
    pub fog: Option<Fog>,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            color: Vec3::ZERO,
            fog: None,
        }
    }
}

/// Linear fog.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fog {
    pub color: Vec3,
    pub near: f32,
    pub far: f32,
}

/// Root of all visible and logical objects.
pub struct Scene {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
    pub background: Background,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene with a root group.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::group().named("root"));
        Self {
            nodes,
            root,
            background: Background::default(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Add a node under the root.
    pub fn add(&mut self, node: Node) -> Result<NodeId> {
        self.add_child(self.root, node)
    }

    /// Add a node under `parent`.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> Result<NodeId> {
        if !self.nodes.contains_key(parent) {
            return Err(Error::NodeNotFound(format!("parent {:?}", parent)));
        }
        node.parent = Some(parent);
        node.children.clear();
        let kind = node.kind.type_name();
        let id = self.nodes.insert(node);
        self.nodes[parent].children.push(id);
        tracing::trace!("Added {} node {:?} under {:?}", kind, id, parent);
        Ok(id)
    }

    /// Remove a node and its subtree, returning the detached node itself.
    /// The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> Result<Node> {
        if id == self.root {
            return Err(Error::InvalidInput("the scene root cannot be removed".into()));
        }
        let parent = self
            .nodes
            .get(id)
            .ok_or_else(|| Error::NodeNotFound(format!("{:?}", id)))?
            .parent;
        if let Some(parent) = parent
            && let Some(parent) = self.nodes.get_mut(parent)
        {
            parent.children.retain(|&child| child != id);
        }
        for descendant in self.descendants(id) {
            self.nodes.remove(descendant);
        }
        let mut node = self
            .nodes
            .remove(id)
            .ok_or_else(|| Error::NodeNotFound(format!("{:?}", id)))?;
        node.parent = None;
        node.children.clear();
        Ok(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Lookup that turns a stale id into an error.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| Error::NodeNotFound(format!("{:?}", id)))
    }

    /// Direct children of `id` (empty for unknown ids).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children()).unwrap_or(&[])
    }

    /// Every node below `id`, depth-first in child order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// First node, depth-first from the root, with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .find(|&id| self.nodes[id].name.as_deref() == Some(name))
    }

    /// Local-to-world matrix composed through every ancestor.
    pub fn world_matrix(&self, id: NodeId) -> Result<Mat4> {
        let mut node = self.node(id)?;
        let mut matrix = node.transform.local_matrix();
        while let Some(parent) = node.parent {
            node = self.node(parent)?;
            matrix = node.transform.local_matrix() * matrix;
        }
        Ok(matrix)
    }

    pub fn world_position(&self, id: NodeId) -> Result<Vec3> {
        Ok(self.world_matrix(id)?.transform_point3(Vec3::ZERO))
    }

    /// True when the node and all its ancestors are visible.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(id) = current {
            match self.nodes.get(id) {
                Some(node) if node.visible => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Every visible node with its world matrix, parents before children.
    pub fn visible_nodes(&self) -> Vec<(NodeId, Mat4)> {
        let mut out = Vec::new();
        let root = &self.nodes[self.root];
        if !root.visible {
            return out;
        }
        let mut stack = vec![(self.root, root.transform.local_matrix())];
        while let Some((id, world)) = stack.pop() {
            out.push((id, world));
            for &child in self.nodes[id].children.iter().rev() {
                let node = &self.nodes[child];
                if node.visible {
                    stack.push((child, world * node.transform.local_matrix()));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Geometry, Material};

    const EPSILON: f32 = 1e-5;

    fn cube() -> Node {
        Node::mesh(Mesh::new(Geometry::cuboid(1.0, 1.0, 1.0), Material::default()))
    }

    #[test]
    fn test_new_scene_has_only_root() {
        let scene = Scene::new();
        assert!(scene.is_empty());
        assert_eq!(scene.len(), 1);
        assert!(scene.children(scene.root()).is_empty());
    }

    #[test]
    fn test_add_and_children_order() {
        let mut scene = Scene::new();
        let a = scene.add(Node::group()).unwrap();
        let b = scene.add(Node::group()).unwrap();
        assert_eq!(scene.children(scene.root()), &[a, b]);
        assert_eq!(scene.get(a).unwrap().parent(), Some(scene.root()));
    }

    #[test]
    fn test_add_child_to_missing_parent() {
        let mut scene = Scene::new();
        let a = scene.add(Node::group()).unwrap();
        scene.remove(a).unwrap();
        assert!(matches!(scene.add_child(a, cube()), Err(Error::NodeNotFound(_))));
    }

    #[test]
    fn test_descendants_depth_first() {
        let mut scene = Scene::new();
        let group = scene.add(Node::group()).unwrap();
        let a = scene.add_child(group, Node::group()).unwrap();
        let a1 = scene.add_child(a, cube()).unwrap();
        let b = scene.add_child(group, cube()).unwrap();
        assert_eq!(scene.descendants(group), vec![a, a1, b]);
    }

    #[test]
    fn test_remove_subtree() {
        let mut scene = Scene::new();
        let group = scene.add(Node::group()).unwrap();
        let child = scene.add_child(group, cube()).unwrap();
        let removed = scene.remove(group).unwrap();
        assert!(removed.children().is_empty());
        assert!(!scene.contains(group));
        assert!(!scene.contains(child));
        assert!(scene.is_empty());
    }

    #[test]
    fn test_root_cannot_be_removed() {
        let mut scene = Scene::new();
        let root = scene.root();
        assert!(matches!(scene.remove(root), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_find_by_name() {
        let mut scene = Scene::new();
        let light = scene.add(Node::group().named("basisDirectionalLight")).unwrap();
        assert_eq!(scene.find_by_name("basisDirectionalLight"), Some(light));
        assert_eq!(scene.find_by_name("missing"), None);
    }

    #[test]
    fn test_world_matrix_nested_hierarchy() {
        let mut scene = Scene::new();
        let grandparent = scene.add(Node::group().at(Vec3::new(100.0, 0.0, 0.0))).unwrap();
        let parent = scene
            .add_child(grandparent, Node::group().at(Vec3::new(10.0, 0.0, 0.0)))
            .unwrap();
        let child = scene.add_child(parent, cube().at(Vec3::new(1.0, 0.0, 0.0))).unwrap();

        let pos = scene.world_position(child).unwrap();
        assert!((pos - Vec3::new(111.0, 0.0, 0.0)).length() < EPSILON, "got {:?}", pos);
    }

    #[test]
    fn test_world_matrix_with_parent_scale() {
        let mut scene = Scene::new();
        let parent = scene
            .add(Node::group().with_transform(Transform::new().with_scale(Vec3::splat(2.0))))
            .unwrap();
        let child = scene.add_child(parent, cube().at(Vec3::new(1.0, 0.0, 0.0))).unwrap();
        let pos = scene.world_position(child).unwrap();
        assert!((pos - Vec3::new(2.0, 0.0, 0.0)).length() < EPSILON);
    }

    #[test]
    fn test_hidden_parent_hides_subtree() {
        let mut scene = Scene::new();
        let group = scene.add(Node::group()).unwrap();
        let child = scene.add_child(group, cube()).unwrap();
        assert!(scene.is_visible(child));

        scene.get_mut(group).unwrap().visible = false;
        assert!(!scene.is_visible(child));
        let visible: Vec<NodeId> = scene.visible_nodes().into_iter().map(|(id, _)| id).collect();
        assert_eq!(visible, vec![scene.root()]);
    }

    #[test]
    fn test_visible_nodes_world_matrices() {
        let mut scene = Scene::new();
        let group = scene.add(Node::group().at(Vec3::new(0.0, 5.0, 0.0))).unwrap();
        let child = scene.add_child(group, cube().at(Vec3::new(1.0, 0.0, 0.0))).unwrap();
        let nodes = scene.visible_nodes();
        let (_, world) = nodes.iter().find(|(id, _)| *id == child).unwrap();
        assert_eq!(*world, scene.world_matrix(child).unwrap());
    }
}
