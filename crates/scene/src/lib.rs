//! Scene graph and components.
//!
//! This crate provides scene management:
//! - Node hierarchy with transforms, meshes, lights and overlay elements
//! - Perspective camera
//! - Ray casting against meshes
//! - Orbit camera controller

pub mod camera;
pub mod geometry;
pub mod graph;
pub mod light;
pub mod orbit;
pub mod raycast;
pub mod transform;

pub use camera::{Camera, Projection};
pub use geometry::{Aabb, Geometry, Material, Mesh};
pub use graph::{Background, Fog, Label, Node, NodeId, NodeKind, Panel, Scene};
pub use light::{AmbientLight, DirectionalLight, ShadowCamera};
pub use orbit::{DragMode, OrbitController};
pub use raycast::{Intersection, Ray, Raycaster};
pub use transform::Transform;
