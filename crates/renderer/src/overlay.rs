//! Overlay surfaces.
//!
//! Overlays do not rasterize. They compute where host elements go: the 2D
//! overlay pins [`Label`](stage_scene::Label) nodes to the screen position
//! of their world point, the 3D overlay gives each
//! [`Panel`](stage_scene::Panel) node a full transform under the camera's
//! perspective.

use std::any::Any;

use glam::{Mat4, Vec3};
use tracing::trace;

use stage_core::Result;
use stage_scene::{Camera, NodeId, NodeKind, Scene};

use crate::surface::{RenderSurface, SurfaceKind, SurfaceLayout};

/// Where a label lands on screen.
#[derive(Clone, Debug, PartialEq)]
pub struct LabelPlacement {
    pub node: NodeId,
    pub text: String,
    pub class: Option<String>,
    /// Pixels from the left edge
    pub x: f32,
    /// Pixels from the top edge
    pub y: f32,
    /// Distance from the camera
    pub distance: f32,
    /// Stacking order among labels; nearer labels are higher
    pub z_order: usize,
}

/// Positions labels over the raster layer.
pub struct Overlay2dSurface {
    size: (u32, u32),
    layout: SurfaceLayout,
    labels: Vec<LabelPlacement>,
}

impl Default for Overlay2dSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Overlay2dSurface {
    pub fn new() -> Self {
        Self {
            size: (0, 0),
            layout: SurfaceLayout::default(),
            labels: Vec::new(),
        }
    }

    /// Labels placed by the most recent render.
    pub fn labels(&self) -> &[LabelPlacement] {
        &self.labels
    }
}

impl RenderSurface for Overlay2dSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Overlay2d
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn layout(&self) -> SurfaceLayout {
        self.layout
    }

    fn set_layout(&mut self, layout: SurfaceLayout) {
        self.layout = layout;
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<()> {
        let (width, height) = (self.size.0 as f32, self.size.1 as f32);
        let mut labels = Vec::new();

        for (id, world) in scene.visible_nodes() {
            let Some(NodeKind::Label(label)) = scene.get(id).map(|n| &n.kind) else {
                continue;
            };
            let position = world.w_axis.truncate();
            let Some(ndc) = camera.project(position) else {
                continue;
            };
            if !(0.0..=1.0).contains(&ndc.z) {
                continue;
            }
            labels.push(LabelPlacement {
                node: id,
                text: label.text.clone(),
                class: label.class.clone(),
                x: (ndc.x * 0.5 + 0.5) * width,
                y: (-ndc.y * 0.5 + 0.5) * height,
                distance: position.distance(camera.position),
                z_order: 0,
            });
        }

        // Farthest first, so nearer labels stack on top.
        labels.sort_by(|a, b| b.distance.total_cmp(&a.distance));
        for (z_order, label) in labels.iter_mut().enumerate() {
            label.z_order = z_order;
        }
        trace!("Overlay-2d placed {} label(s)", labels.len());
        self.labels = labels;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Transform of a panel relative to the overlay's perspective origin.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelPlacement {
    pub node: NodeId,
    pub content: String,
    /// Element size in world units
    pub size: (f32, f32),
    /// Camera-space transform with the Y axis flipped to screen convention
    pub matrix: Mat4,
}

/// Places panels in 3D under the camera's perspective.
pub struct Overlay3dSurface {
    size: (u32, u32),
    layout: SurfaceLayout,
    perspective: f32,
    panels: Vec<PanelPlacement>,
}

impl Default for Overlay3dSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Overlay3dSurface {
    pub fn new() -> Self {
        Self {
            size: (0, 0),
            layout: SurfaceLayout::default(),
            perspective: 0.0,
            panels: Vec::new(),
        }
    }

    /// Viewer distance in pixels matching the camera's vertical field of view.
    pub fn perspective(&self) -> f32 {
        self.perspective
    }

    pub fn panels(&self) -> &[PanelPlacement] {
        &self.panels
    }
}

/// Negate the Y axis on both sides: world Y up, screen Y down.
fn flip_y(matrix: Mat4) -> Mat4 {
    let flip = Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0));
    flip * matrix * flip
}

impl RenderSurface for Overlay3dSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Overlay3d
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn layout(&self) -> SurfaceLayout {
        self.layout
    }

    fn set_layout(&mut self, layout: SurfaceLayout) {
        self.layout = layout;
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<()> {
        let half_height = self.size.1 as f32 * 0.5;
        self.perspective = camera.projection_matrix().y_axis.y * half_height;

        let view = camera.view_matrix();
        let mut panels = Vec::new();
        for (id, world) in scene.visible_nodes() {
            let Some(NodeKind::Panel(panel)) = scene.get(id).map(|n| &n.kind) else {
                continue;
            };
            let camera_space = view * world;
            // Behind the viewer
            if camera_space.w_axis.z >= 0.0 {
                continue;
            }
            panels.push(PanelPlacement {
                node: id,
                content: panel.content.clone(),
                size: panel.size,
                matrix: flip_y(camera_space),
            });
        }
        trace!("Overlay-3d placed {} panel(s)", panels.len());
        self.panels = panels;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stage_scene::Node;

    const EPSILON: f32 = 1e-3;

    fn camera() -> Camera {
        let mut camera = Camera::perspective(30.0, 2.0, 1.0, 10000.0).unwrap();
        camera.position = Vec3::new(0.0, 0.0, 10.0);
        camera.look_at(Vec3::ZERO);
        camera
    }

    #[test]
    fn test_label_at_center() {
        let mut scene = Scene::new();
        let label = scene.add(Node::label("origin")).unwrap();

        let mut overlay = Overlay2dSurface::new();
        overlay.set_size(200, 100);
        overlay.render(&scene, &camera()).unwrap();

        let placed = &overlay.labels()[0];
        assert_eq!(placed.node, label);
        assert!((placed.x - 100.0).abs() < EPSILON);
        assert!((placed.y - 50.0).abs() < EPSILON);
    }

    #[test]
    fn test_label_above_center_moves_up() {
        let mut scene = Scene::new();
        scene.add(Node::label("up").at(Vec3::new(0.0, 1.0, 0.0))).unwrap();

        let mut overlay = Overlay2dSurface::new();
        overlay.set_size(200, 100);
        overlay.render(&scene, &camera()).unwrap();
        assert!(overlay.labels()[0].y < 50.0);
    }

    #[test]
    fn test_labels_behind_camera_hidden() {
        let mut scene = Scene::new();
        scene.add(Node::label("behind").at(Vec3::new(0.0, 0.0, 20.0))).unwrap();

        let mut overlay = Overlay2dSurface::new();
        overlay.set_size(200, 100);
        overlay.render(&scene, &camera()).unwrap();
        assert!(overlay.labels().is_empty());
    }

    #[test]
    fn test_nearer_labels_stack_on_top() {
        let mut scene = Scene::new();
        let far = scene.add(Node::label("far").at(Vec3::new(0.0, 0.0, -5.0))).unwrap();
        let near = scene.add(Node::label("near").at(Vec3::new(0.0, 0.0, 5.0))).unwrap();

        let mut overlay = Overlay2dSurface::new();
        overlay.set_size(200, 100);
        overlay.render(&scene, &camera()).unwrap();

        let z = |id| overlay.labels().iter().find(|l| l.node == id).map(|l| l.z_order);
        assert!(z(near) > z(far));
    }

    #[test]
    fn test_panel_transform_and_perspective() {
        let mut scene = Scene::new();
        let panel = scene.add(Node::panel("card", 2.0, 1.0).at(Vec3::new(0.0, 1.0, 0.0))).unwrap();
        scene.add(Node::panel("behind", 2.0, 1.0).at(Vec3::new(0.0, 0.0, 30.0))).unwrap();

        let mut overlay = Overlay3dSurface::new();
        overlay.set_size(200, 100);
        overlay.render(&scene, &camera()).unwrap();

        let expected = 50.0 / (15.0_f32.to_radians()).tan();
        assert!((overlay.perspective() - expected).abs() < EPSILON);

        assert_eq!(overlay.panels().len(), 1);
        let placed = &overlay.panels()[0];
        assert_eq!(placed.node, panel);
        // One unit above the view axis becomes one unit toward the top edge.
        assert!((placed.matrix.w_axis.y + 1.0).abs() < EPSILON);
        assert!((placed.matrix.w_axis.z + 10.0).abs() < EPSILON);
    }
}
