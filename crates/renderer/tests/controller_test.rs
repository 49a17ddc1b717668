//! Integration tests for the scene controller.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::Vec3;

use stage_core::{Error, Result, SceneConfig};
use stage_platform::{PointerEvent, PointerEventKind, Viewport};
use stage_renderer::{RenderSurface, SceneController, SurfaceKind, SurfaceLayout};
use stage_scene::{Camera, Geometry, Material, Mesh, Node, NodeId, Scene};

fn controller(width: u32, height: u32) -> SceneController {
    SceneController::initialize(Viewport::new(width, height).unwrap(), &SceneConfig::default())
        .expect("controller should initialize")
}

fn cube_at(position: Vec3) -> Node {
    Node::mesh(Mesh::new(Geometry::cuboid(2.0, 2.0, 2.0), Material::default())).at(position)
}

/// Pixel coordinates of a world point on the controller's viewport.
fn pixel_of(controller: &SceneController, point: Vec3) -> (f32, f32) {
    let ndc = controller.camera().project(point).expect("point in front of camera");
    let viewport = controller.viewport();
    (
        (ndc.x + 1.0) * 0.5 * viewport.width() as f32,
        (1.0 - ndc.y) * 0.5 * viewport.height() as f32,
    )
}

fn counter() -> (Rc<Cell<u32>>, impl FnOnce() + 'static) {
    let count = Rc::new(Cell::new(0));
    let sink = Rc::clone(&count);
    (count, move || sink.set(sink.get() + 1))
}

#[test]
fn test_surfaces_match_viewport_after_init() {
    let controller = controller(800, 600);
    assert_eq!(controller.surfaces().len(), 3);
    for surface in controller.surfaces().iter() {
        assert_eq!(surface.size(), (800, 600));
        assert!(surface.layout().absolute);
    }
}

#[test]
fn test_resize_updates_camera_and_surfaces() {
    let mut controller = controller(800, 600);

    for _ in 0..2 {
        controller.resize(1024, 512).unwrap();
        assert!((controller.camera().aspect() - 2.0).abs() < 1e-6);
        assert!(controller.surfaces().iter().all(|s| s.size() == (1024, 512)));
    }

    assert!(matches!(controller.resize(1024, 0), Err(Error::Viewport(_))));
    assert!(controller.surfaces().iter().all(|s| s.size() == (1024, 512)));
}

#[test]
fn test_ramp_level_one() {
    let mut controller = controller(800, 600);
    let values = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&values);
    let (done, on_complete) = counter();

    let handle = controller
        .animate_ramp(1.0, move |v| sink.borrow_mut().push(v), on_complete)
        .unwrap();
    assert_eq!(*values.borrow(), vec![0.0]);

    for _ in 0..100 {
        controller.frame().unwrap();
    }
    let expected: Vec<f64> = (0..=100).map(|k| k as f64 / 100.0).collect();
    assert_eq!(*values.borrow(), expected);
    assert_eq!(done.get(), 0);

    controller.frame().unwrap();
    assert_eq!(done.get(), 1);
    assert!(handle.is_finished());

    for _ in 0..5 {
        controller.frame().unwrap();
    }
    assert_eq!(done.get(), 1);
    assert_eq!(values.borrow().len(), 101);
    assert!(values.borrow().iter().all(|&v| v <= 1.0));
}

#[test]
fn test_ramp_level_hundred_reaches_one_in_a_single_step() {
    let mut controller = controller(800, 600);
    let values = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&values);
    let (done, on_complete) = counter();

    let handle = controller
        .animate_ramp(100.0, move |v| sink.borrow_mut().push(v), on_complete)
        .unwrap();

    controller.frame().unwrap();
    assert_eq!(*values.borrow(), vec![0.0, 1.0]);
    assert_eq!(done.get(), 0);

    controller.frame().unwrap();
    assert_eq!(done.get(), 1);
    assert!(handle.is_finished());

    for _ in 0..3 {
        controller.frame().unwrap();
    }
    assert_eq!(*values.borrow(), vec![0.0, 1.0]);
    assert_eq!(done.get(), 1);
}

#[test]
fn test_ramp_level_zero_runs_until_cancelled() {
    let mut controller = controller(800, 600);
    let calls = Rc::new(Cell::new(0u32));
    let sink = Rc::clone(&calls);
    let (done, on_complete) = counter();

    let handle = controller
        .animate_ramp(
            0.0,
            move |v| {
                assert_eq!(v, 0.0);
                sink.set(sink.get() + 1);
            },
            on_complete,
        )
        .unwrap();

    for _ in 0..50 {
        controller.frame().unwrap();
    }
    assert_eq!(calls.get(), 51);
    assert!(handle.is_active());

    handle.cancel();
    let report = controller.frame().unwrap();
    assert_eq!(report.tasks.cancelled, 1);
    assert_eq!(calls.get(), 51);
    assert_eq!(done.get(), 0);
    assert_eq!(controller.pending_tasks(), 0);
}

#[test]
fn test_ramp_rejects_non_finite_level() {
    let mut controller = controller(800, 600);
    let result = controller.animate_ramp(f64::INFINITY, |_| {}, || {});
    assert!(matches!(result, Err(Error::InvalidInput(_))));
    assert_eq!(controller.pending_tasks(), 0);
}

#[test]
fn test_ease_ascending_completes_after_ten_frames() {
    let mut controller = controller(800, 600);
    let (done, on_complete) = counter();
    controller
        .ease_camera_to(1.0, Vec3::new(10.0, 0.0, 0.0), on_complete)
        .unwrap();
    assert_eq!(controller.camera().position, Vec3::new(1.0, 0.0, 0.0));

    for _ in 0..9 {
        controller.frame().unwrap();
    }
    assert_eq!(done.get(), 0);
    assert_eq!(controller.camera().position, Vec3::new(10.0, 0.0, 0.0));

    controller.frame().unwrap();
    assert_eq!(done.get(), 1);

    controller.frame().unwrap();
    assert_eq!(done.get(), 1);
    assert_eq!(controller.camera().position, Vec3::new(10.0, 0.0, 0.0));
}

#[test]
fn test_ease_descending_completes_after_five_frames() {
    let mut controller = controller(800, 600);
    let (done, on_complete) = counter();
    controller
        .ease_camera_to(-1.0, Vec3::splat(-5.0), on_complete)
        .unwrap();

    for _ in 0..4 {
        controller.frame().unwrap();
    }
    assert_eq!(done.get(), 0);
    controller.frame().unwrap();
    assert_eq!(done.get(), 1);
    assert_eq!(controller.camera().position, Vec3::splat(-5.0));
}

#[test]
fn test_cancelled_ease_never_completes() {
    let mut controller = controller(800, 600);
    let (done, on_complete) = counter();
    let handle = controller
        .ease_camera_to(1.0, Vec3::new(100.0, 0.0, 0.0), on_complete)
        .unwrap();
    controller.frame().unwrap();
    handle.cancel();
    for _ in 0..200 {
        controller.frame().unwrap();
    }
    assert_eq!(done.get(), 0);
    assert_eq!(controller.camera().position.x, 2.0);
}

fn clickable_group(controller: &mut SceneController) -> (NodeId, NodeId, NodeId) {
    let scene = controller.scene_mut();
    let group = scene.add(Node::group().named("targets")).unwrap();
    let left = scene.add_child(group, cube_at(Vec3::new(-3.0, 0.0, -20.0))).unwrap();
    let right = scene.add_child(group, cube_at(Vec3::new(3.0, 0.0, -20.0))).unwrap();
    (group, left, right)
}

#[test]
fn test_click_on_group() {
    let mut controller = controller(800, 600);
    let (group, _, _) = clickable_group(&mut controller);

    let hits = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&hits);
    controller
        .add_event_listener(group, PointerEventKind::Click, move |target| {
            sink.borrow_mut().push(target)
        })
        .unwrap();

    // Between the two cubes
    let mut miss = PointerEvent::new(PointerEventKind::Click, 400.0, 300.0);
    assert_eq!(controller.handle_pointer_event(&mut miss).unwrap(), 0);
    assert!(miss.default_prevented());
    assert!(hits.borrow().is_empty());

    let (x, y) = pixel_of(&controller, Vec3::new(3.3, -0.2, -19.0));
    let mut hit = PointerEvent::new(PointerEventKind::Click, x, y);
    assert_eq!(controller.handle_pointer_event(&mut hit).unwrap(), 1);
    assert_eq!(*hits.borrow(), vec![group]);

    let mut down = PointerEvent::new(PointerEventKind::Down, x, y);
    assert_eq!(controller.handle_pointer_event(&mut down).unwrap(), 0);
    assert!(!down.default_prevented());
    assert_eq!(hits.borrow().len(), 1);
}

#[test]
fn test_click_on_mesh_tests_only_that_mesh() {
    let mut controller = controller(800, 600);
    let (_, left, right) = clickable_group(&mut controller);

    let fired = Rc::new(Cell::new(0u32));
    let sink = Rc::clone(&fired);
    controller
        .add_event_listener(left, PointerEventKind::Click, move |target| {
            assert_eq!(target, left);
            sink.set(sink.get() + 1);
        })
        .unwrap();

    let (x, y) = pixel_of(&controller, Vec3::new(3.3, -0.2, -19.0));
    let mut on_right = PointerEvent::new(PointerEventKind::Click, x, y);
    controller.handle_pointer_event(&mut on_right).unwrap();
    assert_eq!(fired.get(), 0);

    let (x, y) = pixel_of(&controller, Vec3::new(-3.3, -0.2, -19.0));
    let mut on_left = PointerEvent::new(PointerEventKind::Click, x, y);
    controller.handle_pointer_event(&mut on_left).unwrap();
    assert_eq!(fired.get(), 1);

    // Hidden meshes still take clicks
    controller.scene_mut().get_mut(right).unwrap().visible = false;
    controller.scene_mut().get_mut(left).unwrap().visible = false;
    controller.handle_pointer_event(&mut on_left).unwrap();
    assert_eq!(fired.get(), 2);
}

#[test]
fn test_click_from_inside_mesh_needs_double_sided() {
    let mut controller = controller(800, 600);
    let room = Geometry::cuboid(10.0, 10.0, 10.0);
    let scene = controller.scene_mut();
    let single = scene.add(Node::mesh(Mesh::new(room.clone(), Material::default()))).unwrap();
    let double = scene
        .add(Node::mesh(Mesh::new(room, Material::default().with_double_sided(true))))
        .unwrap();

    let fired = Rc::new(RefCell::new(Vec::new()));
    for target in [single, double] {
        let sink = Rc::clone(&fired);
        controller
            .add_event_listener(target, PointerEventKind::Click, move |hit| sink.borrow_mut().push(hit))
            .unwrap();
    }

    // Camera sits at the origin, inside both boxes
    let mut click = PointerEvent::new(PointerEventKind::Click, 410.0, 290.0);
    assert_eq!(controller.handle_pointer_event(&mut click).unwrap(), 1);
    assert_eq!(*fired.borrow(), vec![double]);
}

#[test]
fn test_removed_listener_not_called() {
    let mut controller = controller(800, 600);
    let (group, _, _) = clickable_group(&mut controller);
    let fired = Rc::new(Cell::new(0u32));
    let sink = Rc::clone(&fired);
    let id = controller
        .add_event_listener(group, PointerEventKind::Click, move |_| sink.set(sink.get() + 1))
        .unwrap();
    controller.remove_event_listener(id);

    let (x, y) = pixel_of(&controller, Vec3::new(3.3, -0.2, -19.0));
    let mut event = PointerEvent::new(PointerEventKind::Click, x, y);
    assert_eq!(controller.handle_pointer_event(&mut event).unwrap(), 0);
    assert_eq!(fired.get(), 0);
}

/// Surface that records when it renders into a shared log.
struct RecordingSurface {
    kind: SurfaceKind,
    size: (u32, u32),
    layout: SurfaceLayout,
    log: Rc<RefCell<Vec<SurfaceKind>>>,
}

impl RenderSurface for RecordingSurface {
    fn kind(&self) -> SurfaceKind {
        self.kind
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

    fn render(&mut self, _scene: &Scene, _camera: &Camera) -> Result<()> {
        self.log.borrow_mut().push(self.kind);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn test_frames_render_surfaces_in_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let kinds = [SurfaceKind::Raster, SurfaceKind::Overlay2d, SurfaceKind::Overlay3d];
    let surfaces: Vec<Box<dyn RenderSurface>> = kinds
        .iter()
        .map(|&kind| {
            Box::new(RecordingSurface {
                kind,
                size: (0, 0),
                layout: SurfaceLayout::default(),
                log: Rc::clone(&log),
            }) as Box<dyn RenderSurface>
        })
        .collect();

    let mut controller =
        SceneController::with_surfaces(Viewport::new(320, 200).unwrap(), &SceneConfig::default(), surfaces)
            .unwrap();
    assert!(controller.surfaces().iter().all(|s| s.size() == (320, 200)));

    const FRAMES: usize = 4;
    for i in 0..FRAMES {
        let report = controller.frame().unwrap();
        assert_eq!(report.frame, i as u64 + 1);
        assert_eq!(report.surfaces, kinds.to_vec());
    }

    let expected: Vec<SurfaceKind> = kinds.iter().copied().cycle().take(FRAMES * 3).collect();
    assert_eq!(*log.borrow(), expected);
}

#[test]
fn test_raster_surface_sees_scene_meshes() {
    let mut controller = controller(800, 600);
    clickable_group(&mut controller);
    controller.frame().unwrap();

    let raster = controller
        .surfaces()
        .find::<stage_renderer::RasterSurface>()
        .expect("raster surface attached");
    assert_eq!(raster.last_packet().draws.len(), 2);
    assert_eq!(raster.last_packet().samples, 4);
}
