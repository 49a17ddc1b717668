//! Stage - Main Entry Point
//!
//! Opens a window, builds a small demo scene and drives a
//! [`SceneController`] from the winit event loop. Clicking the boxes eases
//! the camera toward them; the boxes fade in on startup.
//!
//! Usage: `stage [config.toml]`

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use glam::{Vec3, Vec4};
use tracing::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use stage_core::{SceneConfig, Timer};
use stage_platform::{FrameHandle, PointerEventKind, PointerTracker, Window};
use stage_renderer::SceneController;
use stage_scene::{Geometry, Material, Mesh, Node, NodeId, NodeKind};

/// Where the demo boxes sit and the camera orbits.
const FOCUS: Vec3 = Vec3::new(0.0, 0.0, -40.0);

/// How often the frame rate is logged.
const FPS_WINDOW: Duration = Duration::from_secs(5);

struct App {
    config: SceneConfig,
    window: Option<Window>,
    controller: Option<SceneController>,
    pointer: PointerTracker,
    timer: Timer,
    boxes: Vec<NodeId>,
    /// Camera ease in flight, cancelled when a new one starts
    ease: Option<FrameHandle>,
    /// Opacity driven by the startup ramp
    fade: Rc<Cell<f64>>,
}

impl App {
    fn new(config: SceneConfig) -> Self {
        Self {
            config,
            window: None,
            controller: None,
            pointer: PointerTracker::default(),
            timer: Timer::new(),
            boxes: Vec::new(),
            ease: None,
            fade: Rc::new(Cell::new(1.0)),
        }
    }

    fn build_scene(&mut self, controller: &mut SceneController) -> stage_core::Result<()> {
        controller.controls_mut().target = FOCUS;

        let scene = controller.scene_mut();
        let group = scene.add(Node::group().named("boxes").at(FOCUS))?;
        let palette = [0xe05d5d, 0x5de08a, 0x5d8ae0];
        for (i, color) in palette.into_iter().enumerate() {
            let x = (i as f32 - 1.0) * 4.0;
            let mesh = Mesh::new(
                Geometry::cuboid(2.0, 2.0, 2.0),
                Material::color(stage_core::config::hex_to_rgb(color)),
            )
            .with_shadows(true, true);
            let id = scene.add_child(group, Node::mesh(mesh).at(Vec3::new(x, 0.0, 0.0)))?;
            self.boxes.push(id);
        }
        scene.add_child(group, Node::label("click a box").at(Vec3::new(0.0, 2.5, 0.0)))?;
        scene.add_child(group, Node::panel("info", 6.0, 2.0).at(Vec3::new(0.0, -3.0, 0.0)))?;

        let ground = Mesh::new(Geometry::plane(40.0, 40.0), Material::color(Vec3::splat(0.6))).with_shadows(false, true);
        scene.add_child(
            group,
            Node::mesh(ground).with_transform(
                stage_scene::Transform::new()
                    .with_position(Vec3::new(0.0, -1.0, 0.0))
                    .with_rotation(glam::Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)),
            ),
        )?;

        controller.add_event_listener(group, PointerEventKind::Click, |target| {
            info!("Clicked {:?}", target);
        })?;

        let fade = Rc::clone(&self.fade);
        controller.animate_ramp(
            2.0,
            move |value| fade.set(value),
            || debug!("Boxes faded in"),
        )?;
        Ok(())
    }

    /// Copy the ramp value into the box materials.
    fn apply_fade(&self, controller: &mut SceneController) {
        let alpha = self.fade.get() as f32;
        for &id in &self.boxes {
            if let Some(node) = controller.scene_mut().get_mut(id)
                && let NodeKind::Mesh(mesh) = &mut node.kind
            {
                let color = mesh.material.base_color;
                mesh.material.base_color = Vec4::new(color.x, color.y, color.z, alpha);
            }
        }
    }

    /// Ease toward the boxes, or back to the start when already close.
    fn on_click(&mut self, controller: &mut SceneController) {
        if let Some(previous) = self.ease.take() {
            previous.cancel();
        }
        let close = FOCUS + Vec3::Z * 15.0;
        let (step, target) = if controller.camera().position.z > close.z {
            (-0.5, close)
        } else {
            (0.5, Vec3::ZERO)
        };
        match controller.ease_camera_to(step, target, || info!("Camera arrived")) {
            Ok(handle) => self.ease = Some(handle),
            Err(e) => warn!("Could not start camera ease: {}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = match Window::new(event_loop, 1280, 720, "Stage") {
            Ok(window) => window,
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        self.pointer.set_scale_factor(window.scale_factor());

        let mut controller = match SceneController::initialize(window.viewport(), &self.config) {
            Ok(controller) => controller,
            Err(e) => {
                error!("Failed to create scene controller: {}", e);
                event_loop.exit();
                return;
            }
        };
        if let Err(e) = self.build_scene(&mut controller) {
            error!("Failed to build demo scene: {}", e);
            event_loop.exit();
            return;
        }

        info!("Initialization complete, entering main loop");
        self.controller = Some(controller);
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let pointer_events = self.pointer.on_window_event(&event);
        if !pointer_events.is_empty()
            && let Some(mut controller) = self.controller.take()
        {
            for mut pointer_event in pointer_events {
                match controller.handle_pointer_event(&mut pointer_event) {
                    Ok(hits) if hits > 0 => self.on_click(&mut controller),
                    Ok(_) => {}
                    Err(e) => warn!("Pointer event failed: {}", e),
                }
            }
            self.controller = Some(controller);
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                let Some(window) = self.window.as_mut() else { return };
                let Some(viewport) = window.resize(size.width, size.height) else { return };
                if let Some(controller) = self.controller.as_mut()
                    && let Err(e) = controller.resize(viewport.width(), viewport.height())
                {
                    error!("Resize failed: {}", e);
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.pointer.set_scale_factor(scale_factor);
            }
            WindowEvent::RedrawRequested => {
                self.timer.tick();
                if let Some(fps) = self.timer.sample_fps(FPS_WINDOW) {
                    info!("{:.1} fps", fps);
                }

                let Some(mut controller) = self.controller.take() else { return };
                if let Err(e) = controller.frame() {
                    error!("Frame error: {}", e);
                }
                self.apply_fade(&mut controller);
                self.controller = Some(controller);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

fn load_config() -> Result<SceneConfig> {
    match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => SceneConfig::load(&path).with_context(|| format!("loading {}", path.display())),
        None => Ok(SceneConfig::default()),
    }
}

fn main() -> Result<()> {
    stage_core::init_logging();
    info!("Starting Stage");

    let config = load_config()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
