//! Scene controller.
//!
//! Owns the scene, camera, surface stack, orbit controller and per-frame
//! scheduler, and exposes the operations the host drives: render a frame,
//! resize, dispatch pointer events, run animations.

use glam::{Vec2, Vec3};
use tracing::{debug, info, trace, warn};

use stage_core::config::{SceneConfig, hex_to_rgb};
use stage_core::{Error, Result};
use stage_platform::{
    FrameHandle, FrameScheduler, FrameTaskStats, PointerButton, PointerEvent, PointerEventKind, Viewport,
};
use stage_scene::{
    AmbientLight, Background, Camera, DirectionalLight, DragMode, Fog, Node, NodeId, NodeKind, OrbitController,
    Raycaster, Scene,
};

use crate::animation::{CameraEase, Ramp};
use crate::overlay::{Overlay2dSurface, Overlay3dSurface};
use crate::raster::{RasterOptions, RasterSurface};
use crate::surface::{RenderSurface, SurfaceKind, SurfaceStack};

/// State per-frame tasks may touch.
pub struct Stage {
    pub scene: Scene,
    pub camera: Camera,
    pub controls: OrbitController,
}

/// Identifies a registered pointer listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct PointerListener {
    id: ListenerId,
    target: NodeId,
    kind: PointerEventKind,
    callback: Box<dyn FnMut(NodeId)>,
}

/// What one call to [`SceneController::frame`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameReport {
    /// 1-based frame index
    pub frame: u64,
    /// Surfaces rendered, bottom to top
    pub surfaces: Vec<SurfaceKind>,
    /// Whether the orbit controller moved the camera
    pub controls_moved: bool,
    pub tasks: FrameTaskStats,
}

/// Drives a scene through its surfaces.
pub struct SceneController {
    stage: Stage,
    surfaces: SurfaceStack,
    scheduler: FrameScheduler<Stage>,
    listeners: Vec<PointerListener>,
    next_listener_id: u64,
    viewport: Viewport,
    directional_light_name: String,
}

impl SceneController {
    /// Build a controller with the raster, 2D overlay and 3D overlay surfaces.
    pub fn initialize(viewport: Viewport, config: &SceneConfig) -> Result<Self> {
        let surfaces: Vec<Box<dyn RenderSurface>> = vec![
            Box::new(RasterSurface::new(RasterOptions::from(&config.raster))),
            Box::new(Overlay2dSurface::new()),
            Box::new(Overlay3dSurface::new()),
        ];
        Self::with_surfaces(viewport, config, surfaces)
    }

    /// Build a controller over caller-supplied surfaces, bottom to top.
    pub fn with_surfaces(
        viewport: Viewport,
        config: &SceneConfig,
        surfaces: Vec<Box<dyn RenderSurface>>,
    ) -> Result<Self> {
        config.validate()?;
        if surfaces.is_empty() {
            return Err(Error::Surface("at least one surface is required".into()));
        }
        info!(
            "Initializing scene controller ({}x{})",
            viewport.width(),
            viewport.height()
        );

        let mut scene = Scene::new();
        scene.background = Background {
            color: hex_to_rgb(config.background.color),
            fog: config.background.fog.as_ref().map(|fog| Fog {
                color: hex_to_rgb(fog.color),
                near: fog.near,
                far: fog.far,
            }),
        };

        let camera_config = &config.camera;
        let mut camera = Camera::perspective(
            camera_config.fov_degrees,
            viewport.aspect_ratio(),
            camera_config.near,
            camera_config.far,
        )?;
        camera.position = Vec3::from_array(camera_config.position);
        camera.look_at(Vec3::from_array(camera_config.look_at));

        let mut stack = SurfaceStack::new();
        for surface in surfaces {
            stack.attach(surface, viewport);
        }

        let mut controls = OrbitController::from_config(&config.controls);
        controls.set_surface_height(viewport.height());

        let mut controller = Self {
            stage: Stage {
                scene,
                camera,
                controls,
            },
            surfaces: stack,
            scheduler: FrameScheduler::new(),
            listeners: Vec::new(),
            next_listener_id: 0,
            viewport,
            directional_light_name: config.lights.directional_name.clone(),
        };
        controller.add_lights(config)?;

        info!("Scene controller ready with {} surface(s)", controller.surfaces.len());
        Ok(controller)
    }

    fn add_lights(&mut self, config: &SceneConfig) -> Result<()> {
        let lights = &config.lights;
        let scene = &mut self.stage.scene;

        let ambient = AmbientLight::new(hex_to_rgb(lights.ambient_color), lights.ambient_intensity);
        scene.add(Node::new(NodeKind::AmbientLight(ambient)))?;

        let mut directional = DirectionalLight::new(hex_to_rgb(lights.directional_color), lights.directional_intensity)
            .with_shadow(lights.directional_cast_shadow);
        directional.shadow.map_size = config.raster.shadow_map_size;
        let position = Vec3::from_array(lights.directional_position);
        scene.add(
            Node::new(NodeKind::DirectionalLight(directional))
                .named(lights.directional_name.clone())
                .at(position),
        )?;

        info!(
            "Added lights: ambient {:#08x} x{}, directional '{}' at {} (shadows: {})",
            lights.ambient_color,
            lights.ambient_intensity,
            lights.directional_name,
            position,
            lights.directional_cast_shadow
        );
        Ok(())
    }

    pub fn scene(&self) -> &Scene {
        &self.stage.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.stage.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.stage.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.stage.camera
    }

    pub fn controls(&self) -> &OrbitController {
        &self.stage.controls
    }

    pub fn controls_mut(&mut self) -> &mut OrbitController {
        &mut self.stage.controls
    }

    pub fn surfaces(&self) -> &SurfaceStack {
        &self.surfaces
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The directional light created at initialization, if still present.
    pub fn directional_light(&self) -> Option<NodeId> {
        self.stage.scene.find_by_name(&self.directional_light_name)
    }

    /// Number of per-frame tasks still scheduled.
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    /// Render every surface, apply orbit input, then step frame tasks.
    pub fn frame(&mut self) -> Result<FrameReport> {
        let Stage {
            scene,
            camera,
            controls,
        } = &mut self.stage;

        let surfaces = self.surfaces.render_all(scene, camera)?;
        let controls_moved = controls.update(camera);
        let tasks = self.scheduler.run_frame(&mut self.stage);

        let frame = self.scheduler.frame();
        trace!("Frame {} done", frame);
        Ok(FrameReport {
            frame,
            surfaces,
            controls_moved,
            tasks,
        })
    }

    /// Match camera and surfaces to a new viewport size.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let viewport = Viewport::new(width, height)?;
        self.stage.camera.set_aspect(viewport.aspect_ratio())?;
        self.surfaces.resize_all(width, height);
        self.stage.controls.set_surface_height(height);

        if viewport != self.viewport {
            debug!(
                "Resize: {}x{} -> {}x{}",
                self.viewport.width(),
                self.viewport.height(),
                width,
                height
            );
        }
        self.viewport = viewport;
        Ok(())
    }

    /// Call `callback(target)` whenever a `kind` event hits `target` or,
    /// for non-mesh targets, any mesh below it.
    pub fn add_event_listener<F>(&mut self, target: NodeId, kind: PointerEventKind, callback: F) -> Result<ListenerId>
    where
        F: FnMut(NodeId) + 'static,
    {
        self.stage.scene.node(target)?;
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push(PointerListener {
            id,
            target,
            kind,
            callback: Box::new(callback),
        });
        debug!("Registered {:?} listener {:?} on {:?}", kind, id, target);
        Ok(id)
    }

    /// Returns whether a listener was removed.
    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.id != id);
        let removed = self.listeners.len() != before;
        if removed {
            debug!("Removed listener {:?}", id);
        }
        removed
    }

    /// Feed a pointer event to the orbit controller and the listeners.
    /// Returns how many listener callbacks fired.
    pub fn handle_pointer_event(&mut self, event: &mut PointerEvent) -> Result<usize> {
        self.forward_to_controls(event);

        let (width, height) = self
            .surfaces
            .topmost()
            .map(|surface| surface.size())
            .unwrap_or((self.viewport.width(), self.viewport.height()));
        let input = Viewport::new(width, height)?;
        let (ndc_x, ndc_y) = input.to_ndc(event.x, event.y);
        let raycaster = Raycaster::from_camera(Vec2::new(ndc_x, ndc_y), &self.stage.camera);

        let kind = event.kind;
        let mut fired = 0;
        for listener in self.listeners.iter_mut().filter(|l| l.kind == kind) {
            event.prevent_default();

            let scene = &self.stage.scene;
            let Some(node) = scene.get(listener.target) else {
                warn!("Listener {:?} target {:?} no longer exists", listener.id, listener.target);
                continue;
            };
            let hits = if node.is_mesh() {
                raycaster.intersect_nodes(scene, &[listener.target], false)?
            } else {
                raycaster.intersect_nodes(scene, node.children(), true)?
            };
            if !hits.is_empty() {
                trace!("Listener {:?} hit {} mesh(es)", listener.id, hits.len());
                (listener.callback)(listener.target);
                fired += 1;
            }
        }
        Ok(fired)
    }

    fn forward_to_controls(&mut self, event: &PointerEvent) {
        let Stage { camera, controls, .. } = &mut self.stage;
        match event.kind {
            PointerEventKind::Down => match event.button {
                Some(PointerButton::Primary) => controls.begin_drag(DragMode::Rotate, event.x, event.y),
                Some(PointerButton::Secondary) => controls.begin_drag(DragMode::Pan, event.x, event.y),
                _ => {}
            },
            PointerEventKind::Move => controls.drag_to(camera, event.x, event.y),
            PointerEventKind::Up => controls.end_drag(),
            PointerEventKind::Wheel => controls.wheel(event.wheel_delta),
            PointerEventKind::Click => {}
        }
    }

    /// Report `0` now, then `0.01 * level` more each frame (rounded to two
    /// decimals) while the value stays at or below 1; past 1, call
    /// `on_complete` once and stop.
    pub fn animate_ramp<U, C>(&mut self, level: f64, on_update: U, on_complete: C) -> Result<FrameHandle>
    where
        U: FnMut(f64) + 'static,
        C: FnOnce() + 'static,
    {
        let mut ramp = Ramp::new(level, Box::new(on_update), Box::new(on_complete))?;
        ramp.start();
        let handle = self.scheduler.schedule(move |_stage: &mut Stage| ramp.step());
        debug!("Started ramp {} at level {}", handle.id(), level);
        Ok(handle)
    }

    /// Move the camera by `step` on every axis that has not reached
    /// `target`, now and once per frame, until all axes have arrived.
    pub fn ease_camera_to<C>(&mut self, step: f32, target: Vec3, on_complete: C) -> Result<FrameHandle>
    where
        C: FnOnce() + 'static,
    {
        let mut ease = CameraEase::new(step, target, Box::new(on_complete))?;
        ease.advance(&mut self.stage.camera);
        let handle = self
            .scheduler
            .schedule(move |stage: &mut Stage| ease.step(&mut stage.camera));
        debug!("Started camera ease {} toward {} (step {})", handle.id(), target, step);
        Ok(handle)
    }
}
