//! Orbit camera controller.
//!
//! Pointer drags rotate the camera around a target point, secondary drags
//! pan the target, and the wheel dollies toward or away from it. Input is
//! accumulated between frames and applied by [`OrbitController::update`].
//!
//! The controller keeps no camera state of its own: every update starts
//! from the camera's current offset to the target, so code that moves the
//! camera directly between frames is never fought.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use stage_core::config::ControlsConfig;

use crate::camera::Camera;

/// Keeps the polar angle off the poles so the view never flips.
const POLAR_EPSILON: f32 = 1e-6;

/// Orbit position in spherical coordinates, Y up.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y
    phi: f32,
    /// Azimuth around +Y from +Z
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

/// What drag gesture is in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragMode {
    Rotate,
    Pan,
}

/// Binds pointer input to camera orbit around a target point.
#[derive(Clone, Debug)]
pub struct OrbitController {
    /// Point the camera orbits and looks at
    pub target: Vec3,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub enabled: bool,

    /// Pending azimuth/polar deltas in radians
    theta_delta: f32,
    phi_delta: f32,
    /// Pending radius multiplier
    scale: f32,
    /// Pending target translation in world units
    pan_offset: Vec3,

    drag: Option<(DragMode, f32, f32)>,
    /// Height in pixels of the input surface, for turning drags into angles
    surface_height: f32,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::from_config(&ControlsConfig::default())
    }
}

impl OrbitController {
    /// Create a controller from its configuration.
    pub fn from_config(config: &ControlsConfig) -> Self {
        Self {
            target: Vec3::from_array(config.target),
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            pan_speed: config.pan_speed,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            enable_damping: config.enable_damping,
            damping_factor: config.damping_factor,
            enabled: true,
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
            drag: None,
            surface_height: 1.0,
        }
    }

    /// Tell the controller the size of the surface it receives input from.
    pub fn set_surface_height(&mut self, height: u32) {
        self.surface_height = height.max(1) as f32;
    }

    /// True when input is waiting to be applied.
    pub fn has_pending_input(&self) -> bool {
        self.theta_delta != 0.0
            || self.phi_delta != 0.0
            || self.scale != 1.0
            || self.pan_offset != Vec3::ZERO
    }

    pub fn drag_mode(&self) -> Option<DragMode> {
        self.drag.map(|(mode, _, _)| mode)
    }

    /// Start a drag at pointer position `(x, y)`.
    pub fn begin_drag(&mut self, mode: DragMode, x: f32, y: f32) {
        if self.enabled {
            self.drag = Some((mode, x, y));
        }
    }

    /// Continue a drag; ignored when no drag is active.
    pub fn drag_to(&mut self, camera: &Camera, x: f32, y: f32) {
        let Some((mode, last_x, last_y)) = self.drag else {
            return;
        };
        let (dx, dy) = (x - last_x, y - last_y);
        match mode {
            DragMode::Rotate => {
                self.rotate_left(TAU * dx / self.surface_height * self.rotate_speed);
                self.rotate_up(TAU * dy / self.surface_height * self.rotate_speed);
            }
            DragMode::Pan => self.pan(camera, dx, dy),
        }
        self.drag = Some((mode, x, y));
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Dolly in for positive wheel deltas (scrolling away from the user), out otherwise.
    pub fn wheel(&mut self, delta: f32) {
        if !self.enabled || delta == 0.0 {
            return;
        }
        let factor = 0.95_f32.powf(self.zoom_speed);
        if delta > 0.0 {
            self.scale *= factor;
        } else {
            self.scale /= factor;
        }
    }

    /// Queue an azimuth rotation.
    pub fn rotate_left(&mut self, angle: f32) {
        self.theta_delta -= angle;
    }

    /// Queue a polar rotation.
    pub fn rotate_up(&mut self, angle: f32) {
        self.phi_delta -= angle;
    }

    /// Queue a screen-space pan of `(dx, dy)` pixels.
    pub fn pan(&mut self, camera: &Camera, dx: f32, dy: f32) {
        let distance = (camera.position - self.target).length();
        let half_fov = (camera.projection().fov_y() * 0.5).tan();
        let world_per_pixel = 2.0 * distance * half_fov / self.surface_height;
        self.pan_offset += (camera.right() * -dx + camera.up() * dy) * world_per_pixel * self.pan_speed;
    }

    /// Apply accumulated input to the camera and aim it at the target.
    ///
    /// The camera position is rewritten only while input is pending, so a
    /// camera moved externally keeps its exact coordinates. Returns whether
    /// the position changed.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let moved = self.has_pending_input();
        if moved {
            let mut spherical = Spherical::from_offset(camera.position - self.target);
            spherical.theta += self.theta_delta;
            spherical.phi = (spherical.phi + self.phi_delta).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
            spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

            self.target += self.pan_offset;
            camera.position = self.target + spherical.to_offset();

            if self.enable_damping {
                let keep = 1.0 - self.damping_factor;
                self.theta_delta *= keep;
                self.phi_delta *= keep;
                self.pan_offset *= keep;
                if self.theta_delta.abs() < 1e-6 && self.phi_delta.abs() < 1e-6 {
                    self.theta_delta = 0.0;
                    self.phi_delta = 0.0;
                }
                if self.pan_offset.length_squared() < 1e-12 {
                    self.pan_offset = Vec3::ZERO;
                }
            } else {
                self.theta_delta = 0.0;
                self.phi_delta = 0.0;
                self.pan_offset = Vec3::ZERO;
            }
            self.scale = 1.0;
        }

        camera.look_at(self.target);
        moved
    }
}
