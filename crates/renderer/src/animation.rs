//! Frame-driven animation helpers.
//!
//! Each helper takes one immediate step when created and then one step per
//! frame through the controller's [`FrameScheduler`](stage_platform::FrameScheduler).
//! Completion callbacks fire at most once and never after cancellation.

use glam::Vec3;

use stage_core::{Error, Result};
use stage_platform::FrameStatus;
use stage_scene::Camera;

pub type UpdateCallback = Box<dyn FnMut(f64)>;
pub type CompleteCallback = Box<dyn FnOnce()>;

/// Upper end of the ramp.
const RAMP_END: f64 = 1.0;

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Counts from 0 to 1 in steps of `0.01 * level`, rounded to two decimals.
pub struct Ramp {
    value: f64,
    step: f64,
    on_update: UpdateCallback,
    on_complete: Option<CompleteCallback>,
}

impl Ramp {
    pub fn new(level: f64, on_update: UpdateCallback, on_complete: CompleteCallback) -> Result<Self> {
        if !level.is_finite() {
            return Err(Error::InvalidInput(format!("ramp level must be finite, got {}", level)));
        }
        Ok(Self {
            value: 0.0,
            step: 0.01 * level,
            on_update,
            on_complete: Some(on_complete),
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Report the starting value.
    pub fn start(&mut self) {
        (self.on_update)(self.value);
    }

    /// Advance one frame.
    pub fn step(&mut self) -> FrameStatus {
        self.value = round_hundredths(self.value + self.step);
        if self.value > RAMP_END {
            if let Some(on_complete) = self.on_complete.take() {
                on_complete();
            }
            return FrameStatus::Done;
        }
        (self.on_update)(self.value);
        FrameStatus::Continue
    }
}

/// Moves the camera toward a target by a fixed amount per axis per frame.
///
/// The direction comes from the sign of `step` alone: a non-negative step
/// only ever increases coordinates, a negative one only decreases them.
/// Axes already at or past the target stay put.
pub struct CameraEase {
    step: f32,
    target: Vec3,
    on_complete: Option<CompleteCallback>,
}

impl CameraEase {
    pub fn new(step: f32, target: Vec3, on_complete: CompleteCallback) -> Result<Self> {
        if !step.is_finite() {
            return Err(Error::InvalidInput(format!("ease step must be finite, got {}", step)));
        }
        if !target.is_finite() {
            return Err(Error::InvalidInput(format!("ease target must be finite, got {}", target)));
        }
        Ok(Self {
            step,
            target,
            on_complete: Some(on_complete),
        })
    }

    fn ascending(&self) -> bool {
        self.step >= 0.0
    }

    fn axis_reached(&self, current: f32, target: f32) -> bool {
        if self.ascending() {
            current >= target
        } else {
            current <= target
        }
    }

    /// True once every axis is at or past the target.
    pub fn reached(&self, camera: &Camera) -> bool {
        let position = camera.position.to_array();
        let target = self.target.to_array();
        position.iter().zip(target).all(|(&p, t)| self.axis_reached(p, t))
    }

    /// Move every axis that has not arrived by one step.
    pub fn advance(&self, camera: &mut Camera) {
        let mut position = camera.position.to_array();
        for (p, t) in position.iter_mut().zip(self.target.to_array()) {
            if !self.axis_reached(*p, t) {
                *p += self.step;
            }
        }
        camera.position = Vec3::from_array(position);
    }

    /// Advance one frame: complete if arrived, otherwise move.
    pub fn step(&mut self, camera: &mut Camera) -> FrameStatus {
        if self.reached(camera) {
            if let Some(on_complete) = self.on_complete.take() {
                on_complete();
            }
            return FrameStatus::Done;
        }
        self.advance(camera);
        FrameStatus::Continue
    }
}
