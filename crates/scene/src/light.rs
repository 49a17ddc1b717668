//! Light definitions for the scene.
//!
//! Lights are scene nodes; their position comes from the node transform.

use glam::{Mat4, Vec3};

/// Uniform light applied to every surface regardless of orientation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    /// Light color
    pub color: Vec3,
    /// Light intensity
    pub intensity: f32,
}

impl AmbientLight {
    pub fn new(color: Vec3, intensity: f32) -> Self {
        Self { color, intensity }
    }

    /// Color premultiplied by intensity.
    pub fn radiance(&self) -> Vec3 {
        self.color * self.intensity
    }
}

/// Orthographic volume a directional light renders its shadow map from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowCamera {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
    /// Shadow map edge length in texels
    pub map_size: u32,
}

impl Default for ShadowCamera {
    fn default() -> Self {
        Self {
            left: -5.0,
            right: 5.0,
            bottom: -5.0,
            top: 5.0,
            near: 0.5,
            far: 500.0,
            map_size: 512,
        }
    }
}

/// A directional light (sun-like) shining from its node position toward `target`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    /// Light color
    pub color: Vec3,
    /// Light intensity
    pub intensity: f32,
    /// World-space point the light aims at
    pub target: Vec3,
    pub cast_shadow: bool,
    pub shadow: ShadowCamera,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 1.0,
            target: Vec3::ZERO,
            cast_shadow: false,
            shadow: ShadowCamera::default(),
        }
    }
}

impl DirectionalLight {
    pub fn new(color: Vec3, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            ..Self::default()
        }
    }

    pub fn with_shadow(mut self, cast_shadow: bool) -> Self {
        self.cast_shadow = cast_shadow;
        self
    }

    /// Direction the light travels, from `position` toward the target.
    /// Zero when the light sits on its target.
    pub fn direction(&self, position: Vec3) -> Vec3 {
        (self.target - position).normalize_or_zero()
    }

    /// View-projection of the shadow camera placed at `position`.
    pub fn shadow_matrix(&self, position: Vec3) -> Mat4 {
        let up = if self.direction(position).cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let view = Mat4::look_at_rh(position, self.target, up);
        let s = &self.shadow;
        Mat4::orthographic_rh(s.left, s.right, s.bottom, s.top, s.near, s.far) * view
    }
}
