//! Perspective camera.

use glam::{Mat4, Quat, Vec2, Vec3};

use stage_core::{Error, Result};

use crate::transform::look_rotation;

/// Perspective projection parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    /// Viewport width over height
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    /// Vertical field of view in radians.
    pub fn fov_y(&self) -> f32 {
        self.fov_y_degrees.to_radians()
    }
}

/// A camera for rendering the scene.
///
/// The camera is not part of the scene graph; its position and rotation are
/// in world space.
#[derive(Clone, Debug)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    /// Camera rotation
    pub rotation: Quat,
    projection: Projection,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            projection: Projection {
                fov_y_degrees: 30.0,
                aspect: 1.0,
                near: 1.0,
                far: 10000.0,
            },
        }
    }
}

impl Camera {
    /// Create a perspective camera at the origin looking down -Z.
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Result<Self> {
        let mut camera = Self::default();
        camera.set_perspective(fov_y_degrees, aspect, near, far)?;
        Ok(camera)
    }

    /// Replace the projection parameters.
    pub fn set_perspective(&mut self, fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Result<()> {
        if !(fov_y_degrees > 0.0 && fov_y_degrees < 180.0) {
            return Err(Error::InvalidInput(format!(
                "field of view must be in (0, 180) degrees, got {}",
                fov_y_degrees
            )));
        }
        Self::check_aspect(aspect)?;
        if !(near > 0.0 && far > near && far.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "clip planes must satisfy 0 < near < far, got {}/{}",
                near, far
            )));
        }
        self.projection = Projection {
            fov_y_degrees,
            aspect,
            near,
            far,
        };
        Ok(())
    }

    /// Update the aspect ratio; the projection matrix follows immediately.
    pub fn set_aspect(&mut self, aspect: f32) -> Result<()> {
        Self::check_aspect(aspect)?;
        self.projection.aspect = aspect;
        Ok(())
    }

    fn check_aspect(aspect: f32) -> Result<()> {
        if aspect.is_finite() && aspect > 0.0 {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "aspect ratio must be finite and positive, got {}",
                aspect
            )))
        }
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn aspect(&self) -> f32 {
        self.projection.aspect
    }

    /// Get the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    /// Get the projection matrix (right-handed, depth in [0, 1]).
    pub fn projection_matrix(&self) -> Mat4 {
        let p = &self.projection;
        Mat4::perspective_rh(p.fov_y(), p.aspect, p.near, p.far)
    }

    /// Get the view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Get the forward direction vector.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Get the right direction vector.
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Get the up direction vector.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Look at a target position.
    ///
    /// Looking at the camera's own position (or straight along the world
    /// up axis) leaves the orientation unchanged.
    pub fn look_at(&mut self, target: Vec3) {
        if let Some(rotation) = look_rotation(self.position, target, Vec3::Y) {
            self.rotation = rotation;
        } else if let Some(forward) = (target - self.position).try_normalize() {
            self.rotation = Quat::from_rotation_arc(Vec3::NEG_Z, forward);
        }
    }

    /// World-space direction of the ray through a point in normalized
    /// device coordinates.
    pub fn ray_direction(&self, ndc: Vec2) -> Vec3 {
        let p = &self.projection;
        let half_height = (p.fov_y() * 0.5).tan();
        let half_width = half_height * p.aspect;
        let local = Vec3::new(ndc.x * half_width, ndc.y * half_height, -1.0);
        (self.rotation * local).normalize()
    }

    /// Project a world-space point to normalized device coordinates.
    ///
    /// Returns `None` for points behind the camera.
    pub fn project(&self, point: Vec3) -> Option<Vec3> {
        let clip = self.view_projection_matrix() * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        Some(clip.truncate() / clip.w)
    }
}
