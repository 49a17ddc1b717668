//! Node-local placement and the small bits of matrix math built on it.
//!
//! World matrices are composed by the graph, see
//! [`Scene::world_matrix`](crate::Scene::world_matrix).
//!
//! ```
//! use stage_scene::Transform;
//! use glam::Vec3;
//!
//! let placed = Transform::new()
//!     .with_position(Vec3::new(1.0, 0.0, 0.0))
//!     .with_scale(Vec3::splat(2.0));
//!
//! let p = placed.local_matrix().transform_point3(Vec3::X);
//! assert!((p - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-6);
//! ```

use glam::{Mat3, Mat4, Quat, Vec3};

/// Determinant below which a model matrix is treated as singular.
const SINGULAR_DETERMINANT: f32 = 1e-6;

/// Translation, rotation and scale of a node in its parent's space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// No translation, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn new() -> Self {
        Self::IDENTITY
    }

    pub fn with_position(self, position: Vec3) -> Self {
        Self { position, ..self }
    }

    pub fn with_rotation(self, rotation: Quat) -> Self {
        Self { rotation, ..self }
    }

    pub fn with_scale(self, scale: Vec3) -> Self {
        Self { scale, ..self }
    }

    /// Scale, then rotate, then translate.
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Orientation whose forward (-Z) axis points from `eye` to `target` with
/// `up` as the vertical reference.
///
/// Returns `None` when `eye == target` or the view direction is parallel to
/// `up`; callers keep their current orientation in that case.
pub fn look_rotation(eye: Vec3, target: Vec3, up: Vec3) -> Option<Quat> {
    let forward = (target - eye).try_normalize()?;
    let right = forward.cross(up).try_normalize()?;
    let true_up = right.cross(forward);
    let basis = Mat3::from_cols(right, true_up, -forward);
    Some(Quat::from_mat3(&basis).normalize())
}

/// Matrix that carries normals through `model`: its inverse transpose.
/// Singular models (a zero scale axis) get the identity.
pub fn normal_matrix(model: Mat4) -> Mat4 {
    if model.determinant().abs() < SINGULAR_DETERMINANT {
        return Mat4::IDENTITY;
    }
    model.inverse().transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn close(a: Vec3, b: Vec3) -> bool {
        a.abs_diff_eq(b, 1e-5)
    }

    #[test]
    fn test_identity_by_default() {
        assert_eq!(Transform::default(), Transform::IDENTITY);
        assert_eq!(Transform::new().local_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_builders_keep_other_fields() {
        let placed = Transform::new()
            .with_scale(Vec3::splat(2.0))
            .with_position(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(placed.scale, Vec3::splat(2.0));
        assert_eq!(placed.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(placed.rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_rotation_applied_before_translation() {
        let placed = Transform::new()
            .with_rotation(Quat::from_rotation_y(FRAC_PI_2))
            .with_position(Vec3::new(0.0, 5.0, 0.0));
        let p = placed.local_matrix().transform_point3(Vec3::X);
        assert!(close(p, Vec3::new(0.0, 5.0, -1.0)), "got {:?}", p);
    }

    #[test]
    fn test_look_rotation_aims_forward_axis() {
        let along_z = look_rotation(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y).unwrap();
        assert!(close(along_z * Vec3::NEG_Z, Vec3::NEG_Z));

        let along_x = look_rotation(Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO, Vec3::Y).unwrap();
        assert!(close(along_x * Vec3::NEG_Z, Vec3::NEG_X));
        assert!(close(along_x * Vec3::Y, Vec3::Y));
    }

    #[test]
    fn test_look_rotation_degenerate() {
        assert!(look_rotation(Vec3::ZERO, Vec3::ZERO, Vec3::Y).is_none());
        assert!(look_rotation(Vec3::ZERO, Vec3::new(0.0, 5.0, 0.0), Vec3::Y).is_none());
    }

    #[test]
    fn test_normal_matrix_undoes_non_uniform_scale() {
        let model = Transform::new().with_scale(Vec3::new(1.0, 2.0, 1.0)).local_matrix();
        let normal = normal_matrix(model).transform_vector3(Vec3::Y);
        assert!(close(normal, Vec3::new(0.0, 0.5, 0.0)));
    }

    #[test]
    fn test_normal_matrix_singular_model() {
        let flat = Transform::new().with_scale(Vec3::new(1.0, 0.0, 1.0)).local_matrix();
        assert_eq!(normal_matrix(flat), Mat4::IDENTITY);
    }
}
