//! Ray casting against scene meshes.
//!
//! Rays are tested in each mesh's local space: the world ray is taken
//! through the inverse world matrix, checked against the geometry bounds,
//! then against every triangle. Only front faces (counter-clockwise seen
//! from the ray) count unless the material is double-sided. Hit distances
//! are reported in world units.

use glam::{Mat4, Vec2, Vec3};

use stage_core::{Error, Result};

use crate::camera::Camera;
use crate::graph::{NodeId, NodeKind, Scene};

/// A half-line in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray; `direction` is normalized and must be non-zero.
    pub fn new(origin: Vec3, direction: Vec3) -> Result<Self> {
        let direction = direction
            .try_normalize()
            .ok_or_else(|| Error::InvalidInput("ray direction must be non-zero".into()))?;
        Ok(Self { origin, direction })
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Möller–Trumbore; returns the ray parameter of the hit. Back faces
    /// are rejected unless `double_sided`.
    pub fn intersect_triangle(&self, [a, b, c]: [Vec3; 3], double_sided: bool) -> Option<f32> {
        const EPSILON: f32 = 1e-7;
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < EPSILON || (!double_sided && det < 0.0) {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = edge2.dot(q) * inv_det;
        (t >= 0.0).then_some(t)
    }

    fn transformed(&self, matrix: Mat4) -> (Vec3, Vec3) {
        (
            matrix.transform_point3(self.origin),
            matrix.transform_vector3(self.direction),
        )
    }
}

/// One ray/mesh hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    /// Mesh node that was hit
    pub node: NodeId,
    /// World-space distance from the ray origin
    pub distance: f32,
    /// World-space hit point
    pub point: Vec3,
    /// Index of the triangle hit
    pub face_index: usize,
}

/// Casts rays into a scene.
#[derive(Clone, Copy, Debug)]
pub struct Raycaster {
    pub ray: Ray,
    /// Hits closer than this are ignored
    pub near: f32,
    /// Hits farther than this are ignored
    pub far: f32,
    /// Leave out hidden nodes and their subtrees. Off by default: hidden
    /// meshes still take hits.
    pub skip_hidden: bool,
}

impl Raycaster {
    pub fn new(ray: Ray) -> Self {
        Self {
            ray,
            near: 0.0,
            far: f32::INFINITY,
            skip_hidden: false,
        }
    }

    /// Ray from the camera through a point in normalized device coordinates.
    pub fn from_camera(ndc: Vec2, camera: &Camera) -> Self {
        Self::new(Ray {
            origin: camera.position,
            direction: camera.ray_direction(ndc),
        })
    }

    /// Intersect each of `targets`, and their descendants when `recursive`,
    /// returning hits sorted nearest first. Unknown ids are an error.
    pub fn intersect_nodes(
        &self,
        scene: &Scene,
        targets: &[NodeId],
        recursive: bool,
    ) -> Result<Vec<Intersection>> {
        let mut hits = Vec::new();
        for &target in targets {
            scene.node(target)?;
            if self.skip_hidden && !scene.is_visible(target) {
                continue;
            }
            self.intersect_one(scene, target, &mut hits)?;
            if recursive {
                for id in scene.descendants(target) {
                    if !self.skip_hidden || scene.is_visible(id) {
                        self.intersect_one(scene, id, &mut hits)?;
                    }
                }
            }
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(hits)
    }

    /// Intersect a single node (no descendants).
    pub fn intersect_node(&self, scene: &Scene, target: NodeId) -> Result<Vec<Intersection>> {
        self.intersect_nodes(scene, &[target], false)
    }

    fn intersect_one(&self, scene: &Scene, id: NodeId, hits: &mut Vec<Intersection>) -> Result<()> {
        let NodeKind::Mesh(mesh) = &scene.node(id)?.kind else {
            return Ok(());
        };
        let world = scene.world_matrix(id)?;
        if world.determinant().abs() < 1e-12 {
            return Ok(());
        }
        let (origin, direction) = self.ray.transformed(world.inverse());
        let Some(local_ray) = Ray::new(origin, direction).ok() else {
            return Ok(());
        };

        let geometry = &mesh.geometry;
        let double_sided = mesh.material.double_sided;
        if geometry.bounds().ray_entry(local_ray.origin, local_ray.direction).is_none() {
            return Ok(());
        }

        let mut nearest: Option<(f32, usize)> = None;
        for (face_index, triangle) in geometry.triangles().enumerate() {
            if let Some(t) = local_ray.intersect_triangle(triangle, double_sided)
                && nearest.is_none_or(|(best, _)| t < best)
            {
                nearest = Some((t, face_index));
            }
        }

        if let Some((t, face_index)) = nearest {
            let point = world.transform_point3(local_ray.at(t));
            let distance = (point - self.ray.origin).length();
            if distance >= self.near && distance <= self.far {
                hits.push(Intersection {
                    node: id,
                    distance,
                    point,
                    face_index,
                });
            }
        }
        Ok(())
    }
}
