//! Drawable primitives: triangle geometry, material, and mesh.
//!
//! Geometry authoring is intentionally minimal. Callers bring their own
//! vertex data; the box and plane builders exist for placeholders and tests.

use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};

use stage_core::{Error, Result};

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Creates a new AABB from min and max corners.
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point; `None` for an empty set.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        Some(points.iter().fold(Self::new(first, first), |aabb, &p| Self {
            min: aabb.min.min(p),
            max: aabb.max.max(p),
        }))
    }

    /// Returns the center point of the AABB.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Radius of the sphere around `center()` enclosing the box.
    pub fn bounding_radius(&self) -> f32 {
        (self.max - self.min).length() * 0.5
    }

    /// Checks if a point is inside the AABB.
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Box enclosing this one after transformation by `matrix`.
    pub fn transformed(&self, matrix: Mat4) -> Self {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ]
        .map(|c| matrix.transform_point3(c));
        // Eight corners, never empty.
        Self::from_points(&corners).unwrap_or(*self)
    }

    /// Slab test: distance along the ray to the box entry point (0 when
    /// the origin is inside), or `None` when the ray misses.
    pub fn ray_entry(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;
        for axis in 0..3 {
            let (o, d) = (origin[axis], direction[axis]);
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d == 0.0 {
                // Parallel to this slab: inside it or never.
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let (t1, t2) = ((lo - o) / d, (hi - o) / d);
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
        }
        if t_far < 0.0 || t_near > t_far {
            return None;
        }
        Some(t_near.max(0.0))
    }
}

/// Indexed triangle list.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
    bounds: Aabb,
}

impl Geometry {
    /// Build geometry from positions and triangle indices.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(Error::InvalidInput(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(Error::InvalidInput(format!(
                "index {} out of range for {} positions",
                bad,
                positions.len()
            )));
        }
        let bounds = Aabb::from_points(&positions)
            .ok_or_else(|| Error::InvalidInput("geometry needs at least one position".into()))?;
        Ok(Self {
            positions,
            indices,
            bounds,
        })
    }

    /// Axis-aligned box centered on the origin.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let h = Vec3::new(width, height, depth) * 0.5;
        let positions = vec![
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ];
        #[rustfmt::skip]
        let indices = vec![
            4, 5, 6, 4, 6, 7, // +z
            1, 0, 3, 1, 3, 2, // -z
            5, 1, 2, 5, 2, 6, // +x
            0, 4, 7, 0, 7, 3, // -x
            7, 6, 2, 7, 2, 3, // +y
            0, 1, 5, 0, 5, 4, // -y
        ];
        Self {
            bounds: Aabb::new(-h, h),
            positions,
            indices,
        }
    }

    /// Plane in the XY plane facing +Z, centered on the origin.
    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let positions = vec![
            Vec3::new(-hw, -hh, 0.0),
            Vec3::new(hw, -hh, 0.0),
            Vec3::new(hw, hh, 0.0),
            Vec3::new(-hw, hh, 0.0),
        ];
        Self {
            bounds: Aabb::new(Vec3::new(-hw, -hh, 0.0), Vec3::new(hw, hh, 0.0)),
            positions,
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate triangles as vertex triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.positions[tri[0] as usize],
                self.positions[tri[1] as usize],
                self.positions[tri[2] as usize],
            ]
        })
    }
}

/// Surface appearance handed through to the raster backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Base color with alpha
    pub base_color: Vec4,
    /// Render and hit-test both sides of each triangle; otherwise only the
    /// counter-clockwise front faces count.
    pub double_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Vec4::ONE,
            double_sided: false,
        }
    }
}

impl Material {
    /// Opaque material with the given RGB color.
    pub fn color(rgb: Vec3) -> Self {
        Self {
            base_color: rgb.extend(1.0),
            ..Self::default()
        }
    }

    pub fn with_double_sided(self, double_sided: bool) -> Self {
        Self { double_sided, ..self }
    }
}

/// A drawable primitive: shared geometry plus material and shadow flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub geometry: Arc<Geometry>,
    pub material: Material,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Mesh {
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self::shared(Arc::new(geometry), material)
    }

    /// Mesh reusing geometry already held elsewhere.
    pub fn shared(geometry: Arc<Geometry>, material: Material) -> Self {
        Self {
            geometry,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.cast_shadow = cast;
        self.receive_shadow = receive;
        self
    }
}
