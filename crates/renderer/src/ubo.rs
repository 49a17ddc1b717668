//! Plain-old-data blocks the raster surface fills each frame.
//!
//! Every block is `#[repr(C)]`, derives [`Pod`] and is laid out for std140
//! (vec3 members are followed by a scalar so nothing straddles a 16-byte
//! row), so a backend uploads them as-is:
//!
//! ```
//! use stage_renderer::ubo::{CameraUbo, LightingUbo, ObjectUbo};
//! use glam::{Mat4, Vec3};
//!
//! let eye = Vec3::new(0.0, 2.0, 8.0);
//! let camera = CameraUbo::new(
//!     Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y),
//!     Mat4::perspective_rh(30.0_f32.to_radians(), 16.0 / 9.0, 1.0, 10000.0),
//!     eye,
//! )
//! .with_log_depth(10000.0);
//!
//! assert_eq!(bytemuck::bytes_of(&camera).len(), CameraUbo::size());
//! assert_eq!(bytemuck::bytes_of(&ObjectUbo::new(Mat4::IDENTITY)).len(), 128);
//! assert_eq!(LightingUbo::size(), 144);
//! ```

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use stage_scene::transform::normal_matrix;

/// Per-frame camera block, 208 bytes: three matrices, then the eye
/// position packed with the log-depth factor.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct CameraUbo {
    /// World to eye space
    pub view: Mat4,
    /// Eye to clip space
    pub projection: Mat4,
    /// `projection * view`
    pub view_projection: Mat4,
    /// Eye position in world space
    pub camera_position: Vec3,
    /// Logarithmic depth factor `2 / log2(far + 1)`; zero selects the
    /// ordinary hyperbolic depth buffer.
    pub log_depth_fc: f32,
}

impl CameraUbo {
    /// Block for a camera using the ordinary depth buffer.
    #[inline]
    pub fn new(view: Mat4, projection: Mat4, camera_position: Vec3) -> Self {
        Self {
            view,
            projection,
            view_projection: projection * view,
            camera_position,
            log_depth_fc: 0.0,
        }
    }

    /// Enable logarithmic depth for a camera with the given far plane.
    #[inline]
    pub fn with_log_depth(mut self, far: f32) -> Self {
        self.log_depth_fc = log_depth_factor(far);
        self
    }

    pub const fn size() -> usize {
        size_of::<Self>()
    }
}

/// Factor the vertex shader multiplies `log2(1 + w)` by to map depth into
/// clip range.
pub fn log_depth_factor(far: f32) -> f32 {
    2.0 / (far + 1.0).log2()
}

/// Per-draw block, 128 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct ObjectUbo {
    /// Mesh world matrix
    pub model: Mat4,
    /// Inverse transpose of `model`; identity when `model` is singular.
    pub normal_matrix: Mat4,
}

impl ObjectUbo {
    #[inline]
    pub fn new(model: Mat4) -> Self {
        Self {
            model,
            normal_matrix: normal_matrix(model),
        }
    }

    pub const fn size() -> usize {
        size_of::<Self>()
    }
}

/// Scene lighting, 144 bytes: ambient term, one directional light with its
/// shadow transform, and linear fog. Three 16-byte rows, the light-space
/// matrix at offset 48, then the fog row and padding.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct LightingUbo {
    /// Ambient color premultiplied by intensity.
    pub ambient: Vec3,
    /// 1.0 when the directional light casts shadows and shadow mapping is on.
    pub shadows_enabled: f32,
    /// Direction the light travels (normalized, zero when undefined).
    pub light_direction: Vec3,
    pub light_intensity: f32,
    pub light_color: Vec3,
    /// Shadow map edge length in texels.
    pub shadow_map_size: f32,
    /// World to shadow-map clip space.
    pub light_space: Mat4,
    pub fog_color: Vec3,
    /// Fog start distance; equal to `fog_far` disables fog.
    pub fog_near: f32,
    pub fog_far: f32,
    pub _pad: [f32; 3],
}

impl LightingUbo {
    pub const fn size() -> usize {
        size_of::<Self>()
    }
}
