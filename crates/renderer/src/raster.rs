//! Raster surface.
//!
//! Turns the scene into a [`FramePacket`] each frame: camera and lighting
//! uniform blocks plus a culled, depth-sorted draw list. A GPU backend
//! consumes the packet; this crate stops at producing it.

use std::any::Any;
use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};
use tracing::{debug, trace};

use stage_core::Result;
use stage_core::config::RasterConfig;
use stage_scene::{Camera, Geometry, Material, NodeId, NodeKind, Scene};

use crate::surface::{RenderSurface, SurfaceKind, SurfaceLayout};
use crate::ubo::{CameraUbo, LightingUbo, ObjectUbo};

/// Multisample count used when antialiasing is on.
pub const MSAA_SAMPLES: u32 = 4;

/// Raster pipeline switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterOptions {
    pub antialias: bool,
    pub logarithmic_depth: bool,
    pub shadow_map: bool,
    pub shadow_map_size: u32,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self::from(&RasterConfig::default())
    }
}

impl From<&RasterConfig> for RasterOptions {
    fn from(config: &RasterConfig) -> Self {
        Self {
            antialias: config.antialias,
            logarithmic_depth: config.logarithmic_depth,
            shadow_map: config.shadow_map,
            shadow_map_size: config.shadow_map_size,
        }
    }
}

impl RasterOptions {
    pub fn sample_count(&self) -> u32 {
        if self.antialias { MSAA_SAMPLES } else { 1 }
    }
}

/// One mesh to draw this frame.
#[derive(Clone, Debug)]
pub struct DrawItem {
    pub node: NodeId,
    pub object: ObjectUbo,
    pub geometry: Arc<Geometry>,
    pub material: Material,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    /// View-space distance to the bounds center, for sorting
    pub depth: f32,
}

/// Everything the backend needs to draw one frame.
#[derive(Clone, Debug, Default)]
pub struct FramePacket {
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub clear_color: Vec3,
    pub camera: CameraUbo,
    pub lighting: LightingUbo,
    /// Opaque meshes, nearest first
    pub draws: Vec<DrawItem>,
    /// Meshes rendered into the shadow map; empty when shadows are off
    pub shadow_casters: Vec<NodeId>,
    /// Visible meshes dropped by frustum culling
    pub culled: usize,
}

/// Draws meshes with lighting, shadows and fog.
pub struct RasterSurface {
    options: RasterOptions,
    size: (u32, u32),
    layout: SurfaceLayout,
    packet: FramePacket,
    frames: u64,
}

impl RasterSurface {
    pub fn new(options: RasterOptions) -> Self {
        debug!(
            "Raster surface: {} sample(s), log depth {}, shadow map {}",
            options.sample_count(),
            options.logarithmic_depth,
            options.shadow_map
        );
        Self {
            options,
            size: (0, 0),
            layout: SurfaceLayout::default(),
            packet: FramePacket::default(),
            frames: 0,
        }
    }

    pub fn options(&self) -> &RasterOptions {
        &self.options
    }

    /// Output of the most recent render.
    pub fn last_packet(&self) -> &FramePacket {
        &self.packet
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    fn lighting(&self, scene: &Scene, visible: &[(NodeId, Mat4)]) -> LightingUbo {
        let mut lighting = LightingUbo::default();
        let mut have_directional = false;

        for &(id, world) in visible {
            let Some(node) = scene.get(id) else { continue };
            match &node.kind {
                NodeKind::AmbientLight(light) => lighting.ambient += light.radiance(),
                // Only the first directional light is shaded.
                NodeKind::DirectionalLight(light) if !have_directional => {
                    have_directional = true;
                    let position = world.w_axis.truncate();
                    lighting.light_direction = light.direction(position);
                    lighting.light_color = light.color;
                    lighting.light_intensity = light.intensity;
                    if self.options.shadow_map && light.cast_shadow {
                        lighting.shadows_enabled = 1.0;
                        lighting.shadow_map_size = light.shadow.map_size as f32;
                        lighting.light_space = light.shadow_matrix(position);
                    }
                }
                _ => {}
            }
        }

        if let Some(fog) = scene.background.fog {
            lighting.fog_color = fog.color;
            lighting.fog_near = fog.near;
            lighting.fog_far = fog.far;
        }
        lighting
    }
}

/// Frustum planes as `(normal, distance)` packed in a `Vec4`, pointing inward.
fn frustum_planes(view_projection: Mat4) -> [Vec4; 6] {
    let r0 = view_projection.row(0);
    let r1 = view_projection.row(1);
    let r2 = view_projection.row(2);
    let r3 = view_projection.row(3);
    // Depth range is [0, 1].
    [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2]
}

fn sphere_in_frustum(planes: &[Vec4; 6], center: Vec3, radius: f32) -> bool {
    planes.iter().all(|plane| {
        let normal = plane.truncate();
        normal.dot(center) + plane.w >= -radius * normal.length()
    })
}

impl RenderSurface for RasterSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Raster
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn layout(&self) -> SurfaceLayout {
        self.layout
    }

    fn set_layout(&mut self, layout: SurfaceLayout) {
        self.layout = layout;
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<()> {
        let view = camera.view_matrix();
        let projection = camera.projection_matrix();
        let mut camera_ubo = CameraUbo::new(view, projection, camera.position);
        if self.options.logarithmic_depth {
            camera_ubo = camera_ubo.with_log_depth(camera.projection().far);
        }

        let visible = scene.visible_nodes();
        let planes = frustum_planes(camera_ubo.view_projection);
        let mut draws = Vec::new();
        let mut shadow_casters = Vec::new();
        let mut culled = 0;

        for &(id, world) in &visible {
            let Some(NodeKind::Mesh(mesh)) = scene.get(id).map(|n| &n.kind) else {
                continue;
            };
            if self.options.shadow_map && mesh.cast_shadow {
                shadow_casters.push(id);
            }

            let bounds = mesh.geometry.bounds().transformed(world);
            let center = bounds.center();
            if !sphere_in_frustum(&planes, center, bounds.bounding_radius()) {
                culled += 1;
                continue;
            }
            draws.push(DrawItem {
                node: id,
                object: ObjectUbo::new(world),
                geometry: Arc::clone(&mesh.geometry),
                material: mesh.material.clone(),
                cast_shadow: mesh.cast_shadow,
                receive_shadow: mesh.receive_shadow,
                depth: -view.transform_point3(center).z,
            });
        }
        draws.sort_by(|a, b| a.depth.total_cmp(&b.depth));

        self.packet = FramePacket {
            width: self.size.0,
            height: self.size.1,
            samples: self.options.sample_count(),
            clear_color: scene.background.color,
            camera: camera_ubo,
            lighting: self.lighting(scene, &visible),
            draws,
            shadow_casters,
            culled,
        };
        self.frames += 1;

        trace!(
            "Raster frame {}: {} draw(s), {} culled",
            self.frames,
            self.packet.draws.len(),
            culled
        );
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
