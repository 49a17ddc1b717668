//! Render surfaces and the stack they are layered in.
//!
//! A surface is one output layer covering the whole viewport: the raster
//! layer that draws meshes, or an overlay that positions host elements
//! (labels, panels) over it. Every surface in a [`SurfaceStack`] has the
//! same size; the topmost one receives pointer input.

use std::any::Any;

use tracing::info;

use stage_core::Result;
use stage_platform::Viewport;
use stage_scene::{Camera, Scene};

/// Which layer a surface draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Rasterized meshes with lighting and shadows
    Raster,
    /// Screen-aligned elements pinned to projected world points
    Overlay2d,
    /// Elements transformed in 3D with the camera's perspective
    Overlay3d,
}

impl SurfaceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SurfaceKind::Raster => "raster",
            SurfaceKind::Overlay2d => "overlay-2d",
            SurfaceKind::Overlay3d => "overlay-3d",
        }
    }
}

/// Placement of a surface inside the host area.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceLayout {
    /// Stacking order; higher is drawn on top
    pub z_index: u32,
    /// Positioned absolutely rather than in flow
    pub absolute: bool,
    /// Offset from the top edge in pixels
    pub top: i32,
    /// Offset from the left edge in pixels
    pub left: i32,
}

impl SurfaceLayout {
    /// Absolute, top-left anchored layout at the given stacking order.
    pub fn stacked(z_index: u32) -> Self {
        Self {
            z_index,
            absolute: true,
            top: 0,
            left: 0,
        }
    }
}

/// One output layer.
pub trait RenderSurface {
    fn kind(&self) -> SurfaceKind;

    /// Current size in logical pixels.
    fn size(&self) -> (u32, u32);

    fn set_size(&mut self, width: u32, height: u32);

    fn layout(&self) -> SurfaceLayout;

    fn set_layout(&mut self, layout: SurfaceLayout);

    /// Draw the scene as seen from `camera`.
    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<()>;

    /// Access to the concrete surface for inspecting its output.
    fn as_any(&self) -> &dyn Any;
}

/// Surfaces ordered bottom to top.
#[derive(Default)]
pub struct SurfaceStack {
    surfaces: Vec<Box<dyn RenderSurface>>,
}

impl SurfaceStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a surface on top of the stack, sized to `viewport`.
    pub fn attach(&mut self, mut surface: Box<dyn RenderSurface>, viewport: Viewport) {
        let z_index = self.surfaces.len() as u32;
        surface.set_layout(SurfaceLayout::stacked(z_index));
        surface.set_size(viewport.width(), viewport.height());
        info!(
            "Attached {} surface at z-index {} ({}x{})",
            surface.kind().name(),
            z_index,
            viewport.width(),
            viewport.height()
        );
        self.surfaces.push(surface);
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// The surface that receives pointer input.
    pub fn topmost(&self) -> Option<&dyn RenderSurface> {
        self.surfaces.last().map(|s| s.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn RenderSurface> {
        self.surfaces.iter().map(|s| s.as_ref())
    }

    /// First surface of concrete type `T`, bottom up.
    pub fn find<T: RenderSurface + 'static>(&self) -> Option<&T> {
        self.surfaces.iter().find_map(|s| s.as_any().downcast_ref::<T>())
    }

    pub fn resize_all(&mut self, width: u32, height: u32) {
        for surface in &mut self.surfaces {
            surface.set_size(width, height);
        }
    }

    /// Render every surface bottom to top; returns the kinds in draw order.
    pub fn render_all(&mut self, scene: &Scene, camera: &Camera) -> Result<Vec<SurfaceKind>> {
        let mut rendered = Vec::with_capacity(self.surfaces.len());
        for surface in &mut self.surfaces {
            surface.render(scene, camera)?;
            rendered.push(surface.kind());
        }
        Ok(rendered)
    }
}
