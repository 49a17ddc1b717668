//! Render surfaces and the scene controller.
//!
//! This crate ties the scene to its outputs:
//! - A raster surface producing per-frame draw packets
//! - 2D and 3D overlay surfaces placing host elements
//! - The [`SceneController`] that renders frames, handles resize and
//!   pointer input, and runs frame-driven animations

pub mod animation;
pub mod controller;
pub mod overlay;
pub mod raster;
pub mod surface;
pub mod ubo;

pub use controller::{FrameReport, ListenerId, SceneController, Stage};
pub use overlay::{LabelPlacement, Overlay2dSurface, Overlay3dSurface, PanelPlacement};
pub use raster::{DrawItem, FramePacket, RasterOptions, RasterSurface};
pub use surface::{RenderSurface, SurfaceKind, SurfaceLayout, SurfaceStack};
