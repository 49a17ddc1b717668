//! Logical viewport dimensions.

use stage_core::{Error, Result};

/// Size of the area all render surfaces cover, in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    /// Create a viewport, rejecting zero dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Viewport(format!(
                "viewport must be non-empty, got {}x{}",
                width, height
            )));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width over height; always finite and positive.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Convert pixel coordinates (top-left origin) into normalized device
    /// coordinates with y pointing up.
    pub fn to_ndc(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x / self.width as f32) * 2.0 - 1.0,
            -(y / self.height as f32) * 2.0 + 1.0,
        )
    }
}
