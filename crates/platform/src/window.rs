//! The host window, wrapping winit.

use std::sync::Arc;

use winit::dpi::LogicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window as WinitWindow, WindowAttributes};

use stage_core::{Error, Result};

use crate::Viewport;

/// A window wrapper that tracks the logical viewport the scene is drawn into.
pub struct Window {
    window: Arc<WinitWindow>,
    viewport: Viewport,
}

impl Window {
    /// Create a new window with the given logical dimensions and title.
    pub fn new(event_loop: &ActiveEventLoop, width: u32, height: u32, title: &str) -> Result<Self> {
        let viewport = Viewport::new(width, height)?;
        let attrs = WindowAttributes::default()
            .with_title(title)
            .with_inner_size(LogicalSize::new(width, height))
            .with_resizable(true);

        let window = event_loop
            .create_window(attrs)
            .map_err(|e| Error::Window(e.to_string()))?;

        tracing::info!("Window created: {}x{}", width, height);

        Ok(Self {
            window: Arc::new(window),
            viewport,
        })
    }

    /// The winit window, for anything not wrapped here.
    pub fn inner(&self) -> &WinitWindow {
        &self.window
    }

    /// The viewport as of the last resize.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Update the stored viewport from a physical size event.
    ///
    /// Returns `None` while the window is minimized (zero-sized); the
    /// previous viewport is kept in that case.
    pub fn resize(&mut self, physical_width: u32, physical_height: u32) -> Option<Viewport> {
        let scale = self.window.scale_factor();
        let width = (physical_width as f64 / scale).round() as u32;
        let height = (physical_height as f64 / scale).round() as u32;
        match Viewport::new(width, height) {
            Ok(viewport) => {
                self.viewport = viewport;
                tracing::debug!("Window resized: {}x{}", width, height);
                Some(viewport)
            }
            Err(_) => {
                tracing::debug!("Ignoring resize to zero dimensions");
                None
            }
        }
    }

    /// Logical pixels per physical pixel for cursor coordinate conversion.
    pub fn scale_factor(&self) -> f64 {
        self.window.scale_factor()
    }

    /// Request a redraw of the window (the per-frame callback primitive).
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}
