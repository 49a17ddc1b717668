//! Platform abstraction layer for the scene controller.
//!
//! This crate provides platform-specific functionality:
//! - Window management via winit
//! - Viewport dimensions and pixel → NDC conversion
//! - Pointer input (press, release, click, move, wheel)
//! - Per-frame task scheduling with cancellable handles

mod frame;
mod input;
mod viewport;
mod window;

pub use frame::{FrameHandle, FrameScheduler, FrameStatus, FrameTaskStats};
pub use input::{CLICK_SLOP, PointerButton, PointerEvent, PointerEventKind, PointerTracker};
pub use viewport::Viewport;
pub use window::Window;

// Re-export winit types that users might need
pub use winit::event::{Event, WindowEvent};
pub use winit::event_loop::EventLoop;
