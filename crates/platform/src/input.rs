//! Pointer input handling.
//!
//! Raw winit mouse events are folded into [`PointerEvent`]s in logical
//! pixels relative to the top-left of the viewport. A click is synthesized
//! when a button is pressed and released without the pointer travelling
//! more than [`CLICK_SLOP`] pixels.

use std::collections::HashSet;

use winit::event::{ElementState, MouseScrollDelta, WindowEvent};

/// Maximum pointer travel, in logical pixels, between press and release
/// for the pair to still count as a click.
pub const CLICK_SLOP: f32 = 4.0;

/// Pixels of scroll per wheel line.
const LINE_HEIGHT: f32 = 100.0;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

impl From<winit::event::MouseButton> for PointerButton {
    fn from(button: winit::event::MouseButton) -> Self {
        match button {
            winit::event::MouseButton::Left => PointerButton::Primary,
            winit::event::MouseButton::Right => PointerButton::Secondary,
            winit::event::MouseButton::Middle => PointerButton::Middle,
            _ => PointerButton::Primary,
        }
    }
}

/// The pointer event kinds listeners can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    Down,
    Up,
    Move,
    Click,
    Wheel,
}

/// A pointer event in logical viewport pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    /// Horizontal position from the left edge
    pub x: f32,
    /// Vertical position from the top edge
    pub y: f32,
    /// Button for down/up/click events
    pub button: Option<PointerButton>,
    /// Vertical scroll amount in pixels for wheel events (positive = away from user)
    pub wheel_delta: f32,
    default_prevented: bool,
}

impl PointerEvent {
    /// Create an event of `kind` at `(x, y)`.
    pub fn new(kind: PointerEventKind, x: f32, y: f32) -> Self {
        Self {
            kind,
            x,
            y,
            button: None,
            wheel_delta: 0.0,
            default_prevented: false,
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = Some(button);
        self
    }

    pub fn with_wheel_delta(mut self, delta: f32) -> Self {
        self.wheel_delta = delta;
        self
    }

    /// Suppress the default handling for this event.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Tracks pointer state across winit events and emits [`PointerEvent`]s.
#[derive(Debug, Default)]
pub struct PointerTracker {
    /// Currently pressed buttons and where they went down
    pressed: HashSet<PointerButton>,
    press_origin: Option<(f32, f32)>,
    /// Current pointer position in logical pixels
    position: (f32, f32),
    /// Logical pixels per physical pixel
    scale: f64,
}

impl PointerTracker {
    /// Create a tracker for a window with the given scale factor.
    pub fn new(scale_factor: f64) -> Self {
        Self {
            scale: scale_factor,
            ..Self::default()
        }
    }

    /// Update the scale factor after a DPI change.
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale = scale_factor;
    }

    /// Current pointer position in logical pixels.
    pub fn position(&self) -> (f32, f32) {
        self.position
    }

    /// Check if a button is currently held.
    pub fn is_pressed(&self, button: PointerButton) -> bool {
        self.pressed.contains(&button)
    }

    /// Translate a winit window event; non-pointer events yield nothing.
    pub fn on_window_event(&mut self, event: &WindowEvent) -> Vec<PointerEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
                let logical = position.to_logical::<f64>(scale);
                self.on_moved(logical.x as f32, logical.y as f32)
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = PointerButton::from(*button);
                match state {
                    ElementState::Pressed => self.on_pressed(button),
                    ElementState::Released => self.on_released(button),
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let pixels = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y * LINE_HEIGHT,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                };
                self.on_wheel(pixels)
            }
            _ => Vec::new(),
        }
    }

    /// Handle pointer movement.
    pub fn on_moved(&mut self, x: f32, y: f32) -> Vec<PointerEvent> {
        self.position = (x, y);
        vec![PointerEvent::new(PointerEventKind::Move, x, y)]
    }

    /// Handle a button press.
    pub fn on_pressed(&mut self, button: PointerButton) -> Vec<PointerEvent> {
        let (x, y) = self.position;
        if self.pressed.insert(button) {
            self.press_origin = Some((x, y));
        }
        vec![PointerEvent::new(PointerEventKind::Down, x, y).with_button(button)]
    }

    /// Handle a button release, synthesizing a click when the pointer stayed put.
    pub fn on_released(&mut self, button: PointerButton) -> Vec<PointerEvent> {
        let (x, y) = self.position;
        let mut events = vec![PointerEvent::new(PointerEventKind::Up, x, y).with_button(button)];
        if self.pressed.remove(&button)
            && let Some((ox, oy)) = self.press_origin
        {
            let travel = ((x - ox).powi(2) + (y - oy).powi(2)).sqrt();
            if travel <= CLICK_SLOP {
                events.push(PointerEvent::new(PointerEventKind::Click, x, y).with_button(button));
            }
        }
        if self.pressed.is_empty() {
            self.press_origin = None;
        }
        events
    }

    /// Handle a scroll; positive deltas scroll away from the user.
    pub fn on_wheel(&mut self, delta: f32) -> Vec<PointerEvent> {
        let (x, y) = self.position;
        vec![PointerEvent::new(PointerEventKind::Wheel, x, y).with_wheel_delta(delta)]
    }
}
