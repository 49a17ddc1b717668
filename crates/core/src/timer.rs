//! Frame timer used by the platform loop for pacing diagnostics.
//!
//! The render loop itself never throttles or skips frames; the timer only
//! reports what the platform delivered.

use std::time::{Duration, Instant};

/// Measures frame deltas and a rolling frame rate.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    last_tick: Instant,
    frames: u64,
    sample_start: Instant,
    sample_frames: u32,
}

impl Timer {
    /// Create a new timer, starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
            frames: 0,
            sample_start: now,
            sample_frames: 0,
        }
    }

    /// Total elapsed time since the timer was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Mark a delivered frame and return the time since the previous one.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now - self.last_tick;
        self.last_tick = now;
        self.frames += 1;
        self.sample_frames += 1;
        delta
    }

    /// Number of frames ticked so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames per second over the current sample window, once `window`
    /// has elapsed. Starts a new window when it returns `Some`.
    pub fn sample_fps(&mut self, window: Duration) -> Option<f32> {
        let elapsed = self.sample_start.elapsed();
        if elapsed < window || elapsed.is_zero() {
            return None;
        }
        let fps = self.sample_frames as f32 / elapsed.as_secs_f32();
        self.sample_start = Instant::now();
        self.sample_frames = 0;
        Some(fps)
    }

    /// Reset the timer to the current time.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
