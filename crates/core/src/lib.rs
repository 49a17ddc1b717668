//! Core utilities for the scene controller.
//!
//! This crate provides foundational types and utilities used across the stage crates:
//! - Error types and result aliases
//! - Logging initialization
//! - Frame timer
//! - Configuration with the fixed scene defaults

pub mod config;
mod error;
mod logging;
mod timer;

pub use config::SceneConfig;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use timer::Timer;
