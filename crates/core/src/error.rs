//! Error types for the stage crates.

use thiserror::Error;

/// Main error type for the scene controller and its components.
#[derive(Error, Debug)]
pub enum Error {
    /// Viewport dimensions that cannot back a camera or surface
    #[error("Viewport error: {0}")]
    Viewport(String),

    /// Configuration values that violate their constraints
    #[error("Config error: {0}")]
    Config(String),

    /// Configuration file that could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Caller-supplied arguments that are out of range or non-finite
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A node id that does not (or no longer) exist in the scene graph
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Render surface errors
    #[error("Surface error: {0}")]
    Surface(String),

    /// Window creation or management errors
    #[error("Window error: {0}")]
    Window(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the stage Error type.
pub type Result<T> = std::result::Result<T, Error>;
