//! Scene configuration.
//!
//! Every value the scene controller hard-wires at start-up lives here with
//! its default, so a deployment can override it from a TOML file without
//! touching code. Missing keys fall back to the defaults.
//!
//! # Example
//!
//! ```
//! use stage_core::SceneConfig;
//!
//! let config = SceneConfig::from_toml_str(
//!     r#"
//!     [camera]
//!     fov_degrees = 45.0
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.camera.fov_degrees, 45.0);
//! assert_eq!(config.camera.far, 10000.0);
//! ```

use std::path::Path;

use glam::Vec3;
use serde::Deserialize;

use crate::{Error, Result};

/// Top-level configuration consumed by `SceneController::initialize`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub raster: RasterConfig,
    pub lights: LightsConfig,
    pub controls: ControlsConfig,
    pub background: BackgroundConfig,
}

/// Perspective camera parameters.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Initial camera position
    pub position: [f32; 3],
    /// Point the camera initially looks at
    pub look_at: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 30.0,
            near: 1.0,
            far: 10000.0,
            position: [0.0; 3],
            look_at: [0.0; 3],
        }
    }
}

/// Options for the raster surface.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RasterConfig {
    pub antialias: bool,
    /// Logarithmic depth avoids z-fighting with a 10000:1 far/near ratio.
    pub logarithmic_depth: bool,
    pub shadow_map: bool,
    /// Shadow map edge length in texels
    pub shadow_map_size: u32,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            antialias: true,
            logarithmic_depth: true,
            shadow_map: true,
            shadow_map_size: 512,
        }
    }
}

/// Ambient and directional light defaults.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightsConfig {
    /// Ambient colour as 0xRRGGBB
    pub ambient_color: u32,
    pub ambient_intensity: f32,
    /// Directional colour as 0xRRGGBB
    pub directional_color: u32,
    pub directional_intensity: f32,
    pub directional_position: [f32; 3],
    pub directional_cast_shadow: bool,
    /// Name used to look the directional light up later
    pub directional_name: String,
}

impl Default for LightsConfig {
    fn default() -> Self {
        Self {
            ambient_color: 0xdfebff,
            ambient_intensity: 0.3,
            directional_color: 0xffffff,
            directional_intensity: 1.0,
            directional_position: [0.0, 5000.0, 5000.0],
            directional_cast_shadow: true,
            directional_name: "basisDirectionalLight".to_string(),
        }
    }
}

/// Orbit controller tuning.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlsConfig {
    /// Orbit target
    pub target: [f32; 3],
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            target: [0.0; 3],
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            enable_damping: false,
            damping_factor: 0.05,
        }
    }
}

/// Clear colour and optional linear fog.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Clear colour as 0xRRGGBB
    pub color: u32,
    pub fog: Option<FogConfig>,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            color: 0x000000,
            fog: None,
        }
    }
}

/// Linear fog between `near` and `far`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct FogConfig {
    pub color: u32,
    pub near: f32,
    pub far: f32,
}

impl SceneConfig {
    /// Parse a configuration from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SceneConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!("Loaded scene config from {}", path.display());
        Ok(config)
    }

    /// Check the constraints the camera and controls rely on.
    pub fn validate(&self) -> Result<()> {
        let camera = &self.camera;
        if !(camera.fov_degrees.is_finite() && camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0)
        {
            return Err(Error::Config(format!(
                "camera.fov_degrees must be in (0, 180), got {}",
                camera.fov_degrees
            )));
        }
        if !(camera.near.is_finite() && camera.far.is_finite() && camera.near > 0.0) {
            return Err(Error::Config(format!(
                "camera near/far must be finite with near > 0, got {}/{}",
                camera.near, camera.far
            )));
        }
        if camera.near >= camera.far {
            return Err(Error::Config(format!(
                "camera.near ({}) must be less than camera.far ({})",
                camera.near, camera.far
            )));
        }
        if camera
            .position
            .iter()
            .chain(camera.look_at.iter())
            .any(|v| !v.is_finite())
        {
            return Err(Error::Config("camera position and look_at must be finite".into()));
        }
        if self.raster.shadow_map_size == 0 {
            return Err(Error::Config("raster.shadow_map_size must be non-zero".into()));
        }

        let controls = &self.controls;
        if controls.min_distance < 0.0 || controls.min_distance > controls.max_distance {
            return Err(Error::Config(format!(
                "controls distance range [{}, {}] is invalid",
                controls.min_distance, controls.max_distance
            )));
        }
        if !(0.0..=1.0).contains(&controls.damping_factor) {
            return Err(Error::Config(format!(
                "controls.damping_factor must be in [0, 1], got {}",
                controls.damping_factor
            )));
        }
        if let Some(fog) = &self.background.fog
            && fog.near > fog.far
        {
            return Err(Error::Config(format!(
                "fog near ({}) must not exceed far ({})",
                fog.near, fog.far
            )));
        }
        Ok(())
    }
}

/// Convert a 0xRRGGBB colour into linear-agnostic RGB floats in [0, 1].
pub fn hex_to_rgb(hex: u32) -> Vec3 {
    let r = ((hex >> 16) & 0xff) as f32 / 255.0;
    let g = ((hex >> 8) & 0xff) as f32 / 255.0;
    let b = (hex & 0xff) as f32 / 255.0;
    Vec3::new(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_scene_setup() {
        let config = SceneConfig::default();
        assert_eq!(config.camera.fov_degrees, 30.0);
        assert_eq!(config.camera.near, 1.0);
        assert_eq!(config.camera.far, 10000.0);
        assert!(config.raster.antialias);
        assert!(config.raster.logarithmic_depth);
        assert!(config.raster.shadow_map);
        assert_eq!(config.lights.ambient_color, 0xdfebff);
        assert_eq!(config.lights.ambient_intensity, 0.3);
        assert_eq!(config.lights.directional_position, [0.0, 5000.0, 5000.0]);
        assert_eq!(config.lights.directional_name, "basisDirectionalLight");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = SceneConfig::from_toml_str("").unwrap();
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = SceneConfig::from_toml_str(
            r#"
            [raster]
            antialias = false

            [background]
            color = 0x102030
            fog = { color = 0xcce0ff, near = 500.0, far = 10000.0 }
            "#,
        )
        .unwrap();
        assert!(!config.raster.antialias);
        assert!(config.raster.logarithmic_depth);
        assert_eq!(config.background.color, 0x102030);
        assert_eq!(config.background.fog.unwrap().near, 500.0);
    }

    #[test]
    fn test_near_must_be_below_far() {
        let result = SceneConfig::from_toml_str(
            r#"
            [camera]
            near = 100.0
            far = 10.0
            "#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_bad_fov_rejected() {
        let mut config = SceneConfig::default();
        config.camera.fov_degrees = 0.0;
        assert!(config.validate().is_err());
        config.camera.fov_degrees = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let result = SceneConfig::from_toml_str("[camera\nfov = ");
        assert!(matches!(result, Err(Error::ConfigParse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = SceneConfig::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(hex_to_rgb(0xffffff), Vec3::ONE);
        assert_eq!(hex_to_rgb(0x000000), Vec3::ZERO);
        let c = hex_to_rgb(0xdfebff);
        assert!((c.x - 223.0 / 255.0).abs() < 1e-6);
        assert!((c.y - 235.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.z, 1.0);
    }
}
