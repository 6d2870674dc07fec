//! Engine, renderer and camera settings

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};

/// # Renderer Configuration
///
/// Frame-level defaults for the renderer: the clear colour, the technique
/// and pass names used when a caller does not name one, and the clip planes
/// of the synthesised cube-face cameras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Background clear color [R, G, B, A] (0.0-1.0 range)
    pub clear_color: [f32; 4],
    /// Technique used by materials that do not name one
    pub default_technique: String,
    /// Pass used by immediate draws that do not name one
    pub default_pass: String,
    /// Near plane of the cube-face cameras
    pub cube_face_near_plane: f32,
    /// Far plane of the cube-face cameras
    pub cube_face_far_plane: f32,
}

impl RendererConfig {
    /// Set background clear color
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Set the clip planes used when replaying into cube targets
    pub fn with_cube_face_planes(mut self, near: f32, far: f32) -> Self {
        self.cube_face_near_plane = near;
        self.cube_face_far_plane = far;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_pass.is_empty() || self.default_technique.is_empty() {
            return Err(ConfigError::Invalid("default technique and pass names cannot be empty".to_string()));
        }
        validate_planes(self.cube_face_near_plane, self.cube_face_far_plane)
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 0.0],
            default_technique: "Default".to_string(),
            default_pass: "Default".to_string(),
            cube_face_near_plane: 0.1,
            cube_face_far_plane: 100.0,
        }
    }
}

/// # Camera Configuration
///
/// Initial projection parameters for newly created cameras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub field_of_view: f32,
    /// Distance to the near clipping plane
    pub near_plane: f32,
    /// Distance to the far clipping plane
    pub far_plane: f32,
    /// Half-height of the orthographic view volume
    pub orthographic_size: f32,
}

impl CameraConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.field_of_view > 0.0 && self.field_of_view < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "field of view must be within (0, 180) degrees, got {}",
                self.field_of_view
            )));
        }
        if self.orthographic_size <= 0.0 {
            return Err(ConfigError::Invalid("orthographic size must be positive".to_string()));
        }
        validate_planes(self.near_plane, self.far_plane)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            field_of_view: 90.0,
            near_plane: 0.1,
            far_plane: 100.0,
            orthographic_size: 5.0,
        }
    }
}

/// # Engine Configuration
///
/// Top-level settings file of an application built on the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `env_logger` filter string, e.g. `"info"` or `"snuff_engine=debug"`
    pub log_filter: String,
    /// Renderer settings
    pub renderer: RendererConfig,
    /// Camera defaults
    pub camera: CameraConfig,
}

impl EngineConfig {
    /// Set log filter
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.renderer.validate()?;
        self.camera.validate()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            renderer: RendererConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl Config for EngineConfig {}

fn validate_planes(near: f32, far: f32) -> Result<(), ConfigError> {
    if near <= 0.0 || far <= near {
        return Err(ConfigError::Invalid(format!(
            "clip planes must satisfy 0 < near < far, got near {near} far {far}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            log_filter = "warn"

            [camera]
            field_of_view = 60.0
            "#,
        )
        .unwrap();

        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.camera.field_of_view, 60.0);
        assert_eq!(config.camera.near_plane, 0.1);
        assert_eq!(config.renderer, RendererConfig::default());
    }

    #[test]
    fn test_inverted_planes_are_rejected() {
        let renderer = RendererConfig::default().with_cube_face_planes(10.0, 1.0);
        assert!(matches!(renderer.validate(), Err(ConfigError::Invalid(_))));

        let camera = CameraConfig {
            field_of_view: 180.0,
            ..CameraConfig::default()
        };
        assert!(camera.validate().is_err());
    }
}
