//! Configuration structs with defaults and RON persistence.
//!
//! Every section uses `#[serde(default)]`, so a config file only needs the
//! fields it wants to change:
//!
//! ```
//! use orrery::OrreryConfig;
//!
//! let config = OrreryConfig::from_ron("(window: (title: \"Tiny\"))").unwrap();
//! assert_eq!(config.window.title, "Tiny");
//! assert_eq!(config.window.width, 800);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::orrery::{BodyDescriptor, Orrery, OrreryError, solar_system_bodies};

/// Errors that can occur when loading, saving, or parsing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the config file to disk.
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse RON content.
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Failed to serialize config to RON.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),

    /// Camera settings cannot produce a usable view.
    #[error("invalid camera {field}: {reason}")]
    Camera {
        field: &'static str,
        reason: String,
    },

    /// The body list cannot be evaluated.
    #[error("invalid body list: {0}")]
    Bodies(#[from] OrreryError),
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrreryConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub scene: SceneConfig,
    /// Bodies in evaluation order; parents must come first.
    pub bodies: Vec<BodyDescriptor>,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Width in logical pixels.
    pub width: u32,
    /// Height in logical pixels.
    pub height: u32,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
}

/// Orbit camera configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Starting distance from the origin.
    pub distance: f32,
    /// Starting horizontal angle in radians.
    pub azimuth: f32,
    /// Starting vertical angle in radians.
    pub elevation: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Radians per pixel of right-mouse drag.
    pub sensitivity: f32,
    /// Distance change per scroll line.
    pub zoom_sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

/// Scene-wide rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Angular step of the sphere tessellation, in radians.
    pub sphere_step: f32,
    /// Emit radial normals instead of the constant placeholder.
    pub outward_normals: bool,
    /// Direction *towards* the light, in world space.
    pub light_direction: [f32; 3],
    /// Light floor for lit bodies, in \[0, 1\].
    pub ambient: f32,
    pub clear_color: [f32; 4],
    pub start_paused: bool,
}

impl Default for OrreryConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            scene: SceneConfig::default(),
            bodies: solar_system_bodies(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Orrery".to_string(),
            width: 800,
            height: 800,
            vsync: true,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 2.0,
            azimuth: 0.0,
            elevation: 0.0,
            fov_degrees: 45.0,
            near: 0.01,
            far: 1000.0,
            sensitivity: 0.01,
            zoom_sensitivity: 0.1,
            min_distance: 0.1,
            max_distance: 4.5,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            sphere_step: crate::sphere::DEFAULT_STEP,
            outward_normals: false,
            light_direction: [0.0, 0.0, 1.0],
            ambient: 0.35,
            clear_color: [1.0, 1.0, 1.0, 1.0],
            start_paused: false,
        }
    }
}

impl OrreryConfig {
    /// Parses a config from RON text.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Serializes the config as pretty-printed RON.
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Loads a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ron(&contents)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Writes the config to `path` as RON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let serialized = self.to_ron()?;
        std::fs::write(path, serialized).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validates the camera section and the body list, returning the
    /// [`Orrery`] to run.
    pub fn orrery(&self) -> Result<Orrery, ConfigError> {
        self.camera.validate()?;
        Ok(Orrery::new(self.bodies.clone())?)
    }
}

impl CameraConfig {
    /// Rejects settings that would give a degenerate projection or an empty
    /// distance range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: String| Err(ConfigError::Camera { field, reason });

        for (field, value) in [
            ("distance", self.distance),
            ("azimuth", self.azimuth),
            ("elevation", self.elevation),
            ("sensitivity", self.sensitivity),
            ("zoom_sensitivity", self.zoom_sensitivity),
            ("min_distance", self.min_distance),
            ("max_distance", self.max_distance),
            ("near", self.near),
            ("far", self.far),
            ("fov_degrees", self.fov_degrees),
        ] {
            if !value.is_finite() {
                return invalid(field, format!("{value} is not finite"));
            }
        }

        if self.min_distance <= 0.0 {
            return invalid(
                "min_distance",
                format!("{} must be positive", self.min_distance),
            );
        }
        if self.min_distance > self.max_distance {
            return invalid(
                "max_distance",
                format!(
                    "{} is below min_distance {}",
                    self.max_distance, self.min_distance
                ),
            );
        }
        if self.near <= 0.0 {
            return invalid("near", format!("{} must be positive", self.near));
        }
        if self.far <= self.near {
            return invalid(
                "far",
                format!("{} must exceed near {}", self.far, self.near),
            );
        }
        if self.fov_degrees <= 0.0 || self.fov_degrees >= 180.0 {
            return invalid(
                "fov_degrees",
                format!("{} must lie strictly between 0 and 180", self.fov_degrees),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orrery::BodyKind;

    #[test]
    fn default_config_serializes() {
        let ron_str = OrreryConfig::default().to_ron().unwrap();
        assert!(ron_str.contains("width: 800"));
        assert!(ron_str.contains("Earth"));
        assert!(ron_str.contains("images/moon.jpg"));
    }

    #[test]
    fn config_roundtrip() {
        let config = OrreryConfig::default();
        let parsed = OrreryConfig::from_ron(&config.to_ron().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config = OrreryConfig::from_ron("(scene: (start_paused: true))").unwrap();
        assert!(config.scene.start_paused);
        assert_eq!(config.scene.sphere_step, crate::sphere::DEFAULT_STEP);
        assert_eq!(config.camera, CameraConfig::default());
        assert_eq!(config.bodies, solar_system_bodies());
    }

    #[test]
    fn body_fields_have_defaults() {
        let config = OrreryConfig::from_ron("(bodies: [(kind: Sun, radius: 0.3)])").unwrap();
        let sun = &config.bodies[0];
        assert_eq!(sun.kind, BodyKind::Sun);
        assert_eq!(sun.scale, 1.0);
        assert_eq!(sun.tint, [1.0; 3]);
        assert!(sun.texture.is_none());
        assert!(config.orrery().is_ok());
    }

    #[test]
    fn invalid_ron_is_a_parse_error() {
        let err = OrreryConfig::from_ron("(window: (width: \"wide\"))").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn bad_body_order_is_rejected() {
        let config = OrreryConfig::from_ron(
            "(bodies: [(kind: Moon, radius: 0.2, parent: Some(Earth)), (kind: Earth, radius: 0.2)])",
        )
        .unwrap();
        assert!(matches!(
            config.orrery(),
            Err(ConfigError::Bodies(OrreryError::ParentAfterChild { .. }))
        ));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orrery.ron");

        let mut config = OrreryConfig::default();
        config.window.title = "Saved".to_string();
        config.scene.outward_normals = true;
        config.save(&path).unwrap();

        assert_eq!(OrreryConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = OrreryConfig::load(&dir.path().join("nope.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn inverted_distance_limits_are_rejected() {
        let config =
            OrreryConfig::from_ron("(camera: (min_distance: 5.0, max_distance: 1.0))").unwrap();
        assert!(matches!(
            config.orrery(),
            Err(ConfigError::Camera {
                field: "max_distance",
                ..
            })
        ));
    }

    #[test]
    fn bad_projection_is_rejected() {
        let cases = [
            ("(camera: (near: 0.0))", "near"),
            ("(camera: (near: 2.0, far: 1.0))", "far"),
            ("(camera: (fov_degrees: 180.0))", "fov_degrees"),
            ("(camera: (min_distance: 0.0))", "min_distance"),
        ];
        for (text, expected) in cases {
            let err = OrreryConfig::from_ron(text).unwrap().orrery().unwrap_err();
            assert!(
                matches!(err, ConfigError::Camera { field, .. } if field == expected),
                "{text}: {err}"
            );
        }
    }

    #[test]
    fn non_finite_camera_values_are_rejected() {
        let mut config = OrreryConfig::default();
        config.camera.max_distance = f32::NAN;
        assert!(matches!(
            config.camera.validate(),
            Err(ConfigError::Camera {
                field: "max_distance",
                ..
            })
        ));
        assert!(OrreryConfig::default().camera.validate().is_ok());
    }
}
