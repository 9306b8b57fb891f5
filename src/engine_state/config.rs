//! # Renderer Configuration
//!
//! Optional JSON configuration. Every field has a default, so a missing file, or a
//! file that sets only some fields, is valid.
//!
//! ```json
//! {
//!     "window_title": "Voxels",
//!     "projection": { "fov_y_degrees": 60.0 },
//!     "palette": ["#ff0000", "#ffffff"]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "VOXEL_RENDERER_CONFIG";

/// File read when `CONFIG_PATH_ENV` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "voxel_renderer.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config value `{field}` = {value}: {reason}")]
    Invalid {
        field: &'static str,
        value: f32,
        reason: &'static str,
    },
}

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            z_near: 0.1,
            z_far: 100.0,
        }
    }
}

/// Placement of the scene in front of the camera.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Distance the scene is pushed along `-z`.
    pub camera_distance: f32,
    /// Rotation about the Y axis, radians per second.
    pub rotation_rate: f32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            camera_distance: 6.0,
            rotation_rate: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub window_title: String,
    pub projection: ProjectionConfig,
    pub view: ViewConfig,
    pub clear_color: [f64; 4],
    /// Hexadecimal colors selectable with the number keys.
    pub palette: Vec<String>,
    /// WGSL file replacing the built-in voxel shader.
    pub shader_path: Option<PathBuf>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            window_title: String::from("Simple Voxel Renderer"),
            projection: ProjectionConfig::default(),
            view: ViewConfig::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            palette: [
                "#ff0000", "#00ff00", "#0000ff", "#ffff00", "#ff00ff", "#00ffff", "#ffffff",
                "#ff8000",
            ]
            .iter()
            .map(|hex| hex.to_string())
            .collect(),
            shader_path: None,
        }
    }
}

impl RendererConfig {
    /// Loads the configuration named by `VOXEL_RENDERER_CONFIG`, else `voxel_renderer.json`.
    ///
    /// A missing default file yields the defaults; a missing file named explicitly
    /// through the environment is an error.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Self::load_or_default(Path::new(DEFAULT_CONFIG_FILE)),
        }
    }

    /// Reads `path` if it exists, otherwise returns the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            log::info!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        log::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values the projection and model-view are built from.
    ///
    /// The perspective matrix needs `0 < fov < 180` degrees and `0 < z_near < z_far`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ProjectionConfig {
            fov_y_degrees,
            z_near,
            z_far,
        } = self.projection;

        ensure(
            "projection.fov_y_degrees",
            fov_y_degrees,
            fov_y_degrees > 0.0 && fov_y_degrees < 180.0,
            "must be between 0 and 180 degrees, exclusive",
        )?;
        ensure(
            "projection.z_near",
            z_near,
            z_near.is_finite() && z_near > 0.0,
            "must be finite and positive",
        )?;
        ensure(
            "projection.z_far",
            z_far,
            z_far.is_finite() && z_far > z_near,
            "must be finite and greater than z_near",
        )?;

        let ViewConfig {
            camera_distance,
            rotation_rate,
        } = self.view;
        ensure(
            "view.camera_distance",
            camera_distance,
            camera_distance.is_finite(),
            "must be finite",
        )?;
        ensure(
            "view.rotation_rate",
            rotation_rate,
            rotation_rate.is_finite(),
            "must be finite",
        )
    }
}

fn ensure(
    field: &'static str,
    value: f32,
    valid: bool,
    reason: &'static str,
) -> Result<(), ConfigError> {
    if valid {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            value,
            reason,
        })
    }
}
