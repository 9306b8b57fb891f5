//! # Engine Errors
//!
//! Error taxonomy for the renderer core.
//!
//! * `InitializationError` - fatal, raised before the frame loop starts
//! * `ResourceError` - a single voxel's buffers could not be created
//! * `FrameError` - a single frame could not be acquired or presented
//!
//! Malformed color input never produces an error value; it is recovered where it
//! is parsed (see `voxels::color`).

use std::path::PathBuf;

use thiserror::Error;

use super::config::ConfigError;

/// Errors that abort startup. The frame loop never runs after one of these.
#[derive(Error, Debug)]
pub enum InitializationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("window creation failed: {0}")]
    Window(String),

    #[error("no compatible graphics adapter: {0}")]
    NoAdapter(String),

    #[error("graphics device request failed: {0}")]
    Device(String),

    #[error("surface is not supported by the adapter")]
    UnsupportedSurface,

    #[error("failed to read shader source {path:?}: {source}")]
    ShaderSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader program '{label}' failed to compile or link: {message}")]
    ShaderCompilation { label: String, message: String },
}

/// Buffer creation or upload failure for one voxel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("buffer '{label}' has no contents")]
    EmptyBuffer { label: String },

    #[error("backend rejected buffer '{label}': {message}")]
    BufferCreation { label: String, message: String },
}

/// A frame that could not be rendered. Only that frame is lost.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("surface texture unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("frame ended without being started")]
    NotStarted,

    #[error("shader program {0} is unknown to the backend")]
    UnknownProgram(u64),
}
