#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Renderer
//!
//! A minimal real-time voxel renderer built with Rust and WGPU.
//!
//! Every voxel is a unit cube with its own position, color and index buffers. Each
//! frame clears the screen, draws every stored voxel in insertion order with a fixed
//! unlit shader, presents, then advances a time-driven spin of the whole scene.
//!
//! ## Key Modules
//!
//! * `application_state` - Window, graphics initialization and keyboard input
//! * `core` - Shared-state primitives
//! * `engine_state` - The renderer core: colors, geometry, voxel store, shader
//!   program, viewport and frame loop
//!
//! ## Architecture
//!
//! The renderer core reaches the GPU only through the `RenderBackend` trait; the
//! application drives it with the WGPU implementation. Voxels may be added from any
//! thread holding a `VoxelStore` handle while the frame loop runs.
//!
//! ## Usage
//!
//! ```no_run
//! fn main() {
//!     if let Err(error) = voxel_renderer::run() {
//!         eprintln!("{error}");
//!     }
//! }
//! ```
//!
//! Keys: `Space` adds a voxel, `1`-`8` pick its color, `B` logs buffer memory and
//! `Escape` quits.

use application_state::{graphics_resources_builder::GraphicsEvent, ApplicationState};
use log::info;
use thiserror::Error;
use winit::event_loop::EventLoop;

pub mod application_state;
pub mod core;
pub mod engine_state;

pub use engine_state::{
    camera_state::{model_view_at, Projection, ViewportManager},
    config::{ConfigError, RendererConfig},
    error::{FrameError, InitializationError, ResourceError},
    rendering::{FrameLoop, RenderBackend, ShaderPipeline, WgpuBackend},
    voxels::{hex_to_rgb, CubeGeometry, Palette, Rgb, VoxelId, VoxelStore},
};

/// Errors that end `run`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Initialization(#[from] InitializationError),

    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Initializes logging, loads the configuration and runs the renderer until the window closes.
pub fn run() -> Result<(), AppError> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config = RendererConfig::load()?;

    let event_loop = EventLoop::<GraphicsEvent>::with_user_event().build()?;
    let mut state = ApplicationState::new(event_loop.create_proxy(), config);

    event_loop.run_app(&mut state)?;

    match state.take_error() {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}
