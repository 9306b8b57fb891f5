//! # Engine State Module
//!
//! The renderer core and the state that drives it.
//!
//! ## Key Components
//!
//! * `EngineState` - Owns the GPU backend, the frame loop and the color palette
//! * `buffer_state` - Registry and analytics of GPU buffers
//! * `camera_state` - Projection, viewport and the time-driven model-view
//! * `config` - JSON renderer configuration
//! * `error` - Error taxonomy
//! * `rendering` - Backend abstraction, shader program and frame loop
//! * `voxels` - Colors, cube geometry and the voxel store

use cgmath::Point3;
use winit::{dpi::PhysicalSize, keyboard::KeyCode};

use crate::application_state::{
    input_manager::{ADD_VOXEL_KEY, BUFFER_STATS_KEY, PALETTE_KEYS},
    input_state::ProcessedInputState,
};
use config::RendererConfig;
use error::InitializationError;
use rendering::{BufferKind, FrameLoop, ShaderPipeline, WgpuBackend};
use voxels::{Palette, VoxelId};

pub mod buffer_state;
pub mod camera_state;
pub mod config;
pub mod error;
pub mod rendering;
pub mod voxels;

/// The running renderer.
///
/// Input is applied between frames: `set_input_commands` translates a key sample into
/// a `PlayerAction`, `process_input` carries it out, and `render` draws the next frame.
pub struct EngineState {
    backend: WgpuBackend,
    frame_loop: FrameLoop,
    palette: Palette,
    player_actions: PlayerAction,
}

impl EngineState {
    /// Creates the voxel program and starts the frame loop on the given surface.
    pub fn new(
        surface: wgpu::Surface<'static>,
        surface_config: wgpu::SurfaceConfiguration,
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: &RendererConfig,
    ) -> Result<Self, InitializationError> {
        let shader_source = ShaderPipeline::load_source(config.shader_path.as_deref())?;
        let (width, height) = (surface_config.width, surface_config.height);

        let mut backend = WgpuBackend::new(surface, surface_config, device, queue);
        log::info!("Rendering to {:?} surface", backend.surface_format());

        let frame_loop = FrameLoop::initialize(&mut backend, &shader_source, width, height, config)?;
        let palette = Palette::from_hex(config.palette.as_slice());

        Ok(Self {
            backend,
            frame_loop,
            palette,
            player_actions: PlayerAction::default(),
        })
    }

    /// Resizes the surface, then updates projection and viewport before the next frame.
    pub fn resize_surface(&mut self, size: PhysicalSize<u32>) {
        if self.backend.resize_surface(size.width, size.height) {
            self.frame_loop
                .resize(&mut self.backend, size.width, size.height);
        } else {
            log::warn!("Ignoring resize to {}x{}", size.width, size.height);
        }
    }

    /// Renders one frame. A failed frame is logged and skipped.
    pub fn render(&mut self) {
        if let Err(error) = self.frame_loop.tick(&mut self.backend) {
            log::error!("Dropped frame: {}", error);
        }
    }

    /// Adds a voxel in the selected color at the next free slot along +x.
    pub fn add_voxel(&mut self) -> Option<VoxelId> {
        let origin = Point3::new(self.frame_loop.scene().voxels.len() as i32, 0, 0);
        match self
            .frame_loop
            .add_voxel(&mut self.backend, origin, self.palette.selected())
        {
            Ok(id) => {
                log::info!("Added voxel {} at x = {}", id.0, origin.x);
                Some(id)
            }
            Err(error) => {
                log::error!("Failed to add voxel: {}", error);
                None
            }
        }
    }

    /// Logs buffer memory statistics.
    pub fn log_buffer_usage(&self) {
        let total = self.backend.buffer_usage();
        log::info!(
            "{} buffers, {} bytes allocated, {} bytes used, {} writes",
            total.buffer_count,
            total.allocated_memory,
            total.used_memory,
            total.times_written
        );
        for kind in [BufferKind::Vertex, BufferKind::Index, BufferKind::Uniform] {
            let usage = self.backend.buffer_usage_of(kind);
            log::info!(
                "  {:?}: {} buffers, {} bytes",
                kind,
                usage.buffer_count,
                usage.allocated_memory
            );
        }
    }

    /// Translates a key sample into the actions for the next `process_input`.
    pub fn set_input_commands(&mut self, input: ProcessedInputState) {
        self.player_actions = PlayerAction::from_input(&input);
    }

    /// Carries out the pending actions.
    pub fn process_input(&mut self) {
        let actions = std::mem::take(&mut self.player_actions);

        if let Some(index) = actions.select_color {
            match self.palette.select(index) {
                Some(color) => log::info!(
                    "Selected color {} ({:.2}, {:.2}, {:.2})",
                    index + 1,
                    color.r(),
                    color.g(),
                    color.b()
                ),
                None => log::warn!(
                    "Palette has {} colors, ignoring selection {}",
                    self.palette.len(),
                    index + 1
                ),
            }
        }

        if actions.add_voxel {
            self.add_voxel();
        }

        if actions.log_buffer_usage {
            self.log_buffer_usage();
        }
    }

    /// Releases every voxel's buffers.
    pub fn shutdown(self) {
        let Self {
            mut backend,
            frame_loop,
            ..
        } = self;
        frame_loop.shutdown(&mut backend);
    }
}

/// Actions requested by one key sample.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PlayerAction {
    add_voxel: bool,
    select_color: Option<usize>,
    log_buffer_usage: bool,
}

impl PlayerAction {
    /// Only fresh presses trigger actions; held keys do not repeat them.
    fn from_input(input: &ProcessedInputState) -> Self {
        let just_pressed = |key: KeyCode| input.get_key_state(key).is_just_pressed();

        Self {
            add_voxel: just_pressed(ADD_VOXEL_KEY),
            select_color: PALETTE_KEYS.iter().rposition(|key| just_pressed(*key)),
            log_buffer_usage: just_pressed(BUFFER_STATS_KEY),
        }
    }
}
