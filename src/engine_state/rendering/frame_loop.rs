//! The per-frame draw pipeline.
//!
//! Each tick, in order:
//! 1. begin the frame, clearing color and depth
//! 2. draw every stored voxel in insertion order, one indexed draw each
//! 3. end the frame (submit and present)
//! 4. recompute the model-view from the absolute elapsed time and upload it
//!
//! Scheduling the next tick is the caller's job (the application requests a redraw
//! every event-loop turn, which the surface paces to the display refresh).

use cgmath::{Matrix4, Point3};
use web_time::{Duration, Instant};

use super::{
    ClearColor, IndexedDraw, RenderBackend, ShaderPipeline, VertexBinding,
};
use crate::engine_state::{
    camera_state::{model_view_at, ViewportManager},
    config::{RendererConfig, ViewConfig},
    error::{FrameError, InitializationError, ResourceError},
    voxels::{Rgb, VoxelBuffers, VoxelId, VoxelStore},
};

/// Render state owned by the frame loop.
pub struct SceneState {
    /// Voxels in draw order.
    pub voxels: VoxelStore,
    /// Projection and viewport.
    pub viewport: ViewportManager,
    /// Model-view uploaded by the most recent tick.
    model_view: Matrix4<f32>,
}

impl SceneState {
    pub fn model_view(&self) -> Matrix4<f32> {
        self.model_view
    }
}

/// Wall-clock time since the frame loop started.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    start: Instant,
}

impl FrameClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Summary of one completed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub frame_index: u64,
    pub voxels_drawn: usize,
    pub elapsed: Duration,
}

/// The running frame loop. Constructing one is the transition out of the idle state.
pub struct FrameLoop {
    pipeline: ShaderPipeline,
    scene: SceneState,
    clock: FrameClock,
    view: ViewConfig,
    clear_color: ClearColor,
    frame_index: u64,
}

impl FrameLoop {
    /// Links the voxel program, uploads the initial transforms and starts the clock.
    pub fn initialize<B: RenderBackend + ?Sized>(
        backend: &mut B,
        shader_source: &str,
        width: u32,
        height: u32,
        config: &RendererConfig,
    ) -> Result<Self, InitializationError> {
        config.validate()?;
        let pipeline = ShaderPipeline::initialize(backend, shader_source)?;

        let viewport = ViewportManager::new(width, height, &config.projection);
        viewport.apply(backend, &pipeline);

        let model_view = model_view_at(Duration::ZERO, &config.view);
        backend.write_uniform(
            pipeline.program(),
            pipeline.model_view_uniform(),
            &model_view,
        );

        log::info!("Frame loop running at {}x{}", width, height);

        Ok(Self {
            pipeline,
            scene: SceneState {
                voxels: VoxelStore::new(),
                viewport,
                model_view,
            },
            clock: FrameClock::start(),
            view: config.view,
            clear_color: ClearColor::from(config.clear_color),
            frame_index: 0,
        })
    }

    /// Runs one iteration at the current wall-clock time.
    pub fn tick<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<FrameStats, FrameError> {
        let elapsed = self.clock.elapsed();
        self.tick_at(backend, elapsed)
    }

    /// Runs one iteration as if `elapsed` time had passed since the loop started.
    ///
    /// A failed frame draws nothing further and is reported; the loop stays usable.
    pub fn tick_at<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        elapsed: Duration,
    ) -> Result<FrameStats, FrameError> {
        let program = self.pipeline.program();
        backend.begin_frame(program, self.clear_color)?;

        let mut voxels_drawn = 0;
        self.scene.voxels.for_each(|_, buffers| {
            backend.draw_indexed(&self.draw_for(buffers));
            voxels_drawn += 1;
        });

        let presented = backend.end_frame();

        self.scene.model_view = model_view_at(elapsed, &self.view);
        backend.write_uniform(
            program,
            self.pipeline.model_view_uniform(),
            &self.scene.model_view,
        );

        presented?;

        let stats = FrameStats {
            frame_index: self.frame_index,
            voxels_drawn,
            elapsed,
        };
        self.frame_index += 1;
        log::trace!("{:?}", stats);
        Ok(stats)
    }

    fn draw_for(&self, buffers: &VoxelBuffers) -> IndexedDraw {
        IndexedDraw {
            attributes: [
                VertexBinding {
                    location: self.pipeline.position_location(),
                    buffer: buffers.positions,
                },
                VertexBinding {
                    location: self.pipeline.color_location(),
                    buffer: buffers.colors,
                },
            ],
            indices: buffers.indices,
            index_count: buffers.index_count,
        }
    }

    /// Applies a surface resize before the next frame.
    pub fn resize<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        width: u32,
        height: u32,
    ) -> bool {
        self.scene
            .viewport
            .on_resize(backend, &self.pipeline, width, height)
    }

    /// Builds and stores a voxel; it is drawn from the next tick on.
    pub fn add_voxel<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        origin: Point3<i32>,
        color: Rgb,
    ) -> Result<VoxelId, ResourceError> {
        self.scene.voxels.add(backend, origin, color)
    }

    /// A handle to the voxel store for other input paths.
    pub fn voxels(&self) -> VoxelStore {
        self.scene.voxels.clone()
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frame_index
    }

    /// Releases every voxel's buffers.
    pub fn shutdown<B: RenderBackend + ?Sized>(self, backend: &mut B) {
        self.scene.voxels.release_all(backend);
        log::info!("Frame loop stopped after {} frames", self.frame_index);
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Matrix4, Vector3};

    use super::*;
    use crate::engine_state::{
        camera_state::Projection,
        config::ProjectionConfig,
        rendering::{
            pipeline_manager::VOXEL_SHADER_SOURCE,
            testing::{BackendCall, RecordingBackend},
            UniformBinding, Viewport,
        },
    };

    fn running(backend: &mut RecordingBackend) -> FrameLoop {
        let frame_loop = FrameLoop::initialize(
            backend,
            VOXEL_SHADER_SOURCE,
            800,
            600,
            &RendererConfig::default(),
        )
        .unwrap();
        backend.clear_calls();
        frame_loop
    }

    #[test]
    fn initialize_uploads_transforms_and_viewport() {
        let mut backend = RecordingBackend::new();
        let frame_loop = FrameLoop::initialize(
            &mut backend,
            VOXEL_SHADER_SOURCE,
            800,
            600,
            &RendererConfig::default(),
        )
        .unwrap();

        assert!(matches!(backend.calls[0], BackendCall::CreateProgram(_)));
        assert_eq!(backend.viewport, Some(Viewport::full(800, 600)));
        assert_eq!(
            backend.uniforms[&UniformBinding::Projection],
            Projection::from_config(800, 600, &ProjectionConfig::default()).calc_matrix()
        );
        assert_eq!(
            backend.uniforms[&UniformBinding::ModelView],
            Matrix4::from_translation(Vector3::new(0.0, 0.0, -6.0))
        );
        assert_eq!(frame_loop.frames_rendered(), 0);
        assert!(frame_loop.scene().voxels.is_empty());
    }

    #[test]
    fn initialization_failure_is_returned() {
        let mut backend = RecordingBackend::new();
        backend.fail_program = true;
        let result = FrameLoop::initialize(
            &mut backend,
            VOXEL_SHADER_SOURCE,
            800,
            600,
            &RendererConfig::default(),
        );
        assert!(result.is_err());
        assert_eq!(backend.calls.len(), 1);
    }

    #[test]
    fn degenerate_projection_is_refused_before_linking() {
        let mut backend = RecordingBackend::new();
        let mut config = RendererConfig::default();
        config.projection.z_near = 0.0;

        let result = FrameLoop::initialize(&mut backend, VOXEL_SHADER_SOURCE, 800, 600, &config);
        assert!(matches!(result, Err(InitializationError::Config(_))));
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn tick_follows_clear_draw_present_update_order() {
        let mut backend = RecordingBackend::new();
        let mut frame_loop = running(&mut backend);
        for n in 0..3 {
            frame_loop
                .add_voxel(&mut backend, Point3::new(n, 0, 0), Rgb::default())
                .unwrap();
        }
        let voxels = frame_loop.voxels().snapshot();
        backend.clear_calls();

        let stats = frame_loop
            .tick_at(&mut backend, Duration::from_secs(2))
            .unwrap();
        assert_eq!(stats.voxels_drawn, 3);
        assert_eq!(stats.frame_index, 0);

        let mut expected = vec![BackendCall::BeginFrame(ClearColor::BLACK)];
        for voxel in &voxels {
            expected.push(BackendCall::Draw(IndexedDraw {
                attributes: [
                    VertexBinding {
                        location: 0,
                        buffer: voxel.buffers.positions,
                    },
                    VertexBinding {
                        location: 1,
                        buffer: voxel.buffers.colors,
                    },
                ],
                indices: voxel.buffers.indices,
                index_count: 36,
            }));
        }
        expected.push(BackendCall::EndFrame);
        expected.push(BackendCall::WriteUniform(UniformBinding::ModelView));
        assert_eq!(backend.calls, expected);
    }

    #[test]
    fn model_view_follows_elapsed_time() {
        let mut backend = RecordingBackend::new();
        let mut frame_loop = running(&mut backend);

        for seconds in [3u64, 1, 7] {
            frame_loop
                .tick_at(&mut backend, Duration::from_secs(seconds))
                .unwrap();
            let expected = model_view_at(Duration::from_secs(seconds), &ViewConfig::default());
            assert_eq!(backend.uniforms[&UniformBinding::ModelView], expected);
            assert_eq!(frame_loop.scene().model_view(), expected);
        }
        assert_eq!(frame_loop.frames_rendered(), 3);
    }

    #[test]
    fn voxel_added_between_ticks_is_drawn_next_tick() {
        let mut backend = RecordingBackend::new();
        let mut frame_loop = running(&mut backend);

        let first = frame_loop.tick_at(&mut backend, Duration::ZERO).unwrap();
        assert_eq!(first.voxels_drawn, 0);

        let input_path = frame_loop.voxels();
        input_path
            .add(&mut backend, Point3::new(0, 0, 0), Rgb::default())
            .unwrap();

        let second = frame_loop
            .tick_at(&mut backend, Duration::from_millis(16))
            .unwrap();
        assert_eq!(second.voxels_drawn, 1);
    }

    #[test]
    fn resize_lands_before_the_next_frame() {
        let mut backend = RecordingBackend::new();
        let mut frame_loop = running(&mut backend);

        assert!(frame_loop.resize(&mut backend, 1024, 512));
        frame_loop.tick_at(&mut backend, Duration::ZERO).unwrap();

        let begin = backend
            .calls
            .iter()
            .position(|call| matches!(call, BackendCall::BeginFrame(_)))
            .unwrap();
        let viewport = backend
            .calls
            .iter()
            .position(|call| *call == BackendCall::SetViewport(Viewport::full(1024, 512)))
            .unwrap();
        let projection = backend
            .calls
            .iter()
            .position(|call| *call == BackendCall::WriteUniform(UniformBinding::Projection))
            .unwrap();
        assert!(viewport < begin);
        assert!(projection < begin);
        assert_eq!(frame_loop.scene().viewport.projection().aspect(), 2.0);
    }

    #[test]
    fn failed_frame_is_dropped_and_loop_continues() {
        let mut backend = RecordingBackend::new();
        let mut frame_loop = running(&mut backend);
        frame_loop
            .add_voxel(&mut backend, Point3::new(0, 0, 0), Rgb::default())
            .unwrap();

        backend.fail_frame = true;
        let result = frame_loop.tick_at(&mut backend, Duration::from_secs(1));
        assert!(matches!(result, Err(FrameError::SurfaceUnavailable(_))));
        assert!(backend.draws().is_empty());

        backend.fail_frame = false;
        let stats = frame_loop
            .tick_at(&mut backend, Duration::from_secs(2))
            .unwrap();
        assert_eq!(stats.voxels_drawn, 1);
        assert_eq!(stats.frame_index, 0);
        assert_eq!(backend.draws().len(), 1);
    }

    #[test]
    fn shutdown_releases_voxel_buffers() {
        let mut backend = RecordingBackend::new();
        let frame_loop = running(&mut backend);
        frame_loop
            .add_voxel(&mut backend, Point3::new(0, 0, 0), Rgb::default())
            .unwrap();
        assert_eq!(backend.live_buffers(), 3);

        frame_loop.shutdown(&mut backend);
        assert_eq!(backend.live_buffers(), 0);
    }
}
