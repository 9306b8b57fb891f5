//! # Camera State Management
//!
//! Keeps the projection matrix and the backend viewport consistent with the
//! surface size.
//!
//! ## Core Components
//! - `ViewportManager`: owns the projection and the viewport rectangle
//! - `camera::Projection`: perspective parameters and matrix
//! - `camera::model_view_at`: the time-driven model-view transform

use crate::engine_state::{
    config::ProjectionConfig,
    rendering::{RenderBackend, ShaderPipeline, Viewport},
};

pub mod camera;

pub use camera::{model_view_at, Projection, TransformUniform};

/// Tracks the surface size and the transforms derived from it.
///
/// Every accepted resize uploads the new projection and sets the new viewport in
/// the same call, so no frame can observe one without the other.
#[derive(Debug, Clone)]
pub struct ViewportManager {
    projection: Projection,
    viewport: Viewport,
}

impl ViewportManager {
    /// Creates the manager for an initial surface size.
    ///
    /// Zero dimensions are treated as 1 pixel until the first real resize.
    pub fn new(width: u32, height: u32, config: &ProjectionConfig) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            projection: Projection::from_config(width, height, config),
            viewport: Viewport::full(width, height),
        }
    }

    /// Uploads the current projection and viewport, e.g. right after the program is created.
    pub fn apply<B: RenderBackend + ?Sized>(&self, backend: &mut B, pipeline: &ShaderPipeline) {
        backend.write_uniform(
            pipeline.program(),
            pipeline.projection_uniform(),
            &self.projection.calc_matrix(),
        );
        backend.set_viewport(self.viewport);
    }

    /// Applies a new surface size.
    ///
    /// Returns `false`, leaving everything untouched, for a zero-sized surface
    /// (a minimized window).
    pub fn on_resize<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        pipeline: &ShaderPipeline,
        width: u32,
        height: u32,
    ) -> bool {
        if width == 0 || height == 0 {
            log::warn!("Ignoring resize to {}x{}", width, height);
            return false;
        }

        self.projection.resize(width, height);
        self.viewport = Viewport::full(width, height);
        self.apply(backend, pipeline);

        log::info!(
            "Viewport resized to {}x{} (aspect {:.3})",
            width,
            height,
            self.projection.aspect()
        );
        true
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::{
        pipeline_manager::VOXEL_SHADER_SOURCE,
        testing::{BackendCall, RecordingBackend},
        UniformBinding,
    };

    fn linked(backend: &mut RecordingBackend) -> ShaderPipeline {
        let pipeline = ShaderPipeline::initialize(backend, VOXEL_SHADER_SOURCE).unwrap();
        backend.clear_calls();
        pipeline
    }

    #[test]
    fn resize_updates_projection_and_viewport_together() {
        let mut backend = RecordingBackend::new();
        let pipeline = linked(&mut backend);
        let mut viewport = ViewportManager::new(640, 480, &ProjectionConfig::default());

        assert!(viewport.on_resize(&mut backend, &pipeline, 800, 600));

        assert_eq!(viewport.projection().aspect(), 800.0 / 600.0);
        assert_eq!(viewport.viewport(), Viewport::full(800, 600));
        assert_eq!(
            viewport.viewport(),
            Viewport {
                x: 0,
                y: 0,
                width: 800,
                height: 600
            }
        );

        assert_eq!(
            backend.calls,
            vec![
                BackendCall::WriteUniform(UniformBinding::Projection),
                BackendCall::SetViewport(Viewport::full(800, 600)),
            ]
        );
        assert_eq!(
            backend.uniforms[&UniformBinding::Projection],
            viewport.projection().calc_matrix()
        );
        assert_eq!(backend.viewport, Some(Viewport::full(800, 600)));
    }

    #[test]
    fn projection_uses_fixed_lens() {
        let viewport = ViewportManager::new(800, 600, &ProjectionConfig::default());
        let projection = viewport.projection();
        assert_eq!(projection.fovy(), cgmath::Rad::from(cgmath::Deg(45.0)));
        assert_eq!(projection.znear(), 0.1);
        assert_eq!(projection.zfar(), 100.0);
    }

    #[test]
    fn zero_sized_resize_is_ignored() {
        let mut backend = RecordingBackend::new();
        let pipeline = linked(&mut backend);
        let mut viewport = ViewportManager::new(800, 600, &ProjectionConfig::default());

        assert!(!viewport.on_resize(&mut backend, &pipeline, 0, 600));
        assert!(!viewport.on_resize(&mut backend, &pipeline, 800, 0));

        assert!(backend.calls.is_empty());
        assert_eq!(viewport.viewport(), Viewport::full(800, 600));
        assert_eq!(viewport.projection().aspect(), 800.0 / 600.0);
    }

    #[test]
    fn zero_initial_size_is_usable() {
        let viewport = ViewportManager::new(0, 0, &ProjectionConfig::default());
        assert_eq!(viewport.viewport(), Viewport::full(1, 1));
        assert!(viewport.projection().aspect().is_finite());
    }
}
