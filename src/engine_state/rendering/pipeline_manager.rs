//! The fixed voxel shader program.
//!
//! The program reads a `vec3<f32>` position at location 0 and a `vec4<f32>` color at
//! location 1, transforms the position by `projection * model_view` and writes the
//! interpolated color unlit. Both matrices live in one uniform block at group 0,
//! binding 0 (see `TransformUniform`).

use std::path::Path;

use super::{ProgramDescriptor, ProgramHandle, RenderBackend, UniformBinding};
use crate::engine_state::error::InitializationError;

/// Built-in WGSL source of the voxel program.
pub const VOXEL_SHADER_SOURCE: &str = include_str!("../../../assets/shaders/voxel.wgsl");

/// Vertex entry point name.
pub const VERTEX_ENTRY_POINT: &str = "vs_main";

/// Fragment entry point name.
pub const FRAGMENT_ENTRY_POINT: &str = "fs_main";

/// Attribute location of the position input.
pub const POSITION_LOCATION: u32 = 0;

/// Attribute location of the color input.
pub const COLOR_LOCATION: u32 = 1;

const PROGRAM_LABEL: &str = "Voxel Program";

/// A linked voxel program and the locations of its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderPipeline {
    program: ProgramHandle,
}

impl ShaderPipeline {
    /// Compiles and links the voxel program from `source`.
    ///
    /// Any compile or link failure is returned as an `InitializationError`; the frame
    /// loop must not be started without a program.
    pub fn initialize<B: RenderBackend + ?Sized>(
        backend: &mut B,
        source: &str,
    ) -> Result<Self, InitializationError> {
        let program = backend.create_program(&ProgramDescriptor {
            label: PROGRAM_LABEL,
            source,
        })?;
        log::info!("Voxel program linked ({:?})", program);
        Ok(Self { program })
    }

    /// Reads the WGSL source to use: `override_path` if given, else the built-in shader.
    pub fn load_source(override_path: Option<&Path>) -> Result<String, InitializationError> {
        match override_path {
            Some(path) => {
                log::info!("Loading voxel shader from {:?}", path);
                std::fs::read_to_string(path).map_err(|source| InitializationError::ShaderSource {
                    path: path.to_path_buf(),
                    source,
                })
            }
            None => Ok(VOXEL_SHADER_SOURCE.to_string()),
        }
    }

    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    pub fn position_location(&self) -> u32 {
        POSITION_LOCATION
    }

    pub fn color_location(&self) -> u32 {
        COLOR_LOCATION
    }

    pub fn projection_uniform(&self) -> UniformBinding {
        UniformBinding::Projection
    }

    pub fn model_view_uniform(&self) -> UniformBinding {
        UniformBinding::ModelView
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::testing::{BackendCall, RecordingBackend};

    #[test]
    fn initialize_links_one_program() {
        let mut backend = RecordingBackend::new();
        let pipeline = ShaderPipeline::initialize(&mut backend, VOXEL_SHADER_SOURCE).unwrap();

        assert_eq!(
            backend.calls,
            vec![BackendCall::CreateProgram(PROGRAM_LABEL.to_string())]
        );
        assert_eq!(pipeline.position_location(), 0);
        assert_eq!(pipeline.color_location(), 1);
        assert_ne!(pipeline.projection_uniform(), pipeline.model_view_uniform());
    }

    #[test]
    fn link_failure_is_fatal() {
        let mut backend = RecordingBackend::new();
        backend.fail_program = true;
        let result = ShaderPipeline::initialize(&mut backend, "not wgsl");
        assert!(matches!(
            result,
            Err(InitializationError::ShaderCompilation { .. })
        ));
    }

    #[test]
    fn built_in_source_declares_the_program_interface() {
        let source = ShaderPipeline::load_source(None).unwrap();
        assert!(source.contains(&format!("fn {}", VERTEX_ENTRY_POINT)));
        assert!(source.contains(&format!("fn {}", FRAGMENT_ENTRY_POINT)));
        assert!(source.contains("@location(0) position: vec3<f32>"));
        assert!(source.contains("@location(1) color: vec4<f32>"));
        assert!(source.contains("transforms.projection * transforms.model_view"));
    }

    #[test]
    fn missing_override_file_is_fatal() {
        let path = std::env::temp_dir().join("voxel-renderer-missing-shader.wgsl");
        assert!(matches!(
            ShaderPipeline::load_source(Some(&path)),
            Err(InitializationError::ShaderSource { .. })
        ));
    }
}
