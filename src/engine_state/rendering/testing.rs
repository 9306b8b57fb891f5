//! In-memory backend that records every call, for exercising the renderer core without a GPU.

use std::collections::{BTreeMap, HashMap};

use cgmath::Matrix4;

use super::{
    BufferDescriptor, BufferHandle, BufferKind, ClearColor, IndexedDraw, ProgramDescriptor,
    ProgramHandle, RenderBackend, UniformBinding, Viewport,
};
use crate::engine_state::error::{FrameError, InitializationError, ResourceError};

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateProgram(String),
    CreateBuffer(String, BufferKind),
    ReleaseBuffer(BufferHandle),
    WriteUniform(UniformBinding),
    SetViewport(Viewport),
    BeginFrame(ClearColor),
    Draw(IndexedDraw),
    EndFrame,
}

#[derive(Default)]
pub struct RecordingBackend {
    pub calls: Vec<BackendCall>,
    pub buffers: BTreeMap<BufferHandle, (BufferKind, Vec<u8>)>,
    pub uniforms: HashMap<UniformBinding, Matrix4<f32>>,
    pub viewport: Option<Viewport>,
    /// Number of further buffer creations that succeed before one fails.
    pub fail_buffer_after: Option<usize>,
    pub fail_program: bool,
    pub fail_frame: bool,
    next_handle: u64,
    frame_open: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn draws(&self) -> Vec<IndexedDraw> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Draw(draw) => Some(*draw),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl RenderBackend for RecordingBackend {
    fn create_program(
        &mut self,
        descriptor: &ProgramDescriptor<'_>,
    ) -> Result<ProgramHandle, InitializationError> {
        self.calls
            .push(BackendCall::CreateProgram(descriptor.label.to_string()));
        if self.fail_program {
            return Err(InitializationError::ShaderCompilation {
                label: descriptor.label.to_string(),
                message: "injected failure".to_string(),
            });
        }
        self.next_handle += 1;
        Ok(ProgramHandle(self.next_handle))
    }

    fn create_buffer(
        &mut self,
        descriptor: &BufferDescriptor<'_>,
    ) -> Result<BufferHandle, ResourceError> {
        self.calls.push(BackendCall::CreateBuffer(
            descriptor.label.to_string(),
            descriptor.kind,
        ));
        match self.fail_buffer_after {
            Some(0) => {
                return Err(ResourceError::BufferCreation {
                    label: descriptor.label.to_string(),
                    message: "injected failure".to_string(),
                })
            }
            Some(remaining) => self.fail_buffer_after = Some(remaining - 1),
            None => {}
        }
        self.next_handle += 1;
        let handle = BufferHandle(self.next_handle);
        self.buffers
            .insert(handle, (descriptor.kind, descriptor.contents.to_vec()));
        Ok(handle)
    }

    fn release_buffer(&mut self, handle: BufferHandle) {
        self.calls.push(BackendCall::ReleaseBuffer(handle));
        self.buffers.remove(&handle);
    }

    fn write_uniform(
        &mut self,
        _program: ProgramHandle,
        binding: UniformBinding,
        matrix: &Matrix4<f32>,
    ) {
        self.calls.push(BackendCall::WriteUniform(binding));
        self.uniforms.insert(binding, *matrix);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.calls.push(BackendCall::SetViewport(viewport));
        self.viewport = Some(viewport);
    }

    fn begin_frame(
        &mut self,
        _program: ProgramHandle,
        clear: ClearColor,
    ) -> Result<(), FrameError> {
        if self.fail_frame {
            return Err(FrameError::SurfaceUnavailable("injected failure".to_string()));
        }
        self.calls.push(BackendCall::BeginFrame(clear));
        self.frame_open = true;
        Ok(())
    }

    fn draw_indexed(&mut self, draw: &IndexedDraw) {
        self.calls.push(BackendCall::Draw(*draw));
    }

    fn end_frame(&mut self) -> Result<(), FrameError> {
        if !std::mem::take(&mut self.frame_open) {
            return Err(FrameError::NotStarted);
        }
        self.calls.push(BackendCall::EndFrame);
        Ok(())
    }
}
