//! Rendering system for the voxel renderer.
//!
//! The renderer core talks to the GPU only through the [`RenderBackend`] trait: shader
//! programs, buffers, uniforms, the viewport and indexed draws. [`WgpuBackend`] is the
//! production implementation; tests drive the same core through a recording backend.
//!
//! # Frame protocol
//!
//! A frame is `begin_frame` (clears color and depth), any number of `draw_indexed`
//! calls, then `end_frame` (submit and present). Uniform writes and viewport changes
//! made between frames apply to the next frame.

use cgmath::Matrix4;

use super::error::{FrameError, InitializationError, ResourceError};

pub mod frame_loop;
pub mod pipeline_manager;
#[cfg(test)]
pub mod testing;
mod texture;
mod vertex;
pub mod wgpu_backend;

pub use frame_loop::{FrameClock, FrameLoop, FrameStats, SceneState};
pub use pipeline_manager::ShaderPipeline;
pub use wgpu_backend::WgpuBackend;

/// Opaque handle to a backend buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u64);

/// Opaque handle to a linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u64);

/// What a buffer is bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
    Uniform,
}

/// Describes a buffer to create and fill in one step.
#[derive(Debug, Clone, Copy)]
pub struct BufferDescriptor<'a> {
    pub label: &'a str,
    pub kind: BufferKind,
    pub contents: &'a [u8],
}

/// Describes the fixed voxel shader program.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDescriptor<'a> {
    pub label: &'a str,
    /// WGSL source containing `vs_main` and `fs_main`.
    pub source: &'a str,
}

/// The two transform uniforms of the voxel program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformBinding {
    Projection,
    ModelView,
}

impl UniformBinding {
    /// Byte offset of the matrix inside the transform uniform block.
    pub fn offset(self) -> u64 {
        match self {
            UniformBinding::Projection => 0,
            UniformBinding::ModelView => std::mem::size_of::<[[f32; 4]; 4]>() as u64,
        }
    }
}

/// A vertex buffer bound to a shader attribute location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBinding {
    pub location: u32,
    pub buffer: BufferHandle,
}

/// One indexed draw: position and color attributes plus a 16-bit index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedDraw {
    pub attributes: [VertexBinding; 2],
    pub indices: BufferHandle,
    pub index_count: u32,
}

/// Viewport rectangle in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// The full-surface viewport `(0, 0, width, height)`.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Color the frame is cleared to. Depth is always cleared to the far plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl ClearColor {
    pub const BLACK: ClearColor = ClearColor {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
}

impl From<[f64; 4]> for ClearColor {
    fn from([r, g, b, a]: [f64; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// The GPU capability the renderer core is written against.
pub trait RenderBackend {
    /// Compiles and links a shader program.
    fn create_program(
        &mut self,
        descriptor: &ProgramDescriptor<'_>,
    ) -> Result<ProgramHandle, InitializationError>;

    /// Creates a buffer initialized with `descriptor.contents`.
    fn create_buffer(
        &mut self,
        descriptor: &BufferDescriptor<'_>,
    ) -> Result<BufferHandle, ResourceError>;

    /// Releases a buffer. Unknown handles are ignored.
    fn release_buffer(&mut self, handle: BufferHandle);

    /// Uploads a matrix to one of the program's transform uniforms.
    fn write_uniform(
        &mut self,
        program: ProgramHandle,
        binding: UniformBinding,
        matrix: &Matrix4<f32>,
    );

    /// Sets the viewport rectangle used by subsequent frames.
    fn set_viewport(&mut self, viewport: Viewport);

    /// Starts a frame drawn with `program`, clearing color and depth.
    fn begin_frame(&mut self, program: ProgramHandle, clear: ClearColor)
        -> Result<(), FrameError>;

    /// Records one indexed triangle-list draw in the current frame.
    fn draw_indexed(&mut self, draw: &IndexedDraw);

    /// Submits and presents the current frame.
    fn end_frame(&mut self) -> Result<(), FrameError>;
}
