//! Vertex buffer layouts of the voxel program.
//!
//! Positions and colors live in separate, tightly packed buffers, so each attribute
//! gets its own buffer slot:
//!
//! | slot | location | format      | stride |
//! |------|----------|-------------|--------|
//! | 0    | 0        | `Float32x3` | 12     |
//! | 1    | 1        | `Float32x4` | 16     |

use super::pipeline_manager::{COLOR_LOCATION, POSITION_LOCATION};

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![POSITION_LOCATION => Float32x3];

const COLOR_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![COLOR_LOCATION => Float32x4];

/// Layouts in slot order, as passed to the render pipeline.
pub fn layouts() -> [wgpu::VertexBufferLayout<'static>; 2] {
    [
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &POSITION_ATTRIBUTES,
        },
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &COLOR_ATTRIBUTES,
        },
    ]
}

/// The buffer slot feeding a shader attribute location.
pub fn slot_for_location(location: u32) -> Option<u32> {
    layouts()
        .iter()
        .position(|layout| {
            layout
                .attributes
                .iter()
                .any(|attribute| attribute.shader_location == location)
        })
        .map(|slot| slot as u32)
}
