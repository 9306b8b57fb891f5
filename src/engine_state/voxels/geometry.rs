//! # Cube Geometry
//!
//! Builds the vertex and index data for a single unit voxel.
//!
//! ## Layout
//!
//! Corners 0-3 form the front quad (at `z + 1`), corners 4-7 the back quad (at `z`):
//!
//! ```text
//!      7-------6
//!     /|      /|
//!    3-------2 |        y
//!    | 4-----|-5        |
//!    |/      |/         +-- x
//!    0-------1         /
//!                     z
//! ```
//!
//! Every triangle is wound counter-clockwise when seen from outside the cube.

use cgmath::Point3;

use super::color::Rgb;

/// Number of cube corners.
pub const CUBE_VERTEX_COUNT: usize = 8;

/// Number of indices in the cube triangulation (6 faces, 2 triangles each).
pub const CUBE_INDEX_COUNT: usize = 36;

/// Largest coordinate magnitude whose cube corners are exact in `f32`.
pub const MAX_EXACT_COORDINATE: i32 = (1 << 24) - 1;

/// Fixed triangulation shared by every cube.
#[rustfmt::skip]
pub const CUBE_INDICES: [u16; CUBE_INDEX_COUNT] = [
    0, 1, 2,    0, 2, 3,    // front  (+z)
    4, 7, 6,    4, 6, 5,    // back   (-z)
    4, 0, 3,    4, 3, 7,    // left   (-x)
    1, 5, 6,    1, 6, 2,    // right  (+x)
    3, 2, 6,    3, 6, 7,    // top    (+y)
    0, 4, 5,    0, 5, 1,    // bottom (-y)
];

/// CPU-side geometry for one voxel, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeGeometry {
    /// Minimum corner the positions are offset from.
    pub origin: Point3<i32>,
    /// Color every vertex carries.
    pub color: Rgb,
    pub positions: [[f32; 3]; CUBE_VERTEX_COUNT],
    pub colors: [[f32; 4]; CUBE_VERTEX_COUNT],
    pub indices: [u16; CUBE_INDEX_COUNT],
}

impl CubeGeometry {
    /// Builds the cube whose minimum corner sits at `origin`.
    ///
    /// Corners are `f32`, so coordinates beyond `MAX_EXACT_COORDINATE` in magnitude
    /// round and can collapse the cube to zero width.
    pub fn build(origin: Point3<i32>, color: Rgb) -> Self {
        debug_assert!(
            [origin.x, origin.y, origin.z]
                .iter()
                .all(|c| c.unsigned_abs() <= MAX_EXACT_COORDINATE as u32),
            "voxel origin {:?} is beyond f32 precision",
            origin
        );
        let x = origin.x as f32;
        let y = origin.y as f32;
        let z = origin.z as f32;

        let positions = [
            // front
            [x, y, z + 1.0],
            [x + 1.0, y, z + 1.0],
            [x + 1.0, y + 1.0, z + 1.0],
            [x, y + 1.0, z + 1.0],
            // back
            [x, y, z],
            [x + 1.0, y, z],
            [x + 1.0, y + 1.0, z],
            [x, y + 1.0, z],
        ];

        Self {
            origin,
            color,
            positions,
            colors: [color.to_rgba(); CUBE_VERTEX_COUNT],
            indices: CUBE_INDICES,
        }
    }

    /// Positions flattened to 24 scalars.
    pub fn position_scalars(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Colors flattened to 32 scalars.
    pub fn color_scalars(&self) -> &[f32] {
        bytemuck::cast_slice(&self.colors)
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}
