//! # Voxels Module
//!
//! Voxel data: colors, cube geometry and the store of uploaded voxels.
//!
//! ## Key Components
//!
//! * `color` - Normalized colors, hexadecimal parsing and the color palette
//! * `geometry` - Vertex and index data for a unit cube
//! * `store` - Append-only collection owning each voxel's GPU buffers
//!
//! Placement is decided by the caller; the store accepts any integer origin,
//! including overlapping ones.

pub mod color;
pub mod geometry;
pub mod store;

pub use color::{hex_to_rgb, Palette, Rgb};
pub use geometry::CubeGeometry;
pub use store::{Voxel, VoxelBuffers, VoxelId, VoxelStore};
