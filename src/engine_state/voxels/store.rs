//! # Voxel Store
//!
//! Append-only, insertion-ordered collection of uploaded voxels.
//!
//! The store owns the three backend buffers of every voxel. It is a cheap cloneable
//! handle: clones share the same voxels, so an input path can append while the frame
//! loop iterates.
//!
//! ## Visibility
//!
//! An append creates all buffers first and publishes the finished voxel with a single
//! push under the write lock. Iteration visits a snapshot taken under a short read
//! lock. A voxel is therefore either entirely visible to an iteration or not at all,
//! and appending from inside `for_each` cannot deadlock.

use std::sync::Arc;

use cgmath::Point3;

use crate::core::MtResource;
use crate::engine_state::{
    error::ResourceError,
    rendering::{BufferDescriptor, BufferHandle, BufferKind, RenderBackend},
};

use super::{color::Rgb, geometry::CubeGeometry};

/// Position of a voxel in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoxelId(pub usize);

/// The backend buffers of one voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoxelBuffers {
    pub positions: BufferHandle,
    pub colors: BufferHandle,
    pub indices: BufferHandle,
    pub index_count: u32,
}

impl VoxelBuffers {
    fn handles(&self) -> [BufferHandle; 3] {
        [self.positions, self.colors, self.indices]
    }
}

/// A placed, uploaded voxel. Immutable once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Voxel {
    pub id: VoxelId,
    pub origin: Point3<i32>,
    pub color: Rgb,
    pub buffers: VoxelBuffers,
}

/// Shared, append-only voxel collection.
#[derive(Clone, Default)]
pub struct VoxelStore {
    voxels: MtResource<Vec<Arc<Voxel>>>,
}

impl VoxelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the cube for `origin`/`color` and appends it.
    pub fn add<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        origin: Point3<i32>,
        color: Rgb,
    ) -> Result<VoxelId, ResourceError> {
        self.append(backend, &CubeGeometry::build(origin, color))
    }

    /// Uploads `geometry` into three backend buffers and appends the voxel.
    ///
    /// The stored origin and color are the ones the geometry was built from. On
    /// failure every buffer created for this voxel is released and the store is left
    /// exactly as it was.
    pub fn append<B: RenderBackend + ?Sized>(
        &self,
        backend: &mut B,
        geometry: &CubeGeometry,
    ) -> Result<VoxelId, ResourceError> {
        let buffers = upload(backend, geometry)?;
        let (origin, color) = (geometry.origin, geometry.color);

        let mut voxels = self.voxels.get_mut();
        let id = VoxelId(voxels.len());
        voxels.push(Arc::new(Voxel {
            id,
            origin,
            color,
            buffers,
        }));

        log::debug!(
            "Stored voxel {} at ({}, {}, {})",
            id.0,
            origin.x,
            origin.y,
            origin.z
        );
        Ok(id)
    }

    /// Visits every voxel in insertion order.
    ///
    /// Voxels appended while the visit is running are not part of it.
    pub fn for_each<F: FnMut(VoxelId, &VoxelBuffers)>(&self, mut visit: F) {
        for voxel in self.snapshot() {
            visit(voxel.id, &voxel.buffers);
        }
    }

    /// The voxels stored at this moment, in insertion order.
    pub fn snapshot(&self) -> Vec<Arc<Voxel>> {
        self.voxels.get().clone()
    }

    pub fn get(&self, id: VoxelId) -> Option<Arc<Voxel>> {
        self.voxels.get().get(id.0).cloned()
    }

    pub fn len(&self) -> usize {
        self.voxels.get().len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.get().is_empty()
    }

    /// Releases every voxel's buffers and empties the store. Used at teardown.
    pub fn release_all<B: RenderBackend + ?Sized>(&self, backend: &mut B) {
        let voxels = std::mem::take(&mut *self.voxels.get_mut());
        for voxel in &voxels {
            for handle in voxel.buffers.handles() {
                backend.release_buffer(handle);
            }
        }
        log::info!("Released {} voxels", voxels.len());
    }
}

fn upload<B: RenderBackend + ?Sized>(
    backend: &mut B,
    geometry: &CubeGeometry,
) -> Result<VoxelBuffers, ResourceError> {
    let descriptors = [
        BufferDescriptor {
            label: "voxel positions",
            kind: BufferKind::Vertex,
            contents: bytemuck::cast_slice(geometry.position_scalars()),
        },
        BufferDescriptor {
            label: "voxel colors",
            kind: BufferKind::Vertex,
            contents: bytemuck::cast_slice(geometry.color_scalars()),
        },
        BufferDescriptor {
            label: "voxel indices",
            kind: BufferKind::Index,
            contents: bytemuck::cast_slice(&geometry.indices),
        },
    ];

    let mut created = Vec::with_capacity(descriptors.len());
    for descriptor in &descriptors {
        match backend.create_buffer(descriptor) {
            Ok(handle) => created.push(handle),
            Err(err) => {
                for handle in created {
                    backend.release_buffer(handle);
                }
                log::error!("Voxel upload failed: {}", err);
                return Err(err);
            }
        }
    }

    Ok(VoxelBuffers {
        positions: created[0],
        colors: created[1],
        indices: created[2],
        index_count: geometry.index_count(),
    })
}
