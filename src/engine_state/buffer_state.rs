//! # Buffer State Module
//!
//! Registry of every GPU buffer the renderer owns, keyed by [`BufferHandle`].
//!
//! ## Key Features
//!
//! * Handle-based lookup for the backend's draw recording
//! * Per-buffer analytics (allocated bytes, bytes written, write count)
//! * Bounds-checked writes
//!
//! The registry is generic over the stored buffer so its bookkeeping can be
//! exercised without a device; the renderer uses `BufferState<wgpu::Buffer>`.

use std::collections::HashMap;

use crate::engine_state::rendering::{BufferHandle, BufferKind};

/// Analytics data for a GPU buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct BufferAnalytics {
    /// Total memory allocated for the buffer in bytes
    allocated_memory: u64,
    /// Highest byte written so far
    used_memory: u64,
    /// Number of times the buffer has been written to
    times_written: u64,
}

/// Totals across a set of buffers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferUsage {
    pub buffer_count: usize,
    pub allocated_memory: u64,
    pub used_memory: u64,
    pub times_written: u64,
}

impl BufferUsage {
    fn add(mut self, analytics: &BufferAnalytics) -> Self {
        self.buffer_count += 1;
        self.allocated_memory += analytics.allocated_memory;
        self.used_memory += analytics.used_memory;
        self.times_written += analytics.times_written;
        self
    }
}

struct BufferEntry<T> {
    label: String,
    kind: BufferKind,
    buffer: T,
    analytics: BufferAnalytics,
}

/// Central registry of GPU buffers.
pub struct BufferState<T = wgpu::Buffer> {
    buffers: HashMap<BufferHandle, BufferEntry<T>>,
    next_handle: u64,
}

impl<T> Default for BufferState<T> {
    fn default() -> Self {
        Self {
            buffers: HashMap::new(),
            next_handle: 0,
        }
    }
}

impl<T> BufferState<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a buffer created with its full contents.
    pub fn insert_initialized(
        &mut self,
        label: &str,
        kind: BufferKind,
        buffer: T,
        size: u64,
    ) -> BufferHandle {
        self.insert(
            label,
            kind,
            buffer,
            BufferAnalytics {
                allocated_memory: size,
                used_memory: size,
                times_written: 1,
            },
        )
    }

    /// Registers an allocated but unwritten buffer.
    pub fn insert_empty(
        &mut self,
        label: &str,
        kind: BufferKind,
        buffer: T,
        size: u64,
    ) -> BufferHandle {
        self.insert(
            label,
            kind,
            buffer,
            BufferAnalytics {
                allocated_memory: size,
                ..Default::default()
            },
        )
    }

    fn insert(
        &mut self,
        label: &str,
        kind: BufferKind,
        buffer: T,
        analytics: BufferAnalytics,
    ) -> BufferHandle {
        self.next_handle += 1;
        let handle = BufferHandle(self.next_handle);
        self.buffers.insert(
            handle,
            BufferEntry {
                label: label.to_string(),
                kind,
                buffer,
                analytics,
            },
        );
        log::debug!(
            "Registered {:?} buffer '{}' ({} bytes) as {:?}",
            kind,
            label,
            analytics.allocated_memory,
            handle
        );
        handle
    }

    pub fn get(&self, handle: BufferHandle) -> Option<&T> {
        self.buffers.get(&handle).map(|entry| &entry.buffer)
    }

    /// Unregisters a buffer, handing it back to the caller to drop.
    pub fn remove(&mut self, handle: BufferHandle) -> Option<T> {
        self.buffers.remove(&handle).map(|entry| entry.buffer)
    }

    /// Records a write of `len` bytes at `offset` and returns the buffer to write to.
    ///
    /// Returns `None`, recording nothing, for an unknown handle or an out-of-bounds write.
    pub fn record_write(&mut self, handle: BufferHandle, offset: u64, len: u64) -> Option<&T> {
        let entry = self.buffers.get_mut(&handle)?;
        let analytics = &mut entry.analytics;
        if offset + len > analytics.allocated_memory {
            log::error!(
                "Buffer write out of bounds for buffer '{}' ({} + {} > {})",
                entry.label,
                offset,
                len,
                analytics.allocated_memory
            );
            return None;
        }
        analytics.used_memory = analytics.used_memory.max(offset + len);
        analytics.times_written += 1;
        Some(&entry.buffer)
    }

    /// Totals across every registered buffer.
    pub fn usage(&self) -> BufferUsage {
        self.buffers
            .values()
            .fold(BufferUsage::default(), |acc, entry| acc.add(&entry.analytics))
    }

    /// Totals across the buffers of one kind.
    pub fn usage_of(&self, kind: BufferKind) -> BufferUsage {
        self.buffers
            .values()
            .filter(|entry| entry.kind == kind)
            .fold(BufferUsage::default(), |acc, entry| acc.add(&entry.analytics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialized_buffers_count_as_fully_written() {
        let mut state = BufferState::<()>::new();
        state.insert_initialized("positions", BufferKind::Vertex, (), 96);
        state.insert_initialized("indices", BufferKind::Index, (), 72);

        assert_eq!(
            state.usage(),
            BufferUsage {
                buffer_count: 2,
                allocated_memory: 168,
                used_memory: 168,
                times_written: 2,
            }
        );
        assert_eq!(state.usage_of(BufferKind::Index).allocated_memory, 72);
    }

    #[test]
    fn writes_update_analytics() {
        let mut state = BufferState::<()>::new();
        let uniforms = state.insert_empty("transforms", BufferKind::Uniform, (), 128);
        assert_eq!(state.usage().used_memory, 0);

        assert!(state.record_write(uniforms, 64, 64).is_some());
        assert!(state.record_write(uniforms, 0, 64).is_some());

        let usage = state.usage_of(BufferKind::Uniform);
        assert_eq!(usage.used_memory, 128);
        assert_eq!(usage.times_written, 2);
    }

    #[test]
    fn out_of_bounds_write_is_refused() {
        let mut state = BufferState::<()>::new();
        let uniforms = state.insert_empty("transforms", BufferKind::Uniform, (), 128);

        assert!(state.record_write(uniforms, 100, 64).is_none());
        assert!(state.record_write(BufferHandle(99), 0, 4).is_none());
        assert_eq!(state.usage().times_written, 0);
    }

    #[test]
    fn removed_buffers_leave_the_totals() {
        let mut state = BufferState::new();
        let first = state.insert_initialized("a", BufferKind::Vertex, 1u8, 12);
        let second = state.insert_initialized("b", BufferKind::Vertex, 2u8, 16);
        assert_ne!(first, second);

        assert_eq!(state.remove(first), Some(1));
        assert_eq!(state.remove(first), None);
        assert_eq!(state.get(second), Some(&2));
        assert_eq!(state.usage().buffer_count, 1);
        assert_eq!(state.usage().allocated_memory, 16);
    }
}
