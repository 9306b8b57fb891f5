//! Depth attachment for the voxel pass.

/// A depth texture sized to the surface.
pub struct DepthTexture {
    #[allow(dead_code)]
    pub texture: wgpu::Texture,
    /// View bound as the pass's depth attachment.
    pub view: wgpu::TextureView,
}

impl DepthTexture {
    /// The texture format used for depth buffers.
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Depth every frame starts from: the far plane.
    pub const CLEAR_DEPTH: f32 = 1.0;

    /// Creates a depth texture matching the surface configuration.
    pub fn create(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }

    /// Depth state of the voxel pipeline: nearer-or-equal fragments win.
    pub fn depth_stencil_state() -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format: Self::FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }

    /// Per-frame depth attachment operations: clear to `CLEAR_DEPTH`, keep the result.
    pub fn depth_ops() -> wgpu::Operations<f32> {
        wgpu::Operations {
            load: wgpu::LoadOp::Clear(Self::CLEAR_DEPTH),
            store: wgpu::StoreOp::Store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearer_or_equal_fragments_pass() {
        let state = DepthTexture::depth_stencil_state();
        assert_eq!(state.format, wgpu::TextureFormat::Depth32Float);
        assert_eq!(state.depth_compare, wgpu::CompareFunction::LessEqual);
        assert!(state.depth_write_enabled);
        assert_eq!(state.stencil, wgpu::StencilState::default());
    }

    #[test]
    fn every_frame_clears_depth_to_the_far_plane() {
        let ops = DepthTexture::depth_ops();
        assert!(matches!(ops.load, wgpu::LoadOp::Clear(depth) if depth == 1.0));
        assert_eq!(ops.store, wgpu::StoreOp::Store);
    }
}
