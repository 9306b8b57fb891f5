//! WGPU implementation of [`RenderBackend`].
//!
//! A program is a render pipeline plus a 128-byte uniform buffer holding the projection
//! and model-view matrices (see `TransformUniform`). Draws recorded between
//! `begin_frame` and `end_frame` are replayed into a single render pass that clears
//! color and depth, then the frame is submitted and presented.
//!
//! Shader and buffer creation run inside device error scopes, so invalid WGSL or a
//! failed allocation comes back as an error value instead of reaching the device's
//! uncaptured-error handler.

use std::collections::HashMap;

use cgmath::Matrix4;
use wgpu::util::DeviceExt;

use super::{
    pipeline_manager::{FRAGMENT_ENTRY_POINT, VERTEX_ENTRY_POINT},
    texture::DepthTexture,
    vertex, BufferDescriptor, BufferHandle, BufferKind, ClearColor, IndexedDraw,
    ProgramDescriptor, ProgramHandle, RenderBackend, UniformBinding, Viewport,
};
use crate::engine_state::{
    buffer_state::{BufferState, BufferUsage},
    camera_state::TransformUniform,
    error::{FrameError, InitializationError, ResourceError},
};

struct Program {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    transforms: BufferHandle,
}

struct PendingFrame {
    program: ProgramHandle,
    clear: ClearColor,
    surface_texture: wgpu::SurfaceTexture,
    draws: Vec<IndexedDraw>,
}

pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,
    depth_texture: DepthTexture,
    buffers: BufferState,
    programs: HashMap<ProgramHandle, Program>,
    next_program: u64,
    viewport: Viewport,
    frame: Option<PendingFrame>,
}

impl WgpuBackend {
    /// Takes ownership of a configured surface and its device.
    pub fn new(
        surface: wgpu::Surface<'static>,
        surface_config: wgpu::SurfaceConfiguration,
        device: wgpu::Device,
        queue: wgpu::Queue,
    ) -> Self {
        let depth_texture = DepthTexture::create(&device, &surface_config, "Voxel Depth Texture");
        let viewport = Viewport::full(surface_config.width, surface_config.height);
        Self {
            surface,
            surface_config,
            device,
            queue,
            depth_texture,
            buffers: BufferState::new(),
            programs: HashMap::new(),
            next_program: 0,
            viewport,
            frame: None,
        }
    }

    /// Reconfigures the surface and depth texture. Zero sizes are ignored.
    pub fn resize_surface(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_texture =
            DepthTexture::create(&self.device, &self.surface_config, "Voxel Depth Texture");
        true
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    pub fn buffer_usage(&self) -> BufferUsage {
        self.buffers.usage()
    }

    pub fn buffer_usage_of(&self, kind: BufferKind) -> BufferUsage {
        self.buffers.usage_of(kind)
    }

    /// The viewport clipped to the current surface, which WGPU requires.
    fn surface_viewport(&self) -> Viewport {
        let (surface_width, surface_height) = self.surface_size();
        let x = self.viewport.x.min(surface_width);
        let y = self.viewport.y.min(surface_height);
        Viewport {
            x,
            y,
            width: self.viewport.width.min(surface_width - x),
            height: self.viewport.height.min(surface_height - y),
        }
    }

    fn build_program(&mut self, descriptor: &ProgramDescriptor<'_>) -> Program {
        let shader = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(descriptor.label),
                source: wgpu::ShaderSource::Wgsl(descriptor.source.into()),
            });

        let uniform_size = std::mem::size_of::<TransformUniform>() as u64;
        let uniform_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Transform Uniform Buffer"),
            size: uniform_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("Transform Bind Group Layout"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    }],
                });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Transform Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Voxel Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(descriptor.label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some(VERTEX_ENTRY_POINT),
                    compilation_options: Default::default(),
                    buffers: &vertex::layouts(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(FRAGMENT_ENTRY_POINT),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.surface_config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(DepthTexture::depth_stencil_state()),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            });

        // both matrices are written by the frame loop before the first frame
        let transforms = self.buffers.insert_empty(
            "Transform Uniform Buffer",
            BufferKind::Uniform,
            uniform_buffer,
            uniform_size,
        );

        Program {
            pipeline,
            bind_group,
            transforms,
        }
    }
}

impl RenderBackend for WgpuBackend {
    fn create_program(
        &mut self,
        descriptor: &ProgramDescriptor<'_>,
    ) -> Result<ProgramHandle, InitializationError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let program = self.build_program(descriptor);
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            self.buffers.remove(program.transforms);
            return Err(InitializationError::ShaderCompilation {
                label: descriptor.label.to_string(),
                message: error.to_string(),
            });
        }

        self.next_program += 1;
        let handle = ProgramHandle(self.next_program);
        self.programs.insert(handle, program);
        Ok(handle)
    }

    fn create_buffer(
        &mut self,
        descriptor: &BufferDescriptor<'_>,
    ) -> Result<BufferHandle, ResourceError> {
        if descriptor.contents.is_empty() {
            return Err(ResourceError::EmptyBuffer {
                label: descriptor.label.to_string(),
            });
        }

        let usage = match descriptor.kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
            BufferKind::Uniform => wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        };

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(descriptor.label),
                contents: descriptor.contents,
                usage,
            });
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        let validation = pollster::block_on(self.device.pop_error_scope());

        if let Some(error) = out_of_memory.or(validation) {
            return Err(ResourceError::BufferCreation {
                label: descriptor.label.to_string(),
                message: error.to_string(),
            });
        }

        Ok(self.buffers.insert_initialized(
            descriptor.label,
            descriptor.kind,
            buffer,
            descriptor.contents.len() as u64,
        ))
    }

    fn release_buffer(&mut self, handle: BufferHandle) {
        self.buffers.remove(handle);
    }

    fn write_uniform(
        &mut self,
        program: ProgramHandle,
        binding: UniformBinding,
        matrix: &Matrix4<f32>,
    ) {
        let Some(transforms) = self.programs.get(&program).map(|program| program.transforms)
        else {
            log::warn!("Uniform write for unknown program {:?}", program);
            return;
        };

        let matrix: [[f32; 4]; 4] = (*matrix).into();
        let bytes: &[u8] = bytemuck::cast_slice(&matrix);
        if let Some(buffer) =
            self.buffers
                .record_write(transforms, binding.offset(), bytes.len() as u64)
        {
            self.queue.write_buffer(buffer, binding.offset(), bytes);
        }
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn begin_frame(
        &mut self,
        program: ProgramHandle,
        clear: ClearColor,
    ) -> Result<(), FrameError> {
        if !self.programs.contains_key(&program) {
            return Err(FrameError::UnknownProgram(program.0));
        }

        let surface_texture = match self.surface.get_current_texture() {
            Ok(surface_texture) => surface_texture,
            Err(error @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                self.surface.configure(&self.device, &self.surface_config);
                return Err(FrameError::SurfaceUnavailable(error.to_string()));
            }
            Err(error) => return Err(FrameError::SurfaceUnavailable(error.to_string())),
        };

        self.frame = Some(PendingFrame {
            program,
            clear,
            surface_texture,
            draws: Vec::new(),
        });
        Ok(())
    }

    fn draw_indexed(&mut self, draw: &IndexedDraw) {
        match &mut self.frame {
            Some(frame) => frame.draws.push(*draw),
            None => log::warn!("Draw recorded outside a frame"),
        }
    }

    fn end_frame(&mut self) -> Result<(), FrameError> {
        let Some(frame) = self.frame.take() else {
            return Err(FrameError::NotStarted);
        };
        let Some(program) = self.programs.get(&frame.program) else {
            return Err(FrameError::UnknownProgram(frame.program.0));
        };

        let viewport = self.surface_viewport();
        let view = frame
            .surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Voxel Frame Encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Voxel Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: frame.clear.r,
                            g: frame.clear.g,
                            b: frame.clear.b,
                            a: frame.clear.a,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(DepthTexture::depth_ops()),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            rpass.set_viewport(
                viewport.x as f32,
                viewport.y as f32,
                viewport.width as f32,
                viewport.height as f32,
                0.0,
                1.0,
            );
            rpass.set_pipeline(&program.pipeline);
            rpass.set_bind_group(0, &program.bind_group, &[]);

            'draws: for draw in &frame.draws {
                for binding in &draw.attributes {
                    let slot = vertex::slot_for_location(binding.location);
                    match (slot, self.buffers.get(binding.buffer)) {
                        (Some(slot), Some(buffer)) => rpass.set_vertex_buffer(slot, buffer.slice(..)),
                        _ => {
                            log::warn!("Skipping draw with unbound attribute {:?}", binding);
                            continue 'draws;
                        }
                    }
                }
                let Some(indices) = self.buffers.get(draw.indices) else {
                    log::warn!("Skipping draw with released index buffer {:?}", draw.indices);
                    continue;
                };
                rpass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint16);
                rpass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.surface_texture.present();
        Ok(())
    }
}
