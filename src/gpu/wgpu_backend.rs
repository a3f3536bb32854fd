//! [`GpuBackend`] over a windowed wgpu [`Context`].
//!
//! Buffer and pipeline calls go straight to the device. Draw calls are queued
//! and replayed inside a single render pass by [`WgpuBackend::render`], so one
//! frame is one clear plus one instanced draw per object.

use std::iter;

use wgpu::util::DeviceExt;

use crate::{
    camera::CameraUniform,
    context::Context,
    data_structures::texture::Texture,
    gpu::{
        BufferId, BufferTarget, DrawCall, DrawKind, GpuBackend, PipelineId, PrimitiveKind,
        VertexBinding, camera_group,
    },
    shader::ShaderProgram,
};

/// Smallest buffer created, so empty instance lists still get a bindable buffer.
const MIN_BUFFER_SIZE: usize = wgpu::COPY_BUFFER_ALIGNMENT as usize;

struct BoundPipeline {
    pipeline: wgpu::RenderPipeline,
    camera_group: Option<u32>,
}

pub struct WgpuBackend {
    pub ctx: Context,
    buffers: Vec<Option<wgpu::Buffer>>,
    pipelines: Vec<Option<BoundPipeline>>,
    queued: Vec<DrawCall>,
}

impl WgpuBackend {
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            buffers: Vec::new(),
            pipelines: Vec::new(),
            queued: Vec::new(),
        }
    }

    fn buffer(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        self.buffers.get(id.0 as usize).and_then(Option::as_ref)
    }

    fn pipeline(&self, id: PipelineId) -> Option<&BoundPipeline> {
        self.pipelines.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Clears the frame and replays the draws queued since the last call.
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let draws = std::mem::take(&mut self.queued);
        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Maze Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for call in &draws {
                let Some(bound) = self.pipeline(call.pipeline) else {
                    log::error!("draw with deleted pipeline {:?}", call.pipeline);
                    continue;
                };
                let vertex_buffers: Option<Vec<&wgpu::Buffer>> = call
                    .vertex_buffers
                    .iter()
                    .map(|&id| self.buffer(id))
                    .collect();
                let Some(vertex_buffers) = vertex_buffers else {
                    log::error!("draw with a deleted vertex buffer, skipping");
                    continue;
                };
                render_pass.set_pipeline(&bound.pipeline);
                if let Some(group) = bound.camera_group {
                    render_pass.set_bind_group(group, &self.ctx.camera_bind_group, &[]);
                }
                for (slot, buffer) in vertex_buffers.into_iter().enumerate() {
                    render_pass.set_vertex_buffer(slot as u32, buffer.slice(..));
                }
                match call.kind {
                    DrawKind::Indexed { index, index_count } => {
                        let Some(index) = self.buffer(index) else {
                            log::error!("draw with a deleted index buffer, skipping");
                            continue;
                        };
                        render_pass.set_index_buffer(index.slice(..), wgpu::IndexFormat::Uint16);
                        render_pass.draw_indexed(0..index_count, 0, 0..call.instance_count);
                    }
                    DrawKind::Arrays { vertex_count } => {
                        render_pass.draw(0..vertex_count, 0..call.instance_count);
                    }
                }
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl GpuBackend for WgpuBackend {
    fn create_buffer(&mut self, target: BufferTarget, label: &str, contents: &[u8]) -> BufferId {
        let usage = match target {
            BufferTarget::Vertex => wgpu::BufferUsages::VERTEX,
            BufferTarget::Index => wgpu::BufferUsages::INDEX,
        } | wgpu::BufferUsages::COPY_DST;
        let padded;
        let contents = if contents.len() < MIN_BUFFER_SIZE {
            padded = {
                let mut bytes = contents.to_vec();
                bytes.resize(MIN_BUFFER_SIZE, 0);
                bytes
            };
            &padded[..]
        } else {
            contents
        };
        let buffer = self
            .ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            });
        let id = BufferId(self.buffers.len() as u32);
        self.buffers.push(Some(buffer));
        id
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: u64, contents: &[u8]) {
        match self.buffer(buffer) {
            Some(target) => self.ctx.queue.write_buffer(target, offset, contents),
            None => log::error!("write to deleted buffer {:?}", buffer),
        }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(slot) = self.buffers.get_mut(buffer.0 as usize) {
            if let Some(buffer) = slot.take() {
                buffer.destroy();
            }
        }
    }

    fn create_pipeline(
        &mut self,
        shader: &ShaderProgram,
        bindings: &[VertexBinding],
        primitive: PrimitiveKind,
    ) -> PipelineId {
        let device = &self.ctx.device;
        let camera_group = camera_group(shader);
        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = camera_group
            .iter()
            .map(|_| &self.ctx.camera_bind_group_layout)
            .collect();
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&shader.label),
            source: wgpu::ShaderSource::Wgsl(shader.source.clone()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Maze Pipeline Layout"),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        let attributes: Vec<Vec<wgpu::VertexAttribute>> = bindings
            .iter()
            .map(|binding| {
                binding
                    .kind
                    .vertex_formats()
                    .into_iter()
                    .zip(binding.location..)
                    .map(|((format, offset), shader_location)| wgpu::VertexAttribute {
                        format,
                        offset,
                        shader_location,
                    })
                    .collect()
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout> = bindings
            .iter()
            .zip(&attributes)
            .map(|(binding, attributes)| wgpu::VertexBufferLayout {
                array_stride: binding.kind.byte_size() as wgpu::BufferAddress,
                step_mode: if binding.instanced {
                    wgpu::VertexStepMode::Instance
                } else {
                    wgpu::VertexStepMode::Vertex
                },
                attributes,
            })
            .collect();

        let topology: wgpu::PrimitiveTopology = primitive.into();
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&shader.label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.ctx.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                strip_index_format: if topology.is_strip() {
                    Some(wgpu::IndexFormat::Uint16)
                } else {
                    None
                },
                front_face: wgpu::FrontFace::Ccw,
                // Maze faces are single quads seen from both sides.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: Texture::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        let id = PipelineId(self.pipelines.len() as u32);
        self.pipelines.push(Some(BoundPipeline {
            pipeline,
            camera_group,
        }));
        id
    }

    fn delete_pipeline(&mut self, pipeline: PipelineId) {
        if let Some(slot) = self.pipelines.get_mut(pipeline.0 as usize) {
            *slot = None;
        }
    }

    fn write_camera(&mut self, uniform: &CameraUniform) {
        self.ctx
            .queue
            .write_buffer(&self.ctx.camera_buffer, 0, bytemuck::cast_slice(&[*uniform]));
    }

    fn draw(&mut self, call: DrawCall) {
        self.queued.push(call);
    }
}
