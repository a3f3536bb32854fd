//! GPU buffer API used by the object registry and the render loop.
//!
//! The registry never talks to wgpu directly. It creates, uploads and deletes
//! buffers and records draw calls through [`GpuBackend`]. The windowed build
//! uses [`wgpu_backend::WgpuBackend`]; simulations and tests use
//! [`RecordingGpu`], which keeps every operation in memory.

pub mod wgpu_backend;

use crate::{
    camera::CameraUniform,
    data_structures::attribute::AttributeKind,
    shader::{CAMERA_UNIFORM, ShaderProgram},
};

/// Bind group the camera uniform goes to for pipelines built from `shader`.
///
/// `None` when the program doesn't read the camera. The windowed context only
/// provides the camera in group 0; any other group is reported and not bound.
pub fn camera_group(shader: &ShaderProgram) -> Option<u32> {
    match shader.uniform(CAMERA_UNIFORM) {
        Some(0) => Some(0),
        Some(group) => {
            log::error!(
                "shader `{}` wants the camera in bind group {}, only group 0 is supported",
                shader.label,
                group
            );
            None
        }
        None => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PipelineId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferTarget {
    Vertex,
    Index,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PrimitiveKind {
    #[default]
    Triangles,
    TriangleStrip,
    Lines,
    LineStrip,
    Points,
}

impl From<PrimitiveKind> for wgpu::PrimitiveTopology {
    fn from(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Triangles => wgpu::PrimitiveTopology::TriangleList,
            PrimitiveKind::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
            PrimitiveKind::Lines => wgpu::PrimitiveTopology::LineList,
            PrimitiveKind::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            PrimitiveKind::Points => wgpu::PrimitiveTopology::PointList,
        }
    }
}

/// Layout of one vertex buffer slot of a pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexBinding {
    pub location: u32,
    pub kind: AttributeKind,
    pub instanced: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawKind {
    /// `draw_indexed` over `index_count` u16 indices.
    Indexed { index: BufferId, index_count: u32 },
    /// `draw` over `vertex_count` vertices.
    Arrays { vertex_count: u32 },
}

/// One instanced draw call. Vertex buffers are bound in slot order.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    pub pipeline: PipelineId,
    pub vertex_buffers: Vec<BufferId>,
    pub kind: DrawKind,
    pub instance_count: u32,
}

pub trait GpuBackend {
    fn create_buffer(&mut self, target: BufferTarget, label: &str, contents: &[u8]) -> BufferId;

    /// Overwrites `contents.len()` bytes at `offset`. The buffer must be large enough.
    fn write_buffer(&mut self, buffer: BufferId, offset: u64, contents: &[u8]);

    fn delete_buffer(&mut self, buffer: BufferId);

    fn create_pipeline(
        &mut self,
        shader: &ShaderProgram,
        bindings: &[VertexBinding],
        primitive: PrimitiveKind,
    ) -> PipelineId;

    fn delete_pipeline(&mut self, pipeline: PipelineId);

    fn write_camera(&mut self, uniform: &CameraUniform);

    fn draw(&mut self, call: DrawCall);
}

/// An operation recorded by [`RecordingGpu`].
#[derive(Clone, Debug, PartialEq)]
pub enum GpuOp {
    Create {
        buffer: BufferId,
        target: BufferTarget,
        size: u64,
    },
    Write {
        buffer: BufferId,
        offset: u64,
        size: u64,
    },
    Delete(BufferId),
    CreatePipeline(PipelineId),
    DeletePipeline(PipelineId),
    Camera,
    Draw(DrawCall),
}

/// Headless backend that keeps buffer contents in memory and logs every call.
#[derive(Debug, Default)]
pub struct RecordingGpu {
    buffers: Vec<Option<Vec<u8>>>,
    pipelines: Vec<Option<(Vec<VertexBinding>, Option<u32>)>>,
    pub ops: Vec<GpuOp>,
    pub camera: Option<CameraUniform>,
}

impl RecordingGpu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers
            .get(buffer.0 as usize)
            .and_then(|contents| contents.as_deref())
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.iter().filter(|b| b.is_some()).count()
    }

    pub fn live_pipelines(&self) -> usize {
        self.pipelines.iter().filter(|p| p.is_some()).count()
    }

    /// The bind group a live pipeline reads the camera from.
    pub fn camera_group(&self, pipeline: PipelineId) -> Option<u32> {
        self.pipelines
            .get(pipeline.0 as usize)
            .and_then(Option::as_ref)
            .and_then(|(_, group)| *group)
    }

    pub fn draws(&self) -> impl Iterator<Item = &DrawCall> {
        self.ops.iter().filter_map(|op| match op {
            GpuOp::Draw(call) => Some(call),
            _ => None,
        })
    }

    pub fn writes_to(&self, buffer: BufferId) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, GpuOp::Write { buffer: b, .. } if *b == buffer))
            .count()
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }
}

impl GpuBackend for RecordingGpu {
    fn create_buffer(&mut self, target: BufferTarget, _label: &str, contents: &[u8]) -> BufferId {
        let id = BufferId(self.buffers.len() as u32);
        self.buffers.push(Some(contents.to_vec()));
        self.ops.push(GpuOp::Create {
            buffer: id,
            target,
            size: contents.len() as u64,
        });
        id
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: u64, contents: &[u8]) {
        match self.buffers.get_mut(buffer.0 as usize) {
            Some(Some(data)) => {
                let start = offset as usize;
                let end = start + contents.len();
                if end > data.len() {
                    log::error!(
                        "write of {} bytes at {} overflows buffer {:?} of {} bytes",
                        contents.len(),
                        offset,
                        buffer,
                        data.len()
                    );
                    return;
                }
                data[start..end].copy_from_slice(contents);
            }
            _ => {
                log::error!("write to deleted buffer {:?}", buffer);
                return;
            }
        }
        self.ops.push(GpuOp::Write {
            buffer,
            offset,
            size: contents.len() as u64,
        });
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(slot) = self.buffers.get_mut(buffer.0 as usize) {
            *slot = None;
        }
        self.ops.push(GpuOp::Delete(buffer));
    }

    fn create_pipeline(
        &mut self,
        shader: &ShaderProgram,
        bindings: &[VertexBinding],
        _primitive: PrimitiveKind,
    ) -> PipelineId {
        let id = PipelineId(self.pipelines.len() as u32);
        self.pipelines
            .push(Some((bindings.to_vec(), camera_group(shader))));
        self.ops.push(GpuOp::CreatePipeline(id));
        id
    }

    fn delete_pipeline(&mut self, pipeline: PipelineId) {
        if let Some(slot) = self.pipelines.get_mut(pipeline.0 as usize) {
            *slot = None;
        }
        self.ops.push(GpuOp::DeletePipeline(pipeline));
    }

    fn write_camera(&mut self, uniform: &CameraUniform) {
        self.camera = Some(*uniform);
        self.ops.push(GpuOp::Camera);
    }

    fn draw(&mut self, call: DrawCall) {
        self.ops.push(GpuOp::Draw(call));
    }
}
