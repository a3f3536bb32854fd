//! Vertex attribute schema and CPU-side attribute storage.
//!
//! Every attribute of an object type lives in its own GPU buffer. Per-vertex
//! attributes are uploaded once; per-instance attributes are packed densely,
//! one element per live instance, so the draw call can use the live instance
//! count directly.

use crate::gpu::BufferId;

/// The closed set of attribute layouts a shader can consume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Mat4,
    Vec2,
    Vec3,
    Scalar,
}

impl AttributeKind {
    /// Number of `f32` components in one element.
    pub const fn components(self) -> usize {
        match self {
            AttributeKind::Mat4 => 16,
            AttributeKind::Vec2 => 2,
            AttributeKind::Vec3 => 3,
            AttributeKind::Scalar => 1,
        }
    }

    pub const fn byte_size(self) -> usize {
        self.components() * std::mem::size_of::<f32>()
    }

    /// Shader locations occupied by one element. A mat4 is four vec4 columns.
    pub const fn locations(self) -> u32 {
        match self {
            AttributeKind::Mat4 => 4,
            _ => 1,
        }
    }

    /// Vertex formats for every location this kind occupies, with byte offsets.
    pub fn vertex_formats(self) -> Vec<(wgpu::VertexFormat, u64)> {
        match self {
            AttributeKind::Mat4 => (0..4)
                .map(|column| {
                    (
                        wgpu::VertexFormat::Float32x4,
                        column * std::mem::size_of::<[f32; 4]>() as u64,
                    )
                })
                .collect(),
            AttributeKind::Vec2 => vec![(wgpu::VertexFormat::Float32x2, 0)],
            AttributeKind::Vec3 => vec![(wgpu::VertexFormat::Float32x3, 0)],
            AttributeKind::Scalar => vec![(wgpu::VertexFormat::Float32, 0)],
        }
    }
}

/// Declaration of one attribute of an object type.
///
/// `data` is the per-vertex data for static attributes and the default element
/// for per-instance attributes.
#[derive(Clone, Debug)]
pub struct AttributeDesc {
    pub name: String,
    pub kind: AttributeKind,
    pub data: Vec<f32>,
    pub instanced: bool,
    pub dynamic: bool,
}

impl AttributeDesc {
    /// A static per-vertex attribute.
    pub fn per_vertex(name: &str, kind: AttributeKind, data: Vec<f32>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            data,
            instanced: false,
            dynamic: false,
        }
    }

    /// A per-instance attribute with a default element used when an instance
    /// doesn't override it.
    pub fn per_instance(name: &str, kind: AttributeKind, default: Vec<f32>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            data: default,
            instanced: true,
            dynamic: false,
        }
    }

    /// Marks the attribute for a full re-upload every frame.
    pub fn dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }
}

/// Storage for one attribute of a loaded object type.
#[derive(Debug)]
pub struct AttributeBuffer {
    pub(crate) name: String,
    pub(crate) kind: AttributeKind,
    pub(crate) location: u32,
    pub(crate) instanced: bool,
    pub(crate) dynamic: bool,
    /// Default element for new instances (per-instance attributes only).
    pub(crate) default: Vec<f32>,
    /// Per-vertex data, or one element per live instance in dense order.
    pub(crate) data: Vec<f32>,
    pub(crate) gpu: Option<BufferId>,
    pub(crate) gpu_capacity: u64,
    /// Set when the CPU data changed and the GPU copy no longer matches.
    pub(crate) stale: bool,
}

impl AttributeBuffer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    pub fn location(&self) -> u32 {
        self.location
    }

    pub fn is_instanced(&self) -> bool {
        self.instanced
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// The GPU buffer, once the attribute has been uploaded.
    pub fn buffer(&self) -> Option<BufferId> {
        self.gpu
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Number of whole elements stored.
    pub fn element_count(&self) -> usize {
        self.data.len() / self.kind.components()
    }

    /// A fresh, not yet uploaded attribute.
    pub(crate) fn new(desc: &AttributeDesc, location: u32) -> Self {
        let (default, data) = if desc.instanced {
            (desc.data.clone(), Vec::new())
        } else {
            (Vec::new(), desc.data.clone())
        };
        Self {
            name: desc.name.clone(),
            kind: desc.kind,
            location,
            instanced: desc.instanced,
            dynamic: desc.dynamic,
            default,
            data,
            gpu: None,
            gpu_capacity: 0,
            stale: true,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Byte range occupied by the element at `index`.
    pub fn element_range(&self, index: usize) -> std::ops::Range<usize> {
        let size = self.kind.byte_size();
        index * size..(index + 1) * size
    }

    pub(crate) fn element(&self, index: usize) -> &[f32] {
        let n = self.kind.components();
        &self.data[index * n..(index + 1) * n]
    }

    pub(crate) fn element_mut(&mut self, index: usize) -> &mut [f32] {
        let n = self.kind.components();
        &mut self.data[index * n..(index + 1) * n]
    }

    pub(crate) fn push_element(&mut self, element: &[f32]) {
        self.data.extend_from_slice(element);
        self.stale = true;
    }

    /// Moves the last element into `index` and drops the tail, keeping the
    /// storage contiguous.
    pub(crate) fn swap_remove_element(&mut self, index: usize) {
        let n = self.kind.components();
        let last = self.element_count() - 1;
        if index != last {
            self.data.copy_within(last * n..(last + 1) * n, index * n);
        }
        self.data.truncate(last * n);
        self.stale = true;
    }
}
