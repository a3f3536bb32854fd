//! Object types: geometry + shader + attribute schema, and their live instances.
//!
//! Instances are kept in a sparse set. `slots` maps a stable [`InstanceId`] to a
//! dense index; `records` and the per-instance attribute storage are dense and
//! in the same order. Removing an instance swaps the last one into its place,
//! so the per-instance buffers stay contiguous and the live count is always the
//! element count. Freed slots are reused with a bumped generation, which makes
//! ids of removed instances fail lookups instead of aliasing a new instance.

use crate::{
    data_structures::{
        attribute::{AttributeBuffer, AttributeDesc},
        instance::{InstanceDesc, InstanceId, InstanceMut, InstanceRecord, InstanceState},
    },
    gpu::{BufferId, BufferTarget, GpuBackend, PipelineId, PrimitiveKind},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

/// Description of an object type handed to
/// [`ObjectRegistry::load_object`](crate::registry::ObjectRegistry::load_object).
pub struct ObjectDesc {
    pub label: String,
    pub primitive: PrimitiveKind,
    pub indices: Option<Vec<u16>>,
    pub attributes: Vec<AttributeDesc>,
    pub instances: Vec<InstanceDesc>,
}

impl ObjectDesc {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            primitive: PrimitiveKind::Triangles,
            indices: None,
            attributes: Vec::new(),
            instances: Vec::new(),
        }
    }

    pub fn with_primitive(mut self, primitive: PrimitiveKind) -> Self {
        self.primitive = primitive;
        self
    }

    pub fn with_indices(mut self, indices: Vec<u16>) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn with_attribute(mut self, attribute: AttributeDesc) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_instance(mut self, instance: InstanceDesc) -> Self {
        self.instances.push(instance);
        self
    }
}

#[derive(Clone, Copy, Debug)]
struct Slot {
    generation: u32,
    dense: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexBuffer {
    pub buffer: BufferId,
    pub count: u32,
}

pub struct ObjectType {
    pub(crate) id: ObjectId,
    pub(crate) label: String,
    pub(crate) primitive: PrimitiveKind,
    pub(crate) pipeline: PipelineId,
    pub(crate) index: Option<IndexBuffer>,
    pub(crate) attributes: Vec<AttributeBuffer>,
    pub(crate) records: Vec<InstanceRecord>,
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl ObjectType {
    pub(crate) fn new(
        id: ObjectId,
        label: String,
        primitive: PrimitiveKind,
        pipeline: PipelineId,
        index: Option<IndexBuffer>,
        attributes: Vec<AttributeBuffer>,
    ) -> Self {
        Self {
            id,
            label,
            primitive,
            pipeline,
            index,
            attributes,
            records: Vec::new(),
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn primitive(&self) -> PrimitiveKind {
        self.primitive
    }

    pub fn pipeline(&self) -> PipelineId {
        self.pipeline
    }

    pub fn index_buffer(&self) -> Option<IndexBuffer> {
        self.index
    }

    pub fn attributes(&self) -> &[AttributeBuffer] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeBuffer> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub(crate) fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    /// Number of live instances; this is the instance count of every draw.
    pub fn instance_count(&self) -> usize {
        self.records.len()
    }

    /// Live instance ids in dense (upload) order.
    pub fn instance_ids(&self) -> Vec<InstanceId> {
        self.records.iter().map(|record| record.id).collect()
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.dense_index(id).is_some()
    }

    /// Position of the instance in the packed per-instance buffers.
    pub fn dense_index(&self, id: InstanceId) -> Option<usize> {
        self.slots
            .get(id.slot as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.dense)
    }

    /// Vertex count of non-indexed draws: elements of the per-vertex `position`.
    pub fn vertex_count(&self) -> u32 {
        self.attributes
            .iter()
            .find(|a| !a.instanced && a.name == "position")
            .map_or(0, |a| a.element_count() as u32)
    }

    pub fn instance_mut(&mut self, id: InstanceId) -> Option<InstanceMut<'_>> {
        let index = self.dense_index(id)?;
        Some(InstanceMut {
            object: self.id,
            id,
            index,
            attributes: &mut self.attributes,
            state: &mut self.records[index].state,
        })
    }

    pub fn instance_state(&self, id: InstanceId) -> Option<&InstanceState> {
        self.dense_index(id).map(|index| &self.records[index].state)
    }

    /// The element of a per-instance attribute for one instance.
    pub fn instance_attribute(&self, id: InstanceId, name: &str) -> Option<&[f32]> {
        let index = self.dense_index(id)?;
        self.attributes
            .iter()
            .find(|a| a.instanced && a.name == name)
            .map(|a| a.element(index))
    }

    /// Appends an instance, writing its overrides or the schema defaults into
    /// every per-instance attribute. Overrides must already be validated.
    pub(crate) fn insert(&mut self, desc: InstanceDesc) -> InstanceId {
        let InstanceDesc {
            overrides,
            behavior,
            components,
            state,
        } = desc;
        for attribute in self.attributes.iter_mut().filter(|a| a.instanced) {
            let element = overrides
                .get(&attribute.name)
                .cloned()
                .unwrap_or_else(|| attribute.default.clone());
            attribute.push_element(&element);
        }
        let dense = self.records.len();
        let id = match self.free.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot as usize];
                entry.dense = Some(dense);
                InstanceId {
                    slot,
                    generation: entry.generation,
                }
            }
            None => {
                let slot = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    dense: Some(dense),
                });
                InstanceId {
                    slot,
                    generation: 0,
                }
            }
        };
        self.records.push(InstanceRecord {
            id,
            behavior,
            components,
            state,
        });
        id
    }

    /// Removes an instance and compacts the per-instance storage.
    pub(crate) fn remove(&mut self, id: InstanceId) -> Option<InstanceRecord> {
        let index = self.dense_index(id)?;
        for attribute in self.attributes.iter_mut().filter(|a| a.instanced) {
            attribute.swap_remove_element(index);
        }
        let record = self.records.swap_remove(index);
        if let Some(moved) = self.records.get(index) {
            self.slots[moved.id.slot as usize].dense = Some(index);
        }
        let slot = &mut self.slots[id.slot as usize];
        slot.dense = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.slot);
        Some(record)
    }

    /// Uploads one attribute, growing its GPU buffer when the data outgrew it.
    pub(crate) fn upload_attribute(&mut self, gpu: &mut dyn GpuBackend, attribute: usize) {
        let label = format!("{} {}", self.label, self.attributes[attribute].name);
        let buffer = &mut self.attributes[attribute];
        let bytes: &[u8] = bytemuck::cast_slice(&buffer.data);
        match buffer.gpu {
            Some(id) if bytes.len() as u64 <= buffer.gpu_capacity => {
                if !bytes.is_empty() {
                    gpu.write_buffer(id, 0, bytes);
                }
            }
            old => {
                if let Some(id) = old {
                    log::debug!(
                        "growing `{}` from {} to {} bytes",
                        label,
                        buffer.gpu_capacity,
                        bytes.len()
                    );
                    gpu.delete_buffer(id);
                }
                buffer.gpu = Some(gpu.create_buffer(BufferTarget::Vertex, &label, bytes));
                buffer.gpu_capacity = bytes.len() as u64;
            }
        }
        buffer.stale = false;
    }

    /// Uploads every attribute changed since its last upload.
    pub(crate) fn flush_stale(&mut self, gpu: &mut dyn GpuBackend) {
        for attribute in 0..self.attributes.len() {
            if self.attributes[attribute].stale {
                self.upload_attribute(gpu, attribute);
            }
        }
    }

    pub(crate) fn release(self, gpu: &mut dyn GpuBackend) {
        for buffer in self.attributes.iter().filter_map(|a| a.gpu) {
            gpu.delete_buffer(buffer);
        }
        if let Some(index) = self.index {
            gpu.delete_buffer(index.buffer);
        }
        gpu.delete_pipeline(self.pipeline);
    }
}
