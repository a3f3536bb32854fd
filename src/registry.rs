//! Object registry: binds object types to GPU resources and tracks their instances.
//!
//! Loading an object validates its attribute schema against the shader, packs
//! every per-instance attribute into one contiguous buffer, runs the instances'
//! `init` hooks and registers their updates with the [`Scheduler`]. Objects are
//! drawn in the order they were loaded.

use crate::{
    data_structures::{
        attribute::{AttributeBuffer, AttributeDesc, AttributeKind},
        instance::{InstanceDesc, InstanceId},
        object::{IndexBuffer, ObjectDesc, ObjectId, ObjectType},
    },
    error::EngineError,
    gpu::{BufferTarget, GpuBackend, VertexBinding},
    scheduler::{FrameContext, Scheduler, UpdateTask},
    shader::ShaderProgram,
};

#[derive(Default)]
pub struct ObjectRegistry {
    objects: Vec<ObjectType>,
    next_id: u32,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates GPU resources for `desc`, makes it render-registered and
    /// schedules the updates of all its instances.
    ///
    /// Every attribute must have a location of the same kind in `shader`; a
    /// missing binding is rejected here rather than drawing with garbage.
    pub fn load_object(
        &mut self,
        gpu: &mut dyn GpuBackend,
        scheduler: &mut Scheduler,
        shader: &ShaderProgram,
        desc: ObjectDesc,
    ) -> Result<ObjectId, EngineError> {
        let ObjectDesc {
            label,
            primitive,
            indices,
            attributes,
            instances,
        } = desc;
        if instances.is_empty() {
            return Err(EngineError::EmptyInstanceList { object: label });
        }
        let locations = validate_schema(&label, &attributes, shader)?;
        if indices.is_none()
            && !attributes
                .iter()
                .any(|a| !a.instanced && a.name == "position")
        {
            return Err(EngineError::MissingVertexSource { object: label });
        }
        for instance in &instances {
            validate_overrides(&label, instance, |name| {
                attributes
                    .iter()
                    .find(|a| a.name == name)
                    .map(|a| (a.kind, a.instanced))
            })?;
        }

        let bindings: Vec<VertexBinding> = attributes
            .iter()
            .zip(&locations)
            .map(|(attribute, &location)| VertexBinding {
                location,
                kind: attribute.kind,
                instanced: attribute.instanced,
            })
            .collect();
        let pipeline = gpu.create_pipeline(shader, &bindings, primitive);
        let index = indices.map(|indices| IndexBuffer {
            buffer: gpu.create_buffer(
                BufferTarget::Index,
                &format!("{} Index Buffer", label),
                bytemuck::cast_slice(&indices),
            ),
            count: indices.len() as u32,
        });
        let buffers = attributes
            .iter()
            .zip(&locations)
            .map(|(attribute, &location)| AttributeBuffer::new(attribute, location))
            .collect();

        let id = ObjectId(self.next_id);
        self.next_id += 1;
        let mut object = ObjectType::new(id, label, primitive, pipeline, index, buffers);
        let ids: Vec<InstanceId> = instances
            .into_iter()
            .map(|instance| object.insert(instance))
            .collect();
        for attribute in 0..object.attributes.len() {
            object.upload_attribute(gpu, attribute);
        }
        for &instance in &ids {
            init_instance(&mut object, instance);
            register_instance(scheduler, &object, instance);
        }
        for (attribute, buffer) in object.attributes.iter().enumerate() {
            if buffer.dynamic {
                scheduler.add_update(UpdateTask::SyncBuffer {
                    object: id,
                    attribute,
                });
            }
        }
        log::info!(
            "loaded object `{}` ({:?}) with {} instances",
            object.label,
            id,
            object.instance_count()
        );
        self.objects.push(object);
        Ok(id)
    }

    /// Unregisters all updates of the object, releases its GPU resources and
    /// removes it from the render set.
    pub fn delete_object(
        &mut self,
        gpu: &mut dyn GpuBackend,
        scheduler: &mut Scheduler,
        id: ObjectId,
    ) -> Result<(), EngineError> {
        let position = self
            .objects
            .iter()
            .position(|object| object.id == id)
            .ok_or(EngineError::UnknownObject(id.0))?;
        let object = self.objects.remove(position);
        let unscheduled = scheduler.pop_object(id);
        log::info!(
            "deleted object `{}` ({:?}), {} updates unregistered",
            object.label,
            id,
            unscheduled
        );
        object.release(gpu);
        Ok(())
    }

    /// Spawns an instance into a loaded object. Its data reaches the GPU with
    /// the next upload of each attribute.
    pub fn add_instance(
        &mut self,
        scheduler: &mut Scheduler,
        object: ObjectId,
        desc: InstanceDesc,
    ) -> Result<InstanceId, EngineError> {
        let target = self
            .get_mut(object)
            .ok_or(EngineError::UnknownObject(object.0))?;
        validate_overrides(&target.label, &desc, |name| {
            target
                .attribute(name)
                .map(|a| (a.kind, a.instanced))
        })?;
        let id = target.insert(desc);
        init_instance(target, id);
        register_instance(scheduler, target, id);
        log::debug!("added {:?} to `{}`", id, target.label);
        Ok(id)
    }

    /// Removes an instance and its scheduled updates. The per-instance storage
    /// is compacted, so other instances keep valid data.
    pub fn remove_instance(
        &mut self,
        scheduler: &mut Scheduler,
        object: ObjectId,
        instance: InstanceId,
    ) -> Result<(), EngineError> {
        let target = self
            .get_mut(object)
            .ok_or(EngineError::UnknownObject(object.0))?;
        if !target.contains(instance) {
            return Err(EngineError::UnknownInstance);
        }
        scheduler.pop_instance(object, instance);
        target.remove(instance);
        log::debug!("removed {:?} from `{}`", instance, target.label);
        Ok(())
    }

    pub fn get(&self, id: ObjectId) -> Option<&ObjectType> {
        self.objects.iter().find(|object| object.id == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut ObjectType> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    /// Loaded objects in draw order.
    pub fn objects(&self) -> impl Iterator<Item = &ObjectType> {
        self.objects.iter()
    }

    pub(crate) fn objects_mut(&mut self) -> impl Iterator<Item = &mut ObjectType> {
        self.objects.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Runs one scheduled task. Returns `false` when its target no longer exists.
    pub(crate) fn run_task(
        &mut self,
        task: &UpdateTask,
        gpu: &mut dyn GpuBackend,
        frame: &mut FrameContext<'_>,
    ) -> bool {
        let Some(object) = self.get_mut(task.object()) else {
            return false;
        };
        match *task {
            UpdateTask::Instance { instance, .. } => {
                let Some(index) = object.dense_index(instance) else {
                    return false;
                };
                let Some(mut behavior) = object.records[index].behavior.take() else {
                    return false;
                };
                if let Some(mut view) = object.instance_mut(instance) {
                    behavior.update(frame, &mut view);
                }
                object.records[index].behavior = Some(behavior);
                true
            }
            UpdateTask::Component {
                instance,
                component,
                ..
            } => {
                let Some(index) = object.dense_index(instance) else {
                    return false;
                };
                let Some(component) = object.records[index].components.get(component).cloned()
                else {
                    return false;
                };
                match object.instance_mut(instance) {
                    Some(mut view) => {
                        component.update(frame, &mut view);
                        true
                    }
                    None => false,
                }
            }
            UpdateTask::SyncBuffer { attribute, .. } => {
                if attribute >= object.attributes.len() {
                    return false;
                }
                object.upload_attribute(gpu, attribute);
                true
            }
        }
    }
}

fn validate_schema(
    label: &str,
    attributes: &[AttributeDesc],
    shader: &ShaderProgram,
) -> Result<Vec<u32>, EngineError> {
    attributes
        .iter()
        .map(|attribute| {
            let binding =
                shader
                    .attribute(&attribute.name)
                    .ok_or_else(|| EngineError::ShaderBinding {
                        object: label.to_string(),
                        attribute: attribute.name.clone(),
                    })?;
            if binding.kind != attribute.kind {
                return Err(EngineError::ShaderTypeMismatch {
                    object: label.to_string(),
                    attribute: attribute.name.clone(),
                    expected: attribute.kind,
                    found: binding.kind,
                });
            }
            let components = attribute.kind.components();
            let valid = if attribute.instanced {
                attribute.data.len() == components
            } else {
                attribute.data.len() % components == 0
            };
            if !valid {
                return Err(EngineError::AttributeSize {
                    object: label.to_string(),
                    attribute: attribute.name.clone(),
                    expected: components,
                    found: attribute.data.len(),
                });
            }
            Ok(binding.location)
        })
        .collect()
}

fn validate_overrides(
    label: &str,
    instance: &InstanceDesc,
    lookup: impl Fn(&str) -> Option<(AttributeKind, bool)>,
) -> Result<(), EngineError> {
    for (name, data) in &instance.overrides {
        match lookup(name) {
            Some((kind, true)) if data.len() != kind.components() => {
                return Err(EngineError::AttributeSize {
                    object: label.to_string(),
                    attribute: name.clone(),
                    expected: kind.components(),
                    found: data.len(),
                });
            }
            Some((_, true)) => (),
            _ => log::warn!(
                "object `{}`: override of `{}` ignored, it isn't a per-instance attribute",
                label,
                name
            ),
        }
    }
    Ok(())
}

/// Runs the behavior's `init`, then each component's `init` in attach order.
fn init_instance(object: &mut ObjectType, id: InstanceId) {
    let Some(index) = object.dense_index(id) else {
        return;
    };
    let mut behavior = object.records[index].behavior.take();
    let components = object.records[index].components.clone();
    if let Some(mut view) = object.instance_mut(id) {
        if let Some(behavior) = behavior.as_mut() {
            behavior.init(&mut view);
        }
        for component in &components {
            component.init(&mut view);
        }
    }
    object.records[index].behavior = behavior;
}

/// Instance-level update first, then components in declaration order.
fn register_instance(scheduler: &mut Scheduler, object: &ObjectType, id: InstanceId) {
    let Some(index) = object.dense_index(id) else {
        return;
    };
    let record = &object.records[index];
    if record.behavior.is_some() {
        scheduler.add_update(UpdateTask::Instance {
            object: object.id,
            instance: id,
        });
    }
    for (component, attached) in record.components.iter().enumerate() {
        if attached.wants_update() {
            scheduler.add_update(UpdateTask::Component {
                object: object.id,
                instance: id,
                component,
            });
        }
    }
}
