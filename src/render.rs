//! Draw dispatch for loaded object types.
//!
//! Every loaded object is drawn with one instanced draw call per frame, in load
//! order. The instance count is read from the live instance list at the moment
//! of the draw, never cached.

use crate::{
    data_structures::object::ObjectType,
    gpu::{DrawCall, DrawKind, GpuBackend},
    registry::ObjectRegistry,
};

/// Builds the draw call of one object, or `None` if it has nothing to draw.
///
/// Indexed objects draw their whole index buffer. Others draw as many vertices
/// as the per-vertex `position` attribute holds.
pub fn draw_call(object: &ObjectType) -> Option<DrawCall> {
    let instance_count = object.instance_count() as u32;
    if instance_count == 0 {
        log::warn!("object `{}` has no instances, skipping draw", object.label());
        return None;
    }
    let kind = match object.index_buffer() {
        Some(index) => DrawKind::Indexed {
            index: index.buffer,
            index_count: index.count,
        },
        None => DrawKind::Arrays {
            vertex_count: object.vertex_count(),
        },
    };
    let vertex_buffers = object
        .attributes()
        .iter()
        .map(|attribute| attribute.buffer())
        .collect::<Option<Vec<_>>>();
    let Some(vertex_buffers) = vertex_buffers else {
        log::error!("object `{}` has an attribute without a GPU buffer", object.label());
        return None;
    };
    Some(DrawCall {
        pipeline: object.pipeline(),
        vertex_buffers,
        kind,
        instance_count,
    })
}

/// Uploads attributes changed since the last frame, then issues one
/// draw per object. Returns the number of draws issued.
pub fn draw_objects(registry: &mut ObjectRegistry, gpu: &mut dyn GpuBackend) -> usize {
    let mut draws = 0;
    for object in registry.objects_mut() {
        object.flush_stale(gpu);
        if let Some(call) = draw_call(object) {
            gpu.draw(call);
            draws += 1;
        }
    }
    draws
}
