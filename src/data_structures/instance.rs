//! Instances of an object type.
//!
//! An instance is addressed by a stable [`InstanceId`] (slot + generation). Its
//! attribute data lives in the dense storage of the owning object and is only
//! reachable through an [`InstanceMut`] view, which borrows the object for the
//! duration of the access. Nothing outside the object keeps a pointer into the
//! storage, so compaction on removal can't leave a dangling view.

use std::{collections::HashMap, rc::Rc};

use cgmath::{Vector3, Zero};

use crate::{
    component::{Behavior, Component},
    data_structures::{attribute::AttributeBuffer, object::ObjectId},
};

/// Name of the per-instance mat4 attribute that holds the world transform.
pub const TRANSFORM: &str = "transform";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId {
    pub(crate) slot: u32,
    pub(crate) generation: u32,
}

/// Gameplay state that components keep directly on the instance.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceState {
    /// Allocated by a physics component's `init`.
    pub velocity: Option<Vector3<f32>>,
    /// Acceleration applied each frame; set by physics `init`, steered by behaviors.
    pub gravity: Vector3<f32>,
    pub spawnpoint: Vector3<f32>,
    /// Whether the instance stood on a goal cell last frame.
    pub on_goal: bool,
}

impl Default for InstanceState {
    fn default() -> Self {
        Self {
            velocity: None,
            gravity: Vector3::zero(),
            spawnpoint: Vector3::zero(),
            on_goal: false,
        }
    }
}

/// Everything needed to create one instance.
#[derive(Default)]
pub struct InstanceDesc {
    pub overrides: HashMap<String, Vec<f32>>,
    pub behavior: Option<Box<dyn Behavior>>,
    pub components: Vec<Rc<dyn Component>>,
    pub state: InstanceState,
}

impl InstanceDesc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the schema default of `attribute` for this instance.
    pub fn with_override(mut self, attribute: &str, data: Vec<f32>) -> Self {
        self.overrides.insert(attribute.to_string(), data);
        self
    }

    pub fn with_transform(self, transform: cgmath::Matrix4<f32>) -> Self {
        let raw: [[f32; 4]; 4] = transform.into();
        self.with_override(TRANSFORM, raw.concat())
    }

    pub fn with_behavior(mut self, behavior: Box<dyn Behavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// Attaches a component. Components update in the order they are attached.
    pub fn with_component(mut self, component: Rc<dyn Component>) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_spawnpoint(mut self, spawnpoint: Vector3<f32>) -> Self {
        self.state.spawnpoint = spawnpoint;
        self
    }
}

pub(crate) struct InstanceRecord {
    pub(crate) id: InstanceId,
    pub(crate) behavior: Option<Box<dyn Behavior>>,
    pub(crate) components: Vec<Rc<dyn Component>>,
    pub(crate) state: InstanceState,
}

/// Mutable access to one instance: its state and its element in every
/// per-instance attribute.
pub struct InstanceMut<'a> {
    pub(crate) object: ObjectId,
    pub(crate) id: InstanceId,
    pub(crate) index: usize,
    pub(crate) attributes: &'a mut [AttributeBuffer],
    pub state: &'a mut InstanceState,
}

impl<'a> InstanceMut<'a> {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn attribute(&self, name: &str) -> Option<&[f32]> {
        self.attributes
            .iter()
            .find(|attribute| attribute.instanced && attribute.name == name)
            .map(|attribute| attribute.element(self.index))
    }

    /// Static attributes touched here are re-uploaded before the next draw.
    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut [f32]> {
        let index = self.index;
        self.attributes
            .iter_mut()
            .find(|attribute| attribute.instanced && attribute.name == name)
            .map(|attribute| {
                if !attribute.dynamic {
                    attribute.stale = true;
                }
                attribute.element_mut(index)
            })
    }

    /// World position stored in the transform's translation column.
    pub fn translation(&self) -> Option<Vector3<f32>> {
        self.attribute(TRANSFORM)
            .map(|m| Vector3::new(m[12], m[13], m[14]))
    }

    pub fn set_translation(&mut self, position: Vector3<f32>) {
        if let Some(m) = self.attribute_mut(TRANSFORM) {
            m[12] = position.x;
            m[13] = position.y;
            m[14] = position.z;
        }
    }

    pub fn translate(&mut self, offset: Vector3<f32>) {
        if let Some(m) = self.attribute_mut(TRANSFORM) {
            m[12] += offset.x;
            m[13] += offset.y;
            m[14] += offset.z;
        }
    }
}
