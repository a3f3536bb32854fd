#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use cube_maze::{
    cgmath::{Matrix4, Vector3},
    component::{Behavior, Component},
    data_structures::{
        attribute::{AttributeDesc, AttributeKind},
        instance::{InstanceDesc, InstanceMut, TRANSFORM},
        object::ObjectDesc,
    },
    game::map_loader::quad_mesh,
    physics::TileGrid,
    scheduler::FrameContext,
};

pub type Log = Rc<RefCell<Vec<String>>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn grid(codes: &[&[u8]]) -> TileGrid {
    TileGrid::from_codes(codes).expect("valid test map")
}

pub fn translation(x: f32, y: f32, z: f32) -> Vec<f32> {
    let m: [[f32; 4]; 4] = Matrix4::from_translation(Vector3::new(x, y, z)).into();
    m.concat()
}

/// A quad object drawn with the maze shader, with `instances` plain instances.
pub fn quad_object(label: &str, instances: usize) -> ObjectDesc {
    let (positions, indices) = quad_mesh();
    let mut desc = ObjectDesc::new(label)
        .with_indices(indices)
        .with_attribute(AttributeDesc::per_vertex(
            "position",
            AttributeKind::Vec3,
            positions,
        ))
        .with_attribute(AttributeDesc::per_instance(
            TRANSFORM,
            AttributeKind::Mat4,
            translation(0.0, 0.0, 0.0),
        ))
        .with_attribute(AttributeDesc::per_instance(
            "color",
            AttributeKind::Vec3,
            vec![0.5, 0.5, 0.5],
        ));
    for i in 0..instances {
        desc = desc.with_instance(
            InstanceDesc::new().with_override(TRANSFORM, translation(i as f32, 0.0, 0.0)),
        );
    }
    desc
}

/// Behavior that writes `init:<name>` and `update:<name>` to a shared log.
pub struct Recorder {
    pub name: String,
    pub log: Log,
}

impl Recorder {
    pub fn boxed(name: &str, log: &Log) -> Box<Self> {
        Box::new(Self {
            name: name.to_string(),
            log: log.clone(),
        })
    }
}

impl Behavior for Recorder {
    fn init(&mut self, _instance: &mut InstanceMut<'_>) {
        self.log.borrow_mut().push(format!("init:{}", self.name));
    }

    fn update(&mut self, _frame: &mut FrameContext<'_>, _instance: &mut InstanceMut<'_>) {
        self.log.borrow_mut().push(format!("update:{}", self.name));
    }
}

/// Component counterpart of [`Recorder`].
pub struct Tagged {
    pub name: String,
    pub log: Log,
    pub scheduled: bool,
}

impl Tagged {
    pub fn shared(name: &str, log: &Log) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_string(),
            log: log.clone(),
            scheduled: true,
        })
    }
}

impl Component for Tagged {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self, _instance: &mut InstanceMut<'_>) {
        self.log.borrow_mut().push(format!("init:{}", self.name));
    }

    fn update(&self, _frame: &mut FrameContext<'_>, _instance: &mut InstanceMut<'_>) {
        self.log.borrow_mut().push(format!("update:{}", self.name));
    }

    fn wants_update(&self) -> bool {
        self.scheduled
    }
}
