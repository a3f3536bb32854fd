use cube_maze::{
    cgmath::Vector3,
    component::Behavior,
    data_structures::instance::{InstanceDesc, InstanceMut, TRANSFORM},
    gpu::RecordingGpu,
    input::InputState,
    registry::ObjectRegistry,
    render,
    scheduler::{FrameContext, Scheduler, UpdateTask},
    shader::ShaderProgram,
};

use crate::common::test_utils::{Recorder, Tagged, new_log, quad_object};

mod common;

#[test]
fn updates_run_in_registration_order_behavior_before_components() {
    let log = new_log();
    let mut gpu = RecordingGpu::new();
    let mut scheduler = Scheduler::new();
    let mut registry = ObjectRegistry::new();
    let desc = quad_object("ordered", 0)
        .with_instance(
            InstanceDesc::new()
                .with_behavior(Recorder::boxed("a", &log))
                .with_component(Tagged::shared("a1", &log))
                .with_component(Tagged::shared("a2", &log)),
        )
        .with_instance(InstanceDesc::new().with_behavior(Recorder::boxed("b", &log)));
    registry
        .load_object(&mut gpu, &mut scheduler, &ShaderProgram::maze(), desc)
        .unwrap();

    assert_eq!(
        *log.borrow(),
        vec!["init:a", "init:a1", "init:a2", "init:b"]
    );
    log.borrow_mut().clear();

    let input = InputState::new();
    for _ in 0..2 {
        let mut frame = FrameContext::new(1.0, 0.0, &input, None);
        assert_eq!(scheduler.run(&mut registry, &mut gpu, &mut frame), 4);
    }
    assert_eq!(
        *log.borrow(),
        vec![
            "update:a", "update:a1", "update:a2", "update:b", "update:a", "update:a1",
            "update:a2", "update:b",
        ]
    );
}

#[test]
fn components_without_per_frame_work_are_not_scheduled() {
    let log = new_log();
    let mut gpu = RecordingGpu::new();
    let mut scheduler = Scheduler::new();
    let mut registry = ObjectRegistry::new();
    let mut idle = Tagged::shared("idle", &log);
    std::rc::Rc::get_mut(&mut idle).unwrap().scheduled = false;
    let desc = quad_object("idle", 0).with_instance(InstanceDesc::new().with_component(idle));
    registry
        .load_object(&mut gpu, &mut scheduler, &ShaderProgram::maze(), desc)
        .unwrap();

    assert!(scheduler.is_empty());
    assert_eq!(*log.borrow(), vec!["init:idle"]);
}

#[test]
fn pop_update_removes_only_the_first_match() {
    let mut gpu = RecordingGpu::new();
    let mut scheduler = Scheduler::new();
    let mut registry = ObjectRegistry::new();
    let log = new_log();
    let id = registry
        .load_object(
            &mut gpu,
            &mut scheduler,
            &ShaderProgram::maze(),
            quad_object("popped", 0)
                .with_instance(InstanceDesc::new().with_behavior(Recorder::boxed("x", &log))),
        )
        .unwrap();
    let instance = registry.get(id).unwrap().instance_ids()[0];
    let task = UpdateTask::Instance {
        object: id,
        instance,
    };
    scheduler.add_update(task);
    assert_eq!(scheduler.len(), 2);

    assert!(scheduler.pop_update(&task));
    assert_eq!(scheduler.tasks(), &[task]);
    assert!(scheduler.pop_update(&task));
    assert!(!scheduler.pop_update(&task));
}

#[test]
fn removing_an_instance_unregisters_its_updates() {
    let log = new_log();
    let mut gpu = RecordingGpu::new();
    let mut scheduler = Scheduler::new();
    let mut registry = ObjectRegistry::new();
    let id = registry
        .load_object(
            &mut gpu,
            &mut scheduler,
            &ShaderProgram::maze(),
            quad_object("removed", 0)
                .with_instance(
                    InstanceDesc::new()
                        .with_behavior(Recorder::boxed("gone", &log))
                        .with_component(Tagged::shared("gone_c", &log)),
                )
                .with_instance(InstanceDesc::new().with_behavior(Recorder::boxed("kept", &log))),
        )
        .unwrap();
    let gone = registry.get(id).unwrap().instance_ids()[0];
    registry.remove_instance(&mut scheduler, id, gone).unwrap();
    log.borrow_mut().clear();

    let input = InputState::new();
    let mut frame = FrameContext::new(1.0, 0.0, &input, None);
    scheduler.run(&mut registry, &mut gpu, &mut frame);

    assert_eq!(scheduler.len(), 1);
    assert_eq!(*log.borrow(), vec!["update:kept"]);
}

#[test]
fn dynamic_attributes_are_resent_every_frame() {
    let mut gpu = RecordingGpu::new();
    let mut scheduler = Scheduler::new();
    let mut registry = ObjectRegistry::new();
    let mut desc = quad_object("moving", 2);
    desc.attributes[1] = desc.attributes[1].clone().dynamic();
    let id = registry
        .load_object(&mut gpu, &mut scheduler, &ShaderProgram::maze(), desc)
        .unwrap();
    let object = registry.get(id).unwrap();
    let transform = object.attribute(TRANSFORM).unwrap().buffer().unwrap();
    let color = object.attribute("color").unwrap().buffer().unwrap();

    let input = InputState::new();
    for _ in 0..3 {
        let mut frame = FrameContext::new(1.0, 0.0, &input, None);
        scheduler.run(&mut registry, &mut gpu, &mut frame);
    }

    assert_eq!(gpu.writes_to(transform), 3);
    assert_eq!(gpu.writes_to(color), 0);
}

/// Moves its instance one unit along +x every frame.
struct Mover;

impl Behavior for Mover {
    fn update(&mut self, _frame: &mut FrameContext<'_>, instance: &mut InstanceMut<'_>) {
        instance.translate(Vector3::new(1.0, 0.0, 0.0));
    }
}

#[test]
fn instances_added_later_are_synced_before_the_draw() {
    let mut gpu = RecordingGpu::new();
    let mut scheduler = Scheduler::new();
    let mut registry = ObjectRegistry::new();
    let mut desc = quad_object("moving", 1);
    desc.attributes[1] = desc.attributes[1].clone().dynamic();
    let id = registry
        .load_object(&mut gpu, &mut scheduler, &ShaderProgram::maze(), desc)
        .unwrap();
    let mover = registry
        .add_instance(&mut scheduler, id, InstanceDesc::new().with_behavior(Box::new(Mover)))
        .unwrap();

    let input = InputState::new();
    for frame_no in 1..=3 {
        let mut frame = FrameContext::new(1.0, 0.0, &input, None);
        scheduler.run(&mut registry, &mut gpu, &mut frame);
        render::draw_objects(&mut registry, &mut gpu);

        let object = registry.get(id).unwrap();
        let cpu_x = object.instance_attribute(mover, TRANSFORM).unwrap()[12];
        let buffer = object.attribute(TRANSFORM).unwrap().buffer().unwrap();
        let uploaded = gpu.buffer(buffer).unwrap();
        let at = (object.dense_index(mover).unwrap() * 16 + 12) * 4;
        let gpu_x = f32::from_ne_bytes(uploaded[at..at + 4].try_into().unwrap());

        assert_eq!(cpu_x, frame_no as f32);
        assert_eq!(gpu_x, cpu_x, "frame {}", frame_no);
    }
}
