use std::rc::Rc;

use cube_maze::{
    EngineError,
    cgmath::{Vector3, Zero},
    data_structures::{
        instance::{InstanceDesc, TRANSFORM},
        object::ObjectId,
    },
    gpu::RecordingGpu,
    input::InputState,
    physics::{self, PlayerPhysics, Tile, TileGrid, footprint, step},
    registry::ObjectRegistry,
    scheduler::{FrameContext, FrameEvent, Scheduler},
    shader::ShaderProgram,
};

use crate::common::test_utils::{grid, init_logger, quad_object, translation};

mod common;

const DEATH: f32 = physics::DEATH_HEIGHT;

#[test]
fn hole_next_to_the_player_is_not_a_wall() {
    let map = grid(&[&[1, 0, 1, 2, 0, 1]]);
    let mut velocity = Vector3::new(0.05, 0.0, 0.0);

    let outcome = step(
        &map,
        Vector3::new(3.0, 0.05, 0.0),
        &mut velocity,
        Vector3::zero(),
        1.0,
        1.0,
        DEATH,
    );

    assert!(!outcome.collision.x);
    assert!(!outcome.collision.y, "a hole has no floor");
    assert!(!outcome.fell);
    assert_eq!(outcome.translation, Vector3::new(0.05, 0.0, 0.0));
}

#[test]
fn walls_stop_movement_on_their_axis_only() {
    let map = grid(&[
        &[1, 1, 1, 1],
        &[1, 0, 1, 1],
        &[1, 0, 0, 1],
        &[1, 1, 1, 1],
    ]);
    let mut velocity = Vector3::new(0.3, 0.0, 0.1);

    let outcome = step(
        &map,
        Vector3::new(1.0, 0.25, 1.0),
        &mut velocity,
        Vector3::zero(),
        1.0,
        1.0,
        DEATH,
    );

    assert!(outcome.collision.x);
    assert!(!outcome.collision.z);
    assert!(outcome.collision.y);
    assert_eq!(velocity, Vector3::new(0.0, 0.0, 0.1));
}

#[test]
fn floor_cancels_gravity_and_drag_scales_velocity() {
    let map = grid(&[&[0, 0, 0], &[0, 0, 0], &[0, 0, 0]]);
    let mut velocity = Vector3::new(0.1, 0.0, 0.0);

    let outcome = step(
        &map,
        Vector3::new(1.0, 0.25, 1.0),
        &mut velocity,
        Vector3::new(0.0, -0.01, 0.0),
        2.0,
        0.5,
        DEATH,
    );

    assert!(outcome.collision.y);
    assert_eq!(velocity, Vector3::new(0.05, 0.0, 0.0));
    assert_eq!(outcome.translation, velocity);
}

#[test]
fn footprint_samples_both_edges() {
    assert_eq!(footprint(3.0), [3, 3]);
    assert_eq!(footprint(3.3), [3, 4]);
    assert_eq!(footprint(-0.3), [-1, 0]);
}

#[test]
fn sampling_outside_the_map_is_a_hole() {
    init_logger();
    let map = grid(&[&[0, 1], &[3, 4]]);

    assert_eq!(map.get(1, 1), Ok(Tile::Spawn));
    assert_eq!(
        map.get(-1, 0),
        Err(EngineError::GridIndexOutOfRange {
            row: -1,
            col: 0,
            rows: 2,
            cols: 2
        })
    );
    assert_eq!(map.sample(5, 0), Tile::Hole);
    assert_eq!(map.spawn(), Some((1, 1)));

    // Standing past the edge of the map: no floor, the cube falls.
    let mut velocity = Vector3::zero();
    let outcome = step(
        &map,
        Vector3::new(-2.0, 0.25, 0.0),
        &mut velocity,
        Vector3::new(0.0, -0.01, 0.0),
        1.0,
        1.0,
        DEATH,
    );
    assert!(!outcome.collision.y);
    assert!(velocity.y < 0.0);
}

#[test]
fn ragged_and_invalid_maps() {
    let ragged = TileGrid::from_codes(&[&[0u8, 0, 0][..], &[0u8][..]]).unwrap();
    assert_eq!(ragged.cols(), 3);
    assert_eq!(ragged.get(1, 2), Ok(Tile::Hole));

    assert_eq!(
        TileGrid::from_codes(&[&[0u8, 7][..]]),
        Err(EngineError::InvalidTile(7))
    );
}

#[test]
fn falling_below_the_death_height_aborts_the_step() {
    let map = grid(&[&[0]]);
    let mut velocity = Vector3::new(0.1, -0.5, 0.1);

    let outcome = step(
        &map,
        Vector3::new(0.0, -3.5, 0.0),
        &mut velocity,
        Vector3::new(0.0, -0.01, 0.0),
        1.0,
        0.9,
        DEATH,
    );

    assert!(outcome.fell);
    assert_eq!(velocity, Vector3::zero());
    assert_eq!(outcome.translation, Vector3::zero());
}

struct Sim {
    gpu: RecordingGpu,
    scheduler: Scheduler,
    registry: ObjectRegistry,
    map: TileGrid,
    object: ObjectId,
}

impl Sim {
    /// One physics cube starting at `start`, respawning at `spawn`.
    fn new(map: TileGrid, start: Vector3<f32>, spawn: Vector3<f32>) -> Self {
        let mut gpu = RecordingGpu::new();
        let mut scheduler = Scheduler::new();
        let mut registry = ObjectRegistry::new();
        let physics = PlayerPhysics::new(Vector3::new(0.0, -0.01, 0.0), 0.9);
        let desc = quad_object("cube", 0).with_instance(
            InstanceDesc::new()
                .with_override(TRANSFORM, translation(start.x, start.y, start.z))
                .with_spawnpoint(spawn)
                .with_component(Rc::new(physics)),
        );
        let object = registry
            .load_object(&mut gpu, &mut scheduler, &ShaderProgram::maze(), desc)
            .unwrap();
        Self {
            gpu,
            scheduler,
            registry,
            map,
            object,
        }
    }

    fn frame(&mut self, input: &InputState) -> Vec<FrameEvent> {
        let mut frame = FrameContext::new(1.0, 0.0, input, Some(&self.map));
        self.scheduler
            .run(&mut self.registry, &mut self.gpu, &mut frame);
        frame.take_events()
    }

    fn position(&self) -> Vector3<f32> {
        let object = self.registry.get(self.object).unwrap();
        let id = object.instance_ids()[0];
        let m = object.instance_attribute(id, TRANSFORM).unwrap();
        Vector3::new(m[12], m[13], m[14])
    }

    fn push(&mut self, gravity: Vector3<f32>) {
        let object = self.registry.get_mut(self.object).unwrap();
        let id = object.instance_ids()[0];
        object.instance_mut(id).unwrap().state.gravity = gravity;
    }
}

fn corridor() -> TileGrid {
    grid(&[
        &[1, 1, 1, 1, 1, 1],
        &[1, 4, 0, 0, 3, 1],
        &[1, 1, 1, 1, 1, 1],
    ])
}

#[test]
fn goal_fires_once_per_approach() {
    let spawn = Vector3::new(1.0, 0.25, 1.0);
    let mut sim = Sim::new(corridor(), Vector3::new(4.0, 0.25, 1.0), spawn);
    let input = InputState::new();

    let events = sim.frame(&input);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], FrameEvent::Won { .. }));
    for _ in 0..5 {
        assert!(sim.frame(&input).is_empty());
    }
    assert_eq!(sim.position(), Vector3::new(4.0, 0.25, 1.0));
}

#[test]
fn rolling_into_the_goal_stops_the_cube() {
    let spawn = Vector3::new(1.0, 0.25, 1.0);
    let mut sim = Sim::new(corridor(), spawn, spawn);
    sim.push(Vector3::new(0.01, -0.01, 0.0));
    let input = InputState::new();

    let mut wins = 0;
    for _ in 0..200 {
        wins += sim
            .frame(&input)
            .iter()
            .filter(|e| matches!(e, FrameEvent::Won { .. }))
            .count();
    }

    assert_eq!(wins, 1);
    let position = sim.position();
    assert_eq!(position.z, 1.0);
    assert!(position.x >= 3.5 && position.x <= 4.25, "{:?}", position);
}

#[test]
fn falling_off_respawns_once() {
    let spawn = Vector3::new(1.0, 0.25, 1.0);
    let mut sim = Sim::new(corridor(), Vector3::new(2.0, -3.5, 1.0), spawn);
    let input = InputState::new();

    let events = sim.frame(&input);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], FrameEvent::Died { .. }));
    assert_eq!(sim.position(), spawn);

    for _ in 0..10 {
        assert!(sim.frame(&input).is_empty());
    }
    assert_eq!(sim.position(), spawn);
}

#[test]
fn hole_swallows_the_cube_and_it_respawns() {
    let map = grid(&[&[1, 1, 1, 1, 1], &[1, 4, 2, 0, 1], &[1, 1, 1, 1, 1]]);
    let spawn = Vector3::new(1.0, 0.25, 1.0);
    // Centred over the hole, so the whole footprint is unsupported.
    let mut sim = Sim::new(map, Vector3::new(2.0, 0.25, 1.0), spawn);
    let input = InputState::new();

    let mut deaths = 0;
    for _ in 0..120 {
        deaths += sim
            .frame(&input)
            .iter()
            .filter(|e| matches!(e, FrameEvent::Died { .. }))
            .count();
    }

    assert_eq!(deaths, 1);
    assert_eq!(sim.position(), spawn);
}

#[test]
fn identical_inputs_give_identical_trajectories() {
    let run = || {
        let spawn = Vector3::new(1.0, 0.25, 1.0);
        let mut sim = Sim::new(corridor(), spawn, spawn);
        let input = InputState::new();
        let mut trajectory = Vec::new();
        for frame in 0..90 {
            let tilt = if frame < 30 { 0.004 } else { -0.002 };
            sim.push(Vector3::new(tilt, -0.01, 0.0));
            sim.frame(&input);
            trajectory.push(sim.position());
        }
        trajectory
    };

    let first = run();
    assert_eq!(first, run());
    assert!(first.iter().any(|p| p.x != 1.0));
}
