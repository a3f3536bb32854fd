//! Builds the maze and player objects from a tile grid.
//!
//! The maze is one object type: a unit quad drawn once per visible face. Each
//! wall cell contributes four side faces and a top, each floor, goal or spawn
//! cell a single floor face. Holes contribute nothing.

use std::rc::Rc;

use cgmath::{Deg, Matrix4, Vector3};

use crate::{
    config::GameConfig,
    data_structures::{
        attribute::{AttributeDesc, AttributeKind},
        instance::{InstanceDesc, TRANSFORM},
        object::{ObjectDesc, ObjectId},
    },
    error::EngineError,
    game::player::PlayerControl,
    gpu::GpuBackend,
    physics::{PlayerPhysics, Tile, TileGrid},
    registry::ObjectRegistry,
    scheduler::Scheduler,
    shader::ShaderProgram,
};

pub const WALL_COLOR: [f32; 3] = [0.55, 0.55, 0.62];
pub const FLOOR_COLOR: [f32; 3] = [0.4, 0.4, 0.4];
pub const GOAL_COLOR: [f32; 3] = [0.2, 0.85, 0.3];
pub const SPAWN_COLOR: [f32; 3] = [0.3, 0.45, 0.95];
pub const PLAYER_COLOR: [f32; 3] = [0.95, 0.6, 0.15];

/// Faces of a wall cell as (offset from the cell centre, rotation in degrees, luminance).
const WALL_FACES: [([f32; 3], [f32; 3], f32); 5] = [
    ([0.0, 0.5, 0.5], [0.0, 0.0, 0.0], 0.8),
    ([0.0, 0.5, -0.5], [0.0, 180.0, 0.0], 0.6),
    ([0.5, 0.5, 0.0], [0.0, 90.0, 0.0], 0.7),
    ([-0.5, 0.5, 0.0], [0.0, -90.0, 0.0], 0.7),
    ([0.0, 1.0, 0.0], [-90.0, 0.0, 0.0], 1.0),
];

const FLOOR_ROTATION: [f32; 3] = [-90.0, 0.0, 0.0];

/// Transform from a position and Euler angles in degrees, applied as Z, then X,
/// then Y, then the translation. The translation column is `pos` unchanged.
pub fn mat_from_pos_rot(pos: Vector3<f32>, rot: Vector3<f32>) -> Matrix4<f32> {
    Matrix4::from_translation(pos)
        * Matrix4::from_angle_y(Deg(rot.y))
        * Matrix4::from_angle_x(Deg(rot.x))
        * Matrix4::from_angle_z(Deg(rot.z))
}

/// Unit quad in the XY plane facing +Z.
pub fn quad_mesh() -> (Vec<f32>, Vec<u16>) {
    #[rustfmt::skip]
    let positions = vec![
        -0.5, -0.5, 0.0,
         0.5, -0.5, 0.0,
         0.5,  0.5, 0.0,
        -0.5,  0.5, 0.0,
    ];
    (positions, vec![0, 1, 2, 0, 2, 3])
}

/// Axis-aligned cube with edge length `2 * half`.
pub fn cube_mesh(half: f32) -> (Vec<f32>, Vec<u16>) {
    let h = half;
    #[rustfmt::skip]
    let positions = vec![
        -h, -h,  h,
         h, -h,  h,
         h,  h,  h,
        -h,  h,  h,
        -h, -h, -h,
         h, -h, -h,
         h,  h, -h,
        -h,  h, -h,
    ];
    #[rustfmt::skip]
    let indices = vec![
        0, 1, 2, 0, 2, 3, // front
        5, 4, 7, 5, 7, 6, // back
        1, 5, 6, 1, 6, 2, // right
        4, 0, 3, 4, 3, 7, // left
        3, 2, 6, 3, 6, 7, // top
        4, 5, 1, 4, 1, 0, // bottom
    ];
    (positions, indices)
}

fn face(pos: Vector3<f32>, rot: [f32; 3], color: [f32; 3], luminance: f32) -> InstanceDesc {
    InstanceDesc::new()
        .with_transform(mat_from_pos_rot(pos, rot.into()))
        .with_override("color", color.to_vec())
        .with_override("luminance", vec![luminance])
}

/// One quad instance per visible face of the grid, in row-major cell order.
pub fn map_instances(grid: &TileGrid) -> Vec<InstanceDesc> {
    let mut instances = Vec::new();
    for (row, col, tile) in grid.cells() {
        let center = Vector3::new(col as f32, 0.0, row as f32);
        match tile {
            Tile::Wall => {
                for (offset, rot, luminance) in WALL_FACES {
                    instances.push(face(center + Vector3::from(offset), rot, WALL_COLOR, luminance));
                }
            }
            Tile::Floor => instances.push(face(center, FLOOR_ROTATION, FLOOR_COLOR, 0.6)),
            Tile::Goal => instances.push(face(center, FLOOR_ROTATION, GOAL_COLOR, 1.0)),
            Tile::Spawn => instances.push(face(center, FLOOR_ROTATION, SPAWN_COLOR, 0.9)),
            Tile::Hole => (),
        }
    }
    instances
}

/// The maze object type for `grid`.
pub fn map_object(grid: &TileGrid) -> ObjectDesc {
    let (positions, indices) = quad_mesh();
    let identity: [[f32; 4]; 4] = <Matrix4<f32> as cgmath::SquareMatrix>::identity().into();
    let mut desc = ObjectDesc::new("maze")
        .with_indices(indices)
        .with_attribute(AttributeDesc::per_vertex("position", AttributeKind::Vec3, positions))
        .with_attribute(AttributeDesc::per_instance(
            TRANSFORM,
            AttributeKind::Mat4,
            identity.concat(),
        ))
        .with_attribute(AttributeDesc::per_instance(
            "color",
            AttributeKind::Vec3,
            FLOOR_COLOR.to_vec(),
        ))
        .with_attribute(AttributeDesc::per_instance("luminance", AttributeKind::Scalar, vec![1.0]));
    desc.instances = map_instances(grid);
    desc
}

/// Where the player starts: above the spawn cell, or the first cell if the map has none.
pub fn spawn_point(grid: &TileGrid, config: &GameConfig) -> Vector3<f32> {
    let (row, col) = grid.spawn().unwrap_or_else(|| {
        log::warn!("map has no spawn cell, starting at (0, 0)");
        (0, 0)
    });
    Vector3::new(col as f32, config.spawn_height, row as f32)
}

/// The player cube: one instance with physics and keyboard control.
/// Its transform is re-uploaded every frame.
pub fn player_object(spawn: Vector3<f32>, config: &GameConfig) -> ObjectDesc {
    let (positions, indices) = cube_mesh(0.25);
    let mut physics = PlayerPhysics::new(config.gravity, config.linear_drag);
    physics.death_height = config.death_height;
    let transform: [[f32; 4]; 4] = Matrix4::from_translation(spawn).into();
    ObjectDesc::new("player")
        .with_indices(indices)
        .with_attribute(AttributeDesc::per_vertex("position", AttributeKind::Vec3, positions))
        .with_attribute(
            AttributeDesc::per_instance(TRANSFORM, AttributeKind::Mat4, transform.concat()).dynamic(),
        )
        .with_attribute(AttributeDesc::per_instance(
            "color",
            AttributeKind::Vec3,
            PLAYER_COLOR.to_vec(),
        ))
        .with_attribute(AttributeDesc::per_instance("luminance", AttributeKind::Scalar, vec![1.0]))
        .with_instance(
            InstanceDesc::new()
                .with_spawnpoint(spawn)
                .with_behavior(Box::new(PlayerControl::new(config.gravity, config.tilt_strength)))
                .with_component(Rc::new(physics)),
        )
}

/// Loads the maze object for `grid`. A map without a single visible face (all
/// holes) has nothing to draw and loads no object.
pub fn load_map(
    registry: &mut ObjectRegistry,
    scheduler: &mut Scheduler,
    gpu: &mut dyn GpuBackend,
    shader: &ShaderProgram,
    grid: &TileGrid,
) -> Result<Option<ObjectId>, EngineError> {
    let desc = map_object(grid);
    if desc.instances.is_empty() {
        log::warn!(
            "{}x{} map has no floor or walls, nothing to draw",
            grid.rows(),
            grid.cols()
        );
        return Ok(None);
    }
    registry.load_object(gpu, scheduler, shader, desc).map(Some)
}
