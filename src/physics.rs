//! Tile grid and the grid collision step of the player cube.
//!
//! The cube's footprint is a 0.5 x 0.5 square centred on its position, and
//! tiles are unit squares centred on integer coordinates. A footprint edge at
//! `u` lies in tile `floor(u + 0.5)`, so the two tiles touched along one axis
//! are `floor(u + 0.25)` and `floor(u + 0.75)`. Collision tests sample those
//! four corners. It is a coarse per-axis test, not continuous collision.

use cgmath::{Vector3, Zero};

use crate::{
    component::Component,
    data_structures::instance::InstanceMut,
    error::EngineError,
    scheduler::{FrameContext, FrameEvent},
};

/// Below this height an instance counts as fallen off the map.
pub const DEATH_HEIGHT: f32 = -3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tile {
    Floor = 0,
    Wall = 1,
    Hole = 2,
    Goal = 3,
    Spawn = 4,
}

impl Tile {
    /// Tiles that get a floor quad.
    pub fn has_floor(self) -> bool {
        matches!(self, Tile::Floor | Tile::Goal | Tile::Spawn)
    }
}

impl TryFrom<u8> for Tile {
    type Error = EngineError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Tile::Floor),
            1 => Ok(Tile::Wall),
            2 => Ok(Tile::Hole),
            3 => Ok(Tile::Goal),
            4 => Ok(Tile::Spawn),
            other => Err(EngineError::InvalidTile(other)),
        }
    }
}

/// One level's map. Row index runs along +z, column index along +x.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    rows: usize,
    cols: usize,
    cells: Vec<Tile>,
}

impl TileGrid {
    /// Builds a grid from cell codes. Short rows are padded with holes.
    pub fn from_codes<R: AsRef<[u8]>>(codes: &[R]) -> Result<Self, EngineError> {
        let rows = codes.len();
        let cols = codes.iter().map(|row| row.as_ref().len()).max().unwrap_or(0);
        let mut cells = Vec::with_capacity(rows * cols);
        for (r, row) in codes.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                log::warn!("map row {} has {} cells, padding to {}", r, row.len(), cols);
            }
            for &code in row {
                cells.push(Tile::try_from(code)?);
            }
            cells.extend(std::iter::repeat_n(Tile::Hole, cols - row.len()));
        }
        Ok(Self { rows, cols, cells })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: i64, col: i64) -> Result<Tile, EngineError> {
        if row < 0 || col < 0 || row as usize >= self.rows || col as usize >= self.cols {
            return Err(EngineError::GridIndexOutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(self.cells[row as usize * self.cols + col as usize])
    }

    /// Like [`get`](Self::get), but anything outside the map is a hole.
    pub fn sample(&self, row: i64, col: i64) -> Tile {
        self.get(row, col).unwrap_or_else(|err| {
            log::debug!("{}, treating it as a hole", err);
            Tile::Hole
        })
    }

    /// All cells as `(row, col, tile)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Tile)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, &tile)| (i / self.cols, i % self.cols, tile))
    }

    /// First spawn cell as `(row, col)`.
    pub fn spawn(&self) -> Option<(usize, usize)> {
        self.cells()
            .find(|&(_, _, tile)| tile == Tile::Spawn)
            .map(|(row, col, _)| (row, col))
    }

    /// World-space centre of the map on the floor plane.
    pub fn center(&self) -> Vector3<f32> {
        Vector3::new(
            (self.cols as f32 - 1.0) / 2.0,
            0.0,
            (self.rows as f32 - 1.0) / 2.0,
        )
    }

    fn any_in_footprint(&self, x: f32, z: f32, test: impl Fn(Tile) -> bool) -> bool {
        footprint(z)
            .into_iter()
            .any(|row| footprint(x).into_iter().any(|col| test(self.sample(row, col))))
    }
}

/// Tile indices under the two footprint edges along one axis.
pub fn footprint(u: f32) -> [i64; 2] {
    [(u + 0.25).floor() as i64, (u + 0.75).floor() as i64]
}

/// Tile index under a coordinate, rounding halves up.
pub fn tile_index(u: f32) -> i64 {
    (u + 0.5).floor() as i64
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Collision {
    pub x: bool,
    /// There is floor under the footprint.
    pub y: bool,
    pub z: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutcome {
    pub collision: Collision,
    /// The instance stands over a goal cell.
    pub on_goal: bool,
    pub fell: bool,
    /// Translation to apply this frame; zero when `fell`.
    pub translation: Vector3<f32>,
}

/// One frame of grid physics. Updates `velocity` in place and returns the
/// translation to apply.
pub fn step(
    grid: &TileGrid,
    position: Vector3<f32>,
    velocity: &mut Vector3<f32>,
    gravity: Vector3<f32>,
    delta_time: f32,
    linear_drag: f32,
    death_height: f32,
) -> StepOutcome {
    *velocity += gravity * delta_time;

    let next_x = position.x + velocity.x;
    let next_z = position.z + velocity.z;

    let mut collision = Collision::default();
    if position.y > 0.0 {
        collision.x = grid.any_in_footprint(next_x, position.z, |tile| tile == Tile::Wall);
        collision.y = grid.any_in_footprint(position.x, position.z, |tile| tile != Tile::Hole);
        collision.z = grid.any_in_footprint(position.x, next_z, |tile| tile == Tile::Wall);
    }

    let on_goal = grid.sample(tile_index(position.z), tile_index(position.x)) == Tile::Goal;

    if position.y < death_height {
        *velocity = Vector3::zero();
        return StepOutcome {
            collision,
            on_goal: false,
            fell: true,
            translation: Vector3::zero(),
        };
    }

    if collision.x {
        velocity.x = 0.0;
    }
    if collision.y {
        velocity.y = 0.0;
    }
    if collision.z {
        velocity.z = 0.0;
    }
    if on_goal {
        *velocity = Vector3::zero();
    }

    *velocity *= linear_drag;

    StepOutcome {
        collision,
        on_goal,
        fell: false,
        translation: *velocity,
    }
}

/// Gravity, drag and grid collision for a player-like instance.
///
/// Falling below the death height respawns the instance at its spawnpoint and
/// emits [`FrameEvent::Died`]; entering a goal cell emits [`FrameEvent::Won`]
/// once per approach.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerPhysics {
    pub gravity: Vector3<f32>,
    pub linear_drag: f32,
    pub death_height: f32,
}

impl PlayerPhysics {
    pub fn new(gravity: Vector3<f32>, linear_drag: f32) -> Self {
        Self {
            gravity,
            linear_drag,
            death_height: DEATH_HEIGHT,
        }
    }
}

impl Component for PlayerPhysics {
    fn name(&self) -> &str {
        "player_physics"
    }

    fn init(&self, instance: &mut InstanceMut<'_>) {
        instance.state.velocity = Some(Vector3::zero());
        instance.state.gravity = self.gravity;
    }

    fn update(&self, frame: &mut FrameContext<'_>, instance: &mut InstanceMut<'_>) {
        let Some(position) = instance.translation() else {
            return;
        };
        let Some(mut velocity) = instance.state.velocity else {
            return;
        };
        let gravity = instance.state.gravity;

        let outcome = match frame.grid {
            Some(grid) => step(
                grid,
                position,
                &mut velocity,
                gravity,
                frame.delta_time,
                self.linear_drag,
                self.death_height,
            ),
            None => {
                velocity += gravity * frame.delta_time;
                let fell = position.y < self.death_height;
                if fell {
                    velocity = Vector3::zero();
                }
                velocity *= self.linear_drag;
                StepOutcome {
                    collision: Collision::default(),
                    on_goal: false,
                    fell,
                    translation: velocity,
                }
            }
        };
        instance.state.velocity = Some(velocity);

        if outcome.fell {
            let spawnpoint = instance.state.spawnpoint;
            instance.set_translation(spawnpoint);
            instance.state.on_goal = false;
            frame.emit(FrameEvent::Died {
                object: instance.object(),
                instance: instance.id(),
            });
            return;
        }

        if outcome.on_goal && !instance.state.on_goal {
            frame.emit(FrameEvent::Won {
                object: instance.object(),
                instance: instance.id(),
            });
        }
        instance.state.on_goal = outcome.on_goal;
        instance.translate(outcome.translation);
    }
}
