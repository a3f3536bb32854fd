//! Compiled-in maps. Codes: 0 floor, 1 wall, 2 hole, 3 goal, 4 spawn.

use crate::{error::EngineError, physics::TileGrid};

pub const LEVEL_1: &[&[u8]] = &[
    &[1, 1, 1, 1, 1, 1, 1],
    &[1, 4, 0, 0, 0, 0, 1],
    &[1, 1, 1, 1, 1, 0, 1],
    &[1, 3, 0, 0, 0, 0, 1],
    &[1, 1, 1, 1, 1, 1, 1],
];

pub const LEVEL_2: &[&[u8]] = &[
    &[1, 1, 1, 1, 1, 1, 1, 1],
    &[1, 4, 0, 2, 0, 0, 0, 1],
    &[1, 0, 1, 1, 1, 1, 0, 1],
    &[1, 0, 2, 2, 0, 1, 0, 1],
    &[1, 0, 0, 0, 0, 2, 0, 1],
    &[1, 1, 1, 1, 0, 1, 1, 1],
    &[2, 2, 2, 1, 3, 1, 2, 2],
    &[2, 2, 2, 1, 1, 1, 2, 2],
];

pub const LEVEL_3: &[&[u8]] = &[
    &[1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
    &[1, 4, 0, 0, 2, 0, 0, 0, 0, 1],
    &[1, 1, 1, 0, 1, 1, 2, 1, 0, 1],
    &[1, 0, 0, 0, 1, 0, 0, 1, 0, 1],
    &[1, 0, 2, 2, 1, 0, 1, 1, 0, 1],
    &[1, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    &[1, 1, 1, 0, 0, 0, 1, 0, 1, 1],
    &[1, 3, 0, 0, 2, 0, 0, 0, 0, 1],
    &[1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
];

/// All built-in levels in play order.
pub fn default_levels() -> Result<Vec<TileGrid>, EngineError> {
    [LEVEL_1, LEVEL_2, LEVEL_3]
        .into_iter()
        .map(TileGrid::from_codes)
        .collect()
}
