//! The cube maze game built on the engine: levels, the map loader, the player
//! cube and the play session tying them together.

pub mod hud;
pub mod levels;
pub mod map_loader;
pub mod player;
pub mod session;

pub use hud::{HudSink, LogHud, MemoryHud};
pub use session::{FrameReport, Game, LevelStep, Phase, next_level};
