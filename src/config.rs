//! Runtime knobs for physics, timing, camera and level progression.

use std::str::FromStr;

use cgmath::Vector3;

use crate::{physics::DEATH_HEIGHT, time::NOMINAL_FRAME_MS};

/// What happens when the goal of the last level is reached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LevelOverflowPolicy {
    /// Stop in a terminal "game complete" state.
    #[default]
    Complete,
    /// Replay the last level.
    Clamp,
    /// Start over at the first level.
    Wrap,
}

impl FromStr for LevelOverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "complete" => Ok(Self::Complete),
            "clamp" => Ok(Self::Clamp),
            "wrap" => Ok(Self::Wrap),
            other => Err(format!("unknown level overflow policy `{}`", other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    /// Acceleration per nominal frame squared.
    pub gravity: Vector3<f32>,
    pub linear_drag: f32,
    /// Horizontal gravity added while a tilt key is held.
    pub tilt_strength: f32,
    /// Milliseconds that count as one unit of delta time.
    pub delta_divisor_ms: f64,
    pub death_height: f32,
    pub clear_color: wgpu::Color,
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Orbit distance relative to the larger map dimension.
    pub orbit_distance: f32,
    /// Radians per nominal frame while a camera key is held.
    pub camera_speed: f32,
    /// Height of the player cube's centre when spawned.
    pub spawn_height: f32,
    /// Zero-based index of the first level played.
    pub start_level: usize,
    pub overflow: LevelOverflowPolicy,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            gravity: Vector3::new(0.0, -0.01, 0.0),
            linear_drag: 0.9,
            tilt_strength: 0.005,
            delta_divisor_ms: NOMINAL_FRAME_MS,
            death_height: DEATH_HEIGHT,
            clear_color: wgpu::Color {
                r: 0.0,
                g: 0.0,
                b: 0.0,
                a: 1.0,
            },
            fovy_degrees: 45.0,
            znear: 0.1,
            zfar: 100.0,
            orbit_distance: 1.2,
            camera_speed: 0.03,
            spawn_height: 0.25,
            start_level: 0,
            overflow: LevelOverflowPolicy::default(),
        }
    }
}

impl GameConfig {
    /// Defaults, with `CUBE_MAZE_LEVEL` (1-based) and `CUBE_MAZE_OVERFLOW`
    /// (`complete`, `clamp` or `wrap`) applied when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(level) = std::env::var("CUBE_MAZE_LEVEL") {
            match level.parse::<usize>() {
                Ok(level) if level > 0 => config.start_level = level - 1,
                _ => log::warn!("ignoring CUBE_MAZE_LEVEL={}, expected a level number", level),
            }
        }
        if let Ok(policy) = std::env::var("CUBE_MAZE_OVERFLOW") {
            match policy.parse() {
                Ok(policy) => config.overflow = policy,
                Err(e) => log::warn!("ignoring CUBE_MAZE_OVERFLOW: {}", e),
            }
        }
        config
    }
}
