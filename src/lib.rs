//! cube-maze
//!
//! An instanced tile maze with a grid-physics player cube. The engine part of
//! the crate maps object types (geometry + shader + attribute schema) to
//! instanced GPU buffers, runs per-instance behaviors and components once per
//! frame and issues one instanced draw call per object. The game part builds
//! levels out of tile grids on top of it.
//!
//! High-level modules
//! - `registry`: object registry, loading and deleting object types and instances
//! - `scheduler`: ordered per-frame update tasks and the frame context
//! - `component`: component and behavior traits
//! - `physics`: tile grid and grid collision
//! - `render`: draw dispatch
//! - `gpu`: GPU buffer API, with a wgpu and a headless recording backend
//! - `context`: window surface and device for the wgpu backend
//! - `camera`: orbit and first-person camera
//! - `game`: levels, map loader, player and the play session
//! - `flow`: the winit event loop
//!

pub mod camera;
pub mod component;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod game;
pub mod gpu;
pub mod input;
pub mod physics;
pub mod registry;
pub mod render;
pub mod scheduler;
pub mod shader;
pub mod time;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use error::EngineError;
pub use winit::keyboard::KeyCode;
