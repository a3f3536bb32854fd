//! One play session: the current level, the death counter and the objects
//! that make up the level on screen.
//!
//! `Playing -> fall below the death height -> respawn -> Playing` is handled by
//! the physics component; this type counts the death. `Playing -> goal ->
//! next level` tears the level down and loads the next one. Past the last
//! level the [`LevelOverflowPolicy`] decides.

use cgmath::Vector3;
use winit::keyboard::KeyCode;

use crate::{
    camera::{Camera, CameraUniform, Projection},
    config::{GameConfig, LevelOverflowPolicy},
    data_structures::{
        instance::{InstanceId, TRANSFORM},
        object::ObjectId,
    },
    error::EngineError,
    game::{
        hud::{HudSink, complete_text, hud_text},
        levels,
        map_loader::{load_map, player_object, spawn_point},
    },
    gpu::GpuBackend,
    input::InputState,
    physics::TileGrid,
    registry::ObjectRegistry,
    render,
    scheduler::{FrameContext, FrameEvent, Scheduler},
    shader::ShaderProgram,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Playing,
    /// The last level was finished under [`LevelOverflowPolicy::Complete`].
    Complete,
}

/// Where finishing `current` leads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelStep {
    Load(usize),
    Complete,
}

pub fn next_level(current: usize, levels: usize, policy: LevelOverflowPolicy) -> LevelStep {
    if current + 1 < levels {
        return LevelStep::Load(current + 1);
    }
    match policy {
        LevelOverflowPolicy::Complete => LevelStep::Complete,
        LevelOverflowPolicy::Clamp => LevelStep::Load(levels.saturating_sub(1)),
        LevelOverflowPolicy::Wrap => LevelStep::Load(0),
    }
}

/// What happened during one [`Game::frame`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub updates: usize,
    pub draws: usize,
    pub died: bool,
    pub won: bool,
}

pub struct Game<H: HudSink> {
    pub config: GameConfig,
    levels: Vec<TileGrid>,
    level: usize,
    deaths: u32,
    phase: Phase,
    registry: ObjectRegistry,
    scheduler: Scheduler,
    shader: ShaderProgram,
    camera: Camera,
    projection: Projection,
    map: Option<ObjectId>,
    player: Option<(ObjectId, InstanceId)>,
    hud: H,
}

impl<H: HudSink> Game<H> {
    pub fn new(
        config: GameConfig,
        levels: Vec<TileGrid>,
        hud: H,
        width: u32,
        height: u32,
    ) -> Result<Self, EngineError> {
        if levels.is_empty() {
            return Err(EngineError::EmptyLevelSet);
        }
        if config.start_level >= levels.len() {
            return Err(EngineError::LevelOverflow {
                level: config.start_level,
                levels: levels.len(),
            });
        }
        let projection = Projection::from_config(width, height, &config);
        Ok(Self {
            level: config.start_level,
            config,
            levels,
            deaths: 0,
            phase: Phase::Playing,
            registry: ObjectRegistry::new(),
            scheduler: Scheduler::new(),
            shader: ShaderProgram::maze(),
            camera: Camera::new(),
            projection,
            map: None,
            player: None,
            hud,
        })
    }

    /// A game over the built-in levels.
    pub fn with_default_levels(
        config: GameConfig,
        hud: H,
        width: u32,
        height: u32,
    ) -> Result<Self, EngineError> {
        Self::new(config, levels::default_levels()?, hud, width, height)
    }

    /// Replaces whatever is loaded with the current level: maze, player and camera.
    pub fn load_level(&mut self, gpu: &mut dyn GpuBackend) -> Result<(), EngineError> {
        self.unload(gpu)?;
        let grid = &self.levels[self.level];
        self.map = load_map(
            &mut self.registry,
            &mut self.scheduler,
            gpu,
            &self.shader,
            grid,
        )?;
        let spawn = spawn_point(grid, &self.config);
        let player = self.registry.load_object(
            gpu,
            &mut self.scheduler,
            &self.shader,
            player_object(spawn, &self.config),
        )?;
        let instance = self
            .registry
            .get(player)
            .and_then(|object| object.instance_ids().first().copied())
            .ok_or(EngineError::UnknownInstance)?;
        self.player = Some((player, instance));
        self.camera.reset_for_map(grid, &self.config);
        self.phase = Phase::Playing;
        log::info!(
            "level {} loaded ({}x{})",
            self.level + 1,
            grid.rows(),
            grid.cols()
        );
        self.hud.show(&hud_text(self.level, self.deaths));
        Ok(())
    }

    fn unload(&mut self, gpu: &mut dyn GpuBackend) -> Result<(), EngineError> {
        if let Some((player, _)) = self.player.take() {
            self.registry.delete_object(gpu, &mut self.scheduler, player)?;
        }
        if let Some(map) = self.map.take() {
            self.registry.delete_object(gpu, &mut self.scheduler, map)?;
        }
        Ok(())
    }

    /// Runs one frame: keyboard shortcuts, every scheduled update, level
    /// transitions, the camera, then one draw per object.
    pub fn frame(
        &mut self,
        gpu: &mut dyn GpuBackend,
        delta_time: f32,
        elapsed: f64,
        input: &InputState,
    ) -> Result<FrameReport, EngineError> {
        if input.just_pressed(KeyCode::KeyR) {
            log::info!("restarting level {}", self.level + 1);
            self.load_level(gpu)?;
        }
        if input.just_pressed(KeyCode::KeyC) {
            self.camera.toggle_mode();
        }

        let mut report = FrameReport::default();
        let events = {
            let mut frame = FrameContext::new(
                delta_time,
                elapsed,
                input,
                self.levels.get(self.level),
            );
            report.updates = self.scheduler.run(&mut self.registry, gpu, &mut frame);
            frame.take_events()
        };

        for event in events {
            match event {
                FrameEvent::Died { .. } => {
                    self.deaths += 1;
                    report.died = true;
                    log::info!("died, {} deaths so far", self.deaths);
                    self.hud.show(&hud_text(self.level, self.deaths));
                }
                FrameEvent::Won { .. } => {
                    report.won = true;
                    self.advance(gpu)?;
                    // Events of the torn-down level are meaningless now.
                    break;
                }
            }
        }

        let player = self.player_position();
        self.camera
            .update(input, player, delta_time, self.config.camera_speed);
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&self.camera, &self.projection);
        gpu.write_camera(&uniform);

        report.draws = render::draw_objects(&mut self.registry, gpu);
        Ok(report)
    }

    fn advance(&mut self, gpu: &mut dyn GpuBackend) -> Result<(), EngineError> {
        if self.phase == Phase::Complete {
            return Ok(());
        }
        match next_level(self.level, self.levels.len(), self.config.overflow) {
            LevelStep::Load(next) => {
                log::info!("level {} complete", self.level + 1);
                self.level = next;
                self.load_level(gpu)
            }
            LevelStep::Complete => {
                log::info!("all {} levels complete", self.levels.len());
                self.phase = Phase::Complete;
                self.hud.show(&complete_text(self.deaths));
                Ok(())
            }
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
    }

    pub fn player_position(&self) -> Option<Vector3<f32>> {
        let (object, instance) = self.player?;
        self.registry
            .get(object)?
            .instance_attribute(instance, TRANSFORM)
            .map(|m| Vector3::new(m[12], m[13], m[14]))
    }

    /// Zero-based index of the current level.
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn grid(&self) -> &TileGrid {
        &self.levels[self.level]
    }

    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn player(&self) -> Option<(ObjectId, InstanceId)> {
        self.player
    }

    pub fn map(&self) -> Option<ObjectId> {
        self.map
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ObjectRegistry {
        &mut self.registry
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn hud(&self) -> &H {
        &self.hud
    }

    pub fn shader(&self) -> &ShaderProgram {
        &self.shader
    }
}
