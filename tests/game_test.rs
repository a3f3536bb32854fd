use cube_maze::{
    EngineError, KeyCode,
    cgmath::Vector3,
    config::{GameConfig, LevelOverflowPolicy},
    game::{Game, LevelStep, MemoryHud, Phase, next_level},
    gpu::RecordingGpu,
    input::InputState,
    physics::TileGrid,
};

use crate::common::test_utils::{grid, init_logger};

mod common;

/// Spawn at (1, 1), goal right next to it at (1, 2).
fn tiny_level() -> TileGrid {
    grid(&[&[1, 1, 1, 1], &[1, 4, 3, 1], &[1, 1, 1, 1]])
}

fn game(policy: LevelOverflowPolicy) -> (Game<MemoryHud>, RecordingGpu) {
    init_logger();
    let config = GameConfig {
        overflow: policy,
        ..GameConfig::default()
    };
    let levels = vec![tiny_level(), tiny_level(), tiny_level()];
    let mut game = Game::new(config, levels, MemoryHud::default(), 800, 600).unwrap();
    let mut gpu = RecordingGpu::new();
    game.load_level(&mut gpu).unwrap();
    (game, gpu)
}

fn teleport(game: &mut Game<MemoryHud>, to: Vector3<f32>) {
    let (object, instance) = game.player().unwrap();
    game.registry_mut()
        .get_mut(object)
        .unwrap()
        .instance_mut(instance)
        .unwrap()
        .set_translation(to);
}

fn finish_level(game: &mut Game<MemoryHud>, gpu: &mut RecordingGpu) -> bool {
    teleport(game, Vector3::new(2.0, 0.25, 1.0));
    game.frame(gpu, 1.0, 0.0, &InputState::new()).unwrap().won
}

#[test]
fn next_level_policies() {
    use LevelOverflowPolicy::*;
    assert_eq!(next_level(0, 3, Complete), LevelStep::Load(1));
    assert_eq!(next_level(1, 3, Wrap), LevelStep::Load(2));
    assert_eq!(next_level(2, 3, Complete), LevelStep::Complete);
    assert_eq!(next_level(2, 3, Clamp), LevelStep::Load(2));
    assert_eq!(next_level(2, 3, Wrap), LevelStep::Load(0));
}

#[test]
fn finishing_the_last_level_completes_the_game() {
    let (mut game, mut gpu) = game(LevelOverflowPolicy::Complete);

    for expected in 1..3 {
        assert!(finish_level(&mut game, &mut gpu));
        assert_eq!(game.level(), expected);
        assert_eq!(game.phase(), Phase::Playing);
    }
    assert!(finish_level(&mut game, &mut gpu));

    assert_eq!(game.level(), 2);
    assert_eq!(game.phase(), Phase::Complete);
    assert_eq!(game.hud().last(), Some("All levels complete | Deaths 0"));

    // Standing on the goal afterwards changes nothing.
    for _ in 0..5 {
        let report = game.frame(&mut gpu, 1.0, 0.0, &InputState::new()).unwrap();
        assert!(!report.won);
        assert_eq!(report.draws, 2);
    }
    assert_eq!(game.level(), 2);
}

#[test]
fn clamp_replays_the_last_level() {
    let (mut game, mut gpu) = game(LevelOverflowPolicy::Clamp);
    for _ in 0..3 {
        assert!(finish_level(&mut game, &mut gpu));
    }

    assert_eq!(game.level(), 2);
    assert_eq!(game.phase(), Phase::Playing);
    let spawn = Vector3::new(1.0, GameConfig::default().spawn_height, 1.0);
    assert_eq!(game.player_position(), Some(spawn));
}

#[test]
fn wrap_starts_over() {
    let (mut game, mut gpu) = game(LevelOverflowPolicy::Wrap);
    for _ in 0..3 {
        assert!(finish_level(&mut game, &mut gpu));
    }

    assert_eq!(game.level(), 0);
    assert_eq!(game.hud().last(), Some("Level 1 | Deaths 0"));
}

#[test]
fn level_transition_replaces_the_level_objects() {
    let (mut game, mut gpu) = game(LevelOverflowPolicy::Complete);
    let first_map = game.map().unwrap();
    let tasks = game.scheduler().len();

    assert!(finish_level(&mut game, &mut gpu));

    assert_eq!(game.registry().len(), 2);
    assert!(game.registry().get(first_map).is_none());
    assert_eq!(game.scheduler().len(), tasks);
    // four attributes and an index buffer each
    assert_eq!(gpu.live_buffers(), 10);
    assert_eq!(gpu.live_pipelines(), 2);
}

#[test]
fn each_fall_counts_one_death() {
    let (mut game, mut gpu) = game(LevelOverflowPolicy::Complete);
    let input = InputState::new();
    let spawn = game.player_position().unwrap();
    assert_eq!(game.hud().last(), Some("Level 1 | Deaths 0"));

    teleport(&mut game, Vector3::new(1.0, -3.5, 1.0));
    let report = game.frame(&mut gpu, 1.0, 0.0, &input).unwrap();

    assert!(report.died);
    assert_eq!(game.deaths(), 1);
    assert_eq!(game.player_position(), Some(spawn));
    assert_eq!(game.hud().last(), Some("Level 1 | Deaths 1"));

    for _ in 0..10 {
        assert!(!game.frame(&mut gpu, 1.0, 0.0, &input).unwrap().died);
    }
    assert_eq!(game.deaths(), 1);

    teleport(&mut game, Vector3::new(1.0, -4.0, 1.0));
    game.frame(&mut gpu, 1.0, 0.0, &input).unwrap();
    assert_eq!(game.deaths(), 2);
    assert_eq!(game.level(), 0);
}

#[test]
fn restart_key_reloads_the_level() {
    let (mut game, mut gpu) = game(LevelOverflowPolicy::Complete);
    let spawn = game.player_position().unwrap();
    let first_player = game.player().unwrap();
    teleport(&mut game, Vector3::new(1.2, 0.25, 1.0));

    let mut input = InputState::new();
    input.press(KeyCode::KeyR);
    game.frame(&mut gpu, 1.0, 0.0, &input).unwrap();

    assert_ne!(game.player(), Some(first_player));
    assert_eq!(game.player_position(), Some(spawn));
    assert_eq!(game.level(), 0);
    assert_eq!(game.deaths(), 0);
}

#[test]
fn every_frame_draws_both_objects_and_updates_the_camera() {
    let (mut game, mut gpu) = game(LevelOverflowPolicy::Complete);
    gpu.clear_ops();

    let report = game.frame(&mut gpu, 1.0, 0.0, &InputState::new()).unwrap();

    assert_eq!(report.draws, 2);
    // player control, player physics, transform sync
    assert_eq!(report.updates, 3);
    let counts: Vec<u32> = gpu.draws().map(|d| d.instance_count).collect();
    assert_eq!(counts, vec![5 * 10 + 2, 1]);
    assert!(gpu.camera.is_some());
}

#[test]
fn holding_a_tilt_key_rolls_the_player() {
    init_logger();
    let levels = vec![grid(&[
        &[1, 1, 1, 1, 1, 1],
        &[1, 4, 0, 0, 0, 1],
        &[1, 1, 1, 1, 1, 1],
    ])];
    let mut game = Game::new(GameConfig::default(), levels, MemoryHud::default(), 640, 480).unwrap();
    let mut gpu = RecordingGpu::new();
    game.load_level(&mut gpu).unwrap();
    let start = game.player_position().unwrap();

    let mut input = InputState::new();
    input.press(KeyCode::KeyD);
    for _ in 0..20 {
        game.frame(&mut gpu, 1.0, 0.0, &input).unwrap();
        input.end_frame();
    }

    let end = game.player_position().unwrap();
    assert!(end.x > start.x);
    assert_eq!(end.z, start.z);
    assert_eq!(end.y, start.y);
}

#[test]
fn invalid_level_setups_are_rejected() {
    assert!(matches!(
        Game::new(GameConfig::default(), vec![], MemoryHud::default(), 1, 1),
        Err(EngineError::EmptyLevelSet)
    ));
    let config = GameConfig {
        start_level: 3,
        ..GameConfig::default()
    };
    assert!(matches!(
        Game::new(config, vec![tiny_level()], MemoryHud::default(), 1, 1),
        Err(EngineError::LevelOverflow { level: 3, levels: 1 })
    ));
}

#[test]
fn a_zero_width_window_still_renders_frames() {
    init_logger();
    let mut game = Game::new(
        GameConfig::default(),
        vec![tiny_level()],
        MemoryHud::default(),
        0,
        600,
    )
    .unwrap();
    let mut gpu = RecordingGpu::new();
    game.load_level(&mut gpu).unwrap();

    let report = game.frame(&mut gpu, 1.0, 0.0, &InputState::new()).unwrap();
    assert_eq!(report.draws, 2);

    game.resize(0, 0);
    assert!(game.frame(&mut gpu, 1.0, 0.0, &InputState::new()).is_ok());
}

#[test]
fn a_level_of_holes_plays_as_an_endless_fall() {
    init_logger();
    let levels = vec![grid(&[&[2, 2], &[2, 2]])];
    let mut game = Game::new(GameConfig::default(), levels, MemoryHud::default(), 640, 480).unwrap();
    let mut gpu = RecordingGpu::new();
    game.load_level(&mut gpu).unwrap();

    assert_eq!(game.map(), None);
    assert_eq!(game.registry().len(), 1);

    let input = InputState::new();
    let mut died = 0;
    for _ in 0..200 {
        let report = game.frame(&mut gpu, 1.0, 0.0, &input).unwrap();
        assert_eq!(report.draws, 1);
        died += report.died as u32;
    }
    assert!(died >= 1);
    assert_eq!(game.deaths(), died);
    assert_eq!(game.level(), 0);
}
