use cgmath::Vector3;
use winit::keyboard::KeyCode;

use crate::{component::Behavior, data_structures::instance::InstanceMut, scheduler::FrameContext};

/// Tilts the player's gravity with `W`/`A`/`S`/`D`. `W` pushes towards -z,
/// away from the default camera.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerControl {
    base_gravity: Vector3<f32>,
    tilt: f32,
}

impl PlayerControl {
    pub fn new(base_gravity: Vector3<f32>, tilt: f32) -> Self {
        Self { base_gravity, tilt }
    }
}

impl Behavior for PlayerControl {
    fn update(&mut self, frame: &mut FrameContext<'_>, instance: &mut InstanceMut<'_>) {
        let input = frame.input;
        instance.state.gravity = self.base_gravity
            + Vector3::new(
                input.axis(KeyCode::KeyA, KeyCode::KeyD) * self.tilt,
                0.0,
                input.axis(KeyCode::KeyW, KeyCode::KeyS) * self.tilt,
            );
    }
}
