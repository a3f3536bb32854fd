//! Orbit and first-person camera over the maze, plus its GPU uniform.
//!
//! The camera is owned by the game session and only read by the render step,
//! which turns it into a [`CameraUniform`] once per frame.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use winit::keyboard::KeyCode;

use crate::{config::GameConfig, input::InputState, physics::TileGrid};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const ORBIT_PITCH_LIMITS: (f32, f32) = (0.15, 1.5);
const LOOK_PITCH_LIMITS: (f32, f32) = (-1.3, 1.3);
const ZOOM_STEP: f32 = 0.05;
const MIN_DISTANCE: f32 = 2.0;
/// Eye height above the player's centre in first-person mode.
const EYE_HEIGHT: f32 = 0.2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMode {
    Orbit,
    FirstPerson,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub mode: CameraMode,
    /// Orbit centre; the map centre after a level load.
    pub target: Point3<f32>,
    /// Angle around the vertical axis, shared by both modes.
    pub yaw: Rad<f32>,
    /// Orbit elevation above the floor plane.
    pub pitch: Rad<f32>,
    /// First-person look pitch, negative looks down.
    pub look_pitch: Rad<f32>,
    pub distance: f32,
    eye: Point3<f32>,
    forward: Vector3<f32>,
}

impl Camera {
    pub fn new() -> Self {
        let mut camera = Self {
            mode: CameraMode::Orbit,
            target: Point3::new(0.0, 0.0, 0.0),
            yaw: Rad(std::f32::consts::FRAC_PI_2),
            pitch: Rad(1.0),
            look_pitch: Rad(-0.3),
            distance: 10.0,
            eye: Point3::new(0.0, 0.0, 0.0),
            forward: -Vector3::unit_z(),
        };
        camera.update_eye(None);
        camera
    }

    /// Frames the whole map from the south side, in orbit mode.
    pub fn reset_for_map(&mut self, grid: &TileGrid, config: &GameConfig) {
        let center = grid.center();
        self.mode = CameraMode::Orbit;
        self.target = Point3::new(center.x, center.y, center.z);
        self.yaw = Rad(std::f32::consts::FRAC_PI_2);
        self.pitch = Rad(1.0);
        self.look_pitch = Rad(-0.3);
        self.distance = (grid.rows().max(grid.cols()) as f32 * config.orbit_distance).max(MIN_DISTANCE);
        self.update_eye(None);
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            CameraMode::Orbit => CameraMode::FirstPerson,
            CameraMode::FirstPerson => CameraMode::Orbit,
        };
        log::debug!("camera mode {:?}", self.mode);
    }

    /// Arrow keys turn the camera, `Q`/`E` zoom the orbit. `player` is the
    /// first-person eye anchor.
    pub fn update(&mut self, input: &InputState, player: Option<Vector3<f32>>, dt: f32, speed: f32) {
        let step = speed * dt;
        self.yaw += Rad(input.axis(KeyCode::ArrowLeft, KeyCode::ArrowRight) * step);
        let tilt = input.axis(KeyCode::ArrowDown, KeyCode::ArrowUp) * step;
        match self.mode {
            CameraMode::Orbit => {
                self.pitch = Rad((self.pitch.0 + tilt).clamp(ORBIT_PITCH_LIMITS.0, ORBIT_PITCH_LIMITS.1));
                let zoom = input.axis(KeyCode::KeyQ, KeyCode::KeyE);
                self.distance = (self.distance * (1.0 - zoom * ZOOM_STEP * dt)).max(MIN_DISTANCE);
            }
            CameraMode::FirstPerson => {
                self.look_pitch =
                    Rad((self.look_pitch.0 + tilt).clamp(LOOK_PITCH_LIMITS.0, LOOK_PITCH_LIMITS.1));
            }
        }
        self.update_eye(player);
    }

    fn update_eye(&mut self, player: Option<Vector3<f32>>) {
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        match (self.mode, player) {
            (CameraMode::FirstPerson, Some(player)) => {
                let (sin_pitch, cos_pitch) = self.look_pitch.0.sin_cos();
                self.eye = Point3::new(player.x, player.y + EYE_HEIGHT, player.z);
                // Looks away from where the orbit camera would sit.
                self.forward =
                    Vector3::new(-cos_yaw * cos_pitch, sin_pitch, -sin_yaw * cos_pitch).normalize();
            }
            _ => {
                let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
                let offset = Vector3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch);
                self.eye = self.target + offset * self.distance;
                self.forward = -offset;
            }
        }
    }

    pub fn eye(&self) -> Point3<f32> {
        self.eye
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.eye, self.forward, Vector3::unit_y())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn from_config(width: u32, height: u32, config: &GameConfig) -> Self {
        Self::new(width, height, cgmath::Deg(config.fovy_degrees), config.znear, config.zfar)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Layout of the `camera` uniform in `maze.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}
