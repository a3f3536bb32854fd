//! Keyboard state shared by the camera and the player behavior.

use std::collections::HashSet;

use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

/// Keys currently held, plus keys that went down since the last frame.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    held: HashSet<KeyCode>,
    pressed: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: KeyCode) {
        if self.held.insert(key) {
            self.pressed.insert(key);
        }
    }

    pub fn release(&mut self, key: KeyCode) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// True only in the first frame after `key` went down. Key repeat doesn't count.
    pub fn just_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    /// `1.0` if `positive` is held, `-1.0` if `negative` is, `0.0` for both or neither.
    pub fn axis(&self, negative: KeyCode, positive: KeyCode) -> f32 {
        let mut value = 0.0;
        if self.is_held(positive) {
            value += 1.0;
        }
        if self.is_held(negative) {
            value -= 1.0;
        }
        value
    }

    /// Forgets the keys pressed this frame. Call once after the frame's updates ran.
    pub fn end_frame(&mut self) {
        self.pressed.clear();
    }

    /// Feeds a winit window event. Returns true if it was a keyboard event.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => {
                match state {
                    ElementState::Pressed => self.press(*key),
                    ElementState::Released => self.release(*key),
                }
                true
            }
            WindowEvent::Focused(false) => {
                self.held.clear();
                false
            }
            _ => false,
        }
    }
}
