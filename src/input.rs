//! Input handling.
//!
//! [`Input`] folds raw winit window events into per-frame state and maps them
//! onto the scene's discrete triggers:
//!
//! | Input | Trigger |
//! |-------|---------|
//! | left click | [`Trigger::AdvanceShape`] |
//! | `Space` / `Enter` | [`Trigger::Explode`] |
//! | `Escape`, cursor leaving the window | [`Trigger::Cancel`] |
//!
//! The pointer position is tracked continuously in normalized device
//! coordinates (origin at the window centre, +Y up).

use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Discrete scene actions produced from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    AdvanceShape,
    Explode,
    Cancel,
}

/// Input state tracking for the scene window.
#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    left_pressed: bool,
    cursor_left: bool,

    mouse_position: Vec2,
    mouse_ndc: Vec2,

    window_size: (u32, u32),
}

impl Input {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            window_size: (width, height),
            ..Default::default()
        }
    }

    /// Whether a key went down this frame.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Pointer position in normalized device coordinates.
    pub fn mouse_ndc(&self) -> Vec2 {
        self.mouse_ndc
    }

    /// Triggers fired since the last [`Input::begin_frame`], in a fixed order.
    pub fn triggers(&self) -> Vec<Trigger> {
        let mut out = Vec::new();
        if self.key_pressed(KeyCode::Space) || self.key_pressed(KeyCode::Enter) {
            out.push(Trigger::Explode);
        }
        if self.left_pressed {
            out.push(Trigger::AdvanceShape);
        }
        if self.key_pressed(KeyCode::Escape) || self.cursor_left {
            out.push(Trigger::Cancel);
        }
        out
    }

    /// Clear per-frame state. Call after the frame's triggers were consumed.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.left_pressed = false;
        self.cursor_left = false;
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
        self.update_ndc();
    }

    fn update_ndc(&mut self) {
        let (w, h) = self.window_size;
        if w > 0 && h > 0 {
            self.mouse_ndc = Vec2::new(
                (self.mouse_position.x / w as f32) * 2.0 - 1.0,
                1.0 - (self.mouse_position.y / h as f32) * 2.0,
            );
        }
    }

    fn key_down(&mut self, key: KeyCode) {
        // No repeat: only the first press of a held key counts.
        if self.keys_held.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => self.key_down(key),
                        ElementState::Released => {
                            self.keys_held.remove(&key);
                        }
                    }
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                self.left_pressed = true;
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_position = Vec2::new(position.x as f32, position.y as f32);
                self.update_ndc();
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor_left = true;
            }
            WindowEvent::Resized(size) => {
                self.set_window_size(size.width, size.height);
            }
            _ => {}
        }
    }
}
