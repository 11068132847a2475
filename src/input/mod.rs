use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::keybindings::Modifiers;

/// Tracks current input state (keys held, mouse position, etc.)
#[derive(Default)]
pub struct InputState {
    pub mouse_pos: Vec2,
    pub mouse_delta: Vec2,
    pub left_pressed: bool,
    pub right_pressed: bool,
    pub middle_pressed: bool,
    /// True for one frame when button first pressed
    pub left_just_clicked: bool,
    pub left_just_released: bool,
    pub scroll_delta: f32,
    keys_held: HashSet<KeyCode>,
    keys_just_pressed: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call at the start of each frame to clear per-frame state.
    pub fn begin_frame(&mut self) {
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
        self.left_just_clicked = false;
        self.left_just_released = false;
        self.keys_just_pressed.clear();
    }

    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let new_pos = Vec2::new(position.x as f32, position.y as f32);
                self.mouse_delta += new_pos - self.mouse_pos;
                self.mouse_pos = new_pos;
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let pressed = *state == ElementState::Pressed;
                match button {
                    MouseButton::Left => {
                        if pressed && !self.left_pressed {
                            self.left_just_clicked = true;
                        }
                        if !pressed && self.left_pressed {
                            self.left_just_released = true;
                        }
                        self.left_pressed = pressed;
                    }
                    MouseButton::Right => self.right_pressed = pressed,
                    MouseButton::Middle => self.middle_pressed = pressed,
                    _ => {}
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 120.0,
                };
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    if event.state == ElementState::Pressed {
                        if !self.keys_held.contains(&key) {
                            self.keys_just_pressed.insert(key);
                        }
                        self.keys_held.insert(key);
                    } else {
                        self.keys_held.remove(&key);
                    }
                }
            }
            WindowEvent::Focused(false) => {
                // Releases are not delivered while unfocused.
                self.keys_held.clear();
                self.left_pressed = false;
                self.right_pressed = false;
                self.middle_pressed = false;
            }
            _ => {}
        }
    }

    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn key_just_pressed(&self, key: KeyCode) -> bool {
        self.keys_just_pressed.contains(&key)
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers {
            ctrl: self.key_held(KeyCode::ControlLeft) || self.key_held(KeyCode::ControlRight),
            shift: self.key_held(KeyCode::ShiftLeft) || self.key_held(KeyCode::ShiftRight),
            alt: self.key_held(KeyCode::AltLeft) || self.key_held(KeyCode::AltRight),
        }
    }
}
