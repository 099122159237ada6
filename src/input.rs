use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Per-frame keyboard and mouse state.
///
/// Window events feed in through [`Input::handle_event`]; the render loop reads
/// the accumulated state and calls [`Input::begin_frame`] once the frame is done.
#[derive(Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    buttons_down: HashSet<MouseButton>,
    cursor: Option<Vec2>,
    mouse_delta: Vec2,
    scroll_delta: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset per-frame state.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    /// Process a window event and update input state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => self.press_key(key),
                        ElementState::Released => self.release_key(key),
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => self.press_button(*button),
                ElementState::Released => self.release_button(*button),
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.move_cursor(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let d = match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                    MouseScrollDelta::PixelDelta(pos) => {
                        Vec2::new(pos.x as f32, pos.y as f32) / 120.0
                    }
                };
                self.scroll(d);
            }
            _ => {}
        }
    }

    pub fn press_key(&mut self, key: KeyCode) {
        // OS key repeat sends Pressed again while held; only the first counts.
        if self.keys_down.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    pub fn release_key(&mut self, key: KeyCode) {
        self.keys_down.remove(&key);
    }

    pub fn press_button(&mut self, button: MouseButton) {
        self.buttons_down.insert(button);
    }

    pub fn release_button(&mut self, button: MouseButton) {
        self.buttons_down.remove(&button);
    }

    /// Record a new cursor position. The first position after entering the
    /// window produces no delta.
    pub fn move_cursor(&mut self, position: Vec2) {
        if let Some(previous) = self.cursor {
            self.mouse_delta += position - previous;
        }
        self.cursor = Some(position);
    }

    pub fn scroll(&mut self, delta: Vec2) {
        self.scroll_delta += delta;
    }

    /// Returns true if the key was pressed this frame.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Returns true if the mouse button is currently held down.
    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    /// Cursor movement this frame, in physical pixels.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Scroll wheel delta this frame (in "lines").
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_press_lasts_one_frame() {
        let mut input = Input::new();
        input.press_key(KeyCode::Space);
        assert!(input.key_pressed(KeyCode::Space));

        input.begin_frame();
        input.press_key(KeyCode::Space); // auto-repeat while held
        assert!(!input.key_pressed(KeyCode::Space));

        input.release_key(KeyCode::Space);
        input.press_key(KeyCode::Space);
        assert!(input.key_pressed(KeyCode::Space));
    }

    #[test]
    fn cursor_delta_accumulates_and_resets() {
        let mut input = Input::new();
        input.move_cursor(Vec2::new(100.0, 100.0));
        assert_eq!(input.mouse_delta(), Vec2::ZERO);

        input.move_cursor(Vec2::new(110.0, 95.0));
        input.move_cursor(Vec2::new(115.0, 90.0));
        assert_eq!(input.mouse_delta(), Vec2::new(15.0, -10.0));

        input.begin_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
    }

    #[test]
    fn buttons_and_scroll() {
        let mut input = Input::new();
        input.press_button(MouseButton::Right);
        input.scroll(Vec2::new(0.0, 1.0));
        input.scroll(Vec2::new(0.0, 2.0));
        assert!(input.mouse_down(MouseButton::Right));
        assert_eq!(input.scroll_delta(), Vec2::new(0.0, 3.0));

        input.begin_frame();
        assert!(input.mouse_down(MouseButton::Right));
        assert_eq!(input.scroll_delta(), Vec2::ZERO);

        input.release_button(MouseButton::Right);
        assert!(!input.mouse_down(MouseButton::Right));
    }
}
