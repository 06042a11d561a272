use std::collections::HashSet;

use winit::keyboard::KeyCode;

/// What the player asked for since the last tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Intent {
    pub forward: f32, // -1 back .. 1 forward
    pub strafe: f32,  // -1 left .. 1 right
    pub turn: f32,    // keyboard turn, -1 left .. 1 right
    pub look: f32,    // mouse motion in pixels, positive to the right
    pub fire: bool,
}

/// Raw key and mouse state collected from window events.
#[derive(Debug, Default)]
pub struct InputState {
    keys_down: HashSet<KeyCode>,
    fire_pressed: bool,
    mouse_dx: f64,
    captured: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a key transition. Returns true when the mouse capture
    /// state flipped and the window grab should follow.
    pub fn key(&mut self, code: KeyCode, pressed: bool) -> bool {
        if !pressed {
            self.keys_down.remove(&code);
            return false;
        }
        // ignore auto-repeat
        if !self.keys_down.insert(code) {
            return false;
        }
        match code {
            KeyCode::Space => self.fire_pressed = true,
            KeyCode::Escape => {
                self.captured = !self.captured;
                return true;
            }
            _ => {}
        }
        false
    }

    /// Relative mouse motion, only counted while the cursor is captured.
    pub fn mouse_motion(&mut self, dx: f64) {
        if self.captured {
            self.mouse_dx += dx;
        }
    }

    pub fn captured(&self) -> bool {
        self.captured
    }

    pub fn set_captured(&mut self, captured: bool) {
        self.captured = captured;
        if !captured {
            self.mouse_dx = 0.0;
        }
    }

    /// Drops every held key, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.keys_down.clear();
        self.fire_pressed = false;
    }

    pub fn is_down(&self, code: KeyCode) -> bool {
        self.keys_down.contains(&code)
    }

    /// Builds this tick's intent and consumes one-shot input.
    pub fn take_intent(&mut self) -> Intent {
        let axis = |pos: &[KeyCode], neg: &[KeyCode]| -> f32 {
            let held = |keys: &[KeyCode]| keys.iter().any(|k| self.keys_down.contains(k));
            held(pos) as i32 as f32 - held(neg) as i32 as f32
        };

        let intent = Intent {
            forward: axis(&[KeyCode::KeyW, KeyCode::ArrowUp], &[KeyCode::KeyS, KeyCode::ArrowDown]),
            strafe: axis(&[KeyCode::KeyD], &[KeyCode::KeyA]),
            turn: axis(
                &[KeyCode::KeyE, KeyCode::ArrowRight],
                &[KeyCode::KeyQ, KeyCode::ArrowLeft],
            ),
            look: self.mouse_dx as f32,
            fire: self.fire_pressed,
        };
        self.fire_pressed = false;
        self.mouse_dx = 0.0;
        intent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_keys_map_to_axes() {
        let mut input = InputState::new();
        input.key(KeyCode::KeyW, true);
        input.key(KeyCode::KeyA, true);
        input.key(KeyCode::ArrowRight, true);
        let intent = input.take_intent();
        assert_eq!(intent.forward, 1.0);
        assert_eq!(intent.strafe, -1.0);
        assert_eq!(intent.turn, 1.0);
        assert!(!intent.fire);

        // still held on the next tick
        assert_eq!(input.take_intent().forward, 1.0);
        input.key(KeyCode::KeyW, false);
        assert_eq!(input.take_intent().forward, 0.0);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut input = InputState::new();
        input.key(KeyCode::KeyW, true);
        input.key(KeyCode::ArrowDown, true);
        assert_eq!(input.take_intent().forward, 0.0);
    }

    #[test]
    fn fire_is_edge_triggered() {
        let mut input = InputState::new();
        input.key(KeyCode::Space, true);
        assert!(input.take_intent().fire);
        // held, not pressed again
        assert!(!input.take_intent().fire);
        input.key(KeyCode::Space, true);
        assert!(!input.take_intent().fire);

        input.key(KeyCode::Space, false);
        input.key(KeyCode::Space, true);
        assert!(input.take_intent().fire);
    }

    #[test]
    fn escape_toggles_capture_and_gates_mouse() {
        let mut input = InputState::new();
        input.mouse_motion(10.0);
        assert_eq!(input.take_intent().look, 0.0);

        assert!(input.key(KeyCode::Escape, true));
        assert!(input.captured());
        input.key(KeyCode::Escape, false);

        input.mouse_motion(10.0);
        input.mouse_motion(-4.0);
        assert_eq!(input.take_intent().look, 6.0);
        assert_eq!(input.take_intent().look, 0.0);

        assert!(input.key(KeyCode::Escape, true));
        assert!(!input.captured());
    }

    #[test]
    fn release_all_clears_held_keys() {
        let mut input = InputState::new();
        input.key(KeyCode::KeyD, true);
        input.key(KeyCode::Space, true);
        input.release_all();
        assert!(!input.is_down(KeyCode::KeyD));
        assert_eq!(input.take_intent(), Intent::default());
    }
}
