//! Local input actions driven by injected key events.

use crate::game::GameState;
use log::debug;
use pong_shared::KeyCode;
use std::collections::HashSet;

/// Receives synthesized key presses and releases.
pub trait InputSink {
    fn inject_key_down(&mut self, key: KeyCode);
    fn inject_key_up(&mut self, key: KeyCode);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddleAction {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub key: KeyCode,
    pub paddle: u8,
    pub action: PaddleAction,
}

/// Maps held keys onto paddle movement.
///
/// While a bound key is held its paddle moves every frame; once no key for a
/// paddle is held the paddle stops. If both directions are held, down wins.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: Vec<Binding>,
    held: HashSet<KeyCode>,
}

impl KeyBindings {
    /// `W`/`S` drive paddle 1, `I`/`K` drive paddle 2.
    pub fn new() -> Self {
        let mut bindings = Self {
            bindings: Vec::new(),
            held: HashSet::new(),
        };
        bindings.bind(KeyCode::new('W'), 1, PaddleAction::Up);
        bindings.bind(KeyCode::new('S'), 1, PaddleAction::Down);
        bindings.bind(KeyCode::new('I'), 2, PaddleAction::Up);
        bindings.bind(KeyCode::new('K'), 2, PaddleAction::Down);
        bindings
    }

    pub fn bind(&mut self, key: KeyCode, paddle: u8, action: PaddleAction) {
        self.bindings.retain(|b| b.key != key);
        self.bindings.push(Binding {
            key,
            paddle,
            action,
        });
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    fn action_held(&self, paddle: u8, action: PaddleAction) -> bool {
        self.bindings
            .iter()
            .any(|b| b.paddle == paddle && b.action == action && self.held.contains(&b.key))
    }

    /// Sets paddle velocities from the keys currently held.
    pub fn apply(&self, state: &mut GameState) {
        for number in [1, 2] {
            let up = self.action_held(number, PaddleAction::Up);
            let down = self.action_held(number, PaddleAction::Down);
            if let Some(paddle) = state.paddle_mut(number) {
                match (up, down) {
                    (_, true) => paddle.down(),
                    (true, false) => paddle.up(),
                    (false, false) => paddle.stop(),
                }
            }
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSink for KeyBindings {
    fn inject_key_down(&mut self, key: KeyCode) {
        debug!("Key down: {}", key.as_char());
        self.held.insert(key);
    }

    fn inject_key_up(&mut self, key: KeyCode) {
        debug!("Key up: {}", key.as_char());
        self.held.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::PADDLE_SPEED;

    #[test]
    fn test_default_bindings() {
        let mut bindings = KeyBindings::new();
        let mut state = GameState::default();

        bindings.inject_key_down(KeyCode::new('W'));
        bindings.inject_key_down(KeyCode::new('K'));
        bindings.apply(&mut state);

        assert_eq!(state.player1.vel_y, -PADDLE_SPEED);
        assert_eq!(state.player2.vel_y, PADDLE_SPEED);
    }

    #[test]
    fn test_release_stops_paddle() {
        let mut bindings = KeyBindings::new();
        let mut state = GameState::default();

        bindings.inject_key_down(KeyCode::new('S'));
        bindings.apply(&mut state);
        assert_eq!(state.player1.vel_y, PADDLE_SPEED);

        bindings.inject_key_up(KeyCode::new('S'));
        bindings.apply(&mut state);
        assert_eq!(state.player1.vel_y, 0.0);
        assert!(!bindings.is_held(KeyCode::new('S')));
    }

    #[test]
    fn test_both_directions_held() {
        let mut bindings = KeyBindings::new();
        let mut state = GameState::default();

        bindings.inject_key_down(KeyCode::new('I'));
        bindings.inject_key_down(KeyCode::new('K'));
        bindings.apply(&mut state);

        assert_eq!(state.player2.vel_y, PADDLE_SPEED);
    }

    #[test]
    fn test_unbound_key_ignored() {
        let mut bindings = KeyBindings::new();
        let mut state = GameState::default();

        bindings.inject_key_down(KeyCode::new('Q'));
        bindings.apply(&mut state);

        assert!(bindings.is_held(KeyCode::new('Q')));
        assert_eq!(state.player1.vel_y, 0.0);
        assert_eq!(state.player2.vel_y, 0.0);
    }

    #[test]
    fn test_rebind() {
        let mut bindings = KeyBindings::new();
        let mut state = GameState::default();

        bindings.bind(KeyCode::new('W'), 2, PaddleAction::Down);
        bindings.inject_key_down(KeyCode::new('W'));
        bindings.apply(&mut state);

        assert_eq!(state.player1.vel_y, 0.0);
        assert_eq!(state.player2.vel_y, PADDLE_SPEED);
    }
}
