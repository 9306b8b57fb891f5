//! # Input Manager
//!
//! Tracks the keys the renderer responds to and turns window keyboard events into
//! per-sample key transitions.

use std::collections::{HashMap, HashSet};

use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use super::input_state::{ProcessedInputState, RawInputState};

/// Digit keys selecting palette entries, in palette order.
pub const PALETTE_KEYS: [KeyCode; 8] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
];

pub const ADD_VOXEL_KEY: KeyCode = KeyCode::Space;
pub const BUFFER_STATS_KEY: KeyCode = KeyCode::KeyB;

fn tracked_keys() -> impl Iterator<Item = KeyCode> {
    PALETTE_KEYS
        .into_iter()
        .chain([ADD_VOXEL_KEY, BUFFER_STATS_KEY])
}

/// Keyboard state between two samples.
pub struct InputManager {
    /// State of each tracked key at the previous sample
    keyboard_inputs_old: HashMap<KeyCode, bool>,
    /// Current state of each tracked key
    keyboard_inputs_new: HashMap<KeyCode, bool>,
    /// Keys with a press event since the previous sample
    keyboard_presses: HashSet<KeyCode>,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    /// Creates a manager with every tracked key released.
    pub fn new() -> Self {
        let keyboard_inputs_old: HashMap<KeyCode, bool> =
            tracked_keys().map(|key| (key, false)).collect();
        Self {
            keyboard_inputs_new: keyboard_inputs_old.clone(),
            keyboard_inputs_old,
            keyboard_presses: HashSet::new(),
        }
    }

    /// Updates key state from a window event. Key repeats are not new presses.
    pub fn intake_input(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    state,
                    physical_key: PhysicalKey::Code(key),
                    repeat,
                    ..
                },
            ..
        } = event
        {
            self.intake_key(*key, *state == ElementState::Pressed, *repeat);
        }
    }

    fn intake_key(&mut self, key: KeyCode, pressed: bool, repeat: bool) {
        if let Some(key_state) = self.keyboard_inputs_new.get_mut(&key) {
            *key_state = pressed;
            if pressed && !repeat {
                self.keyboard_presses.insert(key);
            }
        }
    }

    /// Key transitions since the previous sample.
    pub fn create_processed_input_state(&self) -> ProcessedInputState {
        let keyboard_states = self
            .keyboard_inputs_new
            .iter()
            .map(|(key, &new_state)| {
                let old_state = self.keyboard_inputs_old.get(key).copied().unwrap_or(false);
                let pressed_between = self.keyboard_presses.contains(key);
                (
                    *key,
                    RawInputState::from_raw_states(old_state, new_state, pressed_between),
                )
            })
            .collect();

        ProcessedInputState { keyboard_states }
    }

    /// Returns the transitions since the previous sample and starts a new one.
    pub fn get_and_reset_processed_input(&mut self) -> ProcessedInputState {
        let processed_input = self.create_processed_input_state();
        self.reset_inputs();
        processed_input
    }

    /// Starts a new sample.
    pub fn reset_inputs(&mut self) {
        self.keyboard_inputs_old
            .clone_from(&self.keyboard_inputs_new);
        self.keyboard_presses.clear();
    }

    /// Releases every key, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.keyboard_inputs_new
            .values_mut()
            .for_each(|state| *state = false);
        self.reset_inputs();
    }
}
