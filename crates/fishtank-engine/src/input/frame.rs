use std::collections::HashSet;

use super::types::{InputEvent, Key};

/// Input transitions of the current frame. Cleared by the runtime after
/// every `on_frame`.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Raw events in arrival order.
    pub events: Vec<InputEvent>,

    pub keys_pressed: HashSet<Key>,
    pub keys_released: HashSet<Key>,

    /// The pointer moved this frame (including leaving the window).
    pub pointer_changed: bool,
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.events.clear();
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.pointer_changed = false;
    }

    /// Pressed this frame, ignoring key repeat.
    pub fn pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }
}
