//! Keyboard state
//!
//! The presentation layer reports raw key names; the simulation only ever
//! sees the four movement flags and a fire edge.

use std::collections::HashSet;

use glam::Vec2;

use crate::settings::KeyboardLayout;

/// Key that fires at the nearest target
pub const FIRE_KEY: &str = " ";

/// Movement flags for one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveKeys {
    /// Per-axis direction in screen space (y down).
    ///
    /// Not normalized: holding two directions moves faster diagonally,
    /// and opposing keys cancel.
    pub fn direction(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.up {
            dir.y -= 1.0;
        }
        if self.down {
            dir.y += 1.0;
        }
        if self.left {
            dir.x -= 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        dir
    }
}

/// Set of currently held keys (lowercased `KeyboardEvent.key` values)
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    pressed: HashSet<String>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press. Returns true on the press edge, false on auto-repeat.
    pub fn press(&mut self, key: &str) -> bool {
        self.pressed.insert(normalize(key))
    }

    pub fn release(&mut self, key: &str) {
        self.pressed.remove(&normalize(key));
    }

    pub fn is_pressed(&self, key: &str) -> bool {
        self.pressed.contains(&normalize(key))
    }

    /// Drop every held key (window blur, respawn)
    pub fn clear(&mut self) {
        self.pressed.clear();
    }

    /// Movement flags under the given layout; arrow keys always work
    pub fn move_keys(&self, layout: KeyboardLayout) -> MoveKeys {
        let [up, left, down, right] = layout.movement_keys();
        MoveKeys {
            up: self.is_pressed(up) || self.is_pressed("arrowup"),
            down: self.is_pressed(down) || self.is_pressed("arrowdown"),
            left: self.is_pressed(left) || self.is_pressed("arrowleft"),
            right: self.is_pressed(right) || self.is_pressed("arrowright"),
        }
    }
}

fn normalize(key: &str) -> String {
    key.to_lowercase()
}
