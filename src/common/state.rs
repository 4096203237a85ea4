//! Global state machine.

use bevy::prelude::*;

/// `Active` is the only state in which ship commands are accepted.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, States, Default)]
pub enum GameState {
    #[default]
    Active,
    Over,
}
