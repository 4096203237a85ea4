//! Feature plugins.

use bevy::prelude::*;

pub mod asteroids;
pub mod core;
pub mod fx;
pub mod physics;
pub mod player;
pub mod pool;
pub mod sequence;
pub mod session;
pub mod weapons;

// Render-only
pub mod camera;

/// Register gameplay plugins that work in headless tests.
///
/// Order matters: `core` provides `Tunables`, which `physics` and `session`
/// read while building, and `player` requires the session's `Game`.
pub fn register_gameplay(app: &mut App) {
    core::plugin(app);
    physics::plugin(app);
    sequence::plugin(app);
    pool::plugin(app);
    fx::plugin(app);
    session::plugin(app);
    asteroids::plugin(app);
    player::plugin(app);
    weapons::plugin(app);
}

/// Register render-only plugins (requires DefaultPlugins / render infra).
pub fn register_render(app: &mut App) {
    camera::plugin(app);
}

/// Register all plugins (full app).
pub fn register_all(app: &mut App) {
    register_gameplay(app);
    register_render(app);
}
