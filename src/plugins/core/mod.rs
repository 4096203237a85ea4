//! Core plugin: shared resources and global settings.
//!
//! `Tunables` uses `init_resource`, so an app (or test) that inserted its own
//! values before registering plugins keeps them. The RNG is seeded from them.

use bevy::prelude::*;

use crate::common::rng::GameRng;
use crate::common::tunables::Tunables;

pub fn plugin(app: &mut App) {
    app.init_resource::<Tunables>();
    let seed = app.world().resource::<Tunables>().rng_seed;
    app.insert_resource(GameRng::seeded(seed));
    app.insert_resource(ClearColor(Color::srgb(0.02, 0.02, 0.04)));
}

#[cfg(test)]
mod tests;
