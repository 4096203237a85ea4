//! Tunable gameplay constants.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone)]
pub struct Tunables {
    /// Avian length unit (world units per "meter").
    pub length_unit: f32,
    pub rng_seed: u64,
    pub starting_lives: u32,
    /// Root asteroids in the first wave; every later wave adds one.
    pub wave_size: u32,
    pub wave_spawn_radius: f32,
    pub score_per_asteroid: u32,
    pub bullet_speed: f32,
    pub bullet_lifetime_secs: f32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            length_unit: 1.0,
            rng_seed: 0x5EED_A57E_801D,
            starting_lives: 3,
            wave_size: 4,
            wave_spawn_radius: 14.0,
            score_per_asteroid: 10,
            bullet_speed: 30.0,
            bullet_lifetime_secs: 1.0,
        }
    }
}
