//! Seeded gameplay randomness.

use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

#[derive(Resource, Debug, Clone)]
pub struct GameRng(pub Pcg32);

impl GameRng {
    pub fn seeded(seed: u64) -> Self {
        Self(Pcg32::seed_from_u64(seed))
    }

    /// Uniform in `[0, 360)`.
    #[inline]
    pub fn angle_degrees(&mut self) -> f32 {
        self.0.random_range(0.0_f32..360.0)
    }

    /// Uniform over the disk area (not biased toward the centre).
    pub fn point_in_disk(&mut self, radius: f32) -> Vec2 {
        let r = radius * self.0.random::<f32>().sqrt();
        let theta = self.0.random_range(0.0_f32..TAU);
        Vec2::from_angle(theta) * r
    }

    /// `len` must be non-zero.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        self.0.random_range(0..len)
    }
}
