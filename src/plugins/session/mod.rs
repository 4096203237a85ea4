//! Session: the game-state collaborator.
//!
//! Owns the life count and score, turns ship losses into respawns or game over,
//! and keeps asteroid waves coming.
//!
//! # Wave tracking
//! ```text
//!   spawn_wave ── N roots from the large pool, tracker subscribed to each
//!        │          outstanding += N
//!   DestructionReport(fragments) ──► outstanding += fragments - 1, score += k
//!        │
//!   outstanding == 0 ──► spawn_wave (one more root than last time)
//! ```
//! The tracker only ever subscribes to roots; the cascade forwards shard reports.
//!
//! Leaving `Active` releases every pooled instance still in play, and a wave
//! queued on the last frame is dropped.

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::rng::GameRng;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::asteroids::{
    AsteroidPools, DestructionListeners, DestructionReport, launch_in_random_direction,
};
use crate::plugins::player::{PlayerDestroyed, RespawnPlayer};
use crate::plugins::pool::{self, Activation, PoolMember};
use crate::plugins::sequence::advance_timed_sequences;

#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub current_player_lives: u32,
    pub score: u32,
    pub wave: u32,
}

impl Game {
    pub fn new(lives: u32) -> Self {
        Self {
            current_player_lives: lives,
            score: 0,
            wave: 0,
        }
    }
}

/// Listener that counts asteroids still in play for the current wave.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WaveTracker {
    pub outstanding: u32,
}

pub fn plugin(app: &mut App) {
    let lives = app.world().resource::<Tunables>().starting_lives;
    app.insert_resource(Game::new(lives))
        .add_systems(OnEnter(GameState::Active), start_session)
        .add_systems(OnExit(GameState::Active), release_pooled_entities)
        .add_systems(
            Update,
            (track_asteroid_reports, handle_player_destroyed).after(advance_timed_sequences),
        );
}

pub fn start_session(world: &mut World) {
    let lives = world.resource::<Tunables>().starting_lives;
    world.insert_resource(Game::new(lives));

    let tracker = world
        .spawn((
            Name::new("WaveTracker"),
            WaveTracker::default(),
            DespawnOnExit(GameState::Active),
        ))
        .id();
    spawn_wave(world, tracker);
}

/// Spawn the next wave on a ring around the origin. `wave_size == 0` disables waves.
pub fn spawn_wave(world: &mut World, tracker: Entity) {
    let over = world
        .get_resource::<State<GameState>>()
        .is_some_and(|state| *state.get() != GameState::Active);
    let tunables = world.resource::<Tunables>().clone();
    if over || tunables.wave_size == 0 {
        return;
    }
    let pools = *world
        .get_resource::<AsteroidPools>()
        .expect("AsteroidPools missing: the asteroids plugin registers them on entering Active");

    let wave = {
        let mut game = world.resource_mut::<Game>();
        game.wave += 1;
        game.wave
    };
    let count = tunables.wave_size + wave - 1;

    let mut spawned = 0;
    for _ in 0..count {
        // Configuration errors were logged by the pool.
        let Ok(handle) = pool::acquire(world, pools.large) else {
            break;
        };
        let root = handle.entity;

        let angle = world.resource_mut::<GameRng>().angle_degrees();
        let position = Vec2::from_angle(angle.to_radians()) * tunables.wave_spawn_radius;
        if let Some(mut tf) = world.get_mut::<Transform>(root) {
            tf.translation = position.extend(tf.translation.z);
        }
        launch_in_random_direction(world, root);

        match world.get_mut::<DestructionListeners>(root) {
            Some(mut listeners) => listeners.0.push(tracker),
            None => {
                world
                    .entity_mut(root)
                    .insert(DestructionListeners(vec![tracker]));
            }
        }
        spawned += 1;
    }

    if let Some(mut t) = world.get_mut::<WaveTracker>(tracker) {
        t.outstanding += spawned;
    }
    info!("wave {wave}: {spawned} asteroids");
}

/// Asteroids and bullets left in play go back to their pools.
pub fn release_pooled_entities(world: &mut World) {
    let in_play: Vec<Entity> = world
        .query_filtered::<(Entity, &Activation), With<PoolMember>>()
        .iter(world)
        .filter(|(_, activation)| activation.is_active())
        .map(|(entity, _)| entity)
        .collect();

    for &entity in &in_play {
        pool::release(world, entity);
        if let Some(mut listeners) = world.get_mut::<DestructionListeners>(entity) {
            listeners.0.clear();
        }
    }
    debug!("released {} pooled entities", in_play.len());
}

pub fn track_asteroid_reports(
    mut commands: Commands,
    mut reports: MessageReader<DestructionReport>,
    tunables: Res<Tunables>,
    mut game: ResMut<Game>,
    mut q_trackers: Query<&mut WaveTracker>,
) {
    for report in reports.read() {
        let Ok(mut tracker) = q_trackers.get_mut(report.listener) else {
            continue;
        };

        tracker.outstanding = (tracker.outstanding + report.fragments).saturating_sub(1);
        game.score += tunables.score_per_asteroid;

        if tracker.outstanding == 0 {
            let listener = report.listener;
            commands.queue(move |world: &mut World| spawn_wave(world, listener));
        }
    }
}

pub fn handle_player_destroyed(
    mut destroyed: MessageReader<PlayerDestroyed>,
    mut game: ResMut<Game>,
    mut next: ResMut<NextState<GameState>>,
    mut respawn: MessageWriter<RespawnPlayer>,
) {
    for ev in destroyed.read() {
        game.current_player_lives = game.current_player_lives.saturating_sub(ev.lives_lost);

        if game.current_player_lives == 0 {
            info!("game over, score {}", game.score);
            next.set(GameState::Over);
        } else {
            respawn.write(RespawnPlayer { player: ev.player });
        }
    }
}
