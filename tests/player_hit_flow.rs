//! Collision → cascade → life loss → respawn / game over, through the real schedules.

mod common;

use bevy::prelude::*;
use shardfall::common::state::GameState;
use shardfall::common::tunables::Tunables;
use shardfall::plugins::asteroids::{AsteroidPools, DestructionListeners};
use shardfall::plugins::player::{Player, PlayerLifeState};
use shardfall::plugins::pool::{self, Activation, PoolMember};
use shardfall::plugins::session::{Game, WaveTracker};

/// Quiet session: no waves, so the only asteroid is the one a test places.
fn quiet(lives: u32) -> App {
    let mut app = common::app_headless_with(Tunables {
        wave_size: 0,
        starting_lives: lives,
        ..default()
    });
    app.update();
    app
}

/// One large asteroid away from the ship, with the wave tracker subscribed.
fn place_asteroid(app: &mut App) -> Entity {
    let world = app.world_mut();
    let pools = *world.resource::<AsteroidPools>();
    let asteroid = pool::acquire(world, pools.large).unwrap().entity;
    world.get_mut::<Transform>(asteroid).unwrap().translation = Vec3::new(10.0, 10.0, 0.0);

    let tracker = world
        .query_filtered::<Entity, With<WaveTracker>>()
        .single(world)
        .unwrap();
    world
        .get_mut::<DestructionListeners>(asteroid)
        .unwrap()
        .0
        .push(tracker);
    asteroid
}

#[test]
fn crash_costs_a_life_and_respawns_invulnerable() {
    let mut app = quiet(3);
    let player = common::player(&mut app);
    let asteroid = place_asteroid(&mut app);

    common::collide(&mut app, player, asteroid);
    for _ in 0..4 {
        app.update();
    }

    let world = app.world();
    assert!(!world.get::<Activation>(asteroid).unwrap().is_active());
    assert_eq!(world.resource::<Game>().current_player_lives, 2);
    assert_eq!(world.resource::<Game>().score, 10);

    assert!(world.get::<Activation>(player).unwrap().is_active());
    assert_eq!(
        *world.get::<PlayerLifeState>(player).unwrap(),
        PlayerLifeState::Invulnerable
    );
    assert_eq!(
        world.get::<Transform>(player).unwrap().translation.truncate(),
        Vec2::ZERO
    );
    assert_eq!(
        *world.resource::<State<GameState>>().get(),
        GameState::Active
    );
}

#[test]
fn crash_on_last_life_ends_the_game() {
    let mut app = quiet(1);
    let player = common::player(&mut app);
    let asteroid = place_asteroid(&mut app);

    common::collide(&mut app, player, asteroid);
    for _ in 0..4 {
        app.update();
    }

    assert_eq!(app.world().resource::<Game>().current_player_lives, 0);
    assert_eq!(
        *app.world().resource::<State<GameState>>().get(),
        GameState::Over
    );
    let players = app
        .world_mut()
        .query_filtered::<Entity, With<Player>>()
        .iter(app.world())
        .count();
    assert_eq!(players, 0);

    // The shards from the final crash went back to their pools.
    let in_play = app
        .world_mut()
        .query_filtered::<&Activation, With<PoolMember>>()
        .iter(app.world())
        .filter(|a| a.is_active())
        .count();
    assert_eq!(in_play, 0);
}
