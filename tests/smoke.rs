mod common;

use bevy::prelude::*;
use shardfall::common::state::GameState;
use shardfall::plugins::asteroids::Asteroid;
use shardfall::plugins::player::PlayerLifeState;
use shardfall::plugins::pool::Activation;
use shardfall::plugins::session::{Game, WaveTracker};

#[test]
fn boots_and_ticks() {
    let mut app = common::app_headless();

    for _ in 0..3 {
        app.update();
    }

    assert_eq!(
        *app.world().resource::<State<GameState>>().get(),
        GameState::Active
    );
}

#[test]
fn first_wave_and_ship_are_in_play() {
    let mut app = common::app_headless();
    app.update();
    app.update();

    let player = common::player(&mut app);
    assert_eq!(
        *app.world().get::<PlayerLifeState>(player).unwrap(),
        PlayerLifeState::Alive
    );

    let active_asteroids = app
        .world_mut()
        .query::<(&Asteroid, &Activation)>()
        .iter(app.world())
        .filter(|(_, a)| a.is_active())
        .count() as u32;
    let outstanding = app
        .world_mut()
        .query::<&WaveTracker>()
        .single(app.world())
        .unwrap()
        .outstanding;
    assert_eq!(outstanding, 4);
    assert_eq!(active_asteroids, outstanding);

    let game = app.world().resource::<Game>();
    assert_eq!((game.current_player_lives, game.wave), (3, 1));
}
