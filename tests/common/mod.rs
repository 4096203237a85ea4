//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides core ECS runtime.
//! - we then call `shardfall::game::configure_headless` to install gameplay plugins.
//! - time advances by a fixed amount per `update()`, so fixed-step systems run
//!   deterministically.

#![allow(dead_code)]

use std::time::Duration;

use avian2d::prelude::*;
use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use shardfall::common::tunables::Tunables;
use shardfall::plugins::player::Player;

pub fn app_headless() -> App {
    app_headless_with(Tunables::default())
}

pub fn app_headless_with(tunables: Tunables) -> App {
    let mut app = App::new();

    // Add AssetPlugin + ScenePlugin so SceneSpawner exists.
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(16)));
    // Picked up by the core plugin instead of the defaults.
    app.insert_resource(tunables);

    shardfall::game::configure_headless(&mut app);
    // `App::run` normally finalizes plugins; tests drive `update()` directly,
    // so finish/cleanup here (avian inserts some resources in `Plugin::finish`).
    app.finish();
    app.cleanup();
    app
}

pub fn player(app: &mut App) -> Entity {
    app.world_mut()
        .query_filtered::<Entity, With<Player>>()
        .single(app.world())
        .expect("exactly one player")
}

pub fn collide(app: &mut App, a: Entity, b: Entity) {
    app.world_mut().write_message(CollisionStart {
        collider1: a,
        collider2: b,
        body1: None,
        body2: None,
    });
}
