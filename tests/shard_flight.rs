//! Shards spawned on top of each other must survive the physics step.

mod common;

use bevy::prelude::*;
use shardfall::common::tunables::Tunables;
use shardfall::plugins::asteroids::{Asteroid, AsteroidPools, shatter};
use shardfall::plugins::pool::{self, Activation, PoolMember};

fn active_in(app: &mut App, pool_id: pool::PoolId) -> usize {
    app.world_mut()
        .query::<(&PoolMember, &Activation)>()
        .iter(app.world())
        .filter(|(m, a)| m.pool == pool_id && a.is_active())
        .count()
}

#[test]
fn sibling_shards_do_not_destroy_each_other() {
    let mut app = common::app_headless_with(Tunables {
        wave_size: 0,
        ..default()
    });
    app.update();

    let pools = *app.world().resource::<AsteroidPools>();
    let world = app.world_mut();
    let large = pool::acquire(world, pools.large).unwrap().entity;
    world.get_mut::<Transform>(large).unwrap().translation = Vec3::new(10.0, 10.0, 0.0);
    let shards = world.get::<Asteroid>(large).unwrap().shards as usize;

    // Let the large rock reach the physics world before it breaks.
    app.update();
    shatter(app.world_mut(), large);
    assert_eq!(active_in(&mut app, pools.medium), shards);

    for _ in 0..10 {
        app.update();
    }

    assert_eq!(active_in(&mut app, pools.medium), shards);
    assert_eq!(active_in(&mut app, pools.small), 0);
}
