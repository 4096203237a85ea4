use bevy::prelude::*;

use crate::common::rng::GameRng;
use crate::common::tunables::Tunables;
use crate::plugins::core;

#[test]
fn inserts_resources() {
    let mut app = App::new();
    core::plugin(&mut app);
    assert!(app.world().get_resource::<Tunables>().is_some());
    assert!(app.world().get_resource::<GameRng>().is_some());
    assert!(app.world().get_resource::<ClearColor>().is_some());
}

#[test]
fn keeps_pre_inserted_tunables_and_seeds_from_them() {
    let mut app = App::new();
    app.insert_resource(Tunables {
        rng_seed: 9,
        starting_lives: 5,
        ..default()
    });
    core::plugin(&mut app);

    assert_eq!(app.world().resource::<Tunables>().starting_lives, 5);

    let mut expected = GameRng::seeded(9);
    let mut rng = app.world_mut().resource_mut::<GameRng>();
    assert_eq!(rng.index(1000), expected.index(1000));
}
