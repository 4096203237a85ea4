use std::time::Duration;

use bevy::prelude::*;

use super::{TimedSequence, advance_timed_sequences, delay_from_secs};
use crate::common::test_utils::{advance_time, run_system_once};

#[derive(Resource, Default, Debug)]
struct Fired(Vec<&'static str>);

fn record(label: &'static str) -> impl FnOnce(&mut World, Entity) + Send + Sync + 'static {
    move |world: &mut World, _entity: Entity| world.resource_mut::<Fired>().0.push(label)
}

fn tick(world: &mut World, secs: f32) {
    advance_time(world, secs);
    run_system_once(world, advance_timed_sequences);
}

fn fired(world: &World) -> Vec<&'static str> {
    world.resource::<Fired>().0.clone()
}

fn setup() -> World {
    let mut world = World::new();
    world.init_resource::<Fired>();
    world
}

#[test]
fn steps_fire_in_order_after_their_delays() {
    let mut world = setup();
    world.spawn(
        TimedSequence::new()
            .then(Duration::from_millis(500), record("a"))
            .then(Duration::from_millis(500), record("b")),
    );

    tick(&mut world, 0.25);
    assert!(fired(&world).is_empty());

    tick(&mut world, 0.25);
    assert_eq!(fired(&world), vec!["a"]);

    tick(&mut world, 0.25);
    assert_eq!(fired(&world), vec!["a"]);

    tick(&mut world, 0.25);
    assert_eq!(fired(&world), vec!["a", "b"]);
}

#[test]
fn long_frame_fires_several_steps_and_carries_leftover() {
    let mut world = setup();
    world.spawn(
        TimedSequence::new()
            .then(Duration::from_millis(250), record("a"))
            .then(Duration::from_millis(250), record("b"))
            .then(Duration::from_millis(500), record("c")),
    );

    // 0.75s covers a and b, and pays 0.25 of c.
    tick(&mut world, 0.75);
    assert_eq!(fired(&world), vec!["a", "b"]);

    tick(&mut world, 0.25);
    assert_eq!(fired(&world), vec!["a", "b", "c"]);
}

#[test]
fn zero_delay_step_fires_on_next_tick_even_with_zero_delta() {
    let mut world = setup();
    world.spawn(TimedSequence::after(Duration::ZERO, record("now")));

    tick(&mut world, 0.0);
    assert_eq!(fired(&world), vec!["now"]);
}

#[test]
fn finished_sequence_is_removed() {
    let mut world = setup();
    let e = world
        .spawn(TimedSequence::after(Duration::from_millis(125), record("x")))
        .id();

    tick(&mut world, 0.125);
    assert!(world.get::<TimedSequence>(e).is_none());
}

#[test]
fn inserting_a_new_sequence_cancels_the_old_one() {
    let mut world = setup();
    let e = world
        .spawn(
            TimedSequence::new()
                .then(Duration::from_millis(500), record("old-1"))
                .then(Duration::from_millis(500), record("old-2")),
        )
        .id();

    tick(&mut world, 0.5);
    assert_eq!(fired(&world), vec!["old-1"]);

    world
        .entity_mut(e)
        .insert(TimedSequence::after(Duration::from_millis(250), record("new")));

    tick(&mut world, 1.0);
    assert_eq!(fired(&world), vec!["old-1", "new"]);
}

#[test]
fn action_superseding_its_own_sequence_stops_stale_steps() {
    let mut world = setup();
    world.spawn(
        TimedSequence::new()
            .then(Duration::from_millis(100), |world: &mut World, entity: Entity| {
                world.resource_mut::<Fired>().0.push("switch");
                world
                    .entity_mut(entity)
                    .insert(TimedSequence::after(Duration::from_millis(500), record("replacement")));
            })
            .then(Duration::ZERO, record("stale")),
    );

    tick(&mut world, 0.25);
    assert_eq!(fired(&world), vec!["switch"]);

    tick(&mut world, 0.5);
    assert_eq!(fired(&world), vec!["switch", "replacement"]);
}

#[test]
fn action_may_despawn_its_owner() {
    let mut world = setup();
    let e = world
        .spawn(
            TimedSequence::new()
                .then(Duration::from_millis(100), |world: &mut World, entity: Entity| {
                    world.despawn(entity);
                })
                .then(Duration::ZERO, record("never")),
        )
        .id();

    tick(&mut world, 0.25);
    assert!(world.get_entity(e).is_err());
    assert!(fired(&world).is_empty());
}

#[test]
fn delay_from_secs_never_panics() {
    assert_eq!(delay_from_secs(1.5), Duration::from_millis(1500));
    assert_eq!(delay_from_secs(0.0), Duration::ZERO);
    assert_eq!(delay_from_secs(-3.0), Duration::ZERO);
    assert_eq!(delay_from_secs(f32::NAN), Duration::ZERO);
    assert_eq!(delay_from_secs(f32::INFINITY), Duration::MAX);
    assert_eq!(delay_from_secs(f32::MAX), Duration::MAX);
}

#[test]
fn maximal_delay_survives_long_frames() {
    let mut world = setup();
    let owner = world.spawn(TimedSequence::after(Duration::MAX, record("never"))).id();

    tick(&mut world, 1.0e9);
    tick(&mut world, 1.0e9);

    assert!(fired(&world).is_empty());
    assert!(world.get::<TimedSequence>(owner).is_some());
}
