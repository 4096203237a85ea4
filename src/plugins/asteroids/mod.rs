//! Asteroids: destructible entities that fragment into pooled shards.
//!
//! # Destruction cascade
//! ```text
//!   FixedPostUpdate
//!   asteroid_collisions (CollisionStart → queue `shatter`)
//!        │
//!   shatter(asteroid)
//!     ├─ PlaySound / debris
//!     ├─ shard pool?  yes → report N to every listener
//!     │                     N × acquire shard from pool
//!     │                         place at origin + random disk offset
//!     │                         random heading + forward impulse
//!     │                         shard listeners += our listeners
//!     │               no  → report 0 to every listener
//!     └─ pool::release (inactive, stopped), listeners cleared
//! ```
//!
//! Listener propagation is what lets a single tracker subscribe to a root
//! asteroid and hear about every descendant shard: each shard inherits the
//! listener list at spawn time and reports again when it is destroyed.

use std::time::Duration;

use avian2d::collision::narrow_phase::CollisionEventSystems;
use avian2d::prelude::*;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use crate::common::layers::Layer;
use crate::common::rng::GameRng;
use crate::common::state::GameState;
use crate::plugins::fx::{DebrisSpawn, PlaySound, SoundId, spawn_debris};
use crate::plugins::player::PlayerLifeState;
use crate::plugins::pool::{
    self, Activation, ActiveLayers, PoolConfig, PoolId, Template, inactive_layers,
};
use crate::plugins::session::start_session;

/// Shards land within this radius of the destroyed asteroid so they don't
/// immediately re-collide with each other.
pub const SHARD_SCATTER_RADIUS: f32 = 2.5;

#[derive(Component, Debug, Clone)]
pub struct Asteroid {
    pub shards: u32,
    /// `None`: no fragmentation, the destruction reports zero shards.
    pub shard_pool: Option<PoolId>,
    /// Forward impulse (as a velocity change) given to a freshly spawned shard.
    pub launch_speed: f32,
    pub destroy_sound: Option<SoundId>,
    pub debris: Option<DebrisSpawn>,
}

impl Default for Asteroid {
    fn default() -> Self {
        Self {
            shards: 3,
            shard_pool: None,
            launch_speed: 4.0,
            destroy_sound: Some(SoundId("asteroid_explosion")),
            debris: None,
        }
    }
}

/// Entities to notify when this asteroid is destroyed, in subscription order.
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct DestructionListeners(pub Vec<Entity>);

/// "`asteroid` was destroyed and is responsible for `fragments` new shards."
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestructionReport {
    pub listener: Entity,
    pub asteroid: Entity,
    pub fragments: u32,
}

#[derive(Resource, Debug, Clone, Copy)]
pub struct AsteroidPools {
    pub large: PoolId,
    pub medium: PoolId,
    pub small: PoolId,
}

#[inline]
pub fn asteroid_layers() -> CollisionLayers {
    // Rocks pass through each other; sibling shards spawn overlapping.
    CollisionLayers::new(Layer::Asteroid, [Layer::Player, Layer::PlayerBullet])
}

pub fn plugin(app: &mut App) {
    app.add_message::<DestructionReport>();

    // Pools must exist before the session spawns its first wave.
    app.add_systems(
        OnEnter(GameState::Active),
        init_asteroid_pools.before(start_session),
    );

    app.add_systems(
        FixedPostUpdate,
        asteroid_collisions
            .after(CollisionEventSystems)
            .run_if(in_state(GameState::Active)),
    );
}

// -----------------------------------------------------------------------------
// Pools
// -----------------------------------------------------------------------------

fn dust_template() -> Template {
    Template::new("AsteroidDust", |e: &mut EntityWorldMut| {
        e.insert(Sprite {
            color: Color::srgba(0.7, 0.7, 0.65, 0.6),
            custom_size: Some(Vec2::splat(1.2)),
            ..default()
        });
    })
}

pub fn asteroid_template(name: &'static str, radius: f32, color: Color, asteroid: Asteroid) -> Template {
    Template::new(name, move |e: &mut EntityWorldMut| {
        let layers = asteroid_layers();
        e.insert((
            asteroid.clone(),
            DestructionListeners::default(),
            Sprite {
                color,
                custom_size: Some(Vec2::splat(radius * 2.0)),
                ..default()
            },
            Transform::default(),
            Visibility::Hidden,
            RigidBody::Dynamic,
            Collider::circle(radius),
            Sensor,
            ActiveLayers(layers),
            inactive_layers(layers),
            LinearVelocity::ZERO,
            CollisionEventsEnabled,
        ));
    })
}

/// Three tiers: large (two random looks) → medium → small (no further shards).
///
/// Registered once; later entries into `Active` reuse the same pools.
pub fn init_asteroid_pools(world: &mut World) {
    if world.contains_resource::<AsteroidPools>() {
        return;
    }

    let dust = DebrisSpawn::new(dust_template())
        .matching_rotation()
        .despawn_after(Duration::from_millis(600));

    let small = pool::register_pool(
        world,
        "SmallAsteroids",
        PoolConfig::single(asteroid_template(
            "SmallAsteroid",
            0.5,
            Color::srgb(0.62, 0.6, 0.56),
            Asteroid {
                shards: 0,
                shard_pool: None,
                launch_speed: 6.0,
                debris: Some(dust.clone()),
                ..default()
            },
        ))
        .with_pregenerated(12),
    );

    let medium = pool::register_pool(
        world,
        "MediumAsteroids",
        PoolConfig::single(asteroid_template(
            "MediumAsteroid",
            1.0,
            Color::srgb(0.55, 0.52, 0.48),
            Asteroid {
                shards: 2,
                shard_pool: Some(small),
                launch_speed: 5.0,
                debris: Some(dust.clone()),
                ..default()
            },
        ))
        .with_pregenerated(8),
    );

    let large_looks = vec![
        asteroid_template(
            "LargeAsteroidA",
            1.8,
            Color::srgb(0.48, 0.45, 0.42),
            Asteroid {
                shards: 2,
                shard_pool: Some(medium),
                debris: Some(dust.clone()),
                ..default()
            },
        ),
        asteroid_template(
            "LargeAsteroidB",
            2.0,
            Color::srgb(0.44, 0.4, 0.38),
            Asteroid {
                shards: 3,
                shard_pool: Some(medium),
                debris: Some(dust),
                ..default()
            },
        ),
    ];
    let large = pool::register_pool(
        world,
        "LargeAsteroids",
        PoolConfig::random_set(large_looks).with_pregenerated(4),
    );

    world.insert_resource(AsteroidPools { large, medium, small });
}

// -----------------------------------------------------------------------------
// Collision intake
// -----------------------------------------------------------------------------

/// Contact with a ship or bullet destroys an active asteroid. Another asteroid
/// is not a hit, and neither is a ship already playing its death animation.
pub fn asteroid_collisions(
    mut commands: Commands,
    mut started: MessageReader<CollisionStart>,
    q_asteroids: Query<&Activation, With<Asteroid>>,
    q_players: Query<&PlayerLifeState>,
    // Per-run dedupe: one shatter per asteroid.
    mut seen: Local<HashSet<Entity>>,
) {
    seen.clear();

    for ev in started.read() {
        for (asteroid, other) in [(ev.collider1, ev.collider2), (ev.collider2, ev.collider1)] {
            let Ok(activation) = q_asteroids.get(asteroid) else {
                continue;
            };
            if !activation.is_active() || q_asteroids.contains(other) {
                continue;
            }
            if matches!(q_players.get(other), Ok(PlayerLifeState::InDeathAnimation)) {
                continue;
            }
            if !seen.insert(asteroid) {
                continue;
            }

            commands.queue(move |world: &mut World| shatter(world, asteroid));
        }
    }
}

// -----------------------------------------------------------------------------
// Cascade
// -----------------------------------------------------------------------------

fn notify(world: &mut World, asteroid: Entity, listeners: &[Entity], fragments: u32) {
    debug!(
        "asteroid {asteroid:?} destroyed: {fragments} fragments, {} listeners",
        listeners.len()
    );
    for &listener in listeners {
        world.write_message(DestructionReport {
            listener,
            asteroid,
            fragments,
        });
    }
}

/// Random heading in `[0°, 360°)`; velocity becomes `launch_speed` along it.
pub fn launch_in_random_direction(world: &mut World, entity: Entity) {
    let Some(speed) = world.get::<Asteroid>(entity).map(|a| a.launch_speed) else {
        return;
    };
    let angle = world.resource_mut::<GameRng>().angle_degrees();
    let rotation = Quat::from_rotation_z(angle.to_radians());

    if let Some(mut tf) = world.get_mut::<Transform>(entity) {
        tf.rotation = rotation;
    }

    let impulse = (rotation * Vec3::Y).truncate() * speed;
    match world.get_mut::<LinearVelocity>(entity) {
        Some(mut vel) => vel.0 = impulse,
        None => {
            world.entity_mut(entity).insert(LinearVelocity(impulse));
        }
    }
}

/// Destroy one asteroid and spawn its shards.
pub fn shatter(world: &mut World, asteroid: Entity) {
    let Some(config) = world.get::<Asteroid>(asteroid).cloned() else {
        return;
    };
    // A second hit queued in the same frame finds it already gone.
    if !world.get::<Activation>(asteroid).is_some_and(|a| a.is_active()) {
        return;
    }

    let origin = world.get::<Transform>(asteroid).copied().unwrap_or_default();

    if let Some(clip) = config.destroy_sound {
        world.write_message(PlaySound { clip });
    }
    if let Some(debris) = &config.debris {
        spawn_debris(world, debris, &origin);
    }

    let listeners = world
        .get::<DestructionListeners>(asteroid)
        .map(|l| l.0.clone())
        .unwrap_or_default();

    match config.shard_pool {
        Some(shard_pool) => {
            notify(world, asteroid, &listeners, config.shards);

            for _ in 0..config.shards {
                // The pool has already logged a configuration error.
                let Ok(handle) = pool::acquire(world, shard_pool) else {
                    break;
                };
                let shard = handle.entity;

                let offset = world
                    .resource_mut::<GameRng>()
                    .point_in_disk(SHARD_SCATTER_RADIUS);
                let position = origin.translation + offset.extend(0.0);
                match world.get_mut::<Transform>(shard) {
                    Some(mut tf) => tf.translation = position,
                    None => {
                        world.entity_mut(shard).insert(Transform::from_translation(position));
                    }
                }

                if world.get::<Asteroid>(shard).is_none() {
                    warn!("asteroid {asteroid:?} spawned shard {shard:?} without asteroid behaviour");
                    continue;
                }

                launch_in_random_direction(world, shard);
                match world.get_mut::<DestructionListeners>(shard) {
                    Some(mut shard_listeners) => shard_listeners.0.extend_from_slice(&listeners),
                    None => {
                        world
                            .entity_mut(shard)
                            .insert(DestructionListeners(listeners.clone()));
                    }
                }
            }
        }
        None => notify(world, asteroid, &listeners, 0),
    }

    pool::release(world, asteroid);
    if let Some(mut own) = world.get_mut::<DestructionListeners>(asteroid) {
        own.0.clear();
    }
}
