//! Weapons: the shooting collaborator behind `ShootRequest`.
//!
//! ```text
//!   Update:           ShootRequest ──► fire_bullets ──► fire(shooter)
//!                                                        acquire bullet (pool)
//!                                                        place at nose, set velocity
//!                                                        lifetime sequence (handle-guarded)
//!   FixedPostUpdate:  CollisionStart ──► bullet_collisions ──► Activation::Inactive
//! ```
//!
//! A bullet may be released by a hit and handed out again before its old
//! lifetime step fires; the generation check keeps that step from killing the
//! new shot.

use avian2d::collision::narrow_phase::CollisionEventSystems;
use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::fx::{PlaySound, SoundId};
use crate::plugins::player::{SHIP_RADIUS, ShipAnimator, ShootRequest};
use crate::plugins::pool::{
    self, Activation, ActiveLayers, PoolConfig, PoolHandle, PoolId, Template, inactive_layers,
};
use crate::plugins::sequence::{TimedSequence, delay_from_secs};

pub const BULLET_RADIUS: f32 = 0.15;
pub const SHOOT_SOUND: SoundId = SoundId("shoot");

#[derive(Component, Debug, Clone, Copy)]
pub struct Bullet;

#[derive(Resource, Debug, Clone, Copy)]
pub struct Armory {
    pub pool: PoolId,
}

#[inline]
pub fn bullet_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::PlayerBullet, [Layer::Asteroid])
}

pub fn plugin(app: &mut App) {
    app.add_systems(Startup, init_bullet_pool)
        .add_systems(Update, fire_bullets.run_if(in_state(GameState::Active)))
        .add_systems(
            FixedPostUpdate,
            bullet_collisions
                .after(CollisionEventSystems)
                .run_if(in_state(GameState::Active)),
        );
}

pub fn bullet_template() -> Template {
    Template::new("Bullet", |e: &mut EntityWorldMut| {
        let layers = bullet_layers();
        e.insert((
            Bullet,
            Sprite {
                color: Color::srgb(1.0, 0.95, 0.6),
                custom_size: Some(Vec2::splat(BULLET_RADIUS * 2.0)),
                ..default()
            },
            Transform::default(),
            Visibility::Hidden,
            RigidBody::Kinematic,
            Collider::circle(BULLET_RADIUS),
            Sensor,
            ActiveLayers(layers),
            inactive_layers(layers),
            LinearVelocity::ZERO,
            CollisionEventsEnabled,
        ));
    })
}

pub fn init_bullet_pool(world: &mut World) {
    let pool = pool::register_pool(
        world,
        "Bullets",
        PoolConfig::single(bullet_template()).with_pregenerated(16),
    );
    world.insert_resource(Armory { pool });
}

pub fn fire_bullets(mut commands: Commands, mut requests: MessageReader<ShootRequest>) {
    for &ShootRequest { shooter } in requests.read() {
        commands.queue(move |world: &mut World| {
            fire(world, shooter);
        });
    }
}

/// Launch one bullet from the shooter's nose along its heading.
pub fn fire(world: &mut World, shooter: Entity) -> Option<PoolHandle> {
    let origin = *world.get::<Transform>(shooter)?;
    let armory = *world
        .get_resource::<Armory>()
        .expect("Armory missing: the bullet pool is registered at Startup");
    let tunables = world.resource::<Tunables>();
    let (speed, lifetime) = (tunables.bullet_speed, tunables.bullet_lifetime_secs);

    let handle = pool::acquire(world, armory.pool).ok()?;
    let bullet = handle.entity;

    let heading = (origin.rotation * Vec3::Y).truncate();
    let position = origin.translation.truncate() + heading * SHIP_RADIUS;
    if let Some(mut tf) = world.get_mut::<Transform>(bullet) {
        tf.translation = position.extend(origin.translation.z);
        tf.rotation = origin.rotation;
    }
    if let Some(mut vel) = world.get_mut::<LinearVelocity>(bullet) {
        vel.0 = heading * speed;
    }

    world.entity_mut(bullet).insert(TimedSequence::after(
        delay_from_secs(lifetime),
        move |world: &mut World, e: Entity| {
            if pool::is_current(world, handle) {
                pool::release(world, e);
            }
        },
    ));

    if let Some(mut anim) = world.get_mut::<ShipAnimator>(shooter) {
        anim.shoot = true;
    }
    world.write_message(PlaySound { clip: SHOOT_SOUND });
    Some(handle)
}

pub fn bullet_collisions(
    mut started: MessageReader<CollisionStart>,
    q_layers: Query<&CollisionLayers, Without<Bullet>>,
    mut q_bullets: Query<&mut Activation, With<Bullet>>,
) {
    for ev in started.read() {
        for (bullet, other) in [(ev.collider1, ev.collider2), (ev.collider2, ev.collider1)] {
            let Ok(mut activation) = q_bullets.get_mut(bullet) else {
                continue;
            };
            let hit_asteroid = q_layers
                .get(other)
                .is_ok_and(|l| l.memberships.has_all(Layer::Asteroid));
            if hit_asteroid && activation.is_active() {
                *activation = Activation::Inactive;
            }
        }
    }
}
