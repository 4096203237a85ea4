//! Player ship: movement commands and the life-state machine.
//!
//! ```text
//!            hit (not fatal)                      timer over
//!   Alive ───────────────────► Invulnerable ─────────────────► Alive
//!     │                           ▲
//!     │ hit (fatal: destroy_on_collision || lives == 1)
//!     ▼                           │ RespawnPlayer (destroy_on_collision)
//!   InDeathAnimation ──clip──► Inactive
//! ```
//!
//! Pipeline:
//! - Update: sample keyboard, write `ShipInput` / `ShootRequest`
//! - FixedUpdate: apply thrust + rotation to the ship
//! - FixedPostUpdate: `player_collisions` (after asteroids shattered)
//! - Update: `respawn_players` reacts to the session's `RespawnPlayer`
//!
//! Hits are ignored while `Invulnerable`, `InDeathAnimation` or `Inactive`.
//! The life count itself is owned by [`Game`]; the ship only reports losses.

use std::time::Duration;

use avian2d::collision::narrow_phase::CollisionEventSystems;
use avian2d::prelude::*;
use bevy::color::Alpha;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::plugins::asteroids::asteroid_collisions;
use crate::plugins::fx::{DebrisSpawn, PlaySound, SoundId, spawn_debris};
use crate::plugins::pool::{Activation, ActiveLayers};
use crate::plugins::sequence::{TimedSequence, delay_from_secs};
use crate::plugins::session::{Game, handle_player_destroyed};

#[derive(Component, Debug, Clone, Copy)]
pub struct Player;

#[derive(Component, Debug, Clone)]
pub struct ShipConfig {
    pub ship_backwards_allowed: bool,
    /// Forward acceleration while thrusting (units/s²).
    pub main_force: f32,
    /// Degrees per second.
    pub rotation_force: f32,
    pub max_axis_velocity: f32,
    pub destroy_on_collision: bool,
    pub debris: Option<DebrisSpawn>,
    pub destroy_sound: Option<SoundId>,
    pub respawn_invulnerable_secs: f32,
    pub invulnerable_blinks: u32,
    /// Length of the death clip; `None` = vanish immediately.
    pub death_animation: Option<Duration>,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            ship_backwards_allowed: false,
            main_force: 60.0,
            rotation_force: 200.0,
            max_axis_velocity: 42.0,
            destroy_on_collision: true,
            debris: None,
            destroy_sound: Some(SoundId("ship_explosion")),
            respawn_invulnerable_secs: 3.0,
            invulnerable_blinks: 3,
            death_animation: None,
        }
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerLifeState {
    #[default]
    Alive,
    Invulnerable,
    InDeathAnimation,
    Inactive,
}

/// Parameters consumed by the sprite animator.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct ShipAnimator {
    pub death: bool,
    pub shoot: bool,
    /// -1 backwards, 0 idle, 1 forward.
    pub input_speed: f32,
    pub current_speed: f32,
    /// -1 right, 0 none, 1 left.
    pub rotation: f32,
}

/// HUD entities shown at 3, 2 and 1 remaining lives.
#[derive(Component, Debug, Clone, Copy)]
pub struct LifeIndicators {
    pub at_three: Entity,
    pub at_two: Entity,
    pub at_one: Entity,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct LifeIndicator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForceDirection {
    Up,
    Down,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationDirection {
    Right,
    Left,
    #[default]
    None,
}

/// A life was lost.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerDestroyed {
    pub player: Entity,
    pub lives_lost: u32,
}

/// Sent by the session when the ship should come back (lives remain).
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RespawnPlayer {
    pub player: Entity,
}

/// Forwarded untouched to the weapons plugin.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShootRequest {
    pub shooter: Entity,
}

#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipInput {
    pub thrust: ForceDirection,
    pub rotation: RotationDirection,
}

pub const SHIP_RADIUS: f32 = 0.8;

#[inline]
pub fn player_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Player, [Layer::Asteroid])
}

pub fn plugin(app: &mut App) {
    assert!(
        app.world().contains_resource::<Game>(),
        "player plugin requires the `Game` resource; install the session plugin first"
    );

    app.add_message::<PlayerDestroyed>()
        .add_message::<RespawnPlayer>()
        .add_message::<ShootRequest>()
        .init_resource::<ShipInput>()
        .add_systems(OnEnter(GameState::Active), spawn_player)
        .add_systems(
            Update,
            (
                gather_input.run_if(in_state(GameState::Active)),
                respawn_players.after(handle_player_destroyed),
            ),
        )
        .add_systems(
            FixedUpdate,
            apply_ship_input.run_if(in_state(GameState::Active)),
        )
        .add_systems(
            FixedPostUpdate,
            player_collisions
                .after(CollisionEventSystems)
                .after(asteroid_collisions)
                .run_if(in_state(GameState::Active)),
        );
}

// -----------------------------------------------------------------------------
// Spawn
// -----------------------------------------------------------------------------

/// Which of the (3, 2, 1) indicators should be visible. Other counts leave them as is.
pub fn indicator_visibility(lives: u32) -> Option<[bool; 3]> {
    match lives {
        3 => Some([true, false, false]),
        2 => Some([false, true, false]),
        1 => Some([false, false, true]),
        _ => None,
    }
}

fn spawn_indicator(commands: &mut Commands, name: &'static str, x: f32, visible: bool) -> Entity {
    commands
        .spawn((
            Name::new(name),
            LifeIndicator,
            Sprite {
                color: Color::srgb(0.85, 0.9, 1.0),
                custom_size: Some(Vec2::new(3.0, 0.6)),
                ..default()
            },
            Transform::from_xyz(x, 17.0, 5.0),
            if visible {
                Visibility::Visible
            } else {
                Visibility::Hidden
            },
            DespawnOnExit(GameState::Active),
        ))
        .id()
}

pub fn spawn_player(mut commands: Commands) {
    // Full health at spawn; respawns pick the indicator from the life count.
    let indicators = LifeIndicators {
        at_three: spawn_indicator(&mut commands, "LivesIndicator3", -26.0, true),
        at_two: spawn_indicator(&mut commands, "LivesIndicator2", -26.0, false),
        at_one: spawn_indicator(&mut commands, "LivesIndicator1", -26.0, false),
    };

    let layers = player_layers();
    commands.spawn((
        (
            Name::new("Player"),
            Player,
            ShipConfig::default(),
            PlayerLifeState::Alive,
            ShipAnimator::default(),
            indicators,
            Activation::Active,
        ),
        Sprite {
            color: Color::srgb(0.2, 0.75, 0.9),
            custom_size: Some(Vec2::new(SHIP_RADIUS * 1.6, SHIP_RADIUS * 2.2)),
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 1.0),
        (
            RigidBody::Kinematic,
            Collider::circle(SHIP_RADIUS),
            Sensor,
            ActiveLayers(layers),
            layers,
            LinearVelocity::ZERO,
            CollisionEventsEnabled,
        ),
        DespawnOnExit(GameState::Active),
    ));
}

// -----------------------------------------------------------------------------
// Commands
// -----------------------------------------------------------------------------

/// Replace any axis whose magnitude exceeds `max` with the signed maximum.
#[inline]
pub fn clamp_axis_velocity(velocity: Vec2, max: f32) -> Vec2 {
    let clamp = |v: f32| if v.abs() > max { max.copysign(v) } else { v };
    Vec2::new(clamp(velocity.x), clamp(velocity.y))
}

/// Thrust along the ship's local ±Y.
pub fn add_relative_force(
    direction: ForceDirection,
    config: &ShipConfig,
    transform: &Transform,
    velocity: &mut LinearVelocity,
    anim: &mut ShipAnimator,
    dt: f32,
) {
    anim.current_speed = velocity.0.length();

    let local = match direction {
        ForceDirection::Up => {
            anim.input_speed = 1.0;
            Vec3::Y
        }
        ForceDirection::Down if config.ship_backwards_allowed => {
            anim.input_speed = -1.0;
            Vec3::NEG_Y
        }
        ForceDirection::Down | ForceDirection::None => {
            anim.input_speed = 0.0;
            return;
        }
    };

    let heading = (transform.rotation * local).truncate();
    velocity.0 += heading * config.main_force * dt;
    velocity.0 = clamp_axis_velocity(velocity.0, config.max_axis_velocity);

    anim.current_speed = velocity.0.length();
}

pub fn add_rotation(
    direction: RotationDirection,
    config: &ShipConfig,
    transform: &mut Transform,
    anim: &mut ShipAnimator,
    dt: f32,
) {
    let sign = match direction {
        RotationDirection::Right => -1.0,
        RotationDirection::Left => 1.0,
        RotationDirection::None => 0.0,
    };
    anim.rotation = sign;
    transform.rotate_z((config.rotation_force * dt * sign).to_radians());
}

fn accepts_commands(activation: Activation, state: PlayerLifeState) -> bool {
    activation.is_active() && state != PlayerLifeState::InDeathAnimation
}

pub fn gather_input(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut input: ResMut<ShipInput>,
    q_player: Query<(Entity, &Activation, &PlayerLifeState), With<Player>>,
    mut shoot: MessageWriter<ShootRequest>,
) {
    let Ok((player, activation, state)) = q_player.single() else {
        *input = ShipInput::default();
        return;
    };
    let Some(keys) = keys else {
        return;
    };
    if !accepts_commands(*activation, *state) {
        *input = ShipInput::default();
        return;
    }

    let axis = |pos: [KeyCode; 2], neg: [KeyCode; 2]| {
        i8::from(keys.any_pressed(pos)) - i8::from(keys.any_pressed(neg))
    };

    input.thrust = match axis([KeyCode::KeyW, KeyCode::ArrowUp], [KeyCode::KeyS, KeyCode::ArrowDown]) {
        1 => ForceDirection::Up,
        -1 => ForceDirection::Down,
        _ => ForceDirection::None,
    };
    input.rotation = match axis(
        [KeyCode::KeyD, KeyCode::ArrowRight],
        [KeyCode::KeyA, KeyCode::ArrowLeft],
    ) {
        1 => RotationDirection::Right,
        -1 => RotationDirection::Left,
        _ => RotationDirection::None,
    };

    if keys.just_pressed(KeyCode::Space) {
        shoot.write(ShootRequest { shooter: player });
    }
}

pub fn apply_ship_input(
    time: Res<Time>,
    input: Res<ShipInput>,
    mut q_player: Query<
        (
            &ShipConfig,
            &Activation,
            &PlayerLifeState,
            &mut Transform,
            &mut LinearVelocity,
            &mut ShipAnimator,
        ),
        With<Player>,
    >,
) {
    let dt = time.delta_secs();
    for (config, activation, state, mut tf, mut vel, mut anim) in &mut q_player {
        if !accepts_commands(*activation, *state) {
            continue;
        }
        add_rotation(input.rotation, config, &mut tf, &mut anim, dt);
        add_relative_force(input.thrust, config, &tf, &mut vel, &mut anim, dt);
    }
}

// -----------------------------------------------------------------------------
// Collisions
// -----------------------------------------------------------------------------

pub fn player_collisions(
    mut commands: Commands,
    mut started: MessageReader<CollisionStart>,
    game: Res<Game>,
    q_layers: Query<&CollisionLayers>,
    mut q_players: Query<(&ShipConfig, &mut PlayerLifeState), With<Player>>,
    mut destroyed: MessageWriter<PlayerDestroyed>,
    mut seen: Local<HashSet<Entity>>,
) {
    seen.clear();

    for ev in started.read() {
        for (player, other) in [(ev.collider1, ev.collider2), (ev.collider2, ev.collider1)] {
            let Ok((config, mut state)) = q_players.get_mut(player) else {
                continue;
            };
            let hazard = q_layers
                .get(other)
                .is_ok_and(|l| l.memberships.has_all(Layer::Asteroid));
            if !hazard || *state != PlayerLifeState::Alive {
                continue;
            }
            if !seen.insert(player) {
                continue;
            }

            if config.destroy_on_collision || game.current_player_lives == 1 {
                *state = PlayerLifeState::InDeathAnimation;
                commands.queue(move |world: &mut World| begin_death_sequence(world, player));
            } else {
                destroyed.write(PlayerDestroyed {
                    player,
                    lives_lost: 1,
                });
                *state = PlayerLifeState::Invulnerable;
                commands.queue(move |world: &mut World| start_invulnerability(world, player));
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Timed transitions
// -----------------------------------------------------------------------------

fn set_sprite_alpha(world: &mut World, entity: Entity, alpha: f32) {
    if let Some(mut sprite) = world.get_mut::<Sprite>(entity) {
        sprite.color.set_alpha(alpha);
    }
}

fn end_invulnerability(world: &mut World, entity: Entity) {
    let Some(mut state) = world.get_mut::<PlayerLifeState>(entity) else {
        return;
    };
    if *state == PlayerLifeState::Invulnerable {
        *state = PlayerLifeState::Alive;
        debug!("player {entity:?} is vulnerable again");
    }
}

fn blink_half_period(total: Duration, blinks: u32) -> Duration {
    total / blinks.saturating_mul(2).max(1)
}

/// `blinks` on/off cycles spread over `total`, then back to `Alive`.
pub fn invulnerability_sequence(total: Duration, blinks: u32, original_alpha: f32) -> TimedSequence {
    if blinks == 0 {
        return TimedSequence::after(total, end_invulnerability);
    }

    let half_period = blink_half_period(total, blinks);
    let mut sequence = TimedSequence::new();
    for _ in 0..blinks {
        sequence = sequence
            .then(half_period, |world: &mut World, e: Entity| {
                set_sprite_alpha(world, e, 0.0)
            })
            .then(half_period, move |world: &mut World, e: Entity| {
                set_sprite_alpha(world, e, original_alpha)
            });
    }
    sequence.then(Duration::ZERO, end_invulnerability)
}

pub fn start_invulnerability(world: &mut World, player: Entity) {
    let Some(config) = world.get::<ShipConfig>(player) else {
        return;
    };
    let total = delay_from_secs(config.respawn_invulnerable_secs);
    let blinks = config.invulnerable_blinks;
    let original_alpha = world
        .get::<Sprite>(player)
        .map_or(1.0, |sprite| sprite.color.alpha());

    world
        .entity_mut(player)
        .insert(invulnerability_sequence(total, blinks, original_alpha));
}

fn finish_death(world: &mut World, player: Entity) {
    if let Some(mut state) = world.get_mut::<PlayerLifeState>(player) {
        *state = PlayerLifeState::Inactive;
    }
    world.entity_mut(player).insert(Activation::Inactive);
    world.write_message(PlayerDestroyed {
        player,
        lives_lost: 1,
    });
    info!("player {player:?} destroyed");
}

pub fn begin_death_sequence(world: &mut World, player: Entity) {
    let Some(config) = world.get::<ShipConfig>(player).cloned() else {
        return;
    };
    let at = world.get::<Transform>(player).copied().unwrap_or_default();

    if let Some(clip) = config.destroy_sound {
        world.write_message(PlaySound { clip });
    }
    if let Some(debris) = &config.debris {
        spawn_debris(world, debris, &at);
    }
    if let Some(mut anim) = world.get_mut::<ShipAnimator>(player) {
        anim.death = true;
    }
    if let Some(mut state) = world.get_mut::<PlayerLifeState>(player) {
        *state = PlayerLifeState::InDeathAnimation;
    }

    let wait = config.death_animation.unwrap_or(Duration::ZERO);
    world
        .entity_mut(player)
        .insert(TimedSequence::after(wait, finish_death));
}

// -----------------------------------------------------------------------------
// Respawn
// -----------------------------------------------------------------------------

pub fn respawn_players(
    mut commands: Commands,
    mut requests: MessageReader<RespawnPlayer>,
    game: Res<Game>,
    mut q_players: Query<
        (
            &ShipConfig,
            &LifeIndicators,
            &mut ShipAnimator,
            &mut Transform,
            &mut Activation,
            &mut PlayerLifeState,
        ),
        With<Player>,
    >,
    mut q_indicators: Query<&mut Visibility, (With<LifeIndicator>, Without<Player>)>,
) {
    for &RespawnPlayer { player } in requests.read() {
        let Ok((config, indicators, mut anim, mut tf, mut activation, mut state)) =
            q_players.get_mut(player)
        else {
            continue;
        };

        anim.death = false;
        anim.shoot = false;

        if let Some(shown) = indicator_visibility(game.current_player_lives) {
            let targets = [indicators.at_three, indicators.at_two, indicators.at_one];
            for (indicator, visible) in targets.into_iter().zip(shown) {
                if let Ok(mut vis) = q_indicators.get_mut(indicator) {
                    *vis = if visible {
                        Visibility::Visible
                    } else {
                        Visibility::Hidden
                    };
                }
            }
        }

        if !config.destroy_on_collision {
            continue;
        }

        tf.translation = Vec3::new(0.0, 0.0, tf.translation.z);
        tf.rotation = Quat::IDENTITY;
        *activation = Activation::Active;
        *state = PlayerLifeState::Invulnerable;
        commands.queue(move |world: &mut World| start_invulnerability(world, player));
        info!("player {player:?} respawned with {} lives", game.current_player_lives);
    }
}
