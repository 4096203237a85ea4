//! Destruction feedback shared by asteroids and the ship.
//!
//! - `PlaySound`: boundary message for the external audio collaborator.
//! - `DebrisSpawn`: optional cosmetic object left behind on destruction, with an
//!   optional lifetime driven by a [`TimedSequence`].

use std::time::Duration;

use bevy::prelude::*;

use crate::plugins::pool::Template;
use crate::plugins::sequence::TimedSequence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundId(pub &'static str);

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaySound {
    pub clip: SoundId,
}

/// Marker for spawned destruction debris.
#[derive(Component, Debug, Clone, Copy)]
pub struct Debris;

#[derive(Debug, Clone)]
pub struct DebrisSpawn {
    pub template: Template,
    /// Copy the destroyed entity's rotation onto the debris.
    pub match_rotation: bool,
    /// `None` keeps the debris forever.
    pub despawn_after: Option<Duration>,
}

impl DebrisSpawn {
    pub fn new(template: Template) -> Self {
        Self {
            template,
            match_rotation: false,
            despawn_after: None,
        }
    }

    pub fn matching_rotation(mut self) -> Self {
        self.match_rotation = true;
        self
    }

    pub fn despawn_after(mut self, delay: Duration) -> Self {
        self.despawn_after = Some(delay);
        self
    }
}

pub fn plugin(app: &mut App) {
    app.add_message::<PlaySound>();
}

pub fn spawn_debris(world: &mut World, debris: &DebrisSpawn, at: &Transform) -> Entity {
    let mut transform = Transform::from_translation(at.translation);
    if debris.match_rotation {
        transform.rotation = at.rotation;
    }

    let entity = debris.template.instantiate(world);
    world.entity_mut(entity).insert((Debris, transform));

    if let Some(delay) = debris.despawn_after {
        world
            .entity_mut(entity)
            .insert(TimedSequence::after(delay, |world: &mut World, e: Entity| {
                world.despawn(e);
            }));
    }
    entity
}
