//! Timed transitions: per-entity `(delay, action)` sequences.
//!
//! Delayed and periodic behaviour (invulnerability blinking, the death-animation
//! wait, debris and bullet lifetimes) is expressed as a [`TimedSequence`] attached
//! to the entity that owns it.
//!
//! ```text
//!   Update (variable dt)
//!   advance_timed_sequences
//!     for each entity with TimedSequence:
//!       budget = dt
//!       while head step remaining <= budget:
//!         budget -= remaining; pop; run action(world, entity)
//!       head step remaining -= budget
//! ```
//!
//! Rules:
//! - One sequence per entity. Inserting a new one replaces the old one, which drops
//!   its remaining steps (superseded = cancelled).
//! - Leftover time carries into the next step, so a periodic pattern does not drift
//!   with the frame rate.
//! - If an action replaces or removes its own sequence (or despawns the entity), the
//!   stale sequence stops right there.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bevy::prelude::*;

pub type Action = Box<dyn FnOnce(&mut World, Entity) + Send + Sync>;

static NEXT_SEQUENCE_ID: AtomicU64 = AtomicU64::new(1);

struct Step {
    remaining: Duration,
    action: Action,
}

#[derive(Component)]
pub struct TimedSequence {
    id: u64,
    steps: VecDeque<Step>,
}

impl fmt::Debug for TimedSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedSequence")
            .field("id", &self.id)
            .field("pending_steps", &self.steps.len())
            .field("next_in", &self.steps.front().map(|s| s.remaining))
            .finish()
    }
}

impl Default for TimedSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl TimedSequence {
    pub fn new() -> Self {
        Self {
            id: NEXT_SEQUENCE_ID.fetch_add(1, Ordering::Relaxed),
            steps: VecDeque::new(),
        }
    }

    /// Single-step sequence.
    pub fn after(
        delay: Duration,
        action: impl FnOnce(&mut World, Entity) + Send + Sync + 'static,
    ) -> Self {
        Self::new().then(delay, action)
    }

    /// Append a step that fires `delay` after the previous one.
    pub fn then(
        mut self,
        delay: Duration,
        action: impl FnOnce(&mut World, Entity) + Send + Sync + 'static,
    ) -> Self {
        self.steps.push_back(Step {
            remaining: delay,
            action: Box::new(action),
        });
        self
    }

    #[inline]
    pub fn pending_steps(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.steps.is_empty()
    }

    /// Pop the head step if `budget` covers it, charging the budget.
    /// Otherwise spend the whole budget on the head step and return `None`.
    fn take_due(&mut self, budget: &mut Duration) -> Option<Action> {
        let head = self.steps.front_mut()?;
        if head.remaining > *budget {
            head.remaining -= *budget;
            *budget = Duration::ZERO;
            return None;
        }
        *budget -= head.remaining;
        self.steps.pop_front().map(|step| step.action)
    }
}

/// Seconds from configuration as a step delay. Negative or NaN is immediate,
/// anything too large for a `Duration` never fires.
pub fn delay_from_secs(secs: f32) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f32(secs).unwrap_or(Duration::MAX)
}

pub fn plugin(app: &mut App) {
    app.add_systems(Update, advance_timed_sequences);
}

/// Exclusive: actions get full `&mut World` access (spawn, despawn, write messages).
pub fn advance_timed_sequences(world: &mut World) {
    let dt = world.resource::<Time>().delta();

    let owners: Vec<Entity> = world
        .query_filtered::<Entity, With<TimedSequence>>()
        .iter(world)
        .collect();

    for entity in owners {
        let mut budget = dt;
        let mut current_id = None;

        loop {
            let Some(mut sequence) = world.get_mut::<TimedSequence>(entity) else {
                break;
            };
            let id = sequence.id;
            if current_id.is_some_and(|current| current != id) {
                // Replaced by the previous action; the new sequence starts next frame.
                break;
            }
            current_id = Some(id);

            let Some(action) = sequence.take_due(&mut budget) else {
                break;
            };
            action(world, entity);
        }

        let finished = world
            .get::<TimedSequence>(entity)
            .is_some_and(|s| Some(s.id) == current_id && s.is_finished());
        if finished {
            world.entity_mut(entity).remove::<TimedSequence>();
        }
    }
}

#[cfg(test)]
mod tests;
