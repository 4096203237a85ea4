//! Object pooling: reuse inactive instances, grow only when none is free.
//!
//! # Lifecycle
//! ```text
//!   register_pool ── pre-warm K instances (Inactive)
//!        │
//!   acquire ──► scan entries for Activation::Inactive ──► mark Active, bump generation
//!        │                 (none free)
//!        └──────────────► instantiate template, append entry, mark Active
//!
//!   owner sets Activation::Inactive  ──►  entry is discoverable again
//!   (or calls `release`, which also stops it at once)
//! ```
//!
//! The pool observes the `Activation` flag of each instance. The pool never shrinks.
//!
//! # Inactive invariants
//! `apply_activation` commits the presentation/physics side of the flag;
//! `release` clears velocity up front. Inactive instances must be:
//! - hidden
//! - velocity = 0
//! - collide with nothing (filters empty)

use std::fmt;
use std::sync::Arc;

use avian2d::prelude::*;
use bevy::prelude::*;
use thiserror::Error;

use crate::common::layers::Layer;
use crate::common::rng::GameRng;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool `{pool}` uses a randomized template set but none has been configured")]
    EmptyTemplateSet { pool: String },
    #[error("no pool registered under {0:?}")]
    UnknownPool(PoolId),
}

/// Active/inactive flag of a (possibly pooled) instance.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    #[default]
    Inactive,
    Active,
}

impl Activation {
    #[inline]
    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

/// Collision layers an instance uses while active.
#[derive(Component, Debug, Clone, Copy)]
pub struct ActiveLayers(pub CollisionLayers);

#[inline]
pub fn inactive_layers(layers: CollisionLayers) -> CollisionLayers {
    CollisionLayers::new(layers.memberships, [] as [Layer; 0])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolId(usize);

/// Bookkeeping every pooled instance carries.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolMember {
    pub pool: PoolId,
    pub index: usize,
    /// Bumped on every activation.
    pub generation: u32,
}

/// Handle to one activation of a pooled instance.
///
/// The entity id stays valid across reuse; the generation tells activations apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolHandle {
    pub entity: Entity,
    pub generation: u32,
}

type Build = dyn Fn(&mut EntityWorldMut) + Send + Sync;

/// Named recipe that fills a freshly spawned entity with components.
#[derive(Clone)]
pub struct Template {
    name: String,
    build: Arc<Build>,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Template").field(&self.name).finish()
    }
}

impl Template {
    pub fn new(
        name: impl Into<String>,
        build: impl Fn(&mut EntityWorldMut) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            build: Arc::new(build),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instantiate(&self, world: &mut World) -> Entity {
        let mut entity = world.spawn(Name::new(self.name.clone()));
        (self.build)(&mut entity);
        entity.id()
    }
}

#[derive(Debug, Clone)]
pub enum TemplateSource {
    Single(Template),
    /// Uniform random pick each time a new instance is created.
    RandomSet(Vec<Template>),
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub source: TemplateSource,
    pub pregenerated: usize,
}

impl PoolConfig {
    pub fn single(template: Template) -> Self {
        Self {
            source: TemplateSource::Single(template),
            pregenerated: 0,
        }
    }

    pub fn random_set(templates: Vec<Template>) -> Self {
        Self {
            source: TemplateSource::RandomSet(templates),
            pregenerated: 0,
        }
    }

    pub fn with_pregenerated(mut self, count: usize) -> Self {
        self.pregenerated = count;
        self
    }
}

#[derive(Debug)]
pub struct ObjectPool {
    id: PoolId,
    name: String,
    source: TemplateSource,
    entries: Vec<Entity>,
    empty_set_reported: bool,
}

impl ObjectPool {
    fn new(id: PoolId, name: String, source: TemplateSource) -> Self {
        Self {
            id,
            name,
            source,
            entries: Vec::new(),
            empty_set_reported: false,
        }
    }

    pub fn id(&self) -> PoolId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entries
    }

    pub fn active_count(&self, world: &World) -> usize {
        self.entries
            .iter()
            .filter(|&&e| world.get::<Activation>(e).is_some_and(|a| a.is_active()))
            .count()
    }

    /// Reuse the first inactive entry, or create one.
    pub fn get(&mut self, world: &mut World) -> Result<PoolHandle, PoolError> {
        let free = self
            .entries
            .iter()
            .copied()
            .find(|&e| world.get::<Activation>(e).is_some_and(|a| !a.is_active()));

        let entity = match free {
            Some(entity) => entity,
            None => {
                let entity = self.create(world)?;
                debug!("pool `{}` grew to {} entries", self.name, self.entries.len());
                entity
            }
        };

        Ok(activate(world, entity))
    }

    /// Instantiate one inactive entry from the template policy.
    fn create(&mut self, world: &mut World) -> Result<Entity, PoolError> {
        let template = match &self.source {
            TemplateSource::Single(template) => template.clone(),
            TemplateSource::RandomSet(templates) if templates.is_empty() => {
                if self.report_empty_set() {
                    error!("pool `{}`: no randomized templates have been set", self.name);
                }
                return Err(PoolError::EmptyTemplateSet {
                    pool: self.name.clone(),
                });
            }
            TemplateSource::RandomSet(templates) => {
                let pick = world.resource_mut::<GameRng>().index(templates.len());
                templates[pick].clone()
            }
        };

        let entity = template.instantiate(world);
        world.entity_mut(entity).insert((
            PoolMember {
                pool: self.id,
                index: self.entries.len(),
                generation: 0,
            },
            Activation::Inactive,
        ));
        self.entries.push(entity);
        Ok(entity)
    }

    /// `true` only the first time; the error is logged once per pool.
    fn report_empty_set(&mut self) -> bool {
        !std::mem::replace(&mut self.empty_set_reported, true)
    }
}

fn activate(world: &mut World, entity: Entity) -> PoolHandle {
    let generation = {
        let mut member = world
            .get_mut::<PoolMember>(entity)
            .expect("pool entry is missing its PoolMember component");
        member.generation = member.generation.wrapping_add(1);
        member.generation
    };

    world.entity_mut(entity).insert(Activation::Active);
    PoolHandle { entity, generation }
}

/// Mark an instance inactive and stop it immediately.
///
/// The instance may be handed out again before `apply_activation` sees the
/// change, so velocity is cleared here rather than left to the next commit.
pub fn release(world: &mut World, entity: Entity) {
    let Ok(mut entity) = world.get_entity_mut(entity) else {
        return;
    };
    if let Some(mut vel) = entity.get_mut::<LinearVelocity>() {
        vel.0 = Vec2::ZERO;
    }
    entity.insert(Activation::Inactive);
}

/// All pools, addressed by [`PoolId`].
#[derive(Resource, Debug, Default)]
pub struct ObjectPools {
    pools: Vec<ObjectPool>,
}

impl ObjectPools {
    pub fn pool(&self, id: PoolId) -> Option<&ObjectPool> {
        self.pools.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

/// Register a pool and pre-warm it.
///
/// A randomized pool with no templates still registers; the configuration error
/// is reported by the first creation attempt (here, if pre-warming).
pub fn register_pool(world: &mut World, name: impl Into<String>, config: PoolConfig) -> PoolId {
    world.init_resource::<ObjectPools>();
    let name = name.into();

    world.resource_scope(|world, mut pools: Mut<ObjectPools>| {
        let id = PoolId(pools.pools.len());
        let mut pool = ObjectPool::new(id, name, config.source);

        for _ in 0..config.pregenerated {
            if pool.create(world).is_err() {
                break;
            }
        }
        debug!("pool `{}` registered with {} pre-warmed entries", pool.name, pool.len());

        pools.pools.push(pool);
        id
    })
}

pub fn acquire(world: &mut World, id: PoolId) -> Result<PoolHandle, PoolError> {
    world.resource_scope(|world, mut pools: Mut<ObjectPools>| {
        let pool = pools.pools.get_mut(id.0).ok_or(PoolError::UnknownPool(id))?;
        pool.get(world)
    })
}

/// `false` once the instance was released (and possibly handed out again).
pub fn is_current(world: &World, handle: PoolHandle) -> bool {
    let active = world
        .get::<Activation>(handle.entity)
        .is_some_and(|a| a.is_active());
    let same_generation = world
        .get::<PoolMember>(handle.entity)
        .is_some_and(|m| m.generation == handle.generation);
    active && same_generation
}

pub fn plugin(app: &mut App) {
    app.init_resource::<ObjectPools>();
    app.add_systems(FixedPostUpdate, apply_activation);
    app.add_systems(PostUpdate, apply_activation);
}

/// Commit activation changes (no structural toggles).
///
/// This mutates component values directly, avoiding archetype moves.
pub fn apply_activation(
    mut q: Query<
        (
            &Activation,
            Option<&ActiveLayers>,
            Option<&mut CollisionLayers>,
            Option<&mut LinearVelocity>,
            Option<&mut Visibility>,
        ),
        Changed<Activation>,
    >,
) {
    for (activation, active_layers, layers, vel, vis) in &mut q {
        match activation {
            Activation::Active => {
                if let (Some(active), Some(mut layers)) = (active_layers, layers) {
                    *layers = active.0;
                }
                if let Some(mut vis) = vis {
                    *vis = Visibility::Visible;
                }
            }
            Activation::Inactive => {
                if let Some(mut layers) = layers {
                    *layers = inactive_layers(*layers);
                }
                if let Some(mut vel) = vel {
                    vel.0 = Vec2::ZERO;
                }
                if let Some(mut vis) = vis {
                    *vis = Visibility::Hidden;
                }
            }
        }
    }
}
