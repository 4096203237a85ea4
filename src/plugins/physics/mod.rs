//! Physics collaborator: avian2d integrates velocities and reports contacts.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::tunables::Tunables;

pub fn plugin(app: &mut App) {
    let length_unit = app.world().resource::<Tunables>().length_unit;
    app.add_plugins(PhysicsPlugins::default().with_length_unit(length_unit));
    app.insert_resource(Gravity(Vec2::ZERO));
}
