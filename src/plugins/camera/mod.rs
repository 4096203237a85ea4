//! Camera plugin (render-only).
//!
//! The playfield is a fixed region around the origin, so the camera never moves.
//! Scaling the camera transform maps world units to window pixels.

use bevy::prelude::*;

/// World units visible vertically in a 720px tall window.
pub const VIEW_HEIGHT: f32 = 40.0;
const WINDOW_HEIGHT_PX: f32 = 720.0;

#[derive(Component)]
pub struct MainCamera;

pub fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_camera);
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Name::new("MainCamera"),
        Camera2d,
        MainCamera,
        Transform::from_xyz(0.0, 0.0, 999.0)
            .with_scale(Vec3::splat(VIEW_HEIGHT / WINDOW_HEIGHT_PX)),
    ));
}
