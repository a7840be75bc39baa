use bevy::prelude::*;

use crate::components::{GamePosition, HeadlessMode, Player, VIEW_WIDTH};
use crate::game_runtime::TickSet;
use crate::level::LevelRuntime;
use crate::player;

/// Fraction of the view kept behind the player, so most of the screen shows
/// what lies ahead.
const VIEW_LEAD: f32 = 0.4;

/// Left edge of the visible slice of the level, in gameplay pixels. Renderer
/// culling and the camera transform both read this.
#[derive(Resource, Default)]
pub struct CameraX(pub f32);

#[derive(Component)]
pub struct MainCamera;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraX>()
            .add_systems(Startup, spawn_camera)
            .add_systems(
                FixedUpdate,
                follow_player
                    .in_set(TickSet::Player)
                    .after(player::move_player),
            );
    }
}

fn spawn_camera(mut commands: Commands, headless: Res<HeadlessMode>) {
    if headless.0 {
        return;
    }
    commands.spawn((MainCamera, Camera2d, Transform::from_xyz(0.0, 0.0, 100.0)));
}

fn follow_player(
    mut camera_x: ResMut<CameraX>,
    runtime: Res<LevelRuntime>,
    players: Query<&GamePosition, With<Player>>,
) {
    let Ok(pos) = players.get_single() else {
        return;
    };
    let span = (runtime.width - VIEW_WIDTH).max(0.0);
    camera_x.0 = (pos.x - VIEW_WIDTH * VIEW_LEAD).clamp(0.0, span);
}
