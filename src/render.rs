//! Screen sync and view culling over the gameplay coordinate space.
//!
//! Simulation code works in y-down world pixels with top-left anchored
//! rectangles; only the systems here convert to bevy's centered y-up
//! transforms. Culling hides whatever the camera left behind and keeps the
//! visible/total tallies the performance monitor watches.

use bevy::prelude::*;

use crate::bullets::Bullet;
use crate::camera::{CameraX, MainCamera};
use crate::components::{
    Alive, Extent, GamePosition, HeadlessMode, Player, VIEW_HEIGHT, VIEW_WIDTH,
};
use crate::enemies::Enemy;
use crate::items::Powerup;
use crate::level::{Block, Checkpoint, Coin, Flag, House, LevelRuntime, LevelTheme, Pipe, Platform};
use crate::object_pool::Pooled;

pub const PLAYER_COLOR: Color = Color::srgb(1.0, 0.255, 0.212);
pub const PLAYER_BULLET_COLOR: Color = Color::srgb(1.0, 0.18, 0.18);
pub const ENEMY_BULLET_COLOR: Color = Color::srgb(1.0, 0.8, 0.0);
pub const POWERUP_COLOR: Color = Color::srgb(1.0, 0.267, 0.267);

/// Slack added to the view rectangle before an entity counts as off screen.
const CULL_MARGIN: f32 = 20.0;
/// Houses are wide scenery; give them a generous lead so they never pop in.
const HOUSE_CULL_MARGIN: f32 = 200.0;
const PIPE_CULL_MARGIN: f32 = 40.0;

/// Sprite tints for one level theme. Entity tints are shared across themes;
/// only the sky varies.
pub struct Palette {
    pub background: Color,
    pub platform: Color,
    pub house: Color,
    pub block: Color,
    pub brick: Color,
    pub coin: Color,
    pub enemy: Color,
    pub shooter: Color,
    pub pipe: Color,
    pub checkpoint: Color,
    pub flag: Color,
}

pub fn theme_palette(theme: LevelTheme) -> Palette {
    let background = match theme {
        LevelTheme::Overworld => Color::srgb(0.463, 0.722, 1.0),
        LevelTheme::Underground => Color::srgb(0.102, 0.102, 0.102),
        LevelTheme::Desert => Color::srgb(0.969, 0.773, 0.42),
        LevelTheme::Snow => Color::srgb(0.749, 0.914, 1.0),
        LevelTheme::Sky => Color::srgb(0.722, 0.886, 1.0),
        LevelTheme::Castle => Color::srgb(0.243, 0.243, 0.243),
    };
    Palette {
        background,
        platform: Color::srgb(0.831, 0.451, 0.243),
        house: Color::srgb(0.545, 0.271, 0.075),
        block: Color::srgb(0.784, 0.541, 0.102),
        brick: Color::srgb(0.722, 0.451, 0.2),
        coin: Color::srgb(1.0, 0.843, 0.0),
        enemy: Color::srgb(0.545, 0.271, 0.075),
        shooter: Color::srgb(0.0, 0.0, 0.502),
        pipe: Color::srgb(0.039, 0.604, 0.165),
        checkpoint: Color::srgb(0.8, 0.8, 0.8),
        flag: Color::srgb(1.0, 0.0, 0.0),
    }
}

/// Renderer fidelity tier. The performance monitor's emergency pass drops
/// this to `Low`, which sheds decorative scenery; culling itself stays on at
/// every tier.
#[derive(Resource, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum RenderQuality {
    #[default]
    High,
    #[allow(dead_code)]
    Medium,
    Low,
}

/// Per-frame culling tallies. `total_objects` counts the simulated batches
/// (platforms, blocks, coins, enemies, projectiles, powerups) whether or not
/// they are on screen; scenery such as houses and pipes only shows up in
/// `visible_objects` when drawn.
#[derive(Resource, Default, Clone, Copy, Debug)]
pub struct CullingStats {
    pub total_objects: usize,
    pub visible_objects: usize,
}

impl CullingStats {
    /// Fraction of tracked objects actually drawn; zero when nothing is
    /// tracked yet.
    pub fn efficiency(&self) -> f32 {
        self.visible_objects as f32 / (self.total_objects.max(1)) as f32
    }
}

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CullingStats>()
            .init_resource::<RenderQuality>()
            .init_resource::<ClearColor>()
            .add_systems(
                Update,
                (
                    apply_theme_background,
                    sync_transforms,
                    sync_sprite_sizes,
                    sync_camera,
                    cull_offscreen,
                )
                    .chain(),
            );
    }
}

fn apply_theme_background(runtime: Res<LevelRuntime>, mut clear: ResMut<ClearColor>) {
    if !runtime.is_changed() {
        return;
    }
    clear.0 = theme_palette(runtime.theme).background;
}

/// Map top-left gameplay rectangles onto centered y-up transforms. The z
/// coordinate set at spawn time is the draw layer and is left alone.
fn sync_transforms(
    mut objects: Query<
        (&GamePosition, &Extent, &mut Transform),
        Or<(Changed<GamePosition>, Changed<Extent>)>,
    >,
) {
    for (pos, ext, mut transform) in objects.iter_mut() {
        transform.translation.x = pos.x + ext.w * 0.5;
        transform.translation.y = VIEW_HEIGHT * 0.5 - (pos.y + ext.h * 0.5);
    }
}

/// Keep sprite quads in step with collision rectangles; only the player ever
/// resizes, when a grow powerup promotes or a hit demotes it.
fn sync_sprite_sizes(mut sprites: Query<(&Extent, &mut Sprite), Changed<Extent>>) {
    for (ext, mut sprite) in sprites.iter_mut() {
        sprite.custom_size = Some(Vec2::new(ext.w, ext.h));
    }
}

fn sync_camera(camera_x: Res<CameraX>, mut camera: Query<&mut Transform, With<MainCamera>>) {
    let Ok(mut transform) = camera.get_single_mut() else {
        return;
    };
    transform.translation.x = camera_x.0 + VIEW_WIDTH * 0.5;
}

/// Horizontal-only view test; vertical travel never leaves the viewport.
fn in_view(x: f32, w: f32, camera_x: f32, margin: f32) -> bool {
    x + w >= camera_x - margin && x <= camera_x + VIEW_WIDTH + margin
}

/// Hide everything the camera cannot see and refresh the culling tallies.
/// Runs headless too so the performance monitor reads the same efficiency
/// figures either way; only the Visibility writes are windowed-only.
#[allow(clippy::type_complexity)]
fn cull_offscreen(
    camera_x: Res<CameraX>,
    headless: Res<HeadlessMode>,
    quality: Res<RenderQuality>,
    mut stats: ResMut<CullingStats>,
    mut objects: Query<
        (
            &GamePosition,
            &Extent,
            Option<&Alive>,
            Option<&Pooled>,
            Option<&House>,
            Option<&Pipe>,
            &mut Visibility,
        ),
        (
            Without<Player>,
            Or<(
                With<Platform>,
                With<Block>,
                With<Coin>,
                With<Enemy>,
                With<Bullet>,
                With<Powerup>,
                With<House>,
                With<Pipe>,
                With<Checkpoint>,
                With<Flag>,
            )>,
        ),
    >,
) {
    let mut total = 0usize;
    let mut visible = 0usize;
    let shed_scenery = *quality == RenderQuality::Low;

    for (pos, ext, alive, pooled, house, pipe, mut vis) in objects.iter_mut() {
        let dead = alive.map_or(false, |a| !a.0);

        // Parked pool entities are off the books entirely, matching how a
        // returned object leaves its pool's active list.
        if pooled.is_some() && dead {
            if !headless.0 && *vis != Visibility::Hidden {
                *vis = Visibility::Hidden;
            }
            continue;
        }

        let scenery = house.is_some() || pipe.is_some();
        if !scenery {
            total += 1;
        }

        let margin = if house.is_some() {
            HOUSE_CULL_MARGIN
        } else if pipe.is_some() {
            PIPE_CULL_MARGIN
        } else {
            CULL_MARGIN
        };

        let drawn = !dead
            && in_view(pos.x, ext.w, camera_x.0, margin)
            && !(shed_scenery && house.is_some());
        if drawn {
            visible += 1;
        }

        if !headless.0 {
            let target = if drawn {
                Visibility::Inherited
            } else {
                Visibility::Hidden
            };
            if *vis != target {
                *vis = target;
            }
        }
    }

    stats.total_objects = total;
    stats.visible_objects = visible;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{BlockContents, BlockKind, PipeDir, SpawnPoint};
    use crate::object_pool::PoolKind;

    fn test_app() -> App {
        let mut app = App::new();
        app.insert_resource(HeadlessMode(false))
            .init_resource::<CameraX>()
            .init_resource::<LevelRuntime>()
            .init_resource::<CullingStats>()
            .init_resource::<RenderQuality>()
            .init_resource::<ClearColor>()
            .add_systems(
                Update,
                (
                    apply_theme_background,
                    sync_transforms,
                    sync_sprite_sizes,
                    sync_camera,
                    cull_offscreen,
                )
                    .chain(),
            );
        app
    }

    fn spawn_platform(app: &mut App, x: f32, w: f32) -> Entity {
        app.world_mut()
            .spawn((
                Platform,
                GamePosition { x, y: 400.0 },
                Extent { w, h: 20.0 },
                Transform::from_xyz(0.0, 0.0, 1.0),
                Visibility::default(),
            ))
            .id()
    }

    fn visibility(app: &App, entity: Entity) -> Visibility {
        *app.world().entity(entity).get::<Visibility>().unwrap()
    }

    #[test]
    fn world_positions_map_to_screen_centers() {
        let mut app = test_app();
        let e = app
            .world_mut()
            .spawn((
                Platform,
                GamePosition { x: 100.0, y: 472.0 },
                Extent { w: 64.0, h: 68.0 },
                Transform::from_xyz(0.0, 0.0, 5.0),
                Visibility::default(),
            ))
            .id();

        app.update();

        let tf = app.world().entity(e).get::<Transform>().unwrap();
        assert_eq!(tf.translation.x, 132.0);
        assert_eq!(tf.translation.y, VIEW_HEIGHT * 0.5 - 506.0);
        assert_eq!(tf.translation.z, 5.0);
    }

    #[test]
    fn camera_transform_tracks_the_scroll() {
        let mut app = test_app();
        let cam = app
            .world_mut()
            .spawn((MainCamera, Transform::from_xyz(0.0, 0.0, 100.0)))
            .id();
        app.world_mut().resource_mut::<CameraX>().0 = 600.0;

        app.update();

        let tf = app.world().entity(cam).get::<Transform>().unwrap();
        assert_eq!(tf.translation.x, 600.0 + VIEW_WIDTH * 0.5);
        assert_eq!(tf.translation.z, 100.0);
    }

    #[test]
    fn culling_hides_what_the_camera_left_behind() {
        let mut app = test_app();
        let behind = spawn_platform(&mut app, 100.0, 200.0);
        let ahead = spawn_platform(&mut app, 1200.0, 200.0);
        app.world_mut().resource_mut::<CameraX>().0 = 1000.0;

        app.update();

        assert_eq!(visibility(&app, behind), Visibility::Hidden);
        assert_eq!(visibility(&app, ahead), Visibility::Inherited);
        let stats = app.world().resource::<CullingStats>();
        assert_eq!(stats.total_objects, 2);
        assert_eq!(stats.visible_objects, 1);
        assert!((stats.efficiency() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn scenery_gets_wider_margins_and_stays_off_the_total() {
        let mut app = test_app();
        // Just outside the default margin but inside the house margin.
        let house = app
            .world_mut()
            .spawn((
                House,
                GamePosition { x: 750.0, y: 362.0 },
                Extent { w: 100.0, h: 110.0 },
                Transform::from_xyz(0.0, 0.0, 0.0),
                Visibility::default(),
            ))
            .id();
        let near_pipe = app
            .world_mut()
            .spawn((
                Pipe {
                    dir: PipeDir::Down,
                    target_level: String::new(),
                    target_spawn: SpawnPoint::default(),
                },
                GamePosition { x: 910.0, y: 408.0 },
                Extent { w: 64.0, h: 64.0 },
                Transform::from_xyz(0.0, 0.0, 2.0),
                Visibility::default(),
            ))
            .id();
        let far_pipe = app
            .world_mut()
            .spawn((
                Pipe {
                    dir: PipeDir::Down,
                    target_level: String::new(),
                    target_spawn: SpawnPoint::default(),
                },
                GamePosition { x: 870.0, y: 408.0 },
                Extent { w: 64.0, h: 64.0 },
                Transform::from_xyz(0.0, 0.0, 2.0),
                Visibility::default(),
            ))
            .id();
        app.world_mut().resource_mut::<CameraX>().0 = 1000.0;

        app.update();

        assert_eq!(visibility(&app, house), Visibility::Inherited);
        assert_eq!(visibility(&app, near_pipe), Visibility::Inherited);
        assert_eq!(visibility(&app, far_pipe), Visibility::Hidden);
        let stats = app.world().resource::<CullingStats>();
        assert_eq!(stats.total_objects, 0);
        assert_eq!(stats.visible_objects, 2);
    }

    #[test]
    fn dead_things_stay_on_the_books_but_are_not_drawn() {
        let mut app = test_app();
        let taken = app
            .world_mut()
            .spawn((
                Coin { value: 5 },
                Alive(false),
                GamePosition { x: 100.0, y: 300.0 },
                Extent { w: 18.0, h: 18.0 },
                Transform::from_xyz(0.0, 0.0, 5.0),
                Visibility::default(),
            ))
            .id();
        let shiny = app
            .world_mut()
            .spawn((
                Coin { value: 5 },
                Alive(true),
                GamePosition { x: 140.0, y: 300.0 },
                Extent { w: 18.0, h: 18.0 },
                Transform::from_xyz(0.0, 0.0, 5.0),
                Visibility::default(),
            ))
            .id();

        app.update();

        assert_eq!(visibility(&app, taken), Visibility::Hidden);
        assert_eq!(visibility(&app, shiny), Visibility::Inherited);
        let stats = app.world().resource::<CullingStats>();
        assert_eq!(stats.total_objects, 2);
        assert_eq!(stats.visible_objects, 1);
    }

    #[test]
    fn parked_projectiles_leave_the_books() {
        let mut app = test_app();
        app.world_mut().spawn((
            Bullet { from_enemy: false },
            Pooled(PoolKind::Bullet),
            Alive(false),
            GamePosition { x: 200.0, y: 300.0 },
            Extent { w: 8.0, h: 8.0 },
            Transform::from_xyz(0.0, 0.0, 12.0),
            Visibility::default(),
        ));
        let live = app
            .world_mut()
            .spawn((
                Bullet { from_enemy: false },
                Pooled(PoolKind::Bullet),
                Alive(true),
                GamePosition { x: 240.0, y: 300.0 },
                Extent { w: 8.0, h: 8.0 },
                Transform::from_xyz(0.0, 0.0, 12.0),
                Visibility::default(),
            ))
            .id();

        app.update();

        assert_eq!(visibility(&app, live), Visibility::Inherited);
        let stats = app.world().resource::<CullingStats>();
        assert_eq!(stats.total_objects, 1);
        assert_eq!(stats.visible_objects, 1);
    }

    #[test]
    fn low_quality_sheds_the_scenery() {
        let mut app = test_app();
        let house = app
            .world_mut()
            .spawn((
                House,
                GamePosition { x: 80.0, y: 362.0 },
                Extent { w: 100.0, h: 110.0 },
                Transform::from_xyz(0.0, 0.0, 0.0),
                Visibility::default(),
            ))
            .id();
        let platform = spawn_platform(&mut app, 80.0, 200.0);
        *app.world_mut().resource_mut::<RenderQuality>() = RenderQuality::Low;

        app.update();

        assert_eq!(visibility(&app, house), Visibility::Hidden);
        assert_eq!(visibility(&app, platform), Visibility::Inherited);
        let stats = app.world().resource::<CullingStats>();
        assert_eq!(stats.visible_objects, 1);
    }

    #[test]
    fn theme_swap_repaints_the_sky() {
        let mut app = test_app();
        app.update();
        assert_eq!(
            app.world().resource::<ClearColor>().0,
            Color::srgb(0.463, 0.722, 1.0)
        );

        app.world_mut().resource_mut::<LevelRuntime>().theme = LevelTheme::Underground;
        app.update();
        assert_eq!(
            app.world().resource::<ClearColor>().0,
            Color::srgb(0.102, 0.102, 0.102)
        );
    }

    #[test]
    fn intact_blocks_draw_and_broken_ones_do_not() {
        let mut app = test_app();
        let intact = app
            .world_mut()
            .spawn((
                Block {
                    kind: BlockKind::Question,
                    contents: Some(BlockContents::Coin),
                    breakable: false,
                    used: true,
                },
                Alive(true),
                GamePosition { x: 300.0, y: 352.0 },
                Extent { w: 40.0, h: 40.0 },
                Transform::from_xyz(0.0, 0.0, 5.0),
                Visibility::default(),
            ))
            .id();
        let rubble = app
            .world_mut()
            .spawn((
                Block {
                    kind: BlockKind::Brick,
                    contents: None,
                    breakable: true,
                    used: false,
                },
                Alive(false),
                GamePosition { x: 340.0, y: 352.0 },
                Extent { w: 40.0, h: 40.0 },
                Transform::from_xyz(0.0, 0.0, 5.0),
                Visibility::default(),
            ))
            .id();

        app.update();

        assert_eq!(visibility(&app, intact), Visibility::Inherited);
        assert_eq!(visibility(&app, rubble), Visibility::Hidden);
        let stats = app.world().resource::<CullingStats>();
        assert_eq!(stats.total_objects, 2);
        assert_eq!(stats.visible_objects, 1);
    }
}
