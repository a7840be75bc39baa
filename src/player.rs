use bevy::prelude::*;

use crate::components::*;
use crate::events::GameEventBus;
use crate::game_runtime::{GameState, RespawnPoint, TickSet};
use crate::input::InputIntents;
use crate::items::PendingBlockBumps;
use crate::level::Solid;
use crate::object_pool::GamePools;
use crate::physics::{self, Aabb, SOLID_QUERY_RADIUS};
use crate::spatial_hash::GameGrids;

pub const PLAYER_W: f32 = 28.0;
pub const PLAYER_H: f32 = 48.0;
pub const PLAYER_BIG_H: f32 = 64.0;

/// Muzzle sits this far ahead of the player's center, at 45% height
const MUZZLE_OFFSET_X: f32 = 18.0;
const MUZZLE_HEIGHT_FRACTION: f32 = 0.45;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_player).add_systems(
            FixedUpdate,
            (control_player, move_player).chain().in_set(TickSet::Player),
        );
    }
}

fn spawn_player(mut commands: Commands, headless: Res<HeadlessMode>) {
    let mut entity = commands.spawn((
        Player,
        GamePosition { x: 100.0, y: 100.0 },
        Velocity::default(),
        Extent {
            w: PLAYER_W,
            h: PLAYER_H,
        },
        Grounded(false),
        CoyoteTimer::default(),
        JumpBuffer::default(),
        Facing::default(),
        Invulnerable::default(),
        ShootCooldown::default(),
        Big(false),
        Alive(true),
        Transform::from_xyz(0.0, 0.0, 10.0),
        Visibility::default(),
    ));
    if !headless.0 {
        entity.insert(Sprite::from_color(
            crate::render::PLAYER_COLOR,
            Vec2::new(PLAYER_W, PLAYER_H),
        ));
    }
}

/// Apply the tick's intents: walk speed, gravity with variable jump height,
/// coyote-buffered jumping and shooting.
#[allow(clippy::type_complexity)]
fn control_player(
    config: Res<PhysicsConfig>,
    intents: Res<InputIntents>,
    headless: Res<HeadlessMode>,
    mut pools: ResMut<GamePools>,
    mut bus: ResMut<GameEventBus>,
    mut commands: Commands,
    mut players: Query<
        (
            &mut Velocity,
            &mut Facing,
            &Grounded,
            &mut CoyoteTimer,
            &mut JumpBuffer,
            &mut ShootCooldown,
            &GamePosition,
            &Extent,
        ),
        With<Player>,
    >,
) {
    let Ok((mut vel, mut facing, grounded, mut coyote, mut buffer, mut cooldown, pos, extent)) =
        players.get_single_mut()
    else {
        return;
    };

    let mut ax = 0.0;
    if intents.left {
        ax = -config.move_speed;
    }
    if intents.right {
        ax = config.move_speed;
    }
    vel.x = ax;
    if vel.x != 0.0 {
        facing.0 = vel.x.signum();
    }

    vel.y += config.gravity;
    // extra pull while rising with the key released, slight float while held
    if vel.y < 0.0 {
        if intents.jump_held {
            vel.y -= config.jump_hold_damping;
        } else {
            vel.y += config.jump_release_damping;
        }
    }

    if grounded.0 {
        coyote.0 = config.coyote_frames;
    } else if coyote.0 > 0 {
        coyote.0 -= 1;
    }
    if intents.jump_pressed {
        buffer.0 = config.jump_buffer_frames;
    } else if buffer.0 > 0 {
        buffer.0 -= 1;
    }

    if buffer.0 > 0 && coyote.0 > 0 {
        vel.y = config.jump_velocity;
        coyote.0 = 0;
        buffer.0 = 0;
        bus.emit("player_jumped", serde_json::json!({}));
    }

    if cooldown.0 > 0 {
        cooldown.0 -= 1;
    }
    if intents.shoot_pressed && cooldown.0 == 0 {
        crate::bullets::spawn_bullet(
            &mut commands,
            &mut pools,
            headless.0,
            pos.x + extent.w / 2.0 + facing.0 * MUZZLE_OFFSET_X,
            pos.y + extent.h * MUZZLE_HEIGHT_FRACTION,
            facing.0 * config.bullet_speed,
            0.0,
            false,
        );
        cooldown.0 = config.shoot_cooldown;
        bus.emit("player_shot", serde_json::json!({}));
    }
}

/// Integrate the player against nearby solids, refresh the grounded probe,
/// tick invulnerability and handle falling out of the world.
#[allow(clippy::type_complexity)]
pub fn move_player(
    config: Res<PhysicsConfig>,
    mut grids: ResMut<GameGrids>,
    solids: Query<(&GamePosition, &Extent), (With<Solid>, Without<Player>)>,
    mut bumps: ResMut<PendingBlockBumps>,
    mut game: ResMut<GameState>,
    respawn: Res<RespawnPoint>,
    mut bus: ResMut<GameEventBus>,
    mut players: Query<
        (
            &mut GamePosition,
            &mut Velocity,
            &mut Extent,
            &mut Grounded,
            &mut Big,
            &mut Invulnerable,
        ),
        With<Player>,
    >,
) {
    let Ok((mut pos, mut vel, mut extent, mut grounded, mut big, mut invul)) =
        players.get_single_mut()
    else {
        return;
    };

    let (dx, dy) = (vel.x, vel.y);
    let mut near = |x: f32, y: f32| -> Vec<Aabb> {
        grids
            .platforms
            .query(x, y, SOLID_QUERY_RADIUS)
            .iter()
            .filter_map(|e| solids.get(*e).ok())
            .map(|(p, ext)| Aabb::new(p.x, p.y, ext.w, ext.h))
            .collect()
    };

    let probes = physics::move_with_collisions(&mut pos, &mut vel, &extent, dx, dy, &mut near);
    bumps.0.extend(probes);

    let nearby = near(pos.x, pos.y);
    grounded.0 = physics::grounded_probe(&pos, &extent, &nearby);

    if invul.0 > 0 {
        invul.0 -= 1;
    }

    if pos.y > VIEW_HEIGHT + FALL_MARGIN {
        apply_player_hit(
            true, &config, &mut game, &respawn, &mut bus, &mut pos, &mut vel, &mut extent,
            &mut big, &mut invul,
        );
    }
}

/// Shared damage routine. A hit while invulnerable is ignored. The big tier
/// soaks one ordinary hit by shrinking back; a fatal hit (falling out of the
/// world) skips that protection. Losing the last life flips the game over
/// flag, anything else teleports the player back to the respawn point.
#[allow(clippy::too_many_arguments)]
pub fn apply_player_hit(
    fatal: bool,
    config: &PhysicsConfig,
    game: &mut GameState,
    respawn: &RespawnPoint,
    bus: &mut GameEventBus,
    pos: &mut GamePosition,
    vel: &mut Velocity,
    extent: &mut Extent,
    big: &mut Big,
    invul: &mut Invulnerable,
) {
    if invul.0 > 0 {
        return;
    }

    if big.0 && !fatal {
        big.0 = false;
        let old_h = extent.h;
        extent.h = PLAYER_H;
        pos.y += old_h - extent.h;
        invul.0 = config.invul_frames;
        bus.emit(
            "player_hit",
            serde_json::json!({ "demoted": true, "lives": game.lives }),
        );
        return;
    }

    game.lives -= 1;
    bus.emit(
        "player_hit",
        serde_json::json!({ "demoted": false, "lives": game.lives }),
    );

    if game.lives <= 0 {
        game.game_over = true;
        bus.emit("game_over", serde_json::json!({ "score": game.score }));
    } else {
        pos.x = respawn.x;
        pos.y = respawn.y.min(GROUND_Y - extent.h);
        vel.x = 0.0;
        vel.y = 0.0;
        invul.0 = config.invul_frames;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct HitRig {
        config: PhysicsConfig,
        game: GameState,
        respawn: RespawnPoint,
        bus: GameEventBus,
        pos: GamePosition,
        vel: Velocity,
        extent: Extent,
        big: Big,
        invul: Invulnerable,
    }

    impl HitRig {
        fn new() -> Self {
            Self {
                config: PhysicsConfig::default(),
                game: GameState::default(),
                respawn: RespawnPoint { x: 120.0, y: 360.0 },
                bus: GameEventBus::default(),
                pos: GamePosition { x: 800.0, y: 400.0 },
                vel: Velocity { x: 4.0, y: 2.0 },
                extent: Extent {
                    w: PLAYER_W,
                    h: PLAYER_H,
                },
                big: Big(false),
                invul: Invulnerable(0),
            }
        }

        fn hit(&mut self, fatal: bool) {
            apply_player_hit(
                fatal,
                &self.config,
                &mut self.game,
                &self.respawn,
                &mut self.bus,
                &mut self.pos,
                &mut self.vel,
                &mut self.extent,
                &mut self.big,
                &mut self.invul,
            );
        }
    }

    #[test]
    fn invulnerability_gates_hits() {
        let mut rig = HitRig::new();
        rig.invul.0 = 30;
        rig.hit(false);
        assert_eq!(rig.game.lives, 3);
        assert!(rig.bus.last_named("player_hit").is_none());
    }

    #[test]
    fn big_tier_soaks_one_hit() {
        let mut rig = HitRig::new();
        rig.big.0 = true;
        rig.extent.h = PLAYER_BIG_H;
        let y_before = rig.pos.y;
        rig.hit(false);
        assert!(!rig.big.0);
        assert_eq!(rig.extent.h, PLAYER_H);
        assert_eq!(rig.pos.y, y_before + (PLAYER_BIG_H - PLAYER_H));
        assert_eq!(rig.game.lives, 3);
        assert_eq!(rig.invul.0, 120);
    }

    #[test]
    fn falling_out_is_fatal_even_when_big() {
        let mut rig = HitRig::new();
        rig.big.0 = true;
        rig.extent.h = PLAYER_BIG_H;
        rig.hit(true);
        // no demotion: the fall costs a life directly
        assert!(rig.big.0);
        assert_eq!(rig.game.lives, 2);
        assert_eq!(rig.pos.x, 120.0);
        assert_eq!(rig.vel.y, 0.0);
    }

    #[test]
    fn ordinary_hit_respawns_with_mercy_frames() {
        let mut rig = HitRig::new();
        rig.hit(false);
        assert_eq!(rig.game.lives, 2);
        assert_eq!(rig.pos.x, 120.0);
        assert_eq!(rig.pos.y, 360.0_f32.min(GROUND_Y - PLAYER_H));
        assert_eq!(rig.invul.0, 120);
        assert!(!rig.game.game_over);
    }

    #[test]
    fn last_life_flips_game_over_without_respawn() {
        let mut rig = HitRig::new();
        rig.game.lives = 1;
        rig.hit(false);
        assert!(rig.game.game_over);
        assert_eq!(rig.game.lives, 0);
        // the player stays where they died
        assert_eq!(rig.pos.x, 800.0);
        assert!(rig.bus.last_named("game_over").is_some());
    }

    #[test]
    fn respawn_point_clamps_onto_the_ground_band() {
        let mut rig = HitRig::new();
        rig.respawn = RespawnPoint { x: 60.0, y: 800.0 };
        rig.hit(false);
        assert_eq!(rig.pos.y, GROUND_Y - PLAYER_H);
    }

    fn control_rig() -> App {
        let mut app = App::new();
        app.insert_resource(PhysicsConfig::default())
            .insert_resource(InputIntents::default())
            .insert_resource(HeadlessMode(true))
            .insert_resource(GamePools::default())
            .insert_resource(GameEventBus::default())
            .add_systems(Update, control_player);
        app
    }

    fn spawn_control_player(app: &mut App, grounded: bool, coyote: u32, vy: f32) -> Entity {
        app.world_mut()
            .spawn((
                Player,
                GamePosition { x: 200.0, y: 300.0 },
                Velocity { x: 0.0, y: vy },
                Extent {
                    w: PLAYER_W,
                    h: PLAYER_H,
                },
                Grounded(grounded),
                CoyoteTimer(coyote),
                JumpBuffer(0),
                Facing::default(),
                ShootCooldown(0),
            ))
            .id()
    }

    #[test]
    fn buffered_jump_fires_on_landing() {
        let mut app = control_rig();
        let player = spawn_control_player(&mut app, false, 0, 0.0);

        // pressed in the air with no grace left: buffered, not jumped
        {
            let mut intents = app.world_mut().resource_mut::<InputIntents>();
            intents.jump_pressed = true;
            intents.jump_held = true;
        }
        app.update();
        assert_eq!(app.world().get::<JumpBuffer>(player).unwrap().0, 8);
        assert!(app.world().get::<Velocity>(player).unwrap().y > 0.0);
        assert!(app
            .world()
            .resource::<GameEventBus>()
            .last_named("player_jumped")
            .is_none());

        // landing within the buffer window still triggers the jump
        app.world_mut().get_mut::<Grounded>(player).unwrap().0 = true;
        app.world_mut().resource_mut::<InputIntents>().jump_pressed = false;
        app.update();
        let config = PhysicsConfig::default();
        assert_eq!(
            app.world().get::<Velocity>(player).unwrap().y,
            config.jump_velocity
        );
        assert_eq!(app.world().get::<CoyoteTimer>(player).unwrap().0, 0);
        assert_eq!(app.world().get::<JumpBuffer>(player).unwrap().0, 0);
        assert!(app
            .world()
            .resource::<GameEventBus>()
            .last_named("player_jumped")
            .is_some());
    }

    #[test]
    fn coyote_grace_allows_a_late_jump() {
        let mut app = control_rig();
        // just walked off the edge: airborne but the grace window is fresh
        let player = spawn_control_player(&mut app, false, 8, 0.0);
        {
            let mut intents = app.world_mut().resource_mut::<InputIntents>();
            intents.jump_pressed = true;
            intents.jump_held = true;
        }
        app.update();
        assert_eq!(
            app.world().get::<Velocity>(player).unwrap().y,
            PhysicsConfig::default().jump_velocity
        );

        // the same press with the grace spent goes nowhere
        let mut late = control_rig();
        let faller = spawn_control_player(&mut late, false, 0, 0.0);
        {
            let mut intents = late.world_mut().resource_mut::<InputIntents>();
            intents.jump_pressed = true;
            intents.jump_held = true;
        }
        late.update();
        assert!(late.world().get::<Velocity>(faller).unwrap().y > 0.0);
    }

    #[test]
    fn releasing_jump_early_cuts_the_rise() {
        let config = PhysicsConfig::default();

        let mut held = control_rig();
        let rising = spawn_control_player(&mut held, false, 0, -10.0);
        held.world_mut().resource_mut::<InputIntents>().jump_held = true;
        held.update();
        let vy_held = held.world().get::<Velocity>(rising).unwrap().y;
        assert_eq!(vy_held, -10.0 + config.gravity - config.jump_hold_damping);

        let mut released = control_rig();
        let cut = spawn_control_player(&mut released, false, 0, -10.0);
        released.update();
        let vy_released = released.world().get::<Velocity>(cut).unwrap().y;
        assert_eq!(vy_released, -10.0 + config.gravity + config.jump_release_damping);
        // the released arc bleeds speed faster
        assert!(vy_released > vy_held);
    }

    #[test]
    fn shoot_cooldown_gates_fire_rate() {
        use crate::bullets::Bullet;

        let mut app = control_rig();
        spawn_control_player(&mut app, true, 8, 0.0);
        app.world_mut().resource_mut::<InputIntents>().shoot_pressed = true;

        app.update();
        app.update();

        let mut bullets = app.world_mut().query::<&Bullet>();
        assert_eq!(bullets.iter(app.world()).count(), 1);
        assert!(app
            .world()
            .resource::<GameEventBus>()
            .last_named("player_shot")
            .is_some());
    }

    #[test]
    fn mercy_frames_tick_down_and_stop_at_zero() {
        let mut app = App::new();
        app.insert_resource(PhysicsConfig::default())
            .insert_resource(GameGrids::default())
            .insert_resource(PendingBlockBumps::default())
            .insert_resource(GameState::default())
            .insert_resource(RespawnPoint { x: 120.0, y: 360.0 })
            .insert_resource(GameEventBus::default())
            .add_systems(Update, move_player);
        let player = app
            .world_mut()
            .spawn((
                Player,
                GamePosition { x: 200.0, y: 100.0 },
                Velocity::default(),
                Extent {
                    w: PLAYER_W,
                    h: PLAYER_H,
                },
                Grounded(false),
                Big(false),
                Invulnerable(3),
            ))
            .id();

        app.update();
        assert_eq!(app.world().get::<Invulnerable>(player).unwrap().0, 2);
        app.update();
        app.update();
        assert_eq!(app.world().get::<Invulnerable>(player).unwrap().0, 0);
        // a further tick holds at zero instead of wrapping
        app.update();
        assert_eq!(app.world().get::<Invulnerable>(player).unwrap().0, 0);
        assert_eq!(app.world().resource::<GameState>().lives, 3);
    }
}
