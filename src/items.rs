use bevy::prelude::*;

use crate::components::*;
use crate::events::GameEventBus;
use crate::game_runtime::{GameState, TickSet};
use crate::level::{Block, BlockContents, BlockKind, Coin, Solid, BLOCK_SIZE};
use crate::object_pool::{GamePools, PoolKind, Pooled};
use crate::physics::{self, Aabb};
use crate::player::PLAYER_BIG_H;

pub const POWERUP_SIZE: f32 = 22.0;
/// Spawned powerups drift right until they bounce off something
const POWERUP_DRIFT_VX: f32 = 1.0;

/// A head bump connects with the block whose center is within this half
/// width of the probe, and whose underside is within the band below
const BLOCK_HIT_HALF_WIDTH: f32 = 22.0;
const BLOCK_HIT_BAND: f32 = 8.0;

const BLOCK_COIN_SCORE: u32 = 10;
const POWERUP_SCORE: u32 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerupKind {
    Grow,
}

#[derive(Component, Clone, Copy, Debug)]
pub struct Powerup {
    pub kind: PowerupKind,
}

/// Ceiling-collision probe points collected during player movement, one per
/// upward hit, consumed by the block pass in the same tick.
#[derive(Resource, Default)]
pub struct PendingBlockBumps(pub Vec<(f32, f32)>);

pub struct ItemsPlugin;

impl Plugin for ItemsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingBlockBumps>().add_systems(
            FixedUpdate,
            (hit_blocks, collect_coins, update_powerups)
                .chain()
                .in_set(TickSet::Items),
        );
    }
}

fn spawn_powerup(
    commands: &mut Commands,
    pools: &mut GamePools,
    headless: bool,
    x: f32,
    y: f32,
) {
    let entity = match pools.powerups.acquire() {
        Some(entity) => entity,
        None => {
            let entity = commands.spawn_empty().id();
            pools.powerups.track(entity);
            entity
        }
    };
    let mut e = commands.entity(entity);
    e.insert((
        Powerup {
            kind: PowerupKind::Grow,
        },
        Pooled(PoolKind::Powerup),
        Alive(true),
        GamePosition { x, y },
        Velocity {
            x: POWERUP_DRIFT_VX,
            y: 0.0,
        },
        Extent {
            w: POWERUP_SIZE,
            h: POWERUP_SIZE,
        },
        Transform::from_xyz(0.0, 0.0, 5.0),
        Visibility::default(),
    ));
    if !headless {
        e.insert(Sprite::from_color(
            crate::render::POWERUP_COLOR,
            Vec2::splat(POWERUP_SIZE),
        ));
    }
}

/// Resolve this tick's head bumps against the level's blocks. Each probe
/// settles against at most one block: the first one whose hit window it
/// falls into. Used question blocks and unbreakable bricks still swallow
/// the probe.
#[allow(clippy::type_complexity)]
fn hit_blocks(
    mut bumps: ResMut<PendingBlockBumps>,
    mut game: ResMut<GameState>,
    mut bus: ResMut<GameEventBus>,
    headless: Res<HeadlessMode>,
    mut pools: ResMut<GamePools>,
    mut commands: Commands,
    players: Query<&Big, With<Player>>,
    mut blocks: Query<(Entity, &mut Block, &mut Alive, &GamePosition, &Extent)>,
) {
    if bumps.0.is_empty() {
        return;
    }
    let probes = std::mem::take(&mut bumps.0);
    let big = players.get_single().map(|b| b.0).unwrap_or(false);

    let mut ordered: Vec<Entity> = blocks
        .iter()
        .filter(|(_, _, alive, _, _)| alive.0)
        .map(|(entity, ..)| entity)
        .collect();
    ordered.sort();

    for (cx, y_touch) in probes {
        for &entity in &ordered {
            let Ok((_, mut block, mut alive, pos, extent)) = blocks.get_mut(entity) else {
                continue;
            };
            if !alive.0 {
                continue;
            }
            let in_window = (pos.x + BLOCK_SIZE / 2.0 - cx).abs() <= BLOCK_HIT_HALF_WIDTH
                && (pos.y + extent.h - y_touch).abs() < BLOCK_HIT_BAND;
            if !in_window {
                continue;
            }

            match block.kind {
                BlockKind::Question => {
                    if !block.used {
                        block.used = true;
                        match block.contents {
                            Some(BlockContents::Coin) => {
                                game.score += BLOCK_COIN_SCORE;
                                bus.emit(
                                    "coin_collected",
                                    serde_json::json!({
                                        "value": BLOCK_COIN_SCORE,
                                        "source": "block",
                                    }),
                                );
                            }
                            Some(BlockContents::Grow) => {
                                spawn_powerup(
                                    &mut commands,
                                    &mut pools,
                                    headless.0,
                                    pos.x,
                                    pos.y - POWERUP_SIZE,
                                );
                                bus.emit(
                                    "powerup_spawned",
                                    serde_json::json!({ "x": pos.x, "y": pos.y - POWERUP_SIZE }),
                                );
                            }
                            Some(BlockContents::Life) => {
                                game.lives += 1;
                                bus.emit("extra_life", serde_json::json!({ "lives": game.lives }));
                            }
                            None => {}
                        }
                    }
                }
                BlockKind::Brick => {
                    if block.breakable && big {
                        alive.0 = false;
                        bus.emit(
                            "block_broken",
                            serde_json::json!({ "x": pos.x, "y": pos.y }),
                        );
                    }
                }
            }
            break;
        }
    }
}

fn collect_coins(
    mut game: ResMut<GameState>,
    mut bus: ResMut<GameEventBus>,
    players: Query<(&GamePosition, &Extent), With<Player>>,
    mut coins: Query<(&Coin, &mut Alive, &GamePosition, &Extent), Without<Player>>,
) {
    let Ok((ppos, pext)) = players.get_single() else {
        return;
    };
    let pbody = Aabb::new(ppos.x, ppos.y, pext.w, pext.h);

    for (coin, mut alive, pos, extent) in coins.iter_mut() {
        if !alive.0 {
            continue;
        }
        if pbody.overlaps(&Aabb::new(pos.x, pos.y, extent.w, extent.h)) {
            alive.0 = false;
            game.score += coin.value;
            bus.emit(
                "coin_collected",
                serde_json::json!({ "value": coin.value, "source": "level" }),
            );
        }
    }
}

/// Powerups drift and fall, bouncing off solids, until the player picks them
/// up. Grow promotes the player to the big tier once; the score bonus and
/// the cue fire on every pickup.
#[allow(clippy::type_complexity)]
fn update_powerups(
    config: Res<PhysicsConfig>,
    mut game: ResMut<GameState>,
    mut bus: ResMut<GameEventBus>,
    solids: Query<
        (&GamePosition, &Extent, Option<&Alive>),
        (With<Solid>, Without<Powerup>, Without<Player>),
    >,
    mut powerups: Query<
        (
            Entity,
            &Powerup,
            &mut Alive,
            &mut GamePosition,
            &mut Velocity,
            &Extent,
        ),
        Without<Player>,
    >,
    mut players: Query<(&mut GamePosition, &mut Extent, &mut Big), With<Player>>,
) {
    let Ok((mut ppos, mut pext, mut pbig)) = players.get_single_mut() else {
        return;
    };
    // Broken blocks keep their Solid tag but stop colliding once dead.
    let all_solids: Vec<Aabb> = solids
        .iter()
        .filter(|(_, _, alive)| alive.map_or(true, |a| a.0))
        .map(|(p, ext, _)| Aabb::new(p.x, p.y, ext.w, ext.h))
        .collect();

    let mut ordered: Vec<Entity> = powerups
        .iter()
        .filter(|(_, _, alive, ..)| alive.0)
        .map(|(entity, ..)| entity)
        .collect();
    ordered.sort();

    for entity in ordered {
        let Ok((_, powerup, mut alive, mut pos, mut vel, extent)) = powerups.get_mut(entity)
        else {
            continue;
        };
        vel.y += config.gravity * config.powerup_gravity_scale;
        physics::move_item_with_platforms(&mut pos, &mut vel, extent, &all_solids);

        let pbody = Aabb::new(ppos.x, ppos.y, pext.w, pext.h);
        if pbody.overlaps(&Aabb::new(pos.x, pos.y, extent.w, extent.h)) {
            alive.0 = false;
            match powerup.kind {
                PowerupKind::Grow => {
                    if !pbig.0 {
                        pbig.0 = true;
                        let old_h = pext.h;
                        pext.h = PLAYER_BIG_H;
                        ppos.y -= pext.h - old_h;
                    }
                    game.score += POWERUP_SCORE;
                    bus.emit("powerup_collected", serde_json::json!({ "kind": "grow" }));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{PLAYER_H, PLAYER_W};

    fn test_app() -> App {
        let mut app = App::new();
        app.insert_resource(PhysicsConfig::default())
            .insert_resource(GameState::default())
            .insert_resource(GameEventBus::default())
            .insert_resource(HeadlessMode(true))
            .insert_resource(GamePools::default())
            .init_resource::<PendingBlockBumps>()
            .add_systems(Update, (hit_blocks, collect_coins, update_powerups).chain());
        app
    }

    fn spawn_player_at(app: &mut App, x: f32, y: f32, big: bool) -> Entity {
        app.world_mut()
            .spawn((
                Player,
                GamePosition { x, y },
                Velocity::default(),
                Extent {
                    w: PLAYER_W,
                    h: if big { PLAYER_BIG_H } else { PLAYER_H },
                },
                Big(big),
            ))
            .id()
    }

    fn spawn_block(
        app: &mut App,
        x: f32,
        y: f32,
        kind: BlockKind,
        contents: Option<BlockContents>,
        breakable: bool,
    ) -> Entity {
        app.world_mut()
            .spawn((
                Block {
                    kind,
                    contents,
                    breakable,
                    used: false,
                },
                Solid,
                Alive(true),
                GamePosition { x, y },
                Extent {
                    w: BLOCK_SIZE,
                    h: BLOCK_SIZE,
                },
            ))
            .id()
    }

    fn push_bump(app: &mut App, cx: f32, y_touch: f32) {
        app.world_mut()
            .resource_mut::<PendingBlockBumps>()
            .0
            .push((cx, y_touch));
    }

    #[test]
    fn question_block_pays_out_once() {
        let mut app = test_app();
        spawn_player_at(&mut app, 500.0, 400.0, false);
        let block = spawn_block(
            &mut app,
            100.0,
            280.0,
            BlockKind::Question,
            Some(BlockContents::Coin),
            false,
        );

        push_bump(&mut app, 120.0, 321.0);
        app.update();
        assert_eq!(app.world().resource::<GameState>().score, 10);
        assert!(app.world().get::<Block>(block).unwrap().used);

        // bumping a used block gives nothing
        push_bump(&mut app, 120.0, 321.0);
        app.update();
        assert_eq!(app.world().resource::<GameState>().score, 10);
    }

    #[test]
    fn grow_block_releases_a_drifting_powerup() {
        let mut app = test_app();
        spawn_player_at(&mut app, 500.0, 100.0, false);
        spawn_block(
            &mut app,
            200.0,
            280.0,
            BlockKind::Question,
            Some(BlockContents::Grow),
            false,
        );

        push_bump(&mut app, 220.0, 321.0);
        app.update();

        let mut powerups = app
            .world_mut()
            .query::<(&Powerup, &GamePosition, &Velocity)>();
        let spawned: Vec<_> = powerups.iter(app.world()).collect();
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].0.kind, PowerupKind::Grow);
        // drifted and started falling during the same tick it appeared
        assert_eq!(spawned[0].1.x, 201.0);
        assert!(spawned[0].1.y > 280.0 - POWERUP_SIZE);
        assert!(app
            .world()
            .resource::<GameEventBus>()
            .last_named("powerup_spawned")
            .is_some());
    }

    #[test]
    fn life_block_grants_a_life() {
        let mut app = test_app();
        spawn_player_at(&mut app, 500.0, 400.0, false);
        spawn_block(
            &mut app,
            100.0,
            280.0,
            BlockKind::Question,
            Some(BlockContents::Life),
            false,
        );

        push_bump(&mut app, 120.0, 321.0);
        app.update();

        assert_eq!(app.world().resource::<GameState>().lives, 4);
        assert!(app
            .world()
            .resource::<GameEventBus>()
            .last_named("extra_life")
            .is_some());
    }

    #[test]
    fn bricks_only_break_for_the_big_tier() {
        let mut app = test_app();
        let player = spawn_player_at(&mut app, 500.0, 400.0, false);
        let brick = spawn_block(&mut app, 100.0, 280.0, BlockKind::Brick, None, true);

        push_bump(&mut app, 120.0, 321.0);
        app.update();
        assert!(app.world().get::<Alive>(brick).unwrap().0);

        app.world_mut().get_mut::<Big>(player).unwrap().0 = true;
        push_bump(&mut app, 120.0, 321.0);
        app.update();
        assert!(!app.world().get::<Alive>(brick).unwrap().0);
        assert!(app
            .world()
            .resource::<GameEventBus>()
            .last_named("block_broken")
            .is_some());
    }

    #[test]
    fn each_bump_settles_against_one_block() {
        let mut app = test_app();
        spawn_player_at(&mut app, 500.0, 400.0, false);
        let left = spawn_block(
            &mut app,
            80.0,
            280.0,
            BlockKind::Question,
            Some(BlockContents::Coin),
            false,
        );
        let right = spawn_block(
            &mut app,
            120.0,
            280.0,
            BlockKind::Question,
            Some(BlockContents::Coin),
            false,
        );

        // probe between the two: both windows contain it, only one pays
        push_bump(&mut app, 120.0, 321.0);
        app.update();

        assert_eq!(app.world().resource::<GameState>().score, 10);
        let used = [left, right]
            .iter()
            .filter(|e| app.world().get::<Block>(**e).unwrap().used)
            .count();
        assert_eq!(used, 1);
    }

    #[test]
    fn touching_a_coin_banks_its_value() {
        let mut app = test_app();
        spawn_player_at(&mut app, 100.0, 400.0, false);
        let coin = app
            .world_mut()
            .spawn((
                Coin { value: 5 },
                Alive(true),
                GamePosition { x: 110.0, y: 420.0 },
                Extent { w: 18.0, h: 18.0 },
            ))
            .id();

        app.update();

        assert!(!app.world().get::<Alive>(coin).unwrap().0);
        assert_eq!(app.world().resource::<GameState>().score, 5);

        // a taken coin stays taken
        app.update();
        assert_eq!(app.world().resource::<GameState>().score, 5);
    }

    #[test]
    fn grow_powerup_promotes_once_but_always_scores() {
        let mut app = test_app();
        let player = spawn_player_at(&mut app, 100.0, 404.0, false);
        app.world_mut().spawn((
            Powerup {
                kind: PowerupKind::Grow,
            },
            Alive(true),
            GamePosition { x: 105.0, y: 430.0 },
            Velocity { x: 1.0, y: 0.0 },
            Extent {
                w: POWERUP_SIZE,
                h: POWERUP_SIZE,
            },
        ));

        app.update();

        assert!(app.world().get::<Big>(player).unwrap().0);
        let pext = app.world().get::<Extent>(player).unwrap();
        assert_eq!(pext.h, PLAYER_BIG_H);
        // feet stayed put: y shifted up by the growth
        assert_eq!(app.world().get::<GamePosition>(player).unwrap().y, 388.0);
        assert_eq!(app.world().resource::<GameState>().score, 20);

        // second pickup while already big only scores
        app.world_mut().spawn((
            Powerup {
                kind: PowerupKind::Grow,
            },
            Alive(true),
            GamePosition { x: 105.0, y: 430.0 },
            Velocity { x: 1.0, y: 0.0 },
            Extent {
                w: POWERUP_SIZE,
                h: POWERUP_SIZE,
            },
        ));
        app.update();
        assert_eq!(app.world().resource::<GameState>().score, 40);
        assert_eq!(app.world().get::<Extent>(player).unwrap().h, PLAYER_BIG_H);
    }

    #[test]
    fn powerup_settles_on_a_platform() {
        let mut app = test_app();
        spawn_player_at(&mut app, 900.0, 100.0, false);
        app.world_mut().spawn((
            Solid,
            GamePosition { x: 0.0, y: 472.0 },
            Extent { w: 960.0, h: 68.0 },
        ));
        let powerup = app
            .world_mut()
            .spawn((
                Powerup {
                    kind: PowerupKind::Grow,
                },
                Alive(true),
                GamePosition {
                    x: 100.0,
                    y: 472.0 - POWERUP_SIZE,
                },
                Velocity { x: 1.0, y: 0.0 },
                Extent {
                    w: POWERUP_SIZE,
                    h: POWERUP_SIZE,
                },
            ))
            .id();

        app.update();

        let pos = app.world().get::<GamePosition>(powerup).unwrap();
        let vel = app.world().get::<Velocity>(powerup).unwrap();
        // drifted along, feet pinned to the platform top
        assert_eq!(pos.x, 101.0);
        assert_eq!(pos.y, 472.0 - POWERUP_SIZE);
        assert_eq!(vel.y, 0.0);
    }
}
