use bevy::prelude::*;
use rand::Rng;

use crate::components::*;
use crate::events::GameEventBus;
use crate::game_runtime::{GameRng, GameState, RespawnPoint, TickSet};
use crate::level::{EnemyKind, Solid};
use crate::object_pool::GamePools;
use crate::physics::{self, Aabb, SOLID_QUERY_RADIUS};
use crate::player::apply_player_hit;
use crate::spatial_hash::GameGrids;

/// Shooters open fire when the player's center comes within this range
const SHOOTER_RANGE: f32 = 520.0;
const SHOOTER_COOLDOWN_BASE: u32 = 90;
const SHOOTER_COOLDOWN_JITTER: u32 = 60;

/// A stomp counts when the player is falling and their feet are still above
/// the top band of the enemy
const STOMP_FOOT_GRACE: f32 = 6.0;
const STOMP_HEAD_BAND: f32 = 10.0;

#[derive(Component, Clone, Copy, Debug)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub dir: f32,
    pub speed: f32,
    pub cooldown: u32,
}

pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, update_enemies.in_set(TickSet::Enemies));
    }
}

/// Walkers patrol with gravity, turning at walls and ledges; shooters hold
/// their platform and lob bullets at the player. Both hurt on contact, but a
/// falling player squashes a walker instead.
#[allow(clippy::type_complexity, clippy::too_many_arguments)]
pub fn update_enemies(
    config: Res<PhysicsConfig>,
    mut grids: ResMut<GameGrids>,
    solids: Query<
        (&GamePosition, &Extent, Option<&Alive>),
        (With<Solid>, Without<Enemy>, Without<Player>),
    >,
    mut rng: ResMut<GameRng>,
    mut game: ResMut<GameState>,
    respawn: Res<RespawnPoint>,
    mut bus: ResMut<GameEventBus>,
    headless: Res<HeadlessMode>,
    mut pools: ResMut<GamePools>,
    mut commands: Commands,
    mut enemies: Query<
        (
            Entity,
            &mut Enemy,
            &mut Alive,
            &mut GamePosition,
            &mut Velocity,
            &Extent,
        ),
        Without<Player>,
    >,
    mut players: Query<
        (
            &mut GamePosition,
            &mut Velocity,
            &mut Extent,
            &mut Big,
            &mut Invulnerable,
        ),
        With<Player>,
    >,
) {
    let Ok((mut ppos, mut pvel, mut pext, mut pbig, mut pinvul)) = players.get_single_mut() else {
        return;
    };

    // Broken blocks keep their Solid tag but stop colliding once dead.
    let all_solids: Vec<Aabb> = solids
        .iter()
        .filter(|(_, _, alive)| alive.map_or(true, |a| a.0))
        .map(|(p, ext, _)| Aabb::new(p.x, p.y, ext.w, ext.h))
        .collect();

    // fixed iteration order keeps bullet spawns and rng draws reproducible
    let mut ordered: Vec<Entity> = enemies.iter().map(|(entity, ..)| entity).collect();
    ordered.sort();

    for entity in ordered {
        let Ok((_, mut enemy, mut alive, mut pos, mut vel, extent)) = enemies.get_mut(entity)
        else {
            continue;
        };
        if !alive.0 {
            continue;
        }

        match enemy.kind {
            EnemyKind::Walker => {
                vel.x = enemy.dir * enemy.speed;
                vel.y += config.gravity * config.enemy_gravity_scale;
                let (dx, dy) = (vel.x, vel.y);
                let mut near = |x: f32, y: f32| -> Vec<Aabb> {
                    grids
                        .platforms
                        .query(x, y, SOLID_QUERY_RADIUS)
                        .iter()
                        .filter_map(|e| solids.get(*e).ok())
                        .map(|(p, ext, _)| Aabb::new(p.x, p.y, ext.w, ext.h))
                        .collect()
                };
                physics::move_entity_with_platforms(
                    &mut pos,
                    &mut vel,
                    extent,
                    &mut enemy.dir,
                    dx,
                    dy,
                    &mut near,
                );

                if !physics::has_ground_ahead(&pos, extent, enemy.dir, &all_solids) {
                    enemy.dir = -enemy.dir;
                }

                let pbody = Aabb::new(ppos.x, ppos.y, pext.w, pext.h);
                let ebody = Aabb::new(pos.x, pos.y, extent.w, extent.h);
                if pbody.overlaps(&ebody) {
                    let stomped =
                        pvel.y > 0.0 && ppos.y + pext.h - STOMP_FOOT_GRACE < pos.y + STOMP_HEAD_BAND;
                    if stomped {
                        alive.0 = false;
                        game.score += 20;
                        pvel.y = config.stomp_bounce;
                        bus.emit(
                            "enemy_stomped",
                            serde_json::json!({ "x": pos.x, "y": pos.y }),
                        );
                    } else {
                        apply_player_hit(
                            false, &config, &mut game, &respawn, &mut bus, &mut ppos, &mut pvel,
                            &mut pext, &mut pbig, &mut pinvul,
                        );
                    }
                }
            }
            EnemyKind::Shooter => {
                vel.y += config.gravity * config.enemy_gravity_scale;
                let dy = vel.y;
                let mut near = |x: f32, y: f32| -> Vec<Aabb> {
                    grids
                        .platforms
                        .query(x, y, SOLID_QUERY_RADIUS)
                        .iter()
                        .filter_map(|e| solids.get(*e).ok())
                        .map(|(p, ext, _)| Aabb::new(p.x, p.y, ext.w, ext.h))
                        .collect()
                };
                physics::move_entity_with_platforms(
                    &mut pos,
                    &mut vel,
                    extent,
                    &mut enemy.dir,
                    0.0,
                    dy,
                    &mut near,
                );

                if enemy.cooldown > 0 {
                    enemy.cooldown -= 1;
                }
                let player_center = ppos.x + pext.w / 2.0;
                let enemy_center = pos.x + extent.w / 2.0;
                if (player_center - enemy_center).abs() < SHOOTER_RANGE && enemy.cooldown == 0 {
                    let aim = (player_center - enemy_center).signum();
                    enemy.dir = aim;
                    crate::bullets::spawn_bullet(
                        &mut commands,
                        &mut pools,
                        headless.0,
                        pos.x + extent.w / 2.0,
                        pos.y + extent.h * 0.5,
                        aim * config.enemy_bullet_speed,
                        0.0,
                        true,
                    );
                    enemy.cooldown =
                        SHOOTER_COOLDOWN_BASE + rng.0.gen_range(0..SHOOTER_COOLDOWN_JITTER);
                }

                let pbody = Aabb::new(ppos.x, ppos.y, pext.w, pext.h);
                let ebody = Aabb::new(pos.x, pos.y, extent.w, extent.h);
                if pbody.overlaps(&ebody) {
                    apply_player_hit(
                        false, &config, &mut game, &respawn, &mut bus, &mut ppos, &mut pvel,
                        &mut pext, &mut pbig, &mut pinvul,
                    );
                }
            }
        }
    }
}
