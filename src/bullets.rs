use bevy::prelude::*;

use crate::components::*;
use crate::enemies::Enemy;
use crate::events::GameEventBus;
use crate::game_runtime::{GameState, RespawnPoint, TickSet};
use crate::level::{LevelRuntime, Solid};
use crate::object_pool::{GamePools, PoolKind, Pooled};
use crate::physics::{Aabb, BULLET_QUERY_RADIUS};
use crate::player::apply_player_hit;
use crate::spatial_hash::GameGrids;

pub const BULLET_SIZE: f32 = 10.0;

#[derive(Component, Clone, Copy, Debug)]
pub struct Bullet {
    pub from_enemy: bool,
}

pub struct BulletPlugin;

impl Plugin for BulletPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (update_player_bullets, update_enemy_bullets)
                .chain()
                .in_set(TickSet::Bullets),
        );
    }
}

/// Take a bullet entity from the pool, or spawn and track a fresh one, and
/// arm it with the given position and velocity.
#[allow(clippy::too_many_arguments)]
pub fn spawn_bullet(
    commands: &mut Commands,
    pools: &mut GamePools,
    headless: bool,
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    from_enemy: bool,
) {
    let entity = match pools.bullets.acquire() {
        Some(entity) => entity,
        None => {
            let entity = commands.spawn_empty().id();
            pools.bullets.track(entity);
            entity
        }
    };
    let mut e = commands.entity(entity);
    e.insert((
        Bullet { from_enemy },
        Pooled(PoolKind::Bullet),
        Alive(true),
        GamePosition { x, y },
        Velocity { x: vx, y: vy },
        Extent {
            w: BULLET_SIZE,
            h: BULLET_SIZE,
        },
        Transform::from_xyz(0.0, 0.0, 12.0),
        Visibility::default(),
    ));
    if !headless {
        let color = if from_enemy {
            crate::render::ENEMY_BULLET_COLOR
        } else {
            crate::render::PLAYER_BULLET_COLOR
        };
        e.insert(Sprite::from_color(color, Vec2::splat(BULLET_SIZE)));
    }
}

/// Player bullets fly flat, die against solids or past the level bounds, and
/// kill the first live enemy they overlap for a score bonus.
#[allow(clippy::type_complexity)]
fn update_player_bullets(
    mut grids: ResMut<GameGrids>,
    runtime: Res<LevelRuntime>,
    mut game: ResMut<GameState>,
    mut bus: ResMut<GameEventBus>,
    solids: Query<(&GamePosition, &Extent), (With<Solid>, Without<Bullet>)>,
    mut enemies: Query<(&mut Alive, &GamePosition, &Extent), (With<Enemy>, Without<Bullet>)>,
    mut bullets: Query<
        (
            Entity,
            &Bullet,
            &mut Alive,
            &mut GamePosition,
            &Velocity,
            &Extent,
        ),
        Without<Enemy>,
    >,
) {
    let mut ordered: Vec<Entity> = bullets
        .iter()
        .filter(|(_, bullet, alive, ..)| !bullet.from_enemy && alive.0)
        .map(|(entity, ..)| entity)
        .collect();
    ordered.sort();

    for entity in ordered {
        let Ok((_, _, mut alive, mut pos, vel, extent)) = bullets.get_mut(entity) else {
            continue;
        };
        pos.x += vel.x;
        let body = Aabb::new(pos.x, pos.y, extent.w, extent.h);

        let hit_solid = grids
            .platforms
            .query(pos.x, pos.y, BULLET_QUERY_RADIUS)
            .iter()
            .filter_map(|e| solids.get(*e).ok())
            .any(|(p, ext)| body.overlaps(&Aabb::new(p.x, p.y, ext.w, ext.h)));
        if hit_solid || pos.x < 0.0 || pos.x > runtime.width {
            alive.0 = false;
            continue;
        }

        for enemy_entity in grids.enemies.query(pos.x, pos.y, BULLET_QUERY_RADIUS) {
            let Ok((mut enemy_alive, enemy_pos, enemy_ext)) = enemies.get_mut(enemy_entity) else {
                continue;
            };
            let enemy_body = Aabb::new(enemy_pos.x, enemy_pos.y, enemy_ext.w, enemy_ext.h);
            if enemy_alive.0 && body.overlaps(&enemy_body) {
                enemy_alive.0 = false;
                alive.0 = false;
                game.score += 30;
                bus.emit(
                    "enemy_shot",
                    serde_json::json!({ "x": enemy_pos.x, "y": enemy_pos.y }),
                );
                break;
            }
        }
    }
}

/// Enemy bullets carry both velocity components and hurt the player on
/// contact through the usual damage routine.
#[allow(clippy::type_complexity)]
fn update_enemy_bullets(
    config: Res<PhysicsConfig>,
    mut grids: ResMut<GameGrids>,
    runtime: Res<LevelRuntime>,
    mut game: ResMut<GameState>,
    respawn: Res<RespawnPoint>,
    mut bus: ResMut<GameEventBus>,
    solids: Query<(&GamePosition, &Extent), (With<Solid>, Without<Bullet>, Without<Player>)>,
    mut bullets: Query<
        (
            Entity,
            &Bullet,
            &mut Alive,
            &mut GamePosition,
            &Velocity,
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

    let mut ordered: Vec<Entity> = bullets
        .iter()
        .filter(|(_, bullet, alive, ..)| bullet.from_enemy && alive.0)
        .map(|(entity, ..)| entity)
        .collect();
    ordered.sort();

    for entity in ordered {
        let Ok((_, _, mut alive, mut pos, vel, extent)) = bullets.get_mut(entity) else {
            continue;
        };
        pos.x += vel.x;
        pos.y += vel.y;
        let body = Aabb::new(pos.x, pos.y, extent.w, extent.h);

        let hit_solid = grids
            .platforms
            .query(pos.x, pos.y, BULLET_QUERY_RADIUS)
            .iter()
            .filter_map(|e| solids.get(*e).ok())
            .any(|(p, ext)| body.overlaps(&Aabb::new(p.x, p.y, ext.w, ext.h)));
        if hit_solid || pos.x < 0.0 || pos.x > runtime.width {
            alive.0 = false;
            continue;
        }

        let pbody = Aabb::new(ppos.x, ppos.y, pext.w, pext.h);
        if body.overlaps(&pbody) {
            alive.0 = false;
            apply_player_hit(
                false, &config, &mut game, &respawn, &mut bus, &mut ppos, &mut pvel, &mut pext,
                &mut pbig, &mut pinvul,
            );
        }
    }
}
