use std::collections::HashMap;

use bevy::prelude::*;
use serde::Serialize;

use crate::bullets::Bullet;
use crate::components::{Alive, GamePosition};
use crate::enemies::Enemy;
use crate::items::Powerup;
use crate::level::{Coin, Solid};

/// Uniform grid over gameplay space. Entities are filed under the cell
/// containing their top-left corner, and the whole grid is rebuilt once per
/// tick, so queries never see stale positions. Query traffic is measured so
/// the performance monitor can retune the cell size at runtime.
pub struct SpatialGrid {
    pub cell_size: f32,
    pub default_radius: f32,
    cells: HashMap<(i32, i32), Vec<Entity>>,
    pub total_objects: usize,
    pub total_queries: u64,
    pub average_query_size: f32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct GridStats {
    pub cell_count: usize,
    pub total_objects: usize,
    pub total_queries: u64,
    pub average_query_size: f32,
    pub cell_size: f32,
}

impl SpatialGrid {
    pub fn new(cell_size: f32, default_radius: f32) -> Self {
        Self {
            cell_size,
            default_radius,
            cells: HashMap::new(),
            total_objects: 0,
            total_queries: 0,
            average_query_size: 0.0,
        }
    }

    fn cell_of(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.total_objects = 0;
    }

    pub fn insert(&mut self, entity: Entity, x: f32, y: f32) {
        let key = self.cell_of(x, y);
        self.cells.entry(key).or_default().push(entity);
        self.total_objects += 1;
    }

    /// All entities filed in cells touching the radius around (x, y).
    /// Results are sorted so collision resolution iterates deterministically.
    pub fn query(&mut self, x: f32, y: f32, radius: f32) -> Vec<Entity> {
        let min_cx = ((x - radius) / self.cell_size).floor() as i32;
        let max_cx = ((x + radius) / self.cell_size).floor() as i32;
        let min_cy = ((y - radius) / self.cell_size).floor() as i32;
        let max_cy = ((y + radius) / self.cell_size).floor() as i32;
        let mut out = Vec::new();
        for cy in min_cy..=max_cy {
            for cx in min_cx..=max_cx {
                if let Some(entities) = self.cells.get(&(cx, cy)) {
                    out.extend_from_slice(entities);
                }
            }
        }
        out.sort_unstable();
        out.dedup();

        self.total_queries += 1;
        let n = self.total_queries as f32;
        self.average_query_size = (self.average_query_size * (n - 1.0) + out.len() as f32) / n;
        out
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn query_default(&mut self, x: f32, y: f32) -> Vec<Entity> {
        self.query(x, y, self.default_radius)
    }

    /// Rect variant for sweeping a span of the level; not counted in the
    /// query statistics.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn query_rect(&self, x: f32, y: f32, w: f32, h: f32) -> Vec<Entity> {
        let min_cx = (x / self.cell_size).floor() as i32;
        let max_cx = ((x + w) / self.cell_size).floor() as i32;
        let min_cy = (y / self.cell_size).floor() as i32;
        let max_cy = ((y + h) / self.cell_size).floor() as i32;
        let mut out = Vec::new();
        for cy in min_cy..=max_cy {
            for cx in min_cx..=max_cx {
                if let Some(entities) = self.cells.get(&(cx, cy)) {
                    out.extend_from_slice(entities);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Retune the cell size from observed query sizes: crowded queries grow
    /// the cells, near-empty queries shrink them. Bounded to 50..200 pixels.
    /// Returns true when the size changed; the cells are dropped because the
    /// old keys no longer apply, and the next rebuild refills them.
    pub fn optimize_cell_size(&mut self) -> bool {
        let old = self.cell_size;
        if self.average_query_size > 20.0 {
            self.cell_size = (self.cell_size * 1.5).min(200.0);
        } else if self.average_query_size < 5.0 {
            self.cell_size = (self.cell_size * 0.8).max(50.0);
        }
        if (self.cell_size - old).abs() > f32::EPSILON {
            self.cells.clear();
            true
        } else {
            false
        }
    }

    pub fn reset_stats(&mut self) {
        self.total_queries = 0;
        self.average_query_size = 0.0;
    }

    pub fn stats(&self) -> GridStats {
        GridStats {
            cell_count: self.cells.len(),
            total_objects: self.total_objects,
            total_queries: self.total_queries,
            average_query_size: self.average_query_size,
            cell_size: self.cell_size,
        }
    }
}

/// One grid per collision category, each tuned to its population's spread
#[derive(Resource)]
pub struct GameGrids {
    pub platforms: SpatialGrid,
    pub enemies: SpatialGrid,
    pub items: SpatialGrid,
    pub bullets: SpatialGrid,
}

impl Default for GameGrids {
    fn default() -> Self {
        Self {
            platforms: SpatialGrid::new(80.0, 80.0),
            enemies: SpatialGrid::new(120.0, 120.0),
            items: SpatialGrid::new(60.0, 60.0),
            bullets: SpatialGrid::new(40.0, 40.0),
        }
    }
}

impl GameGrids {
    pub fn optimize_all(&mut self) {
        for (name, grid) in [
            ("platforms", &mut self.platforms),
            ("enemies", &mut self.enemies),
            ("items", &mut self.items),
            ("bullets", &mut self.bullets),
        ] {
            let old = grid.cell_size;
            if grid.optimize_cell_size() {
                info!(
                    "[Jasim grid] Retuned {} cell size {:.0} -> {:.0}",
                    name, old, grid.cell_size
                );
            }
        }
    }

    pub fn reset_stats_all(&mut self) {
        self.platforms.reset_stats();
        self.enemies.reset_stats();
        self.items.reset_stats();
        self.bullets.reset_stats();
    }
}

pub struct SpatialHashPlugin;

impl Plugin for SpatialHashPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameGrids>().add_systems(
            FixedPreUpdate,
            rebuild_grids
                .after(crate::level::apply_level_loads)
                .run_if(crate::game_runtime::gameplay_active),
        );
    }
}

/// Refill all four grids from live entities. Broken blocks, taken coins and
/// parked pool entities are left out, so a grid hit is always a live object.
fn rebuild_grids(
    mut grids: ResMut<GameGrids>,
    solids: Query<(Entity, &GamePosition, Option<&Alive>), With<Solid>>,
    enemies: Query<(Entity, &GamePosition, &Alive), With<Enemy>>,
    coins: Query<(Entity, &GamePosition, &Alive), With<Coin>>,
    powerups: Query<(Entity, &GamePosition, &Alive), With<Powerup>>,
    bullets: Query<(Entity, &GamePosition, &Alive), With<Bullet>>,
) {
    grids.platforms.clear();
    for (entity, pos, alive) in solids.iter() {
        if alive.map_or(true, |a| a.0) {
            grids.platforms.insert(entity, pos.x, pos.y);
        }
    }

    grids.enemies.clear();
    for (entity, pos, alive) in enemies.iter() {
        if alive.0 {
            grids.enemies.insert(entity, pos.x, pos.y);
        }
    }

    grids.items.clear();
    for (entity, pos, alive) in coins.iter() {
        if alive.0 {
            grids.items.insert(entity, pos.x, pos.y);
        }
    }
    for (entity, pos, alive) in powerups.iter() {
        if alive.0 {
            grids.items.insert(entity, pos.x, pos.y);
        }
    }

    grids.bullets.clear();
    for (entity, pos, alive) in bullets.iter() {
        if alive.0 {
            grids.bullets.insert(entity, pos.x, pos.y);
        }
    }
}
