use bevy::prelude::*;
use serde::Serialize;

use crate::components::{Alive, Extent, GamePosition, Velocity};

/// Pool category a recycled entity belongs to
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PoolKind {
    Bullet,
    Powerup,
    Coin,
    Enemy,
}

/// Marks an entity whose id is owned by a pool rather than a level
#[derive(Component, Clone, Copy)]
pub struct Pooled(pub PoolKind);

/// What to do with an entity handed back to its pool
#[derive(Debug, PartialEq, Eq)]
pub enum Release {
    /// Kept for reuse; hide it and stop simulating it
    Pooled,
    /// Pool is at capacity; despawn it
    Discarded,
    /// Not an active member of this pool; leave it alone
    Untracked,
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct PoolCounters {
    pub total_created: u64,
    pub total_reused: u64,
    pub pool_hits: u64,
    pub pool_misses: u64,
}

/// Recycles entity ids for short-lived gameplay objects. Released entities
/// are parked hidden instead of despawned; acquiring one overwrites its
/// components with a fresh bundle, so spawn bursts stop allocating once the
/// pool is warm.
pub struct EntityPool {
    free: Vec<Entity>,
    active: Vec<Entity>,
    pub initial_size: usize,
    pub max_size: usize,
    pub counters: PoolCounters,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolStats {
    pub pool_size: usize,
    pub active_count: usize,
    pub total_objects: usize,
    pub total_created: u64,
    pub total_reused: u64,
    pub pool_hits: u64,
    pub pool_misses: u64,
    pub reuse_rate: f32,
}

/// Entities drained from a pool, split by what the caller must do with them
#[derive(Default)]
pub struct PoolSweep {
    pub parked: Vec<Entity>,
    pub discarded: Vec<Entity>,
}

impl PoolSweep {
    fn absorb(&mut self, mut other: PoolSweep) {
        self.parked.append(&mut other.parked);
        self.discarded.append(&mut other.discarded);
    }
}

impl EntityPool {
    pub fn new(initial_size: usize, max_size: usize) -> Self {
        Self {
            free: Vec::with_capacity(max_size),
            active: Vec::new(),
            initial_size,
            max_size,
            counters: PoolCounters::default(),
        }
    }

    /// Take a parked entity for reuse. `None` means the pool is empty and the
    /// caller must spawn a fresh entity and `track` it.
    pub fn acquire(&mut self) -> Option<Entity> {
        match self.free.pop() {
            Some(entity) => {
                self.active.push(entity);
                self.counters.pool_hits += 1;
                self.counters.total_reused += 1;
                Some(entity)
            }
            None => {
                self.counters.pool_misses += 1;
                None
            }
        }
    }

    /// Register a freshly spawned entity as an active pool member
    pub fn track(&mut self, entity: Entity) {
        self.active.push(entity);
        self.counters.total_created += 1;
    }

    /// Register a pre-spawned parked entity. Prewarming stays out of the
    /// created/reused counters, so the reuse rate only reflects demand.
    pub fn adopt_free(&mut self, entity: Entity) {
        self.free.push(entity);
    }

    pub fn release(&mut self, entity: Entity) -> Release {
        let Some(index) = self.active.iter().position(|e| *e == entity) else {
            return Release::Untracked;
        };
        self.active.remove(index);
        if self.free.len() < self.max_size {
            self.free.push(entity);
            Release::Pooled
        } else {
            Release::Discarded
        }
    }

    /// Drain every active member, parking up to capacity
    pub fn release_all(&mut self) -> PoolSweep {
        let mut sweep = PoolSweep::default();
        for entity in std::mem::take(&mut self.active) {
            if self.free.len() < self.max_size {
                self.free.push(entity);
                sweep.parked.push(entity);
            } else {
                sweep.discarded.push(entity);
            }
        }
        sweep
    }

    pub fn reuse_rate(&self) -> f32 {
        let denominator = self.counters.total_reused + self.counters.total_created;
        if denominator == 0 {
            0.0
        } else {
            self.counters.total_reused as f32 / denominator as f32
        }
    }

    pub fn reset_stats(&mut self) {
        self.counters = PoolCounters::default();
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            pool_size: self.free.len(),
            active_count: self.active.len(),
            total_objects: self.free.len() + self.active.len(),
            total_created: self.counters.total_created,
            total_reused: self.counters.total_reused,
            pool_hits: self.counters.pool_hits,
            pool_misses: self.counters.pool_misses,
            reuse_rate: self.reuse_rate(),
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }
}

/// One pool per short-lived category, sized for its expected churn
#[derive(Resource)]
pub struct GamePools {
    pub bullets: EntityPool,
    pub powerups: EntityPool,
    pub coins: EntityPool,
    pub enemies: EntityPool,
}

impl Default for GamePools {
    fn default() -> Self {
        Self {
            bullets: EntityPool::new(20, 50),
            powerups: EntityPool::new(10, 25),
            coins: EntityPool::new(50, 100),
            enemies: EntityPool::new(15, 30),
        }
    }
}

impl GamePools {
    pub fn pool_mut(&mut self, kind: PoolKind) -> &mut EntityPool {
        match kind {
            PoolKind::Bullet => &mut self.bullets,
            PoolKind::Powerup => &mut self.powerups,
            PoolKind::Coin => &mut self.coins,
            PoolKind::Enemy => &mut self.enemies,
        }
    }

    pub fn release_all(&mut self) -> PoolSweep {
        let mut sweep = self.bullets.release_all();
        sweep.absorb(self.powerups.release_all());
        sweep.absorb(self.coins.release_all());
        sweep.absorb(self.enemies.release_all());
        sweep
    }

    pub fn reset_stats_all(&mut self) {
        self.bullets.reset_stats();
        self.powerups.reset_stats();
        self.coins.reset_stats();
        self.enemies.reset_stats();
    }

    /// Reuse fraction across every pool, for the performance report
    pub fn aggregate_efficiency(&self) -> f32 {
        let pools = [&self.bullets, &self.powerups, &self.coins, &self.enemies];
        let reused: u64 = pools.iter().map(|p| p.counters.total_reused).sum();
        let created: u64 = pools.iter().map(|p| p.counters.total_created).sum();
        reused as f32 / (created + reused).max(1) as f32
    }
}

pub struct ObjectPoolPlugin;

impl Plugin for ObjectPoolPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GamePools>()
            .add_systems(Startup, prewarm_pools)
            .add_systems(
                FixedUpdate,
                sweep_dead_pooled.in_set(crate::game_runtime::TickSet::Cleanup),
            );
    }
}

fn pool_seed_bundle(
    kind: PoolKind,
) -> (Pooled, Alive, GamePosition, Velocity, Extent, Transform, Visibility) {
    let (w, h, z) = match kind {
        PoolKind::Bullet => (10.0, 10.0, 12.0),
        PoolKind::Powerup => (22.0, 22.0, 5.0),
        PoolKind::Coin => (18.0, 18.0, 5.0),
        PoolKind::Enemy => (30.0, 26.0, 8.0),
    };
    (
        Pooled(kind),
        Alive(false),
        GamePosition::default(),
        Velocity::default(),
        Extent { w, h },
        Transform::from_xyz(0.0, 0.0, z),
        Visibility::Hidden,
    )
}

/// Pre-spawn each pool's initial population, parked and hidden
fn prewarm_pools(mut commands: Commands, mut pools: ResMut<GamePools>) {
    for kind in [
        PoolKind::Bullet,
        PoolKind::Powerup,
        PoolKind::Coin,
        PoolKind::Enemy,
    ] {
        let count = pools.pool_mut(kind).initial_size;
        for _ in 0..count {
            let entity = commands.spawn(pool_seed_bundle(kind)).id();
            pools.pool_mut(kind).adopt_free(entity);
        }
    }
}

/// Return dead active members to their pools once per tick. Parked entities
/// are already out of the active lists, so they come back `Untracked` and
/// are left alone.
fn sweep_dead_pooled(
    mut commands: Commands,
    mut pools: ResMut<GamePools>,
    swept: Query<(Entity, &Pooled, &Alive)>,
) {
    for (entity, pooled, alive) in swept.iter() {
        if alive.0 {
            continue;
        }
        match pools.pool_mut(pooled.0).release(entity) {
            Release::Pooled => {
                commands.entity(entity).insert(Visibility::Hidden);
            }
            Release::Discarded => {
                commands.entity(entity).despawn();
            }
            Release::Untracked => {}
        }
    }
}
