use bevy::prelude::*;
use serde::Serialize;

use crate::components::Alive;
use crate::object_pool::{GamePools, Pooled, Release};
use crate::render::{CullingStats, RenderQuality};
use crate::spatial_hash::GameGrids;

/// About 5 seconds of frame deltas at 60 Hz
const FRAME_HISTORY_CAP: usize = 300;
const MEMORY_HISTORY_CAP: usize = 60;
const RELAXED_POOR_CULLING: f32 = 0.6;
const EMERGENCY_INTERVAL_SECS: f32 = 5.0;
const EMERGENCY_FPS_FLOOR: f32 = 55.0;
/// Stand-in for a heap probe: live entity count scaled to a nominal
/// footprint, enough for the trend math to see churn.
const NOMINAL_ENTITY_BYTES: f32 = 256.0;

#[derive(Clone, Copy, Serialize)]
pub struct PerfThresholds {
    pub low_fps: f32,
    pub inefficient_collision: f32,
    pub poor_culling: f32,
}

impl Default for PerfThresholds {
    fn default() -> Self {
        Self {
            low_fps: 50.0,
            inefficient_collision: 0.3,
            poor_culling: 0.5,
        }
    }
}

#[derive(Clone, Copy, Default, Serialize)]
pub struct AppliedOptimizations {
    pub spatial_hash: bool,
    pub object_pool: bool,
    pub render_culling: bool,
}

/// Actions an analysis pass decided on; the caller owns the world access
/// needed to carry them out.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TuningPass {
    pub retune_grids: bool,
    pub sweep_pools: bool,
    pub relaxed_culling: bool,
}

impl TuningPass {
    fn any(&self) -> bool {
        self.retune_grids || self.sweep_pools || self.relaxed_culling
    }
}

/// Rolling frame and memory statistics with one-shot adaptive tuning. Each
/// optimization fires at most once per session; `reset` re-arms them but
/// leaves relaxed thresholds where they are.
#[derive(Resource)]
pub struct PerfMonitor {
    pub fps: f32,
    frame_count: u32,
    window_elapsed: f32,
    frame_times: Vec<f32>,
    memory_samples: Vec<f32>,
    pub thresholds: PerfThresholds,
    pub applied: AppliedOptimizations,
    pub collision_efficiency: f32,
    pub render_efficiency: f32,
    pub pool_efficiency: f32,
}

impl Default for PerfMonitor {
    fn default() -> Self {
        Self {
            fps: 60.0,
            frame_count: 0,
            window_elapsed: 0.0,
            frame_times: Vec::new(),
            memory_samples: Vec::new(),
            thresholds: PerfThresholds::default(),
            applied: AppliedOptimizations::default(),
            collision_efficiency: 0.0,
            render_efficiency: 0.0,
            pool_efficiency: 0.0,
        }
    }
}

#[derive(Clone, Serialize)]
pub struct PerfReport {
    pub fps: f32,
    pub average_frame_time: f32,
    pub frame_time_deviation: f32,
    pub memory_usage: f32,
    pub memory_trend: f32,
    pub collision_efficiency: f32,
    pub render_efficiency: f32,
    pub pool_efficiency: f32,
    pub applied_optimizations: Vec<&'static str>,
    pub recommendations: Vec<&'static str>,
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

impl PerfMonitor {
    /// Record one frame delta (milliseconds). Returns true once per elapsed
    /// wall-clock second, when the smoothed fps figure has rolled over and an
    /// analysis pass is due.
    pub fn record_frame(&mut self, delta_ms: f32) -> bool {
        self.frame_count += 1;
        self.frame_times.push(delta_ms);
        if self.frame_times.len() > FRAME_HISTORY_CAP {
            let excess = self.frame_times.len() - FRAME_HISTORY_CAP;
            self.frame_times.drain(0..excess);
        }
        self.window_elapsed += delta_ms / 1000.0;
        if self.window_elapsed >= 1.0 {
            self.fps = self.frame_count as f32;
            self.frame_count = 0;
            self.window_elapsed = 0.0;
            true
        } else {
            false
        }
    }

    pub fn record_memory(&mut self, bytes: f32) {
        self.memory_samples.push(bytes);
        if self.memory_samples.len() > MEMORY_HISTORY_CAP {
            let excess = self.memory_samples.len() - MEMORY_HISTORY_CAP;
            self.memory_samples.drain(0..excess);
        }
    }

    /// Copy the current efficiency figures out of the subsystems they are
    /// derived from.
    pub fn feed(&mut self, grids: &GameGrids, pools: &GamePools, culling: &CullingStats) {
        let stats = grids.platforms.stats();
        self.collision_efficiency = if stats.total_objects == 0 {
            1.0
        } else {
            (1.0 - stats.average_query_size / stats.total_objects as f32).clamp(0.0, 1.0)
        };
        self.render_efficiency = culling.efficiency();
        self.pool_efficiency = pools.aggregate_efficiency();
    }

    pub fn average_frame_time(&self) -> f32 {
        mean(&self.frame_times)
    }

    /// Standard deviation of the frame-time history
    pub fn frame_time_deviation(&self) -> f32 {
        if self.frame_times.len() < 2 {
            return 0.0;
        }
        let avg = self.average_frame_time();
        let variance = self
            .frame_times
            .iter()
            .map(|t| (t - avg).powi(2))
            .sum::<f32>()
            / self.frame_times.len() as f32;
        variance.sqrt()
    }

    /// Mean of the newest 10 memory samples minus the mean of the up-to-10
    /// before them. Neutral until both windows have content.
    pub fn memory_trend(&self) -> f32 {
        let n = self.memory_samples.len();
        if n < 10 {
            return 0.0;
        }
        let older = &self.memory_samples[n.saturating_sub(20)..n - 10];
        if older.is_empty() {
            return 0.0;
        }
        mean(&self.memory_samples[n - 10..]) - mean(older)
    }

    /// Check each one-shot trigger against the current figures and mark the
    /// ones that fire. Order and conditions: low fps arms a grid retune,
    /// a rising memory trend arms a pool sweep, and weak culling relaxes its
    /// own threshold (the relaxation is the whole action).
    pub fn analyze(&mut self) -> TuningPass {
        let mut pass = TuningPass::default();
        if self.fps < self.thresholds.low_fps && !self.applied.spatial_hash {
            self.applied.spatial_hash = true;
            pass.retune_grids = true;
        }
        if self.memory_trend() > 0.0 && !self.applied.object_pool {
            self.applied.object_pool = true;
            pass.sweep_pools = true;
        }
        if self.render_efficiency < self.thresholds.poor_culling && !self.applied.render_culling {
            self.thresholds.poor_culling = RELAXED_POOR_CULLING;
            self.applied.render_culling = true;
            pass.relaxed_culling = true;
        }
        pass
    }

    pub fn applied_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.applied.spatial_hash {
            names.push("spatial_hash");
        }
        if self.applied.object_pool {
            names.push("object_pools");
        }
        if self.applied.render_culling {
            names.push("render_culling");
        }
        names
    }

    pub fn recommendations(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.fps < self.thresholds.low_fps {
            out.push("Consider reducing visual effects or object count");
        }
        if self.memory_trend() > 0.0 {
            out.push("Memory usage increasing, check for leaks");
        }
        if self.collision_efficiency < self.thresholds.inefficient_collision {
            out.push("Spatial queries return large sets, adjust cell sizes");
        }
        if self.render_efficiency < self.thresholds.poor_culling {
            out.push("Culling leaves most objects visible, check viewport bounds");
        }
        out
    }

    pub fn report(&self) -> PerfReport {
        PerfReport {
            fps: self.fps,
            average_frame_time: self.average_frame_time(),
            frame_time_deviation: self.frame_time_deviation(),
            memory_usage: self.memory_samples.last().copied().unwrap_or(0.0),
            memory_trend: self.memory_trend(),
            collision_efficiency: self.collision_efficiency,
            render_efficiency: self.render_efficiency,
            pool_efficiency: self.pool_efficiency,
            applied_optimizations: self.applied_names(),
            recommendations: self.recommendations(),
        }
    }

    /// New-session reset: histories and applied flags clear, thresholds keep
    /// any relaxed values.
    pub fn reset(&mut self) {
        self.fps = 60.0;
        self.frame_count = 0;
        self.window_elapsed = 0.0;
        self.frame_times.clear();
        self.memory_samples.clear();
        self.applied = AppliedOptimizations::default();
    }
}

#[derive(Resource)]
struct EmergencyTimer(Timer);

impl Default for EmergencyTimer {
    fn default() -> Self {
        Self(Timer::from_seconds(
            EMERGENCY_INTERVAL_SECS,
            TimerMode::Repeating,
        ))
    }
}

pub struct PerfPlugin;

impl Plugin for PerfPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PerfMonitor>()
            .init_resource::<EmergencyTimer>()
            .add_systems(Update, (sample_performance, emergency_brake).chain());
    }
}

/// Runs on the real frame schedule, not the fixed tick: the monitor measures
/// wall-clock behavior, and its once-per-second analysis happens inline here.
fn sample_performance(
    time: Res<Time>,
    mut commands: Commands,
    mut monitor: ResMut<PerfMonitor>,
    mut grids: ResMut<GameGrids>,
    mut pools: ResMut<GamePools>,
    culling: Res<CullingStats>,
    entities: Query<Entity>,
    pooled: Query<(Entity, &Pooled, &Alive)>,
) {
    monitor.record_memory(entities.iter().count() as f32 * NOMINAL_ENTITY_BYTES);
    monitor.feed(&grids, &pools, &culling);

    if !monitor.record_frame(time.delta_secs() * 1000.0) {
        return;
    }
    let pass = monitor.analyze();
    if pass.retune_grids {
        grids.optimize_all();
    }
    if pass.sweep_pools {
        release_dead(&mut commands, &mut pools, &pooled);
    }
    if pass.any() {
        info!(
            "[Jasim perf] Applied optimizations: {}",
            monitor.applied_names().join(", ")
        );
    }
}

fn release_dead(
    commands: &mut Commands,
    pools: &mut GamePools,
    pooled: &Query<(Entity, &Pooled, &Alive)>,
) {
    for (entity, kind, alive) in pooled.iter() {
        if alive.0 {
            continue;
        }
        match pools.pool_mut(kind.0).release(entity) {
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

/// Independent 5-second watchdog. Unlike the one-shot optimizations this
/// repeats for as long as the frame rate stays under the floor.
fn emergency_brake(
    time: Res<Time>,
    mut commands: Commands,
    mut timer: ResMut<EmergencyTimer>,
    monitor: Res<PerfMonitor>,
    mut grids: ResMut<GameGrids>,
    mut pools: ResMut<GamePools>,
    mut quality: ResMut<RenderQuality>,
) {
    if !timer.0.tick(time.delta()).just_finished() {
        return;
    }
    if monitor.fps >= EMERGENCY_FPS_FLOOR {
        return;
    }
    run_emergency_pass(&mut commands, &monitor, &mut grids, &mut pools, &mut quality);
}

fn run_emergency_pass(
    commands: &mut Commands,
    monitor: &PerfMonitor,
    grids: &mut GameGrids,
    pools: &mut GamePools,
    quality: &mut RenderQuality,
) {
    warn!(
        "[Jasim perf] Emergency optimizations at {:.0} fps",
        monitor.fps
    );
    *quality = RenderQuality::Low;
    let sweep = pools.release_all();
    for entity in sweep.parked {
        commands
            .entity(entity)
            .insert((Alive(false), Visibility::Hidden));
    }
    for entity in sweep.discarded {
        commands.entity(entity).despawn();
    }
    grids.optimize_all();
}
