use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::enemies::Enemy;
use crate::events::GameEventBus;
use crate::game_runtime::{GameState, RespawnPoint};
use crate::hud::HudMessage;
use crate::object_pool::GamePools;
use crate::render::theme_palette;

pub const COIN_SPACING: f32 = 26.0;
pub const COIN_SIZE: f32 = 18.0;
pub const COIN_VALUE: u32 = 5;
pub const BLOCK_SIZE: f32 = 40.0;
pub const PIPE_W: f32 = 64.0;
pub const PIPE_H: f32 = 64.0;
pub const HOUSE_W: f32 = 100.0;
pub const HOUSE_H: f32 = 110.0;
pub const FLAG_W: f32 = 8.0;
pub const FLAG_H: f32 = 140.0;
pub const WALKER_W: f32 = 30.0;
pub const WALKER_H: f32 = 26.0;
pub const SHOOTER_W: f32 = 34.0;
pub const SHOOTER_H: f32 = 34.0;

/// Background and tile styling key for a level
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelTheme {
    Overworld,
    Underground,
    Desert,
    Snow,
    Sky,
    Castle,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Question,
    Brick,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockContents {
    Coin,
    Grow,
    Life,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Walker,
    Shooter,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipeDir {
    Down,
    Up,
}

/// A point in gameplay space (y-down world pixels)
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PlatformDef {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// A horizontal run of coins, expanded at spawn time
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CoinRowDef {
    pub x: f32,
    pub y: f32,
    pub count: u32,
}

impl CoinRowDef {
    pub fn positions(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        (0..self.count).map(move |i| (self.x + i as f32 * COIN_SPACING, self.y))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockDef {
    pub x: f32,
    pub y: f32,
    pub kind: BlockKind,
    #[serde(default)]
    pub contents: Option<BlockContents>,
    #[serde(default)]
    pub breakable: bool,
}

/// One enemy placement, or a spaced group when `count` > 1.
/// Groups alternate walk direction so they spread out instead of marching
/// in lockstep.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnemyDef {
    pub x: f32,
    pub y: f32,
    pub kind: EnemyKind,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub spacing: f32,
    #[serde(default = "default_dir")]
    pub dir: f32,
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_cooldown")]
    pub cooldown: u32,
}

fn default_count() -> u32 {
    1
}

fn default_dir() -> f32 {
    1.0
}

fn default_speed() -> f32 {
    1.0
}

fn default_cooldown() -> u32 {
    120
}

/// Fully resolved enemy placement
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySpawn {
    pub kind: EnemyKind,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub dir: f32,
    pub speed: f32,
    pub cooldown: u32,
}

impl EnemyKind {
    pub fn extent(self) -> (f32, f32) {
        match self {
            EnemyKind::Walker => (WALKER_W, WALKER_H),
            EnemyKind::Shooter => (SHOOTER_W, SHOOTER_H),
        }
    }
}

impl EnemyDef {
    pub fn expand(&self) -> Vec<EnemySpawn> {
        let (w, h) = self.kind.extent();
        (0..self.count.max(1))
            .map(|i| EnemySpawn {
                kind: self.kind,
                x: self.x + i as f32 * self.spacing,
                y: self.y,
                w,
                h,
                dir: if i % 2 == 0 { self.dir } else { -self.dir },
                speed: self.speed,
                cooldown: self.cooldown,
            })
            .collect()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipeDef {
    pub x: f32,
    pub y: f32,
    pub dir: PipeDir,
    pub target_level: String,
    pub target_spawn: SpawnPoint,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct HouseDef {
    pub x: f32,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CheckpointDef {
    pub x: f32,
}

/// Everything needed to instantiate one level. The ground band is not part
/// of the template; it is prepended on load with the template's width.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LevelTemplate {
    pub name: String,
    pub theme: LevelTheme,
    pub width: f32,
    pub start: SpawnPoint,
    pub flag_x: f32,
    #[serde(default)]
    pub houses: Vec<HouseDef>,
    #[serde(default)]
    pub platforms: Vec<PlatformDef>,
    #[serde(default)]
    pub coins: Vec<CoinRowDef>,
    #[serde(default)]
    pub blocks: Vec<BlockDef>,
    #[serde(default)]
    pub enemies: Vec<EnemyDef>,
    #[serde(default)]
    pub pipes: Vec<PipeDef>,
    #[serde(default)]
    pub checkpoints: Vec<CheckpointDef>,
}

// --- level furniture components ---

/// Solid slab the movement solvers collide with (includes the ground band)
#[derive(Component)]
pub struct Platform;

/// Anything inserted into the platform grid category: platforms, the ground
/// band and unbroken blocks.
#[derive(Component)]
pub struct Solid;

#[derive(Component)]
pub struct House;

#[derive(Component)]
pub struct Coin {
    pub value: u32,
}

#[derive(Component)]
pub struct Block {
    pub kind: BlockKind,
    pub contents: Option<BlockContents>,
    pub breakable: bool,
    pub used: bool,
}

#[derive(Component)]
pub struct Pipe {
    pub dir: PipeDir,
    pub target_level: String,
    pub target_spawn: SpawnPoint,
}

#[derive(Component)]
pub struct Checkpoint {
    pub reached: bool,
}

#[derive(Component)]
pub struct Flag {
    pub reached: bool,
}

// --- level store ---

/// All level templates known to the game. Replaceable wholesale from config
/// or embedded web data.
#[derive(Resource)]
pub struct LevelLibrary {
    pub levels: Vec<LevelTemplate>,
}

impl Default for LevelLibrary {
    fn default() -> Self {
        Self {
            levels: builtin_levels(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelStats {
    pub total_levels: usize,
    pub total_platforms: usize,
    pub total_coins: u32,
    pub total_enemies: u32,
    pub average_level_width: f32,
}

impl LevelLibrary {
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.levels.iter().position(|level| level.name == name)
    }

    /// Aggregate counts across templates. Platform counts exclude the
    /// per-load ground band; coin and enemy counts are post-expansion.
    pub fn stats(&self) -> LevelStats {
        let total_levels = self.levels.len();
        let total_platforms = self.levels.iter().map(|l| l.platforms.len()).sum();
        let total_coins = self
            .levels
            .iter()
            .flat_map(|l| l.coins.iter())
            .map(|row| row.count)
            .sum();
        let total_enemies = self
            .levels
            .iter()
            .flat_map(|l| l.enemies.iter())
            .map(|def| def.count.max(1))
            .sum();
        let average_level_width = if total_levels == 0 {
            0.0
        } else {
            self.levels.iter().map(|l| l.width).sum::<f32>() / total_levels as f32
        };
        LevelStats {
            total_levels,
            total_platforms,
            total_coins,
            total_enemies,
            average_level_width,
        }
    }
}

/// A queued level switch. Requests bump the runtime generation immediately,
/// which invalidates any deferred tasks queued under the old level.
#[derive(Clone, Debug)]
pub struct LoadRequest {
    pub index: usize,
    /// Override for the player position (pipe warps); template start otherwise.
    pub spawn: Option<SpawnPoint>,
}

#[derive(Resource)]
pub struct LevelRuntime {
    pub index: usize,
    pub name: String,
    pub width: f32,
    pub theme: LevelTheme,
    pub generation: u64,
    pub pending: Option<LoadRequest>,
}

impl Default for LevelRuntime {
    fn default() -> Self {
        Self {
            index: 0,
            name: String::new(),
            width: VIEW_WIDTH,
            theme: LevelTheme::Overworld,
            generation: 0,
            pending: None,
        }
    }
}

impl LevelRuntime {
    pub fn request_load(&mut self, request: LoadRequest) {
        self.generation = self.generation.wrapping_add(1);
        self.pending = Some(request);
    }
}

pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LevelLibrary>()
            .init_resource::<LevelRuntime>()
            .add_systems(Startup, queue_initial_level)
            .add_systems(FixedPreUpdate, apply_level_loads);
    }
}

fn queue_initial_level(mut runtime: ResMut<LevelRuntime>) {
    runtime.request_load(LoadRequest {
        index: 0,
        spawn: None,
    });
}

/// Swap the world to the requested level: release pooled projectiles and
/// items, despawn the old level's entities, spawn the new template and reset
/// the player, camera and respawn point. Runs before the tick chain so no
/// gameplay system ever sees a half-loaded level.
#[allow(clippy::too_many_arguments)]
pub fn apply_level_loads(
    mut commands: Commands,
    library: Res<LevelLibrary>,
    mut runtime: ResMut<LevelRuntime>,
    mut game: ResMut<GameState>,
    mut pools: ResMut<GamePools>,
    mut camera_x: ResMut<crate::camera::CameraX>,
    mut respawn: ResMut<RespawnPoint>,
    mut bus: ResMut<GameEventBus>,
    mut message: ResMut<HudMessage>,
    headless: Res<HeadlessMode>,
    level_entities: Query<Entity, With<LevelEntity>>,
    mut player: Query<
        (
            &mut GamePosition,
            &mut Velocity,
            &mut Grounded,
            &mut CoyoteTimer,
            &mut JumpBuffer,
            &mut Invulnerable,
            &mut ShootCooldown,
            &Extent,
        ),
        With<Player>,
    >,
) {
    let Some(request) = runtime.pending.take() else {
        return;
    };
    let Some(template) = library.levels.get(request.index) else {
        error!("[Jasim level] Invalid level index: {}", request.index);
        return;
    };

    let sweep = pools.release_all();
    for entity in sweep.parked {
        commands
            .entity(entity)
            .insert((Visibility::Hidden, Alive(false)));
    }
    for entity in sweep.discarded {
        commands.entity(entity).despawn();
    }

    for entity in level_entities.iter() {
        commands.entity(entity).despawn();
    }

    spawn_level_entities(&mut commands, template, headless.0);

    let spawn = request.spawn.unwrap_or(template.start);
    if let Ok((
        mut pos,
        mut vel,
        mut grounded,
        mut coyote,
        mut buffer,
        mut invul,
        mut cooldown,
        extent,
    )) = player.get_single_mut()
    {
        pos.x = spawn.x;
        pos.y = spawn.y;
        vel.x = 0.0;
        vel.y = 0.0;
        grounded.0 = false;
        coyote.0 = 0;
        buffer.0 = 0;
        invul.0 = 0;
        cooldown.0 = 0;

        // Pipe warps respawn exactly where they drop you; plain loads clamp
        // the respawn onto the ground band.
        *respawn = match request.spawn {
            Some(s) => RespawnPoint { x: s.x, y: s.y },
            None => RespawnPoint {
                x: template.start.x,
                y: template.start.y.min(GROUND_Y - extent.h),
            },
        };
    }

    camera_x.0 = 0.0;
    game.level_index = request.index;
    // a pipe warp's own banner survives the load it triggered
    if request.spawn.is_none() {
        message.visible = false;
    }

    runtime.index = request.index;
    runtime.name = template.name.clone();
    runtime.width = template.width;
    runtime.theme = template.theme;

    bus.emit(
        "level_loaded",
        serde_json::json!({ "index": request.index, "name": template.name }),
    );
    info!(
        "[Jasim level] Loaded level {}: {}",
        request.index, template.name
    );
}

fn spawn_level_entities(commands: &mut Commands, template: &LevelTemplate, headless: bool) {
    let pal = theme_palette(template.theme);

    let ground = PlatformDef {
        x: 0.0,
        y: GROUND_Y,
        w: template.width,
        h: GROUND_H,
    };
    for def in std::iter::once(&ground).chain(template.platforms.iter()) {
        let mut e = commands.spawn((
            Platform,
            Solid,
            LevelEntity,
            GamePosition { x: def.x, y: def.y },
            Extent { w: def.w, h: def.h },
            Transform::from_xyz(0.0, 0.0, 1.0),
            Visibility::default(),
        ));
        if !headless {
            e.insert(Sprite::from_color(pal.platform, Vec2::new(def.w, def.h)));
        }
    }

    for def in &template.houses {
        let mut e = commands.spawn((
            House,
            LevelEntity,
            GamePosition {
                x: def.x,
                y: GROUND_Y - HOUSE_H,
            },
            Extent {
                w: HOUSE_W,
                h: HOUSE_H,
            },
            Transform::from_xyz(0.0, 0.0, 0.0),
            Visibility::default(),
        ));
        if !headless {
            e.insert(Sprite::from_color(pal.house, Vec2::new(HOUSE_W, HOUSE_H)));
        }
    }

    for def in &template.blocks {
        let color = match def.kind {
            BlockKind::Question => pal.block,
            BlockKind::Brick => pal.brick,
        };
        let mut e = commands.spawn((
            Block {
                kind: def.kind,
                contents: def.contents,
                breakable: def.breakable,
                used: false,
            },
            Solid,
            Alive(true),
            LevelEntity,
            GamePosition { x: def.x, y: def.y },
            Extent {
                w: BLOCK_SIZE,
                h: BLOCK_SIZE,
            },
            Transform::from_xyz(0.0, 0.0, 5.0),
            Visibility::default(),
        ));
        if !headless {
            e.insert(Sprite::from_color(color, Vec2::splat(BLOCK_SIZE)));
        }
    }

    for row in &template.coins {
        for (x, y) in row.positions() {
            let mut e = commands.spawn((
                Coin { value: COIN_VALUE },
                Alive(true),
                LevelEntity,
                GamePosition { x, y },
                Extent {
                    w: COIN_SIZE,
                    h: COIN_SIZE,
                },
                Transform::from_xyz(0.0, 0.0, 5.0),
                Visibility::default(),
            ));
            if !headless {
                e.insert(Sprite::from_color(pal.coin, Vec2::splat(COIN_SIZE)));
            }
        }
    }

    for def in &template.enemies {
        for spawn in def.expand() {
            let color = match spawn.kind {
                EnemyKind::Walker => pal.enemy,
                EnemyKind::Shooter => pal.shooter,
            };
            let mut e = commands.spawn((
                Enemy {
                    kind: spawn.kind,
                    dir: spawn.dir,
                    speed: spawn.speed,
                    cooldown: spawn.cooldown,
                },
                Alive(true),
                LevelEntity,
                GamePosition {
                    x: spawn.x,
                    y: spawn.y,
                },
                Extent {
                    w: spawn.w,
                    h: spawn.h,
                },
                Velocity::default(),
                Transform::from_xyz(0.0, 0.0, 8.0),
                Visibility::default(),
            ));
            if !headless {
                e.insert(Sprite::from_color(color, Vec2::new(spawn.w, spawn.h)));
            }
        }
    }

    for def in &template.pipes {
        let mut e = commands.spawn((
            Pipe {
                dir: def.dir,
                target_level: def.target_level.clone(),
                target_spawn: def.target_spawn,
            },
            LevelEntity,
            GamePosition { x: def.x, y: def.y },
            Extent { w: PIPE_W, h: PIPE_H },
            Transform::from_xyz(0.0, 0.0, 2.0),
            Visibility::default(),
        ));
        if !headless {
            e.insert(Sprite::from_color(pal.pipe, Vec2::new(PIPE_W, PIPE_H)));
        }
    }

    for def in &template.checkpoints {
        let mut e = commands.spawn((
            Checkpoint { reached: false },
            LevelEntity,
            GamePosition {
                x: def.x,
                y: GROUND_Y - 52.0,
            },
            Extent { w: 6.0, h: 52.0 },
            Transform::from_xyz(0.0, 0.0, 2.0),
            Visibility::default(),
        ));
        if !headless {
            e.insert(Sprite::from_color(pal.checkpoint, Vec2::new(6.0, 52.0)));
        }
    }

    {
        let mut e = commands.spawn((
            Flag { reached: false },
            LevelEntity,
            GamePosition {
                x: template.flag_x,
                y: GROUND_Y - FLAG_H,
            },
            Extent {
                w: FLAG_W,
                h: FLAG_H,
            },
            Transform::from_xyz(0.0, 0.0, 2.0),
            Visibility::default(),
        ));
        if !headless {
            e.insert(Sprite::from_color(pal.flag, Vec2::new(FLAG_W, FLAG_H)));
        }
    }
}

// --- built-in campaign ---

fn plat(x: f32, y: f32, w: f32, h: f32) -> PlatformDef {
    PlatformDef { x, y, w, h }
}

fn coin_row(x: f32, y: f32, count: u32) -> CoinRowDef {
    CoinRowDef { x, y, count }
}

fn qblock(x: f32, y: f32, contents: BlockContents) -> BlockDef {
    BlockDef {
        x,
        y,
        kind: BlockKind::Question,
        contents: Some(contents),
        breakable: false,
    }
}

fn brick(x: f32, y: f32) -> BlockDef {
    BlockDef {
        x,
        y,
        kind: BlockKind::Brick,
        contents: None,
        breakable: true,
    }
}

fn walkers(x: f32, y: f32, count: u32, spacing: f32) -> EnemyDef {
    EnemyDef {
        x,
        y,
        kind: EnemyKind::Walker,
        count,
        spacing,
        dir: 1.0,
        speed: 1.0,
        cooldown: default_cooldown(),
    }
}

fn walker_at(x: f32, y: f32, dir: f32, speed: f32) -> EnemyDef {
    EnemyDef {
        x,
        y,
        kind: EnemyKind::Walker,
        count: 1,
        spacing: 0.0,
        dir,
        speed,
        cooldown: default_cooldown(),
    }
}

fn shooter(x: f32, y: f32) -> EnemyDef {
    shooter_with(x, y, default_cooldown())
}

fn shooter_with(x: f32, y: f32, cooldown: u32) -> EnemyDef {
    EnemyDef {
        x,
        y,
        kind: EnemyKind::Shooter,
        count: 1,
        spacing: 0.0,
        dir: 1.0,
        speed: 1.0,
        cooldown,
    }
}

fn pipe(x: f32, dir: PipeDir, target_level: &str, tx: f32, ty: f32) -> PipeDef {
    PipeDef {
        x,
        y: GROUND_Y,
        dir,
        target_level: target_level.to_string(),
        target_spawn: SpawnPoint { x: tx, y: ty },
    }
}

fn houses(xs: &[f32]) -> Vec<HouseDef> {
    xs.iter().map(|&x| HouseDef { x }).collect()
}

fn checkpoints(xs: &[f32]) -> Vec<CheckpointDef> {
    xs.iter().map(|&x| CheckpointDef { x }).collect()
}

/// The shipped seven-level campaign
pub fn builtin_levels() -> Vec<LevelTemplate> {
    vec![
        LevelTemplate {
            name: "Plains".into(),
            theme: LevelTheme::Overworld,
            width: 4400.0,
            start: SpawnPoint { x: 120.0, y: 360.0 },
            flag_x: 4200.0,
            houses: houses(&[40.0, 4220.0]),
            platforms: vec![
                plat(500.0, 420.0, 120.0, 20.0),
                plat(720.0, 380.0, 120.0, 20.0),
                plat(940.0, 340.0, 120.0, 20.0),
                plat(1280.0, 420.0, 140.0, 20.0),
                plat(1680.0, 420.0, 120.0, 20.0),
                plat(2100.0, 380.0, 120.0, 20.0),
                plat(2400.0, 340.0, 160.0, 20.0),
                plat(2800.0, 420.0, 140.0, 20.0),
                plat(3180.0, 380.0, 120.0, 20.0),
                plat(3500.0, 340.0, 140.0, 20.0),
            ],
            coins: vec![
                coin_row(560.0, 380.0, 8),
                coin_row(1360.0, 380.0, 8),
                coin_row(2460.0, 300.0, 8),
                coin_row(3520.0, 300.0, 8),
            ],
            blocks: vec![
                qblock(820.0, 300.0, BlockContents::Coin),
                qblock(980.0, 260.0, BlockContents::Grow),
                qblock(1320.0, 300.0, BlockContents::Life),
                brick(1700.0, 300.0),
                brick(1740.0, 300.0),
            ],
            enemies: vec![
                walkers(600.0, 432.0, 8, 350.0),
                shooter(2300.0, 432.0),
                walker_at(3100.0, 432.0, -1.0, 1.2),
            ],
            pipes: vec![
                pipe(260.0, PipeDir::Down, "Hills", 80.0, 360.0),
                pipe(1800.0, PipeDir::Down, "Underground 1", 120.0, 360.0),
            ],
            checkpoints: checkpoints(&[2200.0]),
        },
        LevelTemplate {
            name: "Hills".into(),
            theme: LevelTheme::Overworld,
            width: 5200.0,
            start: SpawnPoint { x: 80.0, y: 360.0 },
            flag_x: 5000.0,
            houses: houses(&[40.0, 5020.0]),
            platforms: vec![
                plat(380.0, 420.0, 160.0, 20.0),
                plat(620.0, 360.0, 140.0, 20.0),
                plat(900.0, 300.0, 160.0, 20.0),
                plat(1280.0, 360.0, 160.0, 20.0),
                plat(1600.0, 420.0, 160.0, 20.0),
                plat(2000.0, 380.0, 160.0, 20.0),
                plat(2400.0, 340.0, 160.0, 20.0),
                plat(2800.0, 300.0, 200.0, 20.0),
                plat(3400.0, 360.0, 160.0, 20.0),
                plat(3800.0, 420.0, 160.0, 20.0),
                plat(4200.0, 380.0, 160.0, 20.0),
            ],
            coins: vec![coin_row(980.0, 260.0, 10), coin_row(2860.0, 260.0, 10)],
            blocks: vec![
                qblock(620.0, 320.0, BlockContents::Grow),
                qblock(1260.0, 320.0, BlockContents::Coin),
                qblock(2000.0, 340.0, BlockContents::Life),
                brick(2400.0, 300.0),
                brick(2440.0, 300.0),
                brick(2480.0, 300.0),
            ],
            enemies: vec![
                walkers(500.0, 432.0, 10, 320.0),
                shooter(2600.0, 432.0),
                shooter_with(4200.0, 432.0, 120),
            ],
            pipes: vec![
                pipe(600.0, PipeDir::Up, "Plains", 320.0, 360.0),
                pipe(2200.0, PipeDir::Down, "Underground 1", 420.0, 360.0),
            ],
            checkpoints: checkpoints(&[2600.0]),
        },
        LevelTemplate {
            name: "Underground 1".into(),
            theme: LevelTheme::Underground,
            width: 3000.0,
            start: SpawnPoint { x: 120.0, y: 360.0 },
            flag_x: 2800.0,
            houses: vec![],
            platforms: vec![
                plat(300.0, 420.0, 160.0, 20.0),
                plat(560.0, 380.0, 140.0, 20.0),
                plat(820.0, 340.0, 160.0, 20.0),
                plat(1100.0, 380.0, 160.0, 20.0),
                plat(1400.0, 420.0, 160.0, 20.0),
                plat(1800.0, 380.0, 160.0, 20.0),
                plat(2200.0, 340.0, 160.0, 20.0),
            ],
            coins: vec![coin_row(360.0, 380.0, 12), coin_row(1860.0, 300.0, 12)],
            blocks: vec![
                qblock(560.0, 340.0, BlockContents::Coin),
                qblock(820.0, 300.0, BlockContents::Grow),
            ],
            enemies: vec![walkers(400.0, 432.0, 6, 260.0), shooter(2000.0, 432.0)],
            pipes: vec![pipe(2600.0, PipeDir::Up, "Hills", 2400.0, 360.0)],
            checkpoints: checkpoints(&[1500.0]),
        },
        LevelTemplate {
            name: "Desert".into(),
            theme: LevelTheme::Desert,
            width: 5200.0,
            start: SpawnPoint { x: 120.0, y: 360.0 },
            flag_x: 5000.0,
            houses: houses(&[40.0, 5020.0]),
            platforms: vec![
                plat(460.0, 420.0, 200.0, 20.0),
                plat(820.0, 380.0, 180.0, 20.0),
                plat(1200.0, 340.0, 160.0, 20.0),
                plat(1600.0, 300.0, 200.0, 20.0),
                plat(2100.0, 340.0, 160.0, 20.0),
                plat(2500.0, 380.0, 180.0, 20.0),
                plat(2900.0, 420.0, 160.0, 20.0),
                plat(3400.0, 380.0, 180.0, 20.0),
                plat(3800.0, 340.0, 160.0, 20.0),
                plat(4200.0, 300.0, 200.0, 20.0),
            ],
            coins: vec![coin_row(900.0, 340.0, 10), coin_row(3200.0, 300.0, 10)],
            blocks: vec![
                qblock(820.0, 340.0, BlockContents::Grow),
                qblock(1600.0, 260.0, BlockContents::Coin),
                brick(2500.0, 340.0),
            ],
            enemies: vec![
                walkers(600.0, 432.0, 10, 340.0),
                shooter(2800.0, 432.0),
                shooter_with(4200.0, 432.0, 90),
            ],
            pipes: vec![pipe(4800.0, PipeDir::Down, "Snow", 120.0, 360.0)],
            checkpoints: checkpoints(&[2600.0]),
        },
        LevelTemplate {
            name: "Snow".into(),
            theme: LevelTheme::Snow,
            width: 5000.0,
            start: SpawnPoint { x: 120.0, y: 360.0 },
            flag_x: 4800.0,
            houses: houses(&[40.0, 4820.0]),
            platforms: vec![
                plat(520.0, 420.0, 140.0, 20.0),
                plat(760.0, 380.0, 140.0, 20.0),
                plat(1000.0, 340.0, 140.0, 20.0),
                plat(1240.0, 300.0, 140.0, 20.0),
                plat(1600.0, 340.0, 160.0, 20.0),
                plat(2000.0, 380.0, 160.0, 20.0),
                plat(2400.0, 340.0, 160.0, 20.0),
                plat(2800.0, 300.0, 160.0, 20.0),
                plat(3200.0, 340.0, 160.0, 20.0),
                plat(3600.0, 380.0, 160.0, 20.0),
            ],
            coins: vec![coin_row(1200.0, 260.0, 10), coin_row(3000.0, 260.0, 10)],
            blocks: vec![
                qblock(760.0, 340.0, BlockContents::Grow),
                qblock(1240.0, 260.0, BlockContents::Life),
            ],
            enemies: vec![
                walkers(600.0, 432.0, 8, 360.0),
                shooter_with(2600.0, 432.0, 90),
            ],
            pipes: vec![pipe(4200.0, PipeDir::Down, "Sky Islands", 120.0, 240.0)],
            checkpoints: checkpoints(&[2500.0]),
        },
        LevelTemplate {
            name: "Sky Islands".into(),
            theme: LevelTheme::Sky,
            width: 5400.0,
            start: SpawnPoint { x: 120.0, y: 240.0 },
            flag_x: 5200.0,
            houses: vec![],
            platforms: vec![
                plat(300.0, 280.0, 160.0, 20.0),
                plat(600.0, 220.0, 160.0, 20.0),
                plat(900.0, 260.0, 160.0, 20.0),
                plat(1200.0, 200.0, 160.0, 20.0),
                plat(1500.0, 240.0, 160.0, 20.0),
                plat(1900.0, 280.0, 160.0, 20.0),
                plat(2300.0, 240.0, 160.0, 20.0),
                plat(2700.0, 200.0, 160.0, 20.0),
                plat(3100.0, 240.0, 160.0, 20.0),
                plat(3500.0, 200.0, 160.0, 20.0),
                plat(3900.0, 240.0, 160.0, 20.0),
            ],
            coins: vec![coin_row(1000.0, 180.0, 10)],
            blocks: vec![qblock(900.0, 220.0, BlockContents::Grow)],
            enemies: vec![walkers(600.0, 292.0, 10, 320.0), shooter(2600.0, 292.0)],
            pipes: vec![pipe(5000.0, PipeDir::Down, "Castle", 80.0, 360.0)],
            checkpoints: checkpoints(&[2700.0]),
        },
        LevelTemplate {
            name: "Castle".into(),
            theme: LevelTheme::Castle,
            width: 5600.0,
            start: SpawnPoint { x: 80.0, y: 360.0 },
            flag_x: 5400.0,
            houses: houses(&[40.0, 5420.0]),
            platforms: vec![
                plat(500.0, 420.0, 160.0, 20.0),
                plat(720.0, 360.0, 160.0, 20.0),
                plat(940.0, 300.0, 160.0, 20.0),
                plat(1280.0, 300.0, 160.0, 20.0),
                plat(1600.0, 360.0, 160.0, 20.0),
                plat(1920.0, 420.0, 160.0, 20.0),
                plat(2400.0, 380.0, 160.0, 20.0),
                plat(2800.0, 340.0, 160.0, 20.0),
                plat(3200.0, 300.0, 160.0, 20.0),
                plat(3600.0, 340.0, 160.0, 20.0),
                plat(4000.0, 380.0, 160.0, 20.0),
                plat(4400.0, 420.0, 160.0, 20.0),
            ],
            coins: vec![coin_row(1360.0, 260.0, 12), coin_row(3240.0, 260.0, 12)],
            blocks: vec![
                qblock(720.0, 320.0, BlockContents::Grow),
                qblock(940.0, 260.0, BlockContents::Life),
                brick(1600.0, 320.0),
                brick(1640.0, 320.0),
                brick(1680.0, 320.0),
            ],
            enemies: vec![
                walkers(600.0, 432.0, 12, 320.0),
                shooter(2500.0, 432.0),
                shooter_with(3800.0, 432.0, 90),
                shooter_with(5000.0, 432.0, 80),
            ],
            pipes: vec![pipe(5200.0, PipeDir::Down, "Plains", 260.0, 360.0)],
            checkpoints: checkpoints(&[2800.0]),
        },
    ]
}
