//! Session-wide run state: the fixed tick ordering, score and lives, the
//! boot/play flow and the any-key restart path.

use bevy::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::audio::SoundBank;
use crate::components::{Big, Extent, Player};
use crate::events::GameEventBus;
use crate::hud::HudMessage;
use crate::input::InputIntents;
use crate::level::{LevelRuntime, LoadRequest};
use crate::object_pool::GamePools;
use crate::perf::PerfMonitor;
use crate::player::PLAYER_H;
use crate::spatial_hash::GameGrids;

/// Seed used when the startup config does not pin one.
pub const DEFAULT_RNG_SEED: u64 = 0x5EED;

/// Fixed-tick stage order. Every gameplay system lives in exactly one set and
/// the sets run chained, so a tick reads as a single pass over the world:
/// the player moves, then items react, enemies act, projectiles fly, level
/// progress is checked, and the cleanup sweep settles what died.
#[derive(SystemSet, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TickSet {
    Player,
    Items,
    Enemies,
    Bullets,
    Progress,
    Cleanup,
}

/// Coarse app flow. `Boot` covers the startup schedules before the first
/// level load is queued; everything after runs in `Playing`.
#[derive(States, Default, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AppFlow {
    #[default]
    Boot,
    Playing,
}

/// Score, lives and the terminal flags. `game_over` and `win` freeze the
/// tick chain; the HUD keeps running so the outcome banner can show.
#[derive(Resource, Clone, Debug)]
pub struct GameState {
    pub score: u32,
    pub lives: i32,
    pub level_index: usize,
    pub game_over: bool,
    pub win: bool,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            score: 0,
            lives: 3,
            level_index: 0,
            game_over: false,
            win: false,
        }
    }
}

/// Where a lost life puts the player back: the level start until a
/// checkpoint moves it forward.
#[derive(Resource, Clone, Copy, Default, Debug)]
pub struct RespawnPoint {
    pub x: f32,
    pub y: f32,
}

/// Deterministic RNG for the bits of simulation that want jitter, currently
/// shooter cooldowns. Seeded from config so headless runs replay.
#[derive(Resource)]
pub struct GameRng(pub SmallRng);

impl Default for GameRng {
    fn default() -> Self {
        GameRng(SmallRng::seed_from_u64(DEFAULT_RNG_SEED))
    }
}

/// Run condition for the gameplay sets. Outside tests the app is in
/// `Playing` almost immediately; a finished run freezes the simulation until
/// the restart lands. Test worlds without states or a `GameState` pass.
pub fn gameplay_active(
    state: Option<Res<State<AppFlow>>>,
    game: Option<Res<GameState>>,
) -> bool {
    if let Some(state) = state {
        if *state.get() != AppFlow::Playing {
            return false;
        }
    }
    game.map(|g| !g.game_over && !g.win).unwrap_or(true)
}

pub struct GameRuntimePlugin;

impl Plugin for GameRuntimePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameState>()
            .init_resource::<RespawnPoint>()
            .init_resource::<GameRng>()
            .init_state::<AppFlow>()
            .configure_sets(
                FixedUpdate,
                (
                    TickSet::Player,
                    TickSet::Items,
                    TickSet::Enemies,
                    TickSet::Bullets,
                    TickSet::Progress,
                    TickSet::Cleanup,
                )
                    .chain()
                    .run_if(gameplay_active),
            )
            .add_systems(PostStartup, finish_boot)
            .add_systems(Update, restart_on_any_key);
    }
}

fn finish_boot(mut next: ResMut<NextState<AppFlow>>) {
    next.set(AppFlow::Playing);
}

/// Any key after a game over or a win restarts from the first level with
/// fresh counters. Statistics reset too, so a session's numbers always
/// describe the current run; the sound cache keeps its warmed notes.
#[allow(clippy::too_many_arguments)]
fn restart_on_any_key(
    keys: Res<ButtonInput<KeyCode>>,
    mut game: ResMut<GameState>,
    mut runtime: ResMut<LevelRuntime>,
    mut intents: ResMut<InputIntents>,
    mut grids: ResMut<GameGrids>,
    mut pools: ResMut<GamePools>,
    mut monitor: ResMut<PerfMonitor>,
    mut bank: ResMut<SoundBank>,
    mut message: ResMut<HudMessage>,
    mut bus: ResMut<GameEventBus>,
    mut player: Query<(&mut Big, &mut Extent), With<Player>>,
) {
    if !(game.game_over || game.win) {
        return;
    }
    if keys.get_just_pressed().next().is_none() {
        return;
    }

    *game = GameState::default();
    *intents = InputIntents::default();
    // The level load repositions the player; the size tier is session state
    // and has to drop back here.
    if let Ok((mut big, mut extent)) = player.get_single_mut() {
        big.0 = false;
        extent.h = PLAYER_H;
    }
    grids.reset_stats_all();
    pools.reset_stats_all();
    monitor.reset();
    bank.reset_stats();
    message.visible = false;
    runtime.request_load(LoadRequest {
        index: 0,
        spawn: None,
    });
    bus.emit("game_restarted", serde_json::json!({}));
    info!("[Jasim game] Restarting from the top");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::GamePosition;

    #[derive(Resource, Default)]
    struct Ticks(u32);

    fn count_ticks(mut ticks: ResMut<Ticks>) {
        ticks.0 += 1;
    }

    #[test]
    fn terminal_states_freeze_the_tick_chain() {
        let mut app = App::new();
        app.init_resource::<GameState>()
            .init_resource::<Ticks>()
            .configure_sets(FixedUpdate, TickSet::Player.run_if(gameplay_active))
            .add_systems(FixedUpdate, count_ticks.in_set(TickSet::Player));

        app.world_mut().run_schedule(FixedUpdate);
        app.world_mut().run_schedule(FixedUpdate);
        assert_eq!(app.world().resource::<Ticks>().0, 2);

        app.world_mut().resource_mut::<GameState>().game_over = true;
        app.world_mut().run_schedule(FixedUpdate);
        assert_eq!(app.world().resource::<Ticks>().0, 2);

        let mut game = app.world_mut().resource_mut::<GameState>();
        game.game_over = false;
        game.win = true;
        app.world_mut().run_schedule(FixedUpdate);
        assert_eq!(app.world().resource::<Ticks>().0, 2);
    }

    fn restart_app() -> App {
        let mut app = App::new();
        app.init_resource::<GameState>()
            .init_resource::<LevelRuntime>()
            .init_resource::<InputIntents>()
            .init_resource::<GameGrids>()
            .init_resource::<GamePools>()
            .init_resource::<PerfMonitor>()
            .init_resource::<SoundBank>()
            .init_resource::<HudMessage>()
            .init_resource::<GameEventBus>()
            .insert_resource(ButtonInput::<KeyCode>::default())
            .add_systems(Update, restart_on_any_key);
        app.world_mut().spawn((
            Player,
            Big(true),
            Extent {
                w: crate::player::PLAYER_W,
                h: crate::player::PLAYER_BIG_H,
            },
            GamePosition { x: 500.0, y: 100.0 },
        ));
        app
    }

    #[test]
    fn any_key_restarts_a_finished_run() {
        let mut app = restart_app();
        {
            let mut game = app.world_mut().resource_mut::<GameState>();
            game.game_over = true;
            game.score = 640;
            game.lives = 0;
            game.level_index = 3;
        }
        app.world_mut().resource_mut::<HudMessage>().visible = true;
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Space);

        app.update();

        let game = app.world().resource::<GameState>();
        assert!(!game.game_over);
        assert_eq!(game.score, 0);
        assert_eq!(game.lives, 3);
        assert_eq!(game.level_index, 0);

        let runtime = app.world().resource::<LevelRuntime>();
        let pending = runtime.pending.as_ref().unwrap();
        assert_eq!(pending.index, 0);
        assert!(pending.spawn.is_none());

        assert!(!app.world().resource::<HudMessage>().visible);
        let mut players = app.world_mut().query_filtered::<&Extent, With<Player>>();
        let extent = players.single(app.world());
        assert_eq!(extent.h, PLAYER_H);
        let bus = app.world().resource::<GameEventBus>();
        assert!(bus.recent.iter().any(|ev| ev.name == "game_restarted"));
    }

    #[test]
    fn keys_mid_run_do_not_restart() {
        let mut app = restart_app();
        app.world_mut().resource_mut::<GameState>().score = 120;
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Space);

        app.update();

        assert_eq!(app.world().resource::<GameState>().score, 120);
        assert!(app.world().resource::<LevelRuntime>().pending.is_none());
    }

    #[test]
    fn boot_hands_over_to_playing() {
        let mut app = App::new();
        app.add_plugins(bevy::state::app::StatesPlugin)
            .init_state::<AppFlow>()
            .add_systems(PostStartup, finish_boot);

        app.update();

        let state = app.world().resource::<State<AppFlow>>();
        assert_eq!(*state.get(), AppFlow::Playing);
    }
}
