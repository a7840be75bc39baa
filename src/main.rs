#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

mod audio;
mod bullets;
mod camera;
mod components;
mod enemies;
mod events;
mod game_runtime;
mod hud;
mod input;
mod items;
mod level;
mod object_pool;
mod perf;
mod physics;
mod player;
mod progress;
mod render;
mod spatial_hash;
#[cfg(feature = "web_export")]
mod web_bootstrap;

use bevy::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use components::{HeadlessMode, PhysicsConfig, VIEW_HEIGHT, VIEW_WIDTH};
use game_runtime::{GameRng, DEFAULT_RNG_SEED};
use level::{LevelLibrary, LevelTemplate};

/// Optional game data file. Anything absent falls back to the built-in
/// campaign and default tuning.
#[derive(serde::Deserialize, Default)]
struct StartupConfig {
    window_title: Option<String>,
    rng_seed: Option<u64>,
    physics: Option<PhysicsConfig>,
    levels: Option<Vec<LevelTemplate>>,
}

fn load_startup_config() -> StartupConfig {
    let path = std::env::var("JASIM_GAME_DATA")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "game.json".to_string());
    match std::fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<StartupConfig>(&contents) {
            Ok(cfg) => {
                println!("[Jasim] Loaded game data from {}", path);
                cfg
            }
            Err(e) => {
                eprintln!("[Jasim] Failed to parse {}: {}", path, e);
                StartupConfig::default()
            }
        },
        Err(_) => StartupConfig::default(),
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let headless = args.iter().any(|a| a == "--headless")
        || std::env::var("JASIM_HEADLESS").map_or(false, |v| v == "1");

    let startup_config = load_startup_config();
    let mut app = App::new();

    app.insert_resource(HeadlessMode(headless));

    if headless {
        // Headless mode: no window, no rendering, just the simulation
        app.add_plugins(MinimalPlugins);
        app.add_plugins(bevy::state::app::StatesPlugin);
        println!("[Jasim] Starting in HEADLESS mode");
    } else {
        let window_title = startup_config
            .window_title
            .clone()
            .unwrap_or_else(|| "Jasim's Adventure".to_string());
        app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: window_title,
                resolution: (VIEW_WIDTH, VIEW_HEIGHT).into(),
                present_mode: bevy::window::PresentMode::AutoVsync,
                ..default()
            }),
            ..default()
        }));
        println!("[Jasim] Starting in WINDOWED mode");
    }

    let mut library = LevelLibrary::default();
    match startup_config.levels {
        Some(levels) if levels.is_empty() => {
            eprintln!("[Jasim] Game data has no levels; keeping the built-in campaign");
        }
        Some(levels) => {
            library = LevelLibrary { levels };
            let stats = library.stats();
            println!(
                "[Jasim] Using {} levels from game data ({} platforms, {} coins, {} enemies)",
                stats.total_levels, stats.total_platforms, stats.total_coins, stats.total_enemies
            );
        }
        None => {}
    }

    let seed = startup_config.rng_seed.unwrap_or(DEFAULT_RNG_SEED);

    app.insert_resource(startup_config.physics.unwrap_or_default())
        .insert_resource(library)
        .insert_resource(GameRng(SmallRng::seed_from_u64(seed)))
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .add_plugins(input::InputPlugin)
        .add_plugins(game_runtime::GameRuntimePlugin)
        .add_plugins(events::GameEventsPlugin)
        .add_plugins(level::LevelPlugin)
        .add_plugins(spatial_hash::SpatialHashPlugin)
        .add_plugins(object_pool::ObjectPoolPlugin)
        .add_plugins(player::PlayerPlugin)
        .add_plugins(items::ItemsPlugin)
        .add_plugins(enemies::EnemyPlugin)
        .add_plugins(bullets::BulletPlugin)
        .add_plugins(progress::ProgressPlugin)
        .add_plugins(camera::CameraPlugin)
        .add_plugins(render::RenderPlugin)
        .add_plugins(hud::HudPlugin)
        .add_plugins(audio::AudioPlugin)
        .add_plugins(perf::PerfPlugin);

    #[cfg(feature = "web_export")]
    app.add_plugins(web_bootstrap::WebBootstrapPlugin);

    app.run();
}
